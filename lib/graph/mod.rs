//! Implements a directed graph keyed by `Label`.
//!
//! Vertices and edges are payloads stored in tables owned by the graph. The
//! adjacency sets only ever hold labels.

use crate::il::Label;
use crate::Error;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub trait Vertex: Clone {
    /// The label of this vertex.
    fn label(&self) -> Label;
}

pub trait Edge: Clone {
    /// The label of the head vertex.
    fn head(&self) -> Label;
    /// The label of the tail vertex.
    fn tail(&self) -> Label;
}

/// A directed graph.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Graph<V: Vertex, E: Edge> {
    vertices: BTreeMap<Label, V>,
    edges: BTreeMap<Label, BTreeMap<Label, E>>,
    successors: BTreeMap<Label, BTreeSet<Label>>,
    predecessors: BTreeMap<Label, BTreeSet<Label>>,
}

impl<V, E> Default for Graph<V, E>
where
    V: Vertex,
    E: Edge,
{
    fn default() -> Graph<V, E> {
        Graph::new()
    }
}

impl<V, E> Graph<V, E>
where
    V: Vertex,
    E: Edge,
{
    pub fn new() -> Graph<V, E> {
        Graph {
            vertices: BTreeMap::new(),
            edges: BTreeMap::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.values().map(|edges| edges.len()).sum()
    }

    /// Returns true if the vertex with the given label exists in this graph
    pub fn has_vertex(&self, label: Label) -> bool {
        self.vertices.contains_key(&label)
    }

    /// Returns true if the edge with the given head and tail exists in this graph
    pub fn has_edge(&self, head: Label, tail: Label) -> bool {
        self.edges
            .get(&head)
            .map(|edges| edges.contains_key(&tail))
            .unwrap_or(false)
    }

    /// Inserts a vertex into the graph.
    /// # Errors
    /// Error if a vertex with the same label already exists.
    pub fn insert_vertex(&mut self, v: V) -> Result<(), Error> {
        let label = v.label();
        if self.vertices.contains_key(&label) {
            return Err(format!("duplicate vertex {}", label).into());
        }
        self.vertices.insert(label, v);
        self.successors.insert(label, BTreeSet::new());
        self.predecessors.insert(label, BTreeSet::new());
        Ok(())
    }

    /// Inserts an edge into the graph.
    /// # Errors
    /// Error if the edge already exists, or either end is missing.
    pub fn insert_edge(&mut self, edge: E) -> Result<(), Error> {
        let (head, tail) = (edge.head(), edge.tail());
        if self.has_edge(head, tail) {
            return Err(format!("duplicate edge {} -> {}", head, tail).into());
        }
        if !self.vertices.contains_key(&head) {
            return Err(Error::GraphVertexNotFound(head));
        }
        if !self.vertices.contains_key(&tail) {
            return Err(Error::GraphVertexNotFound(tail));
        }

        self.edges.entry(head).or_default().insert(tail, edge);
        self.successors.entry(head).or_default().insert(tail);
        self.predecessors.entry(tail).or_default().insert(head);

        Ok(())
    }

    /// Returns the labels of all immediate successors of a vertex.
    pub fn successor_labels(&self, label: Label) -> Result<Vec<Label>, Error> {
        self.successors
            .get(&label)
            .map(|successors| successors.iter().cloned().collect())
            .ok_or(Error::GraphVertexNotFound(label))
    }

    /// Returns the labels of all immediate predecessors of a vertex.
    pub fn predecessor_labels(&self, label: Label) -> Result<Vec<Label>, Error> {
        self.predecessors
            .get(&label)
            .map(|predecessors| predecessors.iter().cloned().collect())
            .ok_or(Error::GraphVertexNotFound(label))
    }

    /// Returns all immediate successors of a vertex from the graph.
    pub fn successors(&self, label: Label) -> Result<Vec<&V>, Error> {
        Ok(self
            .successor_labels(label)?
            .iter()
            .filter_map(|successor| self.vertices.get(successor))
            .collect())
    }

    /// Returns all immediate predecessors of a vertex from the graph.
    pub fn predecessors(&self, label: Label) -> Result<Vec<&V>, Error> {
        Ok(self
            .predecessor_labels(label)?
            .iter()
            .filter_map(|predecessor| self.vertices.get(predecessor))
            .collect())
    }

    /// Returns all vertices which don't have any predecessors in the graph.
    pub fn vertices_without_predecessors(&self) -> Vec<&V> {
        self.vertices
            .iter()
            .filter(|(label, _)| {
                self.predecessors
                    .get(label)
                    .map(|predecessors| predecessors.is_empty())
                    .unwrap_or(true)
            })
            .map(|(_, vertex)| vertex)
            .collect()
    }

    /// Computes the set of vertices reachable from the given label.
    pub fn reachable_vertices(&self, label: Label) -> Result<FxHashSet<Label>, Error> {
        if !self.has_vertex(label) {
            return Err(Error::GraphVertexNotFound(label));
        }

        let mut reachable: FxHashSet<Label> = FxHashSet::default();
        let mut queue: Vec<Label> = vec![label];

        reachable.insert(label);

        while let Some(vertex) = queue.pop() {
            for &successor in &self.successors[&vertex] {
                if reachable.insert(successor) {
                    queue.push(successor);
                }
            }
        }

        Ok(reachable)
    }

    /// Compute the pre order of all vertices reachable from `root`.
    pub fn compute_pre_order(&self, root: Label) -> Result<Vec<Label>, Error> {
        if !self.has_vertex(root) {
            return Err(Error::GraphVertexNotFound(root));
        }

        let mut visited: FxHashSet<Label> = FxHashSet::default();
        let mut stack: Vec<Label> = vec![root];
        let mut order: Vec<Label> = Vec::new();

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }

            order.push(node);

            for &successor in &self.successors[&node] {
                stack.push(successor);
            }
        }

        Ok(order)
    }

    /// Compute the post order of all vertices reachable from `root`.
    ///
    /// Iterative, so long chains of blocks do not grow the call stack.
    pub fn compute_post_order(&self, root: Label) -> Result<Vec<Label>, Error> {
        if !self.has_vertex(root) {
            return Err(Error::GraphVertexNotFound(root));
        }

        let mut visited: FxHashSet<Label> = FxHashSet::default();
        let mut order: Vec<Label> = Vec::new();
        let mut stack: Vec<(Label, Vec<Label>)> = Vec::new();

        visited.insert(root);
        stack.push((root, self.successors[&root].iter().rev().cloned().collect()));

        while let Some((node, pending)) = stack.last_mut() {
            match pending.pop() {
                Some(successor) => {
                    if visited.insert(successor) {
                        let successors = self.successors[&successor].iter().rev().cloned().collect();
                        stack.push((successor, successors));
                    }
                }
                None => {
                    order.push(*node);
                    stack.pop();
                }
            }
        }

        Ok(order)
    }

    /// Returns all vertices in the graph.
    pub fn vertices(&self) -> Vec<&V> {
        self.vertices.values().collect()
    }

    /// Fetches a vertex by label.
    pub fn vertex(&self, label: Label) -> Result<&V, Error> {
        self.vertices
            .get(&label)
            .ok_or(Error::GraphVertexNotFound(label))
    }

    pub fn edge(&self, head: Label, tail: Label) -> Result<&E, Error> {
        self.edges
            .get(&head)
            .and_then(|edges| edges.get(&tail))
            .ok_or(Error::GraphEdgeNotFound(head, tail))
    }

    /// Get a reference to every `Edge` in the `Graph`.
    pub fn edges(&self) -> Vec<&E> {
        self.edges.values().flat_map(|edges| edges.values()).collect()
    }

    /// Return all edges out for a vertex
    pub fn edges_out(&self, label: Label) -> Result<Vec<&E>, Error> {
        if !self.has_vertex(label) {
            return Err(Error::GraphVertexNotFound(label));
        }
        Ok(self
            .edges
            .get(&label)
            .map(|edges| edges.values().collect())
            .unwrap_or_default())
    }

    /// Return all edges in for a vertex
    pub fn edges_in(&self, label: Label) -> Result<Vec<&E>, Error> {
        self.predecessors
            .get(&label)
            .map(|predecessors| {
                predecessors
                    .iter()
                    .filter_map(|predecessor| {
                        self.edges
                            .get(predecessor)
                            .and_then(|edges| edges.get(&label))
                    })
                    .collect()
            })
            .ok_or(Error::GraphVertexNotFound(label))
    }
}
