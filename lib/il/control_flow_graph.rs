//! A `ControlFlowGraph` is a directed `Graph` of block labels and `Edge`.

use crate::analysis::{resolve_destinations, Successor};
use crate::il::*;
use crate::{graph, Error};
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A vertex of the `ControlFlowGraph`.
///
/// Block contents stay in the `Program`. A node only records whether a block
/// is stored for its label: targets which were referenced but never lowered
/// get a placeholder node.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Node {
    label: Label,
    placeholder: bool,
}

impl Node {
    pub fn label(&self) -> Label {
        self.label
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

impl graph::Vertex for Node {
    fn label(&self) -> Label {
        self.label
    }
}

/// The successor relation between the blocks of a `Program`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ControlFlowGraph {
    graph: graph::Graph<Node, Edge>,
}

impl ControlFlowGraph {
    /// Build the graph of `blocks`, creating labels for integer destinations
    /// in `symbol_pool`.
    pub(crate) fn build(
        blocks: &BTreeMap<Label, Block>,
        symbol_pool: &mut SymbolPool,
    ) -> Result<ControlFlowGraph, Error> {
        let mut graph = graph::Graph::new();

        for label in blocks.keys() {
            graph.insert_vertex(Node {
                label: *label,
                placeholder: false,
            })?;
        }

        for (label, block) in blocks {
            let destination = block.destination()?;
            let descriptors = resolve_destinations(block)?;
            trace!("{} resolves to {} descriptor(s)", label, descriptors.len());

            for descriptor in &descriptors {
                let tail = match Successor::classify(descriptor) {
                    Successor::Label(tail) => tail,
                    Successor::Address(address) => symbol_pool.label_for_offset(address),
                    _ => continue,
                };

                if !graph.has_vertex(tail) {
                    trace!("placeholder for {}", tail);
                    graph.insert_vertex(Node {
                        label: tail,
                        placeholder: true,
                    })?;
                }

                if !graph.has_edge(*label, tail) {
                    let kind = BranchKind::classify(destination, tail, symbol_pool);
                    graph.insert_edge(Edge::new(*label, tail, kind))?;
                }
            }
        }

        Ok(ControlFlowGraph { graph })
    }

    /// Returns the underlying graph
    pub fn graph(&self) -> &graph::Graph<Node, Edge> {
        &self.graph
    }

    pub fn nodes(&self) -> Vec<&Node> {
        self.graph.vertices()
    }

    pub fn node(&self, label: Label) -> Result<&Node, Error> {
        self.graph.vertex(label)
    }

    pub fn edges(&self) -> Vec<&Edge> {
        self.graph.edges()
    }

    pub fn edge(&self, head: Label, tail: Label) -> Result<&Edge, Error> {
        self.graph.edge(head, tail)
    }

    /// Labels of the blocks which may follow `label`.
    pub fn successors(&self, label: Label) -> Result<Vec<Label>, Error> {
        self.graph.successor_labels(label)
    }

    /// Labels of the blocks which may precede `label`.
    pub fn predecessors(&self, label: Label) -> Result<Vec<Label>, Error> {
        self.graph.predecessor_labels(label)
    }

    /// Returns true if `label` is a referenced target with no stored block.
    pub fn is_placeholder(&self, label: Label) -> Result<bool, Error> {
        Ok(self.graph.vertex(label)?.is_placeholder())
    }

    /// Labels of every referenced target with no stored block.
    pub fn placeholders(&self) -> Vec<Label> {
        self.graph
            .vertices()
            .into_iter()
            .filter(|node| node.is_placeholder())
            .map(|node| node.label())
            .collect()
    }

    /// Edges leaving `label`.
    pub fn edges_out(&self, label: Label) -> Result<Vec<&Edge>, Error> {
        self.graph.edges_out(label)
    }

    /// Edges entering `label`.
    pub fn edges_in(&self, label: Label) -> Result<Vec<&Edge>, Error> {
        self.graph.edges_in(label)
    }

    /// Labels of the nodes no edge leads to.
    pub fn entries(&self) -> Vec<Label> {
        self.graph
            .vertices_without_predecessors()
            .into_iter()
            .map(|node| node.label())
            .collect()
    }

    /// Labels of every node reachable from `label`, including `label`.
    pub fn reachable(&self, label: Label) -> Result<BTreeSet<Label>, Error> {
        Ok(self.graph.reachable_vertices(label)?.into_iter().collect())
    }

    /// Labels reachable from `root`, in depth-first pre order.
    pub fn pre_order(&self, root: Label) -> Result<Vec<Label>, Error> {
        self.graph.compute_pre_order(root)
    }

    /// Labels reachable from `root`, in depth-first post order.
    pub fn post_order(&self, root: Label) -> Result<Vec<Label>, Error> {
        self.graph.compute_post_order(root)
    }
}

impl fmt::Display for ControlFlowGraph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for node in self.graph.vertices() {
            if node.is_placeholder() {
                writeln!(f, "{} (placeholder)", node.label())?;
            } else {
                writeln!(f, "{}", node.label())?;
            }
        }
        for edge in self.graph.edges() {
            writeln!(f, "{}", edge)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_to(label: Label, destination: Expression) -> Block {
        let mut block = Block::new(label, id("IRDst", 32));
        block.push(
            InstructionGroup::from(vec![Assignment::new(expr_id("IRDst", 32), destination)]),
            Line::new(0, 4, LineKind::Instruction),
        );
        block
    }

    #[test]
    fn conditional_edges_and_placeholders() {
        let mut pool = SymbolPool::new();
        let head = pool.label_for_offset(0);
        let taken = pool.label_for_offset(0x10);
        let not_taken = pool.label_for_offset(0x4);

        let mut blocks = BTreeMap::new();
        blocks.insert(
            head,
            block_to(
                head,
                Expression::conditional(
                    expr_id("zf", 1),
                    expr_label(taken, 32),
                    expr_label(not_taken, 32),
                )
                .unwrap(),
            ),
        );

        let cfg = ControlFlowGraph::build(&blocks, &mut pool).unwrap();

        assert_eq!(cfg.edges().len(), 2);
        assert_eq!(cfg.edge(head, taken).unwrap().kind(), BranchKind::Taken);
        assert_eq!(
            cfg.edge(head, not_taken).unwrap().kind(),
            BranchKind::NotTaken
        );
        assert!(!cfg.is_placeholder(head).unwrap());
        assert!(cfg.is_placeholder(taken).unwrap());
        assert_eq!(cfg.placeholders().len(), 2);
    }

    #[test]
    fn integer_arms_are_tagged() {
        let mut pool = SymbolPool::new();
        let head = pool.label_for_offset(0);

        let mut blocks = BTreeMap::new();
        blocks.insert(
            head,
            block_to(
                head,
                Expression::conditional(expr_id("zf", 1), expr_int(0x40, 32), expr_int(0x4, 32))
                    .unwrap(),
            ),
        );

        let cfg = ControlFlowGraph::build(&blocks, &mut pool).unwrap();

        let taken = pool.label_by_offset(0x40).unwrap();
        let not_taken = pool.label_by_offset(0x4).unwrap();
        assert_eq!(cfg.edge(head, taken).unwrap().kind(), BranchKind::Taken);
        assert_eq!(
            cfg.edge(head, not_taken).unwrap().kind(),
            BranchKind::NotTaken
        );
    }

    #[test]
    fn traversals() {
        let mut pool = SymbolPool::new();
        let head = pool.label_for_offset(0);
        let body = pool.label_for_offset(0x10);
        let exit = pool.label_for_offset(0x20);
        let orphan = pool.label_for_offset(0x30);

        let mut blocks = BTreeMap::new();
        blocks.insert(head, block_to(head, expr_label(body, 32)));
        blocks.insert(
            body,
            block_to(
                body,
                Expression::conditional(expr_id("zf", 1), expr_label(body, 32), expr_label(exit, 32))
                    .unwrap(),
            ),
        );
        blocks.insert(orphan, block_to(orphan, expr_label(exit, 32)));

        let cfg = ControlFlowGraph::build(&blocks, &mut pool).unwrap();

        assert_eq!(cfg.entries(), vec![head, orphan]);
        assert_eq!(cfg.reachable(head).unwrap(), BTreeSet::from([head, body, exit]));
        assert_eq!(cfg.pre_order(head).unwrap(), vec![head, body, exit]);
        assert_eq!(cfg.post_order(head).unwrap(), vec![exit, body, head]);
        assert_eq!(cfg.edges_out(body).unwrap().len(), 2);
        assert_eq!(cfg.edges_in(exit).unwrap().len(), 2);
        assert!(cfg.is_placeholder(exit).unwrap());
        assert!(cfg.reachable(Label::new(99)).is_err());
    }

    #[test]
    fn integer_destinations_become_labels() {
        let mut pool = SymbolPool::new();
        let head = pool.label_for_offset(0);

        let mut blocks = BTreeMap::new();
        blocks.insert(head, block_to(head, expr_int(0x40, 32)));

        let cfg = ControlFlowGraph::build(&blocks, &mut pool).unwrap();

        let tail = pool.label_by_offset(0x40).unwrap();
        assert_eq!(cfg.successors(head).unwrap(), vec![tail]);
        assert_eq!(
            cfg.edge(head, tail).unwrap().kind(),
            BranchKind::Unconditional
        );
    }

    #[test]
    fn dynamic_destinations_have_no_edges() {
        let mut pool = SymbolPool::new();
        let head = pool.label_for_offset(0);

        let mut blocks = BTreeMap::new();
        blocks.insert(
            head,
            block_to(head, Expression::memory(expr_id("sp", 32), 32)),
        );

        let cfg = ControlFlowGraph::build(&blocks, &mut pool).unwrap();
        assert_eq!(cfg.nodes().len(), 1);
        assert!(cfg.edges().is_empty());
    }
}
