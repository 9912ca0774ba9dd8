//! Interning of labels by name and offset.

use crate::il::Label;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
struct Symbol {
    name: String,
    offset: Option<u64>,
}

/// Owns every `Label` handed out during an analysis session.
///
/// A label is created at most once per name and once per offset, so two
/// lookups of the same offset always return the same `Label`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SymbolPool {
    symbols: Vec<Symbol>,
    by_name: FxHashMap<String, Label>,
    by_offset: FxHashMap<u64, Label>,
    next_anonymous: usize,
}

impl SymbolPool {
    pub fn new() -> SymbolPool {
        SymbolPool::default()
    }

    fn insert(&mut self, name: String, offset: Option<u64>) -> Label {
        let label = Label::new(self.symbols.len());
        self.by_name.insert(name.clone(), label);
        if let Some(offset) = offset {
            self.by_offset.insert(offset, label);
        }
        self.symbols.push(Symbol { name, offset });
        label
    }

    /// Get the label for `offset`, creating it if it does not exist.
    ///
    /// A label already named `loc_<offset>` is given the offset instead of
    /// a second label being created under the same name.
    pub fn label_for_offset(&mut self, offset: u64) -> Label {
        if let Some(label) = self.by_offset.get(&offset) {
            return *label;
        }
        let name = format!("loc_{:x}", offset);
        // Offset labels are only ever named after their own offset, so a
        // label holding this name has no offset yet.
        if let Some(&label) = self.by_name.get(&name) {
            if let Some(symbol) = self.symbols.get_mut(label.id()) {
                symbol.offset = Some(offset);
                self.by_offset.insert(offset, label);
                return label;
            }
        }
        self.insert(name, Some(offset))
    }

    /// Get the label called `name`, creating it if it does not exist.
    pub fn label_for_name<S>(&mut self, name: S) -> Label
    where
        S: Into<String>,
    {
        let name = name.into();
        if let Some(label) = self.by_name.get(&name) {
            return *label;
        }
        self.insert(name, None)
    }

    /// Create a fresh label with no offset.
    pub fn new_anonymous_label(&mut self) -> Label {
        loop {
            let name = format!("lbl_gen_{}", self.next_anonymous);
            self.next_anonymous += 1;
            if !self.by_name.contains_key(&name) {
                return self.insert(name, None);
            }
        }
    }

    pub fn label_by_offset(&self, offset: u64) -> Option<Label> {
        self.by_offset.get(&offset).cloned()
    }

    pub fn label_by_name(&self, name: &str) -> Option<Label> {
        self.by_name.get(name).cloned()
    }

    pub fn name(&self, label: Label) -> Option<&str> {
        self.symbols.get(label.id()).map(|symbol| symbol.name.as_str())
    }

    pub fn offset(&self, label: Label) -> Option<u64> {
        self.symbols.get(label.id()).and_then(|symbol| symbol.offset)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
