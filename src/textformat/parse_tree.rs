//! Side-channel locations recorded while parsing a textproto.
//!
//! For every field the parser keeps one location per *name occurrence* and
//! one subtree per *message-typed element*. The two deliberately disagree
//! under the inline repeated syntax `f: [a, b, c]`: the name occurs once,
//! so there is one location, but every element still gets its own subtree.
//! The analyzer depends on that asymmetry to detect the inline form.

use std::collections::HashMap;

use crate::base::ParseLocation;
use crate::schema::FieldId;

#[derive(Debug, Default)]
pub struct ParseInfoTree {
    locations: HashMap<FieldId, Vec<ParseLocation>>,
    nested: HashMap<FieldId, Vec<ParseInfoTree>>,
}

impl ParseInfoTree {
    /// Record the location of one occurrence of `field`'s name.
    pub fn record_location(&mut self, field: FieldId, location: ParseLocation) {
        self.locations.entry(field).or_default().push(location);
    }

    /// Append a subtree for the next message-typed element of `field`.
    pub fn create_nested(&mut self, field: FieldId) -> &mut ParseInfoTree {
        let trees = self.nested.entry(field).or_default();
        trees.push(ParseInfoTree::default());
        let last = trees.len() - 1;
        &mut trees[last]
    }

    /// Location of the `index`-th occurrence; `None` index means singular
    /// and reads slot 0. Out-of-range lookups return `None`, which is how
    /// inline-repeated entries past the first present themselves.
    pub fn location(&self, field: FieldId, index: Option<usize>) -> Option<ParseLocation> {
        let slot = index.unwrap_or(0);
        self.locations.get(&field)?.get(slot).copied()
    }

    /// Subtree for the `index`-th message-typed element.
    pub fn nested(&self, field: FieldId, index: Option<usize>) -> Option<&ParseInfoTree> {
        let slot = index.unwrap_or(0);
        self.nested.get(&field)?.get(slot)
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty() && self.nested.is_empty()
    }
}
