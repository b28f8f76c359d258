//! A fact sink that remembers everything, for asserting on analyzer output.

use textproto_indexer::analysis::{
    EdgeKind, GraphRecorder, NodeKind, Property, PropertyValue, VName,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    Node {
        vname: VName,
        kind: NodeKind,
    },
    Property {
        vname: VName,
        property: Property,
        value: PropertyValue,
    },
    Edge {
        source: VName,
        kind: EdgeKind,
        target: VName,
    },
}

#[derive(Debug, Default)]
pub struct RecordingRecorder {
    pub facts: Vec<Fact>,
}

impl GraphRecorder for RecordingRecorder {
    fn add_node(&mut self, vname: &VName, kind: NodeKind) {
        self.facts.push(Fact::Node {
            vname: vname.clone(),
            kind,
        });
    }

    fn add_property(&mut self, vname: &VName, property: Property, value: PropertyValue) {
        self.facts.push(Fact::Property {
            vname: vname.clone(),
            property,
            value,
        });
    }

    fn add_edge(&mut self, source: &VName, kind: EdgeKind, target: &VName) {
        self.facts.push(Fact::Edge {
            source: source.clone(),
            kind,
            target: target.clone(),
        });
    }
}

impl RecordingRecorder {
    /// `(begin, end)` of every emitted anchor, in emission order.
    pub fn anchor_spans(&self) -> Vec<(usize, usize)> {
        self.facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::Node {
                    vname,
                    kind: NodeKind::Anchor,
                } => parse_anchor_signature(&vname.signature),
                _ => None,
            })
            .collect()
    }

    pub fn has_anchor(&self, begin: usize, end: usize) -> bool {
        self.anchor_spans().contains(&(begin, end))
    }

    /// Targets of `ref` edges whose source is the anchor `@begin:end`.
    pub fn ref_targets_of_anchor(&self, begin: usize, end: usize) -> Vec<&VName> {
        let signature = format!("@{begin}:{end}");
        self.facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::Edge {
                    source,
                    kind: EdgeKind::Ref,
                    target,
                } if source.signature == signature => Some(target),
                _ => None,
            })
            .collect()
    }

    pub fn ref_edge_count(&self) -> usize {
        self.facts
            .iter()
            .filter(|fact| matches!(fact, Fact::Edge { kind: EdgeKind::Ref, .. }))
            .count()
    }

    /// `(source, target)` of every `tagged` edge.
    pub fn tagged_edges(&self) -> Vec<(&VName, &VName)> {
        self.facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::Edge {
                    source,
                    kind: EdgeKind::Tagged,
                    target,
                } => Some((source, target)),
                _ => None,
            })
            .collect()
    }

    pub fn nodes_of_kind(&self, wanted: NodeKind) -> Vec<&VName> {
        self.facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::Node { vname, kind } if *kind == wanted => Some(vname),
                _ => None,
            })
            .collect()
    }
}

fn parse_anchor_signature(signature: &str) -> Option<(usize, usize)> {
    let rest = signature.strip_prefix('@')?;
    let (begin, end) = rest.split_once(':')?;
    Some((begin.parse().ok()?, end.parse().ok()?))
}
