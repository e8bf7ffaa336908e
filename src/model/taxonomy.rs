//! TaxonomyNode — node in a hierarchical classification tree (spec §3).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonomyNodeId(String);

impl TaxonomyNodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaxonomyNodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaxonomyNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub id: TaxonomyNodeId,
    pub name: String,
    pub parent_id: Option<TaxonomyNodeId>,
    pub description: String,
    pub keywords: BTreeSet<String>,
}

impl TaxonomyNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TaxonomyNodeId::new(),
            name: name.into(),
            parent_id: None,
            description: String::new(),
            keywords: BTreeSet::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: TaxonomyNodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Depth of `node_id` in `nodes`, following `parent_id` links. Returns `None`
/// if a cycle is detected before reaching a root — callers enforce the
/// "depth ≤ 10, no cycles" invariant (spec §3) using this.
pub fn depth(
    node_id: &TaxonomyNodeId,
    nodes: &std::collections::HashMap<TaxonomyNodeId, TaxonomyNode>,
) -> Option<usize> {
    let mut seen = std::collections::HashSet::new();
    let mut current = node_id.clone();
    let mut d = 0;
    loop {
        if !seen.insert(current.clone()) {
            return None; // cycle
        }
        match nodes.get(&current).and_then(|n| n.parent_id.clone()) {
            Some(parent) => {
                d += 1;
                current = parent;
            }
            None => return Some(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_of_root_is_zero() {
        let root = TaxonomyNode::new("Computing");
        let mut nodes = std::collections::HashMap::new();
        nodes.insert(root.id.clone(), root.clone());
        assert_eq!(depth(&root.id, &nodes), Some(0));
    }

    #[test]
    fn depth_follows_parent_chain() {
        let root = TaxonomyNode::new("Computing");
        let child = TaxonomyNode::new("Software").with_parent(root.id.clone());
        let mut nodes = std::collections::HashMap::new();
        nodes.insert(root.id.clone(), root);
        nodes.insert(child.id.clone(), child.clone());
        assert_eq!(depth(&child.id, &nodes), Some(1));
    }

    #[test]
    fn cycle_returns_none() {
        let mut a = TaxonomyNode::new("A");
        let mut b = TaxonomyNode::new("B");
        a.parent_id = Some(b.id.clone());
        b.parent_id = Some(a.id.clone());
        let mut nodes = std::collections::HashMap::new();
        nodes.insert(a.id.clone(), a.clone());
        nodes.insert(b.id.clone(), b);
        assert_eq!(depth(&a.id, &nodes), None);
    }
}
