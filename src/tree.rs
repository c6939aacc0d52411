//! The field tree: the single mutable source of truth for an editing session.
//!
//! Every structural edit goes through here so the nested-children invariant
//! holds after each call: a node has children iff its type is `nested`, and a
//! `nested` node always has at least one child.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::compile::emitted_key;
use crate::error::{EditError, Result};
use crate::field::{FieldAttr, FieldNode, FieldType};
use crate::path::FieldPath;

// ------------------------------- Policy ---------------------------------- //

/// What to do when a removal would leave a nested group without children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyGroupPolicy {
    /// Remove the node, then put one default child back.
    #[default]
    Reseed,
    /// Refuse the removal with `InvalidOperation`.
    Reject,
}

// -------------------------------- Tree ----------------------------------- //

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTree {
    roots: Vec<FieldNode>,
    policy: EmptyGroupPolicy,
}

impl FieldTree {
    /// Empty root list.
    pub fn new() -> Self {
        Self::default()
    }

    /// One default root row, which is how a fresh editing surface starts.
    pub fn seeded() -> Self {
        Self {
            roots: vec![FieldNode::new()],
            ..Self::default()
        }
    }

    /// Adopt nodes built elsewhere (e.g. deserialized), restoring the
    /// nested-children invariant where the input breaks it.
    pub fn from_nodes(mut roots: Vec<FieldNode>) -> Self {
        let healed: usize = roots.iter_mut().map(FieldNode::heal).sum();
        if healed > 0 {
            tracing::debug!(healed, "normalized nested children on adopted field tree");
        }
        Self {
            roots,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: EmptyGroupPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> EmptyGroupPolicy {
        self.policy
    }

    pub fn roots(&self) -> &[FieldNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes at every depth.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&FieldNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldNode> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.roots.get(*first)?;
        for ix in rest {
            node = node.children.get(*ix)?;
        }
        Some(node)
    }

    // ------------------------------ Edits -------------------------------- //

    /// Append a default row to the list under `parent` (the root list when
    /// `parent` is empty). Returns the path of the new node.
    pub fn add_field(&mut self, parent: &FieldPath) -> Result<FieldPath> {
        if parent.is_root() {
            self.roots.push(FieldNode::new());
            return Ok(parent.child(self.roots.len() - 1));
        }
        let node = self.node_mut(parent)?;
        if !node.is_nested() {
            return Err(EditError::InvalidOperation {
                path: parent.clone(),
                reason: format!(
                    "fields can only be added to nested groups, this one is `{}`",
                    node.field_type.map_or("untyped", |ty| ty.as_str())
                ),
            });
        }
        node.children.push(FieldNode::new());
        Ok(parent.child(node.children.len() - 1))
    }

    /// Delete the node at `path` and hand it back.
    pub fn remove_field(&mut self, path: &FieldPath) -> Result<FieldNode> {
        let (parent, index) = path
            .split_last()
            .ok_or_else(|| EditError::PathNotFound { path: path.clone() })?;
        let policy = self.policy;

        let siblings = if parent.is_root() {
            &mut self.roots
        } else {
            &mut self.node_mut(&parent)?.children
        };
        if index >= siblings.len() {
            return Err(EditError::PathNotFound { path: path.clone() });
        }

        let empties_group = !parent.is_root() && siblings.len() == 1;
        if empties_group && policy == EmptyGroupPolicy::Reject {
            return Err(EditError::InvalidOperation {
                path: path.clone(),
                reason: "removing the last child would leave the nested group empty".into(),
            });
        }

        let removed = siblings.remove(index);
        if empties_group {
            tracing::debug!(%parent, "re-seeding emptied nested group");
            siblings.push(FieldNode::new());
        }
        Ok(removed)
    }

    pub fn set_type(&mut self, path: &FieldPath, field_type: FieldType) -> Result<()> {
        let node = self.node_mut(path)?;
        let dropped = if field_type.is_nested() { 0 } else { node.children.len() };
        node.retype(field_type);
        if dropped > 0 {
            tracing::debug!(%path, dropped, "discarded children on leaving nested");
        }
        Ok(())
    }

    pub fn set_attribute(&mut self, path: &FieldPath, attr: FieldAttr) -> Result<()> {
        self.node_mut(path)?.apply_attr(attr);
        Ok(())
    }

    /// Deep copy for compilation; never aliases the live tree.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.roots.clone(),
        }
    }

    // --------------------------- Diagnostics ----------------------------- //

    /// Sibling groups whose emitted keys collide. The compiled schema keeps
    /// only the last of each group.
    pub fn duplicate_keys(&self) -> Vec<DuplicateKey> {
        let mut out = Vec::new();
        let mut stack: Vec<(FieldPath, &[FieldNode])> = vec![(FieldPath::root(), self.roots.as_slice())];
        while let Some((parent, siblings)) = stack.pop() {
            let mut seen: IndexMap<&str, Vec<FieldPath>> = IndexMap::new();
            for (ix, node) in siblings.iter().enumerate() {
                let path = parent.child(ix);
                if node.field_type.is_some() {
                    seen.entry(emitted_key(node)).or_default().push(path.clone());
                }
                if !node.children.is_empty() {
                    stack.push((path, node.children.as_slice()));
                }
            }
            out.extend(
                seen.into_iter()
                    .filter(|(_, paths)| paths.len() > 1)
                    .map(|(key, paths)| DuplicateKey {
                        key: key.to_string(),
                        paths,
                    }),
            );
        }
        out.sort_by(|a, b| a.paths[0].indices().cmp(b.paths[0].indices()));
        out
    }

    // ----------------------------- Helpers ------------------------------- //

    fn node_mut(&mut self, path: &FieldPath) -> Result<&mut FieldNode> {
        let not_found = || EditError::PathNotFound { path: path.clone() };
        let (first, rest) = path.indices().split_first().ok_or_else(not_found)?;
        let mut node = self.roots.get_mut(*first).ok_or_else(not_found)?;
        for ix in rest {
            node = node.children.get_mut(*ix).ok_or_else(not_found)?;
        }
        Ok(node)
    }
}

/// Siblings sharing one emitted key, in sibling order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub key: String,
    pub paths: Vec<FieldPath>,
}

/// Immutable copy of a field tree taken at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    nodes: Vec<FieldNode>,
}

impl Snapshot {
    pub fn nodes(&self) -> &[FieldNode] {
        &self.nodes
    }
}
