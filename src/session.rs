//! Editing session: one field tree plus the schema derived from it.
//!
//! Data flows one way. An edit mutates the tree; if it succeeds the whole
//! tree is snapshotted and recompiled, and the fresh schema is published to
//! every listener. A refused edit changes nothing, so the published schema
//! always matches the tree.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compile::compile;
use crate::error::{EditError, ExportError};
use crate::field::{FieldAttr, FieldNode, FieldType};
use crate::path::FieldPath;
use crate::schema::{EXPORT_FILE_NAME, SchemaDocument};
use crate::tree::{DuplicateKey, EmptyGroupPolicy, FieldTree};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One discrete edit from the editing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditEvent {
    AddField {
        #[serde(default)]
        parent: FieldPath,
    },
    RemoveField {
        path: FieldPath,
    },
    SetType {
        path: FieldPath,
        #[serde(rename = "type")]
        field_type: FieldType,
    },
    SetAttribute {
        path: FieldPath,
        #[serde(flatten)]
        attr: FieldAttr,
    },
}

/// What a successful edit produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Added(FieldPath),
    Removed(FieldNode),
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub empty_group_policy: EmptyGroupPolicy,
    /// Start with one default root row instead of an empty list.
    pub seed_root_row: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            empty_group_policy: EmptyGroupPolicy::default(),
            seed_root_row: true,
        }
    }
}

type Listener = Box<dyn FnMut(u64, &SchemaDocument)>;

pub struct EditSession {
    tree: FieldTree,
    schema: SchemaDocument,
    revision: u64,
    listeners: Vec<Listener>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Default for EditSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl EditSession {
    pub fn new(config: SessionConfig) -> Self {
        let tree = if config.seed_root_row { FieldTree::seeded() } else { FieldTree::new() };
        Self::from_tree(tree.with_policy(config.empty_group_policy))
    }

    /// Start from an existing tree; its schema is compiled right away.
    pub fn from_tree(tree: FieldTree) -> Self {
        let schema = compile(tree.snapshot().nodes());
        Self {
            tree,
            schema,
            revision: 0,
            listeners: Vec::new(),
        }
    }

    pub fn tree(&self) -> &FieldTree {
        &self.tree
    }

    /// The latest compiled schema.
    pub fn current_schema(&self) -> &SchemaDocument {
        &self.schema
    }

    /// Number of successful edits so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn duplicate_keys(&self) -> Vec<DuplicateKey> {
        self.tree.duplicate_keys()
    }

    /// Register a callback that receives every newly published schema.
    pub fn subscribe(&mut self, listener: impl FnMut(u64, &SchemaDocument) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn apply(&mut self, event: EditEvent) -> Result<EditOutcome, EditError> {
        tracing::debug!(?event, revision = self.revision, "applying edit");
        let outcome = match event {
            EditEvent::AddField { parent } => self.tree.add_field(&parent).map(EditOutcome::Added),
            EditEvent::RemoveField { path } => self.tree.remove_field(&path).map(EditOutcome::Removed),
            EditEvent::SetType { path, field_type } => {
                self.tree.set_type(&path, field_type).map(|_| EditOutcome::Updated)
            }
            EditEvent::SetAttribute { path, attr } => {
                self.tree.set_attribute(&path, attr).map(|_| EditOutcome::Updated)
            }
        }?;
        self.recompute();
        Ok(outcome)
    }

    pub fn add_field(&mut self, parent: &FieldPath) -> Result<FieldPath, EditError> {
        let path = self.tree.add_field(parent)?;
        self.recompute();
        Ok(path)
    }

    pub fn remove_field(&mut self, path: &FieldPath) -> Result<FieldNode, EditError> {
        let removed = self.tree.remove_field(path)?;
        self.recompute();
        Ok(removed)
    }

    pub fn set_type(&mut self, path: &FieldPath, field_type: FieldType) -> Result<(), EditError> {
        self.tree.set_type(path, field_type)?;
        self.recompute();
        Ok(())
    }

    pub fn set_attribute(&mut self, path: &FieldPath, attr: FieldAttr) -> Result<(), EditError> {
        self.tree.set_attribute(path, attr)?;
        self.recompute();
        Ok(())
    }

    /// Pretty JSON of the current schema.
    pub fn export_string(&self) -> Result<String, ExportError> {
        Ok(self.schema.to_pretty_json()?)
    }

    /// Write the current schema to `dir/schema.json`. The session itself is
    /// not affected.
    pub fn export_file(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let text = self.export_string()?;
        let path = dir.join(EXPORT_FILE_NAME);
        let io_err = |source| ExportError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;
        std::fs::write(&path, text).map_err(io_err)?;
        tracing::info!(path = %path.display(), revision = self.revision, "exported schema");
        Ok(path)
    }

    // full recompute on every edit, never partial
    fn recompute(&mut self) {
        self.revision += 1;
        let snapshot = self.tree.snapshot();
        self.schema = compile(snapshot.nodes());
        tracing::debug!(
            revision = self.revision,
            fields = self.tree.len(),
            keys = self.schema.len(),
            "published schema"
        );
        for listener in &mut self.listeners {
            listener(self.revision, &self.schema);
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn p<const N: usize>(ix: [usize; N]) -> FieldPath {
        FieldPath::from(ix)
    }

    fn key(path: FieldPath, key: &str) -> EditEvent {
        EditEvent::SetAttribute {
            path,
            attr: FieldAttr::Key(key.into()),
        }
    }

    #[test]
    fn fresh_session_shows_placeholder_row() {
        let session = EditSession::default();
        assert_eq!(
            session.current_schema().to_value().unwrap(),
            json!({ "---": { "type": "string" } })
        );
        assert_eq!(session.revision(), 0);
    }

    #[test]
    fn unseeded_session_starts_empty() {
        let session = EditSession::new(SessionConfig {
            seed_root_row: false,
            ..SessionConfig::default()
        });
        assert!(session.current_schema().is_empty());
        assert!(session.tree().is_empty());
    }

    #[test]
    fn every_edit_republishes() {
        let mut session = EditSession::default();
        session.apply(key(p([0]), "addr")).unwrap();
        session
            .apply(EditEvent::SetType { path: p([0]), field_type: FieldType::Nested })
            .unwrap();
        session.apply(key(p([0, 0]), "city")).unwrap();
        session.apply(EditEvent::AddField { parent: p([0]) }).unwrap();
        session.apply(key(p([0, 1]), "zip")).unwrap();
        session
            .apply(EditEvent::SetType { path: p([0, 1]), field_type: FieldType::Number })
            .unwrap();

        assert_eq!(session.revision(), 6);
        assert_eq!(
            session.current_schema().to_value().unwrap(),
            json!({
                "addr": {
                    "type": "object",
                    "properties": {
                        "city": { "type": "string" },
                        "zip": { "type": "number" }
                    }
                }
            })
        );
    }

    #[test]
    fn failed_edit_keeps_schema_and_revision() {
        let mut session = EditSession::default();
        session.apply(key(p([0]), "name")).unwrap();
        let before = session.current_schema().clone();

        let err = session.apply(key(p([7]), "nope")).unwrap_err();
        assert_eq!(err, EditError::PathNotFound { path: p([7]) });
        assert_eq!(session.current_schema(), &before);
        assert_eq!(session.revision(), 1);
    }

    #[test]
    fn rejecting_policy_surfaces_invalid_operation() {
        let mut session = EditSession::new(SessionConfig {
            empty_group_policy: EmptyGroupPolicy::Reject,
            ..SessionConfig::default()
        });
        session.set_type(&p([0]), FieldType::Nested).unwrap();
        let err = session.remove_field(&p([0, 0])).unwrap_err();
        assert!(matches!(err, EditError::InvalidOperation { .. }));
        assert_eq!(session.tree().get(&p([0])).unwrap().children.len(), 1);
    }

    #[test]
    fn listeners_see_each_revision() {
        let seen: Rc<RefCell<Vec<(u64, usize)>>> = Rc::default();
        let mut session = EditSession::default();
        let sink = Rc::clone(&seen);
        session.subscribe(move |rev, schema| sink.borrow_mut().push((rev, schema.len())));

        session.add_field(&FieldPath::root()).unwrap();
        session.set_attribute(&p([1]), FieldAttr::Key("b".into())).unwrap();
        let _ = session.remove_field(&p([9]));

        // two empty keys collapse into one "---" entry until the rename
        assert_eq!(*seen.borrow(), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn edit_events_read_from_json() {
        let events: Vec<EditEvent> = serde_json::from_value(json!([
            { "op": "add_field" },
            { "op": "add_field", "parent": [0] },
            { "op": "remove_field", "path": [1] },
            { "op": "set_type", "path": [0], "type": "enum" },
            { "op": "set_attribute", "path": [0], "attr": "required", "value": true },
            { "op": "set_attribute", "path": [0, 1], "attr": "arrayItemType", "value": "object" }
        ]))
        .unwrap();
        assert_eq!(events[0], EditEvent::AddField { parent: FieldPath::root() });
        assert_eq!(events[3], EditEvent::SetType { path: p([0]), field_type: FieldType::Enum });
        assert_eq!(
            events[4],
            EditEvent::SetAttribute { path: p([0]), attr: FieldAttr::Required(true) }
        );
        assert_eq!(
            events[5],
            EditEvent::SetAttribute {
                path: p([0, 1]),
                attr: FieldAttr::ArrayItemType("object".into())
            }
        );
    }

    #[test]
    fn export_writes_schema_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EditSession::default();
        session.set_attribute(&p([0]), FieldAttr::Key("status".into())).unwrap();
        session.set_type(&p([0]), FieldType::Enum).unwrap();
        session
            .set_attribute(&p([0]), FieldAttr::EnumValues("on, off".into()))
            .unwrap();

        let path = session.export_file(&dir.path().join("out")).unwrap();
        assert_eq!(path.file_name().unwrap(), "schema.json");
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, session.export_string().unwrap());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({ "status": { "type": "string", "enum": ["on", "off"] } }));
    }
}
