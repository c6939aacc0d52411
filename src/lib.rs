//! Interactive JSON schema authoring core.
//!
//! A [`FieldTree`] holds what the user has described so far; [`compile`]
//! turns a snapshot of it into a [`SchemaDocument`]; an [`EditSession`] ties
//! the two together, recompiling and republishing after every edit.
pub mod cli;
pub mod compile;
pub mod error;
pub mod field;
pub mod path;
pub mod path_de;
pub mod schema;
pub mod session;
pub mod tree;

pub use compile::compile;
pub use error::{EditError, ExportError};
pub use field::{ArrayItemType, FieldAttr, FieldNode, FieldType};
pub use path::FieldPath;
pub use schema::{SchemaDocument, SchemaNode, SchemaType};
pub use session::{EditEvent, EditOutcome, EditSession, SessionConfig};
pub use tree::{EmptyGroupPolicy, FieldTree, Snapshot};
