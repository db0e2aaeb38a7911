//! TOML edit scripts: a declarative way to describe an edit tree.
pub mod builder;
pub mod loader;
pub mod schema;

pub use builder::{BuildError, BuiltTree};
pub use loader::{load_for_document, load_from_path, load_from_str, ScriptError};
pub use schema::{
    EditDefinition, EditScript, EditSpec, Metadata, ValidationError, ValidationIssue,
};
