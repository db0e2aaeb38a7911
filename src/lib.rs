//! Edit Tree: atomic, offset-stable batches of text edits
//!
//! Describe every change against the *original* document, group the
//! changes into a tree, and apply the whole tree in one go. Nobody has to
//! recompute offsets as earlier edits shift later text.
//!
//! # Architecture
//!
//! - [`EditTree`] owns every edit in an arena. Children are added with
//!   [`EditTree::add`], which enforces containment and non-overlap.
//! - Move and copy edits come in source/target pairs linked with
//!   [`EditTree::set_source`]. A moved source takes its nested edits along.
//! - [`EditProcessor`] validates the tree, applies it bottom-up and
//!   right-to-left against a [`Buffer`], then translates every edit's region
//!   to its final position.
//! - [`script`] loads TOML edit scripts into trees.
//!
//! # Example
//!
//! ```
//! use edit_tree::EditTree;
//!
//! let mut buffer = String::from("ABCDEFGHIJ");
//! let mut tree = EditTree::new(buffer.len());
//! let root = tree.root();
//!
//! let source = tree.move_source(2, 3);
//! let target = tree.move_target(8);
//! let nested = tree.replace(3, 1, "d");
//! tree.add(root, source)?;
//! tree.add(root, target)?;
//! tree.add(source, nested)?;
//! tree.set_source(target, source)?;
//!
//! let report = tree.apply(&mut buffer)?;
//! assert_eq!(buffer, "ABFGHCdEIJ");
//! assert_eq!(tree.node(target).offset(), 5);
//!
//! report.undo.expect("undo is recorded by default").apply(&mut buffer)?;
//! assert_eq!(buffer, "ABCDEFGHIJ");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod buffer;
pub mod file;
pub mod processor;
pub mod script;
pub mod tree;

// Re-exports
pub use buffer::{Buffer, BufferError};
pub use processor::{ApplyReport, ApplyStyle, EditProcessor, ProcessorError, UndoLog, UndoStep};
pub use script::{
    load_for_document, load_from_path, load_from_str, BuildError, BuiltTree, EditScript,
    ScriptError,
};
pub use tree::{
    Correspondence, EditId, EditKind, EditNode, EditTree, MalformedReason, MalformedTree,
    TreeCopier,
};
