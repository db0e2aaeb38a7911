//! Three-pass execution of an edit tree against a buffer.
//!
//! 1. **Validate**: pure walk of the tree; rejects dangling or mismatched
//!    source/target pairs before anything is written.
//! 2. **Apply**: source texts are captured first (deepest sources first, each
//!    source's own children applied to a scratch copy of its text), then the
//!    tree is applied children-before-parent and right-to-left, so the
//!    original offsets of every not-yet-applied edit stay valid.
//! 3. **Update regions**: top-down, left-to-right walk translating every
//!    node to its final position by the running sum of earlier deltas.
//!
//! Buffer errors during pass two are fatal; the buffer is not rolled back
//! unless the caller replays the [`UndoLog`].

mod undo;

pub use undo::{UndoLog, UndoStep};

use crate::buffer::{Buffer, BufferError};
use crate::tree::node::shift;
use crate::tree::pairing::capture_order;
use crate::tree::{EditId, EditKind, EditTree, MalformedTree, TreeCopier};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace};
use undo::UndoRecorder;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error(transparent)]
    Malformed(#[from] MalformedTree),

    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("content of source edit {edit} is not available (missing or already consumed)")]
    ContentUnavailable { edit: EditId },
}

/// What the processor does besides mutating the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyStyle {
    /// Translate node regions to their final positions (pass three).
    pub update_regions: bool,
    /// Record an [`UndoLog`] of every replacement.
    pub create_undo: bool,
}

impl ApplyStyle {
    pub const NONE: ApplyStyle = ApplyStyle {
        update_regions: false,
        create_undo: false,
    };
}

impl Default for ApplyStyle {
    fn default() -> Self {
        Self {
            update_regions: true,
            create_undo: true,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ApplyReport carries the undo log of the run"]
pub struct ApplyReport {
    /// Final buffer length minus initial buffer length.
    pub delta: isize,
    pub undo: Option<UndoLog>,
}

/// Text captured from a source edit, plus the detached group holding its
/// processed children until the paired target adopts them.
#[derive(Debug, Default)]
struct Capture {
    content: String,
    lifted: Option<EditId>,
}

pub struct EditProcessor<'a> {
    tree: &'a mut EditTree,
    style: ApplyStyle,
    captures: HashMap<EditId, Capture>,
}

impl<'a> EditProcessor<'a> {
    pub fn new(tree: &'a mut EditTree, style: ApplyStyle) -> Self {
        Self {
            tree,
            style,
            captures: HashMap::new(),
        }
    }

    /// Pass one on its own. Never touches a buffer, so it can run any number
    /// of times before [`perform`](Self::perform).
    pub fn validate(&self) -> Result<(), MalformedTree> {
        self.tree.validate()
    }

    /// Execute the tree against `buffer`. Consumes the processor: a tree is
    /// applied at most once.
    pub fn perform<B: Buffer + ?Sized>(
        mut self,
        buffer: &mut B,
    ) -> Result<ApplyReport, ProcessorError> {
        let root = self.tree.root();
        debug!(nodes = self.tree.node_count(), "validating edit tree");
        self.tree.validate()?;

        let end = self.tree.node(root).exclusive_end();
        if end > buffer.len() {
            return Err(BufferError::InvalidRange {
                offset: self.tree.node(root).offset(),
                length: self.tree.node(root).length(),
                buffer_len: buffer.len(),
            }
            .into());
        }

        let update_regions = self.style.update_regions;
        let (delta, undo) = if self.style.create_undo {
            let mut recorder = UndoRecorder::new(buffer);
            let delta = self.run(root, &mut recorder, update_regions)?;
            (delta, Some(recorder.finish()))
        } else {
            (self.run(root, buffer, update_regions)?, None)
        };
        debug!(delta, "edit tree applied");
        Ok(ApplyReport { delta, undo })
    }

    /// Passes two and three over the subtree rooted at `root`.
    fn run<B: Buffer + ?Sized>(
        &mut self,
        root: EditId,
        buffer: &mut B,
        update_regions: bool,
    ) -> Result<isize, ProcessorError> {
        self.capture_sources(root, buffer)?;
        let delta = self.update_document(root, buffer)?;
        if update_regions {
            self.update_regions(root, 0, false);
        }
        Ok(delta)
    }

    // ---- pass two: source capture ------------------------------------------

    fn capture_sources<B: Buffer + ?Sized>(
        &mut self,
        root: EditId,
        buffer: &mut B,
    ) -> Result<(), ProcessorError> {
        let sources = capture_order(self.tree, root)?;
        for source in sources {
            if self.captures.contains_key(&source) {
                continue;
            }
            let is_move = matches!(self.tree.node(source).kind(), EditKind::MoveSource);
            let capture = if is_move {
                let children = self.tree.remove_children(source);
                self.capture(source, children, buffer)?
            } else {
                let children = self.tree.node(source).children().to_vec();
                let (clones, _) = TreeCopier::new(self.tree).copy_many(&children);
                self.capture(source, clones, buffer)?
            };
            debug!(
                %source,
                bytes = capture.content.len(),
                "captured source content"
            );
            self.captures.insert(source, capture);
        }
        Ok(())
    }

    /// Read the source text and apply `children` to a scratch copy of it.
    fn capture<B: Buffer + ?Sized>(
        &mut self,
        source: EditId,
        children: Vec<EditId>,
        buffer: &mut B,
    ) -> Result<Capture, ProcessorError> {
        let (offset, length) = {
            let node = self.tree.node(source);
            (node.offset(), node.length())
        };
        let mut content = buffer.text(offset, length)?;
        if children.is_empty() {
            return Ok(Capture {
                content,
                lifted: None,
            });
        }

        let group = self.tree.group(0, length);
        for &child in &children {
            self.tree.move_tree(child, -(offset as isize));
            self.tree.node_mut(child).parent = Some(group);
        }
        self.tree.node_mut(group).children = children;

        self.run(group, &mut content, true)?;
        Ok(Capture {
            content,
            lifted: Some(group),
        })
    }

    // ---- pass two: document update -----------------------------------------

    fn update_document<B: Buffer + ?Sized>(
        &mut self,
        id: EditId,
        buffer: &mut B,
    ) -> Result<isize, ProcessorError> {
        let children = self.tree.node(id).children().to_vec();
        let mut delta = 0;
        for &child in children.iter().rev() {
            delta += self.update_document(child, buffer)?;
        }
        if delta != 0 {
            let node = self.tree.node_mut(id);
            node.length = shift(node.length, delta);
        }
        let own = self.perform_edit(id, buffer)?;
        self.tree.node_mut(id).delta = Some(own);
        Ok(delta + own)
    }

    fn perform_edit<B: Buffer + ?Sized>(
        &mut self,
        id: EditId,
        buffer: &mut B,
    ) -> Result<isize, ProcessorError> {
        let node = self.tree.node(id);
        let (offset, length) = (node.offset(), node.length());
        let text = match node.kind() {
            EditKind::Replace(text) => Some(text.clone()),
            EditKind::MoveSource => Some(String::new()),
            EditKind::MoveTarget | EditKind::CopyTarget => None,
            EditKind::Multi | EditKind::Marker | EditKind::CopySource => return Ok(0),
        };
        let Some(text) = text else {
            return self.perform_target(id, buffer);
        };

        trace!(%id, offset, length, bytes = text.len(), "replace");
        buffer.replace(offset, length, &text)?;
        self.tree.node_mut(id).length = text.len();
        Ok(text.len() as isize - length as isize)
    }

    fn perform_target<B: Buffer + ?Sized>(
        &mut self,
        id: EditId,
        buffer: &mut B,
    ) -> Result<isize, ProcessorError> {
        let node = self.tree.node(id);
        let (offset, length) = (node.offset(), node.length());
        // Only copied subtrees can hold a target whose source was left behind.
        let capture = match node.partner() {
            Some(source) => self
                .captures
                .remove(&source)
                .ok_or(ProcessorError::ContentUnavailable { edit: source })?,
            None => Capture::default(),
        };

        trace!(%id, offset, bytes = capture.content.len(), "insert source content");
        buffer.replace(offset, length, &capture.content)?;
        self.tree.node_mut(id).length = capture.content.len();

        if let Some(group) = capture.lifted {
            let adopted = self.tree.remove_children(group);
            for &child in &adopted {
                self.tree.move_tree(child, offset as isize);
                self.tree.node_mut(child).parent = Some(id);
            }
            self.tree.node_mut(id).children = adopted;
        }
        Ok(capture.content.len() as isize - length as isize)
    }

    // ---- pass three: region update -----------------------------------------

    fn update_regions(&mut self, id: EditId, accumulated: isize, delete: bool) -> isize {
        let node = self.tree.node(id);
        let own = node.delta().unwrap_or(0);

        // Adopted children already carry coordinates relative to the target.
        if node.kind().is_target() {
            if delete {
                self.tree.delete_tree(id);
            } else {
                self.tree.move_tree(id, accumulated);
            }
            return accumulated + own;
        }

        let child_delete = delete || node.kind().deletes_children();
        let children = node.children().to_vec();
        let node = self.tree.node_mut(id);
        if delete {
            node.deleted = true;
        } else {
            node.offset = shift(node.offset, accumulated);
        }

        let mut running = accumulated;
        for child in children {
            running = self.update_regions(child, running, child_delete);
        }
        running + own
    }
}

impl EditTree {
    /// Apply this tree to `buffer` with the default [`ApplyStyle`].
    pub fn apply<B: Buffer + ?Sized>(
        &mut self,
        buffer: &mut B,
    ) -> Result<ApplyReport, ProcessorError> {
        EditProcessor::new(self, ApplyStyle::default()).perform(buffer)
    }

    pub fn apply_with<B: Buffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        style: ApplyStyle,
    ) -> Result<ApplyReport, ProcessorError> {
        EditProcessor::new(self, style).perform(buffer)
    }
}
