//! Arena-backed edit tree.
//!
//! Nodes live in a single `Vec` and are addressed by [`EditId`]. The tree
//! owns every node; parent/child edges and source/target pairs are plain
//! handles, so relocating a subtree is a metadata update.

pub mod copier;
pub mod errors;
pub mod node;
pub mod pairing;

pub use copier::{Correspondence, TreeCopier};
pub use errors::{MalformedReason, MalformedTree};
pub use node::{EditId, EditKind, EditNode};

use node::shift;

#[derive(Debug, Clone)]
pub struct EditTree {
    nodes: Vec<EditNode>,
    root: EditId,
}

impl EditTree {
    /// Create a tree whose root group covers `[0, document_len)`.
    pub fn new(document_len: usize) -> Self {
        Self {
            nodes: vec![EditNode::new(0, document_len, EditKind::Multi)],
            root: EditId(0),
        }
    }

    pub fn root(&self) -> EditId {
        self.root
    }

    /// Number of edits in the arena, detached ones and the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: EditId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this tree.
    pub fn node(&self, id: EditId) -> &EditNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: EditId) -> Option<&EditNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: EditId) -> &mut EditNode {
        &mut self.nodes[id.0]
    }

    // ---- node construction -------------------------------------------------

    /// Create a detached node. Attach it with [`add`](Self::add).
    pub fn create(&mut self, offset: usize, length: usize, kind: EditKind) -> EditId {
        let id = EditId(self.nodes.len());
        self.nodes.push(EditNode::new(offset, length, kind));
        id
    }

    pub fn replace(&mut self, offset: usize, length: usize, text: impl Into<String>) -> EditId {
        self.create(offset, length, EditKind::Replace(text.into()))
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) -> EditId {
        self.replace(offset, 0, text)
    }

    pub fn delete(&mut self, offset: usize, length: usize) -> EditId {
        self.replace(offset, length, String::new())
    }

    pub fn group(&mut self, offset: usize, length: usize) -> EditId {
        self.create(offset, length, EditKind::Multi)
    }

    pub fn marker(&mut self, offset: usize, length: usize) -> EditId {
        self.create(offset, length, EditKind::Marker)
    }

    pub fn move_source(&mut self, offset: usize, length: usize) -> EditId {
        self.create(offset, length, EditKind::MoveSource)
    }

    pub fn move_target(&mut self, offset: usize) -> EditId {
        self.create(offset, 0, EditKind::MoveTarget)
    }

    pub fn copy_source(&mut self, offset: usize, length: usize) -> EditId {
        self.create(offset, length, EditKind::CopySource)
    }

    pub fn copy_target(&mut self, offset: usize) -> EditId {
        self.create(offset, 0, EditKind::CopyTarget)
    }

    // ---- structure ---------------------------------------------------------

    /// Attach `child` below `parent`, keeping siblings ordered by offset.
    ///
    /// Fails without touching the tree if the child does not fit.
    pub fn add(&mut self, parent: EditId, child: EditId) -> Result<(), MalformedTree> {
        let index = self.insertion_index(parent, child)?;
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.insert(index, child);
        Ok(())
    }

    /// Add several children, stopping at the first conflict.
    pub fn add_all(&mut self, parent: EditId, children: &[EditId]) -> Result<(), MalformedTree> {
        for &child in children {
            self.add(parent, child)?;
        }
        Ok(())
    }

    /// Dry run of [`add`](Self::add).
    pub fn can_add(&self, parent: EditId, child: EditId) -> Result<(), MalformedTree> {
        self.insertion_index(parent, child).map(|_| ())
    }

    fn insertion_index(&self, parent: EditId, child: EditId) -> Result<usize, MalformedTree> {
        let malformed = |reason| MalformedTree::new(Some(parent), child, reason);

        if !self.contains(parent) || !self.contains(child) {
            return Err(malformed(MalformedReason::UnknownEdit));
        }
        let parent_node = self.node(parent);
        let child_node = self.node(child);

        if parent_node.kind.is_target() {
            return Err(malformed(MalformedReason::TargetCannotHaveChildren));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(malformed(MalformedReason::Cycle));
        }
        if child_node.parent.is_some() {
            return Err(malformed(MalformedReason::AlreadyHasParent));
        }
        if !parent_node.covers(child_node) {
            return Err(malformed(MalformedReason::OutsideParent));
        }

        let siblings = &parent_node.children;
        let (offset, length) = (child_node.offset, child_node.length);

        // Fast path: appending after the last sibling.
        match siblings.last() {
            None => return Ok(0),
            Some(&last) if self.node(last).exclusive_end() <= offset => {
                return Ok(siblings.len());
            }
            Some(_) => {}
        }

        // Insertion points sharing an offset stay in insertion order, so the
        // new child goes after every sibling it compares equal to.
        let mut index = 0;
        for &sibling in siblings {
            let other = self.node(sibling);
            if other.offset == offset && other.length == 0 && length == 0 {
                index += 1;
                continue;
            }
            if other.exclusive_end() <= offset {
                index += 1;
                continue;
            }
            if offset + length <= other.offset {
                break;
            }
            return Err(malformed(MalformedReason::Overlapping { sibling }));
        }
        Ok(index)
    }

    /// Detach `child` from `parent`.
    pub fn remove_child(&mut self, parent: EditId, child: EditId) -> Result<(), MalformedTree> {
        let position = self
            .get(parent)
            .and_then(|node| node.children.iter().position(|&c| c == child))
            .ok_or_else(|| MalformedTree::new(Some(parent), child, MalformedReason::UnknownEdit))?;
        self.node_mut(parent).children.remove(position);
        self.node_mut(child).parent = None;
        Ok(())
    }

    /// Detach and return every child of `parent`.
    pub fn remove_children(&mut self, parent: EditId) -> Vec<EditId> {
        let children = std::mem::take(&mut self.node_mut(parent).children);
        for &child in &children {
            self.node_mut(child).parent = None;
        }
        children
    }

    /// Does `ancestor` appear above `id`?
    pub fn is_ancestor(&self, ancestor: EditId, id: EditId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: EditId) -> impl Iterator<Item = EditId> + '_ {
        std::iter::successors(self.node(id).parent, move |&p| self.node(p).parent)
    }

    /// Pre-order walk of the subtree rooted at `id`.
    pub fn descendants(&self, id: EditId) -> Vec<EditId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.node(next).children.iter().rev().copied());
        }
        out
    }

    /// Topmost ancestor of `id`: the root for attached edits.
    pub fn top(&self, id: EditId) -> EditId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Number of edges between `id` and the top of its tree.
    pub fn depth(&self, id: EditId) -> usize {
        self.ancestors(id).count()
    }

    /// Does the region of `a` contain the region of `b`?
    pub fn covers(&self, a: EditId, b: EditId) -> bool {
        self.node(a).covers(self.node(b))
    }

    // ---- coordinates -------------------------------------------------------

    /// Shift `id` and everything below it by `delta`.
    pub(crate) fn move_tree(&mut self, id: EditId, delta: isize) {
        for node in self.descendants(id) {
            let node = self.node_mut(node);
            node.offset = shift(node.offset, delta);
        }
    }

    /// Mark `id` and everything below it as deleted.
    pub(crate) fn delete_tree(&mut self, id: EditId) {
        for node in self.descendants(id) {
            self.node_mut(node).deleted = true;
        }
    }

    // ---- validation --------------------------------------------------------

    /// Validation pass over the whole tree. Pure: never touches a buffer.
    pub fn validate(&self) -> Result<(), MalformedTree> {
        self.validate_subtree(self.root)
    }

    pub fn validate_subtree(&self, id: EditId) -> Result<(), MalformedTree> {
        for node in self.descendants(id) {
            pairing::check_pair(self, node)?;
        }
        pairing::capture_order(self, id).map(drop)
    }
}
