//! Deep copies of edit subtrees.
//!
//! Cloning happens in two steps: a structural clone that records every
//! original -> clone pair, then a fixup pass that re-links cloned sources
//! and targets to each other. Partner fields are never copied verbatim, so a
//! clone can never point back into the original tree.

use super::{EditId, EditNode, EditTree};
use std::collections::HashMap;

/// Original -> clone table produced by a copy.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Correspondence {
    map: HashMap<EditId, EditId>,
}

impl Correspondence {
    /// Clone of `original`, if it was part of the copied set.
    pub fn get(&self, original: EditId) -> Option<EditId> {
        self.map.get(&original).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EditId, EditId)> + '_ {
        self.map.iter().map(|(&original, &clone)| (original, clone))
    }
}

pub struct TreeCopier<'a> {
    tree: &'a mut EditTree,
    copies: Correspondence,
}

impl<'a> TreeCopier<'a> {
    pub fn new(tree: &'a mut EditTree) -> Self {
        Self {
            tree,
            copies: Correspondence::default(),
        }
    }

    /// Clone the subtree rooted at `root`. The clone is detached.
    pub fn copy(mut self, root: EditId) -> (EditId, Correspondence) {
        let clone = self.clone_subtree(root);
        self.relink();
        (clone, self.copies)
    }

    /// Clone several subtrees with one shared table, so pairs spanning them
    /// are re-linked too.
    pub fn copy_many(mut self, roots: &[EditId]) -> (Vec<EditId>, Correspondence) {
        let clones = roots.iter().map(|&root| self.clone_subtree(root)).collect();
        self.relink();
        (clones, self.copies)
    }

    fn clone_subtree(&mut self, original: EditId) -> EditId {
        let source = self.tree.node(original);
        let (offset, length, kind) = (source.offset, source.length, source.kind.clone());
        let children = source.children.clone();

        let clone = self.tree.create(offset, length, kind);
        self.copies.map.insert(original, clone);

        let cloned_children: Vec<EditId> = children
            .into_iter()
            .map(|child| self.clone_subtree(child))
            .collect();
        for &child in &cloned_children {
            self.tree.node_mut(child).parent = Some(clone);
        }
        self.tree.node_mut(clone).children = cloned_children;
        clone
    }

    fn relink(&mut self) {
        let pairs: Vec<(EditId, EditId)> = self
            .copies
            .iter()
            .filter_map(|(original, clone)| {
                let node: &EditNode = self.tree.node(original);
                let partner = node.partner?;
                Some((clone, self.copies.get(partner)?))
            })
            .collect();
        // Pairs leaving the copied set stay unlinked on the clone side.
        for (clone, partner_clone) in pairs {
            self.tree.node_mut(clone).partner = Some(partner_clone);
        }
    }
}

impl EditTree {
    /// Deep-copy the subtree rooted at `root` into this tree.
    pub fn copy(&mut self, root: EditId) -> (EditId, Correspondence) {
        TreeCopier::new(self).copy(root)
    }
}
