use std::fmt;

/// Stable handle to a node stored in an [`EditTree`](super::EditTree) arena.
///
/// Handles stay valid for the lifetime of the tree; re-parenting a node only
/// rewrites its parent/children metadata, never its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditId(pub(crate) usize);

impl EditId {
    /// Raw arena index, mainly useful for diagnostics.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node does to the region it governs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    /// Structural container, changes nothing by itself.
    Multi,
    /// Replaces the region with `text`. Zero length inserts, empty text deletes.
    Replace(String),
    /// Tracks a region through the run without changing it.
    Marker,
    /// Region whose text (children included) is moved to the paired target.
    MoveSource,
    /// Zero-length insertion point receiving the paired move source's text.
    MoveTarget,
    /// Region whose text is duplicated at the paired target.
    CopySource,
    /// Zero-length insertion point receiving a copy of the paired source.
    CopyTarget,
}

impl EditKind {
    pub fn is_source(&self) -> bool {
        matches!(self, EditKind::MoveSource | EditKind::CopySource)
    }

    pub fn is_target(&self) -> bool {
        matches!(self, EditKind::MoveTarget | EditKind::CopyTarget)
    }

    pub fn is_paired(&self) -> bool {
        self.is_source() || self.is_target()
    }

    /// The kind this kind links with, if it takes part in a pair.
    pub fn partner_kind(&self) -> Option<EditKind> {
        match self {
            EditKind::MoveSource => Some(EditKind::MoveTarget),
            EditKind::MoveTarget => Some(EditKind::MoveSource),
            EditKind::CopySource => Some(EditKind::CopyTarget),
            EditKind::CopyTarget => Some(EditKind::CopySource),
            _ => None,
        }
    }

    /// Children of a replacing edit vanish with the text they pointed into.
    pub(crate) fn deletes_children(&self) -> bool {
        matches!(self, EditKind::Replace(_))
    }

    /// Only containers may cover regions while having no length themselves.
    pub(crate) fn can_zero_length_cover(&self) -> bool {
        matches!(self, EditKind::Multi)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditKind::Multi => "group",
            EditKind::Replace(_) => "replace",
            EditKind::Marker => "marker",
            EditKind::MoveSource => "move-source",
            EditKind::MoveTarget => "move-target",
            EditKind::CopySource => "copy-source",
            EditKind::CopyTarget => "copy-target",
        }
    }
}

/// One vertex of the edit tree.
#[derive(Debug, Clone)]
pub struct EditNode {
    pub(crate) offset: usize,
    pub(crate) length: usize,
    pub(crate) kind: EditKind,
    pub(crate) parent: Option<EditId>,
    pub(crate) children: Vec<EditId>,
    /// Source <-> target relation. Not an ownership edge.
    pub(crate) partner: Option<EditId>,
    pub(crate) delta: Option<isize>,
    pub(crate) deleted: bool,
}

impl EditNode {
    pub(crate) fn new(offset: usize, length: usize, kind: EditKind) -> Self {
        Self {
            offset,
            length,
            kind,
            parent: None,
            children: Vec::new(),
            partner: None,
            delta: None,
            deleted: false,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn exclusive_end(&self) -> usize {
        self.offset + self.length
    }

    pub fn kind(&self) -> &EditKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<EditId> {
        self.parent
    }

    pub fn children(&self) -> &[EditId] {
        &self.children
    }

    pub fn partner(&self) -> Option<EditId> {
        self.partner
    }

    /// Net length change of this node's own application, once executed.
    pub fn delta(&self) -> Option<isize> {
        self.delta
    }

    /// True when an enclosing edit swallowed this node's region.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Region covered by this node, as a byte range.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.exclusive_end()
    }

    /// Containment check used when adding children.
    pub(crate) fn covers(&self, other: &EditNode) -> bool {
        if self.length == 0 && !self.kind.can_zero_length_cover() {
            return false;
        }
        self.offset <= other.offset && other.exclusive_end() <= self.exclusive_end()
    }
}

/// Shift a coordinate by a signed delta.
pub(crate) fn shift(value: usize, delta: isize) -> usize {
    value.saturating_add_signed(delta)
}
