use super::EditId;
use thiserror::Error;

/// Structural error: an edit conflicts with its parent, a sibling, or its partner.
///
/// Raised eagerly by [`EditTree::add`](super::EditTree::add), by pair linking,
/// and by the validation pass before any buffer mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed edit tree at {child} (parent {}): {reason}", fmt_parent(.parent))]
pub struct MalformedTree {
    /// Parent (or ancestor) involved in the conflict, if any.
    pub parent: Option<EditId>,
    /// The offending edit.
    pub child: EditId,
    pub reason: MalformedReason,
}

impl MalformedTree {
    pub(crate) fn new(parent: Option<EditId>, child: EditId, reason: MalformedReason) -> Self {
        Self {
            parent,
            child,
            reason,
        }
    }
}

fn fmt_parent(parent: &Option<EditId>) -> String {
    match parent {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("range of child edit lies outside of parent edit")]
    OutsideParent,

    #[error("overlapping text edits (conflicts with {sibling})")]
    Overlapping { sibling: EditId },

    #[error("edit is already child of another edit")]
    AlreadyHasParent,

    #[error("edit cannot be added below itself")]
    Cycle,

    #[error("move and copy targets cannot have child edits")]
    TargetCannotHaveChildren,

    #[error("target is descendant of its source")]
    TargetInsideSource,

    #[error("cannot pair a {found} edit with a {expected} edit")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("target edit has no source edit")]
    NoSource,

    #[error("source edit has no target edit")]
    NoTarget,

    #[error("source edit is linked to a different target")]
    DifferentTarget,

    #[error("target edit is linked to a different source")]
    DifferentSource,

    #[error("edit is not part of this tree")]
    UnknownEdit,

    #[error("partner edit is not part of the same tree")]
    PartnerNotInTree,

    #[error("source edits are moved into each other")]
    SourceCycle,
}
