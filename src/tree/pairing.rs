//! Source/target pairing for move and copy edits.
//!
//! A pair is two plain relation fields, one on each node. Linking refuses a
//! target that sits below its own source, since relocating a subtree into
//! itself has no meaning. The same rule is checked again during validation,
//! because the tree may have been reshaped after linking.

use super::{EditId, EditKind, EditTree, MalformedReason, MalformedTree};
use std::cmp::Reverse;
use std::collections::HashMap;

impl EditTree {
    /// Link `target` to `source`, writing both directions.
    pub fn set_source(&mut self, target: EditId, source: EditId) -> Result<(), MalformedTree> {
        link(self, source, target)
    }

    /// Link `source` to `target`, writing both directions.
    pub fn set_target(&mut self, source: EditId, target: EditId) -> Result<(), MalformedTree> {
        link(self, source, target)
    }

    /// Source linked to a move/copy target, if any.
    pub fn source_of(&self, target: EditId) -> Option<EditId> {
        let node = self.node(target);
        node.kind.is_target().then_some(node.partner).flatten()
    }

    /// Target linked to a move/copy source, if any.
    pub fn target_of(&self, source: EditId) -> Option<EditId> {
        let node = self.node(source);
        node.kind.is_source().then_some(node.partner).flatten()
    }
}

fn link(tree: &mut EditTree, source: EditId, target: EditId) -> Result<(), MalformedTree> {
    if !tree.contains(source) || !tree.contains(target) {
        return Err(MalformedTree::new(
            Some(source),
            target,
            MalformedReason::UnknownEdit,
        ));
    }
    if tree.node(target).partner == Some(source) && tree.node(source).partner == Some(target) {
        return Ok(());
    }

    check_kinds(tree, source, target)?;
    check_ancestry(tree, source, target)?;

    tree.node_mut(target).partner = Some(source);
    tree.node_mut(source).partner = Some(target);
    Ok(())
}

fn check_kinds(tree: &EditTree, source: EditId, target: EditId) -> Result<(), MalformedTree> {
    let source_kind = &tree.node(source).kind;
    let target_kind = &tree.node(target).kind;
    let expected = match source_kind {
        EditKind::MoveSource | EditKind::CopySource => source_kind.partner_kind(),
        _ => None,
    };
    match expected {
        Some(expected) if &expected == target_kind => Ok(()),
        Some(expected) => Err(MalformedTree::new(
            Some(source),
            target,
            MalformedReason::KindMismatch {
                expected: expected.name(),
                found: target_kind.name(),
            },
        )),
        None => Err(MalformedTree::new(
            Some(target),
            source,
            MalformedReason::KindMismatch {
                expected: target_kind
                    .partner_kind()
                    .map_or("source", |kind| kind.name()),
                found: source_kind.name(),
            },
        )),
    }
}

fn check_ancestry(tree: &EditTree, source: EditId, target: EditId) -> Result<(), MalformedTree> {
    match tree.ancestors(target).find(|&ancestor| ancestor == source) {
        Some(ancestor) => Err(MalformedTree::new(
            Some(ancestor),
            target,
            MalformedReason::TargetInsideSource,
        )),
        None => Ok(()),
    }
}

/// Validation-time check of one node's pairing.
pub(crate) fn check_pair(tree: &EditTree, id: EditId) -> Result<(), MalformedTree> {
    let node = tree.node(id);
    if !node.kind.is_paired() {
        return Ok(());
    }
    let is_target = node.kind.is_target();
    let Some(partner) = node.partner else {
        let reason = if is_target {
            MalformedReason::NoSource
        } else {
            MalformedReason::NoTarget
        };
        return Err(MalformedTree::new(node.parent, id, reason));
    };

    let partner_node = tree.node(partner);
    if Some(&partner_node.kind) != node.kind.partner_kind().as_ref() {
        return Err(MalformedTree::new(
            node.parent,
            id,
            MalformedReason::KindMismatch {
                expected: node.kind.partner_kind().map_or("edit", |kind| kind.name()),
                found: partner_node.kind.name(),
            },
        ));
    }
    if partner_node.partner != Some(id) {
        let reason = if is_target {
            MalformedReason::DifferentTarget
        } else {
            MalformedReason::DifferentSource
        };
        return Err(MalformedTree::new(node.parent, id, reason));
    }
    if tree.top(partner) != tree.top(id) {
        return Err(MalformedTree::new(
            node.parent,
            id,
            MalformedReason::PartnerNotInTree,
        ));
    }
    if is_target {
        check_ancestry(tree, partner, id)?;
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    Done,
}

/// Linked sources below `root`, ordered so that every source comes after
/// the sources whose targets sit inside it.
///
/// A source's content is captured with its own children already applied,
/// so a target inside it needs its partner's content first. Among
/// independent sources the deeper one goes first.
pub(crate) fn capture_order(
    tree: &EditTree,
    root: EditId,
) -> Result<Vec<EditId>, MalformedTree> {
    let mut sources: Vec<EditId> = tree
        .descendants(root)
        .into_iter()
        .filter(|&id| {
            let node = tree.node(id);
            node.kind.is_source() && node.partner.is_some()
        })
        .collect();
    sources.sort_by_key(|&id| Reverse(tree.depth(id)));

    // enclosing source -> sources whose targets it contains
    let mut waits_on: HashMap<EditId, Vec<EditId>> = HashMap::new();
    for &source in &sources {
        let Some(target) = tree.node(source).partner else {
            continue;
        };
        for ancestor in tree.ancestors(target) {
            let node = tree.node(ancestor);
            if node.kind.is_source() && node.partner.is_some() {
                waits_on.entry(ancestor).or_default().push(source);
            }
        }
    }

    let mut visits = HashMap::with_capacity(sources.len());
    let mut order = Vec::with_capacity(sources.len());
    for &source in &sources {
        visit(tree, source, &waits_on, &mut visits, &mut order)?;
    }
    Ok(order)
}

fn visit(
    tree: &EditTree,
    source: EditId,
    waits_on: &HashMap<EditId, Vec<EditId>>,
    visits: &mut HashMap<EditId, Visit>,
    order: &mut Vec<EditId>,
) -> Result<(), MalformedTree> {
    match visits.get(&source) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::Pending) => {
            return Err(MalformedTree::new(
                tree.node(source).parent,
                source,
                MalformedReason::SourceCycle,
            ))
        }
        None => {}
    }
    visits.insert(source, Visit::Pending);
    for &dependency in waits_on.get(&source).into_iter().flatten() {
        visit(tree, dependency, waits_on, visits, order)?;
    }
    visits.insert(source, Visit::Done);
    order.push(source);
    Ok(())
}
