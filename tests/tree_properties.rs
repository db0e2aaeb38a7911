//! Property-based invariant tests for edit trees.
//!
//! 1. Successful adds keep children contained and pairwise disjoint;
//!    failed adds leave the tree untouched.
//! 2. Plain edits produce the same text as naive left-to-right splicing.
//! 3. The report delta and the per-edit deltas both add up to the
//!    change in document length.
//! 4. Every edit's final region holds exactly the text it wrote.
//! 5. Moves produce the expected reordering wherever source and target sit.
//! 6. Validation is repeatable.
//! 7. Undo restores the original document.
//! 8. Random trees with nested move and copy pairs match a reference
//!    evaluator, conserve deltas, and leave every target holding its
//!    source's text.

use edit_tree::{EditId, EditKind, EditTree, MalformedReason};
use proptest::sample::Index;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

/// (gap before edit, replaced length, replacement text)
fn plain_edits_strategy() -> impl Strategy<Value = Vec<(usize, usize, String)>> {
    prop::collection::vec((0usize..4, 0usize..4, "[a-z]{0,4}"), 0..12)
}

fn layout(edits: &[(usize, usize, String)]) -> Vec<(usize, usize, String)> {
    let mut position = 0;
    edits
        .iter()
        .map(|(gap, length, text)| {
            let offset = position + gap;
            position = offset + length;
            (offset, *length, text.clone())
        })
        .collect()
}

fn splice(document: &str, edits: &[(usize, usize, String)]) -> String {
    let mut out = String::new();
    let mut position = 0;
    for (offset, length, text) in edits {
        out.push_str(&document[position..*offset]);
        out.push_str(text);
        position = offset + length;
    }
    out.push_str(&document[position..]);
    out
}

fn check_structure(tree: &EditTree, id: EditId) {
    let node = tree.node(id);
    let mut previous_end = node.offset();
    for &child in node.children() {
        let child_node = tree.node(child);
        assert_eq!(child_node.parent(), Some(id));
        assert!(child_node.offset() >= previous_end, "siblings overlap");
        assert!(child_node.exclusive_end() <= node.exclusive_end(), "child escapes parent");
        previous_end = child_node.exclusive_end();
        check_structure(tree, child);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Containment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn adds_keep_tree_well_formed(
        attempts in prop::collection::vec((0usize..40, 0usize..12, any::<prop::sample::Index>()), 1..40)
    ) {
        let mut tree = EditTree::new(40);
        let mut attached = vec![tree.root()];

        for (offset, length, parent_pick) in attempts {
            let parent = attached[parent_pick.index(attached.len())];
            let child = tree.marker(offset, length);
            let before = tree.node(parent).children().to_vec();

            match tree.add(parent, child) {
                Ok(()) => attached.push(child),
                Err(err) => {
                    prop_assert_eq!(err.child, child);
                    let reason_ok = matches!(
                        err.reason,
                        MalformedReason::OutsideParent | MalformedReason::Overlapping { .. }
                    );
                    prop_assert!(reason_ok);
                    prop_assert_eq!(tree.node(parent).children(), before.as_slice());
                    prop_assert_eq!(tree.node(child).parent(), None);
                }
            }
        }
        check_structure(&tree, tree.root());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2-4. Plain edits
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn plain_edits_match_naive_splicing(raw in plain_edits_strategy(), tail in 0usize..5) {
        let edits = layout(&raw);
        let document_len = edits.last().map_or(0, |(o, l, _)| o + l) + tail;
        let document: String = (0..document_len)
            .map(|i| char::from(b'A' + (i % 26) as u8))
            .collect();

        let mut tree = EditTree::new(document_len);
        let root = tree.root();
        let ids: Vec<EditId> = edits
            .iter()
            .map(|(offset, length, text)| tree.replace(*offset, *length, text.clone()))
            .collect();
        for &id in &ids {
            tree.add(root, id).unwrap();
        }

        let mut buffer = document.clone();
        let report = tree.apply(&mut buffer).unwrap();

        prop_assert_eq!(&buffer, &splice(&document, &edits));
        prop_assert_eq!(report.delta, buffer.len() as isize - document.len() as isize);

        let delta_sum: isize = ids.iter().map(|&id| tree.node(id).delta().unwrap()).sum();
        prop_assert_eq!(delta_sum, report.delta);

        for (&id, (_, _, text)) in ids.iter().zip(&edits) {
            let node = tree.node(id);
            prop_assert_eq!(&buffer[node.range()], text.as_str());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Moves
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn move_relocates_text(
        source_start in 0usize..20,
        source_len in 0usize..8,
        target in 0usize..30,
    ) {
        let document: String = "abcdefghijklmnopqrstuvwxyz0123".to_string();
        let source_end = source_start + source_len;
        prop_assume!(target <= source_start || target >= source_end);

        let mut tree = EditTree::new(document.len());
        let root = tree.root();
        let source = tree.move_source(source_start, source_len);
        let target_id = tree.move_target(target);
        tree.add(root, source).unwrap();
        tree.add(root, target_id).unwrap();
        tree.set_source(target_id, source).unwrap();

        let mut buffer = document.clone();
        let report = tree.apply(&mut buffer).unwrap();

        let moved = &document[source_start..source_end];
        let expected = if target <= source_start {
            format!(
                "{}{}{}{}",
                &document[..target],
                moved,
                &document[target..source_start],
                &document[source_end..]
            )
        } else {
            format!(
                "{}{}{}{}",
                &document[..source_start],
                &document[source_end..target],
                moved,
                &document[target..]
            )
        };
        prop_assert_eq!(&buffer, &expected);
        prop_assert_eq!(report.delta, 0);
        prop_assert_eq!(&buffer[tree.node(target_id).range()], moved);
        prop_assert_eq!(tree.node(source).length(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6-7. Validation and undo
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn validation_is_repeatable(link in any::<bool>(), inside in any::<bool>()) {
        let mut tree = EditTree::new(20);
        let root = tree.root();
        let source = tree.move_source(2, 8);
        let target = tree.move_target(if inside { 5 } else { 15 });
        tree.add(root, source).unwrap();
        tree.add(if inside { source } else { root }, target).unwrap();
        let linked = if link { tree.set_source(target, source).is_ok() } else { false };

        let first = tree.validate();
        let second = tree.validate();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.is_ok(), linked && !inside);
    }

    #[test]
    fn undo_restores_document(raw in plain_edits_strategy()) {
        let edits = layout(&raw);
        let document_len = edits.last().map_or(0, |(o, l, _)| o + l);
        let document = "0123456789".repeat(document_len / 10 + 1)[..document_len].to_string();

        let mut tree = EditTree::new(document_len);
        let root = tree.root();
        for (offset, length, text) in &edits {
            let id = tree.replace(*offset, *length, text.clone());
            tree.add(root, id).unwrap();
        }

        let mut buffer = document.clone();
        let report = tree.apply(&mut buffer).unwrap();
        report.undo.unwrap().apply(&mut buffer).unwrap();
        prop_assert_eq!(buffer, document);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Nested move and copy pairs
// ═════════════════════════════════════════════════════════════════════════

const DOCUMENT: &str = "abcdefghijklmnopqrstuvwxyz0123";

#[derive(Debug, Clone)]
enum Step {
    Group {
        at: (usize, usize),
        parent: Index,
    },
    Replace {
        at: (usize, usize),
        text: String,
        parent: Index,
    },
    Pair {
        copy: bool,
        source: (usize, usize),
        source_parent: Index,
        target: usize,
        target_parent: Index,
    },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    let span = (0usize..30, 0usize..10);
    prop_oneof![
        (span.clone(), any::<Index>()).prop_map(|(at, parent)| Step::Group { at, parent }),
        (span.clone(), "[A-Z]{0,3}", any::<Index>())
            .prop_map(|(at, text, parent)| Step::Replace { at, text, parent }),
        (
            any::<bool>(),
            span,
            any::<Index>(),
            0usize..=30,
            any::<Index>()
        )
            .prop_map(|(copy, source, source_parent, target, target_parent)| Step::Pair {
                copy,
                source,
                source_parent,
                target,
                target_parent,
            }),
    ]
}

/// Build a valid tree from `steps`, skipping steps that do not fit.
///
/// Move and copy edits are kept out of copy sources, whose clones would
/// drop links that leave the copied set.
fn build_paired_tree(steps: &[Step]) -> (EditTree, Vec<(EditId, EditId)>) {
    let mut tree = EditTree::new(DOCUMENT.len());
    let mut hosts = vec![tree.root()];
    let mut pair_hosts = vec![tree.root()];
    let mut pairs = Vec::new();

    for step in steps {
        match step {
            Step::Group { at, parent } => {
                let parent = hosts[parent.index(hosts.len())];
                let group = tree.group(at.0, at.1);
                if tree.add(parent, group).is_ok() {
                    hosts.push(group);
                    if pair_hosts.contains(&parent) {
                        pair_hosts.push(group);
                    }
                }
            }
            Step::Replace { at, text, parent } => {
                let parent = hosts[parent.index(hosts.len())];
                let edit = tree.replace(at.0, at.1, text.clone());
                let _ = tree.add(parent, edit);
            }
            Step::Pair {
                copy,
                source: at,
                source_parent,
                target: target_at,
                target_parent,
            } => {
                let (source, target) = if *copy {
                    (tree.copy_source(at.0, at.1), tree.copy_target(*target_at))
                } else {
                    (tree.move_source(at.0, at.1), tree.move_target(*target_at))
                };
                let source_parent = pair_hosts[source_parent.index(pair_hosts.len())];
                let target_parent = pair_hosts[target_parent.index(pair_hosts.len())];
                if tree.add(source_parent, source).is_err() {
                    continue;
                }
                if tree.add(target_parent, target).is_err() {
                    tree.remove_child(source_parent, source).unwrap();
                    continue;
                }
                if tree.set_source(target, source).is_err() || tree.validate().is_err() {
                    tree.remove_child(target_parent, target).unwrap();
                    tree.remove_child(source_parent, source).unwrap();
                    continue;
                }
                pairs.push((source, target));
                hosts.push(source);
                if !*copy {
                    pair_hosts.push(source);
                }
            }
        }
    }
    (tree, pairs)
}

/// Text of `id`'s region with its children applied, computed directly from
/// the unmodified document.
fn reference_content(tree: &EditTree, id: EditId) -> String {
    let node = tree.node(id);
    let mut out = String::new();
    let mut position = node.offset();
    for &child in node.children() {
        let child_node = tree.node(child);
        out.push_str(&DOCUMENT[position..child_node.offset()]);
        out.push_str(&reference_render(tree, child));
        position = child_node.exclusive_end();
    }
    out.push_str(&DOCUMENT[position..node.exclusive_end()]);
    out
}

fn reference_render(tree: &EditTree, id: EditId) -> String {
    match tree.node(id).kind() {
        EditKind::Replace(text) => text.clone(),
        EditKind::MoveSource => String::new(),
        EditKind::MoveTarget | EditKind::CopyTarget => {
            reference_content(tree, tree.source_of(id).unwrap())
        }
        EditKind::Multi | EditKind::Marker | EditKind::CopySource => reference_content(tree, id),
    }
}

/// Deltas that landed in the document. Edits below a target were applied
/// to captured source text and are already part of the target's delta.
fn document_delta(tree: &EditTree, id: EditId) -> isize {
    let node = tree.node(id);
    let own = node.delta().unwrap_or(0);
    if node.kind().is_target() {
        return own;
    }
    own + node
        .children()
        .iter()
        .map(|&child| document_delta(tree, child))
        .sum::<isize>()
}

proptest! {
    #[test]
    fn nested_pairs_match_reference(steps in prop::collection::vec(step_strategy(), 1..24)) {
        let (mut tree, pairs) = build_paired_tree(&steps);
        prop_assert!(tree.validate().is_ok());

        let root = tree.root();
        let expected = reference_content(&tree, root);
        let sources: Vec<String> = pairs
            .iter()
            .map(|&(source, _)| reference_content(&tree, source))
            .collect();

        let mut buffer = DOCUMENT.to_string();
        let report = tree.apply(&mut buffer).unwrap();

        prop_assert_eq!(&buffer, &expected);
        prop_assert_eq!(report.delta, buffer.len() as isize - DOCUMENT.len() as isize);
        prop_assert_eq!(document_delta(&tree, root), report.delta);

        for (&(_, target), text) in pairs.iter().zip(&sources) {
            let node = tree.node(target);
            prop_assert!(!node.is_deleted());
            prop_assert_eq!(&buffer[node.range()], text.as_str());
        }
    }
}
