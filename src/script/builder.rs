//! Turn a validated [`EditScript`] into an [`EditTree`].

use crate::script::schema::{EditScript, EditSpec, ValidationError};
use crate::tree::{EditId, EditKind, EditTree, MalformedTree};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("invalid edit script: {0}")]
    Invalid(#[from] ValidationError),

    #[error("edit '{id}' does not fit the tree: {source}")]
    Malformed {
        id: String,
        #[source]
        source: MalformedTree,
    },
}

/// A tree built from a script, with script ids mapped to tree handles.
#[derive(Debug)]
pub struct BuiltTree {
    pub tree: EditTree,
    ids: Vec<(String, EditId)>,
    index: HashMap<String, EditId>,
}

impl BuiltTree {
    pub fn get(&self, id: &str) -> Option<EditId> {
        self.index.get(id).copied()
    }

    /// Script ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = (&str, EditId)> + '_ {
        self.ids.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

impl EditScript {
    /// Build the tree against a document of `document_len` bytes.
    ///
    /// Edits are added in declaration order, so insertions sharing an offset
    /// keep the order they were written in.
    pub fn build(&self, document_len: usize) -> Result<BuiltTree, BuildError> {
        self.validate()?;

        let mut tree = EditTree::new(document_len);
        let mut ids = Vec::with_capacity(self.edits.len());
        let mut index = HashMap::with_capacity(self.edits.len());

        for edit in &self.edits {
            let kind = match &edit.kind {
                EditSpec::Replace { text } | EditSpec::Insert { text } => {
                    EditKind::Replace(text.clone())
                }
                EditSpec::Delete => EditKind::Replace(String::new()),
                EditSpec::Marker => EditKind::Marker,
                EditSpec::Group => EditKind::Multi,
                EditSpec::MoveSource => EditKind::MoveSource,
                EditSpec::MoveTarget { .. } => EditKind::MoveTarget,
                EditSpec::CopySource => EditKind::CopySource,
                EditSpec::CopyTarget { .. } => EditKind::CopyTarget,
            };
            let node = tree.create(edit.offset, edit.length, kind);
            ids.push((edit.id.clone(), node));
            index.insert(edit.id.clone(), node);
        }

        let malformed = |id: &str, source| BuildError::Malformed {
            id: id.to_string(),
            source,
        };

        for edit in &self.edits {
            let child = index[&edit.id];
            let parent = match &edit.parent {
                Some(parent) => index[parent],
                None => tree.root(),
            };
            tree.add(parent, child)
                .map_err(|source| malformed(&edit.id, source))?;
        }

        for edit in &self.edits {
            if let Some(source) = edit.kind.source() {
                tree.set_source(index[&edit.id], index[source])
                    .map_err(|err| malformed(&edit.id, err))?;
            }
        }

        debug!(
            script = %self.meta.name,
            edits = self.edits.len(),
            "built edit tree"
        );
        Ok(BuiltTree { tree, ids, index })
    }
}

#[cfg(test)]
mod tests {
    use crate::script::load_from_str;
    use crate::tree::MalformedReason;

    use super::*;

    const REORDER: &str = r#"
[meta]
name = "reorder"

[[edits]]
id = "cde"
kind = "move-source"
offset = 2
length = 3

[[edits]]
id = "d"
kind = "replace"
offset = 3
length = 1
text = "d"
parent = "cde"

[[edits]]
id = "dest"
kind = "move-target"
offset = 8
source = "cde"
"#;

    #[test]
    fn test_build_and_apply() {
        let script = load_from_str(REORDER).unwrap();
        let mut built = script.build(10).unwrap();
        let d = built.get("d").unwrap();
        let cde = built.get("cde").unwrap();
        assert_eq!(built.tree.node(d).parent(), Some(cde));
        assert_eq!(
            built.ids().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["cde", "d", "dest"]
        );

        let mut buffer = String::from("ABCDEFGHIJ");
        let _ = built.tree.apply(&mut buffer).unwrap();
        assert_eq!(buffer, "ABFGHCdEIJ");
    }

    #[test]
    fn test_build_reports_offending_edit() {
        let script = load_from_str(
            r#"
[[edits]]
id = "a"
kind = "replace"
offset = 0
length = 4
text = "x"

[[edits]]
id = "b"
kind = "delete"
offset = 2
length = 4
"#,
        )
        .unwrap();
        match script.build(10).unwrap_err() {
            BuildError::Malformed { id, source } => {
                assert_eq!(id, "b");
                assert!(matches!(source.reason, MalformedReason::Overlapping { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_build_rejects_edits_past_document_end() {
        let script = load_from_str(
            r#"
[[edits]]
id = "tail"
kind = "insert"
offset = 12
text = "!"
"#,
        )
        .unwrap();
        let err = script.build(10).unwrap_err();
        assert!(err.to_string().contains("outside of parent"));
    }
}
