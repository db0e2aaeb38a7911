use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// An edit script: the TOML description of one edit tree.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditScript {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub edits: Vec<EditDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `xxh3:<hex>` checksum of the document the script was written against.
    #[serde(default)]
    pub checksum: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditDefinition {
    pub id: String,
    #[serde(flatten)]
    pub kind: EditSpec,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub length: usize,
    /// Id of the enclosing edit; the root when absent.
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EditSpec {
    Replace { text: String },
    Insert { text: String },
    Delete,
    Marker,
    Group,
    MoveSource,
    MoveTarget { source: String },
    CopySource,
    CopyTarget { source: String },
}

impl EditSpec {
    pub fn name(&self) -> &'static str {
        match self {
            EditSpec::Replace { .. } => "replace",
            EditSpec::Insert { .. } => "insert",
            EditSpec::Delete => "delete",
            EditSpec::Marker => "marker",
            EditSpec::Group => "group",
            EditSpec::MoveSource => "move-source",
            EditSpec::MoveTarget { .. } => "move-target",
            EditSpec::CopySource => "copy-source",
            EditSpec::CopyTarget { .. } => "copy-target",
        }
    }

    /// Source id named by a target edit.
    pub fn source(&self) -> Option<&str> {
        match self {
            EditSpec::MoveTarget { source } | EditSpec::CopyTarget { source } => Some(source),
            _ => None,
        }
    }

    fn is_zero_length(&self) -> bool {
        matches!(
            self,
            EditSpec::Insert { .. } | EditSpec::MoveTarget { .. } | EditSpec::CopyTarget { .. }
        )
    }
}

impl EditScript {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }

        let mut seen = HashSet::new();
        for edit in &self.edits {
            if edit.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: None,
                    field: "id",
                });
            } else if !seen.insert(edit.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    edit_id: edit.id.clone(),
                });
            }
        }

        for edit in &self.edits {
            if let Some(parent) = &edit.parent {
                if !seen.contains(parent.as_str()) {
                    issues.push(ValidationIssue::UnknownReference {
                        edit_id: edit.id.clone(),
                        field: "parent",
                        reference: parent.clone(),
                    });
                }
            }

            if edit.kind.is_zero_length() && edit.length != 0 {
                issues.push(ValidationIssue::InvalidCombo {
                    edit_id: Some(edit.id.clone()),
                    message: format!("{} edits cannot have a length", edit.kind.name()),
                });
            }

            if let Some(source) = edit.kind.source() {
                if source.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        edit_id: Some(edit.id.clone()),
                        field: "source",
                    });
                } else if !seen.contains(source) {
                    issues.push(ValidationIssue::UnknownReference {
                        edit_id: edit.id.clone(),
                        field: "source",
                        reference: source.to_string(),
                    });
                }
            }
        }

        if let Some(checksum) = &self.meta.checksum {
            if crate::file::parse_checksum(checksum).is_none() {
                issues.push(ValidationIssue::InvalidCombo {
                    edit_id: None,
                    message: format!("checksum must look like xxh3:<hex>, got '{checksum}'"),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyEditList,
    MissingField {
        edit_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        edit_id: String,
    },
    UnknownReference {
        edit_id: String,
        field: &'static str,
        reference: String,
    },
    InvalidCombo {
        edit_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "script defines no edits"),
            ValidationIssue::MissingField { edit_id, field } => match edit_id {
                Some(id) => write!(f, "edit '{id}' is missing field '{field}'"),
                None => write!(f, "edit is missing field '{field}'"),
            },
            ValidationIssue::DuplicateId { edit_id } => {
                write!(f, "edit id '{edit_id}' is used more than once")
            }
            ValidationIssue::UnknownReference {
                edit_id,
                field,
                reference,
            } => write!(
                f,
                "edit '{edit_id}' refers to unknown edit '{reference}' in '{field}'"
            ),
            ValidationIssue::InvalidCombo { edit_id, message } => match edit_id {
                Some(id) => write!(f, "edit '{id}': {message}"),
                None => write!(f, "{message}"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
