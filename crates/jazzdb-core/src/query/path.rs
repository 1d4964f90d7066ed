//! Resolution of `a__b__c` field paths into columns and joins.

use std::fmt;

use crate::error::{QueryError, Result};
use crate::schema::{FieldDescriptor, Schema};

/// Separator between path segments and before an operator suffix.
pub const PATH_SEPARATOR: &str = "__";

/// A column of the root model or of a joined table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Name the table is addressed by: the model name, or a join alias.
    pub model: String,
    /// Field (column) name.
    pub field: String,
}

impl ColumnRef {
    /// Creates a column reference.
    pub fn new(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model, self.field)
    }
}

/// Joins `model` on `local = remote`.
///
/// A join is identified by its relationship path. When the table is already
/// in the query under its own name, the join is aliased with the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Join {
    /// Model being joined.
    pub model: String,
    /// Name the joined table is addressed by.
    pub alias: String,
    /// Relationship path from the root model, e.g. `class__students`.
    pub path: String,
    /// Column on the already joined side.
    pub local: ColumnRef,
    /// Column on `model`.
    pub remote: ColumnRef,
}

impl Join {
    /// Returns true when the table is addressed by an alias.
    #[must_use]
    pub fn is_aliased(&self) -> bool {
        self.alias != self.model
    }
}

/// Result of walking a path through the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedPath {
    /// Column the path ends on.
    pub column: ColumnRef,
    /// Model the column belongs to.
    pub model: String,
    /// Joins needed to reach `column`, in order.
    pub joins: Vec<Join>,
    /// Whether the last segment named a relationship.
    pub relationship: bool,
}

/// Splits a path into its segments.
pub(crate) fn split(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR).collect()
}

/// Picks the name a join on `path` is addressed by.
///
/// Reuses the alias of a join already registered for `path`. Otherwise the
/// model name is used unless something else in the query is addressed by it.
fn alias_for(
    model: &str,
    path: &str,
    root: &str,
    existing: &[Join],
    pending: &[Join],
) -> String {
    if let Some(join) = existing.iter().find(|join| join.path == path) {
        return join.alias.clone();
    }
    let taken = model == root
        || existing
            .iter()
            .chain(pending)
            .any(|join| join.alias == model);
    if taken {
        path.to_string()
    } else {
        model.to_string()
    }
}

/// Walks `segments` starting at `model`.
///
/// Every segment but the last must be a relationship; each one adds a join
/// and moves on to the related model. The last segment is the column. If it
/// names a relationship the related model is joined as well and its primary
/// key becomes the column. `existing` holds the joins the query already has.
pub(crate) fn resolve(
    schema: &Schema,
    model: &str,
    segments: &[&str],
    existing: &[Join],
) -> Result<ResolvedPath> {
    let mut current = model.to_string();
    let mut reference = model.to_string();
    let mut joins: Vec<Join> = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        let last = index + 1 == segments.len();
        let field = schema.field(&current, segment)?;

        let (related, local_field, remote_field) = match field {
            FieldDescriptor::Scalar(_) if last => {
                return Ok(ResolvedPath {
                    column: ColumnRef::new(reference, *segment),
                    model: current,
                    joins,
                    relationship: false,
                });
            }
            FieldDescriptor::Scalar(_) => {
                return Err(QueryError::NotARelationship {
                    model: current,
                    field: (*segment).to_string(),
                });
            }
            FieldDescriptor::HasOne(has_one) => (
                has_one.related_model.as_str(),
                (*segment).to_string(),
                schema.primary_key(&has_one.related_model)?.to_string(),
            ),
            FieldDescriptor::HasMany(has_many) => (
                has_many.related_model.as_str(),
                schema.primary_key(&current)?.to_string(),
                has_many.related_field.clone(),
            ),
        };

        let path = segments[..=index].join(PATH_SEPARATOR);
        let alias = alias_for(related, &path, model, existing, &joins);
        let join = Join {
            model: related.to_string(),
            local: ColumnRef::new(reference.as_str(), local_field),
            remote: ColumnRef::new(alias.as_str(), remote_field),
            alias: alias.clone(),
            path,
        };

        current = join.model.clone();
        reference = alias;
        joins.push(join);
    }

    let key = schema.primary_key(&current)?.to_string();
    Ok(ResolvedPath {
        column: ColumnRef::new(reference, key),
        model: current,
        joins,
        relationship: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ModelSchema;

    fn schema() -> Schema {
        Schema::new()
            .model(
                "class",
                ModelSchema::new()
                    .field("id", FieldDescriptor::primary_key())
                    .field("name", FieldDescriptor::text())
                    .field("students", FieldDescriptor::has_many("student", "class")),
            )
            .model(
                "student",
                ModelSchema::new()
                    .field("id", FieldDescriptor::primary_key())
                    .field("age", FieldDescriptor::integer())
                    .field("class", FieldDescriptor::has_one("class")),
            )
    }

    fn join(model: &str, path: &str, local: ColumnRef, remote_field: &str) -> Join {
        Join {
            model: model.into(),
            alias: model.into(),
            path: path.into(),
            local,
            remote: ColumnRef::new(model, remote_field),
        }
    }

    #[test]
    fn test_scalar_path() {
        let resolved = resolve(&schema(), "class", &["name"], &[]).expect("resolves");
        assert_eq!(resolved.column, ColumnRef::new("class", "name"));
        assert_eq!(resolved.model, "class");
        assert!(resolved.joins.is_empty());
        assert!(!resolved.relationship);
    }

    #[test]
    fn test_has_many_then_scalar() {
        let resolved = resolve(&schema(), "class", &["students", "age"], &[]).expect("resolves");
        assert_eq!(resolved.column, ColumnRef::new("student", "age"));
        assert_eq!(
            resolved.joins,
            vec![join("student", "students", ColumnRef::new("class", "id"), "class")]
        );
    }

    #[test]
    fn test_terminal_relationship_uses_primary_key() {
        let resolved = resolve(&schema(), "student", &["class"], &[]).expect("resolves");
        assert_eq!(resolved.column, ColumnRef::new("class", "id"));
        assert!(resolved.relationship);
        assert_eq!(
            resolved.joins,
            vec![join("class", "class", ColumnRef::new("student", "class"), "id")]
        );
    }

    #[test]
    fn test_returning_to_a_joined_model_is_aliased() {
        let resolved =
            resolve(&schema(), "student", &["class", "students", "age"], &[]).expect("resolves");
        assert_eq!(resolved.column, ColumnRef::new("class__students", "age"));
        assert_eq!(resolved.model, "student");

        let back = &resolved.joins[1];
        assert_eq!(back.model, "student");
        assert_eq!(back.alias, "class__students");
        assert!(back.is_aliased());
        assert_eq!(back.local, ColumnRef::new("class", "id"));
        assert_eq!(back.remote, ColumnRef::new("class__students", "class"));

        let segments = ["class", "students", "class", "name"];
        let again = resolve(&schema(), "student", &segments, &resolved.joins).expect("resolves");
        assert_eq!(again.joins[..2], resolved.joins[..]);
        assert_eq!(again.joins[2].alias, "class__students__class");
        assert_eq!(again.column, ColumnRef::new("class__students__class", "name"));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            resolve(&schema(), "class", &["name", "age"], &[]),
            Err(QueryError::NotARelationship { field, .. }) if field == "name"
        ));
        assert!(matches!(
            resolve(&schema(), "class", &["students", "missing"], &[]),
            Err(QueryError::UnknownField { model, field }) if model == "student" && field == "missing"
        ));
    }
}
