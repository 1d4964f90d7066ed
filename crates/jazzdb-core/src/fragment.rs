//! SQL text with embedded values.
//!
//! A [`Fragment`] keeps literal SQL and bound values apart. Text lives in
//! `segments` and values in `params`, with exactly one more segment than
//! params: each param sits between two segments. Rendering a fragment for a
//! dialect replaces every slot with that dialect's placeholder, so values
//! never reach SQL text.

use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::value::{SqlValue, ToSqlValue};

/// Quotes an identifier with double quotes, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A piece of SQL with interleaved bound values.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    segments: Vec<String>,
    params: Vec<SqlValue>,
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

impl Fragment {
    /// Creates an empty fragment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            segments: vec![String::new()],
            params: Vec::new(),
        }
    }

    /// Creates a fragment from literal SQL text.
    #[must_use]
    pub fn sql(text: impl Into<String>) -> Self {
        Self {
            segments: vec![text.into()],
            params: Vec::new(),
        }
    }

    /// Creates a fragment holding a single bound value.
    #[must_use]
    pub fn value(value: impl ToSqlValue) -> Self {
        Self {
            segments: vec![String::new(), String::new()],
            params: vec![value.to_sql_value()],
        }
    }

    /// Creates a fragment holding a quoted identifier.
    #[must_use]
    pub fn ident(name: &str) -> Self {
        Self::sql(quote_identifier(name))
    }

    /// Creates a `"model"."field"` column reference.
    #[must_use]
    pub fn column(model: &str, field: &str) -> Self {
        Self::sql(format!(
            "{}.{}",
            quote_identifier(model),
            quote_identifier(field)
        ))
    }

    /// Builds a fragment from text where every `{}` marks a bound value.
    ///
    /// Fails when the number of markers differs from the number of values.
    pub fn template(text: &str, values: Vec<SqlValue>) -> Result<Self> {
        let segments: Vec<String> = text.split("{}").map(String::from).collect();
        let placeholders = segments.len() - 1;
        if placeholders != values.len() {
            return Err(QueryError::PlaceholderMismatch {
                placeholders,
                values: values.len(),
            });
        }
        Ok(Self {
            segments,
            params: values,
        })
    }

    /// Appends literal SQL text.
    pub fn push_sql(&mut self, text: &str) -> &mut Self {
        if let Some(last) = self.segments.last_mut() {
            last.push_str(text);
        }
        self
    }

    /// Appends a bound value.
    pub fn push_value(&mut self, value: impl ToSqlValue) -> &mut Self {
        self.params.push(value.to_sql_value());
        self.segments.push(String::new());
        self
    }

    /// Appends another fragment, merging the text at the seam.
    pub fn append(&mut self, other: Fragment) -> &mut Self {
        let mut segments = other.segments.into_iter();
        if let Some(first) = segments.next() {
            self.push_sql(&first);
        }
        self.segments.extend(segments);
        self.params.extend(other.params);
        self
    }

    /// Consuming form of [`Fragment::append`].
    #[must_use]
    pub fn then(mut self, other: Fragment) -> Self {
        self.append(other);
        self
    }

    /// Joins fragments with a literal separator.
    #[must_use]
    pub fn join<I>(parts: I, separator: &str) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        let mut out = Self::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push_sql(separator);
            }
            out.append(part);
        }
        out
    }

    /// Wraps the fragment in parentheses.
    #[must_use]
    pub fn wrap(self) -> Self {
        Self::sql("(").then(self).then(Self::sql(")"))
    }

    /// Returns true when the fragment carries no text and no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.segments.iter().all(String::is_empty)
    }

    /// Returns the bound values in order.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Returns the number of bound values.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Renders the fragment with the dialect's placeholders.
    #[must_use]
    pub fn to_statement(&self, dialect: &dyn Dialect) -> Statement {
        let mut sql = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            sql.push_str(segment);
            if i < self.params.len() {
                sql.push_str(&dialect.placeholder(i));
            }
        }
        Statement {
            sql,
            params: self.params.clone(),
        }
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Self::sql(text)
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Self::sql(text)
    }
}

/// A statement ready to be handed to a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with dialect placeholders.
    pub sql: String,
    /// Values to bind, in placeholder order.
    pub params: Vec<SqlValue>,
}

/// Builds a [`Fragment`] from a template and values.
///
/// Every `{}` in the template becomes a bound value; nothing is formatted
/// into the text. Evaluates to `Result<Fragment, QueryError>`.
///
/// ```
/// use jazzdb_core::sql;
///
/// let fragment = sql!("SELECT * FROM \"class\" WHERE \"name\" = {}", "Year 3").unwrap();
/// assert_eq!(fragment.param_count(), 1);
/// ```
#[macro_export]
macro_rules! sql {
    ($text:expr $(, $value:expr)* $(,)?) => {
        $crate::Fragment::template(
            $text,
            vec![$($crate::ToSqlValue::to_sql_value($value)),*],
        )
    };
}
