//! Boolean where-trees.

use std::fmt;
use std::str::FromStr;

use super::path::ColumnRef;
use crate::value::SqlValue;

/// Comparison operators usable as a filter key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Neq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// IS NULL when the value is true, IS NOT NULL otherwise
    IsNull,
}

impl Operator {
    /// Returns the suffix used in filter keys.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::IsNull => "isnull",
        }
    }

    /// Returns the SQL comparison, or `None` for `IsNull`.
    #[must_use]
    pub const fn sql(self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::Neq => Some("<>"),
            Self::Lt => Some("<"),
            Self::Lte => Some("<="),
            Self::Gt => Some(">"),
            Self::Gte => Some(">="),
            Self::IsNull => None,
        }
    }

    /// Returns true for operators allowed on relationship fields.
    #[must_use]
    pub const fn allowed_on_relationship(self) -> bool {
        matches!(self, Self::Eq | Self::Neq | Self::IsNull)
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eq" => Ok(Self::Eq),
            "neq" => Ok(Self::Neq),
            "lt" => Ok(Self::Lt),
            "lte" => Ok(Self::Lte),
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            "isnull" => Ok(Self::IsNull),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// How the terms of a [`WhereNode`] are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// All terms must hold.
    And,
    /// Any term must hold.
    Or,
}

impl Combinator {
    /// SQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// A single comparison. `IsNull` predicates hold a boolean value.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Column being compared.
    pub column: ColumnRef,
    /// Comparison operator.
    pub operator: Operator,
    /// Right-hand side.
    pub value: SqlValue,
}

/// A node of the where-tree.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereNode {
    /// Combinator for predicates and children alike.
    pub combinator: Combinator,
    /// Leaf comparisons.
    pub predicates: Vec<Predicate>,
    /// Nested nodes.
    pub children: Vec<WhereNode>,
}

impl WhereNode {
    /// Creates a node.
    #[must_use]
    pub fn new(combinator: Combinator, predicates: Vec<Predicate>, children: Vec<WhereNode>) -> Self {
        Self {
            combinator,
            predicates,
            children,
        }
    }

    /// Number of terms rendered at this level.
    #[must_use]
    pub fn term_count(&self) -> usize {
        self.predicates.len() + self.children.len()
    }

    /// Drops empty nodes and unwraps a node holding a single child and no predicates.
    #[must_use]
    pub fn collapse(self) -> Option<Self> {
        if !self.predicates.is_empty() {
            return Some(self);
        }
        match self.children.len() {
            0 => None,
            1 => self.children.into_iter().next(),
            _ => Some(self),
        }
    }
}

/// Combines `predicates` and `children` into `current`.
///
/// Nodes with the same combinator merge; a different combinator wraps the
/// current tree as the first child of a new node.
pub(crate) fn extend(
    current: Option<WhereNode>,
    combinator: Combinator,
    predicates: Vec<Predicate>,
    children: Vec<WhereNode>,
) -> Option<WhereNode> {
    if predicates.is_empty() && children.is_empty() {
        return current;
    }

    let Some(mut current) = current else {
        return WhereNode::new(combinator, predicates, children).collapse();
    };

    if current.combinator == combinator {
        current.predicates.extend(predicates);
        current.children.extend(children);
        return Some(current);
    }

    let mut nested = Vec::with_capacity(children.len() + 1);
    nested.push(current);
    nested.extend(children);
    Some(WhereNode::new(combinator, predicates, nested))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(field: &str, value: i64) -> Predicate {
        Predicate {
            column: ColumnRef::new("class", field),
            operator: Operator::Eq,
            value: SqlValue::Int(value),
        }
    }

    #[test]
    fn test_operator_parsing_is_case_insensitive() {
        assert_eq!("GTE".parse::<Operator>(), Ok(Operator::Gte));
        assert_eq!("isNull".parse::<Operator>(), Ok(Operator::IsNull));
        assert!("like".parse::<Operator>().is_err());
    }

    #[test]
    fn test_collapse() {
        assert_eq!(WhereNode::new(Combinator::And, vec![], vec![]).collapse(), None);

        let child = WhereNode::new(Combinator::Or, vec![eq("a", 1), eq("b", 2)], vec![]);
        let wrapped = WhereNode::new(Combinator::And, vec![], vec![child.clone()]);
        assert_eq!(wrapped.collapse(), Some(child));
    }

    #[test]
    fn test_extend_same_combinator_merges() {
        let first = extend(None, Combinator::And, vec![eq("a", 1)], vec![]);
        let second = extend(first, Combinator::And, vec![eq("b", 2)], vec![]);
        assert_eq!(
            second,
            Some(WhereNode::new(
                Combinator::And,
                vec![eq("a", 1), eq("b", 2)],
                vec![]
            ))
        );
    }

    #[test]
    fn test_extend_different_combinator_nests() {
        let or = WhereNode::new(Combinator::Or, vec![eq("a", 1), eq("b", 2)], vec![]);
        let tree = extend(Some(or.clone()), Combinator::And, vec![eq("c", 3)], vec![]);
        assert_eq!(
            tree,
            Some(WhereNode::new(Combinator::And, vec![eq("c", 3)], vec![or]))
        );
    }

    #[test]
    fn test_extend_empty_is_noop() {
        let tree = Some(WhereNode::new(Combinator::And, vec![eq("a", 1)], vec![]));
        assert_eq!(extend(tree.clone(), Combinator::Or, vec![], vec![]), tree);
    }
}
