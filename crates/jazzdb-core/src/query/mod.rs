//! The query descriptor and its builder operations.
//!
//! A [`Query`] is a value: every builder call borrows the current descriptor
//! and returns a new one, leaving the input untouched.
//!
//! ```
//! use std::sync::Arc;
//! use jazzdb_core::filter;
//! use jazzdb_core::query::Query;
//! use jazzdb_core::schema::{FieldDescriptor, ModelSchema, Schema};
//!
//! let schema = Arc::new(Schema::new().model(
//!     "class",
//!     ModelSchema::new()
//!         .field("id", FieldDescriptor::primary_key())
//!         .field("name", FieldDescriptor::text()),
//! ));
//!
//! let query = Query::start("class", schema)?
//!     .filter(filter! { "name" => "Year 3" })?
//!     .order(["-name"], false)?
//!     .limit(1);
//! assert_eq!(query.limit_value(), Some(1));
//! # Ok::<(), jazzdb_core::QueryError>(())
//! ```

mod aggregates;
mod expr;
mod filter;
mod order;
mod path;

use std::sync::Arc;

pub use aggregates::{
    average, count, count_all, max, min, sum, Aggregate, AggregateFunction, Projection,
    SelectItem, ValuesOptions,
};
pub use expr::{Combinator, Operator, Predicate, WhereNode};
pub use filter::{Filter, FilterInput, FilterValue};
pub use order::{Direction, OrderBy, OrderItem};
pub use path::{ColumnRef, Join, PATH_SEPARATOR};

use crate::error::{QueryError, Result};
use crate::schema::Schema;
use crate::value::SqlValue;

/// Describes a query that has not run yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    primary_model: String,
    schema: Arc<Schema>,
    projection: Vec<SelectItem>,
    joins: Vec<Join>,
    optional_joins: Vec<Join>,
    where_clause: Option<WhereNode>,
    order: Vec<OrderItem>,
    distinct: bool,
    flat: bool,
    limit: Option<u64>,
}

impl Query {
    /// Starts a query on `primary_model`.
    pub fn start(primary_model: &str, schema: Arc<Schema>) -> Result<Self> {
        schema.model_schema(primary_model)?;
        Ok(Self {
            primary_model: primary_model.to_string(),
            schema,
            projection: Vec::new(),
            joins: Vec::new(),
            optional_joins: Vec::new(),
            where_clause: None,
            order: Vec::new(),
            distinct: false,
            flat: false,
            limit: None,
        })
    }

    /// Root model.
    #[must_use]
    pub fn primary_model(&self) -> &str {
        &self.primary_model
    }

    /// Schema the query resolves paths against.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Projected items; empty means every column of the root model.
    #[must_use]
    pub fn projection(&self) -> &[SelectItem] {
        &self.projection
    }

    /// Joins rendered as INNER JOIN.
    #[must_use]
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Joins rendered as LEFT JOIN.
    #[must_use]
    pub fn optional_joins(&self) -> &[Join] {
        &self.optional_joins
    }

    /// Where-tree; `None` selects every row.
    #[must_use]
    pub fn where_clause(&self) -> Option<&WhereNode> {
        self.where_clause.as_ref()
    }

    /// Ordering.
    #[must_use]
    pub fn order_items(&self) -> &[OrderItem] {
        &self.order
    }

    /// Whether SELECT DISTINCT is used.
    #[must_use]
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Whether rows come back as arrays.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.flat
    }

    /// Row cap.
    #[must_use]
    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Returns true if the query joins any model.
    #[must_use]
    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty() || !self.optional_joins.is_empty()
    }

    /// Adds a filter.
    ///
    /// A single [`Filter`] is ANDed onto the existing tree. A list of filters
    /// is ORed together first; filters with one entry become predicates of
    /// the OR node and filters with several entries become AND children.
    pub fn filter(&self, input: impl Into<FilterInput>) -> Result<Self> {
        let mut query = self.clone();
        let filters = input.into().into_filters();

        let mut groups = Vec::with_capacity(filters.len());
        for filter in &filters {
            groups.push(query.simplify(filter)?);
        }

        match groups.len() {
            0 => {}
            1 => {
                let predicates = groups.pop().unwrap_or_default();
                query.where_clause =
                    expr::extend(query.where_clause, Combinator::And, predicates, Vec::new());
            }
            _ => {
                let mut singles = Vec::new();
                let mut multiples = Vec::new();
                for group in groups {
                    match group.len() {
                        0 => {}
                        1 => singles.extend(group),
                        _ => multiples.push(WhereNode::new(Combinator::And, group, Vec::new())),
                    }
                }
                if let Some(or) = WhereNode::new(Combinator::Or, singles, multiples).collapse() {
                    query.where_clause =
                        expr::extend(query.where_clause, Combinator::And, Vec::new(), vec![or]);
                }
            }
        }

        Ok(query)
    }

    /// Applies each input in turn; the results are combined with AND.
    pub fn filter_all<I>(&self, inputs: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<FilterInput>,
    {
        inputs
            .into_iter()
            .try_fold(self.clone(), |query, input| query.filter(input))
    }

    /// Sets the ordering, or appends to it when `append` is true.
    pub fn order<I>(&self, specs: I, append: bool) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<OrderBy>,
    {
        let mut query = self.clone();
        let mut items = Vec::new();
        for spec in specs {
            let spec: OrderBy = spec.into();
            let column = query.resolve_optional(&spec.path)?;
            items.push(OrderItem {
                column,
                direction: spec.direction,
            });
        }

        if append {
            query.order.extend(items);
        } else {
            query.order = items;
        }
        Ok(query)
    }

    /// Sets the projection.
    ///
    /// Fails with `InvalidOption` when `flat` is requested without fields.
    pub fn values<I>(&self, projections: I, options: ValuesOptions) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Projection>,
    {
        let projections: Vec<Projection> = projections.into_iter().map(Into::into).collect();
        if projections.is_empty() && options.flat {
            return Err(QueryError::InvalidOption(
                "can only set flat if there are fields".to_string(),
            ));
        }

        let mut query = self.clone();
        let mut items = Vec::with_capacity(projections.len());
        for projection in projections {
            let item = match projection {
                Projection::Field(path) => SelectItem::Field {
                    column: query.resolve_optional(&path)?,
                    alias: path,
                },
                Projection::Aggregate(aggregate) => {
                    let column = match &aggregate.path {
                        Some(path) => Some(query.resolve_optional(path)?),
                        None => None,
                    };
                    SelectItem::Aggregate {
                        function: aggregate.function,
                        column,
                        name: aggregate.result_name(),
                    }
                }
            };
            items.push(item);
        }

        query.projection = items;
        query.distinct = options.distinct;
        query.flat = options.flat;
        Ok(query)
    }

    /// Caps the number of rows.
    #[must_use]
    pub fn limit(&self, limit: u64) -> Self {
        let mut query = self.clone();
        query.limit = Some(limit);
        query
    }

    /// Sets SELECT DISTINCT without touching the projection.
    #[must_use]
    pub fn distinct(&self, distinct: bool) -> Self {
        let mut query = self.clone();
        query.distinct = distinct;
        query
    }

    fn resolve(&self, segments: &[&str]) -> Result<path::ResolvedPath> {
        let existing: Vec<Join> = self
            .joins
            .iter()
            .chain(&self.optional_joins)
            .cloned()
            .collect();
        path::resolve(&self.schema, &self.primary_model, segments, &existing)
    }

    /// Resolves a projection or order path, registering its joins as optional.
    fn resolve_optional(&mut self, path: &str) -> Result<ColumnRef> {
        let resolved = self.resolve(&path::split(path))?;
        self.add_joins(resolved.joins, true);
        Ok(resolved.column)
    }

    /// Registers joins by path; a required join replaces an optional one.
    fn add_joins(&mut self, joins: Vec<Join>, optional: bool) {
        for join in joins {
            let known = |existing: &Join| existing.path == join.path;
            if optional {
                if !self.joins.iter().any(known) && !self.optional_joins.iter().any(known) {
                    self.optional_joins.push(join);
                }
            } else {
                self.optional_joins.retain(|existing| !known(existing));
                if !self.joins.iter().any(known) {
                    self.joins.push(join);
                }
            }
        }
    }

    /// Turns one filter map into predicates, registering the joins it needs.
    fn simplify(&mut self, filter: &Filter) -> Result<Vec<Predicate>> {
        let mut predicates = Vec::with_capacity(filter.len());

        for (key, value) in filter.iter() {
            let mut segments = path::split(key);
            let mut operator = Operator::Eq;
            if segments.len() > 1 {
                if let Some(parsed) = segments.last().and_then(|last| last.parse::<Operator>().ok()) {
                    operator = parsed;
                    segments.pop();
                }
            }

            let resolved = self.resolve(&segments)?;

            if resolved.relationship && !operator.allowed_on_relationship() {
                return Err(QueryError::InvalidFilterOperator {
                    path: key.to_string(),
                    operator,
                });
            }

            let value = match value {
                FilterValue::Value(value) => value.clone(),
                FilterValue::Object(object) => {
                    let key_name = self.schema.primary_key(&resolved.model)?;
                    object
                        .get(key_name)
                        .cloned()
                        .ok_or_else(|| QueryError::InvalidFilterValue {
                            path: key.to_string(),
                            reason: format!("object has no primary key `{key_name}`"),
                        })?
                }
            };

            if operator == Operator::IsNull && value.as_bool().is_none() {
                return Err(QueryError::InvalidFilterValue {
                    path: key.to_string(),
                    reason: format!("isnull expects a boolean but got {}", value.kind()),
                });
            }

            let optional = operator == Operator::IsNull && value == SqlValue::Bool(true);
            self.add_joins(resolved.joins, optional);
            predicates.push(Predicate {
                column: resolved.column,
                operator,
                value,
            });
        }

        Ok(predicates)
    }
}
