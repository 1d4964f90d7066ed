//! Rendering of query descriptors into SQL fragments.
//!
//! Identifiers are always quoted and values always bound; nothing from a
//! filter value is ever formatted into SQL text.

use crate::error::{QueryError, Result};
use crate::fragment::{quote_identifier, Fragment};
use crate::query::{ColumnRef, Join, Predicate, Query, SelectItem, WhereNode};
use crate::value::SqlValue;

fn column(column: &ColumnRef) -> Fragment {
    Fragment::column(&column.model, &column.field)
}

fn render_predicate(predicate: &Predicate) -> Fragment {
    let target = column(&predicate.column);
    match predicate.operator.sql() {
        Some(op) => target
            .then(Fragment::sql(format!(" {op} ")))
            .then(Fragment::value(predicate.value.clone())),
        None => {
            let check = if predicate.value == SqlValue::Bool(true) {
                " IS NULL"
            } else {
                " IS NOT NULL"
            };
            target.then(Fragment::sql(check))
        }
    }
}

/// Renders a where-tree. Child nodes with two or more terms are parenthesized.
#[must_use]
pub fn render_where(node: &WhereNode) -> Fragment {
    let predicates = node.predicates.iter().map(render_predicate);
    let children = node.children.iter().map(|child| {
        let rendered = render_where(child);
        if child.term_count() >= 2 {
            rendered.wrap()
        } else {
            rendered
        }
    });
    let separator = format!(" {} ", node.combinator.keyword());
    Fragment::join(predicates.chain(children), &separator)
}

fn render_join(kind: &str, join: &Join) -> Fragment {
    let mut table = Fragment::sql(format!(" {kind} ")).then(Fragment::ident(&join.model));
    if join.is_aliased() {
        table.push_sql(" AS ");
        table.append(Fragment::ident(&join.alias));
    }
    table
        .then(Fragment::sql(" ON "))
        .then(column(&join.local))
        .then(Fragment::sql(" = "))
        .then(column(&join.remote))
}

fn render_select_item(item: &SelectItem) -> Fragment {
    match item {
        SelectItem::Field { column: col, alias } => {
            let rendered = column(col);
            if *alias == col.field {
                rendered
            } else {
                rendered.then(Fragment::sql(format!(" AS {}", quote_identifier(alias))))
            }
        }
        SelectItem::Aggregate {
            function,
            column: col,
            name,
        } => {
            let argument = col.as_ref().map_or_else(|| Fragment::sql("*"), column);
            Fragment::sql(format!("{}(", function.sql()))
                .then(argument)
                .then(Fragment::sql(format!(") AS {}", quote_identifier(name))))
        }
    }
}

/// Renders `FROM "model"` followed by every join, INNER before LEFT.
fn render_from(query: &Query) -> Fragment {
    let mut from = Fragment::sql(" FROM ").then(Fragment::ident(query.primary_model()));
    for join in query.joins() {
        from.append(render_join("INNER JOIN", join));
    }
    for join in query.optional_joins() {
        from.append(render_join("LEFT JOIN", join));
    }
    from
}

fn render_where_clause(query: &Query) -> Fragment {
    match query.where_clause() {
        Some(node) => Fragment::sql(" WHERE ").then(render_where(node)),
        None => Fragment::new(),
    }
}

/// Renders a SELECT for the query.
#[must_use]
pub fn render_select(query: &Query) -> Fragment {
    let mut sql = Fragment::sql("SELECT ");
    if query.is_distinct() {
        sql.push_sql("DISTINCT ");
    }

    if query.projection().is_empty() {
        sql.push_sql(&format!("{}.*", quote_identifier(query.primary_model())));
    } else {
        sql.append(Fragment::join(
            query.projection().iter().map(render_select_item),
            ", ",
        ));
    }

    sql.append(render_from(query));
    sql.append(render_where_clause(query));

    let has_aggregate = query.projection().iter().any(SelectItem::is_aggregate);
    let grouped: Vec<Fragment> = query
        .projection()
        .iter()
        .filter_map(|item| match item {
            SelectItem::Field { column: col, .. } => Some(column(col)),
            SelectItem::Aggregate { .. } => None,
        })
        .collect();
    if has_aggregate && !grouped.is_empty() {
        sql.push_sql(" GROUP BY ");
        sql.append(Fragment::join(grouped, ", "));
    }

    if !query.order_items().is_empty() {
        sql.push_sql(" ORDER BY ");
        sql.append(Fragment::join(
            query.order_items().iter().map(|item| {
                column(&item.column).then(Fragment::sql(format!(" {}", item.direction.keyword())))
            }),
            ", ",
        ));
    }

    if let Some(limit) = query.limit_value() {
        sql.push_sql(&format!(" LIMIT {limit}"));
    }

    sql
}

/// Renders a query counting the rows the SELECT would return.
#[must_use]
pub fn render_count(query: &Query) -> Fragment {
    Fragment::sql("SELECT COUNT(*) AS \"count\" FROM (")
        .then(render_select(query))
        .then(Fragment::sql(") AS \"counted\""))
}

/// Renders the row restriction for UPDATE and DELETE.
///
/// With joins, rows are picked by primary key through a subquery since
/// neither statement can join directly.
fn render_target(query: &Query) -> Result<Fragment> {
    if !query.has_joins() {
        return Ok(render_where_clause(query));
    }

    let model = query.primary_model();
    let key = query.schema().primary_key(model)?;
    Ok(Fragment::sql(" WHERE ")
        .then(Fragment::column(model, key))
        .then(Fragment::sql(" IN (SELECT "))
        .then(Fragment::column(model, key))
        .then(render_from(query))
        .then(render_where_clause(query))
        .then(Fragment::sql(")")))
}

/// Renders an UPDATE setting `updates` on every matching row.
///
/// Returns `None` when there is nothing to set.
pub fn render_update(query: &Query, updates: &[(String, SqlValue)]) -> Result<Option<Fragment>> {
    if updates.is_empty() {
        return Ok(None);
    }

    let model = query.primary_model();
    let mut assignments = Vec::with_capacity(updates.len());
    for (field, value) in updates {
        let descriptor = query.schema().field(model, field)?;
        if !descriptor.has_column() {
            return Err(QueryError::NotWritable {
                model: model.to_string(),
                field: field.clone(),
            });
        }
        assignments.push(
            Fragment::ident(field)
                .then(Fragment::sql(" = "))
                .then(Fragment::value(value.clone())),
        );
    }

    Ok(Some(
        Fragment::sql("UPDATE ")
            .then(Fragment::ident(model))
            .then(Fragment::sql(" SET "))
            .then(Fragment::join(assignments, ", "))
            .then(render_target(query)?),
    ))
}

/// Renders a DELETE of every matching row.
pub fn render_delete(query: &Query) -> Result<Fragment> {
    Ok(Fragment::sql("DELETE FROM ")
        .then(Fragment::ident(query.primary_model()))
        .then(render_target(query)?))
}

/// Renders an insert-or-update keyed on `primary_key`, returning the key.
#[must_use]
pub fn render_upsert(model: &str, primary_key: &str, fields: &[(String, SqlValue)]) -> Fragment {
    let returning = Fragment::sql(" RETURNING ").then(Fragment::ident(primary_key));
    let insert = Fragment::sql("INSERT INTO ").then(Fragment::ident(model));

    if fields.is_empty() {
        return insert.then(Fragment::sql(" DEFAULT VALUES")).then(returning);
    }

    let columns = Fragment::join(fields.iter().map(|(name, _)| Fragment::ident(name)), ", ");
    let values = Fragment::join(
        fields.iter().map(|(_, value)| Fragment::value(value.clone())),
        ", ",
    );
    let assignments = Fragment::join(
        fields.iter().map(|(name, _)| {
            let quoted = quote_identifier(name);
            Fragment::sql(format!("{quoted} = excluded.{quoted}"))
        }),
        ", ",
    );

    insert
        .then(Fragment::sql(" ("))
        .then(columns)
        .then(Fragment::sql(") VALUES ("))
        .then(values)
        .then(Fragment::sql(") ON CONFLICT ("))
        .then(Fragment::ident(primary_key))
        .then(Fragment::sql(") DO UPDATE SET "))
        .then(assignments)
        .then(returning)
}
