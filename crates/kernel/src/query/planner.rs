//! Query plan derivation and SQL emission.
//!
//! The storage backend requires that a query with an inequality filter sorts
//! first on the inequality field. Callers never request ordering themselves;
//! the planner always derives it: inequality field first (when present) with
//! a deterministic tie-break on the conference name, otherwise name alone.

use sea_query::{Alias, Expr, Order, PostgresQueryBuilder, Query, SimpleExpr};

use super::catalog::{ConferenceField, FilterOp};
use super::compiler::{CompiledFilters, FilterValue, Predicate};

/// Conference columns selected by compiled queries.
const CONFERENCE_COLUMNS: &[&str] = &[
    "id",
    "organizer_id",
    "name",
    "description",
    "city",
    "topics",
    "month",
    "max_attendees",
    "seats_available",
    "start_date",
    "end_date",
];

/// Base table for compiled queries.
const CONFERENCE_TABLE: &str = "conference";

/// An ordered query plan: predicates plus the mandatory ordering clause.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    predicates: Vec<Predicate>,
    order: Vec<&'static str>,
}

/// Derives query plans from compiled filters. Performs no I/O.
pub struct QueryPlanner;

impl QueryPlanner {
    /// Derive the plan for a compiled filter set.
    pub fn plan(compiled: CompiledFilters) -> QueryPlan {
        // The ordering is mandatory even though callers never request it:
        // an inequality-filtered query without it is a storage error.
        let order = match compiled.inequality_field {
            Some(field) => vec![field.column(), "name"],
            None => vec!["name"],
        };

        QueryPlan {
            predicates: compiled.predicates,
            order,
        }
    }
}

impl QueryPlan {
    /// Columns of the ordering clause, primary first.
    pub fn order_columns(&self) -> &[&'static str] {
        &self.order
    }

    /// The plan's predicates, in caller order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Render the plan to SQL for the storage backend.
    pub fn to_sql(&self) -> String {
        let mut query = Query::select();

        query.columns(
            CONFERENCE_COLUMNS
                .iter()
                .map(|c| (Alias::new(CONFERENCE_TABLE), Alias::new(*c))),
        );
        query.from(Alias::new(CONFERENCE_TABLE));

        for predicate in &self.predicates {
            query.and_where(predicate_expr(predicate));
        }

        for column in &self.order {
            query.order_by((Alias::new(CONFERENCE_TABLE), Alias::new(*column)), Order::Asc);
        }

        query.to_string(PostgresQueryBuilder)
    }
}

/// Build the WHERE expression for a single predicate.
fn predicate_expr(predicate: &Predicate) -> SimpleExpr {
    if predicate.field == ConferenceField::Topics {
        return topics_expr(predicate);
    }

    let col = Expr::col((
        Alias::new(CONFERENCE_TABLE),
        Alias::new(predicate.field.column()),
    ));
    let value = filter_value(&predicate.value);

    match predicate.op {
        FilterOp::Eq => col.eq(value),
        FilterOp::Ne => col.ne(value),
        FilterOp::Gt => col.gt(value),
        FilterOp::GtEq => col.gte(value),
        FilterOp::Lt => col.lt(value),
        FilterOp::LtEq => col.lte(value),
    }
}

/// Topics is an array column; a filter matches when any element satisfies
/// the comparison (legacy repeated-property semantics).
fn topics_expr(predicate: &Predicate) -> SimpleExpr {
    let value = match &predicate.value {
        FilterValue::Text(s) => s.clone(),
        FilterValue::Number(n) => n.to_string(),
    };

    Expr::cust_with_values(
        format!(
            "EXISTS (SELECT 1 FROM unnest(\"{CONFERENCE_TABLE}\".\"topics\") AS t(topic) WHERE topic {} $1)",
            predicate.op.symbol()
        ),
        [value],
    )
}

fn filter_value(value: &FilterValue) -> sea_query::Value {
    match value {
        FilterValue::Text(s) => s.clone().into(),
        FilterValue::Number(n) => (*n).into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::query::{FilterCompiler, RawFilter};

    fn compile(filters: &[(&str, &str, &str)]) -> CompiledFilters {
        let raw: Vec<RawFilter> = filters
            .iter()
            .map(|(f, o, v)| RawFilter {
                field: (*f).to_string(),
                operator: (*o).to_string(),
                value: (*v).to_string(),
            })
            .collect();
        FilterCompiler::strict().compile(&raw).unwrap()
    }

    #[test]
    fn inequality_field_is_primary_sort_key() {
        let plan = QueryPlanner::plan(compile(&[("MONTH", "GT", "5")]));
        assert_eq!(plan.order_columns(), &["month", "name"]);

        let sql = plan.to_sql();
        let order_pos = sql.find("ORDER BY").unwrap();
        let month_pos = sql[order_pos..].find("\"month\"").unwrap();
        let name_pos = sql[order_pos..].find("\"name\"").unwrap();
        assert!(month_pos < name_pos, "inequality field must sort first: {sql}");
    }

    #[test]
    fn equality_only_sorts_by_name() {
        let plan = QueryPlanner::plan(compile(&[("CITY", "EQ", "London")]));
        assert_eq!(plan.order_columns(), &["name"]);

        let sql = plan.to_sql();
        assert!(sql.contains("ORDER BY \"conference\".\"name\""), "{sql}");
    }

    #[test]
    fn no_filters_still_ordered() {
        let plan = QueryPlanner::plan(compile(&[]));
        assert_eq!(plan.order_columns(), &["name"]);
        assert!(plan.to_sql().contains("ORDER BY"));
    }

    #[test]
    fn numeric_predicate_rendered() {
        let plan = QueryPlanner::plan(compile(&[("MAX_ATTENDEES", "GTEQ", "50")]));
        let sql = plan.to_sql();

        assert!(sql.contains("\"max_attendees\" >= 50"), "{sql}");
    }

    #[test]
    fn city_equality_rendered() {
        let plan = QueryPlanner::plan(compile(&[("CITY", "EQ", "London")]));
        let sql = plan.to_sql();

        assert!(sql.contains("\"city\" = 'London'"), "{sql}");
    }

    #[test]
    fn topic_filter_uses_array_membership() {
        let plan = QueryPlanner::plan(compile(&[("TOPIC", "EQ", "Medical Innovations")]));
        let sql = plan.to_sql();

        assert!(sql.contains("unnest"), "topics should unnest the array: {sql}");
        assert!(sql.contains("Medical Innovations"), "{sql}");
    }

    #[test]
    fn text_values_escaped() {
        let plan = QueryPlanner::plan(compile(&[("CITY", "EQ", "O'Fallon")]));
        let sql = plan.to_sql();

        // sea-query escapes the quote; the raw literal must not appear.
        assert!(!sql.contains("'O'Fallon'"), "{sql}");
    }

    #[test]
    fn predicate_order_preserved_in_where_clause() {
        let plan = QueryPlanner::plan(compile(&[
            ("MONTH", "GT", "2"),
            ("CITY", "EQ", "Berlin"),
            ("MONTH", "LTEQ", "10"),
        ]));
        let sql = plan.to_sql();

        let gt = sql.find("> 2").unwrap();
        let city = sql.find("'Berlin'").unwrap();
        let lte = sql.find("<= 10").unwrap();
        assert!(gt < city && city < lte, "{sql}");
    }

    #[test]
    fn ne_predicate_rendered() {
        let plan = QueryPlanner::plan(compile(&[("CITY", "NE", "London")]));
        let sql = plan.to_sql();

        assert!(sql.contains("<>") || sql.contains("!="), "{sql}");
        // NE is an inequality, so city leads the ordering.
        assert_eq!(plan.order_columns(), &["city", "name"]);
    }

    #[test]
    fn all_conference_columns_selected() {
        let sql = QueryPlanner::plan(compile(&[])).to_sql();
        for column in super::CONFERENCE_COLUMNS {
            assert!(sql.contains(column), "missing {column}: {sql}");
        }
    }
}
