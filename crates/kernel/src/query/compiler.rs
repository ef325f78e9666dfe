//! Filter list validation and normalization.
//!
//! Resolves wire tokens through the field catalog, coerces values for
//! numeric fields, and enforces the storage backend's restriction that at
//! most one distinct field may carry an inequality operator.

use serde::Deserialize;

use super::QueryError;
use super::catalog::{ConferenceField, FilterOp};

/// A raw filter as supplied over the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFilter {
    pub field: String,
    pub operator: String,
    pub value: String,
}

/// A typed filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Number(i64),
}

/// A validated, normalized filter predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: ConferenceField,
    pub op: FilterOp,
    pub value: FilterValue,
}

/// Compiler output: predicates in input order plus the inequality field,
/// if any.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    pub predicates: Vec<Predicate>,
    pub inequality_field: Option<ConferenceField>,
}

/// Validates and normalizes raw filter lists.
#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler {
    /// Enforce the single-inequality-field restriction of the legacy
    /// storage engine.
    strict: bool,
}

impl FilterCompiler {
    /// Compiler in strict compatibility mode.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Compiler for backends without the inequality restriction.
    pub fn relaxed() -> Self {
        Self { strict: false }
    }

    /// Compiler with the given strictness.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Compile a raw filter list into normalized predicates.
    ///
    /// Order is preserved from the input. In strict mode a second inequality
    /// on a different field fails with `MultipleInequalityFields`; repeated
    /// inequalities on the same field and any number of equality filters are
    /// always allowed. In relaxed mode the first inequality field is still
    /// reported so the planner can order deterministically.
    pub fn compile(&self, filters: &[RawFilter]) -> Result<CompiledFilters, QueryError> {
        let mut predicates = Vec::with_capacity(filters.len());
        let mut inequality_field: Option<ConferenceField> = None;

        for raw in filters {
            let field = ConferenceField::from_token(&raw.field)?;
            let op = FilterOp::from_token(&raw.operator)?;

            let value = if field.is_numeric() {
                let number = raw.value.trim().parse::<i64>().map_err(|_| {
                    QueryError::InvalidFilter(format!(
                        "filter value for {} must be an integer, got {:?}",
                        raw.field, raw.value
                    ))
                })?;
                FilterValue::Number(number)
            } else {
                FilterValue::Text(raw.value.clone())
            };

            if !op.is_equality() {
                match inequality_field {
                    Some(existing) if existing != field => {
                        if self.strict {
                            return Err(QueryError::MultipleInequalityFields);
                        }
                    }
                    Some(_) => {}
                    None => inequality_field = Some(field),
                }
            }

            predicates.push(Predicate { field, op, value });
        }

        Ok(CompiledFilters {
            predicates,
            inequality_field,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn raw(field: &str, operator: &str, value: &str) -> RawFilter {
        RawFilter {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn equality_filters_unrestricted() {
        let compiled = FilterCompiler::strict()
            .compile(&[
                raw("CITY", "EQ", "London"),
                raw("TOPIC", "EQ", "Medical Innovations"),
                raw("MONTH", "EQ", "6"),
            ])
            .unwrap();

        assert_eq!(compiled.predicates.len(), 3);
        assert!(compiled.inequality_field.is_none());
    }

    #[test]
    fn single_inequality_field_identified() {
        let compiled = FilterCompiler::strict()
            .compile(&[
                raw("CITY", "EQ", "Paris"),
                raw("MONTH", "GT", "3"),
                raw("MONTH", "LT", "9"),
            ])
            .unwrap();

        assert_eq!(compiled.inequality_field, Some(ConferenceField::Month));
    }

    #[test]
    fn two_inequality_fields_rejected() {
        let err = FilterCompiler::strict()
            .compile(&[raw("MONTH", "GT", "3"), raw("MAX_ATTENDEES", "LT", "100")])
            .unwrap_err();

        assert_eq!(err, QueryError::MultipleInequalityFields);
    }

    #[test]
    fn ne_counts_as_inequality() {
        let err = FilterCompiler::strict()
            .compile(&[raw("CITY", "NE", "London"), raw("MONTH", "GTEQ", "6")])
            .unwrap_err();

        assert_eq!(err, QueryError::MultipleInequalityFields);
    }

    #[test]
    fn relaxed_mode_admits_multiple_inequality_fields() {
        let compiled = FilterCompiler::relaxed()
            .compile(&[raw("MONTH", "GT", "3"), raw("MAX_ATTENDEES", "LT", "100")])
            .unwrap();

        assert_eq!(compiled.predicates.len(), 2);
        // First inequality field still reported for deterministic ordering.
        assert_eq!(compiled.inequality_field, Some(ConferenceField::Month));
    }

    #[test]
    fn numeric_coercion() {
        let compiled = FilterCompiler::strict()
            .compile(&[raw("MAX_ATTENDEES", "GTEQ", "50")])
            .unwrap();

        assert_eq!(compiled.predicates[0].value, FilterValue::Number(50));
    }

    #[test]
    fn non_numeric_month_rejected() {
        let err = FilterCompiler::strict()
            .compile(&[raw("MONTH", "EQ", "June")])
            .unwrap_err();

        assert!(matches!(err, QueryError::InvalidFilter(_)));
    }

    #[test]
    fn unknown_tokens_rejected() {
        assert!(matches!(
            FilterCompiler::strict()
                .compile(&[raw("VENUE", "EQ", "x")])
                .unwrap_err(),
            QueryError::InvalidFilter(_)
        ));
        assert!(matches!(
            FilterCompiler::strict()
                .compile(&[raw("CITY", "CONTAINS", "x")])
                .unwrap_err(),
            QueryError::InvalidFilter(_)
        ));
    }

    #[test]
    fn input_order_preserved() {
        let compiled = FilterCompiler::strict()
            .compile(&[
                raw("MONTH", "GT", "1"),
                raw("CITY", "EQ", "Tokyo"),
                raw("MONTH", "LT", "12"),
            ])
            .unwrap();

        let fields: Vec<ConferenceField> =
            compiled.predicates.iter().map(|p| p.field).collect();
        assert_eq!(
            fields,
            vec![
                ConferenceField::Month,
                ConferenceField::City,
                ConferenceField::Month
            ]
        );
    }

    #[test]
    fn empty_filter_list() {
        let compiled = FilterCompiler::strict().compile(&[]).unwrap();
        assert!(compiled.predicates.is_empty());
        assert!(compiled.inequality_field.is_none());
    }

    #[test]
    fn raw_filter_deserializes_from_wire_json() {
        let json = r#"{"field": "CITY", "operator": "EQ", "value": "London"}"#;
        let parsed: RawFilter = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.field, "CITY");
        assert_eq!(parsed.operator, "EQ");
        assert_eq!(parsed.value, "London");
    }
}
