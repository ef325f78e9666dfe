//! Whitelists of filterable fields and operators.
//!
//! Canonicalizes wire tokens (`CITY`, `GTEQ`, ...) to domain fields and
//! operators. Anything outside these tables is rejected up front.

use serde::Serialize;

use super::QueryError;

/// A conference attribute that may appear in a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConferenceField {
    City,
    Topics,
    Month,
    MaxAttendees,
}

impl ConferenceField {
    /// Resolve a wire token to a field.
    pub fn from_token(token: &str) -> Result<Self, QueryError> {
        match token {
            "CITY" => Ok(Self::City),
            "TOPIC" => Ok(Self::Topics),
            "MONTH" => Ok(Self::Month),
            "MAX_ATTENDEES" => Ok(Self::MaxAttendees),
            other => Err(QueryError::InvalidFilter(format!(
                "unknown filter field: {other}"
            ))),
        }
    }

    /// Storage column name.
    pub fn column(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Topics => "topics",
            Self::Month => "month",
            Self::MaxAttendees => "max_attendees",
        }
    }

    /// Whether filter values for this field must coerce to an integer.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Month | Self::MaxAttendees)
    }
}

/// A filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    Ne,
}

impl FilterOp {
    /// Resolve a wire token to an operator.
    pub fn from_token(token: &str) -> Result<Self, QueryError> {
        match token {
            "EQ" => Ok(Self::Eq),
            "GT" => Ok(Self::Gt),
            "GTEQ" => Ok(Self::GtEq),
            "LT" => Ok(Self::Lt),
            "LTEQ" => Ok(Self::LtEq),
            "NE" => Ok(Self::Ne),
            other => Err(QueryError::InvalidFilter(format!(
                "unknown filter operator: {other}"
            ))),
        }
    }

    /// Every operator except `=` counts as an inequality for the storage
    /// backend's ordering restriction.
    pub fn is_equality(self) -> bool {
        matches!(self, Self::Eq)
    }

    /// SQL comparison symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Ne => "!=",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn field_tokens_resolve() {
        assert_eq!(
            ConferenceField::from_token("CITY").unwrap(),
            ConferenceField::City
        );
        assert_eq!(
            ConferenceField::from_token("TOPIC").unwrap(),
            ConferenceField::Topics
        );
        assert_eq!(
            ConferenceField::from_token("MONTH").unwrap(),
            ConferenceField::Month
        );
        assert_eq!(
            ConferenceField::from_token("MAX_ATTENDEES").unwrap(),
            ConferenceField::MaxAttendees
        );
    }

    #[test]
    fn unknown_field_rejected() {
        let err = ConferenceField::from_token("SPEAKER").unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilter(_)));
    }

    #[test]
    fn operator_tokens_resolve() {
        for (token, symbol) in [
            ("EQ", "="),
            ("GT", ">"),
            ("GTEQ", ">="),
            ("LT", "<"),
            ("LTEQ", "<="),
            ("NE", "!="),
        ] {
            assert_eq!(FilterOp::from_token(token).unwrap().symbol(), symbol);
        }
    }

    #[test]
    fn unknown_operator_rejected() {
        let err = FilterOp::from_token("LIKE").unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilter(_)));
    }

    #[test]
    fn only_eq_is_equality() {
        assert!(FilterOp::Eq.is_equality());
        for op in [
            FilterOp::Gt,
            FilterOp::GtEq,
            FilterOp::Lt,
            FilterOp::LtEq,
            FilterOp::Ne,
        ] {
            assert!(!op.is_equality());
        }
    }

    #[test]
    fn numeric_fields() {
        assert!(ConferenceField::Month.is_numeric());
        assert!(ConferenceField::MaxAttendees.is_numeric());
        assert!(!ConferenceField::City.is_numeric());
        assert!(!ConferenceField::Topics.is_numeric());
    }
}
