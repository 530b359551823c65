//! Query predicates for register search
//!
//! A query maps field paths to one or more predicates. The JSON form accepts
//! either a literal (equality) or an operator object:
//!
//! ```json
//! {
//!   "status": "signed",
//!   "amount": { "$gt": 1000 },
//!   "party": { "$regex": "^acme", "$flags": "i" }
//! }
//! ```
//!
//! Each matching predicate adds a fixed weight to an entry's score.

use crate::value::{lookup, Fields, Value, DATE_TAG};
use chrono::DateTime;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

/// Weight of an equality match
pub const EQ_WEIGHT: f64 = 1.0;
/// Weight of a regex match
pub const REGEX_WEIGHT: f64 = 0.9;
/// Weight of a substring match
pub const CONTAINS_WEIGHT: f64 = 0.8;
/// Weight of an ordering match
pub const RANGE_WEIGHT: f64 = 0.7;

/// Errors building a query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Top-level query was not an object
    #[error("Query must be an object of field predicates")]
    NotAnObject,

    /// Operator key is not supported
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Operand has the wrong shape for its operator
    #[error("Invalid operand for {operator}: {reason}")]
    InvalidOperand {
        /// Operator name
        operator: String,
        /// What was wrong
        reason: String,
    },

    /// Regex failed to compile
    #[error("Invalid regex: {0}")]
    InvalidRegex(String),
}

/// A single field predicate
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Structural equality (`literal` or `$eq`)
    Eq(Value),
    /// Substring of text, or element of a list (`$contains`)
    Contains(String),
    /// Strictly greater (`$gt`)
    Gt(Value),
    /// Strictly less (`$lt`)
    Lt(Value),
    /// Regex match on text or rendered numbers (`$regex` + `$flags`)
    Regex(Regex),
}

impl Predicate {
    /// Build a regex predicate from a pattern and flag string
    ///
    /// Supported flags: `i` (case-insensitive), `m` (multi-line), `s`
    /// (dot matches newline), `x` (verbose). `g` and `u` are accepted and
    /// have no effect.
    pub fn regex(pattern: &str, flags: &str) -> Result<Self, QueryError> {
        let mut builder = RegexBuilder::new(pattern);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                'g' | 'u' => {}
                other => {
                    return Err(QueryError::InvalidOperand {
                        operator: "$flags".to_string(),
                        reason: format!("unsupported flag '{}'", other),
                    })
                }
            }
        }
        builder
            .build()
            .map(Predicate::Regex)
            .map_err(|e| QueryError::InvalidRegex(e.to_string()))
    }

    /// Score contributed when this predicate matches
    pub fn weight(&self) -> f64 {
        match self {
            Predicate::Eq(_) => EQ_WEIGHT,
            Predicate::Regex(_) => REGEX_WEIGHT,
            Predicate::Contains(_) => CONTAINS_WEIGHT,
            Predicate::Gt(_) | Predicate::Lt(_) => RANGE_WEIGHT,
        }
    }

    /// Evaluate against a field value
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::Eq(expected) => value == expected,
            Predicate::Contains(needle) => match value {
                Value::Text(haystack) => haystack.contains(needle.as_str()),
                Value::List(items) => items.iter().any(|item| item.as_str() == Some(needle.as_str())),
                _ => false,
            },
            Predicate::Gt(bound) => value.compare(bound) == Some(Ordering::Greater),
            Predicate::Lt(bound) => value.compare(bound) == Some(Ordering::Less),
            Predicate::Regex(re) => match value {
                Value::Text(text) => re.is_match(text),
                Value::Number(_) => re.is_match(&value.to_string()),
                _ => false,
            },
        }
    }

    /// Parse the predicates for one field from JSON
    ///
    /// An object whose keys all start with `$` is an operator object, unless
    /// it is a tagged date. Any other value is a literal equality.
    fn from_json(value: serde_json::Value) -> Result<Vec<Self>, QueryError> {
        let operators = match value {
            serde_json::Value::Object(map)
                if !map.is_empty()
                    && map.keys().all(|k| k.starts_with('$'))
                    && !is_date_literal(&map) =>
            {
                map
            }
            literal => return Ok(vec![Predicate::Eq(Value::from(literal))]),
        };

        let flags = match operators.get("$flags") {
            None => String::new(),
            Some(serde_json::Value::String(flags)) => flags.clone(),
            Some(_) => {
                return Err(QueryError::InvalidOperand {
                    operator: "$flags".to_string(),
                    reason: "expected a string".to_string(),
                })
            }
        };

        let mut predicates = Vec::new();
        for (operator, operand) in operators {
            let predicate = match operator.as_str() {
                "$eq" => Predicate::Eq(Value::from(operand)),
                "$gt" => Predicate::Gt(Value::from(operand)),
                "$lt" => Predicate::Lt(Value::from(operand)),
                "$contains" => match operand {
                    serde_json::Value::String(needle) => Predicate::Contains(needle),
                    _ => {
                        return Err(QueryError::InvalidOperand {
                            operator: operator.clone(),
                            reason: "expected a string".to_string(),
                        })
                    }
                },
                "$regex" => match operand {
                    serde_json::Value::String(pattern) => Predicate::regex(&pattern, &flags)?,
                    _ => {
                        return Err(QueryError::InvalidOperand {
                            operator: operator.clone(),
                            reason: "expected a string pattern".to_string(),
                        })
                    }
                },
                "$flags" => continue,
                _ => return Err(QueryError::UnknownOperator(operator.clone())),
            };
            predicates.push(predicate);
        }

        if predicates.is_empty() {
            return Err(QueryError::InvalidOperand {
                operator: "$flags".to_string(),
                reason: "$flags requires $regex".to_string(),
            });
        }
        Ok(predicates)
    }
}

/// Whether an object is the `{"$date": "<RFC 3339>"}` form of a date
fn is_date_literal(map: &serde_json::Map<String, serde_json::Value>) -> bool {
    map.len() == 1
        && matches!(
            map.get(DATE_TAG),
            Some(serde_json::Value::String(raw)) if DateTime::parse_from_rfc3339(raw).is_ok()
        )
}

/// Outcome of evaluating a query against one record
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    /// Sum of matching predicate weights
    pub score: f64,

    /// Fields with at least one matching predicate
    pub matched_fields: Vec<String>,
}

/// A set of field predicates
#[derive(Debug, Clone, Default)]
pub struct Query {
    predicates: BTreeMap<String, Vec<Predicate>>,
}

impl Query {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate on a field path
    pub fn with(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        self.predicates.entry(field.into()).or_default().push(predicate);
        self
    }

    /// Parse a query from its JSON form
    pub fn from_json(value: serde_json::Value) -> Result<Self, QueryError> {
        let serde_json::Value::Object(fields) = value else {
            return Err(QueryError::NotAnObject);
        };

        let mut query = Query::new();
        for (field, spec) in fields {
            let predicates = Predicate::from_json(spec)?;
            query.predicates.entry(field).or_default().extend(predicates);
        }
        Ok(query)
    }

    /// Number of fields constrained
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Whether the query has no predicates
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Score a record's data
    ///
    /// Missing fields never match.
    pub fn evaluate(&self, data: &Fields) -> QueryMatch {
        let mut score = 0.0;
        let mut matched_fields = Vec::new();

        for (field, predicates) in &self.predicates {
            let Some(value) = lookup(data, field) else {
                continue;
            };
            let mut field_matched = false;
            for predicate in predicates {
                if predicate.matches(value) {
                    score += predicate.weight();
                    field_matched = true;
                }
            }
            if field_matched {
                matched_fields.push(field.clone());
            }
        }

        QueryMatch {
            score,
            matched_fields,
        }
    }
}
