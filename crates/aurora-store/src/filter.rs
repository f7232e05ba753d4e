//! Structured metadata filters.
//!
//! Filters are built as values and compiled to a SQL fragment plus bound
//! parameters. Keys are validated and values are never spliced into the SQL
//! text, so an identifier such as `x' OR '1'='1` only ever matches itself.
//!
//! Equality on `id` runs against the `id` column, which is written from
//! `metadata["id"]`. Every other key goes through `json_extract`, guarded by
//! `json_valid` so rows with unreadable metadata never match instead of
//! failing the whole statement.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::types::ID_KEY;
use aurora_core::{Error, Result};

/// Equality expressions over document metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataFilter {
    /// `metadata[key] == value`
    Eq { key: String, value: Value },
    /// All sub-filters must match. An empty conjunction matches every row.
    And(Vec<MetadataFilter>),
}

impl MetadataFilter {
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Filter on the document identifier.
    pub fn id(id: impl Into<String>) -> Self {
        Self::eq(ID_KEY, Value::String(id.into()))
    }

    pub fn and(self, other: MetadataFilter) -> Self {
        match self {
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Compile into a `WHERE` fragment over `vector_store` and its parameters.
    pub fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let mut params = Vec::new();
        let sql = self.write_sql(&mut params)?;
        Ok((sql, params))
    }

    fn write_sql(&self, params: &mut Vec<SqlValue>) -> Result<String> {
        match self {
            Self::Eq { key, value: Value::String(id) } if key == ID_KEY => {
                params.push(SqlValue::Text(id.clone()));
                Ok("id = ?".to_string())
            }
            Self::Eq { key, value } => {
                let path = json_path(key)?;
                match value {
                    Value::Null => {
                        params.push(SqlValue::Text(path));
                        Ok("CASE WHEN json_valid(metadata) THEN json_type(metadata, ?) END = 'null'"
                            .to_string())
                    }
                    scalar => {
                        let bound = scalar_param(key, scalar)?;
                        params.push(SqlValue::Text(path));
                        params.push(bound);
                        Ok("CASE WHEN json_valid(metadata) THEN json_extract(metadata, ?) END = ?"
                            .to_string())
                    }
                }
            }
            Self::And(parts) if parts.is_empty() => Ok("1 = 1".to_string()),
            Self::And(parts) => {
                let clauses = parts
                    .iter()
                    .map(|part| part.write_sql(params).map(|sql| format!("({sql})")))
                    .collect::<Result<Vec<_>>>()?;
                Ok(clauses.join(" AND "))
            }
        }
    }
}

fn json_path(key: &str) -> Result<String> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(Error::InvalidFilter(format!(
            "metadata key {key:?} must be non-empty and use only [A-Za-z0-9_-]"
        )));
    }
    Ok(format!("$.\"{key}\""))
}

fn scalar_param(key: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(SqlValue::Integer(i)),
            (None, Some(f)) => Ok(SqlValue::Real(f)),
            (None, None) => Err(Error::InvalidFilter(format!(
                "number for {key:?} is out of range"
            ))),
        },
        Value::Array(_) | Value::Object(_) => Err(Error::InvalidFilter(format!(
            "value for {key:?} must be a scalar"
        ))),
        Value::Null => Ok(SqlValue::Null),
    }
}
