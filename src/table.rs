use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("column '{0}' does not exist")]
    MissingColumn(String),
    #[error("column '{0}' is not numeric")]
    NotNumeric(String),
}

/// Records that know how to lay themselves out as a table row.
pub trait Tabular {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<Value>;
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn from_records<T: Tabular>(records: &[T]) -> Self {
        Self {
            columns: T::COLUMNS.iter().map(|name| name.to_string()).collect(),
            rows: records.iter().map(Tabular::cells).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value>, TableError> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[index]))
    }

    /// Numeric view of a column; fails on the first text cell.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, TableError> {
        self.column(name)?
            .map(|value| {
                value
                    .as_f64()
                    .ok_or_else(|| TableError::NotNumeric(name.to_string()))
            })
            .collect()
    }

    pub fn select(&self, names: &[&str]) -> Result<Table, TableError> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&index| row[index].clone()).collect())
            .collect();

        Ok(Table {
            columns: names.iter().map(|name| name.to_string()).collect(),
            rows,
        })
    }

    /// Rows rendered as display strings, in column order.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect()
    }
}
