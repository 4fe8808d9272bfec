// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! In-memory tabular data as handed over by an external loader.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A single cell. Loaders hand over strings, numbers or nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

static EMPTY: Value = Value::Empty;

impl Value {
    /// Blank text and the literal `null` count as missing, same as `Empty`.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")
            }
            Value::Number(_) => false,
        }
    }
    /// Finite numeric reading of the cell, parsing text if needed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Empty => Cow::Borrowed(""),
        }
    }
    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }
}
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Value::Empty
        } else {
            Value::Text(value.to_string())
        }
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Value::Empty
        } else {
            Value::Text(value)
        }
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}
impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Empty, Into::into)
    }
}

/// One row: field id to cell, in the loader's column order.
pub type Record = IndexMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<Record>,
}
impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }
    /// Builds records from a header row and string rows, the shape CSV and
    /// spreadsheet readers produce. Short rows are padded with `Empty`.
    pub fn from_rows<H, R, C>(headers: &[H], rows: R) -> Self
    where
        H: AsRef<str>,
        R: IntoIterator<Item = Vec<C>>,
        C: Into<Value>,
    {
        let records = rows
            .into_iter()
            .map(|row| {
                let mut cells = row.into_iter();
                headers
                    .iter()
                    .map(|h| {
                        let value = cells.next().map_or(Value::Empty, Into::into);
                        (h.as_ref().to_string(), value)
                    })
                    .collect()
            })
            .collect();
        Self { records }
    }
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn records(&self) -> &[Record] {
        &self.records
    }
    /// Field ids in first-seen order across all records.
    pub fn field_ids(&self) -> Vec<String> {
        let mut ids: IndexSet<&str> = IndexSet::new();
        for record in &self.records {
            ids.extend(record.keys().map(String::as_str));
        }
        ids.into_iter().map(str::to_string).collect()
    }
    /// Every row's cell for `field_id`; rows lacking the key yield `Empty`.
    pub fn column<'a>(&'a self, field_id: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.records
            .iter()
            .map(move |record| record.get(field_id).unwrap_or(&EMPTY))
    }
    /// Non-missing cells of a column, in row order.
    pub fn present_values<'a>(
        &'a self,
        field_id: &'a str,
    ) -> impl Iterator<Item = &'a Value> + 'a {
        self.column(field_id).filter(|v| !v.is_missing())
    }
}
impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
