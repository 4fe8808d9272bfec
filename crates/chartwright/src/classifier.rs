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

//! Sample-based field type inference.

use crate::config::ClassifierConfig;
use crate::dataset::{Dataset, Value};
use crate::error::ValidationResult;
use crate::field::{FieldDescriptor, FieldList, SemanticType};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Datetime,
    Identifier,
    Categorical,
    Unknown,
}
impl ColumnKind {
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            ColumnKind::Numeric => SemanticType::Quantitative,
            ColumnKind::Datetime => SemanticType::Temporal,
            ColumnKind::Identifier | ColumnKind::Categorical | ColumnKind::Unknown => {
                SemanticType::Nominal
            }
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Datetime => "datetime",
            ColumnKind::Identifier => "identifier",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Unknown => "unknown",
        }
    }
}
impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one field together with the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldClassification {
    pub descriptor: FieldDescriptor,
    pub kind: ColumnKind,
    pub sample_size: usize,
    pub numeric_ratio: f64,
    pub date_ratio: f64,
    pub unique_ratio: f64,
}

/// Parses a cell as a date or date-time using the configured chrono formats.
pub fn parse_temporal(value: &str, config: &ClassifierConfig) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in &config.datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in &config.date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[derive(Debug, Clone, Default)]
pub struct FieldTypeClassifier {
    config: ClassifierConfig,
}
impl FieldTypeClassifier {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies every field in first-seen order.
    pub fn classify_dataset(&self, dataset: &Dataset) -> ValidationResult<Vec<FieldClassification>> {
        dataset
            .field_ids()
            .into_iter()
            .map(|id| self.classify_values(&id, dataset.column(&id)))
            .collect()
    }

    pub fn classify_field(
        &self,
        dataset: &Dataset,
        field_id: &str,
    ) -> ValidationResult<FieldClassification> {
        self.classify_values(field_id, dataset.column(field_id))
    }

    /// Classifies a field from its cells. Only the first `sample_limit`
    /// non-missing values are read.
    pub fn classify_values<'a, I>(
        &self,
        field_id: &str,
        values: I,
    ) -> ValidationResult<FieldClassification>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let samples: Vec<&Value> = values
            .into_iter()
            .filter(|v| !v.is_missing())
            .take(self.config.sample_limit)
            .collect();
        let sample_size = samples.len();
        if sample_size == 0 {
            debug!(field = field_id, "No samples, field left unknown");
            return Ok(FieldClassification {
                descriptor: FieldDescriptor::from_id(field_id, SemanticType::Nominal)?,
                kind: ColumnKind::Unknown,
                sample_size: 0,
                numeric_ratio: 0.0,
                date_ratio: 0.0,
                unique_ratio: 0.0,
            });
        }
        let total = sample_size as f64;
        let numeric = samples.iter().filter(|v| v.as_number().is_some()).count();
        let dates = samples
            .iter()
            .filter(|v| v.is_text() && parse_temporal(&v.as_text(), &self.config).is_some())
            .count();
        let distinct: HashSet<String> = samples.iter().map(|v| v.as_text().into_owned()).collect();
        let numeric_ratio = numeric as f64 / total;
        let date_ratio = dates as f64 / total;
        let unique_ratio = distinct.len() as f64 / total;

        let kind = if numeric_ratio > self.config.numeric_threshold {
            ColumnKind::Numeric
        } else if date_ratio > self.config.date_threshold {
            ColumnKind::Datetime
        } else if samples[0].is_text() && unique_ratio > self.config.identifier_uniqueness {
            ColumnKind::Identifier
        } else {
            ColumnKind::Categorical
        };
        debug!(
            field = field_id,
            kind = %kind,
            sample_size,
            numeric_ratio,
            date_ratio,
            unique_ratio,
            "Field classified"
        );
        Ok(FieldClassification {
            descriptor: FieldDescriptor::from_id(field_id, kind.semantic_type())?,
            kind,
            sample_size,
            numeric_ratio,
            date_ratio,
            unique_ratio,
        })
    }

    /// Descriptors of `classifications`, in the same order.
    pub fn field_list(classifications: &[FieldClassification]) -> ValidationResult<FieldList> {
        FieldList::new(
            classifications
                .iter()
                .map(|c| c.descriptor.clone())
                .collect(),
        )
    }
}
