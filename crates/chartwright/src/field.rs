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

//! Field metadata shared by every pipeline stage.
//!
//! A [`FieldList`] is an ordered sequence, never a set: every "first match"
//! rule downstream walks it front to back, so the order a loader or the
//! classifier produced is the tie-break order.

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Nominal,
    Quantitative,
    Temporal,
}
impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Nominal => "nominal",
            SemanticType::Quantitative => "quantitative",
            SemanticType::Temporal => "temporal",
        }
    }
    pub fn default_analytic_type(&self) -> AnalyticType {
        match self {
            SemanticType::Quantitative => AnalyticType::Measure,
            SemanticType::Nominal | SemanticType::Temporal => AnalyticType::Dimension,
        }
    }
}
impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticType {
    Dimension,
    Measure,
}

/// Canonical metadata for one dataset column. Only constructible through
/// validation, so a descriptor in hand is always well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFieldDescriptor", rename_all = "camelCase")]
pub struct FieldDescriptor {
    id: String,
    display_name: String,
    semantic_type: SemanticType,
    analytic_type: AnalyticType,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFieldDescriptor {
    id: String,
    #[serde(default, alias = "name")]
    display_name: Option<String>,
    semantic_type: SemanticType,
    #[serde(default)]
    analytic_type: Option<AnalyticType>,
}
impl TryFrom<RawFieldDescriptor> for FieldDescriptor {
    type Error = ValidationError;
    fn try_from(raw: RawFieldDescriptor) -> ValidationResult<Self> {
        let analytic = raw
            .analytic_type
            .unwrap_or_else(|| raw.semantic_type.default_analytic_type());
        FieldDescriptor::with_analytic_type(
            raw.id,
            raw.display_name.unwrap_or_default(),
            raw.semantic_type,
            analytic,
        )
    }
}

impl FieldDescriptor {
    /// Analytic type follows from the semantic type.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        semantic_type: SemanticType,
    ) -> ValidationResult<Self> {
        Self::with_analytic_type(
            id,
            display_name,
            semantic_type,
            semantic_type.default_analytic_type(),
        )
    }
    pub fn with_analytic_type(
        id: impl Into<String>,
        display_name: impl Into<String>,
        semantic_type: SemanticType,
        analytic_type: AnalyticType,
    ) -> ValidationResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::BlankFieldId);
        }
        if analytic_type == AnalyticType::Measure && semantic_type != SemanticType::Quantitative {
            return Err(ValidationError::MeasureNotQuantitative {
                id,
                semantic: semantic_type.to_string(),
            });
        }
        let display_name = display_name.into();
        let display_name = if display_name.trim().is_empty() {
            id.clone()
        } else {
            display_name
        };
        Ok(Self {
            id,
            display_name,
            semantic_type,
            analytic_type,
        })
    }
    /// Descriptor whose display name is its id.
    pub fn from_id(id: impl Into<String>, semantic_type: SemanticType) -> ValidationResult<Self> {
        let id = id.into();
        Self::new(id.clone(), id, semantic_type)
    }
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
    pub fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }
    pub fn analytic_type(&self) -> AnalyticType {
        self.analytic_type
    }
    pub fn is_measure(&self) -> bool {
        self.analytic_type == AnalyticType::Measure
    }
    pub fn is_dimension(&self) -> bool {
        self.analytic_type == AnalyticType::Dimension
    }
    pub fn is_temporal(&self) -> bool {
        self.semantic_type == SemanticType::Temporal
    }
    pub fn is_nominal(&self) -> bool {
        self.semantic_type == SemanticType::Nominal
    }
    /// Temporal by type, or by a name such as `ExitTime` or `created_at`.
    pub fn looks_temporal(&self, indicators: &[String]) -> bool {
        if self.is_temporal() {
            return true;
        }
        let name = self.display_name.to_lowercase();
        indicators
            .iter()
            .any(|i| !i.is_empty() && name.contains(i.as_str()))
    }
}
impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// Ordered, duplicate-free sequence of descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldDescriptor>", into = "Vec<FieldDescriptor>")]
pub struct FieldList {
    fields: Vec<FieldDescriptor>,
}
impl FieldList {
    pub fn new(fields: Vec<FieldDescriptor>) -> ValidationResult<Self> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.id()) {
                return Err(ValidationError::DuplicateFieldId {
                    id: field.id().to_string(),
                });
            }
        }
        Ok(Self { fields })
    }
    pub fn empty() -> Self {
        Self::default()
    }
    pub fn try_push(&mut self, field: FieldDescriptor) -> ValidationResult<()> {
        if self.contains(field.id()) {
            return Err(ValidationError::DuplicateFieldId {
                id: field.id().to_string(),
            });
        }
        self.fields.push(field);
        Ok(())
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }
    pub fn as_slice(&self) -> &[FieldDescriptor] {
        &self.fields
    }
    pub fn contains(&self, id: &str) -> bool {
        self.fields.iter().any(|f| f.id() == id)
    }
    pub fn get(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id() == id)
    }
    pub fn require(&self, id: &str) -> ValidationResult<&FieldDescriptor> {
        self.get(id).ok_or_else(|| ValidationError::UnknownField { id: id.to_string() })
    }
    pub fn display_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.display_name().to_string()).collect()
    }
    pub fn measures(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_measure())
    }
    pub fn dimensions(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_dimension())
    }
}
impl TryFrom<Vec<FieldDescriptor>> for FieldList {
    type Error = ValidationError;
    fn try_from(fields: Vec<FieldDescriptor>) -> ValidationResult<Self> {
        Self::new(fields)
    }
}
impl From<FieldList> for Vec<FieldDescriptor> {
    fn from(list: FieldList) -> Self {
        list.fields
    }
}
impl<'a> IntoIterator for &'a FieldList {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;
    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
