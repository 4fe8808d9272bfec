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

use crate::field::FieldDescriptor;
use crate::interpreter::ChartType;
use crate::roles::{RoleAssignment, YRole};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Mean,
    Count,
}
impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Count => "count",
        })
    }
}

/// Name fragments checked in order before falling back to the chart default.
const NAME_RULES: &[(&[&str], Aggregation)] = &[
    (&["count", "number", "qty"], Aggregation::Sum),
    (&["avg", "average", "mean"], Aggregation::Mean),
    (&["rate", "percent"], Aggregation::Mean),
];
const LINE_SUM_HINTS: &[&str] = &["volume", "sales"];

pub struct AggregationSelector;
impl AggregationSelector {
    pub fn select(field: &FieldDescriptor, chart_type: ChartType) -> Aggregation {
        if field.is_dimension() {
            return Aggregation::Count;
        }
        let name = field.display_name().to_lowercase();
        let by_name = NAME_RULES
            .iter()
            .find(|(hints, _)| hints.iter().any(|h| name.contains(h)))
            .map(|(_, aggregation)| *aggregation);
        if let Some(aggregation) = by_name {
            return aggregation;
        }
        match chart_type {
            ChartType::Bar | ChartType::Pie | ChartType::Histogram => Aggregation::Sum,
            ChartType::Line if LINE_SUM_HINTS.iter().any(|h| name.contains(h)) => Aggregation::Sum,
            ChartType::Line | ChartType::Scatter => Aggregation::Mean,
            ChartType::Area => Aggregation::Sum,
        }
    }

    /// Aggregation for a whole assignment, chosen from its y role.
    /// `None` only when nothing at all was assigned.
    pub fn for_roles(roles: &RoleAssignment, chart_type: ChartType) -> Option<Aggregation> {
        if roles.is_empty() {
            return None;
        }
        Some(match &roles.y {
            YRole::Field(field) => Self::select(field, chart_type),
            YRole::CountRequested | YRole::Unresolved => Aggregation::Count,
        })
    }
}
