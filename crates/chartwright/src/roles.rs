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

//! Mapping of resolved fields onto the x, y and color channels.
//!
//! Assignment never fails. Roles that cannot be filled are left empty, and
//! an assigned field id is never reused for a second role.

use crate::field::FieldDescriptor;
use crate::interpreter::ChartType;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    X,
    Y,
    Color,
}
impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::X => "x",
            Role::Y => "y",
            Role::Color => "color",
        })
    }
}

/// Outcome for the y channel. A single resolved field asks for a count;
/// that is distinct from failing to find a second field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "field", rename_all = "snake_case")]
pub enum YRole {
    Field(FieldDescriptor),
    CountRequested,
    Unresolved,
}
impl YRole {
    pub fn field(&self) -> Option<&FieldDescriptor> {
        match self {
            YRole::Field(f) => Some(f),
            YRole::CountRequested | YRole::Unresolved => None,
        }
    }
    pub fn status(&self) -> YRoleStatus {
        match self {
            YRole::Field(_) => YRoleStatus::Assigned,
            YRole::CountRequested => YRoleStatus::CountRequested,
            YRole::Unresolved => YRoleStatus::Unresolved,
        }
    }
}

/// [`YRole`] without the field, as carried by a chart spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YRoleStatus {
    Assigned,
    CountRequested,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub x: Option<FieldDescriptor>,
    pub y: YRole,
    pub color: Option<FieldDescriptor>,
}
impl RoleAssignment {
    /// Assigned fields in x, y, color order.
    pub fn assigned(&self) -> Vec<(Role, &FieldDescriptor)> {
        [
            (Role::X, self.x.as_ref()),
            (Role::Y, self.y.field()),
            (Role::Color, self.color.as_ref()),
        ]
        .into_iter()
        .filter_map(|(role, field)| field.map(|f| (role, f)))
        .collect()
    }
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.field().is_none() && self.color.is_none()
    }
}

/// Tracks ids already placed so no field fills two roles.
struct Picker<'a> {
    fields: &'a [&'a FieldDescriptor],
    used: Vec<&'a str>,
}
impl<'a> Picker<'a> {
    fn new(fields: &'a [&'a FieldDescriptor]) -> Self {
        Self {
            fields,
            used: Vec::with_capacity(3),
        }
    }
    fn take(&mut self, field: Option<&'a FieldDescriptor>) -> Option<&'a FieldDescriptor> {
        let field = field?;
        if self.is_used(field) {
            return None;
        }
        self.used.push(field.id());
        Some(field)
    }
    fn is_used(&self, field: &FieldDescriptor) -> bool {
        self.used.contains(&field.id())
    }
    fn first_unused(&self, pred: impl Fn(&FieldDescriptor) -> bool) -> Option<&'a FieldDescriptor> {
        self.fields
            .iter()
            .copied()
            .find(|f| !self.is_used(f) && pred(*f))
    }
    fn release(&mut self, field: &FieldDescriptor) {
        self.used.retain(|id| *id != field.id());
    }
}

#[derive(Debug, Clone)]
pub struct RoleAssignmentEngine {
    temporal_indicators: Vec<String>,
}
impl Default for RoleAssignmentEngine {
    fn default() -> Self {
        Self::with_temporal_indicators(crate::config::InterpreterConfig::default().temporal_indicators)
    }
}
impl RoleAssignmentEngine {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_temporal_indicators(temporal_indicators: Vec<String>) -> Self {
        Self {
            temporal_indicators,
        }
    }

    /// Assigns roles for `fields` (resolution order) and `chart_type`.
    /// Duplicate ids in the input are collapsed to their first occurrence.
    pub fn assign(&self, fields: &[FieldDescriptor], chart_type: ChartType) -> RoleAssignment {
        let fields: Vec<&FieldDescriptor> = fields.iter().unique_by(|f| f.id().to_string()).collect();
        let assignment = match fields.as_slice() {
            [] => RoleAssignment {
                x: None,
                y: YRole::Unresolved,
                color: None,
            },
            [only] => RoleAssignment {
                x: Some((*only).clone()),
                y: YRole::CountRequested,
                color: None,
            },
            _ => self.assign_many(&fields, chart_type),
        };
        debug!(
            chart_type = %chart_type,
            x = assignment.x.as_ref().map(FieldDescriptor::id),
            y = ?assignment.y.status(),
            color = assignment.color.as_ref().map(FieldDescriptor::id),
            "Roles assigned"
        );
        assignment
    }

    fn assign_many(&self, fields: &[&FieldDescriptor], chart_type: ChartType) -> RoleAssignment {
        let measures: Vec<&FieldDescriptor> = fields.iter().copied().filter(|f| f.is_measure()).collect();
        let dimensions: Vec<&FieldDescriptor> =
            fields.iter().copied().filter(|f| f.is_dimension()).collect();
        let mut picker = Picker::new(fields);

        let (x, y, color) = match chart_type {
            ChartType::Bar | ChartType::Pie => {
                let x = picker.take(dimensions.first().copied().or(fields.first().copied()));
                let y = Self::measure_or_next(&mut picker, &measures);
                let color = if chart_type == ChartType::Pie {
                    None
                } else {
                    let c = picker
                        .first_unused(|f| f.is_dimension())
                        .or_else(|| picker.first_unused(|f| f.is_measure()));
                    picker.take(c)
                };
                (x, y, color)
            }
            ChartType::Line => {
                let temporal = fields.iter().copied().find(|f| f.is_temporal()).or_else(|| {
                    fields
                        .iter()
                        .copied()
                        .find(|f| f.looks_temporal(&self.temporal_indicators))
                });
                let x = picker.take(
                    temporal
                        .or(dimensions.first().copied())
                        .or(fields.first().copied()),
                );
                let y = Self::measure_or_next(&mut picker, &measures);
                let c = picker.first_unused(|_| true);
                (x, y, picker.take(c))
            }
            ChartType::Scatter => {
                let (x, y) = match measures.as_slice() {
                    [first, second, ..] => (picker.take(Some(*first)), picker.take(Some(*second))),
                    _ => {
                        let x = picker.take(fields.first().copied());
                        let y = picker.take(fields.get(1).copied());
                        (x, y)
                    }
                };
                let c = picker.first_unused(|f| f.is_nominal());
                (x, y, picker.take(c))
            }
            ChartType::Area | ChartType::Histogram => {
                let x = picker.take(fields.first().copied());
                let y = picker.take(fields.get(1).copied());
                let color = picker.take(fields.get(2).copied());
                (x, y, color)
            }
        };

        let y = match (x, y) {
            (Some(x), Some(y)) if x.id() == y.id() => {
                picker.release(y);
                let next = picker.first_unused(|f| f.id() != x.id());
                picker.take(next)
            }
            (_, None) => {
                let next = picker.first_unused(|f| x.map_or(true, |x| f.id() != x.id()));
                picker.take(next)
            }
            (_, y) => y,
        };

        RoleAssignment {
            x: x.cloned(),
            y: y.map_or(YRole::Unresolved, |f| YRole::Field(f.clone())),
            color: color.cloned(),
        }
    }

    /// First measure not yet assigned, else the next unused field.
    fn measure_or_next<'a>(
        picker: &mut Picker<'a>,
        measures: &[&'a FieldDescriptor],
    ) -> Option<&'a FieldDescriptor> {
        let candidate = measures
            .iter()
            .copied()
            .find(|m| !picker.is_used(m))
            .or_else(|| picker.first_unused(|_| true));
        picker.take(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::SemanticType;

    fn fd(name: &str, t: SemanticType) -> FieldDescriptor {
        FieldDescriptor::from_id(name, t).unwrap()
    }
    fn region() -> FieldDescriptor {
        fd("Region", SemanticType::Nominal)
    }
    fn sales() -> FieldDescriptor {
        fd("Sales", SemanticType::Quantitative)
    }
    fn profit() -> FieldDescriptor {
        fd("Profit", SemanticType::Quantitative)
    }
    fn month() -> FieldDescriptor {
        fd("Month", SemanticType::Temporal)
    }
    fn id(f: &Option<FieldDescriptor>) -> Option<&str> {
        f.as_ref().map(FieldDescriptor::id)
    }
    fn y_id(r: &RoleAssignment) -> Option<&str> {
        r.y.field().map(FieldDescriptor::id)
    }

    #[test]
    fn single_field_requests_count() {
        let r = RoleAssignmentEngine::new().assign(&[sales()], ChartType::Bar);
        assert_eq!(id(&r.x), Some("Sales"));
        assert_eq!(r.y, YRole::CountRequested);
        assert!(r.color.is_none());
    }

    #[test]
    fn empty_input_leaves_everything_unresolved() {
        let r = RoleAssignmentEngine::new().assign(&[], ChartType::Line);
        assert!(r.is_empty());
        assert_eq!(r.y, YRole::Unresolved);
    }

    #[test]
    fn bar_puts_dimension_on_x_even_when_mentioned_second() {
        let r = RoleAssignmentEngine::new().assign(&[sales(), region()], ChartType::Bar);
        assert_eq!(id(&r.x), Some("Region"));
        assert_eq!(y_id(&r), Some("Sales"));
        assert!(r.color.is_none());
    }

    #[test]
    fn bar_color_prefers_unused_dimension() {
        let r = RoleAssignmentEngine::new().assign(
            &[region(), sales(), profit(), fd("Status", SemanticType::Nominal)],
            ChartType::Bar,
        );
        assert_eq!(id(&r.x), Some("Region"));
        assert_eq!(y_id(&r), Some("Sales"));
        assert_eq!(id(&r.color), Some("Status"));
    }

    #[test]
    fn bar_with_two_dimensions_uses_next_field_for_y() {
        let r = RoleAssignmentEngine::new().assign(
            &[region(), fd("Status", SemanticType::Nominal)],
            ChartType::Bar,
        );
        assert_eq!(id(&r.x), Some("Region"));
        assert_eq!(y_id(&r), Some("Status"));
    }

    #[test]
    fn line_prefers_temporal_x() {
        let r = RoleAssignmentEngine::new().assign(&[region(), sales(), month()], ChartType::Line);
        assert_eq!(id(&r.x), Some("Month"));
        assert_eq!(y_id(&r), Some("Sales"));
        assert_eq!(id(&r.color), Some("Region"));
    }

    #[test]
    fn line_detects_time_by_name() {
        let exit = fd("ExitTime", SemanticType::Nominal);
        let r = RoleAssignmentEngine::new().assign(&[region(), exit, sales()], ChartType::Line);
        assert_eq!(id(&r.x), Some("ExitTime"));
    }

    #[test]
    fn line_prefers_temporal_type_over_time_like_measure_name() {
        let uptime = fd("Uptime", SemanticType::Quantitative);
        let order_date = fd("OrderDate", SemanticType::Temporal);
        let r = RoleAssignmentEngine::new().assign(&[uptime, order_date], ChartType::Line);
        assert_eq!(id(&r.x), Some("OrderDate"));
        assert_eq!(y_id(&r), Some("Uptime"));
    }

    #[test]
    fn scatter_uses_two_measures_and_nominal_color() {
        let r = RoleAssignmentEngine::new()
            .assign(&[region(), sales(), month(), profit()], ChartType::Scatter);
        assert_eq!(id(&r.x), Some("Sales"));
        assert_eq!(y_id(&r), Some("Profit"));
        assert_eq!(id(&r.color), Some("Region"));
    }

    #[test]
    fn scatter_with_one_measure_follows_field_order() {
        let r = RoleAssignmentEngine::new().assign(&[region(), sales()], ChartType::Scatter);
        assert_eq!(id(&r.x), Some("Region"));
        assert_eq!(y_id(&r), Some("Sales"));
        assert!(r.color.is_none());
    }

    #[test]
    fn pie_never_sets_color() {
        let r = RoleAssignmentEngine::new()
            .assign(&[region(), sales(), fd("Status", SemanticType::Nominal)], ChartType::Pie);
        assert_eq!(id(&r.x), Some("Region"));
        assert_eq!(y_id(&r), Some("Sales"));
        assert!(r.color.is_none());
    }

    #[test]
    fn area_walks_fields_in_order() {
        let r = RoleAssignmentEngine::new()
            .assign(&[sales(), region(), month()], ChartType::Area);
        assert_eq!(id(&r.x), Some("Sales"));
        assert_eq!(y_id(&r), Some("Region"));
        assert_eq!(id(&r.color), Some("Month"));
    }

    #[test]
    fn duplicate_input_collapses_before_assignment() {
        let r = RoleAssignmentEngine::new().assign(&[sales(), sales()], ChartType::Bar);
        assert_eq!(id(&r.x), Some("Sales"));
        assert_eq!(r.y, YRole::CountRequested);
    }

    #[test]
    fn assigned_lists_roles_in_order() {
        let r = RoleAssignmentEngine::new().assign(&[region(), sales(), month()], ChartType::Line);
        let roles: Vec<Role> = r.assigned().into_iter().map(|(role, _)| role).collect();
        assert_eq!(roles, vec![Role::X, Role::Y, Role::Color]);
    }
}
