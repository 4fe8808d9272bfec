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

//! Declarative chart specification handed to a renderer.

use crate::aggregation::Aggregation;
use crate::field::FieldDescriptor;
use crate::interpreter::{ChartType, Geom};
use crate::roles::{Role, RoleAssignment, YRoleStatus};
use indexmap::IndexSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Drag-and-drop entry; the field id doubles as identity and grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfEntry {
    pub fid: String,
    pub drag_id: String,
}
impl ShelfEntry {
    fn for_field(field: &FieldDescriptor) -> Self {
        Self {
            fid: field.id().to_string(),
            drag_id: field.id().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelves {
    pub dimensions: Vec<ShelfEntry>,
    pub measures: Vec<ShelfEntry>,
    pub rows: Vec<ShelfEntry>,
    pub columns: Vec<ShelfEntry>,
    pub color: Vec<ShelfEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encodings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<FieldDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<FieldDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub geom: Geom,
    pub encodings: Encodings,
    pub y_role: YRoleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    pub title: String,
    pub shelves: Shelves,
}
impl fmt::Display for ChartSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "  type: {} ({:?})", self.chart_type, self.geom)?;
        for (label, field) in [
            ("x", &self.encodings.x),
            ("y", &self.encodings.y),
            ("color", &self.encodings.color),
        ] {
            if let Some(field) = field {
                writeln!(f, "  {label}: {} [{}]", field.display_name(), field.semantic_type())?;
            }
        }
        if let Some(aggregation) = self.aggregation {
            writeln!(f, "  aggregation: {aggregation}")?;
        }
        Ok(())
    }
}

/// `"{name} Analysis"` for one distinct name, else names joined by `vs`,
/// then the chart type. `"Chart"` when nothing was assigned.
pub fn build_title(roles: &RoleAssignment, chart_type: ChartType) -> String {
    let names: IndexSet<&str> = roles
        .assigned()
        .into_iter()
        .map(|(_, f)| f.display_name())
        .collect();
    let stem = match names.len() {
        0 => return "Chart".to_string(),
        1 => format!("{} Analysis", names[0]),
        _ => names.iter().join(" vs "),
    };
    format!("{stem} ({} Chart)", chart_type.label())
}

pub struct ChartSpecBuilder;
impl ChartSpecBuilder {
    pub fn build(
        roles: &RoleAssignment,
        chart_type: ChartType,
        aggregation: Option<Aggregation>,
    ) -> ChartSpec {
        let mut shelves = Shelves::default();
        let mut placed: HashSet<&str> = HashSet::new();
        for (role, field) in roles.assigned() {
            let entry = ShelfEntry::for_field(field);
            if placed.insert(field.id()) {
                if field.is_dimension() {
                    shelves.dimensions.push(entry.clone());
                } else {
                    shelves.measures.push(entry.clone());
                }
            }
            match role {
                Role::X => shelves.columns.push(entry),
                Role::Y => shelves.rows.push(entry),
                Role::Color => shelves.color.push(entry),
            }
        }
        ChartSpec {
            chart_type,
            geom: chart_type.geom(),
            encodings: Encodings {
                x: roles.x.clone(),
                y: roles.y.field().cloned(),
                color: roles.color.clone(),
            },
            y_role: roles.y.status(),
            aggregation,
            title: build_title(roles, chart_type),
            shelves,
        }
    }
}
