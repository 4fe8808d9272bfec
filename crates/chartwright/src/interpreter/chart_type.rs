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
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Scatter,
    Pie,
    Area,
    Histogram,
}
impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Scatter,
        ChartType::Pie,
        ChartType::Area,
        ChartType::Histogram,
    ];
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Scatter => "scatter",
            ChartType::Pie => "pie",
            ChartType::Area => "area",
            ChartType::Histogram => "histogram",
        }
    }
    /// Capitalised name used in titles.
    pub fn label(&self) -> &'static str {
        match self {
            ChartType::Bar => "Bar",
            ChartType::Line => "Line",
            ChartType::Scatter => "Scatter",
            ChartType::Pie => "Pie",
            ChartType::Area => "Area",
            ChartType::Histogram => "Histogram",
        }
    }
    pub fn geom(&self) -> Geom {
        match self {
            ChartType::Bar | ChartType::Histogram => Geom::Bar,
            ChartType::Line => Geom::Line,
            ChartType::Scatter => Geom::Point,
            ChartType::Pie => Geom::Arc,
            ChartType::Area => Geom::Area,
        }
    }
    /// Phrase appended in the canonical comma form, e.g. `scatter plot`.
    pub fn query_suffix(&self) -> &'static str {
        match self {
            ChartType::Scatter => "scatter plot",
            ChartType::Bar => "bar chart",
            ChartType::Line => "line chart",
            ChartType::Pie => "pie chart",
            ChartType::Area => "area chart",
            ChartType::Histogram => "histogram",
        }
    }
}
impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for ChartType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bar" | "column" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "scatter" | "point" => Ok(ChartType::Scatter),
            "pie" | "donut" => Ok(ChartType::Pie),
            "area" => Ok(ChartType::Area),
            "histogram" => Ok(ChartType::Histogram),
            other => Err(format!("Unknown chart type: {other}")),
        }
    }
}

/// Mark primitive a renderer draws for a chart type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geom {
    Bar,
    Line,
    Point,
    Arc,
    Area,
}

/// Keywords that select a chart type when any of them occurs in a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub chart_type: ChartType,
    pub keywords: Vec<String>,
}
impl KeywordRule {
    pub fn new(chart_type: ChartType, keywords: &[&str]) -> Self {
        Self {
            chart_type,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
    /// First keyword found in `text`, which must already be lowercase.
    pub fn matched_keyword<'a>(&'a self, text: &str) -> Option<&'a str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|k| !k.is_empty() && text.contains(k))
    }
}

/// Where a chart type decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartTypeSource {
    Explicit,
    Intent,
    Default,
}

/// Explicit keywords first, then intent verbs, each list first-match-wins.
pub fn detect_chart_type(
    normalized_prompt: &str,
    explicit: &[KeywordRule],
    intent: &[KeywordRule],
    fallback: ChartType,
) -> (ChartType, ChartTypeSource) {
    for (rules, source) in [
        (explicit, ChartTypeSource::Explicit),
        (intent, ChartTypeSource::Intent),
    ] {
        for rule in rules {
            if let Some(keyword) = rule.matched_keyword(normalized_prompt) {
                debug!(
                    chart_type = %rule.chart_type,
                    keyword,
                    source = ?source,
                    "Chart type selected"
                );
                return (rule.chart_type, source);
            }
        }
    }
    (fallback, ChartTypeSource::Default)
}

/// Chart types that make sense for a field combination, most useful first.
pub fn suggest_chart_types(
    fields: &[FieldDescriptor],
    temporal_indicators: &[String],
) -> Vec<ChartType> {
    let measures = fields.iter().filter(|f| f.is_measure()).count();
    let dimensions = fields.len() - measures;
    let mut suggestions = Vec::new();
    if dimensions >= 1 && measures >= 1 {
        suggestions.extend([ChartType::Bar, ChartType::Line, ChartType::Pie]);
    }
    if measures >= 2 {
        suggestions.push(ChartType::Scatter);
    }
    if fields.iter().any(|f| f.looks_temporal(temporal_indicators)) {
        suggestions.extend([ChartType::Line, ChartType::Area]);
    }
    if suggestions.is_empty() {
        return vec![ChartType::Bar];
    }
    suggestions.into_iter().unique().collect()
}
