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

//! Domain-aware overview built on top of the generic profile.

use super::{ChartSuggestion, SuggestionPriority};
use crate::classifier::parse_temporal;
use crate::config::{ClassifierConfig, DomainVocabulary, ProfilerConfig};
use crate::dataset::Dataset;
use crate::field::FieldDescriptor;
use crate::interpreter::ChartType;
use chrono::{Datelike, NaiveDateTime};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

static CLOCK_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2}):(\d{2}).*?(AM|PM)").expect("clock time pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetric {
    pub label: String,
    pub value: f64,
    /// `value` rounded and grouped for display.
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DomainInsights {
    pub domain: String,
    pub score: usize,
    pub record_label: String,
    pub column_label: String,
    pub time_span: Option<String>,
    pub peak_activity: Option<String>,
    pub location_coverage: Option<String>,
    pub product_diversity: Option<String>,
    pub top_product: Option<String>,
    pub peak_hour: Option<String>,
    pub key_metrics: Vec<KeyMetric>,
    pub suggestions: Vec<ChartSuggestion>,
}
impl fmt::Display for DomainInsights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.record_label, self.column_label)?;
        let lines = [
            ("Period", &self.time_span),
            ("Peak", &self.peak_activity),
            ("Locations", &self.location_coverage),
            ("Products", &self.product_diversity),
            ("Top Product", &self.top_product),
            ("Timing", &self.peak_hour),
        ];
        for (label, value) in lines {
            if let Some(value) = value {
                writeln!(f, "  {label}: {value}")?;
            }
        }
        for metric in &self.key_metrics {
            writeln!(f, "  {}: {}", metric.label, metric.display)?;
        }
        Ok(())
    }
}

/// Vocabulary with the strictly highest indicator score; the earlier one
/// wins a tie and a zero score means no domain.
pub fn detect_domain<'a>(
    fields: &[FieldDescriptor],
    vocabularies: &'a [DomainVocabulary],
) -> Option<(&'a DomainVocabulary, usize)> {
    let names: Vec<String> = fields
        .iter()
        .map(|f| f.display_name().to_lowercase())
        .collect();
    let mut best: Option<(&DomainVocabulary, usize)> = None;
    for vocabulary in vocabularies {
        let score: usize = vocabulary
            .indicators
            .iter()
            .map(|indicator| {
                let indicator = indicator.to_lowercase();
                names.iter().filter(|n| n.contains(&indicator)).count()
            })
            .sum();
        debug!(domain = %vocabulary.name, score, "Scored domain vocabulary");
        if score > best.map_or(0, |(_, top)| top) {
            best = Some((vocabulary, score));
        }
    }
    best
}

/// Digits grouped in threes with commas.
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Rounds to at most `decimals` places, trims trailing zeros and groups
/// the integer part.
pub fn format_number(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let grouped = int_part
        .parse::<usize>()
        .map(group_thousands)
        .unwrap_or_else(|_| int_part.to_string());
    let frac = frac_part.trim_end_matches('0');
    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

fn find_field<'a>(fields: &'a [FieldDescriptor], hints: &[String]) -> Option<&'a FieldDescriptor> {
    if hints.is_empty() {
        return None;
    }
    fields.iter().find(|f| {
        let name = f.display_name().to_lowercase();
        hints.iter().any(|h| name.contains(&h.to_lowercase()))
    })
}

fn numbers(dataset: &Dataset, field: &FieldDescriptor) -> Vec<f64> {
    dataset
        .present_values(field.id())
        .filter_map(|v| v.as_number())
        .collect()
}

/// Hour of day (0..24) read from a `h:mm ... AM|PM` cell.
pub fn clock_hour(text: &str) -> Option<u32> {
    let caps = CLOCK_TIME.captures(text)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("pm");
    Some(match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    })
}

fn most_common<K: std::hash::Hash + Eq>(counts: &IndexMap<K, usize>) -> Option<(&K, usize)> {
    let mut best: Option<(&K, usize)> = None;
    for (key, count) in counts {
        if best.map_or(true, |(_, top)| *count > top) {
            best = Some((key, *count));
        }
    }
    best
}

pub(crate) fn domain_insights(
    dataset: &Dataset,
    fields: &[FieldDescriptor],
    vocabulary: &DomainVocabulary,
    score: usize,
    config: &ProfilerConfig,
    parsing: &ClassifierConfig,
) -> DomainInsights {
    let rows = dataset.len();
    let hints = &vocabulary.hints;
    let mut insights = DomainInsights {
        domain: vocabulary.name.clone(),
        score,
        record_label: format!("{} {}", group_thousands(rows), vocabulary.record_label),
        column_label: format!("{} {}", fields.len(), vocabulary.column_label),
        ..DomainInsights::default()
    };

    let time_field = if hints.time.is_empty() {
        None
    } else {
        find_field(fields, &hints.time).or_else(|| fields.iter().find(|f| f.is_temporal()))
    };
    if let Some(field) = time_field {
        let dates: Vec<NaiveDateTime> = dataset
            .present_values(field.id())
            .filter_map(|v| parse_temporal(&v.as_text(), parsing))
            .collect();
        if let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) {
            insights.time_span = Some(format!(
                "{} - {}",
                min.format("%Y-%m-%d"),
                max.format("%Y-%m-%d")
            ));
            let mut months: IndexMap<(i32, u32), usize> = IndexMap::new();
            for date in &dates {
                *months.entry((date.year(), date.month())).or_insert(0) += 1;
            }
            if let Some((&(year, month), count)) = most_common(&months) {
                let label = dates
                    .iter()
                    .find(|d| d.year() == year && d.month() == month)
                    .map(|d| d.format("%b %Y").to_string())
                    .unwrap_or_default();
                insights.peak_activity = Some(format!(
                    "{label} ({} {})",
                    group_thousands(count),
                    vocabulary.event_noun
                ));
            }
        }

        let mut hours: IndexMap<u32, usize> = IndexMap::new();
        for value in dataset.present_values(field.id()) {
            if let Some(hour) = clock_hour(&value.as_text()) {
                *hours.entry(hour).or_insert(0) += 1;
            }
        }
        hours.sort_keys();
        if let Some((&hour, count)) = most_common(&hours) {
            let h12 = match hour {
                0 => 12,
                h if h > 12 => h - 12,
                h => h,
            };
            let period = if hour >= 12 { "PM" } else { "AM" };
            insights.peak_hour = Some(format!(
                "Peak activity at {h12}:00 {period} ({count} records)"
            ));
        }
    }

    if let Some(field) = find_field(fields, &hints.location) {
        let locations: IndexSet<_> = dataset
            .present_values(field.id())
            .map(|v| v.as_text().into_owned())
            .collect();
        insights.location_coverage = Some(format!("{} unique locations", locations.len()));
    }

    let product_field = find_field(fields, &hints.product);
    if let Some(field) = product_field {
        let mut products: IndexMap<String, usize> = IndexMap::new();
        for value in dataset.present_values(field.id()) {
            *products.entry(value.as_text().into_owned()).or_insert(0) += 1;
        }
        insights.product_diversity = Some(format!("{} product types", products.len()));
        if let Some((name, count)) = most_common(&products) {
            let percent = (count as f64 / rows as f64 * 100.0).round();
            insights.top_product = Some(format!("{name} ({percent:.0}% of volume)"));
        }
    }

    let quantity_field = find_field(fields, &hints.quantity);
    if let Some(field) = quantity_field {
        let values = numbers(dataset, field);
        if !values.is_empty() {
            let total: f64 = values.iter().sum();
            let average = total / values.len() as f64;
            insights.key_metrics.push(KeyMetric {
                label: "Total Volume".to_string(),
                value: total,
                display: format_number(total, 0),
            });
            insights.key_metrics.push(KeyMetric {
                label: format!("Avg per {}", vocabulary.item_noun),
                value: average,
                display: format_number(average, 1),
            });
        }
    }
    let flow_field = find_field(fields, &hints.flow);
    if let Some(field) = flow_field {
        let values = numbers(dataset, field);
        if !values.is_empty() {
            let average = values.iter().sum::<f64>() / values.len() as f64;
            insights.key_metrics.push(KeyMetric {
                label: "Avg Flow Rate".to_string(),
                value: average,
                display: format_number(average, 2),
            });
        }
    }

    let location_field = find_field(fields, &hints.location);
    let mut suggestions = Vec::new();
    if let (Some(t), Some(q)) = (find_field(fields, &hints.time), quantity_field) {
        let (t, q) = (t.display_name(), q.display_name());
        suggestions.push(ChartSuggestion {
            title: "Volume Trends Over Time".to_string(),
            description: format!("Track {q} patterns across {t}"),
            chart_type: ChartType::Line,
            prompt: format!("{q}, {t}, line chart"),
            priority: Some(SuggestionPriority::High),
        });
    }
    if let (Some(l), Some(q)) = (location_field, quantity_field) {
        let (l, q) = (l.display_name(), q.display_name());
        suggestions.push(ChartSuggestion {
            title: "Volume by Location".to_string(),
            description: format!("Compare {q} across {l}"),
            chart_type: ChartType::Bar,
            prompt: format!("{l}, {q}, bar chart"),
            priority: Some(SuggestionPriority::High),
        });
    }
    if let Some(p) = product_field {
        let p = p.display_name();
        suggestions.push(ChartSuggestion {
            title: "Product Distribution".to_string(),
            description: format!("Analyze distribution of {p}"),
            chart_type: ChartType::Pie,
            prompt: format!("{p}, pie chart"),
            priority: Some(SuggestionPriority::Medium),
        });
    }
    if let (Some(fl), Some(q)) = (flow_field, quantity_field) {
        let (fl, q) = (fl.display_name(), q.display_name());
        suggestions.push(ChartSuggestion {
            title: "Flow Rate vs Volume".to_string(),
            description: format!("Explore relationship between {fl} and {q}"),
            chart_type: ChartType::Scatter,
            prompt: format!("{fl}, {q}, scatter plot"),
            priority: Some(SuggestionPriority::Medium),
        });
    }
    suggestions.truncate(config.max_domain_suggestions);
    insights.suggestions = suggestions;
    insights
}
