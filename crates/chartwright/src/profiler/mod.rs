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

//! Dataset quality, column statistics, anomalies and chart suggestions.
//!
//! Profiling never fails. Cells that cannot be read as numbers are left out
//! of numeric statistics without comment.

pub mod insights;

pub use insights::{detect_domain, format_number, group_thousands, DomainInsights, KeyMetric};

use crate::classifier::{ColumnKind, FieldClassification};
use crate::config::{ClassifierConfig, ProfilerConfig};
use crate::dataset::{Dataset, Record};
use crate::interpreter::ChartType;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSummary {
    Numeric {
        min: f64,
        max: f64,
        mean: f64,
        median: f64,
    },
    Categorical {
        most_frequent: String,
        categories: usize,
    },
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub kind: ColumnKind,
    pub unique_count: usize,
    /// Present cells as a whole percentage of rows.
    pub completeness: u8,
    pub summary: ColumnSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    MissingData,
    Outliers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub field: String,
    pub message: String,
    pub severity: AnomalySeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSuggestion {
    pub title: String,
    pub description: String,
    pub chart_type: ChartType,
    /// Prompt in the comma form, ready for the interpreter.
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<SuggestionPriority>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    pub quality_score: u8,
    /// Present cells as a percentage of all cells, two decimals.
    pub completeness: f64,
    pub duplicate_rows: usize,
    pub issues: Vec<String>,
    pub columns: Vec<ColumnStats>,
    pub suggestions: Vec<ChartSuggestion>,
    pub anomalies: Vec<Anomaly>,
    pub insights: Vec<String>,
    pub domain: Option<DomainInsights>,
}
impl DatasetProfile {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
    pub fn column(&self, name: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|c| c.name == name)
    }
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str("Dataset Profile\n===============\n");
        report.push_str(&format!(
            "Rows: {}  Columns: {}\n",
            self.row_count, self.column_count
        ));
        report.push_str(&format!(
            "Quality Score: {}/100 ({} duplicate rows)\n",
            self.quality_score, self.duplicate_rows
        ));
        if !self.issues.is_empty() {
            report.push_str("\nIssues:\n");
            for issue in &self.issues {
                report.push_str(&format!("  - {issue}\n"));
            }
        }
        report.push_str("\nColumns:\n");
        for column in &self.columns {
            report.push_str(&format!(
                "  - {} ({}, {} unique, {}% complete)\n",
                column.name, column.kind, column.unique_count, column.completeness
            ));
        }
        if !self.anomalies.is_empty() {
            report.push_str("\nAnomalies:\n");
            for anomaly in &self.anomalies {
                report.push_str(&format!("  - [{:?}] {}\n", anomaly.severity, anomaly.message));
            }
        }
        if !self.suggestions.is_empty() {
            report.push_str("\nSuggested Charts:\n");
            for s in &self.suggestions {
                report.push_str(&format!("  - {}: \"{}\"\n", s.title, s.prompt));
            }
        }
        for insight in &self.insights {
            report.push_str(&format!("\n{insight}"));
        }
        if let Some(domain) = &self.domain {
            report.push_str(&format!("\n\n{domain}"));
        }
        report.push('\n');
        report
    }
}
impl fmt::Display for DatasetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

/// Values outside `[Q1 - k*IQR, Q3 + k*IQR]`, with Q1 and Q3 read at the
/// 25th and 75th percentile index of the sorted sample. Fewer than four
/// values never produce outliers.
pub fn detect_outliers(values: &[f64], multiplier: f64) -> Vec<f64> {
    if values.len() < 4 {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let q1 = sorted[n / 4];
    let q3 = sorted[(n * 3) / 4];
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;
    values
        .iter()
        .copied()
        .filter(|v| *v < lower || *v > upper)
        .collect()
}

pub fn count_outliers(values: &[f64], multiplier: f64) -> usize {
    detect_outliers(values, multiplier).len()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
fn whole_percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Order-independent identity of a record's contents.
fn canonical_key(record: &Record) -> String {
    record
        .iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(k, v)| format!("{k}={v:?}"))
        .join("\u{1f}")
}

#[derive(Debug, Clone, Default)]
pub struct DatasetProfiler {
    config: ProfilerConfig,
    parsing: ClassifierConfig,
}
impl DatasetProfiler {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_config(config: ProfilerConfig) -> Self {
        Self {
            config,
            parsing: ClassifierConfig::default(),
        }
    }
    /// Date formats used when reading temporal columns.
    pub fn with_date_parsing(mut self, parsing: ClassifierConfig) -> Self {
        self.parsing = parsing;
        self
    }
    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    pub fn profile(
        &self,
        dataset: &Dataset,
        classifications: &[FieldClassification],
    ) -> DatasetProfile {
        let row_count = dataset.len();
        let column_count = classifications.len();
        info!(rows = row_count, columns = column_count, "Profiling dataset");

        let mut issues = Vec::new();
        let mut complete_cells = 0usize;
        for (index, record) in dataset.records().iter().enumerate() {
            for c in classifications {
                let present = record
                    .get(c.descriptor.id())
                    .is_some_and(|v| !v.is_missing());
                if present {
                    complete_cells += 1;
                } else if issues.len() < self.config.max_missing_reports {
                    issues.push(format!(
                        "Missing {} in row {}",
                        c.descriptor.display_name(),
                        index + 1
                    ));
                }
            }
        }
        let total_cells = row_count * column_count;
        let completeness = if total_cells == 0 {
            0.0
        } else {
            round2(complete_cells as f64 / total_cells as f64 * 100.0)
        };
        let quality_score = whole_percent(complete_cells, total_cells);

        let duplicate_rows = Self::count_duplicates(dataset);
        if duplicate_rows > 0 {
            issues.push(format!("{duplicate_rows} duplicate rows detected"));
        }
        issues.truncate(self.config.max_issues);

        let mut columns = Vec::with_capacity(column_count);
        let mut missing_anomalies = Vec::new();
        let mut outlier_anomalies = Vec::new();
        for c in classifications {
            let (stats, numbers) = self.column_stats(dataset, c);
            if let Some(anomaly) = self.missing_anomaly(dataset, c) {
                missing_anomalies.push(anomaly);
            }
            if c.kind == ColumnKind::Numeric && numbers.len() > self.config.outlier_min_samples {
                let outliers = count_outliers(&numbers, self.config.iqr_multiplier);
                if outliers > 0 {
                    outlier_anomalies.push(Anomaly {
                        kind: AnomalyKind::Outliers,
                        field: stats.name.clone(),
                        message: format!(
                            "{outliers} potential outliers detected in {}",
                            stats.name
                        ),
                        severity: AnomalySeverity::Low,
                    });
                }
            }
            columns.push(stats);
        }
        let mut anomalies = missing_anomalies;
        anomalies.extend(outlier_anomalies);

        let suggestions = self.suggestions(classifications);
        let size_insights = self.size_insights(row_count, column_count);
        let fields: Vec<_> = classifications.iter().map(|c| c.descriptor.clone()).collect();
        let domain = detect_domain(&fields, &self.config.vocabularies).map(|(vocabulary, score)| {
            insights::domain_insights(
                dataset,
                &fields,
                vocabulary,
                score,
                &self.config,
                &self.parsing,
            )
        });
        debug!(
            quality_score,
            duplicate_rows,
            anomalies = anomalies.len(),
            domain = domain.as_ref().map(|d| d.domain.as_str()),
            "Dataset profiled"
        );

        DatasetProfile {
            row_count,
            column_count,
            quality_score,
            completeness,
            duplicate_rows,
            issues,
            columns,
            suggestions,
            anomalies,
            insights: size_insights,
            domain,
        }
    }

    /// Records whose contents, in any key order, appeared earlier.
    pub fn count_duplicates(dataset: &Dataset) -> usize {
        let mut seen = HashSet::with_capacity(dataset.len());
        dataset
            .records()
            .iter()
            .filter(|r| !seen.insert(canonical_key(r)))
            .count()
    }

    fn column_stats(&self, dataset: &Dataset, c: &FieldClassification) -> (ColumnStats, Vec<f64>) {
        let id = c.descriptor.id();
        let present: Vec<_> = dataset.present_values(id).collect();
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for value in &present {
            *counts.entry(value.as_text().into_owned()).or_insert(0) += 1;
        }
        let numbers: Vec<f64> = if c.kind == ColumnKind::Numeric {
            present.iter().filter_map(|v| v.as_number()).collect()
        } else {
            Vec::new()
        };
        let summary = match c.kind {
            ColumnKind::Numeric if !numbers.is_empty() => {
                let mut sorted = numbers.clone();
                sorted.sort_by(f64::total_cmp);
                let sum: f64 = sorted.iter().sum();
                ColumnSummary::Numeric {
                    min: sorted[0],
                    max: sorted[sorted.len() - 1],
                    mean: round2(sum / sorted.len() as f64),
                    median: sorted[sorted.len() / 2],
                }
            }
            ColumnKind::Numeric | ColumnKind::Unknown => ColumnSummary::None,
            ColumnKind::Datetime | ColumnKind::Identifier | ColumnKind::Categorical => {
                let mut best: Option<(&String, usize)> = None;
                for (value, count) in &counts {
                    if best.map_or(true, |(_, top)| *count > top) {
                        best = Some((value, *count));
                    }
                }
                match best {
                    Some((value, _)) => ColumnSummary::Categorical {
                        most_frequent: value.clone(),
                        categories: counts.len(),
                    },
                    None => ColumnSummary::None,
                }
            }
        };
        let stats = ColumnStats {
            name: c.descriptor.display_name().to_string(),
            kind: c.kind,
            unique_count: counts.len(),
            completeness: whole_percent(present.len(), dataset.len()),
            summary,
        };
        (stats, numbers)
    }

    fn missing_anomaly(&self, dataset: &Dataset, c: &FieldClassification) -> Option<Anomaly> {
        let rows = dataset.len();
        if rows == 0 {
            return None;
        }
        let missing = rows - dataset.present_values(c.descriptor.id()).count();
        let percent = missing as f64 / rows as f64 * 100.0;
        if missing == 0 || percent <= self.config.missing_anomaly_percent {
            return None;
        }
        let severity = if percent > self.config.high_missing_percent {
            AnomalySeverity::High
        } else {
            AnomalySeverity::Medium
        };
        Some(Anomaly {
            kind: AnomalyKind::MissingData,
            field: c.descriptor.display_name().to_string(),
            message: format!(
                "{percent:.1}% missing values in {}",
                c.descriptor.display_name()
            ),
            severity,
        })
    }

    fn suggestions(&self, classifications: &[FieldClassification]) -> Vec<ChartSuggestion> {
        let of_kind = |kind: ColumnKind| {
            classifications
                .iter()
                .filter(move |c| c.kind == kind)
                .map(|c| c.descriptor.display_name())
        };
        let numerics: Vec<&str> = of_kind(ColumnKind::Numeric).collect();
        let temporal = of_kind(ColumnKind::Datetime).next();
        let category = classifications
            .iter()
            .find(|c| c.descriptor.is_nominal())
            .map(|c| c.descriptor.display_name());

        let mut suggestions = Vec::new();
        if let (Some(m), Some(t)) = (numerics.first(), temporal) {
            suggestions.push(ChartSuggestion {
                title: format!("{m} Over Time"),
                description: format!("Show how {m} changes over {t}"),
                chart_type: ChartType::Line,
                prompt: format!("{t}, {m}, line chart"),
                priority: None,
            });
        }
        if let Some(m) = numerics.first() {
            suggestions.push(ChartSuggestion {
                title: format!("{m} Distribution"),
                description: format!("See the distribution of {m} values"),
                chart_type: ChartType::Histogram,
                prompt: format!("{m}, histogram"),
                priority: None,
            });
        }
        if let (Some(m), Some(c)) = (numerics.first(), category) {
            suggestions.push(ChartSuggestion {
                title: format!("{m} by {c}"),
                description: format!("Compare {m} across different {c}"),
                chart_type: ChartType::Bar,
                prompt: format!("{c}, {m}, bar chart"),
                priority: None,
            });
        }
        if let [a, b, ..] = numerics.as_slice() {
            suggestions.push(ChartSuggestion {
                title: format!("{a} vs {b}"),
                description: format!("Explore relationship between {a} and {b}"),
                chart_type: ChartType::Scatter,
                prompt: format!("{a}, {b}, scatter plot"),
                priority: None,
            });
        }
        suggestions.truncate(self.config.max_suggestions);
        suggestions
    }

    fn size_insights(&self, rows: usize, columns: usize) -> Vec<String> {
        if rows == 0 {
            return Vec::new();
        }
        let mut notes = Vec::new();
        if rows > self.config.large_dataset_rows {
            notes.push(format!(
                "Large dataset with {} records",
                group_thousands(rows)
            ));
        } else if rows < self.config.small_dataset_rows {
            notes.push(format!("Small dataset with {rows} records"));
        }
        if columns > self.config.rich_dataset_columns {
            notes.push(format!("Rich dataset with {columns} attributes"));
        }
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FieldTypeClassifier;
    use crate::dataset::Value;

    fn profile_of(dataset: &Dataset) -> DatasetProfile {
        let classes = FieldTypeClassifier::new().classify_dataset(dataset).unwrap();
        DatasetProfiler::new().profile(dataset, &classes)
    }

    #[test]
    fn iqr_rule_flags_the_extreme_value() {
        let values = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 100.0];
        assert_eq!(detect_outliers(&values, 1.5), vec![100.0]);
        assert_eq!(count_outliers(&[1.0, 100.0, 2.0], 1.5), 0);
    }

    #[test]
    fn empty_dataset_scores_zero() {
        let p = profile_of(&Dataset::new());
        assert_eq!(p.quality_score, 0);
        assert_eq!(p.row_count, 0);
        assert!(p.issues.is_empty());
        assert!(p.insights.is_empty());
    }

    #[test]
    fn missing_cells_reported_for_first_five_and_truncated() {
        let rows: Vec<Vec<&str>> = (0..10).map(|_| vec!["a", ""]).collect();
        let ds = Dataset::from_rows(&["Name", "Status"], rows);
        let p = profile_of(&ds);
        assert_eq!(p.quality_score, 50);
        assert_eq!(p.issues.len(), 3);
        assert_eq!(p.issues[0], "Missing Status in row 1");
        assert_eq!(p.issues[2], "Missing Status in row 3");
        assert_eq!(p.duplicate_rows, 9);
    }

    #[test]
    fn duplicates_ignore_key_order() {
        let mut a = Record::new();
        a.insert("x".into(), Value::from(1.0));
        a.insert("y".into(), Value::from("b"));
        let mut b = Record::new();
        b.insert("y".into(), Value::from("b"));
        b.insert("x".into(), Value::from(1.0));
        let mut c = Record::new();
        c.insert("x".into(), Value::from("1"));
        c.insert("y".into(), Value::from("b"));
        let ds = Dataset::from_records(vec![a, b, c]);
        assert_eq!(DatasetProfiler::count_duplicates(&ds), 1);
        let p = profile_of(&ds);
        assert_eq!(p.issues, vec!["1 duplicate rows detected".to_string()]);
    }

    #[test]
    fn numeric_and_categorical_summaries() {
        let ds = Dataset::from_rows(
            &["Region", "Sales"],
            vec![
                vec!["North", "10"],
                vec!["South", "20"],
                vec!["North", "x"],
                vec!["East", "5"],
                vec!["South", "7.555"],
            ],
        );
        let p = profile_of(&ds);
        let sales = p.column("Sales").unwrap();
        assert_eq!(sales.kind, ColumnKind::Numeric);
        assert_eq!(
            sales.summary,
            ColumnSummary::Numeric {
                min: 5.0,
                max: 20.0,
                mean: 10.64,
                median: 10.0
            }
        );
        let region = p.column("Region").unwrap();
        assert_eq!(region.unique_count, 3);
        assert_eq!(
            region.summary,
            ColumnSummary::Categorical {
                most_frequent: "North".into(),
                categories: 3
            }
        );
    }

    #[test]
    fn missing_anomaly_severity() {
        let mut rows: Vec<Vec<&str>> = (0..70).map(|i| vec![if i % 2 == 0 { "a" } else { "b" }, "ok"]).collect();
        rows.extend((0..30).map(|_| vec!["a", ""]));
        let ds = Dataset::from_rows(&["Group", "Status"], rows);
        let p = profile_of(&ds);
        let anomaly = p
            .anomalies
            .iter()
            .find(|a| a.kind == AnomalyKind::MissingData)
            .unwrap();
        assert_eq!(anomaly.severity, AnomalySeverity::High);
        assert_eq!(anomaly.message, "30.0% missing values in Status");
        assert_eq!(p.column("Status").unwrap().completeness, 70);
    }

    #[test]
    fn outlier_anomaly_needs_more_than_ten_values() {
        let mut values: Vec<String> = (0..11).map(|i| (10 + i % 3).to_string()).collect();
        values.push("500".into());
        let rows: Vec<Vec<String>> = values.into_iter().map(|v| vec![v]).collect();
        let ds = Dataset::from_rows(&["Load"], rows);
        let p = profile_of(&ds);
        assert!(p
            .anomalies
            .iter()
            .any(|a| a.kind == AnomalyKind::Outliers && a.message.starts_with("1 potential")));
    }

    #[test]
    fn suggestions_cover_all_four_kinds() {
        let ds = Dataset::from_rows(
            &["Day", "Region", "Sales", "Profit"],
            vec![
                vec!["2024-01-01", "North", "10", "1"],
                vec!["2024-01-02", "South", "20", "2"],
                vec!["2024-01-03", "North", "30", "3"],
                vec!["2024-01-04", "South", "40", "4"],
            ],
        );
        let p = profile_of(&ds);
        let kinds: Vec<ChartType> = p.suggestions.iter().map(|s| s.chart_type).collect();
        assert_eq!(
            kinds,
            vec![ChartType::Line, ChartType::Histogram, ChartType::Bar, ChartType::Scatter]
        );
        assert_eq!(p.suggestions[0].prompt, "Day, Sales, line chart");
        assert_eq!(p.suggestions[2].description, "Compare Sales across different Region");
        assert_eq!(p.insights, vec!["Small dataset with 4 records".to_string()]);
    }

    #[test]
    fn identifier_dimension_still_gets_a_breakdown() {
        let ds = Dataset::from_rows(
            &["Terminal", "Sales"],
            vec![
                vec!["T1", "10"],
                vec!["T2", "20"],
                vec!["T3", "30"],
                vec!["T4", "40"],
                vec!["T5", "50"],
            ],
        );
        let classes = FieldTypeClassifier::new().classify_dataset(&ds).unwrap();
        assert_eq!(classes[0].kind, ColumnKind::Identifier);
        let p = DatasetProfiler::new().profile(&ds, &classes);
        let kinds: Vec<ChartType> = p.suggestions.iter().map(|s| s.chart_type).collect();
        assert_eq!(kinds, vec![ChartType::Histogram, ChartType::Bar]);
        assert_eq!(p.suggestions[1].prompt, "Terminal, Sales, bar chart");
    }
}
