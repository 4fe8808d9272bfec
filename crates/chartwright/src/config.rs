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

//! Lookup tables and thresholds for every stage.
//!
//! All tables are plain data read once and never mutated. Ordered tables are
//! evaluated front to back, first match wins.

use crate::error::{ConfigError, ConfigResult};
use crate::interpreter::chart_type::{ChartType, KeywordRule};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub classifier: ClassifierConfig,
    pub interpreter: InterpreterConfig,
    pub profiler: ProfilerConfig,
}
impl InferenceConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::ConfigFileError {
                path: path.as_ref().display().to_string(),
                source,
            })?;
        Self::from_yaml_str(&content)
    }
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
    pub fn validate(&self) -> ConfigResult<()> {
        self.classifier.validate()?;
        self.interpreter.validate()?;
        self.profiler.validate()
    }
}

fn check_ratio(field: &str, value: f64) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
fn check_percent(field: &str, value: f64) -> ConfigResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
fn check_nonzero(field: &str, value: usize) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value: "0".to_string(),
        });
    }
    Ok(())
}
fn check_table<T>(table: &str, entries: &[T]) -> ConfigResult<()> {
    if entries.is_empty() {
        return Err(ConfigError::EmptyTable {
            table: table.to_string(),
        });
    }
    Ok(())
}
fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Non-missing values inspected per field.
    pub sample_limit: usize,
    pub numeric_threshold: f64,
    pub date_threshold: f64,
    /// Distinct/sampled ratio above which a text field is an identifier.
    pub identifier_uniqueness: f64,
    /// chrono formats tried as a date.
    pub date_formats: Vec<String>,
    /// chrono formats tried as a date-time.
    pub datetime_formats: Vec<String>,
}
impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sample_limit: 50,
            numeric_threshold: 0.7,
            date_threshold: 0.7,
            identifier_uniqueness: 0.8,
            date_formats: strings(&["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%b-%Y"]),
            datetime_formats: strings(&[
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%dT%H:%M:%SZ",
                "%Y-%m-%dT%H:%M:%S%.f",
                "%m/%d/%Y %H:%M",
                "%m/%d/%Y %I:%M:%S %p",
            ]),
        }
    }
}
impl ClassifierConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_nonzero("classifier.sample_limit", self.sample_limit)?;
        check_ratio("classifier.numeric_threshold", self.numeric_threshold)?;
        check_ratio("classifier.date_threshold", self.date_threshold)?;
        check_ratio(
            "classifier.identifier_uniqueness",
            self.identifier_uniqueness,
        )?;
        if self.date_formats.is_empty() && self.datetime_formats.is_empty() {
            return Err(ConfigError::EmptyTable {
                table: "classifier.date_formats".to_string(),
            });
        }
        Ok(())
    }
    /// Higher bars before a field is called numeric or temporal.
    pub fn strict() -> Self {
        Self {
            numeric_threshold: 0.9,
            date_threshold: 0.9,
            identifier_uniqueness: 0.95,
            ..Default::default()
        }
    }
    /// Smaller samples for very wide datasets.
    pub fn for_fast_classification() -> Self {
        Self {
            sample_limit: 20,
            ..Default::default()
        }
    }
}

/// Prompt phrase and the field-name fragment it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymEntry {
    pub phrase: String,
    pub canonical: String,
}
impl SynonymEntry {
    pub fn new(phrase: &str, canonical: &str) -> Self {
        Self {
            phrase: phrase.to_string(),
            canonical: canonical.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Explicit chart keywords in priority order.
    pub chart_keywords: Vec<KeywordRule>,
    /// Action verbs consulted when no explicit keyword occurs.
    pub intent_keywords: Vec<KeywordRule>,
    pub default_chart_type: ChartType,
    /// Words that make up chart-type segments such as `bar chart`.
    pub chart_vocabulary: Vec<String>,
    /// Markers that limit a prompt to its first compared fields.
    pub comparison_markers: Vec<String>,
    pub max_compared_fields: usize,
    pub synonyms: Vec<SynonymEntry>,
    /// Name fragments that mark a field as time-like.
    pub temporal_indicators: Vec<String>,
    pub max_example_prompts: usize,
}
impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            chart_keywords: vec![
                KeywordRule::new(ChartType::Bar, &["bar", "column"]),
                KeywordRule::new(ChartType::Line, &["line", "trend", "time"]),
                KeywordRule::new(ChartType::Scatter, &["scatter", "plot", "correlation"]),
                KeywordRule::new(ChartType::Pie, &["pie", "donut", "proportion"]),
                KeywordRule::new(ChartType::Area, &["area"]),
                KeywordRule::new(ChartType::Histogram, &["histogram", "distribution"]),
            ],
            intent_keywords: vec![
                KeywordRule::new(
                    ChartType::Bar,
                    &["compare", "comparison", "vs", "versus", "across", "against"],
                ),
                KeywordRule::new(ChartType::Line, &["trend", "over time", "timeline"]),
                KeywordRule::new(
                    ChartType::Pie,
                    &["distribution", "share", "proportion", "breakdown"],
                ),
                KeywordRule::new(ChartType::Scatter, &["relationship", "correlation"]),
            ],
            default_chart_type: ChartType::Bar,
            chart_vocabulary: strings(&[
                "bar", "bars", "column", "columns", "line", "pie", "donut", "scatter", "plot",
                "area", "histogram", "chart", "graph",
            ]),
            comparison_markers: strings(&["compare", "vs", "across"]),
            max_compared_fields: 2,
            synonyms: vec![
                SynonymEntry::new("gross quantity", "GrossQuantity"),
                SynonymEntry::new("quantity", "Quantity"),
                SynonymEntry::new("flow rate", "FlowRate"),
                SynonymEntry::new("compartment", "Compartment"),
                SynonymEntry::new("base product", "BaseProduct"),
                SynonymEntry::new("product", "Product"),
                SynonymEntry::new("terminal", "Terminal"),
                SynonymEntry::new("efficiency", "Efficiency"),
                SynonymEntry::new("uptime", "Uptime"),
                SynonymEntry::new("throughput", "Throughput"),
                SynonymEntry::new("revenue", "Revenue"),
                SynonymEntry::new("sales", "Sales"),
                SynonymEntry::new("profit", "Profit"),
                SynonymEntry::new("region", "Region"),
                SynonymEntry::new("fuel type", "FuelType"),
                SynonymEntry::new("daily volume", "DailyVolume"),
                SynonymEntry::new("volume", "Volume"),
                SynonymEntry::new("operating hours", "OperatingHours"),
                SynonymEntry::new("customer", "Customer"),
                SynonymEntry::new("department", "Department"),
            ],
            temporal_indicators: strings(&[
                "date",
                "time",
                "year",
                "month",
                "day",
                "week",
                "timestamp",
                "created",
                "updated",
                "modified",
            ]),
            max_example_prompts: 3,
        }
    }
}
impl InterpreterConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_table("interpreter.chart_keywords", &self.chart_keywords)?;
        check_table("interpreter.intent_keywords", &self.intent_keywords)?;
        check_table("interpreter.chart_vocabulary", &self.chart_vocabulary)?;
        check_nonzero(
            "interpreter.max_compared_fields",
            self.max_compared_fields,
        )?;
        for rule in self.chart_keywords.iter().chain(&self.intent_keywords) {
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(ConfigError::EmptyVocabulary {
                    name: format!("{} keywords", rule.chart_type),
                });
            }
        }
        if let Some(entry) = self
            .synonyms
            .iter()
            .find(|s| s.phrase.trim().is_empty() || s.canonical.trim().is_empty())
        {
            return Err(ConfigError::OutOfRange {
                field: "interpreter.synonyms".to_string(),
                value: format!("{} -> {}", entry.phrase, entry.canonical),
            });
        }
        Ok(())
    }
    /// Fallback scanning by literal names only.
    pub fn without_synonyms() -> Self {
        Self {
            synonyms: Vec::new(),
            ..Default::default()
        }
    }
    pub fn with_synonym(mut self, phrase: &str, canonical: &str) -> Self {
        self.synonyms.push(SynonymEntry::new(phrase, canonical));
        self
    }
}

/// Field-name hints for one insight family; empty hints turn it off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainHints {
    pub time: Vec<String>,
    pub location: Vec<String>,
    pub product: Vec<String>,
    pub quantity: Vec<String>,
    pub flow: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainVocabulary {
    pub name: String,
    pub indicators: Vec<String>,
    /// Noun for the records, e.g. `Shipment Records`.
    pub record_label: String,
    /// Noun for the columns, e.g. `Tracking Points`.
    pub column_label: String,
    /// Singular noun for one record, e.g. `Shipment`.
    pub item_noun: String,
    /// Plural noun used in the peak period insight.
    pub event_noun: String,
    #[serde(default)]
    pub hints: DomainHints,
}
impl DomainVocabulary {
    pub fn shipment() -> Self {
        Self {
            name: "shipment".to_string(),
            indicators: strings(&[
                "shipment",
                "compartment",
                "flowrate",
                "grossquantity",
                "exittime",
                "scheduleddate",
                "baycode",
                "baseproduct",
            ]),
            record_label: "Shipment Records".to_string(),
            column_label: "Tracking Points".to_string(),
            item_noun: "Shipment".to_string(),
            event_noun: "shipments".to_string(),
            hints: DomainHints {
                time: strings(&["time", "date"]),
                location: strings(&["terminal", "bay", "compartment"]),
                product: strings(&["product", "base"]),
                quantity: strings(&["quantity", "volume"]),
                flow: strings(&["flow"]),
            },
        }
    }
    pub fn sales() -> Self {
        Self {
            name: "sales".to_string(),
            indicators: strings(&["sales", "revenue", "price", "customer", "order"]),
            record_label: "Sales Transactions".to_string(),
            column_label: "Sales Metrics".to_string(),
            item_noun: "Transaction".to_string(),
            event_noun: "transactions".to_string(),
            hints: DomainHints::default(),
        }
    }
    pub fn performance() -> Self {
        Self {
            name: "performance".to_string(),
            indicators: strings(&["efficiency", "uptime", "throughput", "performance"]),
            record_label: "Performance Records".to_string(),
            column_label: "KPIs".to_string(),
            item_noun: "Record".to_string(),
            event_noun: "records".to_string(),
            hints: DomainHints::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    pub max_issues: usize,
    /// Missing cells reported individually before the rest go unmentioned.
    pub max_missing_reports: usize,
    pub max_suggestions: usize,
    /// Outlier checks need strictly more parseable values than this.
    pub outlier_min_samples: usize,
    pub iqr_multiplier: f64,
    pub missing_anomaly_percent: f64,
    pub high_missing_percent: f64,
    pub large_dataset_rows: usize,
    pub small_dataset_rows: usize,
    pub rich_dataset_columns: usize,
    pub max_domain_suggestions: usize,
    /// Scored in order; ties go to the earlier vocabulary.
    pub vocabularies: Vec<DomainVocabulary>,
}
impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            max_issues: 3,
            max_missing_reports: 5,
            max_suggestions: 4,
            outlier_min_samples: 10,
            iqr_multiplier: 1.5,
            missing_anomaly_percent: 5.0,
            high_missing_percent: 20.0,
            large_dataset_rows: 1000,
            small_dataset_rows: 100,
            rich_dataset_columns: 10,
            max_domain_suggestions: 4,
            vocabularies: vec![
                DomainVocabulary::shipment(),
                DomainVocabulary::sales(),
                DomainVocabulary::performance(),
            ],
        }
    }
}
impl ProfilerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_nonzero("profiler.max_issues", self.max_issues)?;
        check_nonzero("profiler.max_suggestions", self.max_suggestions)?;
        check_percent(
            "profiler.missing_anomaly_percent",
            self.missing_anomaly_percent,
        )?;
        check_percent("profiler.high_missing_percent", self.high_missing_percent)?;
        if self.high_missing_percent < self.missing_anomaly_percent {
            return Err(ConfigError::OutOfRange {
                field: "profiler.high_missing_percent".to_string(),
                value: self.high_missing_percent.to_string(),
            });
        }
        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "profiler.iqr_multiplier".to_string(),
                value: self.iqr_multiplier.to_string(),
            });
        }
        for vocabulary in &self.vocabularies {
            if vocabulary.indicators.iter().all(|i| i.trim().is_empty()) {
                return Err(ConfigError::EmptyVocabulary {
                    name: vocabulary.name.clone(),
                });
            }
        }
        Ok(())
    }
    /// Statistics only; domain augmentation is skipped.
    pub fn for_fast_profiling() -> Self {
        Self {
            vocabularies: Vec::new(),
            max_missing_reports: 3,
            ..Default::default()
        }
    }
    /// Tighter anomaly reporting for curated datasets.
    pub fn for_high_quality() -> Self {
        Self {
            missing_anomaly_percent: 1.0,
            high_missing_percent: 10.0,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        assert!(InferenceConfig::default().validate().is_ok());
        assert!(ClassifierConfig::strict().validate().is_ok());
        assert!(ProfilerConfig::for_fast_profiling().validate().is_ok());
        assert!(ProfilerConfig::for_high_quality().validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "classifier:\n  sample_limit: 10\nprofiler:\n  max_issues: 5\n";
        let config = InferenceConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.classifier.sample_limit, 10);
        assert_eq!(config.classifier.numeric_threshold, 0.7);
        assert_eq!(config.profiler.max_issues, 5);
        assert_eq!(config.interpreter, InterpreterConfig::default());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = InferenceConfig::from_yaml_str("classifier:\n  numeric_threshold: 1.5\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        let mut config = InferenceConfig::default();
        config.profiler.vocabularies[0].indicators.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyVocabulary { .. })
        ));
    }

    #[test]
    fn yaml_round_trip_through_file() {
        let config = InferenceConfig::default().interpreter.with_synonym("site", "Terminal");
        let full = InferenceConfig {
            interpreter: config,
            ..Default::default()
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(full.to_yaml_string().unwrap().as_bytes())
            .unwrap();
        let loaded = InferenceConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(loaded, full);
    }

    #[test]
    fn shipped_file_matches_defaults() {
        let shipped = InferenceConfig::from_yaml_str(include_str!("../config/inference.yml")).unwrap();
        assert_eq!(shipped, InferenceConfig::default());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = InferenceConfig::from_yaml_file("/nonexistent/inference.yml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/inference.yml"));
    }
}
