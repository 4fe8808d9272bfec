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

//! Free-text prompt interpretation.
//!
//! A prompt containing commas takes the fast path: each segment is a field
//! token or chart vocabulary. Anything else, or a comma prompt that named no
//! field, is scanned for synonym phrases and literal field names.

pub mod chart_type;
pub mod matching;

pub use chart_type::{ChartType, ChartTypeSource, Geom, KeywordRule};
pub use matching::{normalize_name, MatchRule};

use crate::config::InterpreterConfig;
use crate::error::{PromptError, PromptResult};
use crate::field::{FieldDescriptor, FieldList};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    FastPath,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Distinct fields in first-mention order.
    pub fields: Vec<FieldDescriptor>,
    pub chart_type: ChartType,
    pub chart_type_source: ChartTypeSource,
    pub comparison: bool,
    /// Synonym concepts the prompt mentioned that no field carries.
    pub unresolved: Vec<String>,
    pub path: ResolutionPath,
}
impl Interpretation {
    /// Canonical comma form, e.g. `Region, Sales, bar chart`.
    pub fn technical_query(&self) -> String {
        self.fields
            .iter()
            .map(FieldDescriptor::display_name)
            .chain(std::iter::once(self.chart_type.query_suffix()))
            .join(", ")
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromptInterpreter {
    config: InterpreterConfig,
}
impl PromptInterpreter {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_config(config: InterpreterConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn interpret(&self, prompt: &str, fields: &FieldList) -> PromptResult<Interpretation> {
        let normalized = prompt.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(PromptError::EmptyPrompt);
        }
        if fields.is_empty() {
            return Err(PromptError::NoFieldsAvailable);
        }
        info!(prompt = %normalized, available = fields.len(), "Interpreting prompt");

        // A comma segment naming the chart type outranks keywords inside field names.
        let chart_segments = normalized
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && self.is_chart_segment(s))
            .join(" ");
        let chart_text = if chart_segments.is_empty() {
            normalized.as_str()
        } else {
            chart_segments.as_str()
        };
        let (chart_type, chart_type_source) = chart_type::detect_chart_type(
            chart_text,
            &self.config.chart_keywords,
            &self.config.intent_keywords,
            self.config.default_chart_type,
        );

        let mut unresolved = Vec::new();
        let mut path = ResolutionPath::FastPath;
        let mut resolved = if normalized.contains(',') {
            self.resolve_segments(&normalized, fields)
        } else {
            Vec::new()
        };
        if resolved.is_empty() {
            path = ResolutionPath::Fallback;
            resolved = self.scan_prompt(&normalized, fields, &mut unresolved);
        }

        let mut resolved: Vec<FieldDescriptor> = resolved
            .into_iter()
            .unique_by(|f| f.id().to_string())
            .cloned()
            .collect();
        let comparison = self
            .config
            .comparison_markers
            .iter()
            .any(|m| !m.is_empty() && normalized.contains(m.as_str()));
        if comparison && resolved.len() > self.config.max_compared_fields {
            debug!(
                kept = self.config.max_compared_fields,
                dropped = resolved.len() - self.config.max_compared_fields,
                "Comparison prompt, truncating fields"
            );
            resolved.truncate(self.config.max_compared_fields);
        }

        if resolved.is_empty() {
            warn!(prompt = %normalized, "No field matched prompt");
            return Err(PromptError::NoMatch {
                available: fields.display_names(),
            });
        }
        debug!(
            fields = ?resolved.iter().map(FieldDescriptor::id).collect::<Vec<_>>(),
            chart_type = %chart_type,
            path = ?path,
            "Prompt interpreted"
        );
        Ok(Interpretation {
            fields: resolved,
            chart_type,
            chart_type_source,
            comparison,
            unresolved,
            path,
        })
    }

    /// Succeeds when `prompt` would resolve at least one field.
    pub fn validate(&self, prompt: &str, fields: &FieldList) -> PromptResult<()> {
        self.interpret(prompt, fields).map(|_| ())
    }

    fn is_chart_segment(&self, segment: &str) -> bool {
        segment
            .split_whitespace()
            .all(|word| self.config.chart_vocabulary.iter().any(|v| v == word))
    }

    fn resolve_segments<'a>(&self, normalized: &str, fields: &'a FieldList) -> Vec<&'a FieldDescriptor> {
        normalized
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty() && !self.is_chart_segment(segment))
            .filter_map(|segment| {
                let found = matching::resolve_token(segment, fields);
                match &found {
                    Some(m) => debug!(segment, field = m.field.id(), rule = ?m.rule, "Segment resolved"),
                    None => debug!(segment, "Segment matched no field"),
                }
                found.map(|m| m.field)
            })
            .collect()
    }

    fn scan_prompt<'a>(
        &self,
        normalized: &str,
        fields: &'a FieldList,
        unresolved: &mut Vec<String>,
    ) -> Vec<&'a FieldDescriptor> {
        let mut found = Vec::new();
        for entry in &self.config.synonyms {
            let phrase = entry.phrase.to_lowercase();
            if phrase.is_empty() || !normalized.contains(phrase.as_str()) {
                continue;
            }
            match matching::resolve_canonical(&entry.canonical, fields) {
                Some(field) => {
                    debug!(phrase = %phrase, field = field.id(), "Synonym resolved");
                    found.push(field);
                }
                None => {
                    if !unresolved.contains(&entry.canonical) {
                        warn!(
                            phrase = %phrase,
                            canonical = %entry.canonical,
                            "Synonym names a field the dataset does not have"
                        );
                        unresolved.push(entry.canonical.clone());
                    }
                }
            }
        }
        for field in fields {
            let name = field.display_name().to_lowercase();
            let id = field.id().to_lowercase();
            if normalized.contains(name.as_str()) || normalized.contains(id.as_str()) {
                found.push(field);
            }
        }
        found
    }

    /// Ready-to-run prompts built from the available fields.
    pub fn example_prompts(&self, fields: &FieldList) -> Vec<String> {
        let dimensions: Vec<&FieldDescriptor> = fields.dimensions().collect();
        let measures: Vec<&FieldDescriptor> = fields.measures().collect();
        let mut examples = Vec::new();
        if let (Some(d), Some(m)) = (dimensions.first(), measures.first()) {
            examples.push(format!("{}, {}, bar chart", d.display_name(), m.display_name()));
        }
        if let [first, second, ..] = dimensions.as_slice() {
            examples.push(format!(
                "{}, {}, pie chart",
                first.display_name(),
                second.display_name()
            ));
        }
        if let [first, second, ..] = measures.as_slice() {
            examples.push(format!(
                "{}, {}, scatter plot",
                first.display_name(),
                second.display_name()
            ));
        }
        let time = fields.iter().find(|f| f.is_temporal()).or_else(|| {
            fields
                .iter()
                .find(|f| f.looks_temporal(&self.config.temporal_indicators))
        });
        if let (Some(t), Some(m)) = (time, measures.first()) {
            examples.push(format!("{}, {}, line chart", t.display_name(), m.display_name()));
        }
        examples.truncate(self.config.max_example_prompts);
        examples
    }

    pub fn suggest_chart_types(&self, fields: &[FieldDescriptor]) -> Vec<ChartType> {
        chart_type::suggest_chart_types(fields, &self.config.temporal_indicators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::SemanticType;

    fn fields(spec: &[(&str, SemanticType)]) -> FieldList {
        FieldList::new(
            spec.iter()
                .map(|(n, t)| FieldDescriptor::from_id(*n, *t).unwrap())
                .collect(),
        )
        .unwrap()
    }

    fn sales_fields() -> FieldList {
        fields(&[
            ("Region", SemanticType::Nominal),
            ("Sales", SemanticType::Quantitative),
            ("Month", SemanticType::Temporal),
        ])
    }

    fn ids(i: &Interpretation) -> Vec<&str> {
        i.fields.iter().map(FieldDescriptor::id).collect()
    }

    #[test]
    fn blank_prompt_and_empty_fields_fail() {
        let interpreter = PromptInterpreter::new();
        assert_eq!(
            interpreter.interpret("   ", &sales_fields()),
            Err(PromptError::EmptyPrompt)
        );
        assert_eq!(
            interpreter.interpret("sales", &FieldList::empty()),
            Err(PromptError::NoFieldsAvailable)
        );
    }

    #[test]
    fn comma_fast_path_skips_chart_segments() {
        let i = PromptInterpreter::new()
            .interpret("Region, Sales, bar chart", &sales_fields())
            .unwrap();
        assert_eq!(ids(&i), vec!["Region", "Sales"]);
        assert_eq!(i.chart_type, ChartType::Bar);
        assert_eq!(i.path, ResolutionPath::FastPath);
        assert_eq!(i.technical_query(), "Region, Sales, bar chart");
    }

    #[test]
    fn chart_segment_outranks_keywords_in_field_names() {
        let list = fields(&[
            ("Uptime", SemanticType::Quantitative),
            ("Efficiency", SemanticType::Quantitative),
        ]);
        let i = PromptInterpreter::new()
            .interpret("Uptime, Efficiency, scatter plot", &list)
            .unwrap();
        assert_eq!(i.chart_type, ChartType::Scatter);
        assert_eq!(i.chart_type_source, ChartTypeSource::Explicit);
        assert_eq!(ids(&i), vec!["Uptime", "Efficiency"]);
    }

    #[test]
    fn fast_path_dedupes_in_first_occurrence_order() {
        let i = PromptInterpreter::new()
            .interpret("sales, region, Sales, , scatter plot", &sales_fields())
            .unwrap();
        assert_eq!(ids(&i), vec!["Sales", "Region"]);
        assert_eq!(i.chart_type, ChartType::Scatter);
    }

    #[test]
    fn fallback_uses_synonyms_then_literal_names() {
        let list = fields(&[
            ("Efficiency", SemanticType::Quantitative),
            ("Terminal", SemanticType::Nominal),
        ]);
        let i = PromptInterpreter::new()
            .interpret("Compare Efficiency across different Terminal", &list)
            .unwrap();
        assert_eq!(i.path, ResolutionPath::Fallback);
        assert_eq!(ids(&i), vec!["Terminal", "Efficiency"]);
        assert_eq!(i.chart_type, ChartType::Bar);
        assert_eq!(i.chart_type_source, ChartTypeSource::Intent);
        assert!(i.comparison);
    }

    #[test]
    fn unresolved_synonyms_are_reported_not_emitted() {
        let i = PromptInterpreter::new()
            .interpret("show profit by region", &sales_fields())
            .unwrap();
        assert_eq!(ids(&i), vec!["Region"]);
        assert_eq!(i.unresolved, vec!["Profit".to_string()]);
    }

    #[test]
    fn comparison_truncates_to_two_fields() {
        let i = PromptInterpreter::new()
            .interpret("compare month and sales and region", &sales_fields())
            .unwrap();
        assert_eq!(ids(&i), vec!["Sales", "Region"]);

        let i = PromptInterpreter::new()
            .interpret("month and sales and region", &sales_fields())
            .unwrap();
        assert_eq!(i.fields.len(), 3);
    }

    #[test]
    fn no_match_carries_available_names() {
        let err = PromptInterpreter::new()
            .interpret("weather forecast", &sales_fields())
            .unwrap_err();
        assert_eq!(
            err,
            PromptError::NoMatch {
                available: vec!["Region".into(), "Sales".into(), "Month".into()]
            }
        );
    }

    #[test]
    fn comma_prompt_without_fields_falls_back() {
        let i = PromptInterpreter::new()
            .interpret("total sales, please", &sales_fields())
            .unwrap();
        assert_eq!(ids(&i), vec!["Sales"]);
        assert_eq!(i.path, ResolutionPath::FastPath);

        let list = fields(&[
            ("Terminal", SemanticType::Nominal),
            ("Efficiency", SemanticType::Quantitative),
        ]);
        let interpreter = PromptInterpreter::with_config(
            InterpreterConfig::default().with_synonym("site", "Terminal"),
        );
        let i = interpreter.interpret("per site, thanks", &list).unwrap();
        assert_eq!(ids(&i), vec!["Terminal"]);
        assert_eq!(i.path, ResolutionPath::Fallback);
    }

    #[test]
    fn example_prompts_are_capped_at_three() {
        let list = fields(&[
            ("Region", SemanticType::Nominal),
            ("Status", SemanticType::Nominal),
            ("Sales", SemanticType::Quantitative),
            ("Profit", SemanticType::Quantitative),
            ("OrderDate", SemanticType::Temporal),
        ]);
        let interpreter = PromptInterpreter::new();
        let examples = interpreter.example_prompts(&list);
        assert_eq!(
            examples,
            vec![
                "Region, Sales, bar chart",
                "Region, Status, pie chart",
                "Sales, Profit, scatter plot",
            ]
        );
        for example in &examples {
            assert!(interpreter.interpret(example, &list).is_ok());
        }
    }
}
