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

pub mod aggregation;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod field;
pub mod interpreter;
pub mod profiler;
pub mod roles;
pub mod spec_builder;

pub use aggregation::{Aggregation, AggregationSelector};
pub use classifier::{ColumnKind, FieldClassification, FieldTypeClassifier};
pub use config::{
    ClassifierConfig, DomainVocabulary, InferenceConfig, InterpreterConfig, ProfilerConfig,
};
pub use dataset::{Dataset, Record, Value};
pub use error::{
    ChartwrightError, ConfigError, ErrorReporter, PromptError, Result, ValidationError,
};
pub use field::{AnalyticType, FieldDescriptor, FieldList, SemanticType};
pub use interpreter::{ChartType, Interpretation, PromptInterpreter, ResolutionPath};
pub use profiler::{DatasetProfile, DatasetProfiler};
pub use roles::{RoleAssignment, RoleAssignmentEngine, YRole};
pub use spec_builder::{ChartSpec, ChartSpecBuilder};

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A chart spec together with the reading of the prompt that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedChart {
    pub spec: ChartSpec,
    pub interpretation: Interpretation,
    pub technical_query: String,
}
impl GeneratedChart {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Classifier, interpreter, role engine and profiler sharing one
/// configuration. Holds no mutable state.
#[derive(Debug, Clone)]
pub struct ChartPipeline {
    config: InferenceConfig,
    classifier: FieldTypeClassifier,
    interpreter: PromptInterpreter,
    roles: RoleAssignmentEngine,
    profiler: DatasetProfiler,
}
impl ChartPipeline {
    pub fn new() -> Self {
        Self::build(InferenceConfig::default())
    }
    pub fn with_config(config: InferenceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = InferenceConfig::from_yaml_file(path)?;
        Ok(Self::build(config))
    }
    fn build(config: InferenceConfig) -> Self {
        Self {
            classifier: FieldTypeClassifier::with_config(config.classifier.clone()),
            interpreter: PromptInterpreter::with_config(config.interpreter.clone()),
            roles: RoleAssignmentEngine::with_temporal_indicators(
                config.interpreter.temporal_indicators.clone(),
            ),
            profiler: DatasetProfiler::with_config(config.profiler.clone())
                .with_date_parsing(config.classifier.clone()),
            config,
        }
    }
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn classify(&self, dataset: &Dataset) -> Result<Vec<FieldClassification>> {
        Ok(self.classifier.classify_dataset(dataset)?)
    }
    /// Classified descriptors of every field in `dataset`.
    pub fn fields(&self, dataset: &Dataset) -> Result<FieldList> {
        let classifications = self.classify(dataset)?;
        Ok(FieldTypeClassifier::field_list(&classifications)?)
    }

    pub fn interpret(&self, prompt: &str, fields: &FieldList) -> Result<Interpretation> {
        Ok(self.interpreter.interpret(prompt, fields)?)
    }

    /// Roles, aggregation and spec for fields that are already resolved.
    pub fn chart_for_fields(&self, fields: &[FieldDescriptor], chart_type: ChartType) -> ChartSpec {
        let roles = self.roles.assign(fields, chart_type);
        let aggregation = AggregationSelector::for_roles(&roles, chart_type);
        ChartSpecBuilder::build(&roles, chart_type, aggregation)
    }

    pub fn generate_chart(&self, prompt: &str, fields: &FieldList) -> Result<GeneratedChart> {
        info!(prompt, fields = fields.len(), "Generating chart");
        let interpretation = self.interpret(prompt, fields)?;
        let spec = self.chart_for_fields(&interpretation.fields, interpretation.chart_type);
        info!(title = %spec.title, chart_type = %spec.chart_type, "Chart generated");
        Ok(GeneratedChart {
            technical_query: interpretation.technical_query(),
            spec,
            interpretation,
        })
    }
    /// Classifies `dataset` first, then generates the chart.
    pub fn generate_chart_for_dataset(
        &self,
        prompt: &str,
        dataset: &Dataset,
    ) -> Result<GeneratedChart> {
        let fields = self.fields(dataset)?;
        self.generate_chart(prompt, &fields)
    }

    pub fn profile(&self, dataset: &Dataset) -> Result<DatasetProfile> {
        let classifications = self.classify(dataset)?;
        Ok(self.profiler.profile(dataset, &classifications))
    }

    pub fn example_prompts(&self, fields: &FieldList) -> Vec<String> {
        self.interpreter.example_prompts(fields)
    }
    pub fn suggest_chart_types(&self, fields: &[FieldDescriptor]) -> Vec<ChartType> {
        self.interpreter.suggest_chart_types(fields)
    }
}
impl Default for ChartPipeline {
    fn default() -> Self {
        Self::new()
    }
}
