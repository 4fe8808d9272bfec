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

use serde::{Deserialize, Serialize};
use thiserror::Error;
#[derive(Error, Debug)]
pub enum ChartwrightError {
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] SerialisationError),
}
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("No data fields available")]
    NoFieldsAvailable,
    #[error("No matching field names found. Available fields: {}", .available.join(", "))]
    NoMatch { available: Vec<String> },
}
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field id must not be blank")]
    BlankFieldId,
    #[error("Field id '{id}' appears more than once")]
    DuplicateFieldId { id: String },
    #[error("Field '{id}' is a measure but its semantic type is {semantic}")]
    MeasureNotQuantitative { id: String, semantic: String },
    #[error("Field '{id}' not found")]
    UnknownField { id: String },
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {field} = {value} is out of range")]
    OutOfRange { field: String, value: String },
    #[error("Configuration table '{table}' must not be empty")]
    EmptyTable { table: String },
    #[error("Vocabulary '{name}' has no indicators")]
    EmptyVocabulary { name: String },
}
#[derive(Error, Debug)]
pub enum SerialisationError {
    #[error("JSON serialisation failed: {source}")]
    JsonSerialisationError {
        #[from]
        source: serde_json::Error,
    },
}
pub type Result<T> = std::result::Result<T, ChartwrightError>;
pub type PromptResult<T> = std::result::Result<T, PromptError>;
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
impl From<serde_json::Error> for ChartwrightError {
    fn from(err: serde_json::Error) -> Self {
        ChartwrightError::Serialisation(SerialisationError::JsonSerialisationError { source: err })
    }
}
impl ChartwrightError {
    /// Prompt and validation failures are the caller's to fix; nothing here
    /// takes the host process down.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChartwrightError::Prompt(_) | ChartwrightError::Validation(_)
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            ChartwrightError::Prompt(_) => "Prompt",
            ChartwrightError::Validation(_) => "Validation",
            ChartwrightError::Config(_) => "Configuration",
            ChartwrightError::Io(_) => "I/O",
            ChartwrightError::Serialisation(_) => "Serialisation",
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            ChartwrightError::Prompt(PromptError::EmptyPrompt) => vec![
                "Describe what you want to visualise, e.g. \"Compare sales across regions\""
                    .to_string(),
                "Or list fields directly: \"Region, Sales, bar chart\"".to_string(),
            ],
            ChartwrightError::Prompt(PromptError::NoFieldsAvailable) => vec![
                "Load a dataset with at least one column".to_string(),
                "Check that field descriptors were supplied or classified".to_string(),
            ],
            ChartwrightError::Prompt(PromptError::NoMatch { available }) => {
                let mut suggestions = vec![
                    "Mention at least one field name from the dataset".to_string(),
                    "Separate fields with commas for exact matching".to_string(),
                ];
                if !available.is_empty() {
                    suggestions.push(format!("Available fields: {}", available.join(", ")));
                }
                suggestions
            }
            ChartwrightError::Validation(ValidationError::DuplicateFieldId { .. }) => vec![
                "Give every column a unique identifier".to_string(),
            ],
            ChartwrightError::Config(_) => vec![
                "Check the configuration file path and YAML syntax".to_string(),
                "Thresholds must lie between 0.0 and 1.0".to_string(),
            ],
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            ChartwrightError::Prompt(PromptError::EmptyPrompt) => {
                "Please enter what you want to visualise.".to_string()
            }
            ChartwrightError::Prompt(PromptError::NoFieldsAvailable) => {
                "The dataset has no fields to chart. Please load data first.".to_string()
            }
            ChartwrightError::Prompt(PromptError::NoMatch { .. }) => {
                "No valid fields found in your request.".to_string()
            }
            _ => self.to_string(),
        }
    }
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ChartwrightError::Prompt(PromptError::EmptyPrompt) => ErrorSeverity::Info,
            ChartwrightError::Prompt(_) => ErrorSeverity::Warning,
            ChartwrightError::Validation(_) | ChartwrightError::Io(_) => ErrorSeverity::Error,
            ChartwrightError::Config(_) | ChartwrightError::Serialisation(_) => {
                ErrorSeverity::Critical
            }
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}
impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
    pub fn color_code(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "\x1b[36m",
            ErrorSeverity::Warning => "\x1b[33m",
            ErrorSeverity::Error => "\x1b[31m",
            ErrorSeverity::Critical => "\x1b[35m",
        }
    }
}
/// Structured failure handed back to hosts instead of a bare error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub category: String,
    pub severity: ErrorSeverity,
    pub message: String,
    pub detail: String,
    pub suggestions: Vec<String>,
}
impl From<&ChartwrightError> for FailureReport {
    fn from(error: &ChartwrightError) -> Self {
        Self {
            category: error.category().to_string(),
            severity: error.severity(),
            message: error.user_message(),
            detail: error.to_string(),
            suggestions: error.suggestions(),
        }
    }
}
pub struct ErrorReporter {
    pub show_suggestions: bool,
    pub colored_output: bool,
}
impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            show_suggestions: true,
            colored_output: true,
        }
    }
    pub fn plain() -> Self {
        Self {
            show_suggestions: true,
            colored_output: false,
        }
    }
    pub fn report(&self, error: &ChartwrightError) -> String {
        let severity = error.severity();
        let mut output = String::new();
        if self.colored_output {
            output.push_str(severity.color_code());
        }
        output.push_str(&format!("[{}] {}\n", severity.as_str(), error.user_message()));
        if self.colored_output {
            output.push_str("\x1b[0m");
        }
        if self.show_suggestions {
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                output.push_str("\nSuggestions:\n");
                for suggestion in suggestions {
                    output.push_str(&format!("  • {suggestion}\n"));
                }
            }
        }
        output
    }
}
impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
