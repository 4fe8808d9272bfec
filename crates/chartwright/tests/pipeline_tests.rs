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

use chartwright::profiler::detect_outliers;
use chartwright::roles::YRoleStatus;
use chartwright::{
    Aggregation, ChartPipeline, ChartType, ChartwrightError, Dataset, FieldDescriptor,
    FieldList, FieldTypeClassifier, PromptError, RoleAssignmentEngine, SemanticType, Value,
};
use itertools::Itertools;
use proptest::prelude::*;
use std::io::Write;

fn fd(name: &str, semantic: SemanticType) -> FieldDescriptor {
    FieldDescriptor::from_id(name, semantic).unwrap()
}

fn sales_fields() -> FieldList {
    FieldList::new(vec![
        fd("Region", SemanticType::Nominal),
        fd("Sales", SemanticType::Quantitative),
        fd("Profit", SemanticType::Quantitative),
        fd("Status", SemanticType::Nominal),
        fd("OrderDate", SemanticType::Temporal),
    ])
    .unwrap()
}

#[test]
fn comma_prompt_builds_bar_chart() {
    let chart = ChartPipeline::new()
        .generate_chart("Region, Sales, bar chart", &sales_fields())
        .unwrap();
    let spec = &chart.spec;
    assert_eq!(spec.chart_type, ChartType::Bar);
    assert_eq!(spec.encodings.x.as_ref().map(FieldDescriptor::id), Some("Region"));
    assert_eq!(spec.encodings.y.as_ref().map(FieldDescriptor::id), Some("Sales"));
    assert_eq!(spec.aggregation, Some(Aggregation::Sum));
    assert_eq!(spec.title, "Region vs Sales (Bar Chart)");
    assert_eq!(chart.technical_query, "Region, Sales, bar chart");
}

#[test]
fn comparison_prompt_puts_dimension_on_x() {
    let fields = FieldList::new(vec![
        fd("Terminal", SemanticType::Nominal),
        fd("Efficiency", SemanticType::Quantitative),
        fd("Uptime", SemanticType::Quantitative),
    ])
    .unwrap();
    let chart = ChartPipeline::new()
        .generate_chart("Compare Efficiency across different Terminal", &fields)
        .unwrap();
    assert_eq!(chart.spec.chart_type, ChartType::Bar);
    assert_eq!(
        chart.spec.encodings.x.as_ref().map(FieldDescriptor::id),
        Some("Terminal")
    );
    assert_eq!(
        chart.spec.encodings.y.as_ref().map(FieldDescriptor::id),
        Some("Efficiency")
    );
}

#[test]
fn single_field_counts_records() {
    let chart = ChartPipeline::new()
        .generate_chart("Region, pie chart", &sales_fields())
        .unwrap();
    assert!(chart.spec.title.starts_with("Region Analysis"));
    assert!(chart.spec.encodings.y.is_none());
    assert_eq!(chart.spec.y_role, YRoleStatus::CountRequested);
    assert_eq!(chart.spec.aggregation, Some(Aggregation::Count));
}

#[test]
fn unknown_prompt_lists_available_fields() {
    let err = ChartPipeline::new()
        .generate_chart("weather forecast", &sales_fields())
        .unwrap_err();
    match &err {
        ChartwrightError::Prompt(PromptError::NoMatch { available }) => {
            assert_eq!(available.len(), 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_recoverable());
    assert!(err.suggestions().iter().any(|s| s.contains("Region")));
}

#[test]
fn classified_dataset_drives_chart() {
    let dataset = Dataset::from_rows(
        &["Region", "Sales", "OrderDate"],
        vec![
            vec!["North", "120", "2024-01-03"],
            vec!["South", "80", "2024-01-04"],
            vec!["North", "95.5", "2024-02-01"],
            vec!["East", "60", "2024-02-07"],
        ],
    );
    let chart = ChartPipeline::new()
        .generate_chart_for_dataset("show sales trend by orderdate", &dataset)
        .unwrap();
    assert_eq!(chart.spec.chart_type, ChartType::Line);
    assert_eq!(
        chart.spec.encodings.x.as_ref().map(FieldDescriptor::id),
        Some("OrderDate")
    );
    assert_eq!(
        chart.spec.encodings.y.as_ref().map(FieldDescriptor::id),
        Some("Sales")
    );
}

#[test]
fn missing_status_profile() {
    let rows: Vec<Vec<String>> = (0..100)
        .map(|i| {
            let status = if i % 5 == 0 {
                String::new()
            } else if i % 2 == 0 {
                "open".to_string()
            } else {
                "closed".to_string()
            };
            vec![format!("R{i}"), status]
        })
        .collect();
    let dataset = Dataset::from_rows(&["Ref", "Status"], rows);
    let profile = ChartPipeline::new().profile(&dataset).unwrap();
    assert_eq!(profile.column("Status").unwrap().completeness, 80);
    assert!(profile.issues.len() <= 3);
    assert_eq!(profile.quality_score, 90);
    assert!(profile.quality_score <= 100);
}

#[test]
fn iqr_outlier_example() {
    let flagged = detect_outliers(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 100.0], 1.5);
    assert_eq!(flagged, vec![100.0]);
}

#[test]
fn json_records_profile_with_shipment_domain() {
    let json = r#"[
        {"ExitTime": "2024-03-01", "TerminalName": "T1", "BaseProduct": "Diesel", "GrossQuantity": 1000, "FlowRate": 2.5},
        {"ExitTime": "2024-03-02", "TerminalName": "T2", "BaseProduct": "Diesel", "GrossQuantity": 1500, "FlowRate": 3.0},
        {"ExitTime": "2024-04-01", "TerminalName": "T1", "BaseProduct": "Petrol", "GrossQuantity": null, "FlowRate": 2.0}
    ]"#;
    let dataset: Dataset = serde_json::from_str(json).unwrap();
    assert_eq!(dataset.records()[2]["GrossQuantity"], Value::Empty);
    let profile = ChartPipeline::new().profile(&dataset).unwrap();
    let domain = profile.domain.as_ref().expect("shipment fields should be recognised");
    assert_eq!(domain.domain, "shipment");
    assert_eq!(domain.record_label, "3 Shipment Records");
    assert_eq!(domain.location_coverage.as_deref(), Some("2 unique locations"));
    assert!(profile.report().contains("Shipment Records"));
}

#[test]
fn suggested_prompts_parse_to_their_advertised_chart() {
    let pipeline = ChartPipeline::new();
    let terminals = Dataset::from_rows(
        &["Day", "Terminal", "Uptime", "Efficiency"],
        vec![
            vec!["2024-01-01", "North", "90", "0.7"],
            vec!["2024-01-02", "South", "85", "0.8"],
            vec!["2024-01-03", "North", "99", "0.6"],
            vec!["2024-01-04", "South", "70", "0.9"],
        ],
    );
    let shipments: Dataset = serde_json::from_str(
        r#"[
            {"ExitTime": "2024-03-01", "TerminalName": "T1", "BaseProduct": "Diesel", "GrossQuantity": 1000, "FlowRate": 2.5},
            {"ExitTime": "2024-03-02", "TerminalName": "T2", "BaseProduct": "Diesel", "GrossQuantity": 1500, "FlowRate": 3.0},
            {"ExitTime": "2024-04-01", "TerminalName": "T1", "BaseProduct": "Petrol", "GrossQuantity": 1200, "FlowRate": 2.0}
        ]"#,
    )
    .unwrap();
    for dataset in [&terminals, &shipments] {
        let profile = pipeline.profile(dataset).unwrap();
        let domain_suggestions = profile.domain.iter().flat_map(|d| d.suggestions.iter());
        let suggestions: Vec<_> = profile.suggestions.iter().chain(domain_suggestions).collect();
        assert!(suggestions.len() >= 4);
        for suggestion in suggestions {
            let chart = pipeline
                .generate_chart_for_dataset(&suggestion.prompt, dataset)
                .unwrap();
            assert_eq!(chart.spec.chart_type, suggestion.chart_type, "{}", suggestion.prompt);
        }
    }
}

#[test]
fn pipeline_loads_yaml_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "interpreter:\n  default_chart_type: line").unwrap();
    let pipeline = ChartPipeline::from_config_file(file.path()).unwrap();
    let fields = sales_fields();
    let chart = pipeline.generate_chart("Region, Sales", &fields).unwrap();
    assert_eq!(chart.spec.chart_type, ChartType::Line);
}

#[test]
fn spec_serialises_for_hosts() {
    let chart = ChartPipeline::new()
        .generate_chart("Sales, Profit, scatter plot", &sales_fields())
        .unwrap();
    let json = serde_json::to_value(&chart.spec).unwrap();
    assert_eq!(json["chart_type"], "scatter");
    assert_eq!(json["y_role"], "assigned");
    assert_eq!(json["shelves"]["measures"][1]["dragId"], "Profit");
}

fn field_pool() -> Vec<FieldDescriptor> {
    sales_fields().as_slice().to_vec()
}

proptest! {
    #[test]
    fn comma_prompts_resolve_in_first_occurrence_order(
        picks in prop::collection::vec(0usize..5, 2..8)
    ) {
        let pool = field_pool();
        let prompt = picks.iter().map(|i| pool[*i].display_name()).join(", ");
        let interpretation = ChartPipeline::new()
            .interpret(&prompt, &sales_fields())
            .unwrap();
        let expected: Vec<&str> = picks.iter().map(|i| pool[*i].id()).unique().collect();
        let got: Vec<&str> = interpretation.fields.iter().map(FieldDescriptor::id).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn classification_is_deterministic(
        cells in prop::collection::vec("[a-c0-9/\\-]{0,10}", 0..60)
    ) {
        let values: Vec<Value> = cells.iter().map(|c| Value::from(c.as_str())).collect();
        let classifier = FieldTypeClassifier::new();
        let first = classifier.classify_values("Field", values.iter()).unwrap();
        let second = classifier.classify_values("Field", values.iter()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn x_and_y_never_share_a_field(
        picks in prop::collection::btree_set(0usize..5, 2..=5),
        chart in prop::sample::select(vec![ChartType::Bar, ChartType::Line, ChartType::Scatter, ChartType::Pie])
    ) {
        let pool = field_pool();
        let fields: Vec<FieldDescriptor> = picks.iter().map(|i| pool[*i].clone()).collect();
        let roles = RoleAssignmentEngine::new().assign(&fields, chart);
        let x = roles.x.as_ref().map(FieldDescriptor::id);
        let y = roles.y.field().map(FieldDescriptor::id);
        prop_assert!(x.is_some() && y.is_some());
        prop_assert_ne!(x, y);
    }

    #[test]
    fn quality_score_stays_in_range(
        rows in prop::collection::vec(prop::collection::vec("[a-z0-9]{0,3}", 3), 0..40)
    ) {
        let dataset = Dataset::from_rows(&["A", "B", "C"], rows);
        let profile = ChartPipeline::new().profile(&dataset).unwrap();
        prop_assert!(profile.quality_score <= 100);
        prop_assert!(profile.issues.len() <= 3);
    }
}
