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

mod loader;

use anyhow::Result;
use chartwright::{ChartPipeline, ErrorReporter};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "chartwright-demo")]
#[command(about = "Turn a prompt and a CSV/JSON dataset into a chart spec, or profile the dataset.")]
struct Cli {
    /// CSV (header row first) or JSON array of records.
    #[arg(long)]
    data: PathBuf,
    /// e.g. "Region, Sales, bar chart" or "compare sales across regions".
    #[arg(long)]
    prompt: Option<String>,
    /// YAML inference settings; built-in defaults otherwise.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    profile: bool,
    /// Print ready-made prompts for the dataset.
    #[arg(long, default_value_t = false)]
    examples: bool,
    #[arg(long, default_value_t = false)]
    json: bool,
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let pipeline = match &args.config {
        Some(path) => ChartPipeline::from_config_file(path)?,
        None => ChartPipeline::new(),
    };
    let dataset = loader::load_dataset(&args.data)?;
    info!(rows = dataset.len(), "Starting chartwright demo");

    if args.examples {
        let fields = pipeline.fields(&dataset)?;
        for prompt in pipeline.example_prompts(&fields) {
            println!("{prompt}");
        }
    }

    if let Some(prompt) = &args.prompt {
        match pipeline.generate_chart_for_dataset(prompt, &dataset) {
            Ok(chart) if args.json => println!("{}", chart.to_json()?),
            Ok(chart) => {
                println!("{}", chart.spec);
                println!("Query: {}", chart.technical_query);
                if !chart.interpretation.unresolved.is_empty() {
                    warn!(
                        unresolved = ?chart.interpretation.unresolved,
                        "Some requested fields are not in the dataset"
                    );
                }
            }
            Err(e) => {
                eprintln!("{}", ErrorReporter::new().report(&e));
                std::process::exit(1);
            }
        }
    }

    if args.profile || (args.prompt.is_none() && !args.examples) {
        let profile = pipeline.profile(&dataset)?;
        if args.json {
            println!("{}", profile.to_json()?);
        } else {
            print!("{}", profile.report());
        }
    }
    Ok(())
}
