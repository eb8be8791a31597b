//! quadnet runner - one forward pass over a batch file.
//!
//! ```text
//! quadnet <config.json> <batch.json> <mm|explore>
//! ```
//!
//! The batch file carries the vocabulary along with the samples:
//! `{"entities": [...], "relations": [...], "batch": [[quadruple, ...], ...]}`.

use std::env;
use std::fs;
use std::process;

use candle_core::Tensor;
use quadnet::{greedy, ExploreAction, GraphQNetwork, MemoryAction, ModelConfig, PolicyType, Quadruple, Result};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct BatchFile {
    entities: Vec<String>,
    relations: Vec<String>,
    batch: Vec<Vec<Quadruple>>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} <config.json> <batch.json> <mm|explore>", args[0]);
        process::exit(2);
    }

    if let Err(e) = run(&args[1], &args[2], &args[3]) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(config_path: &str, batch_path: &str, policy: &str) -> Result<()> {
    let policy: PolicyType = policy.parse()?;
    let config = ModelConfig::from_file(config_path)?;
    let input: BatchFile = serde_json::from_str(&fs::read_to_string(batch_path)?)?;

    let mut model = GraphQNetwork::new(input.entities, input.relations, config)?;
    model.eval();
    info!(samples = input.batch.len(), %policy, "running forward pass");

    let q_values = model.forward(&input.batch, policy)?;
    for (i, q) in q_values.iter().enumerate() {
        print_sample(i, q, policy)?;
    }
    Ok(())
}

fn print_sample(index: usize, q: &Tensor, policy: PolicyType) -> Result<()> {
    let rows = q.to_vec2::<f32>()?;
    let actions: Vec<String> = match policy {
        PolicyType::MemoryManagement => greedy::<MemoryAction>(q)?.iter().map(|a| a.to_string()).collect(),
        PolicyType::Explore => greedy::<ExploreAction>(q)?.iter().map(|a| a.to_string()).collect(),
    };

    println!("sample {}:", index);
    if rows.is_empty() {
        println!("  (no short-term memories)");
    }
    for (row, action) in rows.iter().zip(&actions) {
        let values: Vec<String> = row.iter().map(|v| format!("{:+.4}", v)).collect();
        println!("  [{}] -> {}", values.join(", "), action);
    }
    Ok(())
}
