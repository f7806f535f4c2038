//! Filtered Extraction Example
//!
//! Splits a table into one Markdown file per key, using a JSON mapping of
//! output key to the value expected in the primary column.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example filter_by_keys -- staff.xlsx Department mapping.json out/
//! ```
//!
//! `mapping.json` looks like `{"engineering": "Engineering", "sales": "Sales"}`.

use std::fs::File;
use std::path::PathBuf;
use xlsxtable::{write_filter_outputs, ExtractorBuilder, KeyValueMapping};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        eprintln!("Usage: filter_by_keys <input.xlsx> <primary_column> <mapping.json> [output_dir]");
        std::process::exit(2);
    }
    let input_path = &args[0];
    let primary_column = &args[1];
    let mapping = KeyValueMapping::from_json_reader(File::open(&args[2])?)?;
    let output_dir = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("filtered"));

    let extractor = ExtractorBuilder::new().build()?;
    let outcome = extractor.filter_by_keys(File::open(input_path)?, primary_column, &mapping)?;

    for key in &outcome.keys {
        if let Err(e) = &key.result {
            eprintln!("  {}: {}", key.key, e);
        }
    }

    let summary = write_filter_outputs(&output_dir, &outcome)?;
    for path in &summary.written {
        println!("Saved {}", path.display());
    }
    for (label, e) in &summary.failed {
        eprintln!("Failed to write '{}': {}", label, e);
    }
    println!(
        "{}/{} filter(s) matched at least one row",
        outcome.succeeded(),
        outcome.total()
    );

    Ok(())
}
