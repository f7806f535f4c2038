//! Table Extraction Example
//!
//! Locates the data table in a sheet (skipping titles and notes above it)
//! and prints it as Markdown.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example extract_table -- input.xlsx [sheet] [start_cell] [columns]
//! ```
//!
//! `columns` is a comma-separated list such as `Name,Department`. Pass `-`
//! to skip an optional argument, e.g. `input.xlsx Staff - Name,Age`.

use std::fs::File;
use xlsxtable::{ExtractorBuilder, TableLayout};

fn optional(arg: Option<String>) -> Option<String> {
    arg.filter(|a| a != "-")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let input_path = args
        .next()
        .ok_or("Usage: extract_table <input.xlsx> [sheet] [start_cell] [columns]")?;
    let sheet = optional(args.next());
    let start_cell = optional(args.next());
    let columns = optional(args.next());

    let mut builder = ExtractorBuilder::new()
        .fallback_to_first_sheet(true)
        .with_table_layout(TableLayout::Aligned)
        .include_metadata(true);
    if let Some(sheet) = sheet {
        builder = builder.with_sheet(sheet);
    }
    if let Some(start_cell) = start_cell {
        builder = builder.with_start_cell(start_cell);
    }
    if let Some(columns) = columns {
        builder = builder.with_columns(columns.split(',').map(str::trim));
    }
    let extractor = builder.build()?;

    let input = File::open(&input_path).map_err(|e| {
        eprintln!("Error: Could not open input file '{}'", input_path);
        e
    })?;

    let extraction = extractor.extract(input)?;
    eprintln!(
        "Found {} row(s) in '{}' starting at {}",
        extraction.table.len(),
        extraction.sheet,
        extraction.start
    );
    println!("{}", extractor.render(&extraction));

    Ok(())
}
