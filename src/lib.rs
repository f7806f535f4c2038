//! xlsxtable - Locate, extract and filter data tables embedded in spreadsheets
//!
//! This crate finds the tabular block inside a worksheet (skipping titles,
//! notes and blank rows above it), resolves the requested columns by header
//! name, and renders the rows as Markdown tables. It can also split a table
//! into one document per key value, dump every sheet with cell references,
//! inspect workbook structure, and author new workbooks.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxtable::ExtractorBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Detect the header row automatically and keep two columns
//!     let extractor = ExtractorBuilder::new()
//!         .with_sheet("Staff")
//!         .with_columns(["Name", "Department"])
//!         .build()?;
//!
//!     let markdown = extractor.extract_to_markdown(File::open("report.xlsx")?)?;
//!     println!("{}", markdown);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Filtered Extraction
//!
//! ```rust,no_run
//! use std::fs::File;
//! use std::path::Path;
//! use xlsxtable::{write_filter_outputs, ExtractorBuilder, KeyValueMapping};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = ExtractorBuilder::new().with_start_cell("B6").build()?;
//!     let mapping = KeyValueMapping::from_json_str(r#"{"sales": "Sales", "ops": "Operations"}"#)?;
//!
//!     let outcome = extractor.filter_by_keys(File::open("staff.xlsx")?, "Department", &mapping)?;
//!     let summary = write_filter_outputs(Path::new("out"), &outcome)?;
//!     println!("{} file(s) written", summary.written.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # In-memory Grids
//!
//! Extraction works on any [`CellGrid`], so tables can be processed without a file:
//!
//! ```rust
//! use xlsxtable::{CellValue, ExtractorBuilder, SheetGrid};
//!
//! # fn main() -> Result<(), xlsxtable::XlsxTableError> {
//! let grid = SheetGrid::from_rows(
//!     "Sheet1",
//!     vec![
//!         vec!["Quarterly report".into()],
//!         vec![],
//!         vec!["Name".into(), "Score".into()],
//!         vec!["Alice".into(), CellValue::Number(91.0)],
//!     ],
//! );
//!
//! let extractor = ExtractorBuilder::new().build()?;
//! let extraction = extractor.extract_from_grid(&grid)?;
//! assert_eq!(extraction.start.to_string(), "A3");
//! assert_eq!(
//!     extractor.render(&extraction),
//!     "| Name | Score |\n| --- | --- |\n| Alice | 91 |"
//! );
//! # Ok(())
//! # }
//! ```

mod api;
mod authoring;
mod builder;
mod error;
mod formatter;
mod grid;
mod output;
mod parser;
mod security;
mod table;
mod types;

// 公開API
pub use api::{DateFormat, SheetSelector, TableLayout};
pub use authoring::{
    pivot_summary, rows_from_json, Aggregation, BorderStyle, CellStyle, ChartKind, ChartTitles,
    PivotSpec, TableTheme, WorkbookEditor,
};
pub use builder::{Extractor, ExtractorBuilder, TableExtraction};
pub use error::XlsxTableError;
pub use grid::{CellGrid, SheetGrid};
pub use output::{
    escape_cell, safe_file_stem, write_document, write_filter_outputs, write_sheet_dumps,
    FilterOutcome, KeyOutcome, MarkdownRenderer, SheetDump, WriteSummary, EMPTY_SHEET_MARKER,
    NO_DATA_MARKER,
};
pub use parser::{RangeData, SheetSummary, WorkbookSource, WorkbookSummary, PREVIEW_ROWS};
pub use table::{
    extract_filtered, extract_headers, extract_table, locate_header, resolve_columns,
    ColumnSelection, ExtractedTable, FilterCriterion, HeaderRow, KeyValueMapping, KeyedTable,
    ResolvedColumn,
};
pub use types::{column_index, column_letters, CellAddress, CellRange, CellValue};
