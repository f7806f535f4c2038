//! Workbook Authoring Example
//!
//! Builds a small sales workbook with a formatted table, a total formula,
//! a chart and a pivot summary, then reads it back as Markdown.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example build_report -- report.xlsx
//! ```

use std::fs::File;
use xlsxtable::{
    rows_from_json, Aggregation, BorderStyle, CellAddress, CellRange, CellStyle, ChartKind,
    ChartTitles, ExtractorBuilder, PivotSpec, TableTheme, WorkbookEditor,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "report.xlsx".to_string());

    let mut editor = WorkbookEditor::new();
    editor.create_sheet("Sales")?;
    editor.delete_sheet("Sheet1")?;

    editor.write_range(
        "Sales",
        CellAddress::new(1, 1),
        vec![vec!["Monthly sales (generated)".into()]],
    )?;
    let rows = rows_from_json(
        r#"[
            ["Month", "Region", "Revenue"],
            ["Jan", "East", 1200],
            ["Jan", "West", 950],
            ["Feb", "East", 1320],
            ["Feb", "West", 1010],
            ["Mar", "East", 1405],
            ["Mar", "West", 1100]
        ]"#,
    )?;
    editor.write_range("Sales", CellAddress::new(3, 1), rows)?;
    editor.apply_formula("Sales", CellAddress::new(10, 3), "SUM(C4:C9)")?;

    let header_style = CellStyle {
        bold: true,
        font_color: Some("FFFFFF".to_string()),
        bg_color: Some("305496".to_string()),
        border: Some(BorderStyle::Thin),
        ..Default::default()
    };
    editor.format_range("Sales", CellRange::parse("A3:C3")?, &header_style)?;

    let table = editor.add_table(
        "Sales",
        CellRange::parse("A3:C9")?,
        Some("SalesByMonth"),
        "Medium2".parse::<TableTheme>()?,
    )?;
    println!("Added table {}", table);

    editor.add_chart(
        "Sales",
        CellRange::parse("C3:C9")?,
        ChartKind::Column,
        CellAddress::new(3, 6),
        ChartTitles {
            title: Some("Revenue".to_string()),
            x_axis: Some("Entry".to_string()),
            y_axis: Some("JPY (thousands)".to_string()),
        },
    )?;

    let spec = PivotSpec::new(["Region"], ["Revenue"])
        .with_columns("Month")
        .with_aggregation(Aggregation::Sum);
    let pivot_sheet = editor.add_pivot_summary("Sales", CellRange::parse("A3:C9")?, &spec)?;
    println!("Pivot summary written to sheet '{}'", pivot_sheet);

    editor.save(&output_path)?;
    println!("Saved {}", output_path);

    // 書き出したファイルを抽出側で読み直す
    let extractor = ExtractorBuilder::new()
        .with_sheet(pivot_sheet)
        .build()?;
    println!("{}", extractor.extract_to_markdown(File::open(&output_path)?)?);

    Ok(())
}
