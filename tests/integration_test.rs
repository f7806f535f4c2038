//! Integration Tests for xlsxtable
//!
//! Each test builds a workbook in memory with rust_xlsxwriter and runs it
//! through the public API: header detection, column selection, filtered
//! extraction, bulk conversion and workbook inspection.

use rust_xlsxwriter::*;
use std::io::Cursor;
use xlsxtable::{
    write_filter_outputs, write_sheet_dumps, DateFormat, ExtractorBuilder, KeyValueMapping,
    SheetSelector, TableLayout, WorkbookSource, XlsxTableError, EMPTY_SHEET_MARKER,
    NO_DATA_MARKER,
};

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    /// Report sheet with scattered titles above the table
    ///
    /// Row 1 title, rows 2-3 notes, rows 4-5 blank, header on row 6,
    /// three data rows, a blank row 10 and a trailing footnote.
    pub fn generate_report() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Report")?;

        worksheet.write_string(0, 0, "Report")?;
        worksheet.write_string(1, 2, "Generated 2024-04-01")?;
        worksheet.write_string(2, 0, "Q1")?;
        worksheet.write_string(2, 2, "Q2")?;

        worksheet.write_string(5, 0, "Name")?;
        worksheet.write_string(5, 1, "Age")?;
        worksheet.write_string(5, 2, "Job")?;

        let people = [
            ("Alice", 30.0, "Engineer"),
            ("Bob", 41.0, "Designer"),
            ("Carol", 25.0, "Analyst"),
        ];
        for (i, (name, age, job)) in people.iter().enumerate() {
            let row = 6 + i as u32;
            worksheet.write_string(row, 0, *name)?;
            worksheet.write_number(row, 1, *age)?;
            worksheet.write_string(row, 2, *job)?;
        }

        worksheet.write_string(10, 0, "Footnote: ages as of April")?;

        Ok(workbook.save_to_buffer()?)
    }

    /// Staff sheet with the header at B6 and ten rows of departments
    pub fn generate_staff() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Staff")?;

        worksheet.write_string(0, 0, "Staff list")?;
        worksheet.write_string(5, 1, "Name")?;
        worksheet.write_string(5, 2, "Department")?;
        worksheet.write_string(5, 3, "Location")?;

        let staff = [
            ("Ann", "Engineering", "Tokyo"),
            ("Ben", "Marketing", "Osaka"),
            ("Cid", "ENGINEERING", "Tokyo"),
            ("Dee", "Support", "Nagoya"),
            ("Eve", "Marketing", "Tokyo"),
            ("Fay", " engineering ", "Osaka"),
            ("Gus", "Support", "Tokyo"),
            ("Hal", "Finance", "Osaka"),
            ("Ivy", "Finance", "Nagoya"),
            ("Jon", "Marketing", "Tokyo"),
        ];
        for (i, (name, dept, location)) in staff.iter().enumerate() {
            let row = 6 + i as u32;
            worksheet.write_string(row, 1, *name)?;
            worksheet.write_string(row, 2, *dept)?;
            worksheet.write_string(row, 3, *location)?;
        }

        Ok(workbook.save_to_buffer()?)
    }

    /// Three sheets, one of them empty
    pub fn generate_multi_sheets() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let sheet1 = workbook.add_worksheet();
        sheet1.set_name("Summary")?;
        sheet1.write_string(0, 0, "Total")?;
        sheet1.write_number(0, 1, 42.0)?;

        let sheet2 = workbook.add_worksheet();
        sheet2.set_name("Detail")?;
        sheet2.write_string(1, 1, "Item")?;
        sheet2.write_string(2, 1, "Pen | Ink")?;

        let sheet3 = workbook.add_worksheet();
        sheet3.set_name("Blank")?;

        Ok(workbook.save_to_buffer()?)
    }

    /// Table with a date column
    pub fn generate_dates() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        worksheet.write_string(0, 0, "Event")?;
        worksheet.write_string(0, 1, "Date")?;
        worksheet.write_string(1, 0, "Launch")?;
        let date = ExcelDateTime::from_ymd(2025, 1, 15)?;
        worksheet.write_datetime_with_format(1, 1, &date, &date_format)?;

        Ok(workbook.save_to_buffer()?)
    }
}

#[test]
fn test_locate_and_extract_report_table() {
    let data = fixtures::generate_report().unwrap();
    let extractor = ExtractorBuilder::new()
        .with_columns(["Name", "Job"])
        .build()
        .unwrap();

    let extraction = extractor.extract(Cursor::new(data)).unwrap();
    assert_eq!(extraction.sheet, "Report");
    assert_eq!(extraction.start.to_string(), "A6");
    assert_eq!(extraction.table.len(), 3);
    assert_eq!(extraction.table.column_count(), 2);

    let markdown = extractor.render(&extraction);
    let lines: Vec<&str> = markdown.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "| Name | Job |");
    assert_eq!(lines[1], "| --- | --- |");
    assert_eq!(lines[2], "| Alice | Engineer |");
    assert_eq!(lines[4], "| Carol | Analyst |");
    // Footnote after the blank row is not part of the table
    assert!(!markdown.contains("Footnote"));
}

#[test]
fn test_all_columns_when_none_requested() {
    let data = fixtures::generate_report().unwrap();
    let markdown = ExtractorBuilder::new()
        .build()
        .unwrap()
        .extract_to_markdown(Cursor::new(data))
        .unwrap();

    assert!(markdown.starts_with("| Name | Age | Job |"));
    assert!(markdown.contains("| Bob | 41 | Designer |"));
}

#[test]
fn test_unknown_column_reports_available_headers() {
    let data = fixtures::generate_report().unwrap();
    let extractor = ExtractorBuilder::new()
        .with_columns(["Salary"])
        .build()
        .unwrap();

    match extractor.extract(Cursor::new(data)) {
        Err(XlsxTableError::NoColumnsResolved {
            requested,
            available,
        }) => {
            assert_eq!(requested, vec!["Salary".to_string()]);
            assert!(available.contains(&"Name".to_string()));
        }
        other => panic!("expected NoColumnsResolved, got {:?}", other),
    }
}

#[test]
fn test_metadata_lists_missing_columns() {
    let data = fixtures::generate_report().unwrap();
    let markdown = ExtractorBuilder::new()
        .with_columns(["name", "Salary"])
        .include_metadata(true)
        .build()
        .unwrap()
        .extract_to_markdown(Cursor::new(data))
        .unwrap();

    assert!(markdown.starts_with("## Metadata\n\n"));
    assert!(markdown.contains("- Sheet: Report\n"));
    assert!(markdown.contains("- Data source starting cell: A6\n"));
    assert!(markdown.contains("- Total rows: 3\n"));
    assert!(markdown.contains("- Columns not found: Salary\n"));
    assert!(markdown.ends_with("| Carol |"));
}

#[test]
fn test_explicit_start_cell_skips_detection() {
    let data = fixtures::generate_staff().unwrap();
    let extraction = ExtractorBuilder::new()
        .with_start_cell("b6")
        .with_columns(["Department", "name"])
        .build()
        .unwrap()
        .extract(Cursor::new(data))
        .unwrap();

    assert_eq!(extraction.start.to_string(), "B6");
    assert_eq!(extraction.table.columns(), &["Department", "Name"]);
    assert_eq!(extraction.table.len(), 10);
    assert_eq!(extraction.table.rows()[0], vec!["Engineering", "Ann"]);
}

#[test]
fn test_missing_sheet_and_fallback() {
    let data = fixtures::generate_report().unwrap();

    let strict = ExtractorBuilder::new().with_sheet("Budget").build().unwrap();
    match strict.extract(Cursor::new(data.clone())) {
        Err(XlsxTableError::SheetNotFound { sheet, available }) => {
            assert_eq!(sheet, "Budget");
            assert_eq!(available, vec!["Report".to_string()]);
        }
        other => panic!("expected SheetNotFound, got {:?}", other),
    }

    let lenient = ExtractorBuilder::new()
        .with_sheet("Budget")
        .fallback_to_first_sheet(true)
        .build()
        .unwrap();
    let extraction = lenient.extract(Cursor::new(data)).unwrap();
    assert_eq!(extraction.sheet, "Report");
}

#[test]
fn test_filter_by_keys_counts_matches() {
    let data = fixtures::generate_staff().unwrap();
    let extractor = ExtractorBuilder::new()
        .with_start_cell("B6")
        .with_columns(["Name", "Department"])
        .build()
        .unwrap();
    let mapping =
        KeyValueMapping::from_json_str(r#"{"engineering": "Engineering", "sales": "Sales"}"#)
            .unwrap();

    let outcome = extractor
        .filter_by_keys(Cursor::new(data), "Department", &mapping)
        .unwrap();
    assert_eq!(outcome.total(), 2);
    assert_eq!(outcome.succeeded(), 1);

    let engineering = outcome.get("engineering").unwrap().as_ref().unwrap();
    assert!(engineering.starts_with("# Filtered Data: Department = 'Engineering'\n\n"));
    assert!(engineering.contains("- Total matching rows: 3\n"));
    assert!(engineering.contains("- Data source starting cell: B6\n"));
    assert!(engineering.contains("| Ann | Engineering |"));
    assert!(engineering.contains("| Cid | ENGINEERING |"));
    assert!(engineering.contains("| Fay | engineering |"));
    assert!(!engineering.contains("Marketing"));

    match outcome.get("sales") {
        Some(Err(e)) => {
            assert!(e.is_no_match());
            assert!(e.to_string().contains("Department"));
        }
        other => panic!("expected NoMatchingRows, got {:?}", other),
    }
}

#[test]
fn test_filter_unknown_primary_column() {
    let data = fixtures::generate_staff().unwrap();
    let extractor = ExtractorBuilder::new().with_start_cell("B6").build().unwrap();
    let mapping: KeyValueMapping = [("tokyo", "Tokyo")].into_iter().collect();

    match extractor.filter_by_keys(Cursor::new(data), "City", &mapping) {
        Err(XlsxTableError::PrimaryColumnNotFound { column, available }) => {
            assert_eq!(column, "City");
            assert_eq!(available, vec!["Name", "Department", "Location"]);
        }
        other => panic!("expected PrimaryColumnNotFound, got {:?}", other),
    }
}

#[test]
fn test_filter_outputs_written_per_key() {
    let data = fixtures::generate_staff().unwrap();
    let extractor = ExtractorBuilder::new().with_start_cell("B6").build().unwrap();
    let mapping: KeyValueMapping = [
        ("Tokyo office", "Tokyo"),
        ("osaka/kansai", "Osaka"),
        ("remote", "Remote"),
    ]
    .into_iter()
    .collect();
    let outcome = extractor
        .filter_by_keys(Cursor::new(data), "Location", &mapping)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let summary = write_filter_outputs(dir.path(), &outcome).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.written.len(), 2);

    let tokyo = std::fs::read_to_string(dir.path().join("Tokyo office.md")).unwrap();
    assert!(tokyo.contains("- Total matching rows: 5\n"));
    assert!(dir.path().join("osakakansai.md").exists());
    assert!(!dir.path().join("remote.md").exists());
}

#[test]
fn test_convert_all_sheets_in_workbook_order() {
    let data = fixtures::generate_multi_sheets().unwrap();
    let extractor = ExtractorBuilder::new().build().unwrap();
    let dumps = extractor.convert_all_sheets(Cursor::new(data)).unwrap();

    let names: Vec<&str> = dumps.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Summary", "Detail", "Blank"]);

    let summary = &dumps[0].markdown;
    assert!(summary.starts_with("# Sheet: Summary\n\n## Raw Data with Cell References\n\n"));
    assert!(summary.contains("| Total (A1) | 42 (B1) |"));
    assert!(summary.contains("- Total rows with data: 1\n"));

    // Pipes inside cells keep the table shape
    assert!(dumps[1].markdown.contains("|  | Pen &#124; Ink (B3) |"));

    assert!(dumps[2].markdown.contains(EMPTY_SHEET_MARKER));
    assert!(dumps[2].markdown.contains("- Total columns: 0\n"));
}

#[test]
fn test_convert_selected_sheets_to_files() {
    let data = fixtures::generate_multi_sheets().unwrap();
    let extractor = ExtractorBuilder::new()
        .with_sheet_selector(SheetSelector::Names(vec![
            "Detail".to_string(),
            "Summary".to_string(),
        ]))
        .build()
        .unwrap();
    let dumps = extractor.convert_all_sheets(Cursor::new(data)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let summary = write_sheet_dumps(&dir.path().join("sheets"), &dumps).unwrap();
    assert_eq!(summary.written.len(), 2);
    assert!(dir.path().join("sheets").join("Detail.md").exists());
    assert!(dir.path().join("sheets").join("Summary.md").exists());
}

#[test]
fn test_convert_all_sheets_to_string_separator() {
    let data = fixtures::generate_multi_sheets().unwrap();
    let markdown = ExtractorBuilder::new()
        .build()
        .unwrap()
        .convert_all_sheets_to_string(Cursor::new(data))
        .unwrap();
    assert_eq!(markdown.matches("\n---\n\n# Sheet: ").count(), 2);
}

#[test]
fn test_empty_sheet_table_not_found() {
    let data = fixtures::generate_multi_sheets().unwrap();
    let extractor = ExtractorBuilder::new().with_sheet("Blank").build().unwrap();
    assert!(matches!(
        extractor.extract(Cursor::new(data)),
        Err(XlsxTableError::TableNotFound { .. })
    ));
}

#[test]
fn test_header_without_rows_renders_marker() {
    let data = fixtures::generate_multi_sheets().unwrap();
    let markdown = ExtractorBuilder::new()
        .with_sheet("Summary")
        .build()
        .unwrap()
        .extract_to_markdown(Cursor::new(data))
        .unwrap();
    assert_eq!(markdown, NO_DATA_MARKER);
}

#[test]
fn test_custom_date_format() {
    let data = fixtures::generate_dates().unwrap();
    let markdown = ExtractorBuilder::new()
        .with_date_format(DateFormat::Custom("%Y/%m/%d".to_string()))
        .build()
        .unwrap()
        .extract_to_markdown(Cursor::new(data))
        .unwrap();
    assert!(markdown.contains("| Launch | 2025/01/15 |"), "{}", markdown);
}

#[test]
fn test_aligned_layout() {
    let data = fixtures::generate_report().unwrap();
    let markdown = ExtractorBuilder::new()
        .with_columns(["Name", "Age"])
        .with_table_layout(TableLayout::Aligned)
        .build()
        .unwrap()
        .extract_to_markdown(Cursor::new(data))
        .unwrap();
    let lines: Vec<&str> = markdown.lines().collect();
    assert_eq!(lines[0], "| Name  | Age |");
    assert_eq!(lines[1], "| ----- | --- |");
    assert_eq!(lines[2], "| Alice | 30  |");
}

#[test]
fn test_workbook_summary_and_range() {
    let data = fixtures::generate_report().unwrap();
    let mut source = WorkbookSource::open(Cursor::new(data)).unwrap();

    let summary = source.summary(false).unwrap();
    assert_eq!(summary.sheets.len(), 1);
    assert_eq!(summary.sheets[0].name, "Report");
    assert_eq!(summary.sheets[0].max_row, 11);
    assert_eq!(summary.sheets[0].max_column, 3);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["sheets"][0]["name"], "Report");
    assert!(json["sheets"][0].get("merged_cells").is_none());

    let range = source
        .read_range("Report", "A6".parse().unwrap(), Some("B7".parse().unwrap()), false)
        .unwrap();
    assert_eq!(range.rows.len(), 2);
    assert_eq!(range.rows[1][0], "Alice");
}

#[test]
fn test_load_error_for_garbage_input() {
    let extractor = ExtractorBuilder::new().build().unwrap();
    let result = extractor.extract(Cursor::new(b"not a spreadsheet".to_vec()));
    assert!(matches!(result, Err(XlsxTableError::Load(_))));
}
