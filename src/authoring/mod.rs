//! Authoring Module
//!
//! ワークブックを編集して保存するための`WorkbookEditor`を提供するモジュール。
//!
//! 既存のファイルからは値・数式・結合セルを読み込みます（書式・グラフ・
//! テーブルは引き継ぎません）。編集はメモリ上で行い、`save`時にrust_xlsxwriterで
//! ワークブック全体を書き出します。

mod chart;
mod pivot;
mod style;
mod table;

pub use chart::{ChartKind, ChartTitles};
pub use pivot::{pivot_summary, Aggregation, PivotSpec};
pub use style::{BorderStyle, CellStyle};
pub use table::TableTheme;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::XlsxTableError;
use crate::formatter::CellFormatter;
use crate::parser::WorkbookSource;
use crate::types::{CellAddress, CellRange, CellValue};

use chart::ChartSpec;
use table::{unique_headers, validate_table_name, TableSpec};

/// シート名の最大文字数
const MAX_SHEET_NAME_LEN: usize = 31;

/// シート名に使用できない文字
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// 日付セルの表示形式
const DATE_NUM_FORMAT: &str = "yyyy-mm-dd";
const DURATION_NUM_FORMAT: &str = "[h]:mm:ss";

static EMPTY: CellValue = CellValue::Empty;

#[derive(Debug, Clone, Default, PartialEq)]
struct EditorCell {
    value: CellValue,
    /// 数式（先頭の`=`なし）
    formula: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct EditorSheet {
    name: String,
    /// (行, 列) 1始まり
    cells: BTreeMap<(u32, u32), EditorCell>,
    styles: BTreeMap<(u32, u32), CellStyle>,
    merged: Vec<CellRange>,
    charts: Vec<ChartSpec>,
    tables: Vec<TableSpec>,
}

impl EditorSheet {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn set_value(&mut self, addr: CellAddress, value: CellValue) {
        let key = (addr.row, addr.col);
        match value {
            CellValue::Text(text) if text.starts_with('=') && text.len() > 1 => {
                self.cells.insert(
                    key,
                    EditorCell {
                        value: CellValue::Empty,
                        formula: Some(text[1..].to_string()),
                    },
                );
            }
            CellValue::Empty => {
                self.cells.remove(&key);
            }
            value => {
                self.cells.insert(key, EditorCell { value, formula: None });
            }
        }
    }

    fn value_at(&self, addr: CellAddress) -> &CellValue {
        self.cells
            .get(&(addr.row, addr.col))
            .map(|cell| &cell.value)
            .unwrap_or(&EMPTY)
    }
}

/// ワークブックの編集
///
/// # 使用例
///
/// ```rust
/// use xlsxtable::{CellAddress, CellValue, WorkbookEditor};
///
/// let mut editor = WorkbookEditor::new();
/// editor.write_range(
///     "Sheet1",
///     CellAddress::new(1, 1),
///     vec![
///         vec!["Item".into(), "Price".into()],
///         vec!["Pen".into(), CellValue::Number(1.5)],
///     ],
/// )?;
/// editor.apply_formula("Sheet1", CellAddress::new(3, 2), "=SUM(B2:B2)")?;
///
/// let bytes = editor.save_to_buffer()?;
/// assert!(!bytes.is_empty());
/// # Ok::<(), xlsxtable::XlsxTableError>(())
/// ```
#[derive(Debug, Clone)]
pub struct WorkbookEditor {
    sheets: Vec<EditorSheet>,
}

impl Default for WorkbookEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookEditor {
    /// 空のワークブック（`Sheet1`のみ）を作成
    pub fn new() -> Self {
        Self {
            sheets: vec![EditorSheet::new("Sheet1")],
        }
    }

    /// 既存のワークブックを読み込む
    ///
    /// すべてのシートの値・数式・結合セル範囲を読み込みます。数式や結合セルを
    /// 読めない形式の場合は値のみを使用します。
    pub fn open<R: Read>(reader: R) -> Result<Self, XlsxTableError> {
        let mut source = WorkbookSource::open(reader)?;
        let mut sheets = Vec::new();

        for name in source.sheet_names() {
            let grid = source.open_grid(Some(&name))?;
            let mut sheet = EditorSheet::new(name.as_str());
            for (addr, value) in grid.cells() {
                sheet.cells.insert(
                    (addr.row, addr.col),
                    EditorCell {
                        value: value.clone(),
                        formula: None,
                    },
                );
            }

            match source.load_formulas(&name) {
                Ok(formulas) => {
                    for (addr, formula) in formulas {
                        let cell = sheet.cells.entry((addr.row, addr.col)).or_default();
                        cell.formula = Some(formula);
                    }
                }
                Err(e) => log::warn!("Formulas of sheet '{}' not loaded: {}", name, e),
            }
            match source.merged_regions(&name) {
                Ok(merged) => sheet.merged = merged,
                Err(e) => log::warn!("Merged cells of sheet '{}' not loaded: {}", name, e),
            }
            sheets.push(sheet);
        }

        if sheets.is_empty() {
            return Err(XlsxTableError::Config(
                "Workbook contains no sheets".to_string(),
            ));
        }
        log::info!("Workbook opened for editing: {} sheets", sheets.len());
        Ok(Self { sheets })
    }

    /// ファイルパスから既存のワークブックを読み込む
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, XlsxTableError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::open(file)
    }

    /// シート名（順序どおり）
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// セルの値（数式セルは読み込み時の計算結果）
    pub fn value_at(&self, sheet: &str, addr: CellAddress) -> Result<&CellValue, XlsxTableError> {
        Ok(self.sheet(sheet)?.value_at(addr))
    }

    /// セルの数式（先頭の`=`なし）
    pub fn formula_at(&self, sheet: &str, addr: CellAddress) -> Result<Option<&str>, XlsxTableError> {
        Ok(self
            .sheet(sheet)?
            .cells
            .get(&(addr.row, addr.col))
            .and_then(|cell| cell.formula.as_deref()))
    }

    fn position(&self, sheet: &str) -> Result<usize, XlsxTableError> {
        self.sheets
            .iter()
            .position(|s| s.name == sheet)
            .ok_or_else(|| XlsxTableError::SheetNotFound {
                sheet: sheet.to_string(),
                available: self.sheet_names(),
            })
    }

    fn sheet(&self, sheet: &str) -> Result<&EditorSheet, XlsxTableError> {
        let index = self.position(sheet)?;
        Ok(&self.sheets[index])
    }

    fn sheet_mut(&mut self, sheet: &str) -> Result<&mut EditorSheet, XlsxTableError> {
        let index = self.position(sheet)?;
        Ok(&mut self.sheets[index])
    }

    fn validate_new_sheet_name(&self, name: &str) -> Result<(), XlsxTableError> {
        if name.trim().is_empty() {
            return Err(XlsxTableError::Config("Sheet name is empty".to_string()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(XlsxTableError::Config(format!(
                "Sheet name '{}' exceeds {} characters",
                name, MAX_SHEET_NAME_LEN
            )));
        }
        if let Some(ch) = name.chars().find(|c| INVALID_SHEET_CHARS.contains(c)) {
            return Err(XlsxTableError::Config(format!(
                "Sheet name '{}' contains invalid character '{}'",
                name, ch
            )));
        }
        let lower = name.to_lowercase();
        if self.sheets.iter().any(|s| s.name.to_lowercase() == lower) {
            return Err(XlsxTableError::Config(format!(
                "Sheet '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    /// 末尾に空のシートを追加
    pub fn create_sheet(&mut self, name: &str) -> Result<(), XlsxTableError> {
        self.validate_new_sheet_name(name)?;
        self.sheets.push(EditorSheet::new(name));
        log::debug!("Sheet '{}' created", name);
        Ok(())
    }

    /// シートの値・数式・書式・結合セルを新しいシートに複製
    ///
    /// グラフとテーブルは複製しません。
    pub fn copy_sheet(&mut self, source: &str, new_name: &str) -> Result<(), XlsxTableError> {
        self.validate_new_sheet_name(new_name)?;
        let original = self.sheet(source)?;
        let copy = EditorSheet {
            name: new_name.to_string(),
            cells: original.cells.clone(),
            styles: original.styles.clone(),
            merged: original.merged.clone(),
            charts: Vec::new(),
            tables: Vec::new(),
        };
        self.sheets.push(copy);
        log::debug!("Sheet '{}' copied to '{}'", source, new_name);
        Ok(())
    }

    /// シートを削除
    ///
    /// 最後の1枚は削除できません。
    pub fn delete_sheet(&mut self, name: &str) -> Result<(), XlsxTableError> {
        let index = self.position(name)?;
        if self.sheets.len() == 1 {
            return Err(XlsxTableError::Config(
                "Cannot delete the only sheet in the workbook".to_string(),
            ));
        }
        self.sheets.remove(index);
        log::debug!("Sheet '{}' deleted", name);
        Ok(())
    }

    /// 行データを書き込む
    ///
    /// `=`で始まる文字列は数式として扱います。`CellValue::Empty`はセルを消去します。
    pub fn write_range(
        &mut self,
        sheet: &str,
        start: CellAddress,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<(), XlsxTableError> {
        check_address(start)?;
        let target = self.sheet_mut(sheet)?;
        let mut written = 0usize;
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                let addr = CellAddress::new(start.row + r as u32, start.col + c as u32);
                check_address(addr)?;
                target.set_value(addr, value);
                written += 1;
            }
        }
        log::debug!("Wrote {} cells to '{}' from {}", written, sheet, start);
        Ok(())
    }

    /// セルに数式を設定（先頭の`=`は省略可）
    pub fn apply_formula(
        &mut self,
        sheet: &str,
        cell: CellAddress,
        formula: &str,
    ) -> Result<(), XlsxTableError> {
        check_address(cell)?;
        let formula = formula.trim().trim_start_matches('=');
        if formula.is_empty() {
            return Err(XlsxTableError::Config(format!(
                "Empty formula for cell {}",
                cell
            )));
        }
        let target = self.sheet_mut(sheet)?;
        target.cells.insert(
            (cell.row, cell.col),
            EditorCell {
                value: CellValue::Empty,
                formula: Some(formula.to_string()),
            },
        );
        Ok(())
    }

    /// 範囲に書式を適用
    ///
    /// 既存の書式に重ねて適用します（未指定の項目は変更しません）。
    pub fn format_range(
        &mut self,
        sheet: &str,
        range: CellRange,
        style: &CellStyle,
    ) -> Result<(), XlsxTableError> {
        style.validate()?;
        check_address(range.end)?;
        let target = self.sheet_mut(sheet)?;
        for row in range.start.row..=range.end.row {
            for col in range.start.col..=range.end.col {
                target.styles.entry((row, col)).or_default().merge(style);
            }
        }
        Ok(())
    }

    /// グラフを追加
    ///
    /// `data_range`の各列が1系列になります。範囲が2行以上あれば先頭行を系列名とします。
    /// 散布図は先頭列をX値とするため、2列以上の範囲が必要です。
    pub fn add_chart(
        &mut self,
        sheet: &str,
        data_range: CellRange,
        kind: ChartKind,
        anchor: CellAddress,
        titles: ChartTitles,
    ) -> Result<(), XlsxTableError> {
        check_address(data_range.end)?;
        check_address(anchor)?;
        if kind.needs_x_values() && data_range.size().1 < 2 {
            return Err(XlsxTableError::Config(format!(
                "{} chart needs an X column and at least one value column, got {}",
                kind, data_range
            )));
        }
        let target = self.sheet_mut(sheet)?;
        target.charts.push(ChartSpec {
            kind,
            data_range,
            anchor,
            titles,
        });
        log::debug!("{} chart of {} added to '{}' at {}", kind, data_range, sheet, anchor);
        Ok(())
    }

    /// テーブルを追加し、その名前を返す
    ///
    /// 範囲の先頭行が見出しになります（空欄は`Column<n>`、重複には番号を付与）。
    /// 名前を省略した場合は`Table_<n>`を割り当てます。
    pub fn add_table(
        &mut self,
        sheet: &str,
        range: CellRange,
        name: Option<&str>,
        theme: TableTheme,
    ) -> Result<String, XlsxTableError> {
        check_address(range.end)?;
        if range.size().0 < 2 {
            return Err(XlsxTableError::Config(format!(
                "Table range {} needs a header row and at least one data row",
                range
            )));
        }

        let existing: Vec<String> = self
            .sheets
            .iter()
            .flat_map(|s| s.tables.iter().map(|t| t.name.to_lowercase()))
            .collect();
        let name = match name {
            Some(name) => {
                validate_table_name(name)?;
                if existing.contains(&name.to_lowercase()) {
                    return Err(XlsxTableError::Config(format!(
                        "Table '{}' already exists",
                        name
                    )));
                }
                name.to_string()
            }
            None => (1..)
                .map(|n| format!("Table_{}", n))
                .find(|candidate| !existing.contains(&candidate.to_lowercase()))
                .unwrap_or_else(|| "Table_1".to_string()),
        };

        let target = self.sheet_mut(sheet)?;
        if let Some(other) = target.tables.iter().find(|t| overlaps(&t.range, &range)) {
            return Err(XlsxTableError::Config(format!(
                "Table range {} overlaps table '{}' ({})",
                range, other.name, other.range
            )));
        }

        let formatter = CellFormatter::default();
        let raw_headers: Vec<String> = (range.start.col..=range.end.col)
            .map(|col| {
                let value = target.value_at(CellAddress::new(range.start.row, col));
                formatter.format_value(value).trim().to_string()
            })
            .collect();

        target.tables.push(TableSpec {
            name: name.clone(),
            range,
            theme,
            headers: unique_headers(raw_headers),
        });
        log::debug!("Table '{}' ({}) added to '{}'", name, range, sheet);
        Ok(name)
    }

    /// ピボット集計を`<sheet>_pivot`シートに書き出し、そのシート名を返す
    ///
    /// 範囲の先頭行を見出しとして集計します。出力先のシートが既にあれば
    /// 内容を置き換えます。
    pub fn add_pivot_summary(
        &mut self,
        sheet: &str,
        data_range: CellRange,
        spec: &PivotSpec,
    ) -> Result<String, XlsxTableError> {
        let source = self.sheet(sheet)?;
        let formatter = CellFormatter::default();
        let header: Vec<String> = (data_range.start.col..=data_range.end.col)
            .map(|col| {
                let value = source.value_at(CellAddress::new(data_range.start.row, col));
                formatter.format_value(value).trim().to_string()
            })
            .collect();
        let rows: Vec<Vec<CellValue>> = (data_range.start.row + 1..=data_range.end.row)
            .map(|row| {
                (data_range.start.col..=data_range.end.col)
                    .map(|col| source.value_at(CellAddress::new(row, col)).clone())
                    .collect::<Vec<_>>()
            })
            .filter(|row| row.iter().any(|v| !v.is_empty()))
            .collect();

        let summary = pivot_summary(&header, &rows, spec)?;

        let target_name = format!("{}_pivot", sheet);
        match self.position(&target_name) {
            Ok(index) => {
                log::info!("Replacing existing sheet '{}'", target_name);
                self.sheets[index] = EditorSheet::new(target_name.as_str());
            }
            Err(_) => self.create_sheet(&target_name)?,
        }
        self.write_range(&target_name, CellAddress::new(1, 1), summary)?;
        log::info!(
            "Pivot summary of '{}' {} written to '{}'",
            sheet,
            data_range,
            target_name
        );
        Ok(target_name)
    }

    /// ファイルに保存
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), XlsxTableError> {
        let mut workbook = self.build_workbook()?;
        workbook.save(path.as_ref())?;
        log::info!("Workbook saved to {}", path.as_ref().display());
        Ok(())
    }

    /// バイト列として保存
    pub fn save_to_buffer(&self) -> Result<Vec<u8>, XlsxTableError> {
        let mut workbook = self.build_workbook()?;
        Ok(workbook.save_to_buffer()?)
    }

    fn build_workbook(&self) -> Result<Workbook, XlsxTableError> {
        let mut workbook = Workbook::new();
        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name.as_str())?;
            write_sheet(worksheet, sheet)?;
        }
        Ok(workbook)
    }
}

/// 1枚のシートの内容を書き出す（結合セル、セル、テーブル、グラフの順）
fn write_sheet(worksheet: &mut Worksheet, sheet: &EditorSheet) -> Result<(), XlsxTableError> {
    let formats: BTreeMap<(u32, u32), Format> = sheet
        .styles
        .iter()
        .map(|(key, style)| style.to_format().map(|format| (*key, format)))
        .collect::<Result<_, _>>()?;
    let plain = Format::new();

    // 先頭セルの値は後続のセル書き出しで上書きする
    for range in &sheet.merged {
        if range.size() == (1, 1) {
            continue;
        }
        let (r1, c1) = writer_position(range.start)?;
        let (r2, c2) = writer_position(range.end)?;
        let format = formats
            .get(&(range.start.row, range.start.col))
            .unwrap_or(&plain);
        worksheet.merge_range(r1, c1, r2, c2, "", format)?;
    }

    for (&(row, col), cell) in &sheet.cells {
        let (r, c) = writer_position(CellAddress::new(row, col))?;
        let format = formats.get(&(row, col)).unwrap_or(&plain);

        if let Some(formula) = &cell.formula {
            worksheet.write_formula_with_format(r, c, format!("={}", formula).as_str(), format)?;
            continue;
        }
        match &cell.value {
            CellValue::Number(n) => {
                worksheet.write_number_with_format(r, c, *n, format)?;
            }
            CellValue::Text(text) => {
                worksheet.write_string_with_format(r, c, text, format)?;
            }
            CellValue::Bool(b) => {
                worksheet.write_boolean_with_format(r, c, *b, format)?;
            }
            CellValue::DateTime(serial) => {
                let date_format = format.clone().set_num_format(DATE_NUM_FORMAT);
                worksheet.write_number_with_format(r, c, *serial, &date_format)?;
            }
            CellValue::Duration(days) => {
                let duration_format = format.clone().set_num_format(DURATION_NUM_FORMAT);
                worksheet.write_number_with_format(r, c, *days, &duration_format)?;
            }
            CellValue::Error(code) => {
                worksheet.write_string_with_format(r, c, code, format)?;
            }
            CellValue::Empty => {
                worksheet.write_blank(r, c, format)?;
            }
        }
    }

    // 値のないセルの書式
    for (key, format) in &formats {
        if !sheet.cells.contains_key(key) {
            let (r, c) = writer_position(CellAddress::new(key.0, key.1))?;
            worksheet.write_blank(r, c, format)?;
        }
    }

    for table in &sheet.tables {
        let (r1, c1) = writer_position(table.range.start)?;
        let (r2, c2) = writer_position(table.range.end)?;
        worksheet.add_table(r1, c1, r2, c2, &table.build()?)?;
    }

    for spec in &sheet.charts {
        let (r, c) = writer_position(spec.anchor)?;
        let chart = spec.build(&sheet.name);
        worksheet.insert_chart(r, c, &chart)?;
    }
    Ok(())
}

/// 書き込み可能な座標か（列はXFDまで）
fn check_address(addr: CellAddress) -> Result<(), XlsxTableError> {
    writer_position(addr).map(|_| ())
}

/// 1始まりの座標をrust_xlsxwriterの(行, 列)に変換
fn writer_position(addr: CellAddress) -> Result<(u32, u16), XlsxTableError> {
    const MAX_ROWS: u32 = 1_048_576;
    const MAX_COLS: u32 = 16_384;
    if addr.row == 0 || addr.col == 0 || addr.row > MAX_ROWS || addr.col > MAX_COLS {
        return Err(XlsxTableError::Config(format!(
            "Cell {} is outside the worksheet",
            addr
        )));
    }
    let (row, col) = addr.zero_based();
    let col = u16::try_from(col)
        .map_err(|_| XlsxTableError::Config(format!("Cell {} is outside the worksheet", addr)))?;
    Ok((row, col))
}

fn overlaps(a: &CellRange, b: &CellRange) -> bool {
    a.start.row <= b.end.row
        && b.start.row <= a.end.row
        && a.start.col <= b.end.col
        && b.start.col <= a.end.col
}

/// JSONの二次元配列を行データに変換する
///
/// 要素は文字列・数値・真偽値・`null`（空セル）のいずれかです。
///
/// # 使用例
///
/// ```rust
/// use xlsxtable::{rows_from_json, CellValue};
///
/// let rows = rows_from_json(r#"[["Name", "Score"], ["Alice", 91], [null, true]]"#)?;
/// assert_eq!(rows[1][1], CellValue::Number(91.0));
/// assert_eq!(rows[2][0], CellValue::Empty);
/// # Ok::<(), xlsxtable::XlsxTableError>(())
/// ```
pub fn rows_from_json(json: &str) -> Result<Vec<Vec<CellValue>>, XlsxTableError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let not_grid = || XlsxTableError::Config("Expected a JSON array of arrays".to_string());

    value
        .as_array()
        .ok_or_else(not_grid)?
        .iter()
        .map(|row| {
            row.as_array()
                .ok_or_else(not_grid)?
                .iter()
                .map(json_cell)
                .collect()
        })
        .collect()
}

fn json_cell(value: &serde_json::Value) -> Result<CellValue, XlsxTableError> {
    use serde_json::Value;
    match value {
        Value::Null => Ok(CellValue::Empty),
        Value::Bool(b) => Ok(CellValue::Bool(*b)),
        Value::Number(n) => n.as_f64().map(CellValue::Number).ok_or_else(|| {
            XlsxTableError::Config(format!("Number {} cannot be written to a cell", n))
        }),
        Value::String(s) => Ok(CellValue::Text(s.clone())),
        other => Err(XlsxTableError::Config(format!(
            "Nested value {} cannot be written to a cell",
            other
        ))),
    }
}
