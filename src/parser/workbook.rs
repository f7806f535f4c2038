//! Workbook Source
//!
//! calamineを使用したワークブックの読み込み。
//! 入力を一度だけメモリに読み込み、シートごとに`SheetGrid`のスナップショットを作成します。

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Reader, Sheets};

use crate::api::{DateFormat, SheetSelector};
use crate::error::XlsxTableError;
use crate::formatter::CellFormatter;
use crate::grid::{CellGrid, SheetGrid};
use crate::security::SecurityConfig;
use crate::types::{CellAddress, CellRange};

use super::summary::{RangeData, SheetSummary, WorkbookSummary, PREVIEW_ROWS};

/// ワークブックの読み込み元
///
/// xlsx / xlsm / xlsb / xls / ods を扱えます（形式はcalamineが判定）。
pub struct WorkbookSource {
    /// calamineのワークブック
    sheets: Sheets<Cursor<Vec<u8>>>,
    /// セル値の文字列化に使うフォーマッター
    formatter: CellFormatter,
    /// 結合セル範囲を読み込み済みか
    merged_loaded: bool,
}

impl std::fmt::Debug for WorkbookSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkbookSource")
            .field("sheets", &self.sheet_names())
            .finish()
    }
}

impl WorkbookSource {
    /// リーダーからワークブックを開く
    ///
    /// 入力全体をメモリに読み込みます（上限2GB）。
    ///
    /// # 引数
    ///
    /// * `reader` - スプレッドシートのバイト列を読み込むリーダー
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookSource)` - 読み込みに成功した場合
    /// * `Err(XlsxTableError::Load)` - 形式が不正、または破損している場合
    /// * `Err(XlsxTableError::SecurityViolation)` - サイズ上限を超えた場合
    pub fn open<R: Read>(reader: R) -> Result<Self, XlsxTableError> {
        Self::open_with(reader, &SecurityConfig::default(), DateFormat::Iso8601)
    }

    /// ファイルパスからワークブックを開く
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, XlsxTableError> {
        let file = File::open(path.as_ref())?;
        log::info!("Opening workbook {}", path.as_ref().display());
        Self::open(file)
    }

    /// セキュリティ設定と日付形式を指定して開く（内部用）
    pub(crate) fn open_with<R: Read>(
        mut reader: R,
        security: &SecurityConfig,
        date_format: DateFormat,
    ) -> Result<Self, XlsxTableError> {
        // 上限+1バイトまでしか読まない
        let mut buffer = Vec::new();
        let bytes_read = reader
            .by_ref()
            .take(security.max_input_file_size.saturating_add(1))
            .read_to_end(&mut buffer)?;
        security.check_input_size(bytes_read as u64)?;

        let sheets = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        let source = Self {
            sheets,
            formatter: CellFormatter::new(date_format),
            merged_loaded: false,
        };
        log::debug!("Workbook loaded: {:?}", source.sheet_names());
        Ok(source)
    }

    /// すべてのシート名（ワークブック内の順序）
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn sheet_not_found(&self, sheet: &str) -> XlsxTableError {
        XlsxTableError::SheetNotFound {
            sheet: sheet.to_string(),
            available: self.sheet_names(),
        }
    }

    /// シート選択方式に基づいてシートを選択
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<String>)` - 選択されたシート名のリスト
    /// * `Err(XlsxTableError::SheetNotFound)` - 指定したシートが存在しない場合
    /// * `Err(XlsxTableError::Config)` - インデックスが範囲外の場合
    pub fn select_sheets(&self, selector: &SheetSelector) -> Result<Vec<String>, XlsxTableError> {
        let all_sheet_names = self.sheet_names();

        match selector {
            SheetSelector::All => Ok(all_sheet_names),

            SheetSelector::Index(index) => all_sheet_names
                .get(*index)
                .map(|name| vec![name.clone()])
                .ok_or_else(|| {
                    XlsxTableError::Config(format!(
                        "Sheet index {} is out of range (total: {})",
                        index,
                        all_sheet_names.len()
                    ))
                }),

            SheetSelector::Name(name) => {
                if !all_sheet_names.contains(name) {
                    return Err(self.sheet_not_found(name));
                }
                Ok(vec![name.clone()])
            }

            SheetSelector::Names(names) => {
                if let Some(missing) = names.iter().find(|n| !all_sheet_names.contains(n)) {
                    return Err(self.sheet_not_found(missing));
                }
                Ok(names.clone())
            }
        }
    }

    /// シートのスナップショットを作成
    ///
    /// `sheet`が`None`の場合は先頭のシートを開きます。
    ///
    /// # 戻り値
    ///
    /// * `Ok(SheetGrid)` - シートのスナップショット
    /// * `Err(XlsxTableError::SheetNotFound)` - 指定シートが存在しない場合
    /// * `Err(XlsxTableError::Load)` - シートの解析に失敗した場合
    pub fn open_grid(&mut self, sheet: Option<&str>) -> Result<SheetGrid, XlsxTableError> {
        let name = match sheet {
            Some(name) => {
                if !self.sheet_names().iter().any(|n| n == name) {
                    return Err(self.sheet_not_found(name));
                }
                name.to_string()
            }
            None => self.first_sheet()?,
        };

        let range = self.sheets.worksheet_range(&name)?;
        let grid = SheetGrid::from_range(&name, &range, self.formatter.clone());
        log::debug!(
            "Sheet '{}' loaded: {} rows x {} columns",
            name,
            grid.max_row(),
            grid.max_column()
        );
        Ok(grid)
    }

    /// シートを開き、存在しなければ先頭のシートにフォールバック
    pub fn open_grid_or_first(&mut self, sheet: Option<&str>) -> Result<SheetGrid, XlsxTableError> {
        match self.open_grid(sheet) {
            Err(XlsxTableError::SheetNotFound { sheet, .. }) => {
                let first = self.first_sheet()?;
                log::warn!("Sheet '{}' not found, using first sheet '{}'", sheet, first);
                self.open_grid(Some(&first))
            }
            other => other,
        }
    }

    fn first_sheet(&self) -> Result<String, XlsxTableError> {
        self.sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| XlsxTableError::Config("Workbook contains no sheets".to_string()))
    }

    /// シートの数式を読み込む
    ///
    /// 数式を持つセルの位置（1始まり）と数式文字列（先頭の`=`なし）を返します。
    pub fn load_formulas(&mut self, sheet: &str) -> Result<Vec<(CellAddress, String)>, XlsxTableError> {
        if !self.sheet_names().iter().any(|n| n == sheet) {
            return Err(self.sheet_not_found(sheet));
        }
        let range = self.sheets.worksheet_formula(sheet)?;
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        Ok(range
            .cells()
            .filter(|(_, _, formula)| !formula.is_empty())
            .map(|(row, col, formula)| {
                (
                    CellAddress::new(start_row + row as u32 + 1, start_col + col as u32 + 1),
                    formula.trim_start_matches('=').to_string(),
                )
            })
            .collect())
    }

    /// ワークブックの概要を作成
    ///
    /// `include_ranges`が`true`の場合、結合セル範囲とデータの有無も含めます
    /// （結合セル範囲はxlsx系の形式のみ）。
    pub fn summary(&mut self, include_ranges: bool) -> Result<WorkbookSummary, XlsxTableError> {
        if include_ranges {
            self.load_merged_regions()?;
        }

        let mut sheets = Vec::new();
        for name in self.sheet_names() {
            let grid = self.open_grid(Some(&name))?;
            let mut summary = SheetSummary::from_grid(&grid);
            if include_ranges {
                summary.has_data = Some(grid.last_cell().is_some());
                summary.merged_cells = Some(
                    self.merged_ranges(&name)
                        .iter()
                        .map(CellRange::to_string)
                        .collect(),
                );
            }
            sheets.push(summary);
        }
        Ok(WorkbookSummary { sheets })
    }

    /// シートの結合セル範囲
    ///
    /// xlsx系以外の形式では空を返します。
    pub fn merged_regions(&mut self, sheet: &str) -> Result<Vec<CellRange>, XlsxTableError> {
        if !self.sheet_names().iter().any(|name| name == sheet) {
            return Err(self.sheet_not_found(sheet));
        }
        self.load_merged_regions()?;
        Ok(self.merged_ranges(sheet))
    }

    fn load_merged_regions(&mut self) -> Result<(), XlsxTableError> {
        if self.merged_loaded {
            return Ok(());
        }
        if let Sheets::Xlsx(xlsx) = &mut self.sheets {
            xlsx.load_merged_regions().map_err(calamine::Error::Xlsx)?;
        }
        self.merged_loaded = true;
        Ok(())
    }

    fn merged_ranges(&self, sheet: &str) -> Vec<CellRange> {
        match &self.sheets {
            Sheets::Xlsx(xlsx) => xlsx
                .merged_regions_by_sheet(sheet)
                .into_iter()
                .map(|(_, _, dims)| {
                    CellRange::new(
                        CellAddress::new(dims.start.0 + 1, dims.start.1 + 1),
                        CellAddress::new(dims.end.0 + 1, dims.end.1 + 1),
                    )
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// 範囲のセル値を読み込む
    ///
    /// # 引数
    ///
    /// * `sheet` - シート名
    /// * `start` - 開始セル
    /// * `end` - 終了セル（`None`の場合はシートの最終セル）
    /// * `preview` - `true`の場合は先頭10行のみ
    pub fn read_range(
        &mut self,
        sheet: &str,
        start: CellAddress,
        end: Option<CellAddress>,
        preview: bool,
    ) -> Result<RangeData, XlsxTableError> {
        let grid = self.open_grid(Some(sheet))?;
        Ok(RangeData::from_grid(
            &grid,
            start,
            end,
            if preview { Some(PREVIEW_ROWS) } else { None },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn fixture() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Report").unwrap();
        sheet.write_string(2, 1, "Name").unwrap();
        sheet.write_string(2, 2, "Score").unwrap();
        sheet.write_string(3, 1, "Alice").unwrap();
        sheet.write_number(3, 2, 91.0).unwrap();
        sheet.write_formula(4, 2, "=SUM(C4:C4)").unwrap();
        sheet.merge_range(0, 0, 0, 2, "Quarterly Report", &Default::default()).unwrap();
        workbook.add_worksheet().set_name("Empty").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_open_and_list_sheets() {
        let source = WorkbookSource::open(Cursor::new(fixture())).unwrap();
        assert_eq!(source.sheet_names(), vec!["Report".to_string(), "Empty".to_string()]);
    }

    #[test]
    fn test_open_grid_absolute_coordinates() {
        let mut source = WorkbookSource::open(Cursor::new(fixture())).unwrap();
        let grid = source.open_grid(Some("Report")).unwrap();
        assert_eq!(grid.text_at(3, 2).as_deref(), Some("Name"));
        assert_eq!(grid.text_at(4, 3).as_deref(), Some("91"));
    }

    #[test]
    fn test_merged_regions() {
        let mut source = WorkbookSource::open(Cursor::new(fixture())).unwrap();
        assert_eq!(
            source.merged_regions("Report").unwrap(),
            vec![CellRange::parse("A1:C1").unwrap()]
        );
        assert!(source.merged_regions("Empty").unwrap().is_empty());
        assert!(matches!(
            source.merged_regions("Missing"),
            Err(XlsxTableError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_sheet_not_found_lists_available() {
        let mut source = WorkbookSource::open(Cursor::new(fixture())).unwrap();
        match source.open_grid(Some("Missing")) {
            Err(XlsxTableError::SheetNotFound { sheet, available }) => {
                assert_eq!(sheet, "Missing");
                assert_eq!(available, vec!["Report".to_string(), "Empty".to_string()]);
            }
            other => panic!("expected SheetNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_to_first_sheet() {
        let mut source = WorkbookSource::open(Cursor::new(fixture())).unwrap();
        let grid = source.open_grid_or_first(Some("Missing")).unwrap();
        assert_eq!(grid.name(), "Report");
    }

    #[test]
    fn test_select_sheets() {
        let source = WorkbookSource::open(Cursor::new(fixture())).unwrap();
        assert_eq!(source.select_sheets(&SheetSelector::All).unwrap().len(), 2);
        assert_eq!(
            source.select_sheets(&SheetSelector::Index(1)).unwrap(),
            vec!["Empty".to_string()]
        );
        assert!(matches!(
            source.select_sheets(&SheetSelector::Index(5)),
            Err(XlsxTableError::Config(_))
        ));
        assert!(matches!(
            source.select_sheets(&SheetSelector::Names(vec!["Report".into(), "Nope".into()])),
            Err(XlsxTableError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_load_formulas() {
        let mut source = WorkbookSource::open(Cursor::new(fixture())).unwrap();
        let formulas = source.load_formulas("Report").unwrap();
        assert_eq!(
            formulas,
            vec![(CellAddress::new(5, 3), "SUM(C4:C4)".to_string())]
        );
    }

    #[test]
    fn test_summary_with_ranges() {
        let mut source = WorkbookSource::open(Cursor::new(fixture())).unwrap();
        let summary = source.summary(true).unwrap();
        let report = &summary.sheets[0];
        assert_eq!(report.name, "Report");
        assert_eq!(report.max_row, 5);
        assert_eq!(report.max_column, 3);
        assert_eq!(report.data_range.as_deref(), Some("A1:C5"));
        assert_eq!(report.has_data, Some(true));
        assert_eq!(report.merged_cells, Some(vec!["A1:C1".to_string()]));

        let empty = &summary.sheets[1];
        assert_eq!(empty.data_range, None);
        assert_eq!(empty.has_data, Some(false));
    }

    #[test]
    fn test_summary_without_ranges_omits_details() {
        let mut source = WorkbookSource::open(Cursor::new(fixture())).unwrap();
        let summary = source.summary(false).unwrap();
        assert_eq!(summary.sheets[0].merged_cells, None);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("merged_cells"));
    }

    #[test]
    fn test_input_size_limit() {
        let result = WorkbookSource::open_with(
            Cursor::new(fixture()),
            &SecurityConfig::with_max_input_size(16),
            DateFormat::Iso8601,
        );
        assert!(matches!(result, Err(XlsxTableError::SecurityViolation(_))));
    }

    #[test]
    fn test_garbage_input_is_load_error() {
        let result = WorkbookSource::open(Cursor::new(b"not a spreadsheet".to_vec()));
        assert!(matches!(result, Err(XlsxTableError::Load(_))));
    }
}
