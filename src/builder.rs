//! Builder Module
//!
//! Fluent Builder APIを提供し、`Extractor`インスタンスを段階的に構築する。

use std::io::Read;

use chrono::format::{Item, StrftimeItems};
use rayon::prelude::*;

use crate::api::{DateFormat, SheetSelector, TableLayout};
use crate::error::XlsxTableError;
use crate::grid::{CellGrid, SheetGrid};
use crate::output::{FilterOutcome, KeyOutcome, MarkdownRenderer, SheetDump};
use crate::parser::WorkbookSource;
use crate::security::{SecurityConfig, DEFAULT_MAX_INPUT_SIZE};
use crate::table::{
    extract_filtered, extract_headers, extract_table, locate_header, resolve_columns,
    ColumnSelection, ExtractedTable, FilterCriterion, HeaderRow, KeyValueMapping,
};
use crate::types::CellAddress;

/// 抽出処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ExtractionConfig {
    /// 対象シート名（`None`の場合は先頭のシート）
    pub sheet: Option<String>,

    /// 指定シートがない場合に先頭のシートを使うか
    pub fallback_to_first_sheet: bool,

    /// ヘッダー行の開始セル（`None`の場合は自動検出）
    pub start_cell: Option<CellAddress>,

    /// 抽出する列名（`None`の場合はすべての列）
    pub columns: Option<Vec<String>>,

    /// 日付形式
    pub date_format: DateFormat,

    /// Markdownテーブルのレイアウト
    pub table_layout: TableLayout,

    /// 単一テーブル抽出でメタデータを出力するか
    pub include_metadata: bool,

    /// 一括変換の対象シート
    pub sheet_selector: SheetSelector,

    /// 入力ファイルの最大サイズ（バイト）
    pub max_input_size: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sheet: None,
            fallback_to_first_sheet: false,
            start_cell: None,
            columns: None,
            date_format: DateFormat::Iso8601,
            table_layout: TableLayout::Compact,
            include_metadata: false,
            sheet_selector: SheetSelector::All,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Extractor`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use xlsxtable::{ExtractorBuilder, TableLayout};
///
/// # fn main() -> Result<(), xlsxtable::XlsxTableError> {
/// let extractor = ExtractorBuilder::new()
///     .with_sheet("Staff")
///     .with_start_cell("B6")
///     .with_columns(["Name", "Department"])
///     .with_table_layout(TableLayout::Aligned)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExtractorBuilder {
    /// 内部設定（構築中）
    config: ExtractionConfig,

    /// 未検証の開始セル文字列（`build()`でパース）
    start_cell_text: Option<String>,
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート: 先頭のシート（フォールバックなし）
    /// - 開始セル: 自動検出
    /// - 列: すべての列
    /// - 日付形式: ISO 8601 (YYYY-MM-DD)
    /// - レイアウト: Compact
    /// - メタデータ: 出力しない
    /// - 一括変換の対象: すべてのシート
    /// - 入力サイズ上限: 2GB
    pub fn new() -> Self {
        Self {
            config: ExtractionConfig::default(),
            start_cell_text: None,
        }
    }

    /// 対象シートを名前で指定する
    pub fn with_sheet(mut self, name: impl Into<String>) -> Self {
        self.config.sheet = Some(name.into());
        self
    }

    /// 指定シートが存在しない場合に先頭のシートへフォールバックする
    pub fn fallback_to_first_sheet(mut self, fallback: bool) -> Self {
        self.config.fallback_to_first_sheet = fallback;
        self
    }

    /// ヘッダー行の開始セルをA1形式で指定する
    ///
    /// 指定した場合、ヘッダー行の自動検出は行いません。
    /// 文字列の検証は`build()`時に行われます。
    pub fn with_start_cell(mut self, address: impl Into<String>) -> Self {
        self.start_cell_text = Some(address.into());
        self.config.start_cell = None;
        self
    }

    /// ヘッダー行の開始セルを座標で指定する
    pub fn with_start_address(mut self, address: CellAddress) -> Self {
        self.config.start_cell = Some(address);
        self.start_cell_text = None;
        self
    }

    /// 抽出する列名を指定する
    ///
    /// 列名は大文字・小文字を区別せずにヘッダーと照合され、指定した順に出力されます。
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// 日付形式を指定する
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.config.date_format = format;
        self
    }

    /// Markdownテーブルのレイアウトを指定する
    pub fn with_table_layout(mut self, layout: TableLayout) -> Self {
        self.config.table_layout = layout;
        self
    }

    /// 単一テーブル抽出の出力にメタデータを含める
    ///
    /// フィルタ抽出の文書には常にメタデータが含まれます。
    pub fn include_metadata(mut self, include: bool) -> Self {
        self.config.include_metadata = include;
        self
    }

    /// 一括変換の対象シートを選択する
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// 入力ファイルの最大サイズ（バイト）を指定する
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.max_input_size = bytes;
        self
    }

    /// 設定を検証し、`Extractor`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Extractor)`: 設定が有効な場合
    /// * `Err(XlsxTableError::MalformedAddress)`: 開始セルの形式が不正な場合
    /// * `Err(XlsxTableError::Config)`: その他の設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * `XlsxTableError::Config(String)`
    ///   * 列名のリストが空
    ///   * カスタム日付形式が空、または不正な書式指定子を含む
    ///   * 入力サイズ上限が0
    pub fn build(mut self) -> Result<Extractor, XlsxTableError> {
        // 1. 開始セルの検証
        if let Some(text) = self.start_cell_text.take() {
            self.config.start_cell = Some(CellAddress::parse(&text)?);
        }

        // 2. 列名の検証
        if let Some(columns) = &self.config.columns {
            if columns.is_empty() {
                return Err(XlsxTableError::Config(
                    "Column list must not be empty (omit it to extract all columns)".to_string(),
                ));
            }
        }

        // 3. カスタム日付形式の検証
        if let DateFormat::Custom(ref format_str) = self.config.date_format {
            if format_str.is_empty()
                || StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error))
            {
                return Err(XlsxTableError::Config(format!(
                    "Invalid date format string: '{}'",
                    format_str
                )));
            }
        }

        // 4. 入力サイズ上限の検証
        if self.config.max_input_size == 0 {
            return Err(XlsxTableError::Config(
                "Maximum input size must be greater than 0".to_string(),
            ));
        }

        Ok(Extractor::new(self.config))
    }
}

/// 単一テーブル抽出の結果
#[derive(Debug, Clone)]
pub struct TableExtraction {
    /// シート名
    pub sheet: String,
    /// ヘッダー行の開始セル
    pub start: CellAddress,
    /// ヘッダー行
    pub headers: HeaderRow,
    /// 列の解決結果
    pub selection: ColumnSelection,
    /// 抽出した行
    pub table: ExtractedTable,
}

/// 抽出処理のファサード
///
/// シート内に埋め込まれたデータテーブルを検出してMarkdownに変換するための
/// メインエントリーポイントです。`ExtractorBuilder`で構築した設定に基づいて動作します。
///
/// 各呼び出しは入力を読み込んでシートのスナップショットを作り、その上で計算します。
/// 呼び出し間で共有する可変状態はありません。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use xlsxtable::ExtractorBuilder;
///
/// # fn main() -> Result<(), xlsxtable::XlsxTableError> {
/// let extractor = ExtractorBuilder::new().with_columns(["Name", "Job"]).build()?;
/// let markdown = extractor.extract_to_markdown(File::open("report.xlsx")?)?;
/// println!("{}", markdown);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Extractor {
    /// 抽出設定
    config: ExtractionConfig,

    /// Markdownレンダラー
    renderer: MarkdownRenderer,
}

impl Extractor {
    pub(crate) fn new(config: ExtractionConfig) -> Self {
        Self {
            renderer: MarkdownRenderer::new(config.table_layout),
            config,
        }
    }

    fn open_source<R: Read>(&self, input: R) -> Result<WorkbookSource, XlsxTableError> {
        WorkbookSource::open_with(
            input,
            &SecurityConfig::with_max_input_size(self.config.max_input_size),
            self.config.date_format.clone(),
        )
    }

    fn load_grid(&self, source: &mut WorkbookSource) -> Result<SheetGrid, XlsxTableError> {
        let sheet = self.config.sheet.as_deref();
        if self.config.fallback_to_first_sheet {
            source.open_grid_or_first(sheet)
        } else {
            source.open_grid(sheet)
        }
    }

    /// ヘッダー行の位置を決める（指定があればそのまま、なければ自動検出）
    fn header_start<G: CellGrid + ?Sized>(&self, grid: &G) -> Result<CellAddress, XlsxTableError> {
        match self.config.start_cell {
            Some(start) => Ok(start),
            None => {
                let start = locate_header(grid)?;
                log::info!("Found data table in '{}' starting at {}", grid.name(), start);
                Ok(start)
            }
        }
    }

    fn resolve<G: CellGrid + ?Sized>(
        &self,
        grid: &G,
    ) -> Result<(CellAddress, HeaderRow, ColumnSelection), XlsxTableError> {
        let start = self.header_start(grid)?;
        let headers = extract_headers(grid, start);
        log::info!("Found headers: {:?}", headers.names());
        let selection = resolve_columns(&headers, self.config.columns.as_deref())?;
        Ok((start, headers, selection))
    }

    /// 入力からデータテーブルを抽出する
    ///
    /// # 引数
    ///
    /// * `input` - スプレッドシートを読み込むためのリーダー
    ///
    /// # 戻り値
    ///
    /// * `Ok(TableExtraction)` - 抽出結果（0行の場合を含む）
    /// * `Err(XlsxTableError)` - 読み込み、ヘッダー検出、列の解決のいずれかに失敗した場合
    pub fn extract<R: Read>(&self, input: R) -> Result<TableExtraction, XlsxTableError> {
        let mut source = self.open_source(input)?;
        let grid = self.load_grid(&mut source)?;
        self.extract_from_grid(&grid)
    }

    /// シートのスナップショットからデータテーブルを抽出する
    pub fn extract_from_grid<G: CellGrid + ?Sized>(
        &self,
        grid: &G,
    ) -> Result<TableExtraction, XlsxTableError> {
        let (start, headers, selection) = self.resolve(grid)?;
        let table = extract_table(grid, &headers, &selection);
        Ok(TableExtraction {
            sheet: grid.name().to_string(),
            start,
            headers,
            selection,
            table,
        })
    }

    /// 抽出結果をMarkdownに変換する
    pub fn render(&self, extraction: &TableExtraction) -> String {
        if !self.config.include_metadata {
            return self.renderer.render(&extraction.table, None);
        }

        let mut metadata = vec![
            ("Sheet".to_string(), extraction.sheet.clone()),
            (
                "Data source starting cell".to_string(),
                extraction.start.to_string(),
            ),
            (
                "Total rows".to_string(),
                extraction.table.len().to_string(),
            ),
            (
                "Columns included".to_string(),
                extraction.table.columns().join(", "),
            ),
        ];
        if !extraction.selection.unresolved().is_empty() {
            metadata.push((
                "Columns not found".to_string(),
                extraction.selection.unresolved().join(", "),
            ));
        }
        self.renderer.render(&extraction.table, Some(&metadata))
    }

    /// 入力からデータテーブルを抽出し、Markdownに変換する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use std::fs::File;
    /// use xlsxtable::ExtractorBuilder;
    ///
    /// # fn main() -> Result<(), xlsxtable::XlsxTableError> {
    /// let extractor = ExtractorBuilder::new()
    ///     .with_sheet("Sheet1")
    ///     .with_columns(["Name", "Age"])
    ///     .build()?;
    /// let markdown = extractor.extract_to_markdown(File::open("input.xlsx")?)?;
    /// std::fs::write("output.md", markdown)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn extract_to_markdown<R: Read>(&self, input: R) -> Result<String, XlsxTableError> {
        let extraction = self.extract(input)?;
        Ok(self.render(&extraction))
    }

    /// 主キー列の値で行を振り分け、キーごとの文書を生成する
    ///
    /// 一致行のないキーは`NoMatchingRows`として記録され、処理は残りのキーについて続行します。
    ///
    /// # 引数
    ///
    /// * `input` - スプレッドシートを読み込むためのリーダー
    /// * `primary_column` - 比較に使う列名
    /// * `mapping` - 出力キーと対象値の対応
    ///
    /// # 戻り値
    ///
    /// * `Ok(FilterOutcome)` - キーごとの結果
    /// * `Err(XlsxTableError::PrimaryColumnNotFound)` - 主キー列がヘッダーにない場合
    /// * `Err(XlsxTableError)` - 読み込み、ヘッダー検出、列の解決に失敗した場合
    pub fn filter_by_keys<R: Read>(
        &self,
        input: R,
        primary_column: &str,
        mapping: &KeyValueMapping,
    ) -> Result<FilterOutcome, XlsxTableError> {
        let mut source = self.open_source(input)?;
        let grid = self.load_grid(&mut source)?;
        self.filter_grid(&grid, primary_column, mapping)
    }

    /// シートのスナップショットに対してフィルタ抽出を行う
    pub fn filter_grid<G: CellGrid + ?Sized>(
        &self,
        grid: &G,
        primary_column: &str,
        mapping: &KeyValueMapping,
    ) -> Result<FilterOutcome, XlsxTableError> {
        log::info!("Processing {} filter value(s)", mapping.len());
        let (start, headers, selection) = self.resolve(grid)?;
        let criterion = FilterCriterion::new(primary_column, mapping.clone());
        let keyed = extract_filtered(grid, &headers, &selection, &criterion)?;

        let keys = keyed
            .into_iter()
            .map(|keyed| {
                let result = if keyed.table.is_empty() {
                    let error = XlsxTableError::NoMatchingRows {
                        key: keyed.key.clone(),
                        column: primary_column.to_string(),
                        value: keyed.target.clone(),
                    };
                    log::warn!("{}", error);
                    Err(error)
                } else {
                    Ok(self
                        .renderer
                        .render_filtered(&keyed, primary_column, start, true))
                };
                KeyOutcome {
                    key: keyed.key,
                    result,
                }
            })
            .collect();

        let outcome = FilterOutcome {
            primary_column: primary_column.to_string(),
            keys,
        };
        log::info!(
            "{}/{} filter(s) matched at least one row",
            outcome.succeeded(),
            outcome.total()
        );
        Ok(outcome)
    }

    /// すべてのシートをセル参照付きのMarkdownに変換する
    ///
    /// 対象シートは`with_sheet_selector`で選択します。シートの読み込みは順に行い、
    /// Markdownの生成はシートごとに並列で行います。結果はワークブック内の順序です。
    pub fn convert_all_sheets<R: Read>(&self, input: R) -> Result<Vec<SheetDump>, XlsxTableError> {
        let mut source = self.open_source(input)?;
        let sheet_names = source.select_sheets(&self.config.sheet_selector)?;

        let grids = sheet_names
            .iter()
            .map(|name| source.open_grid(Some(name)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.dump_grids(&grids))
    }

    /// シートのスナップショット群をセル参照付きのMarkdownに変換する
    pub fn dump_grids(&self, grids: &[SheetGrid]) -> Vec<SheetDump> {
        let dumps: Vec<SheetDump> = grids
            .par_iter()
            .map(|grid| SheetDump {
                name: grid.name().to_string(),
                markdown: self.renderer.render_sheet_dump(grid),
            })
            .collect();
        log::info!("Converted {} sheet(s)", dumps.len());
        dumps
    }

    /// すべてのシートを1つのMarkdown文字列に変換する
    ///
    /// シート間は水平線（`---`）で区切ります。
    pub fn convert_all_sheets_to_string<R: Read>(&self, input: R) -> Result<String, XlsxTableError> {
        let dumps = self.convert_all_sheets(input)?;
        Ok(dumps
            .iter()
            .map(|d| d.markdown.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n\n"))
    }
}
