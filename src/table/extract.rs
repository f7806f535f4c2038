//! Table Extractor
//!
//! ヘッダー行に続くデータ行を、解決済みの列だけ取り出す。

use crate::grid::CellGrid;

use super::header::{ColumnSelection, HeaderRow};
use super::{data_rows, trimmed_text};

/// 抽出されたテーブル
///
/// すべての行は列数と同じ数のセルを持ち、シート上の行順に並びます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    row_numbers: Vec<u32>,
}

impl ExtractedTable {
    /// 空のテーブルを生成
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            row_numbers: Vec::new(),
        }
    }

    /// 行を追加
    ///
    /// セル数が列数と異なる場合は空文字列で補うか切り詰めます。
    pub fn push_row(&mut self, row_number: u32, mut cells: Vec<String>) {
        cells.resize(self.columns.len(), String::new());
        self.rows.push(cells);
        self.row_numbers.push(row_number);
    }

    /// 列名
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// データ行
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// 各データ行のシート上の行番号（1始まり）
    pub fn row_numbers(&self) -> &[u32] {
        &self.row_numbers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// 解決済みの列についてデータ行を抽出する（フィルタなし）
///
/// ヘッダー行の次の行から最終行まで走査します。解決済みの列のいずれかに
/// 値があれば行を取り込み、すべて空の行が現れた時点でテーブルの終端とみなします。
/// ただし、まだ1行も取り込んでいない間の空行は読み飛ばします
/// （ヘッダー直下の空白行を許容するため）。
///
/// # 引数
///
/// * `grid` - シートのスナップショット
/// * `headers` - ヘッダー行
/// * `selection` - 解決済みの列
pub fn extract_table<G: CellGrid + ?Sized>(
    grid: &G,
    headers: &HeaderRow,
    selection: &ColumnSelection,
) -> ExtractedTable {
    let physical: Vec<u32> = selection
        .indices()
        .into_iter()
        .map(|index| headers.physical_column(index))
        .collect();
    let mut table = ExtractedTable::new(selection.headers());

    for row in data_rows(grid, headers) {
        let has_value = physical
            .iter()
            .any(|&col| grid.cell_at(row, col).is_some());

        if !has_value {
            if table.is_empty() {
                continue;
            }
            log::debug!("Table in '{}' ends before row {}", grid.name(), row);
            break;
        }

        let cells = physical
            .iter()
            .map(|&col| trimmed_text(grid, row, col))
            .collect();
        table.push_row(row, cells);
    }

    log::info!(
        "Extracted {} rows x {} columns from '{}'",
        table.len(),
        table.column_count(),
        grid.name()
    );
    table
}
