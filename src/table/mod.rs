//! Table Module
//!
//! シート内に埋め込まれたデータテーブルを検出・抽出するモジュール。
//!
//! 処理の流れ:
//! 1. `locate_header` でヘッダー行の位置を探す（開始セル指定時は省略）
//! 2. `extract_headers` / `resolve_columns` で要求列を物理列に対応付ける
//! 3. `extract_table` または `extract_filtered` でデータ行を取り出す
//!
//! すべての関数は`CellGrid`のスナップショットを読むだけの純粋な計算です。

mod extract;
mod filter;
mod header;
mod locator;

pub use extract::{extract_table, ExtractedTable};
pub use filter::{extract_filtered, FilterCriterion, KeyValueMapping, KeyedTable};
pub use header::{extract_headers, resolve_columns, ColumnSelection, HeaderRow, ResolvedColumn};
pub use locator::locate_header;

use crate::grid::CellGrid;

/// ヘッダー行の次の行からシートの最終行までの行番号
///
/// ヘッダー行が`u32::MAX`の場合は空になります。
pub(crate) fn data_rows<G: CellGrid + ?Sized>(
    grid: &G,
    headers: &HeaderRow,
) -> impl Iterator<Item = u32> {
    let last = grid.max_row();
    headers
        .start()
        .row
        .checked_add(1)
        .into_iter()
        .flat_map(move |first| first..=last)
}

/// セルがトリム後に空でない値を持つかどうか
pub(crate) fn is_populated<G: CellGrid + ?Sized>(grid: &G, row: u32, col: u32) -> bool {
    grid.text_at(row, col)
        .map_or(false, |text| !text.trim().is_empty())
}

/// セルのトリム済み文字列（空セルは空文字列）
pub(crate) fn trimmed_text<G: CellGrid + ?Sized>(grid: &G, row: u32, col: u32) -> String {
    grid.text_at(row, col)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}
