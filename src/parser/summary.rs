//! Workbook Summary
//!
//! ワークブックの構造（シート、寸法、結合セル）と範囲読み込みの結果型。

use serde::Serialize;

use crate::grid::{CellGrid, SheetGrid};
use crate::types::{CellAddress, CellRange};

/// プレビュー時に返す最大行数
pub const PREVIEW_ROWS: usize = 10;

/// ワークブックの概要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkbookSummary {
    /// シートごとの概要（ワークブック内の順序）
    pub sheets: Vec<SheetSummary>,
}

/// シートの概要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    /// シート名
    pub name: String,
    /// 最終行
    pub max_row: u32,
    /// 最終列
    pub max_column: u32,
    /// データ範囲（`A1:<最終セル>`、空のシートでは`None`）
    pub data_range: Option<String>,
    /// 結合セル範囲
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_cells: Option<Vec<String>>,
    /// データの有無
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_data: Option<bool>,
}

impl SheetSummary {
    pub(crate) fn from_grid(grid: &SheetGrid) -> Self {
        Self {
            name: grid.name().to_string(),
            max_row: grid.max_row(),
            max_column: grid.max_column(),
            data_range: grid
                .last_cell()
                .map(|last| CellRange::new(CellAddress::new(1, 1), last).to_string()),
            merged_cells: None,
            has_data: None,
        }
    }
}

/// 範囲読み込みの結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeData {
    /// シート名
    pub sheet: String,
    /// 読み込んだ範囲（`A1:C10`形式）
    pub range: String,
    /// セル値（空セルは空文字列）
    pub rows: Vec<Vec<String>>,
    /// プレビューで行を省略したかどうか
    pub truncated: bool,
}

impl RangeData {
    /// グリッドから範囲を読み込む
    ///
    /// `end`が`None`の場合はシートの最終セル（空のシートでは`start`）までを読みます。
    pub(crate) fn from_grid<G: CellGrid + ?Sized>(
        grid: &G,
        start: CellAddress,
        end: Option<CellAddress>,
        row_limit: Option<usize>,
    ) -> Self {
        let end = end.unwrap_or_else(|| {
            CellAddress::new(grid.max_row().max(start.row), grid.max_column().max(start.col))
        });
        let range = CellRange::new(start, end);
        let total_rows = (range.end.row - range.start.row + 1) as usize;
        let take = row_limit.map_or(total_rows, |limit| limit.min(total_rows));

        let rows = (range.start.row..=range.end.row)
            .take(take)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| grid.text_at(row, col).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self {
            sheet: grid.name().to_string(),
            range: range.to_string(),
            rows,
            truncated: take < total_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn numbered(rows: u32) -> SheetGrid {
        SheetGrid::from_rows(
            "Numbers",
            (1..=rows)
                .map(|i| vec![CellValue::Number(i as f64), CellValue::from(format!("r{}", i))])
                .collect(),
        )
    }

    #[test]
    fn test_summary_from_grid() {
        let summary = SheetSummary::from_grid(&numbered(4));
        assert_eq!(summary.max_row, 4);
        assert_eq!(summary.max_column, 2);
        assert_eq!(summary.data_range.as_deref(), Some("A1:B4"));
    }

    #[test]
    fn test_read_range_explicit_end() {
        let data = RangeData::from_grid(
            &numbered(5),
            CellAddress::new(2, 1),
            Some(CellAddress::new(3, 2)),
            None,
        );
        assert_eq!(data.range, "A2:B3");
        assert_eq!(
            data.rows,
            vec![
                vec!["2".to_string(), "r2".to_string()],
                vec!["3".to_string(), "r3".to_string()]
            ]
        );
        assert!(!data.truncated);
    }

    #[test]
    fn test_read_range_preview_limits_rows() {
        let data = RangeData::from_grid(&numbered(25), CellAddress::new(1, 1), None, Some(PREVIEW_ROWS));
        assert_eq!(data.range, "A1:B25");
        assert_eq!(data.rows.len(), 10);
        assert!(data.truncated);
    }

    #[test]
    fn test_read_range_outside_data_is_blank() {
        let data = RangeData::from_grid(
            &numbered(1),
            CellAddress::new(1, 2),
            Some(CellAddress::new(2, 3)),
            None,
        );
        assert_eq!(
            data.rows,
            vec![
                vec!["r1".to_string(), String::new()],
                vec![String::new(), String::new()]
            ]
        );
    }
}
