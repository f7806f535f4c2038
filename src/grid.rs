//! Grid Module
//!
//! シートのセルを読み取り専用で参照するための`CellGrid`トレイトと、
//! その稠密なスナップショット実装である`SheetGrid`を提供するモジュール。
//!
//! 座標はシート上の絶対位置（1始まり）です。抽出処理はスナップショットを
//! 受け取って計算するだけで、グリッドを変更しません。

use calamine::{Data, Range};

use crate::formatter::CellFormatter;
use crate::types::{CellAddress, CellValue};

/// シートのセル格子への読み取り専用ビュー
///
/// スプレッドシートの読み込み側が実装する能力（capability）です。
/// 範囲外、または空のセルに対して`cell_at`は`None`を返します。
pub trait CellGrid {
    /// シート名
    fn name(&self) -> &str;

    /// 最終行（1始まり、空のシートでは0）
    fn max_row(&self) -> u32;

    /// 最終列（1始まり、空のシートでは0）
    fn max_column(&self) -> u32;

    /// 指定座標のセル値
    fn cell_at(&self, row: u32, col: u32) -> Option<&CellValue>;

    /// 指定座標のセル値を文字列化したもの（トリムなし）
    fn text_at(&self, row: u32, col: u32) -> Option<String> {
        self.cell_at(row, col)
            .map(|value| CellFormatter::default().format_value(value))
    }
}

/// メモリ上に展開されたシートのスナップショット
#[derive(Debug, Clone)]
pub struct SheetGrid {
    /// シート名
    name: String,

    /// 行データ（`rows[0]`が1行目）
    rows: Vec<Vec<CellValue>>,

    /// 最終列
    max_column: u32,

    /// 文字列化に使用するフォーマッター
    formatter: CellFormatter,
}

impl SheetGrid {
    /// 行データからグリッドを構築
    ///
    /// `rows[0]`が1行目、各行の`[0]`がA列になります。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxtable::{CellGrid, CellValue, SheetGrid};
    ///
    /// let grid = SheetGrid::from_rows(
    ///     "Sheet1",
    ///     vec![
    ///         vec!["Report".into()],
    ///         vec!["Name".into(), "Age".into()],
    ///         vec!["Alice".into(), CellValue::Number(30.0)],
    ///     ],
    /// );
    /// assert_eq!(grid.max_row(), 3);
    /// assert_eq!(grid.max_column(), 2);
    /// assert_eq!(grid.text_at(3, 2).as_deref(), Some("30"));
    /// ```
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let max_column = rows.iter().map(|row| row.len()).max().unwrap_or(0) as u32;
        Self {
            name: name.into(),
            rows,
            max_column,
            formatter: CellFormatter::default(),
        }
    }

    /// calamineの範囲から構築（内部用）
    ///
    /// calamineの範囲は最初の使用セルから始まるため、絶対座標に展開し直します。
    pub(crate) fn from_range(name: &str, range: &Range<Data>, formatter: CellFormatter) -> Self {
        let (start, end) = match (range.start(), range.end()) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Self {
                    name: name.to_string(),
                    rows: Vec::new(),
                    max_column: 0,
                    formatter,
                }
            }
        };

        let max_row = end.0 as usize + 1;
        let max_column = end.1 + 1;
        let mut rows = vec![Vec::new(); max_row];

        for (rel_row, row) in range.rows().enumerate() {
            let abs_row = start.0 as usize + rel_row;
            let target = &mut rows[abs_row];
            for (rel_col, cell) in row.iter().enumerate() {
                let value = CellFormatter::convert(cell);
                if value.is_empty() {
                    continue;
                }
                let abs_col = start.1 as usize + rel_col;
                if target.len() <= abs_col {
                    target.resize(abs_col + 1, CellValue::Empty);
                }
                target[abs_col] = value;
            }
        }

        Self {
            name: name.to_string(),
            rows,
            max_column,
            formatter,
        }
    }

    /// 文字列化に使用するフォーマッターを差し替える
    #[cfg(test)]
    pub(crate) fn with_formatter(mut self, formatter: CellFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// 値のあるセルを行優先の順に列挙
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &CellValue)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, value)| !value.is_empty())
                .map(move |(c, value)| (CellAddress::new(r as u32 + 1, c as u32 + 1), value))
        })
    }

    /// 使用されている最後のセル
    pub fn last_cell(&self) -> Option<CellAddress> {
        if self.rows.is_empty() || self.max_column == 0 {
            None
        } else {
            Some(CellAddress::new(self.max_row(), self.max_column))
        }
    }
}

impl CellGrid for SheetGrid {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_row(&self) -> u32 {
        self.rows.len() as u32
    }

    fn max_column(&self) -> u32 {
        self.max_column
    }

    fn cell_at(&self, row: u32, col: u32) -> Option<&CellValue> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|cells| cells.get(col as usize - 1))
            .filter(|value| !value.is_empty())
    }

    fn text_at(&self, row: u32, col: u32) -> Option<String> {
        self.cell_at(row, col)
            .map(|value| self.formatter.format_value(value))
    }
}
