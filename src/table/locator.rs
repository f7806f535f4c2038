//! Header Locator
//!
//! タイトルや空行の後ろに埋め込まれたデータテーブルのヘッダー行を探す。

use crate::error::XlsxTableError;
use crate::grid::CellGrid;
use crate::types::CellAddress;

use super::is_populated;

/// ヘッダー行と判定するのに必要な非空セル数
const MIN_POPULATED_CELLS: u32 = 2;

/// ヘッダー行と判定するのに必要な連続した非空セル数
const MIN_CONSECUTIVE_CELLS: u32 = 2;

/// 1行分の密度統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RowDensity {
    /// トリム後に空でないセルの数
    pub populated: u32,
    /// 連続した非空セルの最長の並び
    pub longest_run: u32,
}

impl RowDensity {
    /// 行を走査して統計を取る
    pub fn measure<G: CellGrid + ?Sized>(grid: &G, row: u32) -> Self {
        let mut density = RowDensity::default();
        let mut run = 0;
        for col in 1..=grid.max_column() {
            if is_populated(grid, row, col) {
                density.populated += 1;
                run += 1;
                density.longest_run = density.longest_run.max(run);
            } else {
                run = 0;
            }
        }
        density
    }

    /// ヘッダー行らしいかどうか
    pub fn looks_like_header(&self) -> bool {
        self.populated >= MIN_POPULATED_CELLS && self.longest_run >= MIN_CONSECUTIVE_CELLS
    }
}

/// ヘッダー行の位置を探す
///
/// 1行目から順に走査し、非空セルが2つ以上かつ隣接する非空セルが2つ以上並ぶ
/// 最初の行を`(row, 1)`として返します。左端に孤立したタイトルセルだけの行は
/// 連続性の条件を満たさないため読み飛ばされます。
///
/// ヒューリスティックであり、曖昧なシートでは誤検出があり得ます。
/// 呼び出し側は開始セルを明示してこの処理を省略できます。
///
/// # 戻り値
///
/// * `Ok(CellAddress)` - ヘッダー行の位置（列は常に1）
/// * `Err(XlsxTableError::TableNotFound)` - 条件を満たす行がない場合
pub fn locate_header<G: CellGrid + ?Sized>(grid: &G) -> Result<CellAddress, XlsxTableError> {
    for row in 1..=grid.max_row() {
        let density = RowDensity::measure(grid, row);
        if density.looks_like_header() {
            log::debug!(
                "Header candidate in '{}' at row {} ({} cells, run of {})",
                grid.name(),
                row,
                density.populated,
                density.longest_run
            );
            return Ok(CellAddress::new(row, 1));
        }
    }

    Err(XlsxTableError::TableNotFound {
        sheet: grid.name().to_string(),
        rows_scanned: grid.max_row(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SheetGrid;
    use crate::types::CellValue;

    fn grid(rows: Vec<Vec<&str>>) -> SheetGrid {
        SheetGrid::from_rows(
            "Sheet1",
            rows.into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|s| {
                            if s.is_empty() {
                                CellValue::Empty
                            } else {
                                CellValue::from(s)
                            }
                        })
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn test_skips_title_rows() {
        let g = grid(vec![
            vec!["Report"],
            vec!["", "", "Generated 2024"],
            vec!["Q1", "", "Q2"],
            vec![],
            vec![],
            vec!["Name", "Age", "Job"],
            vec!["Alice", "30", "Engineer"],
        ]);
        assert_eq!(locate_header(&g).unwrap(), CellAddress::new(6, 1));
    }

    #[test]
    fn test_header_not_starting_in_column_a() {
        let g = grid(vec![vec!["Title"], vec!["", "", "Name", "Age"]]);
        assert_eq!(locate_header(&g).unwrap(), CellAddress::new(2, 1));
    }

    #[test]
    fn test_whitespace_cells_are_blank() {
        let g = grid(vec![vec!["Title", "   "], vec!["Name", "Age"]]);
        assert_eq!(locate_header(&g).unwrap(), CellAddress::new(2, 1));
    }

    #[test]
    fn test_not_found() {
        let g = grid(vec![vec!["Only"], vec!["", "Scattered", "", "Cells"]]);
        match locate_header(&g) {
            Err(XlsxTableError::TableNotFound {
                sheet,
                rows_scanned,
            }) => {
                assert_eq!(sheet, "Sheet1");
                assert_eq!(rows_scanned, 2);
            }
            other => panic!("expected TableNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_sheet_is_not_found() {
        let g = SheetGrid::from_rows("Empty", Vec::new());
        assert!(matches!(
            locate_header(&g),
            Err(XlsxTableError::TableNotFound { .. })
        ));
    }

    #[test]
    fn test_row_density() {
        let g = grid(vec![vec!["a", "", "b", "c", "d", "", "e"]]);
        let density = RowDensity::measure(&g, 1);
        assert_eq!(density.populated, 5);
        assert_eq!(density.longest_run, 3);
        assert!(density.looks_like_header());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_row() -> impl Strategy<Value = Vec<bool>> {
            proptest::collection::vec(any::<bool>(), 0..8)
        }

        fn build(mask: &[Vec<bool>]) -> SheetGrid {
            SheetGrid::from_rows(
                "P",
                mask.iter()
                    .map(|row| {
                        row.iter()
                            .map(|&filled| {
                                if filled {
                                    CellValue::from("x")
                                } else {
                                    CellValue::Empty
                                }
                            })
                            .collect()
                    })
                    .collect(),
            )
        }

        proptest! {
            #[test]
            fn test_locate_is_deterministic(mask in proptest::collection::vec(arb_row(), 0..12)) {
                let g = build(&mask);
                let first = locate_header(&g).ok();
                let second = locate_header(&g).ok();
                prop_assert_eq!(first, second);
            }

            #[test]
            fn test_first_adjacent_pair_row_is_returned(mask in proptest::collection::vec(arb_row(), 0..12)) {
                let g = build(&mask);
                let expected = mask
                    .iter()
                    .position(|row| row.windows(2).any(|w| w[0] && w[1]))
                    .map(|idx| CellAddress::new(idx as u32 + 1, 1));
                prop_assert_eq!(locate_header(&g).ok(), expected);
            }

            #[test]
            fn test_single_cell_rows_never_returned(cols in proptest::collection::vec(0usize..6, 1..10)) {
                let mask: Vec<Vec<bool>> = cols
                    .iter()
                    .map(|&c| (0..6).map(|i| i == c).collect())
                    .collect();
                let g = build(&mask);
                prop_assert!(locate_header(&g).is_err());
            }
        }
    }
}
