//! Header Mapper
//!
//! ヘッダー行の読み取りと、要求された論理列名から物理列位置への対応付け。

use crate::error::XlsxTableError;
use crate::grid::CellGrid;
use crate::types::CellAddress;

/// ヘッダー行
///
/// 開始列から右方向に読み取った列名の並び（トリム済み）。
/// 空文字列は空のヘッダーセルを表します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    start: CellAddress,
    names: Vec<String>,
}

impl HeaderRow {
    /// ヘッダー行の位置と列名から生成
    pub fn new(start: CellAddress, names: Vec<String>) -> Self {
        Self { start, names }
    }

    /// ヘッダー行の開始セル
    pub fn start(&self) -> CellAddress {
        self.start
    }

    /// 列名の並び
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 空でない列名の一覧（エラーメッセージ用）
    pub fn available(&self) -> Vec<String> {
        self.names.iter().filter(|n| !n.is_empty()).cloned().collect()
    }

    /// 大文字・小文字を区別せず完全一致する最初の列のインデックス
    ///
    /// 空のヘッダーセルには一致しません。
    pub fn find(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.names
            .iter()
            .position(|header| !header.is_empty() && header.to_lowercase() == wanted)
    }

    /// ヘッダー内インデックスに対応するシート上の列番号（1始まり）
    pub fn physical_column(&self, index: usize) -> u32 {
        self.start.col + index as u32
    }
}

/// ヘッダー行を読み取る
///
/// `start`の行で`start.col`から最終列までを読み、各セルのトリム済み文字列を追加します。
/// 空でないヘッダーを1つ以上読んだ後に空セルが現れた時点で終了します。
/// それより前の空セルは空文字列として保持されます。
pub fn extract_headers<G: CellGrid + ?Sized>(grid: &G, start: CellAddress) -> HeaderRow {
    let mut names = Vec::new();
    let mut seen_named = false;

    for col in start.col..=grid.max_column() {
        let text = grid
            .text_at(start.row, col)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            if seen_named {
                break;
            }
        } else {
            seen_named = true;
        }
        names.push(text);
    }

    // 名前付きの列が1つもなければ、先頭の空セルだけが残る
    if !seen_named {
        names.clear();
    }

    HeaderRow::new(start, names)
}

/// 解決済みの列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// 呼び出し側が要求した列名
    pub requested: String,
    /// ヘッダー行上の実際の列名
    pub header: String,
    /// ヘッダー行内のインデックス（0始まり）
    pub index: usize,
}

/// 要求された列名とヘッダー内の位置の対応
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    resolved: Vec<ResolvedColumn>,
    unresolved: Vec<String>,
}

impl ColumnSelection {
    /// 解決できた列（要求順）
    pub fn resolved(&self) -> &[ResolvedColumn] {
        &self.resolved
    }

    /// 解決できなかった列名
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// 解決済み列のヘッダー内インデックス
    pub fn indices(&self) -> Vec<usize> {
        self.resolved.iter().map(|c| c.index).collect()
    }

    /// 出力テーブルの列名（ヘッダー行の表記）
    pub fn headers(&self) -> Vec<String> {
        self.resolved.iter().map(|c| c.header.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// 要求された列名をヘッダー内の位置に解決する
///
/// `requested`が`None`の場合は空でないヘッダーをすべて順に選択します。
/// それ以外は各列名について大文字・小文字を区別しない完全一致で最初の列を探し、
/// 見つからない列名は`unresolved`に記録します。
///
/// # 戻り値
///
/// * `Err(XlsxTableError::NoColumnsResolved)` - 解決できた列が1つもない場合
pub fn resolve_columns(
    headers: &HeaderRow,
    requested: Option<&[String]>,
) -> Result<ColumnSelection, XlsxTableError> {
    let selection = match requested {
        None => ColumnSelection {
            resolved: headers
                .names()
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(index, name)| ResolvedColumn {
                    requested: name.clone(),
                    header: name.clone(),
                    index,
                })
                .collect(),
            unresolved: Vec::new(),
        },
        Some(requested) => {
            let mut resolved = Vec::new();
            let mut unresolved = Vec::new();
            for name in requested {
                match headers.find(name) {
                    Some(index) => resolved.push(ResolvedColumn {
                        requested: name.clone(),
                        header: headers.names()[index].clone(),
                        index,
                    }),
                    None => unresolved.push(name.clone()),
                }
            }
            ColumnSelection {
                resolved,
                unresolved,
            }
        }
    };

    if !selection.unresolved.is_empty() {
        log::warn!(
            "Columns not found: {:?} (available: {:?})",
            selection.unresolved,
            headers.available()
        );
    }

    if selection.is_empty() {
        return Err(XlsxTableError::NoColumnsResolved {
            requested: requested.map(|r| r.to_vec()).unwrap_or_default(),
            available: headers.available(),
        });
    }

    Ok(selection)
}
