//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//! セル値、A1記法のセル座標（1始まり）、セル範囲を扱います。

use std::fmt;
use std::str::FromStr;

use crate::error::XlsxTableError;

/// セルの値を表す列挙型
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    Text(String),

    /// 論理値
    Bool(bool),

    /// 日付・時刻（Excelのシリアル値、1900年エポック）
    ///
    /// 1904年エポックのブックは読み込み時に1900年エポックへ換算されます。
    DateTime(f64),

    /// 経過時間（日数、`[h]:mm:ss`書式のセル）
    Duration(f64),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    #[default]
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// 数値として解釈できる場合はその値を返す
    ///
    /// 文字列は前後の空白を除いて`f64`としてパースを試みます。
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) | CellValue::DateTime(n) | CellValue::Duration(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// セル座標（1始まり）
///
/// A1記法と相互変換できます（"A1" ⇄ (1, 1)、"AA10" ⇄ (10, 27)）。
/// 列文字は0の桁を持たない26進数です（A=1 … Z=26, AA=27 …）。
///
/// # 使用例
///
/// ```rust
/// use xlsxtable::CellAddress;
///
/// let addr: CellAddress = "aa10".parse().unwrap();
/// assert_eq!((addr.row, addr.col), (10, 27));
/// assert_eq!(addr.to_string(), "AA10");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1記法の文字列をパースする
    ///
    /// 先頭の英字の並び（列）と末尾の数字の並び（行）に分割します。
    /// どちらかが空、`[A-Za-z0-9]`以外の文字を含む、英字と数字が交互に現れる、
    /// 行または列が0、`u32`に収まらない場合は`MalformedAddress`を返します。
    pub fn parse(address: &str) -> Result<Self, XlsxTableError> {
        let malformed = |reason: &str| XlsxTableError::MalformedAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        if let Some(ch) = address.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(malformed(&format!("unexpected character '{}'", ch)));
        }

        let split = address
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(address.len());
        let (letters, digits) = address.split_at(split);

        if letters.is_empty() {
            return Err(malformed("missing column letters"));
        }
        if digits.is_empty() {
            return Err(malformed("missing row number"));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("letters after row number"));
        }

        let col = column_index(letters).ok_or_else(|| malformed("column out of range"))?;
        let row: u32 = digits
            .parse()
            .map_err(|_| malformed("row out of range"))?;
        if row == 0 {
            return Err(malformed("row numbers start at 1"));
        }

        Ok(Self { row, col })
    }

    /// 0始まりの(row, col)に変換（ライターAPI向け）
    pub fn zero_based(&self) -> (u32, u32) {
        (self.row.saturating_sub(1), self.col.saturating_sub(1))
    }
}

impl fmt::Display for CellAddress {
    /// 大文字の正規形で出力（例: (10, 27) -> "AA10"）
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl FromStr for CellAddress {
    type Err = XlsxTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 列文字を1始まりの列番号に変換（"A" -> 1, "AA" -> 27）
///
/// 大文字・小文字は区別しません。空文字列やオーバーフローの場合は`None`。
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.bytes().try_fold(0u32, |acc, b| {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let digit = (b.to_ascii_uppercase() - b'A' + 1) as u32;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// 1始まりの列番号を列文字に変換（1 -> "A", 26 -> "Z", 27 -> "AA"）
pub fn column_letters(mut col: u32) -> String {
    let mut result = Vec::new();
    while col > 0 {
        let remainder = (col - 1) % 26;
        result.push(b'A' + remainder as u8);
        col = (col - 1) / 26;
    }
    result.reverse();
    String::from_utf8(result).unwrap_or_default()
}

/// セル範囲（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// 新しい範囲を生成
    ///
    /// 開始・終了の順序は正規化されます（左上が`start`）。
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// "A1:C10"形式の範囲をパースする（単一セル"B2"も可）
    pub fn parse(range: &str) -> Result<Self, XlsxTableError> {
        match range.split_once(':') {
            Some((start, end)) => Ok(Self::new(
                CellAddress::parse(start)?,
                CellAddress::parse(end)?,
            )),
            None => {
                let cell = CellAddress::parse(range)?;
                Ok(Self::new(cell, cell))
            }
        }
    }

    /// 指定された座標が範囲内にあるかを判定
    pub fn contains(&self, addr: CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// 範囲のサイズ（行数 × 列数）を計算
    pub fn size(&self) -> (u32, u32) {
        (
            self.end.row - self.start.row + 1,
            self.end.col - self.start.col + 1,
        )
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for CellRange {
    type Err = XlsxTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
