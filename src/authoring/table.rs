//! Worksheet Tables
//!
//! Excelのテーブル（ListObject）の定義と、組み込みスタイルの指定。

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rust_xlsxwriter::{Table, TableColumn, TableStyle};

use crate::error::XlsxTableError;
use crate::types::CellRange;

/// テーブルの組み込みスタイル
///
/// `TableStyleMedium9`や`Medium9`のような名前からパースできます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableTheme {
    None,
    /// `Light1`〜`Light21`
    Light(u8),
    /// `Medium1`〜`Medium28`
    Medium(u8),
    /// `Dark1`〜`Dark11`
    Dark(u8),
}

impl Default for TableTheme {
    fn default() -> Self {
        TableTheme::Medium(9)
    }
}

impl TableTheme {
    const EXPECTED: &'static str = "None, Light1-21, Medium1-28, Dark1-11";

    fn table_style(&self) -> Option<TableStyle> {
        use TableStyle as S;
        match *self {
            TableTheme::None => Some(TableStyle::None),
            TableTheme::Light(n) => [
                S::Light1, S::Light2, S::Light3, S::Light4, S::Light5, S::Light6, S::Light7,
                S::Light8, S::Light9, S::Light10, S::Light11, S::Light12, S::Light13, S::Light14,
                S::Light15, S::Light16, S::Light17, S::Light18, S::Light19, S::Light20, S::Light21,
            ]
            .into_iter()
            .nth((n as usize).checked_sub(1)?),
            TableTheme::Medium(n) => [
                S::Medium1, S::Medium2, S::Medium3, S::Medium4, S::Medium5, S::Medium6, S::Medium7,
                S::Medium8, S::Medium9, S::Medium10, S::Medium11, S::Medium12, S::Medium13,
                S::Medium14, S::Medium15, S::Medium16, S::Medium17, S::Medium18, S::Medium19,
                S::Medium20, S::Medium21, S::Medium22, S::Medium23, S::Medium24, S::Medium25,
                S::Medium26, S::Medium27, S::Medium28,
            ]
            .into_iter()
            .nth((n as usize).checked_sub(1)?),
            TableTheme::Dark(n) => [
                S::Dark1, S::Dark2, S::Dark3, S::Dark4, S::Dark5, S::Dark6, S::Dark7, S::Dark8,
                S::Dark9, S::Dark10, S::Dark11,
            ]
            .into_iter()
            .nth((n as usize).checked_sub(1)?),
        }
    }

    fn unknown(value: &str) -> XlsxTableError {
        XlsxTableError::UnknownVariant {
            kind: "table style",
            value: value.to_string(),
            expected: Self::EXPECTED,
        }
    }
}

impl fmt::Display for TableTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableTheme::None => f.write_str("None"),
            TableTheme::Light(n) => write!(f, "TableStyleLight{}", n),
            TableTheme::Medium(n) => write!(f, "TableStyleMedium{}", n),
            TableTheme::Dark(n) => write!(f, "TableStyleDark{}", n),
        }
    }
}

impl FromStr for TableTheme {
    type Err = XlsxTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("tablestyle").unwrap_or(&lower);
        if name == "none" {
            return Ok(TableTheme::None);
        }

        let split = name
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| Self::unknown(s))?;
        let (family, number) = name.split_at(split);
        let n: u8 = number.parse().map_err(|_| Self::unknown(s))?;
        let theme = match family {
            "light" => TableTheme::Light(n),
            "medium" => TableTheme::Medium(n),
            "dark" => TableTheme::Dark(n),
            _ => return Err(Self::unknown(s)),
        };
        theme.table_style().ok_or_else(|| Self::unknown(s))?;
        Ok(theme)
    }
}

/// シートに配置するテーブル
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableSpec {
    pub name: String,
    pub range: CellRange,
    pub theme: TableTheme,
    pub headers: Vec<String>,
}

impl TableSpec {
    pub fn build(&self) -> Result<Table, XlsxTableError> {
        let style = self
            .theme
            .table_style()
            .ok_or_else(|| TableTheme::unknown(&self.theme.to_string()))?;
        let columns: Vec<TableColumn> = self
            .headers
            .iter()
            .map(|header| TableColumn::new().set_header(header.as_str()))
            .collect();
        Ok(Table::new()
            .set_name(self.name.as_str())
            .set_style(style)
            .set_columns(&columns))
    }
}

/// テーブル名を検証する
///
/// 先頭は英字かアンダースコア、以降は英数字・アンダースコア・ピリオドのみ。
pub(crate) fn validate_table_name(name: &str) -> Result<(), XlsxTableError> {
    let mut chars = name.chars();
    let valid_first = chars
        .next()
        .map(|c| c.is_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_first
        || !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        || name.chars().count() > 255
    {
        return Err(XlsxTableError::Config(format!(
            "Invalid table name '{}'",
            name
        )));
    }
    Ok(())
}

/// 見出しの空欄を`Column<n>`で埋め、重複に番号を付ける
pub(crate) fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, header)| {
            let base = if header.is_empty() {
                format!("Column{}", i + 1)
            } else {
                header
            };
            let mut candidate = base.clone();
            let mut n = 2;
            while !seen.insert(candidate.to_lowercase()) {
                candidate = format!("{}{}", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}
