//! Key Filter
//!
//! 主キー列の値で行を振り分け、キーごとのサブテーブルを1回の走査で作る。

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::XlsxTableError;
use crate::grid::CellGrid;

use super::extract::ExtractedTable;
use super::header::{ColumnSelection, HeaderRow};
use super::{data_rows, trimmed_text};

/// 出力キーと対象値の対応（挿入順を保持）
///
/// JSONオブジェクトから読み込めます。値は文字列または数値です。
///
/// # 使用例
///
/// ```rust
/// use xlsxtable::KeyValueMapping;
///
/// let mapping: KeyValueMapping =
///     serde_json::from_str(r#"{"eng": "Engineering", "year": 2024}"#).unwrap();
/// let pairs: Vec<_> = mapping.iter().collect();
/// assert_eq!(pairs, vec![("eng", "Engineering"), ("year", "2024")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueMapping(Vec<(String, String)>);

impl KeyValueMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 対応を追加（同じキーは後から追加した値で置き換え）
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// JSON文字列から読み込む
    pub fn from_json_str(json: &str) -> Result<Self, XlsxTableError> {
        Ok(serde_json::from_str(json)?)
    }

    /// JSONを読み込む
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self, XlsxTableError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = KeyValueMapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl Serialize for KeyValueMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeyValueMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = KeyValueMapping;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping output keys to string or number values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut mapping = KeyValueMapping::new();
                while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
                    let value = match value {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Number(n) => n.to_string(),
                        serde_json::Value::Bool(b) => b.to_string(),
                        other => {
                            return Err(de::Error::custom(format!(
                                "value for key '{}' must be a string or number, got {}",
                                key, other
                            )))
                        }
                    };
                    mapping.insert(key, value);
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

/// 主キー列と対象値の組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriterion {
    /// 比較に使う列名
    pub primary_column: String,
    /// 出力キーごとの対象値
    pub targets: KeyValueMapping,
}

impl FilterCriterion {
    pub fn new(primary_column: impl Into<String>, targets: KeyValueMapping) -> Self {
        Self {
            primary_column: primary_column.into(),
            targets,
        }
    }
}

/// 1つのキーに対応する抽出結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedTable {
    /// 出力キー
    pub key: String,
    /// 対象値
    pub target: String,
    /// 一致した行
    pub table: ExtractedTable,
}

/// 主キー列の値でデータ行を振り分ける
///
/// ヘッダー行の次の行から最終行まで、途中で打ち切らずにすべて走査します
/// （一致する行は一致しない行の間に散在し得るため）。各行の主キー列の値を
/// トリムして大文字・小文字を区別せずに各キーの対象値と比較し、一致した
/// キーのテーブルに行を追加します。対象値はトリムしないため、前後に空白を
/// 含む対象値はどの行にも一致しません。主キー列が空の行はどのキーにも一致しません。
///
/// # 戻り値
///
/// * `Ok(Vec<KeyedTable>)` - キーの挿入順に並んだ結果（一致0件のキーも含む）
/// * `Err(XlsxTableError::PrimaryColumnNotFound)` - 主キー列がヘッダーにない場合
pub fn extract_filtered<G: CellGrid + ?Sized>(
    grid: &G,
    headers: &HeaderRow,
    selection: &ColumnSelection,
    criterion: &FilterCriterion,
) -> Result<Vec<KeyedTable>, XlsxTableError> {
    let primary_index = headers.find(&criterion.primary_column).ok_or_else(|| {
        XlsxTableError::PrimaryColumnNotFound {
            column: criterion.primary_column.clone(),
            available: headers.available(),
        }
    })?;
    let primary_col = headers.physical_column(primary_index);
    let physical: Vec<u32> = selection
        .indices()
        .into_iter()
        .map(|index| headers.physical_column(index))
        .collect();

    let needles: Vec<String> = criterion
        .targets
        .iter()
        .map(|(_, target)| target.to_lowercase())
        .collect();
    let mut results: Vec<KeyedTable> = criterion
        .targets
        .iter()
        .map(|(key, target)| KeyedTable {
            key: key.to_string(),
            target: target.to_string(),
            table: ExtractedTable::new(selection.headers()),
        })
        .collect();

    for row in data_rows(grid, headers) {
        if grid.cell_at(row, primary_col).is_none() {
            continue;
        }
        let value = trimmed_text(grid, row, primary_col).to_lowercase();

        let mut cells: Option<Vec<String>> = None;
        for (needle, result) in needles.iter().zip(results.iter_mut()) {
            if *needle != value {
                continue;
            }
            let cells = cells.get_or_insert_with(|| {
                physical
                    .iter()
                    .map(|&col| trimmed_text(grid, row, col))
                    .collect()
            });
            log::debug!("Row {} matches key '{}'", row, result.key);
            result.table.push_row(row, cells.clone());
        }
    }

    for result in &results {
        log::info!(
            "Key '{}' ({} = '{}'): {} matching rows",
            result.key,
            criterion.primary_column,
            result.target,
            result.table.len()
        );
    }

    Ok(results)
}
