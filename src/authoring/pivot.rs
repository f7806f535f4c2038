//! Pivot Summary
//!
//! 範囲のデータを行キー（と任意の展開列）でグループ化し、値列を集計する。
//! 結果はネイティブのピボットテーブルではなく、集計済みの値の表です。

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::XlsxTableError;
use crate::formatter::CellFormatter;
use crate::types::CellValue;

/// 集計関数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
    Median,
    Min,
    Max,
    Count,
}

impl Aggregation {
    const EXPECTED: &'static str = "sum, mean, median, min, max, count";

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
        }
    }

    /// 集計値を計算
    ///
    /// `Count`は空でないセルの数、それ以外は数値として解釈できたセルが対象です。
    /// 対象が1つもない場合は`None`。
    fn apply(&self, bucket: &Bucket) -> Option<f64> {
        let numbers = &bucket.numbers;
        match self {
            Aggregation::Count => Some(bucket.count as f64),
            _ if numbers.is_empty() => None,
            Aggregation::Sum => Some(numbers.iter().sum()),
            Aggregation::Mean => Some(numbers.iter().sum::<f64>() / numbers.len() as f64),
            Aggregation::Median => {
                let mut sorted = numbers.clone();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    Some((sorted[mid - 1] + sorted[mid]) / 2.0)
                } else {
                    Some(sorted[mid])
                }
            }
            Aggregation::Min => numbers.iter().copied().reduce(f64::min),
            Aggregation::Max => numbers.iter().copied().reduce(f64::max),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = XlsxTableError;

    /// 大文字・小文字を区別せずにパースする（`average`は`mean`の別名）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "mean" | "average" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "count" => Ok(Aggregation::Count),
            _ => Err(XlsxTableError::UnknownVariant {
                kind: "aggregation",
                value: s.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

/// ピボット集計の指定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotSpec {
    /// 行キーとする列
    pub rows: Vec<String>,
    /// 集計する列
    pub values: Vec<String>,
    /// 値を横に展開する列
    pub columns: Option<String>,
    /// 集計関数
    pub aggregation: Aggregation,
}

impl PivotSpec {
    pub fn new<R, V, S1, S2>(rows: R, values: V) -> Self
    where
        R: IntoIterator<Item = S1>,
        V: IntoIterator<Item = S2>,
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
            values: values.into_iter().map(Into::into).collect(),
            columns: None,
            aggregation: Aggregation::default(),
        }
    }

    pub fn with_columns(mut self, column: impl Into<String>) -> Self {
        self.columns = Some(column.into());
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }
}

#[derive(Debug, Default, Clone)]
struct Bucket {
    numbers: Vec<f64>,
    count: usize,
}

impl Bucket {
    fn add(&mut self, value: &CellValue) {
        if value.is_empty() {
            return;
        }
        self.count += 1;
        if let Some(n) = value.as_number() {
            self.numbers.push(n);
        }
    }
}

fn find_column(header: &[String], name: &str) -> Result<usize, XlsxTableError> {
    let wanted = name.trim().to_lowercase();
    header
        .iter()
        .position(|h| h.trim().to_lowercase() == wanted)
        .ok_or_else(|| XlsxTableError::NoColumnsResolved {
            requested: vec![name.to_string()],
            available: header.iter().filter(|h| !h.is_empty()).cloned().collect(),
        })
}

/// ピボット集計を計算する
///
/// 出力の1行目は見出しで、行キーの列名に続いて値列（展開列があれば
/// `値列_展開値`）が並びます。行キーと展開値は文字列として昇順に並べ、
/// 存在しない組み合わせは0で埋めます。
///
/// # 引数
///
/// * `header` - 元データの列名
/// * `rows` - 元データの行
/// * `spec` - 集計の指定
///
/// # 戻り値
///
/// * `Err(XlsxTableError::NoColumnsResolved)` - 指定した列が見出しにない場合
/// * `Err(XlsxTableError::Config)` - 行キーまたは値列が空の場合
pub fn pivot_summary(
    header: &[String],
    rows: &[Vec<CellValue>],
    spec: &PivotSpec,
) -> Result<Vec<Vec<CellValue>>, XlsxTableError> {
    if spec.rows.is_empty() || spec.values.is_empty() {
        return Err(XlsxTableError::Config(
            "Pivot summary needs at least one row column and one value column".to_string(),
        ));
    }

    let index_cols = spec
        .rows
        .iter()
        .map(|name| find_column(header, name))
        .collect::<Result<Vec<_>, _>>()?;
    let value_cols = spec
        .values
        .iter()
        .map(|name| find_column(header, name))
        .collect::<Result<Vec<_>, _>>()?;
    let spread_col = spec
        .columns
        .as_deref()
        .map(|name| find_column(header, name))
        .transpose()?;

    let formatter = CellFormatter::default();
    let text = |row: &Vec<CellValue>, col: usize| -> String {
        row.get(col)
            .map(|v| formatter.format_value(v).trim().to_string())
            .unwrap_or_default()
    };

    // (行キー, 展開値, 値列) -> 集計対象
    let mut buckets: BTreeMap<(Vec<String>, String, usize), Bucket> = BTreeMap::new();
    let mut group_keys: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut spread_keys: BTreeSet<String> = BTreeSet::new();

    for row in rows {
        let key: Vec<String> = index_cols.iter().map(|&c| text(row, c)).collect();
        let spread = spread_col.map(|c| text(row, c)).unwrap_or_default();
        for (vi, &vc) in value_cols.iter().enumerate() {
            let value = row.get(vc).unwrap_or(&CellValue::Empty);
            buckets
                .entry((key.clone(), spread.clone(), vi))
                .or_default()
                .add(value);
        }
        group_keys.insert(key);
        spread_keys.insert(spread);
    }

    let value_names: Vec<&String> = value_cols.iter().map(|&c| &header[c]).collect();
    let mut out_header: Vec<CellValue> = index_cols
        .iter()
        .map(|&c| CellValue::from(header[c].clone()))
        .collect();
    for name in &value_names {
        if spread_col.is_some() {
            for key in &spread_keys {
                out_header.push(CellValue::from(format!("{}_{}", name, key)));
            }
        } else {
            out_header.push(CellValue::from(name.to_string()));
        }
    }

    let mut output = vec![out_header];
    for key in &group_keys {
        let mut line: Vec<CellValue> = key.iter().map(|k| CellValue::from(k.as_str())).collect();
        for vi in 0..value_cols.len() {
            for spread in &spread_keys {
                let value = buckets
                    .get(&(key.clone(), spread.clone(), vi))
                    .and_then(|bucket| spec.aggregation.apply(bucket))
                    .unwrap_or(0.0);
                line.push(CellValue::Number(value));
            }
        }
        output.push(line);
    }

    log::debug!(
        "Pivot summary: {} groups x {} value columns ({})",
        group_keys.len(),
        output[0].len() - index_cols.len(),
        spec.aggregation
    );
    Ok(output)
}
