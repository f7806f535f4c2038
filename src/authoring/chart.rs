//! Chart Kinds
//!
//! グラフ種別の閉じた列挙と、rust_xlsxwriterのグラフ定義への変換。

use std::fmt;
use std::str::FromStr;

use rust_xlsxwriter::{Chart, ChartType};

use crate::error::XlsxTableError;
use crate::types::{CellAddress, CellRange};

/// グラフ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Line,
    Bar,
    Column,
    Pie,
    Scatter,
    Area,
}

impl ChartKind {
    const EXPECTED: &'static str = "line, bar, column, pie, scatter, area";

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Column => "column",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
            ChartKind::Area => "area",
        }
    }

    fn chart_type(&self) -> ChartType {
        match self {
            ChartKind::Line => ChartType::Line,
            ChartKind::Bar => ChartType::Bar,
            ChartKind::Column => ChartType::Column,
            ChartKind::Pie => ChartType::Pie,
            ChartKind::Scatter => ChartType::Scatter,
            ChartKind::Area => ChartType::Area,
        }
    }

    fn has_axes(&self) -> bool {
        !matches!(self, ChartKind::Pie)
    }

    /// 先頭列をX値として使う種別か
    pub(crate) fn needs_x_values(&self) -> bool {
        matches!(self, ChartKind::Scatter)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = XlsxTableError;

    /// 大文字・小文字を区別せずにパースする
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            "column" => Ok(ChartKind::Column),
            "pie" => Ok(ChartKind::Pie),
            "scatter" => Ok(ChartKind::Scatter),
            "area" => Ok(ChartKind::Area),
            _ => Err(XlsxTableError::UnknownVariant {
                kind: "chart type",
                value: s.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

/// グラフのタイトルと軸ラベル
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartTitles {
    pub title: Option<String>,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
}

/// シートに配置するグラフ
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChartSpec {
    pub kind: ChartKind,
    pub data_range: CellRange,
    pub anchor: CellAddress,
    pub titles: ChartTitles,
}

impl ChartSpec {
    /// rust_xlsxwriterのグラフを組み立てる
    ///
    /// 範囲の各列を1系列とし、範囲が2行以上あれば先頭行を系列名とします。
    /// 散布図では先頭列をX値とし、残りの列を系列にします。
    pub fn build(&self, sheet: &str) -> Chart {
        let mut chart = Chart::new(self.kind.chart_type());
        let (start_row, start_col) = self.data_range.start.zero_based();
        let (end_row, end_col) = self.data_range.end.zero_based();
        let has_names = end_row > start_row;
        let first_value_row = if has_names { start_row + 1 } else { start_row };

        let x_col = self.kind.needs_x_values().then_some(start_col as u16);
        let first_series_col = if x_col.is_some() { start_col + 1 } else { start_col };

        for col in first_series_col..=end_col {
            let col = col as u16;
            let series = chart.add_series();
            series.set_values((sheet, first_value_row, col, end_row, col));
            if let Some(x_col) = x_col {
                series.set_categories((sheet, first_value_row, x_col, end_row, x_col));
            }
            if has_names {
                series.set_name((sheet, start_row, col));
            }
        }

        if let Some(title) = &self.titles.title {
            chart.title().set_name(title.as_str());
        }
        if self.kind.has_axes() {
            if let Some(x_axis) = &self.titles.x_axis {
                chart.x_axis().set_name(x_axis.as_str());
            }
            if let Some(y_axis) = &self.titles.y_axis {
                chart.y_axis().set_name(y_axis.as_str());
            }
        }
        chart
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("LINE".parse::<ChartKind>().unwrap(), ChartKind::Line);
        assert_eq!(" Pie ".parse::<ChartKind>().unwrap(), ChartKind::Pie);
        assert_eq!("column".parse::<ChartKind>().unwrap(), ChartKind::Column);
    }

    #[test]
    fn test_unknown_chart_type() {
        match "radar".parse::<ChartKind>() {
            Err(XlsxTableError::UnknownVariant { kind, value, .. }) => {
                assert_eq!(kind, "chart type");
                assert_eq!(value, "radar");
            }
            other => panic!("expected UnknownVariant, got {:?}", other),
        }
    }

    #[test]
    fn test_display_round_trip() {
        for kind in [
            ChartKind::Line,
            ChartKind::Bar,
            ChartKind::Column,
            ChartKind::Pie,
            ChartKind::Scatter,
            ChartKind::Area,
        ] {
            assert_eq!(kind.to_string().parse::<ChartKind>().unwrap(), kind);
        }
    }
}
