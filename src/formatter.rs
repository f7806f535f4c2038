//! Formatter Module
//!
//! セル値の変換と文字列化を提供するモジュール。
//! calamineのセル値を`CellValue`に変換し、`CellValue`を表示用文字列に変換します。

use std::fmt::Write;

use calamine::Data;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::api::DateFormat;
use crate::types::CellValue;

/// セルフォーマッター
///
/// セル値の文字列化のファサードとして機能します。
#[derive(Debug, Clone)]
pub(crate) struct CellFormatter {
    /// 日付フォーマッター
    date_formatter: DateFormatter,
}

impl CellFormatter {
    /// 指定された日付形式でCellFormatterを生成
    pub fn new(date_format: DateFormat) -> Self {
        Self {
            date_formatter: DateFormatter { date_format },
        }
    }

    /// calamineのセル値を`CellValue`に変換
    pub fn convert(cell: &Data) -> CellValue {
        match cell {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) if dt.is_duration() => CellValue::Duration(dt.as_f64()),
            // 1904年エポックの補正はcalamineに任せ、1900年エポックのシリアル値に揃える
            Data::DateTime(dt) => dt
                .as_datetime()
                .and_then(DateFormatter::to_serial)
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Number(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
            Data::Empty => CellValue::Empty,
        }
    }

    /// セル値を表示用文字列に変換
    ///
    /// - 整数値の数値は小数点なしで出力（`42.0` -> `42`）
    /// - 日付は設定された`DateFormat`で出力
    /// - 経過時間は`[h]:mm:ss`（`1.5`日 -> `36:00:00`）
    /// - 論理値は`TRUE` / `FALSE`
    pub fn format_value(&self, value: &CellValue) -> String {
        match value {
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(serial) => self
                .date_formatter
                .format(*serial)
                .unwrap_or_else(|| format_number(*serial)),
            CellValue::Duration(days) => format_duration(*days),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl Default for CellFormatter {
    fn default() -> Self {
        Self::new(DateFormat::Iso8601)
    }
}

/// 数値を文字列に変換
///
/// 有限の整数値は小数点なしで、それ以外は最短表現で出力します。
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// 経過日数を`[h]:mm:ss`形式の文字列に変換
pub(crate) fn format_duration(days: f64) -> String {
    if !days.is_finite() {
        return format_number(days);
    }
    let duration = Duration::milliseconds((days * MILLIS_PER_DAY).round() as i64);
    let sign = if duration < Duration::zero() { "-" } else { "" };
    let duration = duration.abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        duration.num_hours(),
        duration.num_minutes() % 60,
        duration.num_seconds() % 60
    )
}

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// 1900年エポックで存在しない1900-02-29の分、これ未満のシリアル値は1日ずれる
const FIRST_SERIAL_AFTER_LEAP_BUG: f64 = 60.0;

/// 日付フォーマッター
///
/// Excelのシリアル日付値を文字列に変換します（1900年エポック、シリアル値1 = 1900-01-01）。
#[derive(Debug, Clone)]
pub(crate) struct DateFormatter {
    date_format: DateFormat,
}

fn excel_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

impl DateFormatter {
    /// シリアル値を日時に変換
    pub fn to_datetime(serial_value: f64) -> Option<NaiveDateTime> {
        if !serial_value.is_finite() || serial_value < 0.0 {
            return None;
        }
        let serial_value = if serial_value < FIRST_SERIAL_AFTER_LEAP_BUG {
            serial_value + 1.0
        } else {
            serial_value
        };
        let millis = (serial_value * MILLIS_PER_DAY).round() as i64;
        excel_epoch()?.checked_add_signed(Duration::milliseconds(millis))
    }

    /// 日時を1900年エポックのシリアル値に変換（`to_datetime`の逆変換）
    pub fn to_serial(datetime: NaiveDateTime) -> Option<f64> {
        let millis = datetime.signed_duration_since(excel_epoch()?).num_milliseconds();
        let days = millis as f64 / MILLIS_PER_DAY;
        if days < 0.0 {
            return None;
        }
        // 1900-03-01（シリアル値61）より前は1日前に詰める
        if days < FIRST_SERIAL_AFTER_LEAP_BUG + 1.0 {
            Some((days - 1.0).max(0.0))
        } else {
            Some(days)
        }
    }

    /// シリアル値をフォーマット
    ///
    /// `Iso8601`の場合、時刻成分がなければ`YYYY-MM-DD`、あれば`YYYY-MM-DD HH:MM:SS`。
    pub fn format(&self, serial_value: f64) -> Option<String> {
        let datetime = Self::to_datetime(serial_value)?;
        let formatted = match &self.date_format {
            DateFormat::Iso8601 => {
                if datetime.num_seconds_from_midnight() == 0 {
                    datetime.format("%Y-%m-%d").to_string()
                } else {
                    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            DateFormat::Custom(format_str) => {
                // 不正な書式指定子はDisplayがエラーを返すため、to_string()は使わない
                let mut out = String::new();
                write!(out, "{}", datetime.format(format_str)).ok()?;
                out
            }
        };
        Some(formatted)
    }
}
