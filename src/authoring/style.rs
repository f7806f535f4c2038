//! Cell Styles
//!
//! 範囲に適用するセル書式と、rust_xlsxwriterの`Format`への変換。

use std::str::FromStr;

use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern};

use crate::error::XlsxTableError;

/// 罫線の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderStyle {
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
}

impl BorderStyle {
    fn format_border(&self) -> FormatBorder {
        match self {
            BorderStyle::Thin => FormatBorder::Thin,
            BorderStyle::Medium => FormatBorder::Medium,
            BorderStyle::Thick => FormatBorder::Thick,
            BorderStyle::Dashed => FormatBorder::Dashed,
            BorderStyle::Dotted => FormatBorder::Dotted,
            BorderStyle::Double => FormatBorder::Double,
        }
    }
}

impl FromStr for BorderStyle {
    type Err = XlsxTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thin" => Ok(BorderStyle::Thin),
            "medium" => Ok(BorderStyle::Medium),
            "thick" => Ok(BorderStyle::Thick),
            "dashed" => Ok(BorderStyle::Dashed),
            "dotted" => Ok(BorderStyle::Dotted),
            "double" => Ok(BorderStyle::Double),
            _ => Err(XlsxTableError::UnknownVariant {
                kind: "border style",
                value: s.to_string(),
                expected: "thin, medium, thick, dashed, dotted, double",
            }),
        }
    }
}

/// セル書式
///
/// 未指定の項目は既存の書式を変更しません。色は`FF0000`または`#FF0000`の
/// 16進RGB（8桁のARGBは先頭2桁を無視）で指定します。
///
/// # 使用例
///
/// ```rust
/// use xlsxtable::{BorderStyle, CellStyle};
///
/// let header = CellStyle {
///     bold: true,
///     bg_color: Some("#DDEBF7".to_string()),
///     border: Some(BorderStyle::Thin),
///     ..Default::default()
/// };
/// assert!(header.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    pub font_size: Option<f64>,
    pub font_color: Option<String>,
    pub bg_color: Option<String>,
    pub border: Option<BorderStyle>,
}

impl CellStyle {
    /// 色指定とフォントサイズを検証する
    pub fn validate(&self) -> Result<(), XlsxTableError> {
        if let Some(size) = self.font_size {
            if !(size.is_finite() && size > 0.0 && size <= 409.0) {
                return Err(XlsxTableError::Config(format!(
                    "Font size must be between 0 and 409, got {}",
                    size
                )));
            }
        }
        for color in [&self.font_color, &self.bg_color].into_iter().flatten() {
            parse_hex_color(color)?;
        }
        Ok(())
    }

    /// 後から適用した書式で上書きする（太字・斜体は加算）
    pub(crate) fn merge(&mut self, other: &CellStyle) {
        self.bold |= other.bold;
        self.italic |= other.italic;
        if other.font_size.is_some() {
            self.font_size = other.font_size;
        }
        if other.font_color.is_some() {
            self.font_color = other.font_color.clone();
        }
        if other.bg_color.is_some() {
            self.bg_color = other.bg_color.clone();
        }
        if other.border.is_some() {
            self.border = other.border;
        }
    }

    /// rust_xlsxwriterの書式に変換する
    pub(crate) fn to_format(&self) -> Result<Format, XlsxTableError> {
        let mut format = Format::new();
        if self.bold {
            format = format.set_bold();
        }
        if self.italic {
            format = format.set_italic();
        }
        if let Some(size) = self.font_size {
            format = format.set_font_size(size);
        }
        if let Some(color) = &self.font_color {
            format = format.set_font_color(Color::RGB(parse_hex_color(color)?));
        }
        if let Some(color) = &self.bg_color {
            format = format
                .set_background_color(Color::RGB(parse_hex_color(color)?))
                .set_pattern(FormatPattern::Solid);
        }
        if let Some(border) = self.border {
            format = format.set_border(border.format_border());
        }
        Ok(format)
    }
}

/// 16進のRGB色指定をパースする
pub(crate) fn parse_hex_color(color: &str) -> Result<u32, XlsxTableError> {
    let hex = color.trim().trim_start_matches('#');
    let rgb = match hex.len() {
        6 => hex,
        8 => hex.get(2..).unwrap_or(""),
        _ => "",
    };
    if rgb.is_empty() || !rgb.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(XlsxTableError::Config(format!(
            "Invalid color '{}': expected RRGGBB hex",
            color
        )));
    }
    u32::from_str_radix(rgb, 16)
        .map_err(|e| XlsxTableError::Config(format!("Invalid color '{}': {}", color, e)))
}
