//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。
//!
//! 呼び出し側（AI支援ワークフローを含む）が「ファイルがない」「列がない」
//! 「行が一致しない」を区別できるよう、各バリアントは欠けているリソース
//! （シート名・列名・セル座標）をメッセージに含めます。

use std::path::PathBuf;

use thiserror::Error;

/// xlsxtableクレート全体で使用するエラー型
///
/// # エラーの種類
///
/// - `Io` / `Load`: 入力の読み込み・解析に失敗（処理全体を中断）
/// - `MalformedAddress`: セル参照文字列が不正
/// - `SheetNotFound`: 指定シートが存在しない
/// - `TableNotFound`: ヘッダー行を検出できなかった
/// - `NoColumnsResolved` / `PrimaryColumnNotFound`: 列名の解決に失敗（行走査前に中断）
/// - `NoMatchingRows`: フィルタキーに一致する行がない（キー単位、非致命的）
/// - `Write`: 出力ファイルの書き込みに失敗（ファイル単位）
///
/// # 使用例
///
/// ```rust
/// use xlsxtable::{CellAddress, XlsxTableError};
///
/// match "A0".parse::<CellAddress>() {
///     Err(XlsxTableError::MalformedAddress { address, .. }) => assert_eq!(address, "A0"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlsxTableError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// スプレッドシートの読み込みに失敗したエラー（calamine由来）
    ///
    /// ファイル形式が不正、破損したファイルなどが原因となります。
    #[error("Failed to load spreadsheet: {0}")]
    Load(#[from] calamine::Error),

    /// セル参照文字列（A1記法）が不正
    #[error("Malformed cell address '{address}': {reason}")]
    MalformedAddress {
        /// 入力されたセル参照
        address: String,
        /// 不正と判定した理由
        reason: String,
    },

    /// 指定されたシートが存在しない
    #[error("Sheet '{sheet}' not found (available: {available:?})")]
    SheetNotFound {
        /// 要求されたシート名
        sheet: String,
        /// ワークブック内のシート名
        available: Vec<String>,
    },

    /// ヘッダー行と判定できる行が見つからなかった
    #[error("No data table found in sheet '{sheet}' ({rows_scanned} rows scanned)")]
    TableNotFound {
        /// 走査したシート名
        sheet: String,
        /// 走査した行数
        rows_scanned: u32,
    },

    /// 要求された列名がいずれもヘッダーに一致しなかった
    #[error("None of the requested columns {requested:?} were found (available: {available:?})")]
    NoColumnsResolved {
        /// 要求された列名
        requested: Vec<String>,
        /// ヘッダー行に存在する列名
        available: Vec<String>,
    },

    /// フィルタ対象の主キー列がヘッダーに存在しない
    #[error("Primary column '{column}' not found (available: {available:?})")]
    PrimaryColumnNotFound {
        /// 要求された主キー列名
        column: String,
        /// ヘッダー行に存在する列名
        available: Vec<String>,
    },

    /// フィルタキーに一致する行が存在しない
    #[error("No rows matched {column} = '{value}' for key '{key}'")]
    NoMatchingRows {
        /// 出力キー
        key: String,
        /// 主キー列名
        column: String,
        /// 比較対象の値
        value: String,
    },

    /// 出力ファイルの書き込みに失敗
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        /// 書き込み先のパス
        path: PathBuf,
        /// 原因となったI/Oエラー
        #[source]
        source: std::io::Error,
    },

    /// JSON（キーと値のマッピング、サマリー）の変換エラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ワークブックの書き出し（rust_xlsxwriter）で発生したエラー
    #[error("Failed to author workbook: {0}")]
    Authoring(#[from] rust_xlsxwriter::XlsxError),

    /// 列挙型のタグ（グラフ種別、集計関数など）が認識できない
    #[error("Unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownVariant {
        /// 列挙型の種類
        kind: &'static str,
        /// 入力された値
        value: String,
        /// 受け付ける値の一覧
        expected: &'static str,
    },

    /// 設定の検証に失敗したエラー
    ///
    /// `ExtractorBuilder::build()`時などに無効な設定が検出された場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// 入力ファイルサイズの上限超過などで発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

impl XlsxTableError {
    /// キー単位の非致命的なエラー（一致行なし）かどうか
    pub fn is_no_match(&self) -> bool {
        matches!(self, XlsxTableError::NoMatchingRows { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: XlsxTableError = io_err.into();

        match error {
            XlsxTableError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(e.to_string(), "File not found");
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_load_error_display() {
        let error: XlsxTableError = calamine::Error::Msg("Corrupted file").into();
        let error_msg = error.to_string();
        assert!(error_msg.contains("Failed to load spreadsheet"));
        assert!(error_msg.contains("Corrupted file"));
    }

    #[test]
    fn test_sheet_not_found_names_the_sheet() {
        let error = XlsxTableError::SheetNotFound {
            sheet: "Budget".to_string(),
            available: vec!["Sheet1".to_string()],
        };
        let msg = error.to_string();
        assert!(msg.contains("'Budget'"));
        assert!(msg.contains("Sheet1"));
    }

    #[test]
    fn test_no_columns_resolved_lists_both_sides() {
        let error = XlsxTableError::NoColumnsResolved {
            requested: vec!["Salary".to_string()],
            available: vec!["Name".to_string(), "Age".to_string()],
        };
        let msg = error.to_string();
        assert!(msg.contains("Salary"));
        assert!(msg.contains("Name"));
        assert!(msg.contains("Age"));
    }

    #[test]
    fn test_no_matching_rows_is_non_fatal_kind() {
        let error = XlsxTableError::NoMatchingRows {
            key: "sales".to_string(),
            column: "Department".to_string(),
            value: "Sales".to_string(),
        };
        assert!(error.is_no_match());
        assert_eq!(
            error.to_string(),
            "No rows matched Department = 'Sales' for key 'sales'"
        );

        let other = XlsxTableError::Config("x".to_string());
        assert!(!other.is_no_match());
    }

    #[test]
    fn test_write_error_names_path() {
        let error = XlsxTableError::Write {
            path: PathBuf::from("out/sales.md"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = error.to_string();
        assert!(msg.contains("out/sales.md"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), XlsxTableError> {
            let _file = std::fs::File::open("nonexistent_file.xlsx")?;
            Ok(())
        }

        match io_operation() {
            Err(XlsxTableError::Io(_)) => {}
            _ => panic!("Expected Io error from ? operator"),
        }
    }
}
