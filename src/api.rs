//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// 日付の出力形式
///
/// 日付セルを文字列に変換する際の出力形式を指定します。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DateFormat {
    /// ISO 8601形式（YYYY-MM-DD、時刻成分があれば YYYY-MM-DD HH:MM:SS）
    Iso8601,

    /// カスタム形式（chrono互換フォーマット文字列）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxtable::{DateFormat, ExtractorBuilder};
    ///
    /// # fn main() -> Result<(), xlsxtable::XlsxTableError> {
    /// let extractor = ExtractorBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%Y年%m月%d日".to_string()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    Custom(String),
}

/// Markdownテーブルのレイアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TableLayout {
    /// 詰めたレイアウト（デフォルト）
    ///
    /// 区切り行は列ごとに`---`を1つだけ出力します。
    ///
    /// ```markdown
    /// | Name | Job |
    /// | --- | --- |
    /// | Alice | Engineer |
    /// ```
    Compact,

    /// 列幅を揃えたレイアウト
    ///
    /// 全角文字を表示幅2として、各列をもっとも広いセルの幅に揃えます。
    ///
    /// ```markdown
    /// | Name  | Job      |
    /// | ----- | -------- |
    /// | Alice | Engineer |
    /// ```
    Aligned,
}

/// シート選択方式
///
/// 一括変換の対象となるシートを選択する方法を指定します。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SheetSelector {
    /// すべてのシートを変換（デフォルト）
    All,

    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    Name(String),

    /// 複数のシート名指定
    Names(Vec<String>),
}
