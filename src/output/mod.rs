//! Output Module
//!
//! Markdownの生成と、生成した文書のファイル書き出しを提供するモジュール。
//!
//! 一括変換ではシートごと、フィルタ抽出ではキーごとに1つの`.md`ファイルを書き出します。
//! 1つのファイルの書き込みに失敗しても残りのファイルの処理は続行し、
//! 失敗はシート名・キー名ごとに`WriteSummary`へ記録されます。

mod markdown;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::XlsxTableError;

pub use markdown::{escape_cell, MarkdownRenderer, EMPTY_SHEET_MARKER, NO_DATA_MARKER};

/// 1シート分の一括変換結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDump {
    /// シート名
    pub name: String,
    /// 生成したMarkdown
    pub markdown: String,
}

/// 1キー分のフィルタ抽出結果
#[derive(Debug)]
pub struct KeyOutcome {
    /// 出力キー
    pub key: String,
    /// 生成したMarkdown、または`NoMatchingRows`
    pub result: Result<String, XlsxTableError>,
}

/// 複数キーのフィルタ抽出結果
#[derive(Debug)]
pub struct FilterOutcome {
    /// 主キー列名
    pub primary_column: String,
    /// キーごとの結果（マッピングの順序）
    pub keys: Vec<KeyOutcome>,
}

impl FilterOutcome {
    /// 1行以上一致したキーの数
    pub fn succeeded(&self) -> usize {
        self.keys.iter().filter(|k| k.result.is_ok()).count()
    }

    /// 要求されたキーの数
    pub fn total(&self) -> usize {
        self.keys.len()
    }

    /// キーの結果を取得
    pub fn get(&self, key: &str) -> Option<&Result<String, XlsxTableError>> {
        self.keys.iter().find(|k| k.key == key).map(|k| &k.result)
    }

    /// 成功したキーと生成したMarkdownの組
    pub fn documents(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys.iter().filter_map(|k| match &k.result {
            Ok(markdown) => Some((k.key.as_str(), markdown.as_str())),
            Err(_) => None,
        })
    }
}

/// ファイル書き出しの結果
#[derive(Debug, Default)]
pub struct WriteSummary {
    /// 書き出したファイル
    pub written: Vec<PathBuf>,
    /// 書き出しに失敗した文書（シート名またはキー名とエラー）
    pub failed: Vec<(String, XlsxTableError)>,
}

impl WriteSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// シート名やキー名からファイル名の語幹を作る
///
/// 英数字（Unicodeを含む）、空白、`-`、`_`以外の文字を取り除き、末尾の空白を削ります。
/// 結果が空になった場合は`sheet`を返します。
///
/// # 使用例
///
/// ```rust
/// use xlsxtable::safe_file_stem;
///
/// assert_eq!(safe_file_stem("Q1/Q2: Sales "), "Q1Q2 Sales");
/// assert_eq!(safe_file_stem("../.."), "sheet");
/// ```
pub fn safe_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let stem = stem.trim_end();
    if stem.is_empty() {
        "sheet".to_string()
    } else {
        stem.to_string()
    }
}

/// 文書をファイルに書き出す
///
/// # 戻り値
///
/// * `Err(XlsxTableError::Write)` - 書き込みに失敗した場合（パスを含む）
pub fn write_document(path: &Path, content: &str) -> Result<(), XlsxTableError> {
    fs::write(path, content).map_err(|source| XlsxTableError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// ラベル付きの文書群をディレクトリに書き出す
///
/// ファイル名は`safe_file_stem(label).md`です。語幹が重複した場合は`_2`、`_3`…を付けます。
fn write_documents<'a, I>(dir: &Path, documents: I) -> Result<WriteSummary, XlsxTableError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    fs::create_dir_all(dir).map_err(|source| XlsxTableError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut summary = WriteSummary::default();
    let mut used = HashSet::new();

    for (label, content) in documents {
        let base = safe_file_stem(label);
        let mut stem = base.clone();
        let mut n = 1;
        while !used.insert(stem.to_lowercase()) {
            n += 1;
            stem = format!("{}_{}", base, n);
        }
        if n > 1 {
            log::warn!("File name for '{}' collides, writing {}.md", label, stem);
        }

        let path = dir.join(format!("{}.md", stem));
        match write_document(&path, content) {
            Ok(()) => {
                log::info!("Saved {}", path.display());
                summary.written.push(path);
            }
            Err(e) => {
                log::warn!("Failed to write '{}': {}", label, e);
                summary.failed.push((label.to_string(), e));
            }
        }
    }

    Ok(summary)
}

/// 一括変換の結果をシートごとのファイルに書き出す
///
/// # 戻り値
///
/// * `Ok(WriteSummary)` - 個々のファイルの成否
/// * `Err(XlsxTableError::Write)` - 出力ディレクトリを作成できなかった場合
pub fn write_sheet_dumps(dir: &Path, dumps: &[SheetDump]) -> Result<WriteSummary, XlsxTableError> {
    write_documents(
        dir,
        dumps.iter().map(|d| (d.name.as_str(), d.markdown.as_str())),
    )
}

/// フィルタ抽出の結果をキーごとのファイルに書き出す
///
/// 一致行がなかったキーのファイルは作成しません。
pub fn write_filter_outputs(
    dir: &Path,
    outcome: &FilterOutcome,
) -> Result<WriteSummary, XlsxTableError> {
    let summary = write_documents(dir, outcome.documents())?;
    log::info!(
        "Processing completed: {}/{} filter(s) processed successfully",
        outcome.succeeded(),
        outcome.total()
    );
    Ok(summary)
}
