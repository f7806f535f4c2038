//! Markdown Renderer
//!
//! 抽出結果をGitHub Flavored Markdownのパイプテーブルに変換するモジュール。
//! 出力は入力だけで決まり、ロケールや時刻には依存しません。

use unicode_width::UnicodeWidthStr;

use crate::api::TableLayout;
use crate::grid::CellGrid;
use crate::table::{ExtractedTable, KeyedTable};
use crate::types::CellAddress;

/// データ行がない場合の表示
pub const NO_DATA_MARKER: &str = "No data found.";

/// シートが空の場合の表示（一括変換用）
pub const EMPTY_SHEET_MARKER: &str = "No data found in worksheet.";

/// セル文字列をテーブル内で安全な形にエスケープ
///
/// パイプは`&#124;`、改行は`<br>`に置き換えるため、出力の行数と
/// 各行のパイプの数はセルの内容に左右されません。
pub fn escape_cell(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '|' => escaped.push_str("&#124;"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                escaped.push_str("<br>");
            }
            '\n' => escaped.push_str("<br>"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Markdownレンダラー
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    layout: TableLayout,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(TableLayout::Compact)
    }
}

impl MarkdownRenderer {
    pub fn new(layout: TableLayout) -> Self {
        Self { layout }
    }

    /// パイプテーブルを生成
    ///
    /// ヘッダー行、区切り行、データ行を改行で連結します（末尾の改行なし）。
    /// 列がない場合は`NO_DATA_MARKER`を返します。
    ///
    /// # 引数
    ///
    /// * `headers` - 列名
    /// * `rows` - データ行（各行は列数に揃えられていること）
    pub fn render_table(&self, headers: &[String], rows: &[Vec<String>]) -> String {
        if headers.is_empty() {
            return NO_DATA_MARKER.to_string();
        }

        let header_cells: Vec<String> = headers.iter().map(|h| escape_cell(h)).collect();
        let body: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                (0..headers.len())
                    .map(|i| row.get(i).map(|c| escape_cell(c)).unwrap_or_default())
                    .collect()
            })
            .collect();

        let widths = match self.layout {
            TableLayout::Aligned => Some(column_widths(&header_cells, &body)),
            TableLayout::Compact => None,
        };

        let mut lines = Vec::with_capacity(body.len() + 2);
        lines.push(format_row(&header_cells, widths.as_deref()));
        lines.push(match &widths {
            Some(widths) => {
                let dashes: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
                format!("| {} |", dashes.join(" | "))
            }
            None => format!("|{}", " --- |".repeat(headers.len())),
        });
        for row in &body {
            lines.push(format_row(row, widths.as_deref()));
        }
        lines.join("\n")
    }

    /// 抽出結果を文書として出力
    ///
    /// `metadata`があればテーブルの前に「Metadata」見出しの箇条書きとして出力します。
    /// データ行が1行もない場合はテーブルの代わりに`NO_DATA_MARKER`を出力します。
    pub fn render(&self, table: &ExtractedTable, metadata: Option<&[(String, String)]>) -> String {
        let mut out = String::new();
        if let Some(entries) = metadata {
            out.push_str("## Metadata\n\n");
            for (key, value) in entries {
                out.push_str(&format!("- {}: {}\n", key, value));
            }
            out.push('\n');
        }
        if table.is_empty() {
            out.push_str(NO_DATA_MARKER);
        } else {
            out.push_str(&self.render_table(table.columns(), table.rows()));
        }
        out
    }

    /// キーごとの抽出結果を文書として出力
    ///
    /// # 引数
    ///
    /// * `keyed` - キーの抽出結果
    /// * `primary_column` - 主キー列名
    /// * `start` - ヘッダー行の開始セル
    /// * `with_metadata` - メタデータを出力するかどうか
    pub fn render_filtered(
        &self,
        keyed: &KeyedTable,
        primary_column: &str,
        start: CellAddress,
        with_metadata: bool,
    ) -> String {
        let criteria = format!("{} = '{}'", primary_column, keyed.target);
        let metadata = vec![
            ("Filter criteria".to_string(), criteria.clone()),
            ("Data source starting cell".to_string(), start.to_string()),
            ("Total matching rows".to_string(), keyed.table.len().to_string()),
            (
                "Columns included".to_string(),
                keyed.table.columns().join(", "),
            ),
        ];

        let mut out = format!("# Filtered Data: {}\n\n", criteria);
        if with_metadata {
            out.push_str(&self.render(&keyed.table, Some(&metadata)));
        } else {
            out.push_str(&self.render(&keyed.table, None));
        }
        out.push('\n');
        out
    }

    /// シート全体をセル参照付きで出力（一括変換用）
    ///
    /// 値のあるセルは`値 (A1)`の形式で出力し、値のない行は省略します。
    /// 列名は`Col 1`から`Col N`です。
    pub fn render_sheet_dump<G: CellGrid + ?Sized>(&self, grid: &G) -> String {
        let max_column = grid.max_column();
        let mut rows = Vec::new();

        for row in 1..=grid.max_row() {
            let mut has_content = false;
            let cells: Vec<String> = (1..=max_column)
                .map(|col| match grid.text_at(row, col) {
                    Some(text) => {
                        has_content = true;
                        format!("{} ({})", text, CellAddress::new(row, col))
                    }
                    None => String::new(),
                })
                .collect();
            if has_content {
                rows.push(cells);
            }
        }

        let mut lines = vec![
            format!("# Sheet: {}", grid.name()),
            String::new(),
            "## Raw Data with Cell References".to_string(),
            String::new(),
        ];
        if rows.is_empty() {
            lines.push(EMPTY_SHEET_MARKER.to_string());
        } else {
            let headers: Vec<String> = (1..=max_column).map(|i| format!("Col {}", i)).collect();
            lines.push(self.render_table(&headers, &rows));
        }
        lines.extend([
            String::new(),
            "## Summary for AI Analysis".to_string(),
            String::new(),
            format!("- Total rows with data: {}", rows.len()),
            format!("- Total columns: {}", if rows.is_empty() { 0 } else { max_column }),
            format!("- Sheet name: {}", grid.name()),
            "- Cell references are included in parentheses for precise identification"
                .to_string(),
        ]);

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// 各列の表示幅（最小3）
fn column_widths(headers: &[String], body: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width().max(3)).collect();
    for row in body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }
    widths
}

/// 1行分を`| a | b |`の形式に整形
fn format_row(cells: &[String], widths: Option<&[usize]>) -> String {
    let mut line = String::from("|");
    for (i, cell) in cells.iter().enumerate() {
        line.push(' ');
        line.push_str(cell);
        if let Some(width) = widths.and_then(|w| w.get(i)) {
            // 表示幅に基づいて埋める（全角文字は2）
            let pad = width.saturating_sub(cell.width());
            line.push_str(&" ".repeat(pad));
        }
        line.push_str(" |");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SheetGrid;
    use crate::types::CellValue;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compact_table() {
        let renderer = MarkdownRenderer::default();
        let md = renderer.render_table(
            &strings(&["Name", "Job"]),
            &[strings(&["Alice", "Engineer"]), strings(&["Bob", ""])],
        );
        assert_eq!(
            md,
            "| Name | Job |\n| --- | --- |\n| Alice | Engineer |\n| Bob |  |"
        );
    }

    #[test]
    fn test_aligned_table_uses_display_width() {
        let renderer = MarkdownRenderer::new(TableLayout::Aligned);
        let md = renderer.render_table(&strings(&["名前", "Job"]), &[strings(&["Al", "Engineer"])]);
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines[0], "| 名前 | Job      |");
        assert_eq!(lines[1], "| ---- | -------- |");
        assert_eq!(lines[2], "| Al   | Engineer |");
    }

    #[test]
    fn test_escaping_keeps_shape() {
        let renderer = MarkdownRenderer::default();
        let md = renderer.render_table(&strings(&["A|B"]), &[strings(&["line1\nline2"])]);
        assert_eq!(md, "| A&#124;B |\n| --- |\n| line1<br>line2 |");
        assert_eq!(escape_cell("a\r\nb"), "a<br>b");
    }

    #[test]
    fn test_no_columns_is_marker() {
        assert_eq!(MarkdownRenderer::default().render_table(&[], &[]), NO_DATA_MARKER);
    }

    #[test]
    fn test_render_with_metadata() {
        let mut table = ExtractedTable::new(strings(&["Name"]));
        table.push_row(2, strings(&["Alice"]));
        let metadata = vec![("Source".to_string(), "A1".to_string())];
        let md = MarkdownRenderer::default().render(&table, Some(&metadata));
        assert_eq!(md, "## Metadata\n\n- Source: A1\n\n| Name |\n| --- |\n| Alice |");
    }

    #[test]
    fn test_render_empty_table_is_marker() {
        let table = ExtractedTable::new(strings(&["Name"]));
        assert_eq!(MarkdownRenderer::default().render(&table, None), NO_DATA_MARKER);
    }

    #[test]
    fn test_render_filtered() {
        let mut table = ExtractedTable::new(strings(&["Name", "Dept"]));
        table.push_row(4, strings(&["Alice", "Engineering"]));
        let keyed = KeyedTable {
            key: "eng".to_string(),
            target: "Engineering".to_string(),
            table,
        };
        let md = MarkdownRenderer::default().render_filtered(
            &keyed,
            "Dept",
            CellAddress::new(3, 1),
            true,
        );
        assert!(md.starts_with("# Filtered Data: Dept = 'Engineering'\n\n## Metadata\n"));
        assert!(md.contains("- Data source starting cell: A3\n"));
        assert!(md.contains("- Total matching rows: 1\n"));
        assert!(md.contains("- Columns included: Name, Dept\n"));
        assert!(md.ends_with("| Alice | Engineering |\n"));
    }

    #[test]
    fn test_sheet_dump() {
        let grid = SheetGrid::from_rows(
            "Data",
            vec![
                vec!["Title".into()],
                Vec::new(),
                vec!["Name".into(), CellValue::Number(42.0)],
            ],
        );
        let md = MarkdownRenderer::default().render_sheet_dump(&grid);
        assert!(md.starts_with("# Sheet: Data\n\n## Raw Data with Cell References\n\n"));
        assert!(md.contains("| Col 1 | Col 2 |\n| --- | --- |\n"));
        assert!(md.contains("| Title (A1) |  |\n"));
        assert!(md.contains("| Name (A3) | 42 (B3) |\n"));
        assert!(md.contains("- Total rows with data: 2\n"));
        assert!(md.contains("- Total columns: 2\n"));
    }

    #[test]
    fn test_sheet_dump_empty() {
        let grid = SheetGrid::from_rows("Blank", Vec::new());
        let md = MarkdownRenderer::default().render_sheet_dump(&grid);
        assert!(md.contains(EMPTY_SHEET_MARKER));
        assert!(md.contains("- Total rows with data: 0\n"));
        assert!(md.contains("- Total columns: 0\n"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_cell() -> impl Strategy<Value = String> {
            prop_oneof![
                "[a-zA-Z0-9 ]{0,8}",
                "[a-z|\\n]{0,6}",
                "[日本語データ]{0,4}",
            ]
        }

        proptest! {
            #[test]
            fn test_table_shape(
                columns in 1usize..6,
                cells in proptest::collection::vec(arb_cell(), 0..60),
                aligned in any::<bool>(),
            ) {
                let headers: Vec<String> = (0..columns).map(|i| format!("H{}", i)).collect();
                let rows: Vec<Vec<String>> = cells.chunks(columns).map(|c| c.to_vec()).collect();
                let layout = if aligned { TableLayout::Aligned } else { TableLayout::Compact };
                let md = MarkdownRenderer::new(layout).render_table(&headers, &rows);

                let lines: Vec<&str> = md.split('\n').collect();
                prop_assert_eq!(lines.len(), 2 + rows.len());
                for line in lines {
                    prop_assert_eq!(line.matches('|').count(), columns + 1);
                }
            }

            #[test]
            fn test_rendering_is_deterministic(cells in proptest::collection::vec(arb_cell(), 0..20)) {
                let headers = vec!["A".to_string(), "B".to_string()];
                let rows: Vec<Vec<String>> = cells.chunks(2).map(|c| c.to_vec()).collect();
                let renderer = MarkdownRenderer::default();
                prop_assert_eq!(
                    renderer.render_table(&headers, &rows),
                    renderer.render_table(&headers, &rows)
                );
            }
        }
    }
}
