//! Parser Module
//!
//! calamineを使用したワークブックの読み込みと構造の調査。
//! 読み込んだシートは`SheetGrid`のスナップショットとして抽出処理に渡します。

mod summary;
mod workbook;

pub use summary::{RangeData, SheetSummary, WorkbookSummary, PREVIEW_ROWS};
pub use workbook::WorkbookSource;
