//! レイアウト計算のヘルパー関数

use ratatui::prelude::*;

/// サイドバーの幅（文字数）
const SIDEBAR_WIDTH: u16 = 18;

/// メインレイアウトの4つの領域
pub struct MainLayout {
    /// 画面一覧（ナビゲーション）
    pub sidebar: Rect,
    /// 画面本体 + INFO Panelの領域
    pub body: Rect,
    /// HELPバーの領域
    pub help_bar: Rect,
    /// STATUSバーの領域
    pub status_bar: Rect,
}

/// ボディ部の2つの領域（メイン 65% + INFO Panel 35%）
pub struct BodyLayout {
    pub main: Rect,
    pub info_panel: Rect,
}

/// 全体を Sidebar | Body の横並びと HELP / STATUS の縦積みに分割
pub fn create_main_layout(area: Rect) -> MainLayout {
    let [top, help_bar, status_bar] = Layout::vertical([
        Constraint::Min(1),    // Sidebar + Body
        Constraint::Length(3), // HELPバー
        Constraint::Length(3), // STATUSバー
    ])
    .areas(area);

    let [sidebar, body] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)]).areas(top);

    MainLayout {
        sidebar,
        body,
        help_bar,
        status_bar,
    }
}

/// Body領域を2つに分割
pub fn create_body_layout(area: Rect) -> BodyLayout {
    let [main, info_panel] =
        Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)]).areas(area);
    BodyLayout { main, info_panel }
}

/// 一覧の下に1行の付帯領域（ページャ・フィルタ表示）を確保する。
pub fn split_footer(area: Rect) -> (Rect, Rect) {
    let [list, footer] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
    (list, footer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidebar_has_fixed_width_and_bars_fixed_height() {
        let l = create_main_layout(Rect::new(0, 0, 120, 40));
        assert_eq!(l.sidebar.width, SIDEBAR_WIDTH);
        assert_eq!(l.body.width, 120 - SIDEBAR_WIDTH);
        assert_eq!(l.help_bar.height, 3);
        assert_eq!(l.status_bar.y, 37);
    }
}
