//! TUI内での文字列入力コンポーネント（InputBox）。

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

/// InputBox入力状態
#[derive(Clone, Debug, PartialEq)]
pub struct InputBoxState {
    /// プロンプトメッセージ
    pub prompt: String,
    /// 現在の入力値
    pub value: String,
    /// カーソル位置（文字単位）
    pub cursor: usize,
    /// 入力完了時のコールバック識別子
    pub callback_id: InputCallbackId,
}

/// 確認ダイアログで承認待ちの操作。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingAction {
    DeleteAccount(i64),
    DeleteDraft(String),
    DeleteVideo(String),
    StartBatch,
}

/// 入力完了時のコールバック識別子
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputCallbackId {
    /// 現在画面のフォームのフィールド
    FormField(usize),
    /// ドラフト編集中のセグメント本文
    SegmentText,
    /// 新規ドラフトのトピック
    DraftTopic,
    /// 追跡するジョブID
    WatchJobId,
    /// 音声プレビュー用の文
    VoiceSampleText,
    // 作成ウィザード用
    WizardTopic,
    WizardDuration,
    /// `y` で承認する確認ダイアログ
    Confirm(PendingAction),
}

impl InputBoxState {
    /// 値の末尾にカーソルを置いた状態で開く。
    pub fn new(prompt: impl Into<String>, value: impl Into<String>, callback_id: InputCallbackId) -> Self {
        let value = value.into();
        Self {
            prompt: prompt.into(),
            cursor: value.chars().count(),
            value,
            callback_id,
        }
    }

    /// 確認ダイアログ（空入力で開く）。
    pub fn confirm(question: impl Into<String>, action: PendingAction) -> Self {
        Self::new(
            format!("{} (y/N)", question.into()),
            "",
            InputCallbackId::Confirm(action),
        )
    }

    /// 文字位置からバイト位置へ変換する。
    fn byte_at(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.value.len())
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    /// 文字を挿入
    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_at(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Backspace（カーソル前の文字を削除）
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_at(self.cursor);
        self.value.remove(at);
    }

    /// Delete（カーソル位置の文字を削除）
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// 行全体をクリア
    pub fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// 表示幅に収まる部分とカーソル記号を返す（横スクロール対応）。
    fn visible_with_cursor(&self, width: usize) -> String {
        let width = width.max(2);
        // カーソルが右端を越えたら左を切り落とす。
        let offset = self.cursor.saturating_sub(width - 1);
        let before: String = self
            .value
            .chars()
            .skip(offset)
            .take(self.cursor - offset)
            .collect();
        let after: String = self
            .value
            .chars()
            .skip(self.cursor)
            .take(width.saturating_sub(before.chars().count() + 1))
            .collect();
        format!("{before}|{after}")
    }
}

/// InputBoxをポップアップとして描画
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    let popup_area = centered_popup(f.area(), 70, 7);

    // 既存の描画を消してポップアップ用の背景にする。
    f.render_widget(Clear, popup_area);
    let title = match state.callback_id {
        InputCallbackId::Confirm(_) => "Confirm",
        _ => "Input",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(block, popup_area);

    // プロンプト + 入力欄 + 空行 + ヘルプ
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(popup_area);

    let prompt = Paragraph::new(state.prompt.as_str()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(prompt, rows[0]);

    let field = Paragraph::new(state.visible_with_cursor(rows[1].width as usize))
        .style(Style::default().fg(Color::Green));
    f.render_widget(field, rows[1]);

    let help = Paragraph::new("Enter=OK | Esc=cancel | Ctrl+U=clear")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, rows[3]);
}

/// 中央配置のポップアップ領域を計算
pub fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Length(area.height.saturating_sub(height) / 2),
        Constraint::Length(height),
        Constraint::Min(0),
    ])
    .areas(area);
    let side = (100 - width_percent.min(100)) / 2;
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage(side),
        Constraint::Percentage(width_percent),
        Constraint::Percentage(side),
    ])
    .areas(middle);
    center
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(value: &str) -> InputBoxState {
        InputBoxState::new("p", value, InputCallbackId::DraftTopic)
    }

    #[test]
    fn editing_handles_multibyte_text() {
        let mut s = state("한국어");
        assert_eq!(s.cursor, 3);
        s.move_left();
        s.insert_char('x');
        assert_eq!(s.value, "한국x어");
        s.backspace();
        s.backspace();
        assert_eq!(s.value, "한어");
        s.move_home();
        s.delete();
        assert_eq!(s.value, "어");
        assert_eq!(s.cursor, 0);
    }

    #[test]
    fn cursor_stays_inside_value() {
        let mut s = state("ab");
        s.move_right();
        assert_eq!(s.cursor, 2);
        s.move_home();
        s.move_left();
        assert_eq!(s.cursor, 0);
        s.backspace();
        assert_eq!(s.value, "ab");
        s.clear_line();
        assert_eq!((s.value.as_str(), s.cursor), ("", 0));
    }

    #[test]
    fn long_values_scroll_to_keep_cursor_visible() {
        let s = state("abcdefghij");
        assert_eq!(s.visible_with_cursor(6), "fghij|");
        let mut s = state("abcdefghij");
        s.move_home();
        assert_eq!(s.visible_with_cursor(6), "|abcde");
    }
}
