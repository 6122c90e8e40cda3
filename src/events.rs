//! 画面遷移用のUI状態と画面種別。

/// TUIで現在表示中の画面。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    /// 最近のジョブ一覧（ページ送りあり）。
    Jobs,
    /// チャンネルアカウント一覧。
    Accounts,
    /// アカウントの作成・編集フォーム。
    AccountForm,
    /// アカウントごとのTTS/BGM設定パネル。
    AccountSettings,
    /// ドラフト（プロジェクト）一覧。
    Drafts,
    /// ドラフトのタイムライン編集。
    DraftEditor,
    /// 動画作成ウィザード。
    CreateVideo,
    /// プレビュー生成。
    Preview,
    /// バッチリミックス。
    Batch,
    /// BGMライブラリ。
    Bgm,
    /// ダウンロード済み動画ライブラリ。
    Videos,
    /// トレンド分析・検索などのツール群。
    Studio,
    /// ローカル設定（prefs.toml）。
    Settings,
}

impl Screen {
    /// サイドバーに並べる画面（サブ画面は含めない）。
    pub const NAV: [Screen; 10] = [
        Screen::Jobs,
        Screen::Accounts,
        Screen::Drafts,
        Screen::CreateVideo,
        Screen::Preview,
        Screen::Batch,
        Screen::Bgm,
        Screen::Videos,
        Screen::Studio,
        Screen::Settings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Jobs => "Jobs",
            Screen::Accounts => "Accounts",
            Screen::AccountForm => "Account",
            Screen::AccountSettings => "Account settings",
            Screen::Drafts => "Drafts",
            Screen::DraftEditor => "Draft editor",
            Screen::CreateVideo => "Create video",
            Screen::Preview => "Preview",
            Screen::Batch => "Batch remix",
            Screen::Bgm => "BGM",
            Screen::Videos => "Videos",
            Screen::Studio => "Studio",
            Screen::Settings => "Settings",
        }
    }

    /// サブ画面はサイドバー上で親画面として扱う。
    pub fn nav_parent(self) -> Screen {
        match self {
            Screen::AccountForm | Screen::AccountSettings => Screen::Accounts,
            Screen::DraftEditor => Screen::Drafts,
            other => other,
        }
    }

    /// サイドバー上の前後の画面。
    pub fn nav_step(self, dir: i32) -> Screen {
        let n = Self::NAV.len() as i32;
        let i = Self::NAV
            .iter()
            .position(|s| *s == self.nav_parent())
            .unwrap_or(0) as i32;
        Self::NAV[(i + dir).rem_euclid(n) as usize]
    }
}

/// 描画側と共有するUI状態。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 現在の画面。
    pub screen: Screen,
    /// 一覧の選択行（画面切り替えで先頭へ戻る）。
    pub selected: usize,
    /// フォームで編集中のフィールド位置。
    pub field_idx: usize,
    /// 右側パネルに表示するログ。
    pub log: Vec<String>,
    /// 画面下部のステータス文言。
    pub status: String,
    /// エラーメッセージ（強調表示用）。
    pub error: Option<String>,
    /// バックエンドへの疎通結果（未確認はNone）。
    pub backend_up: Option<bool>,
}

impl UiState {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            selected: 0,
            field_idx: 0,
            log: vec![],
            status: "Ready".into(),
            error: None,
            backend_up: None,
        }
    }

    /// 選択行を1つ動かす（範囲外には出ない）。
    pub fn move_selection(&mut self, dir: i32, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if dir < 0 {
            self.selected = self.selected.saturating_sub(1);
        } else if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    /// ログを追記する（古いものから捨てる）。
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        if self.log.len() > 200 {
            self.log.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nav_wraps_and_sub_screens_use_parent() {
        assert_eq!(Screen::Jobs.nav_step(-1), Screen::Settings);
        assert_eq!(Screen::Settings.nav_step(1), Screen::Jobs);
        assert_eq!(Screen::DraftEditor.nav_step(1), Screen::CreateVideo);
        assert_eq!(Screen::AccountSettings.nav_parent(), Screen::Accounts);
    }

    #[test]
    fn selection_stays_in_range() {
        let mut ui = UiState::new(Screen::Jobs);
        ui.move_selection(1, 2);
        ui.move_selection(1, 2);
        assert_eq!(ui.selected, 1);
        ui.move_selection(-1, 2);
        ui.move_selection(-1, 2);
        assert_eq!(ui.selected, 0);
    }
}
