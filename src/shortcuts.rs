//! ショートカット設定の管理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// ショートカット設定の全体（shortcut.toml）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Shortcuts {
    pub global: GlobalShortcuts,
    pub list: ListShortcuts,
    pub jobs: JobsShortcuts,
    pub preview: PreviewShortcuts,
    pub accounts: AccountsShortcuts,
    pub form: FormShortcuts,
    pub panel: PanelShortcuts,
    pub editor: EditorShortcuts,
    pub wizard: WizardShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// どの画面でも有効なショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalShortcuts {
    pub quit: Vec<String>,
    pub next_screen: Vec<String>,
    pub prev_screen: Vec<String>,
    pub refresh: Vec<String>,
}

/// 一覧画面の共通ショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListShortcuts {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub open: Vec<String>,
    pub new: Vec<String>,
    pub delete: Vec<String>,
    pub filter: Vec<String>,
    /// 一覧画面に付随するフォームへ移る。
    pub form: Vec<String>,
    /// 選択行の処理を開始する（字幕処理・プレビュー確定など）。
    pub action: Vec<String>,
}

/// ジョブ一覧のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsShortcuts {
    pub next_page: Vec<String>,
    pub prev_page: Vec<String>,
    pub open_result: Vec<String>,
    pub watch: Vec<String>,
    pub watch_id: Vec<String>,
}

/// プレビュー画面の「最近のプレビュー」一覧のショートカット。
/// フォーム操作と重ならないキーを使う。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewShortcuts {
    pub older: Vec<String>,
    pub newer: Vec<String>,
    pub load: Vec<String>,
}

/// アカウント一覧のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsShortcuts {
    pub edit: Vec<String>,
    pub settings: Vec<String>,
    pub trigger: Vec<String>,
    pub reload_scheduler: Vec<String>,
    pub remove_schedule: Vec<String>,
}

/// フォーム画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormShortcuts {
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
    pub edit: Vec<String>,
    pub submit: Vec<String>,
    pub cancel: Vec<String>,
}

/// スライダーパネル（アカウント設定）のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelShortcuts {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub decrease: Vec<String>,
    pub increase: Vec<String>,
    pub save: Vec<String>,
    pub voice_preview: Vec<String>,
    pub cancel: Vec<String>,
}

/// ドラフト編集画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorShortcuts {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub edit_text: Vec<String>,
    pub regenerate: Vec<String>,
    pub play_tts: Vec<String>,
    pub open_media: Vec<String>,
    pub toggle_upload: Vec<String>,
    pub finalize: Vec<String>,
    pub back: Vec<String>,
}

/// ウィザード画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardShortcuts {
    pub proceed: Vec<String>,
    pub back: Vec<String>,
    pub toggle: Vec<String>,
}

/// InputBoxのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// TOMLから読み込み、無ければデフォルトを書き出して返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let sc = Self::default();
            sc.save(path)?;
            tracing::info!("wrote default shortcuts to {}", path.display());
            Ok(sc)
        }
    }

    /// TOMLとして保存する。
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn keys(ks: &[&str]) -> Vec<String> {
    ks.iter().map(|k| k.to_string()).collect()
}

impl Default for GlobalShortcuts {
    fn default() -> Self {
        Self {
            quit: keys(&["q"]),
            next_screen: keys(&["]"]),
            prev_screen: keys(&["["]),
            refresh: keys(&["r"]),
        }
    }
}

impl Default for ListShortcuts {
    fn default() -> Self {
        Self {
            up: keys(&["Up", "k"]),
            down: keys(&["Down", "j"]),
            open: keys(&["Enter"]),
            new: keys(&["n"]),
            delete: keys(&["d"]),
            filter: keys(&["f"]),
            form: keys(&["Tab"]),
            action: keys(&["x"]),
        }
    }
}

impl Default for JobsShortcuts {
    fn default() -> Self {
        Self {
            next_page: keys(&["Right", "l", "PageDown"]),
            prev_page: keys(&["Left", "h", "PageUp"]),
            open_result: keys(&["o"]),
            watch: keys(&["w"]),
            watch_id: keys(&["W"]),
        }
    }
}

impl Default for PreviewShortcuts {
    fn default() -> Self {
        Self {
            older: keys(&["PageDown", "J"]),
            newer: keys(&["PageUp", "K"]),
            load: keys(&["L"]),
        }
    }
}

impl Default for AccountsShortcuts {
    fn default() -> Self {
        Self {
            edit: keys(&["e"]),
            settings: keys(&["s"]),
            trigger: keys(&["g"]),
            reload_scheduler: keys(&["R"]),
            remove_schedule: keys(&["X"]),
        }
    }
}

impl Default for FormShortcuts {
    fn default() -> Self {
        Self {
            next_field: keys(&["Tab", "Down", "j"]),
            prev_field: keys(&["BackTab", "Up", "k"]),
            edit: keys(&["Enter", "e", "Space"]),
            submit: keys(&["Ctrl+s", "s"]),
            cancel: keys(&["Esc"]),
        }
    }
}

impl Default for PanelShortcuts {
    fn default() -> Self {
        Self {
            up: keys(&["Up", "k"]),
            down: keys(&["Down", "j"]),
            decrease: keys(&["Left", "h", "-"]),
            increase: keys(&["Right", "l", "+", "Enter"]),
            save: keys(&["s"]),
            voice_preview: keys(&["p"]),
            cancel: keys(&["Esc"]),
        }
    }
}

impl Default for EditorShortcuts {
    fn default() -> Self {
        Self {
            up: keys(&["Up", "k"]),
            down: keys(&["Down", "j"]),
            edit_text: keys(&["e", "Enter"]),
            regenerate: keys(&["g"]),
            play_tts: keys(&["p"]),
            open_media: keys(&["o"]),
            toggle_upload: keys(&["u"]),
            finalize: keys(&["F"]),
            back: keys(&["Esc"]),
        }
    }
}

impl Default for WizardShortcuts {
    fn default() -> Self {
        Self {
            proceed: keys(&["Enter"]),
            back: keys(&["Esc"]),
            toggle: keys(&["Space", "Left", "Right"]),
        }
    }
}

impl Default for InputBoxShortcuts {
    fn default() -> Self {
        Self {
            confirm: keys(&["Enter"]),
            cancel: keys(&["Esc"]),
            backspace: keys(&["Backspace"]),
            delete: keys(&["Delete"]),
            left: keys(&["Left"]),
            right: keys(&["Right"]),
            home: keys(&["Home"]),
            end: keys(&["End"]),
            clear_line: keys(&["Ctrl+u"]),
        }
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            global: GlobalShortcuts::default(),
            list: ListShortcuts::default(),
            jobs: JobsShortcuts::default(),
            preview: PreviewShortcuts::default(),
            accounts: AccountsShortcuts::default(),
            form: FormShortcuts::default(),
            panel: PanelShortcuts::default(),
            editor: EditorShortcuts::default(),
            wizard: WizardShortcuts::default(),
            input_box: InputBoxShortcuts::default(),
        }
    }
}

/// KeyEventがいずれかのショートカット文字列と一致するか判定する。
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts
        .iter()
        .filter_map(|s| parse_shortcut(s))
        .any(|(mods, code)| key_matches(key, mods, code))
}

/// "Ctrl+u" / "Enter" / "G" のような表記を修飾キーとキーコードへ分解する。
fn parse_shortcut(s: &str) -> Option<(KeyModifiers, KeyCode)> {
    // "+" 単体はキーそのものとして扱う。
    let (mod_part, key_part) = match s.rsplit_once('+') {
        Some((m, k)) if !k.is_empty() => (Some(m), k),
        _ => (None, s),
    };

    let mut mods = KeyModifiers::empty();
    for m in mod_part.into_iter().flat_map(|m| m.split('+')) {
        mods |= match m.to_ascii_lowercase().as_str() {
            "ctrl" => KeyModifiers::CONTROL,
            "alt" => KeyModifiers::ALT,
            "shift" => KeyModifiers::SHIFT,
            _ => return None,
        };
    }

    let code = match key_part.to_ascii_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backtab" => KeyCode::BackTab,
        "backspace" => KeyCode::Backspace,
        "delete" => KeyCode::Delete,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "space" => KeyCode::Char(' '),
        _ => {
            let mut chars = key_part.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn key_matches(key: &KeyEvent, mods: KeyModifiers, code: KeyCode) -> bool {
    match (key.code, code) {
        // 文字キーと BackTab は端末によって SHIFT が付くので無視する。
        (KeyCode::Char(_), _) | (KeyCode::BackTab, _) => {
            key.code == code && key.modifiers - KeyModifiers::SHIFT == mods - KeyModifiers::SHIFT
        }
        _ => key.code == code && key.modifiers == mods,
    }
}
