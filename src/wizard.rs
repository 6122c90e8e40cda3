//! 動画作成ウィザードのステート管理。

use crate::{
    api::types::CreateVideoRequest,
    forms::{DURATION_RANGE, FormError},
    prefs::Preferences,
};

/// ウィザードの各ステップ
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardStep {
    /// トピック（空ならバックエンドがトレンドから選ぶ）
    Topic,
    /// shorts / landscape
    Format,
    /// 長さ（秒）
    Duration,
    /// 完成後にアップロードするか
    Upload,
    /// 内容確認
    Confirm,
}

impl WizardStep {
    const ORDER: [WizardStep; 5] = [
        WizardStep::Topic,
        WizardStep::Format,
        WizardStep::Duration,
        WizardStep::Upload,
        WizardStep::Confirm,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }
}

/// ウィザードの状態管理
#[derive(Clone, Debug, PartialEq)]
pub struct CreateWizard {
    pub step: WizardStep,
    pub topic: String,
    pub format: String,
    pub duration: u32,
    pub upload: bool,
}

impl CreateWizard {
    /// 設定値を初期値にして最初のステップから始める。
    pub fn new(prefs: &Preferences) -> Self {
        Self {
            step: WizardStep::Topic,
            topic: String::new(),
            format: prefs.video_format().into(),
            duration: 60,
            upload: false,
        }
    }

    /// 次のステップへ進む（Confirmで止まる）。
    pub fn next_step(&mut self) {
        let i = (self.step.index() + 1).min(WizardStep::ORDER.len() - 1);
        self.step = WizardStep::ORDER[i];
    }

    /// 前のステップへ戻る。先頭なら false。
    pub fn prev_step(&mut self) -> bool {
        match self.step.index() {
            0 => false,
            i => {
                self.step = WizardStep::ORDER[i - 1];
                true
            }
        }
    }

    /// 選択式ステップの値を切り替える。
    pub fn toggle(&mut self) {
        match self.step {
            WizardStep::Format => {
                self.format = if self.format == "shorts" {
                    "landscape".into()
                } else {
                    "shorts".into()
                };
            }
            WizardStep::Upload => self.upload = !self.upload,
            _ => {}
        }
    }

    /// 入力された長さを検証して反映する。
    pub fn set_duration(&mut self, value: &str) -> Result<(), FormError> {
        let d: u32 = value
            .trim()
            .parse()
            .map_err(|_| FormError::NotNumber("Duration"))?;
        let (min, max) = DURATION_RANGE;
        if !(min..=max).contains(&d) {
            return Err(FormError::OutOfRange {
                field: "Duration",
                min: min.into(),
                max: max.into(),
            });
        }
        self.duration = d;
        Ok(())
    }

    /// 現在のステップ番号（1始まり）と全ステップ数。
    pub fn progress(&self) -> (usize, usize) {
        (self.step.index() + 1, WizardStep::ORDER.len())
    }

    /// 現在のステップの説明文。
    pub fn prompt(&self) -> String {
        match self.step {
            WizardStep::Topic => format!(
                "Topic\n\nWhat should the video be about?\nLeave empty to let the backend pick a trending topic.\n\nCurrent: {}\n\nEnter to edit, then continue.",
                if self.topic.is_empty() { "(trending)" } else { self.topic.as_str() }
            ),
            WizardStep::Format => format!(
                "Format\n\n{}\n\nSpace switches between shorts (9:16) and landscape (16:9).\nEnter to continue.",
                self.format
            ),
            WizardStep::Duration => format!(
                "Duration\n\n{} seconds\n\nEnter to type a length between {} and {} seconds.",
                self.duration, DURATION_RANGE.0, DURATION_RANGE.1
            ),
            WizardStep::Upload => format!(
                "Upload\n\nUpload to YouTube when rendering finishes: {}\n\nSpace toggles. Enter to continue.",
                if self.upload { "yes" } else { "no" }
            ),
            WizardStep::Confirm => format!(
                "Confirm\n\nTopic:    {}\nFormat:   {}\nDuration: {}s\nUpload:   {}\n\nEnter starts the job. Esc goes back.",
                if self.topic.is_empty() { "(trending)" } else { self.topic.as_str() },
                self.format,
                self.duration,
                if self.upload { "yes" } else { "no" }
            ),
        }
    }

    /// `/api/videos/create` 用のリクエストを組み立てる。
    pub fn to_request(&self, prefs: &Preferences) -> CreateVideoRequest {
        let topic = self.topic.trim();
        CreateVideoRequest {
            topic: (!topic.is_empty()).then(|| topic.to_string()),
            format: self.format.clone(),
            duration: self.duration,
            upload: self.upload,
            ai_provider: prefs.ai_provider.clone(),
            tts_provider: "gtts".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_run_in_order_and_stop_at_confirm() {
        let mut w = CreateWizard::new(&Preferences::default());
        assert!(!w.prev_step());
        for _ in 0..10 {
            w.next_step();
        }
        assert_eq!(w.step, WizardStep::Confirm);
        assert_eq!(w.progress(), (5, 5));
        assert!(w.prev_step());
        assert_eq!(w.step, WizardStep::Upload);
    }

    #[test]
    fn empty_topic_is_sent_as_none() {
        let prefs = Preferences::default();
        let mut w = CreateWizard::new(&prefs);
        w.topic = "  ".into();
        let req = w.to_request(&prefs);
        assert_eq!(req.topic, None);
        assert_eq!(req.format, "shorts");
        assert_eq!(req.ai_provider, "auto");

        w.topic = "deep sea fish".into();
        assert_eq!(w.to_request(&prefs).topic.as_deref(), Some("deep sea fish"));
    }

    #[test]
    fn toggles_only_apply_to_choice_steps() {
        let mut w = CreateWizard::new(&Preferences::default());
        w.toggle();
        assert_eq!(w.format, "shorts");
        w.next_step();
        w.toggle();
        assert_eq!(w.format, "landscape");
        w.next_step();
        w.next_step();
        w.toggle();
        assert!(w.upload);
    }

    #[test]
    fn duration_is_range_checked() {
        let mut w = CreateWizard::new(&Preferences::default());
        assert_eq!(w.set_duration("abc"), Err(FormError::NotNumber("Duration")));
        assert!(w.set_duration("5").is_err());
        w.set_duration(" 120 ").unwrap();
        assert_eq!(w.duration, 120);
    }
}
