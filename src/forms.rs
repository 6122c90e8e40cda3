//! Form state behind the resource screens and its client-side validation.
//!
//! Only required fields and numeric ranges are checked here; everything else
//! is left to the backend.

use std::str::FromStr;

use thiserror::Error;

use crate::{
    api::types::{
        Account, AccountCreate, AccountSettings, AccountUpdate, BGM_MOODS, BatchStartRequest,
        ChannelType, PreviewGenerateRequest, Voice,
    },
    prefs::{Preferences, TTS_PITCH_RANGE, TTS_SPEED_RANGE},
};

/// Why a form could not be submitted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0} must be a number")]
    NotNumber(&'static str),
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A form made of labelled fields edited one at a time.
pub trait FieldForm {
    fn labels(&self) -> &'static [&'static str];

    fn value(&self, idx: usize) -> String;

    /// Apply text typed into the input box.
    fn set(&mut self, idx: usize, value: String) -> Result<(), FormError>;

    /// Flip or rotate a choice field in place. Free-text fields return false
    /// and are edited through the input box instead.
    fn cycle(&mut self, _idx: usize) -> bool {
        false
    }

    fn len(&self) -> usize {
        self.labels().len()
    }
}

fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    let v = value.trim();
    if v.is_empty() {
        Err(FormError::Required(field))
    } else {
        Ok(v.to_string())
    }
}

fn parse_num<T: FromStr>(field: &'static str, value: &str) -> Result<T, FormError> {
    value
        .trim()
        .parse()
        .map_err(|_| FormError::NotNumber(field))
}

fn in_range<T>(field: &'static str, v: T, min: T, max: T) -> Result<T, FormError>
where
    T: PartialOrd + Into<f64> + Copy,
{
    if v < min || v > max {
        Err(FormError::OutOfRange {
            field,
            min: min.into(),
            max: max.into(),
        })
    } else {
        Ok(v)
    }
}

/// Next entry of `choices` after `current`, wrapping around.
fn next_choice(choices: &[&str], current: &str) -> String {
    let i = choices.iter().position(|c| *c == current);
    let next = i.map(|i| (i + 1) % choices.len()).unwrap_or(0);
    choices[next].to_string()
}

fn yes_no(b: bool) -> String {
    if b { "yes".into() } else { "no".into() }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Create or edit form of a channel account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountForm {
    /// Set when editing an existing account.
    pub editing: Option<i64>,
    pub channel_name: String,
    pub channel_type: ChannelType,
    pub default_prompt_style: String,
    pub upload_schedule: String,
    pub is_active: bool,
}

impl AccountForm {
    pub fn new() -> Self {
        Self {
            editing: None,
            channel_name: String::new(),
            channel_type: ChannelType::Info,
            default_prompt_style: "informative".into(),
            upload_schedule: String::new(),
            is_active: true,
        }
    }

    pub fn from_account(a: &Account) -> Self {
        Self {
            editing: Some(a.id),
            channel_name: a.channel_name.clone(),
            channel_type: a.channel_type,
            default_prompt_style: a.default_prompt_style.clone(),
            upload_schedule: a.upload_schedule.clone().unwrap_or_default(),
            is_active: a.is_active,
        }
    }

    /// Cron string with five fields, or nothing.
    fn schedule(&self) -> Result<Option<String>, FormError> {
        let s = self.upload_schedule.trim();
        if s.is_empty() {
            return Ok(None);
        }
        let parts = s.split_whitespace().count();
        if parts != 5 {
            return Err(FormError::Invalid {
                field: "Upload schedule",
                reason: format!("expected 5 cron fields, got {parts}"),
            });
        }
        Ok(Some(s.to_string()))
    }

    pub fn to_create(&self) -> Result<AccountCreate, FormError> {
        Ok(AccountCreate {
            channel_name: required("Channel name", &self.channel_name)?,
            channel_type: self.channel_type,
            default_prompt_style: self.default_prompt_style.trim().to_string(),
            upload_schedule: self.schedule()?,
            is_active: self.is_active,
        })
    }

    pub fn to_update(&self) -> Result<AccountUpdate, FormError> {
        Ok(AccountUpdate {
            channel_name: Some(required("Channel name", &self.channel_name)?),
            channel_type: Some(self.channel_type),
            upload_schedule: Some(self.schedule()?.unwrap_or_default()),
            is_active: Some(self.is_active),
        })
    }
}

impl Default for AccountForm {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldForm for AccountForm {
    fn labels(&self) -> &'static [&'static str] {
        &[
            "Channel name",
            "Channel type",
            "Prompt style",
            "Upload schedule (cron)",
            "Active",
        ]
    }

    fn value(&self, idx: usize) -> String {
        match idx {
            0 => self.channel_name.clone(),
            1 => self.channel_type.label().into(),
            2 => self.default_prompt_style.clone(),
            3 => self.upload_schedule.clone(),
            4 => yes_no(self.is_active),
            _ => String::new(),
        }
    }

    fn set(&mut self, idx: usize, value: String) -> Result<(), FormError> {
        match idx {
            0 => self.channel_name = value,
            2 => self.default_prompt_style = value,
            3 => self.upload_schedule = value,
            _ => {}
        }
        Ok(())
    }

    fn cycle(&mut self, idx: usize) -> bool {
        match idx {
            1 => self.channel_type = self.channel_type.cycle(),
            4 => self.is_active = !self.is_active,
            _ => return false,
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Account settings panel
// ---------------------------------------------------------------------------

pub const SLIDER_STEP: f64 = 0.05;
pub const DURATION_STEP: u32 = 10;
pub const DURATION_RANGE: (u32, u32) = (10, 600);

/// Move a 0.0..=1.0 slider by `steps` increments, rounded to two decimals.
pub fn step_slider(value: f64, steps: i32) -> f64 {
    let v = (value + SLIDER_STEP * f64::from(steps)).clamp(0.0, 1.0);
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Provider,
    Voice,
    Stability,
    Similarity,
    Style,
    Format,
    Duration,
    BgmEnabled,
    BgmVolume,
}

impl SettingsField {
    pub const ALL: [SettingsField; 9] = [
        SettingsField::Provider,
        SettingsField::Voice,
        SettingsField::Stability,
        SettingsField::Similarity,
        SettingsField::Style,
        SettingsField::Format,
        SettingsField::Duration,
        SettingsField::BgmEnabled,
        SettingsField::BgmVolume,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Provider => "TTS provider",
            SettingsField::Voice => "Voice",
            SettingsField::Stability => "Stability",
            SettingsField::Similarity => "Similarity boost",
            SettingsField::Style => "Style",
            SettingsField::Format => "Default format",
            SettingsField::Duration => "Default duration (s)",
            SettingsField::BgmEnabled => "BGM",
            SettingsField::BgmVolume => "BGM volume",
        }
    }

    pub fn is_slider(self) -> bool {
        matches!(
            self,
            SettingsField::Stability
                | SettingsField::Similarity
                | SettingsField::Style
                | SettingsField::BgmVolume
        )
    }
}

/// TTS/format/BGM settings of one account being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsPanel {
    pub account_id: i64,
    pub settings: AccountSettings,
    pub field: usize,
    pub voices: Vec<Voice>,
}

impl SettingsPanel {
    pub fn new(account_id: i64, settings: AccountSettings) -> Self {
        Self {
            account_id,
            settings,
            field: 0,
            voices: vec![],
        }
    }

    pub fn current(&self) -> SettingsField {
        SettingsField::ALL[self.field.min(SettingsField::ALL.len() - 1)]
    }

    pub fn next_field(&mut self) {
        self.field = (self.field + 1) % SettingsField::ALL.len();
    }

    pub fn prev_field(&mut self) {
        self.field = (self.field + SettingsField::ALL.len() - 1) % SettingsField::ALL.len();
    }

    pub fn uses_elevenlabs(&self) -> bool {
        self.settings.tts_provider == "elevenlabs"
    }

    /// Adjust the focused field one step in `dir` (-1 or +1).
    pub fn adjust(&mut self, dir: i32) {
        let cur = self.current();
        let s = &mut self.settings;
        match cur {
            SettingsField::Provider => {
                s.tts_provider = next_choice(&["gtts", "elevenlabs"], &s.tts_provider);
            }
            SettingsField::Voice => {
                if self.voices.is_empty() {
                    return;
                }
                let n = self.voices.len() as i32;
                let i = s
                    .tts_voice_id
                    .as_deref()
                    .and_then(|id| self.voices.iter().position(|v| v.voice_id == id))
                    .map(|i| i as i32)
                    .unwrap_or(-1);
                let next = (i + dir).rem_euclid(n) as usize;
                s.tts_voice_id = Some(self.voices[next].voice_id.clone());
            }
            SettingsField::Stability => s.tts_stability = step_slider(s.tts_stability, dir),
            SettingsField::Similarity => {
                s.tts_similarity_boost = step_slider(s.tts_similarity_boost, dir)
            }
            SettingsField::Style => s.tts_style = step_slider(s.tts_style, dir),
            SettingsField::Format => {
                s.default_format = next_choice(&["shorts", "landscape"], &s.default_format);
            }
            SettingsField::Duration => {
                let (min, max) = DURATION_RANGE;
                let d = if dir < 0 {
                    s.default_duration.saturating_sub(DURATION_STEP)
                } else {
                    s.default_duration + DURATION_STEP
                };
                s.default_duration = d.clamp(min, max);
            }
            SettingsField::BgmEnabled => s.bgm_enabled = !s.bgm_enabled,
            SettingsField::BgmVolume => s.bgm_volume = step_slider(s.bgm_volume, dir),
        }
    }

    pub fn display(&self, field: SettingsField) -> String {
        let s = &self.settings;
        match field {
            SettingsField::Provider => s.tts_provider.clone(),
            SettingsField::Voice => {
                let id = s.tts_voice_id.as_deref().unwrap_or("-");
                self.voices
                    .iter()
                    .find(|v| v.voice_id == id)
                    .map(|v| v.name.clone())
                    .unwrap_or_else(|| id.to_string())
            }
            SettingsField::Stability => slider_bar(s.tts_stability),
            SettingsField::Similarity => slider_bar(s.tts_similarity_boost),
            SettingsField::Style => slider_bar(s.tts_style),
            SettingsField::Format => s.default_format.clone(),
            SettingsField::Duration => s.default_duration.to_string(),
            SettingsField::BgmEnabled => yes_no(s.bgm_enabled),
            SettingsField::BgmVolume => slider_bar(s.bgm_volume),
        }
    }

    /// Settings ready to `PUT`, checked against the slider and duration ranges.
    pub fn validated(&self) -> Result<AccountSettings, FormError> {
        let s = &self.settings;
        for (field, v) in [
            ("Stability", s.tts_stability),
            ("Similarity boost", s.tts_similarity_boost),
            ("Style", s.tts_style),
            ("BGM volume", s.bgm_volume),
        ] {
            in_range(field, v, 0.0, 1.0)?;
        }
        let (min, max) = DURATION_RANGE;
        in_range("Default duration", s.default_duration, min, max)?;
        Ok(s.clone())
    }
}

/// `[#####-----] 0.50`
fn slider_bar(v: f64) -> String {
    let filled = (v.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("[{}{}] {v:.2}", "#".repeat(filled), "-".repeat(10 - filled))
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

pub const TEMPLATES: [&str; 3] = ["basic", "documentary", "entertainment"];

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewForm {
    pub topic: String,
    pub format: String,
    pub duration: u32,
    pub template_name: String,
    pub low_resolution: bool,
}

impl PreviewForm {
    pub fn from_prefs(p: &Preferences) -> Self {
        Self {
            topic: String::new(),
            format: p.video_format().into(),
            duration: 60,
            template_name: TEMPLATES[0].into(),
            low_resolution: true,
        }
    }

    pub fn to_request(&self) -> Result<PreviewGenerateRequest, FormError> {
        let (min, max) = DURATION_RANGE;
        Ok(PreviewGenerateRequest {
            topic: required("Topic", &self.topic)?,
            format: self.format.clone(),
            duration: in_range("Duration", self.duration, min, max)?,
            template_name: self.template_name.clone(),
            account_id: None,
            low_resolution: self.low_resolution,
        })
    }
}

impl FieldForm for PreviewForm {
    fn labels(&self) -> &'static [&'static str] {
        &["Topic", "Format", "Duration (s)", "Template", "Low resolution"]
    }

    fn value(&self, idx: usize) -> String {
        match idx {
            0 => self.topic.clone(),
            1 => self.format.clone(),
            2 => self.duration.to_string(),
            3 => self.template_name.clone(),
            4 => yes_no(self.low_resolution),
            _ => String::new(),
        }
    }

    fn set(&mut self, idx: usize, value: String) -> Result<(), FormError> {
        match idx {
            0 => self.topic = value,
            2 => self.duration = parse_num("Duration", &value)?,
            _ => {}
        }
        Ok(())
    }

    fn cycle(&mut self, idx: usize) -> bool {
        match idx {
            1 => self.format = next_choice(&["shorts", "landscape"], &self.format),
            3 => self.template_name = next_choice(&TEMPLATES, &self.template_name),
            4 => self.low_resolution = !self.low_resolution,
            _ => return false,
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Batch remix
// ---------------------------------------------------------------------------

const REGIONS: [&str; 4] = ["US", "KR", "JP", "GB"];
const CATEGORIES: [&str; 3] = ["Science & Technology", "Education", "Entertainment"];
const LENGTHS: [&str; 3] = ["short", "medium", "long"];
const TARGET_LANGS: [&str; 3] = ["ko", "ja", "zh"];

#[derive(Debug, Clone, PartialEq)]
pub struct BatchForm {
    pub region: String,
    pub category: String,
    pub max_videos: u32,
    pub duration: String,
    pub min_views: u64,
    pub target_lang: String,
}

impl Default for BatchForm {
    fn default() -> Self {
        Self {
            region: "US".into(),
            category: CATEGORIES[0].into(),
            max_videos: 3,
            duration: "short".into(),
            min_views: 10_000,
            target_lang: "ko".into(),
        }
    }
}

impl BatchForm {
    pub fn to_request(&self) -> Result<BatchStartRequest, FormError> {
        Ok(BatchStartRequest {
            region: self.region.clone(),
            category: self.category.clone(),
            max_videos: in_range("Max videos", self.max_videos, 1, 10)?,
            duration: self.duration.clone(),
            min_views: self.min_views,
            target_lang: self.target_lang.clone(),
        })
    }
}

impl FieldForm for BatchForm {
    fn labels(&self) -> &'static [&'static str] {
        &[
            "Region",
            "Category",
            "Max videos",
            "Length",
            "Min views",
            "Target language",
        ]
    }

    fn value(&self, idx: usize) -> String {
        match idx {
            0 => self.region.clone(),
            1 => self.category.clone(),
            2 => self.max_videos.to_string(),
            3 => self.duration.clone(),
            4 => self.min_views.to_string(),
            5 => self.target_lang.clone(),
            _ => String::new(),
        }
    }

    fn set(&mut self, idx: usize, value: String) -> Result<(), FormError> {
        match idx {
            2 => self.max_videos = parse_num("Max videos", &value)?,
            4 => self.min_views = parse_num("Min views", &value)?,
            _ => {}
        }
        Ok(())
    }

    fn cycle(&mut self, idx: usize) -> bool {
        match idx {
            0 => self.region = next_choice(&REGIONS, &self.region),
            1 => self.category = next_choice(&CATEGORIES, &self.category),
            3 => self.duration = next_choice(&LENGTHS, &self.duration),
            5 => self.target_lang = next_choice(&TARGET_LANGS, &self.target_lang),
            _ => return false,
        }
        true
    }
}

// ---------------------------------------------------------------------------
// BGM upload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BgmUploadForm {
    pub file_path: String,
    pub name: String,
    pub mood: String,
}

/// Checked BGM upload arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct BgmUpload {
    pub file_path: String,
    pub name: String,
    pub mood: String,
}

impl Default for BgmUploadForm {
    fn default() -> Self {
        Self {
            file_path: String::new(),
            name: String::new(),
            mood: BGM_MOODS[0].into(),
        }
    }
}

impl BgmUploadForm {
    pub fn validated(&self) -> Result<BgmUpload, FormError> {
        Ok(BgmUpload {
            file_path: required("File path", &self.file_path)?,
            name: required("Name", &self.name)?,
            mood: self.mood.clone(),
        })
    }
}

impl FieldForm for BgmUploadForm {
    fn labels(&self) -> &'static [&'static str] {
        &["File path", "Name", "Mood"]
    }

    fn value(&self, idx: usize) -> String {
        match idx {
            0 => self.file_path.clone(),
            1 => self.name.clone(),
            2 => self.mood.clone(),
            _ => String::new(),
        }
    }

    fn set(&mut self, idx: usize, value: String) -> Result<(), FormError> {
        match idx {
            0 => self.file_path = value,
            1 => self.name = value,
            _ => {}
        }
        Ok(())
    }

    fn cycle(&mut self, idx: usize) -> bool {
        if idx == 2 {
            self.mood = next_choice(&BGM_MOODS, &self.mood);
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Studio tools
// ---------------------------------------------------------------------------

const PRIVACY: [&str; 3] = ["private", "unlisted", "public"];

/// Shared inputs of the studio tool actions.
#[derive(Debug, Clone, PartialEq)]
pub struct StudioForm {
    pub keywords: String,
    pub url: String,
    pub video_path: String,
    pub text: String,
    pub privacy: String,
}

impl Default for StudioForm {
    fn default() -> Self {
        Self {
            keywords: String::new(),
            url: String::new(),
            video_path: String::new(),
            text: String::new(),
            privacy: "private".into(),
        }
    }
}

impl StudioForm {
    pub fn keywords(&self) -> Result<String, FormError> {
        required("Keywords", &self.keywords)
    }

    pub fn url(&self) -> Result<String, FormError> {
        required("URL", &self.url)
    }

    pub fn video_path(&self) -> Result<String, FormError> {
        required("Video path", &self.video_path)
    }

    pub fn text(&self) -> Result<String, FormError> {
        required("Text", &self.text)
    }
}

impl FieldForm for StudioForm {
    fn labels(&self) -> &'static [&'static str] {
        &["Keywords", "URL", "Video path", "Text / script", "Privacy"]
    }

    fn value(&self, idx: usize) -> String {
        match idx {
            0 => self.keywords.clone(),
            1 => self.url.clone(),
            2 => self.video_path.clone(),
            3 => self.text.clone(),
            4 => self.privacy.clone(),
            _ => String::new(),
        }
    }

    fn set(&mut self, idx: usize, value: String) -> Result<(), FormError> {
        match idx {
            0 => self.keywords = value,
            1 => self.url = value,
            2 => self.video_path = value,
            3 => self.text = value,
            _ => {}
        }
        Ok(())
    }

    fn cycle(&mut self, idx: usize) -> bool {
        if idx == 4 {
            self.privacy = next_choice(&PRIVACY, &self.privacy);
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

const LANGUAGES: [&str; 3] = ["ko", "en", "ja"];
const AI_PROVIDERS: [&str; 3] = ["auto", "gemini", "openai"];
const FORMATS: [&str; 2] = ["short", "long"];

/// Editable copy of the stored preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefsForm {
    pub prefs: Preferences,
}

impl FieldForm for PrefsForm {
    fn labels(&self) -> &'static [&'static str] {
        &[
            "Language",
            "AI provider",
            "Gemini model",
            "Default region",
            "Default format",
            "Default tone",
            "TTS speed",
            "TTS pitch",
        ]
    }

    fn value(&self, idx: usize) -> String {
        let p = &self.prefs;
        match idx {
            0 => p.language.clone(),
            1 => p.ai_provider.clone(),
            2 => p.gemini_model.clone(),
            3 => p.default_region.clone(),
            4 => p.default_format.clone(),
            5 => p.default_tone.clone(),
            6 => format!("{:.1}", p.tts_speed),
            7 => p.tts_pitch.to_string(),
            _ => String::new(),
        }
    }

    fn set(&mut self, idx: usize, value: String) -> Result<(), FormError> {
        let p = &mut self.prefs;
        match idx {
            2 => p.gemini_model = required("Gemini model", &value)?,
            3 => p.default_region = value.trim().to_uppercase(),
            5 => p.default_tone = value.trim().to_string(),
            6 => {
                let (min, max) = TTS_SPEED_RANGE;
                let speed: f64 = parse_num("TTS speed", &value)?;
                p.tts_speed = in_range("TTS speed", speed, min, max)?;
            }
            7 => {
                let (min, max) = TTS_PITCH_RANGE;
                let pitch: i32 = parse_num("TTS pitch", &value)?;
                p.tts_pitch = in_range("TTS pitch", pitch, min, max)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn cycle(&mut self, idx: usize) -> bool {
        let p = &mut self.prefs;
        match idx {
            0 => p.language = next_choice(&LANGUAGES, &p.language),
            1 => p.ai_provider = next_choice(&AI_PROVIDERS, &p.ai_provider),
            4 => p.default_format = next_choice(&FORMATS, &p.default_format),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_requires_channel_name() {
        let mut f = AccountForm::new();
        f.channel_name = "   ".into();
        assert_eq!(f.to_create(), Err(FormError::Required("Channel name")));

        f.set(0, " Tech Daily ".into()).unwrap();
        let body = f.to_create().unwrap();
        assert_eq!(body.channel_name, "Tech Daily");
        assert_eq!(body.upload_schedule, None);
    }

    #[test]
    fn account_schedule_needs_five_cron_fields() {
        let mut f = AccountForm::new();
        f.channel_name = "c".into();
        f.upload_schedule = "0 9 * *".into();
        assert!(matches!(f.to_create(), Err(FormError::Invalid { .. })));
        f.upload_schedule = "0 9 * * *".into();
        assert_eq!(
            f.to_update().unwrap().upload_schedule.as_deref(),
            Some("0 9 * * *")
        );
    }

    #[test]
    fn choice_fields_cycle_and_text_fields_do_not() {
        let mut f = AccountForm::new();
        assert!(f.cycle(4));
        assert!(!f.is_active);
        assert!(f.cycle(1));
        assert_eq!(f.channel_type, ChannelType::Humor);
        assert!(!f.cycle(0));
    }

    #[test]
    fn sliders_step_by_five_hundredths_and_clamp() {
        assert_eq!(step_slider(0.5, 1), 0.55);
        assert_eq!(step_slider(0.5, -1), 0.45);
        assert_eq!(step_slider(0.98, 1), 1.0);
        assert_eq!(step_slider(0.02, -1), 0.0);
        // No float drift after many steps.
        let mut v = 0.0;
        for _ in 0..7 {
            v = step_slider(v, 1);
        }
        assert_eq!(v, 0.35);
    }

    #[test]
    fn settings_panel_adjusts_focused_field() {
        let mut p = SettingsPanel::new(1, AccountSettings::default());
        p.field = SettingsField::ALL
            .iter()
            .position(|f| *f == SettingsField::Stability)
            .unwrap();
        p.adjust(1);
        assert_eq!(p.settings.tts_stability, 0.55);

        p.field = SettingsField::ALL
            .iter()
            .position(|f| *f == SettingsField::Duration)
            .unwrap();
        p.settings.default_duration = 600;
        p.adjust(1);
        assert_eq!(p.settings.default_duration, 600);
        p.settings.default_duration = 10;
        p.adjust(-1);
        assert_eq!(p.settings.default_duration, 10);

        p.field = 0;
        p.adjust(1);
        assert!(p.uses_elevenlabs());
    }

    #[test]
    fn voice_field_cycles_loaded_voices() {
        let mut p = SettingsPanel::new(1, AccountSettings::default());
        p.voices = ["a", "b"]
            .iter()
            .map(|id| Voice {
                voice_id: id.to_string(),
                name: id.to_uppercase(),
                language: None,
                description: String::new(),
            })
            .collect();
        p.field = 1;
        p.adjust(1);
        assert_eq!(p.settings.tts_voice_id.as_deref(), Some("a"));
        p.adjust(1);
        assert_eq!(p.settings.tts_voice_id.as_deref(), Some("b"));
        p.adjust(1);
        assert_eq!(p.settings.tts_voice_id.as_deref(), Some("a"));
        assert_eq!(p.display(SettingsField::Voice), "A");
    }

    #[test]
    fn settings_out_of_range_is_rejected() {
        let mut p = SettingsPanel::new(1, AccountSettings::default());
        p.settings.bgm_volume = 1.5;
        assert!(matches!(
            p.validated(),
            Err(FormError::OutOfRange { field: "BGM volume", .. })
        ));
    }

    #[test]
    fn preview_requires_topic() {
        let mut f = PreviewForm::from_prefs(&Preferences::default());
        assert_eq!(f.to_request(), Err(FormError::Required("Topic")));
        f.topic = "black holes".into();
        let req = f.to_request().unwrap();
        assert_eq!(req.format, "shorts");
        assert_eq!(req.template_name, "basic");
    }

    #[test]
    fn numeric_fields_reject_text() {
        let mut f = BatchForm::default();
        assert_eq!(f.set(2, "many".into()), Err(FormError::NotNumber("Max videos")));
        f.set(2, "20".into()).unwrap();
        assert!(matches!(f.to_request(), Err(FormError::OutOfRange { .. })));
    }

    #[test]
    fn bgm_upload_requires_path_and_name() {
        let mut f = BgmUploadForm::default();
        f.file_path = "/music/calm.mp3".into();
        assert_eq!(f.validated(), Err(FormError::Required("Name")));
        f.name = "calm piano".into();
        assert_eq!(f.validated().unwrap().mood, "HAPPY");
    }

    #[test]
    fn prefs_form_checks_tts_ranges() {
        let mut f = PrefsForm {
            prefs: Preferences::default(),
        };
        assert!(f.set(6, "3.0".into()).is_err());
        f.set(6, "1.5".into()).unwrap();
        assert_eq!(f.prefs.tts_speed, 1.5);
        assert!(f.set(7, "-11".into()).is_err());
        f.set(3, " us ".into()).unwrap();
        assert_eq!(f.prefs.default_region, "US");
    }
}
