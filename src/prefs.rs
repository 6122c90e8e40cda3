//! User preferences: a typed, persisted store with change notification.
//!
//! Preferences only prefill forms on other screens. They are never sent to the
//! backend as-is and are not authoritative.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::sync::watch;

pub const TTS_SPEED_RANGE: (f64, f64) = (0.5, 2.0);
pub const TTS_PITCH_RANGE: (i32, i32) = (-10, 10);

/// Display and prefill preferences stored in `prefs.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Language used for TTS tests and subtitle translation.
    pub language: String,
    /// Script generation provider (`auto`, `gemini`, `openai`, ...).
    pub ai_provider: String,
    pub gemini_model: String,
    /// Region code used for trend searches.
    pub default_region: String,
    /// `short` or `long`.
    pub default_format: String,
    pub default_tone: String,
    /// TTS playback speed multiplier.
    pub tts_speed: f64,
    /// TTS pitch offset in semitones.
    pub tts_pitch: i32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "ko".into(),
            ai_provider: "auto".into(),
            gemini_model: "gemini-1.5-flash".into(),
            default_region: "KR".into(),
            default_format: "short".into(),
            default_tone: "informative".into(),
            tts_speed: 1.2,
            tts_pitch: 0,
        }
    }
}

impl Preferences {
    /// Clamp numeric fields into their slider ranges.
    fn normalize(&mut self) {
        self.tts_speed = self.tts_speed.clamp(TTS_SPEED_RANGE.0, TTS_SPEED_RANGE.1);
        self.tts_pitch = self.tts_pitch.clamp(TTS_PITCH_RANGE.0, TTS_PITCH_RANGE.1);
        if self.default_region.trim().is_empty() {
            self.default_region = Self::default().default_region;
        }
    }

    /// Video format string expected by `/api/videos/create` and drafts.
    pub fn video_format(&self) -> &'static str {
        if self.default_format == "long" {
            "landscape"
        } else {
            "shorts"
        }
    }
}

/// Owner of the current preferences. Every update is persisted and then
/// published to all subscribers.
pub struct PrefsStore {
    path: PathBuf,
    tx: watch::Sender<Preferences>,
}

impl PrefsStore {
    /// Open the store, falling back to defaults when the file is missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut prefs = load(&path)?;
        prefs.normalize();
        let (tx, _rx) = watch::channel(prefs);
        Ok(Self { path, tx })
    }

    /// Snapshot of the current values.
    pub fn current(&self) -> Preferences {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every later update.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.tx.subscribe()
    }

    /// Apply a change, persist it, and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut Preferences)) -> Result<Preferences> {
        let mut next = self.current();
        f(&mut next);
        next.normalize();
        save(&self.path, &next)?;
        tracing::info!("preferences saved to {}", self.path.display());
        self.tx.send_replace(next.clone());
        Ok(next)
    }
}

fn load(path: &Path) -> Result<Preferences> {
    if path.exists() {
        let s = fs::read_to_string(path)?;
        Ok(toml::from_str(&s)?)
    } else {
        Ok(Preferences::default())
    }
}

fn save(path: &Path, prefs: &Preferences) -> Result<()> {
    let s = toml::to_string_pretty(prefs)?;
    fs::write(path, s)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_notifies_subscribers_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        let store = PrefsStore::open(&path).unwrap();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.update(|p| p.default_region = "US".into()).unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().default_region, "US");

        let reopened = PrefsStore::open(&path).unwrap();
        assert_eq!(reopened.current().default_region, "US");
    }

    #[test]
    fn numeric_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefsStore::open(dir.path().join("prefs.toml")).unwrap();
        let p = store
            .update(|p| {
                p.tts_speed = 9.0;
                p.tts_pitch = -40;
            })
            .unwrap();
        assert_eq!(p.tts_speed, 2.0);
        assert_eq!(p.tts_pitch, -10);
    }

    #[test]
    fn partial_file_uses_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        fs::write(&path, "default_tone = \"funny\"\n").unwrap();
        let store = PrefsStore::open(&path).unwrap();
        let p = store.current();
        assert_eq!(p.default_tone, "funny");
        assert_eq!(p.language, "ko");
        assert_eq!(p.video_format(), "shorts");
    }
}
