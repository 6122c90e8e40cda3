//! BGM library and TTS wrappers.

use std::collections::BTreeMap;

use reqwest::multipart::{Form, Part};

use super::{
    Ack, ApiClient, ApiError,
    jobs::reject_unsuccessful,
    types::{BgmEntry, BgmList, MoodInfo, MoodList, TtsPreviewRequest, TtsTestRequest, Voice, VoiceList},
};

pub async fn bgm_list(api: &ApiClient) -> Result<Vec<BgmEntry>, ApiError> {
    let list: BgmList = api.get("/api/bgm/list").await?;
    Ok(list.bgm_files)
}

pub async fn bgm_moods(api: &ApiClient) -> Result<Vec<MoodInfo>, ApiError> {
    let list: MoodList = api.get("/api/bgm/moods").await?;
    Ok(list.moods)
}

/// Upload audio bytes into the mood folder of the library.
pub async fn bgm_upload(
    api: &ApiClient,
    bytes: Vec<u8>,
    file_name: String,
    mood: &str,
    name: &str,
) -> Result<Option<String>, ApiError> {
    let form = Form::new()
        .part("file", Part::bytes(bytes).file_name(file_name))
        .text("mood", mood.to_string())
        .text("name", name.to_string());
    let ack: Ack = api
        .long_running()
        .post_multipart(
            &format!("/api/bgm/upload?mood={}", urlencoding::encode(mood)),
            form,
        )
        .await?;
    ack.into_result()
}

/// Group library entries by mood for display. Moods keep sorted order.
pub fn group_by_mood(entries: &[BgmEntry]) -> BTreeMap<String, Vec<&BgmEntry>> {
    let mut grouped: BTreeMap<String, Vec<&BgmEntry>> = BTreeMap::new();
    for e in entries {
        grouped.entry(e.mood.to_uppercase()).or_default().push(e);
    }
    grouped
}

pub async fn tts_voices(api: &ApiClient) -> Result<Vec<Voice>, ApiError> {
    let list: VoiceList = api.get("/api/tts/voices").await?;
    Ok(list.voices)
}

/// Synthesize a short sample with the given voice settings; returns audio bytes.
pub async fn tts_preview(api: &ApiClient, req: &TtsPreviewRequest<'_>) -> Result<Vec<u8>, ApiError> {
    api.post_for_bytes("/api/tts/preview", req).await
}

/// Backend-side TTS smoke test with language, speed and pitch.
pub async fn tts_test(api: &ApiClient, req: &TtsTestRequest<'_>) -> Result<serde_json::Value, ApiError> {
    let v = api.post("/api/tts/test", req).await?;
    reject_unsuccessful(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mood: &str, name: &str) -> BgmEntry {
        BgmEntry {
            mood: mood.into(),
            name: name.into(),
            file_path: format!("music/{mood}/{name}.mp3"),
            duration: 0.0,
        }
    }

    #[test]
    fn groups_entries_by_normalized_mood() {
        let entries = vec![
            entry("CALM", "rain"),
            entry("happy", "sun"),
            entry("CALM", "lake"),
        ];
        let g = group_by_mood(&entries);
        assert_eq!(g.keys().collect::<Vec<_>>(), vec!["CALM", "HAPPY"]);
        assert_eq!(g["CALM"].len(), 2);
        assert_eq!(g["HAPPY"][0].name, "sun");
    }

    #[test]
    fn bgm_list_accepts_legacy_key() {
        let l: BgmList = serde_json::from_str(
            r#"{"bgm_list":[{"mood":"SAD","name":"rain","filepath":"music/sad/rain.mp3"}]}"#,
        )
        .unwrap();
        assert_eq!(l.bgm_files[0].file_path, "music/sad/rain.mp3");
    }
}
