//! Request and response shapes of the automation backend.

use serde::{Deserialize, Serialize};

use crate::status::{BatchStatus, DraftStatus, JobStatus, PreviewStatus, VideoStatus};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Content category of a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Humor,
    Trend,
    #[default]
    Info,
    Review,
    News,
    Daily,
}

impl ChannelType {
    pub const ALL: [ChannelType; 6] = [
        ChannelType::Info,
        ChannelType::Humor,
        ChannelType::Trend,
        ChannelType::Review,
        ChannelType::News,
        ChannelType::Daily,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChannelType::Humor => "Humor",
            ChannelType::Trend => "Trend",
            ChannelType::Info => "Info",
            ChannelType::Review => "Review",
            ChannelType::News => "News",
            ChannelType::Daily => "Daily",
        }
    }

    /// Next value in `ALL`, wrapping around.
    pub fn cycle(self) -> Self {
        let i = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Account {
    pub id: i64,
    pub channel_name: String,
    #[serde(default)]
    pub channel_type: ChannelType,
    #[serde(default)]
    pub default_prompt_style: String,
    pub upload_schedule: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub channel_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// Body of `POST /api/accounts/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountCreate {
    pub channel_name: String,
    pub channel_type: ChannelType,
    pub default_prompt_style: String,
    pub upload_schedule: Option<String>,
    pub is_active: bool,
}

/// Partial body of `PUT /api/accounts/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<ChannelType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Per-account TTS, format and BGM defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub tts_provider: String,
    pub tts_voice_id: Option<String>,
    pub tts_stability: f64,
    pub tts_similarity_boost: f64,
    pub tts_style: f64,
    pub default_format: String,
    pub default_duration: u32,
    pub bgm_enabled: bool,
    pub bgm_volume: f64,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            tts_provider: "gtts".into(),
            tts_voice_id: None,
            tts_stability: 0.5,
            tts_similarity_boost: 0.75,
            tts_style: 0.0,
            default_format: "shorts".into(),
            default_duration: 60,
            bgm_enabled: false,
            bgm_volume: 0.3,
        }
    }
}

/// `GET /api/accounts/{id}`: account with nested settings and job history.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountDetail {
    #[serde(flatten)]
    pub account: Account,
    pub settings: Option<AccountSettings>,
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// One video job as listed by `/api/jobs/recent` or returned by
/// `/api/jobs/status`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub topic: Option<String>,
    pub format: Option<String>,
    pub duration: Option<u32>,
    pub account_id: Option<i64>,
    pub output_video_path: Option<String>,
    pub youtube_url: Option<String>,
    pub error_message: Option<String>,
    #[serde(alias = "started_at")]
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
}

/// `data` of `GET /api/jobs/recent`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentJobs {
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatusRequest<'a> {
    pub job_id: &'a str,
}

/// Body of `POST /api/videos/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateVideoRequest {
    pub topic: Option<String>,
    pub format: String,
    pub duration: u32,
    pub upload: bool,
    pub ai_provider: String,
    pub tts_provider: String,
}

/// `data` of endpoints that start a background job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStarted {
    pub job_id: String,
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_index: u32,
    pub text: String,
    pub keyword: Option<String>,
    pub image_search_query: Option<String>,
    pub duration: Option<f64>,
    pub video_url: Option<String>,
    pub video_local_path: Option<String>,
    pub video_provider: Option<String>,
    pub tts_local_path: Option<String>,
    pub tts_duration: Option<f64>,
}

impl Segment {
    /// Query used to re-fetch the segment's visual.
    pub fn search_query(&self) -> String {
        self.image_search_query
            .clone()
            .filter(|q| !q.trim().is_empty())
            .or_else(|| self.keyword.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DraftProject {
    pub draft_id: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub target_duration: u32,
    pub status: DraftStatus,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDraftRequest {
    pub topic: Option<String>,
    pub format: String,
    pub duration: u32,
    pub account_id: Option<i64>,
    pub style: String,
    pub collect_assets: bool,
}

/// Partial segment change for `update-segment`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateSegmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_search_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BgmSettings {
    pub enabled: bool,
    pub mood: String,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizeDraftRequest {
    pub upload: bool,
    pub template: Option<String>,
    pub bgm_settings: BgmSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalizeResult {
    pub draft_id: String,
    pub job_id: String,
    pub status: String,
    pub output_video_path: Option<String>,
    pub youtube_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewGenerateRequest {
    pub topic: String,
    pub format: String,
    pub duration: u32,
    pub template_name: String,
    pub account_id: Option<i64>,
    pub low_resolution: bool,
}

/// Top-level answer of `/api/preview/generate` and `/api/preview/finalize`.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewAck {
    #[serde(default)]
    pub success: bool,
    pub job_id: Option<String>,
    pub message: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreviewSegment {
    pub index: u32,
    #[serde(default)]
    pub text: String,
    pub keyword: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreviewMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub duration: Option<f64>,
    pub segment_count: Option<u32>,
    pub resolution: Option<String>,
}

/// `GET /api/preview/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreviewJob {
    pub job_id: String,
    pub status: PreviewStatus,
    #[serde(default)]
    pub progress: u8,
    pub preview_path: Option<String>,
    pub segments: Option<Vec<PreviewSegment>>,
    pub metadata: Option<PreviewMetadata>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewFinalizeRequest<'a> {
    pub job_id: &'a str,
    pub upload: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreviewSummary {
    pub job_id: String,
    pub status: PreviewStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentPreviews {
    #[serde(default)]
    pub previews: Vec<PreviewSummary>,
}

// ---------------------------------------------------------------------------
// Batch remix
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStartRequest {
    pub region: String,
    pub category: String,
    pub max_videos: u32,
    pub duration: String,
    pub min_views: u64,
    pub target_lang: String,
}

/// Per-stage counters of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BatchCounts {
    pub searched: u32,
    pub downloaded: u32,
    pub translated: u32,
    pub remixed: u32,
    pub skipped: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchJob {
    pub job_id: String,
    pub status: BatchStatus,
    pub result: Option<BatchCounts>,
    pub error: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchJobs {
    #[serde(default)]
    pub jobs: Vec<BatchJob>,
}

// ---------------------------------------------------------------------------
// BGM / TTS
// ---------------------------------------------------------------------------

pub const BGM_MOODS: [&str; 6] = ["HAPPY", "SAD", "ENERGETIC", "CALM", "TENSE", "MYSTERIOUS"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BgmEntry {
    pub mood: String,
    pub name: String,
    #[serde(alias = "filepath")]
    pub file_path: String,
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BgmList {
    #[serde(default, alias = "bgm_list")]
    pub bgm_files: Vec<BgmEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoodInfo {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoodList {
    #[serde(default)]
    pub moods: Vec<MoodInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    pub language: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceList {
    #[serde(default)]
    pub voices: Vec<Voice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TtsPreviewRequest<'a> {
    pub text: &'a str,
    pub voice_id: Option<&'a str>,
    pub stability: f64,
    pub similarity_boost: f64,
    pub style: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TtsTestRequest<'a> {
    pub text: &'a str,
    pub language: &'a str,
    pub speed: f64,
    pub pitch: i32,
}

// ---------------------------------------------------------------------------
// Search, downloads, library
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TrendingSearchRequest<'a> {
    pub region: &'a str,
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordSearchRequest<'a> {
    pub keywords: Vec<&'a str>,
    pub region: &'a str,
    pub max_results: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FoundVideo {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub channel_name: Option<String>,
    pub view_count: Option<u64>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoundVideos {
    #[serde(default)]
    pub videos: Vec<FoundVideo>,
}

/// A downloaded source video tracked by the library.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LibraryVideo {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    pub status: VideoStatus,
    pub translated_title: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryVideos {
    #[serde(default)]
    pub videos: Vec<LibraryVideo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HardcodedSubtitleRequest<'a> {
    pub video_id: &'a str,
    pub target_lang: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendAnalysisRequest<'a> {
    pub region: &'a str,
    pub format: &'a str,
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptRequest<'a> {
    pub keywords: Vec<&'a str>,
    pub format: &'a str,
    pub duration: u32,
    pub tone: &'a str,
    pub versions: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProduceRequest<'a> {
    pub script: &'a str,
    pub format: &'a str,
    pub style: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest<'a> {
    pub video_path: &'a str,
    pub keywords: Vec<&'a str>,
    pub script: Option<&'a str>,
    pub privacy: &'a str,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_detail_flattens_account_fields() {
        let json = r#"{
            "id": 3, "channel_name": "Tech Daily", "channel_type": "news",
            "default_prompt_style": "info", "upload_schedule": "0 9 * * *",
            "is_active": true, "created_at": "2024-05-01T09:00:00",
            "updated_at": "2024-05-01T09:00:00",
            "settings": {"id": 1, "account_id": 3, "tts_provider": "elevenlabs",
                "tts_voice_id": "pNInz6obpgDQGcFmaJgB", "tts_stability": 0.4,
                "tts_similarity_boost": 0.8, "tts_style": 0.1, "default_format": "shorts",
                "default_duration": 45, "bgm_enabled": true, "bgm_volume": 0.2},
            "jobs": [{"job_id": "j1", "status": "completed", "topic": "AI",
                "started_at": "2024-05-02T10:00:00"}]
        }"#;
        let d: AccountDetail = serde_json::from_str(json).unwrap();
        assert_eq!(d.account.channel_type, ChannelType::News);
        assert_eq!(d.settings.unwrap().default_duration, 45);
        assert_eq!(d.jobs[0].created_at.as_deref(), Some("2024-05-02T10:00:00"));
    }

    #[test]
    fn update_segment_body_only_carries_set_fields() {
        let body = UpdateSegmentRequest {
            text: Some("hello".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"text":"hello"}"#);
    }

    #[test]
    fn search_query_falls_back_to_keyword() {
        let mut seg: Segment = serde_json::from_str(
            r#"{"segment_index":0,"text":"t","keyword":"cats","image_search_query":" ",
                "duration":null,"video_url":null,"video_local_path":null,
                "video_provider":null,"tts_local_path":null,"tts_duration":null}"#,
        )
        .unwrap();
        assert_eq!(seg.search_query(), "cats");
        seg.image_search_query = Some("cute cats".into());
        assert_eq!(seg.search_query(), "cute cats");
    }

    #[test]
    fn channel_type_cycles_through_all() {
        let mut t = ChannelType::Info;
        for _ in 0..ChannelType::ALL.len() {
            t = t.cycle();
        }
        assert_eq!(t, ChannelType::Info);
    }
}
