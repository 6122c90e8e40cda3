//! Research and library endpoints: trends, scripts, search, downloads,
//! the downloaded-video library and YouTube upload.

use super::{
    ApiClient, ApiError, Envelope, seg,
    jobs::reject_unsuccessful,
    types::{
        FoundVideo, FoundVideos, HardcodedSubtitleRequest, JobStarted, KeywordSearchRequest,
        LibraryVideo, LibraryVideos, ScriptRequest, TrendAnalysisRequest, TrendingSearchRequest,
        UploadRequest,
    },
};
use crate::status::VideoStatus;

pub async fn analyze_trends(
    api: &ApiClient,
    region: &str,
    format: &str,
) -> Result<serde_json::Value, ApiError> {
    let v = api
        .post(
            "/api/trends/analyze",
            &TrendAnalysisRequest {
                region,
                format,
                max_results: 50,
            },
        )
        .await?;
    reject_unsuccessful(v)
}

pub async fn generate_scripts(
    api: &ApiClient,
    req: &ScriptRequest<'_>,
) -> Result<serde_json::Value, ApiError> {
    let v = api.long_running().post("/api/scripts/generate", req).await?;
    reject_unsuccessful(v)
}

pub async fn search_trending(
    api: &ApiClient,
    region: &str,
    max_results: u32,
) -> Result<Vec<FoundVideo>, ApiError> {
    let env: Envelope<FoundVideos> = api
        .post(
            "/api/search/trending",
            &TrendingSearchRequest {
                region,
                max_results,
            },
        )
        .await?;
    Ok(env.into_data()?.videos)
}

pub async fn search_keywords(
    api: &ApiClient,
    keywords: &str,
    region: &str,
    max_results: u32,
) -> Result<Vec<FoundVideo>, ApiError> {
    let env: Envelope<FoundVideos> = api
        .post(
            "/api/search/keywords",
            &KeywordSearchRequest {
                keywords: split_keywords(keywords),
                region,
                max_results,
            },
        )
        .await?;
    Ok(env.into_data()?.videos)
}

/// Download a YouTube video into the library.
pub async fn download(api: &ApiClient, url: &str) -> Result<serde_json::Value, ApiError> {
    let v = api
        .long_running()
        .post("/api/download", &serde_json::json!({ "url": url }))
        .await?;
    reject_unsuccessful(v)
}

pub async fn videos(
    api: &ApiClient,
    status: Option<&VideoStatus>,
) -> Result<Vec<LibraryVideo>, ApiError> {
    let query: Vec<(&str, String)> = status
        .map(|s| vec![("status", s.as_str().to_string())])
        .unwrap_or_default();
    let env: Envelope<LibraryVideos> = api.get_query("/api/videos", &query).await?;
    Ok(env.into_data()?.videos)
}

pub async fn delete_video(api: &ApiClient, video_id: &str) -> Result<(), ApiError> {
    api.delete(&format!("/api/videos/{}", seg(video_id))).await
}

/// Start hardcoded subtitle extraction and translation; returns the job id.
pub async fn process_hardcoded_subtitles(
    api: &ApiClient,
    video_id: &str,
    target_lang: &str,
) -> Result<String, ApiError> {
    let env: Envelope<JobStarted> = api
        .post(
            "/api/hardcoded-subtitle/process",
            &HardcodedSubtitleRequest {
                video_id,
                target_lang,
            },
        )
        .await?;
    Ok(env.into_data()?.job_id)
}

/// Upload a rendered file to YouTube through the backend.
pub async fn upload(
    api: &ApiClient,
    video_path: &str,
    keywords: &str,
    script: Option<&str>,
    privacy: &str,
) -> Result<serde_json::Value, ApiError> {
    let v = api
        .long_running()
        .post(
            "/api/upload",
            &UploadRequest {
                video_path,
                keywords: split_keywords(keywords),
                script,
                privacy,
            },
        )
        .await?;
    reject_unsuccessful(v)
}

/// Comma separated input to a trimmed keyword list.
pub fn split_keywords(input: &str) -> Vec<&str> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_trimmed_and_empty_ones_dropped() {
        assert_eq!(split_keywords(" ai, robots ,,news "), vec!["ai", "robots", "news"]);
        assert!(split_keywords(" , ").is_empty());
    }
}
