//! `/api/jobs` and `/api/videos/create|produce` wrappers.

use super::{
    ApiClient, ApiError, Envelope,
    types::{CreateVideoRequest, JobRecord, JobStarted, JobStatusRequest, ProduceRequest, RecentJobs},
};

/// One page of recent jobs (1-based `page`).
pub async fn recent(api: &ApiClient, page: u32, limit: u32) -> Result<RecentJobs, ApiError> {
    let env: Envelope<RecentJobs> = api
        .get_query(
            "/api/jobs/recent",
            &[("page", page.max(1).to_string()), ("limit", limit.to_string())],
        )
        .await?;
    env.into_data()
}

/// Current status of a single job.
pub async fn status(api: &ApiClient, job_id: &str) -> Result<JobRecord, ApiError> {
    let env: Envelope<JobRecord> = api
        .post("/api/jobs/status", &JobStatusRequest { job_id })
        .await?;
    env.into_data()
}

/// Start the full AI video pipeline; returns the job id to poll.
pub async fn create_video(api: &ApiClient, body: &CreateVideoRequest) -> Result<String, ApiError> {
    let env: Envelope<JobStarted> = api.post("/api/videos/create", body).await?;
    Ok(env.into_data()?.job_id)
}

/// Render a video from an existing script. Answers with the produced paths.
pub async fn produce(
    api: &ApiClient,
    script: &str,
    format: &str,
    style: &str,
) -> Result<serde_json::Value, ApiError> {
    let v: serde_json::Value = api
        .long_running()
        .post(
            "/api/videos/produce",
            &ProduceRequest {
                script,
                format,
                style,
            },
        )
        .await?;
    reject_unsuccessful(v)
}

/// Bare JSON answers still carry `success: false` on logical failure.
pub(crate) fn reject_unsuccessful(v: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    if v.get("success").and_then(|s| s.as_bool()) == Some(false) {
        let msg = v
            .get("detail")
            .or_else(|| v.get("error"))
            .or_else(|| v.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or("request was not accepted")
            .to_string();
        return Err(ApiError::Rejected(msg));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsuccessful_bare_answer_is_rejected() {
        let v = serde_json::json!({"success": false, "error": "ffmpeg missing"});
        match reject_unsuccessful(v) {
            Err(ApiError::Rejected(m)) => assert_eq!(m, "ffmpeg missing"),
            other => panic!("unexpected {other:?}"),
        }
        let ok = serde_json::json!({"video_path": "out.mp4"});
        assert!(reject_unsuccessful(ok).is_ok());
    }
}
