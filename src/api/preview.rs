//! `/api/preview` wrappers.

use super::{
    ApiClient, ApiError, seg,
    types::{PreviewAck, PreviewFinalizeRequest, PreviewGenerateRequest, PreviewJob, RecentPreviews},
};

/// Start a low resolution preview; returns the preview job id.
pub async fn generate(api: &ApiClient, body: &PreviewGenerateRequest) -> Result<String, ApiError> {
    let ack: PreviewAck = api.post("/api/preview/generate", body).await?;
    accepted_job_id(ack)
}

pub async fn status(api: &ApiClient, job_id: &str) -> Result<PreviewJob, ApiError> {
    api.get(&format!("/api/preview/{}", seg(job_id))).await
}

/// Render the full quality video for a finished preview.
pub async fn finalize(api: &ApiClient, job_id: &str, upload: bool) -> Result<String, ApiError> {
    let ack: PreviewAck = api
        .post(
            "/api/preview/finalize",
            &PreviewFinalizeRequest { job_id, upload },
        )
        .await?;
    accepted_job_id(ack).or_else(|e| match e {
        // Older backends answer finalize without echoing the id.
        ApiError::Rejected(ref m) if m == MISSING_JOB_ID => Ok(job_id.to_string()),
        other => Err(other),
    })
}

/// Streamable URL of a completed preview.
pub fn video_url(api: &ApiClient, job_id: &str) -> String {
    format!("{}/api/preview/{}/video", api.base_url(), seg(job_id))
}

pub async fn recent(api: &ApiClient, limit: u32) -> Result<RecentPreviews, ApiError> {
    api.get_query("/api/preview/list/recent", &[("limit", limit.to_string())])
        .await
}

const MISSING_JOB_ID: &str = "response carried no job id";

fn accepted_job_id(ack: PreviewAck) -> Result<String, ApiError> {
    if !ack.success {
        return Err(ApiError::Rejected(
            ack.detail
                .or(ack.message)
                .unwrap_or_else(|| "preview request was not accepted".into()),
        ));
    }
    ack.job_id
        .ok_or_else(|| ApiError::Rejected(MISSING_JOB_ID.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_preview_uses_detail() {
        let ack: PreviewAck =
            serde_json::from_str(r#"{"success": false, "detail": "quota exceeded"}"#).unwrap();
        match accepted_job_id(ack) {
            Err(ApiError::Rejected(m)) => assert_eq!(m, "quota exceeded"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn accepted_preview_returns_job_id() {
        let ack: PreviewAck =
            serde_json::from_str(r#"{"success": true, "job_id": "pv_1", "message": "ok"}"#)
                .unwrap();
        assert_eq!(accepted_job_id(ack).unwrap(), "pv_1");
    }
}
