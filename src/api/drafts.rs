//! `/api/draft` wrappers for the timeline editor.

use super::{
    ApiClient, ApiError, Envelope, seg,
    types::{
        CreateDraftRequest, DraftProject, FinalizeDraftRequest, FinalizeResult, Segment,
        UpdateSegmentRequest,
    },
};
use crate::status::DraftStatus;

/// Generate script and assets without rendering.
pub async fn create(api: &ApiClient, body: &CreateDraftRequest) -> Result<DraftProject, ApiError> {
    api.long_running().post("/api/draft/create", body).await
}

/// Full draft with ordered segments.
pub async fn get(api: &ApiClient, draft_id: &str) -> Result<DraftProject, ApiError> {
    api.get(&format!("/api/draft/{}", seg(draft_id))).await
}

/// Update one segment; returns the server-confirmed segment.
pub async fn update_segment(
    api: &ApiClient,
    draft_id: &str,
    segment_index: u32,
    body: &UpdateSegmentRequest,
) -> Result<Segment, ApiError> {
    let env: Envelope<Segment> = api
        .post(
            &format!("/api/draft/{}/update-segment/{segment_index}", seg(draft_id)),
            body,
        )
        .await?;
    env.into_data()
}

/// Ask the backend to fetch a new visual for a segment by re-submitting its
/// search query.
pub async fn regenerate_segment(
    api: &ApiClient,
    draft_id: &str,
    segment: &Segment,
) -> Result<Segment, ApiError> {
    let body = UpdateSegmentRequest {
        image_search_query: Some(segment.search_query()),
        ..Default::default()
    };
    update_segment(api, draft_id, segment.segment_index, &body).await
}

/// Render the final video from the draft.
pub async fn finalize(
    api: &ApiClient,
    draft_id: &str,
    body: &FinalizeDraftRequest,
) -> Result<FinalizeResult, ApiError> {
    let env: Envelope<FinalizeResult> = api
        .post(&format!("/api/draft/{}/finalize", seg(draft_id)), body)
        .await?;
    env.into_data()
}

/// List drafts, optionally filtered by account and status.
pub async fn list(
    api: &ApiClient,
    skip: u32,
    limit: u32,
    account_id: Option<i64>,
    status: Option<&DraftStatus>,
) -> Result<Vec<DraftProject>, ApiError> {
    let mut query = vec![("skip", skip.to_string()), ("limit", limit.to_string())];
    if let Some(id) = account_id {
        query.push(("account_id", id.to_string()));
    }
    if let Some(s) = status {
        query.push(("status", s.as_str().to_string()));
    }
    api.get_query("/api/draft/", &query).await
}

pub async fn delete(api: &ApiClient, draft_id: &str) -> Result<(), ApiError> {
    api.delete(&format!("/api/draft/{}", seg(draft_id))).await
}

