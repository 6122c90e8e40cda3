//! `/api/batch` wrappers for automatic trending remix runs.

use super::{
    ApiClient, ApiError, Envelope, seg,
    types::{BatchJob, BatchJobs, BatchStartRequest, JobStarted},
};

pub async fn start(api: &ApiClient, body: &BatchStartRequest) -> Result<String, ApiError> {
    let env: Envelope<JobStarted> = api.post("/api/batch/start", body).await?;
    Ok(env.into_data()?.job_id)
}

pub async fn status(api: &ApiClient, job_id: &str) -> Result<BatchJob, ApiError> {
    let env: Envelope<BatchJob> = api
        .get(&format!("/api/batch/status/{}", seg(job_id)))
        .await?;
    env.into_data()
}

pub async fn jobs(api: &ApiClient) -> Result<Vec<BatchJob>, ApiError> {
    let env: Envelope<BatchJobs> = api.get("/api/batch/jobs").await?;
    Ok(env.into_data()?.jobs)
}
