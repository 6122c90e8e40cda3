//! `/api/scheduler` wrappers. The scheduling engine itself lives in the backend.

use serde::Deserialize;

use super::{Ack, ApiClient, ApiError, seg};

/// A scheduled upload registered in the backend scheduler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduledJob {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub next_run_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScheduledJobs {
    #[serde(default)]
    jobs: Vec<ScheduledJob>,
}

pub async fn jobs(api: &ApiClient) -> Result<Vec<ScheduledJob>, ApiError> {
    let list: ScheduledJobs = api.get("/api/scheduler/jobs").await?;
    Ok(list.jobs)
}

/// Re-read account schedules.
pub async fn reload(api: &ApiClient) -> Result<Option<String>, ApiError> {
    let ack: Ack = api.post_empty("/api/scheduler/reload").await?;
    ack.into_result()
}

/// Run an account's scheduled job now.
pub async fn trigger(api: &ApiClient, account_id: i64) -> Result<Option<String>, ApiError> {
    let ack: Ack = api
        .post_empty(&format!("/api/scheduler/trigger/{account_id}"))
        .await?;
    ack.into_result()
}

/// Id the backend scheduler registers an account's upload job under.
pub fn account_job_id(account_id: i64) -> String {
    format!("account_{account_id}")
}

/// Unregister a scheduled job. The backend reports a missing job as
/// `{"error": ...}` with a 200 status.
pub async fn remove(api: &ApiClient, job_id: &str) -> Result<Option<String>, ApiError> {
    let ack: RemoveAck = api
        .delete_json(&format!("/api/scheduler/jobs/{}", seg(job_id)))
        .await?;
    match ack.error {
        Some(e) => Err(ApiError::Rejected(e)),
        None => Ok(ack.message),
    }
}

#[derive(Debug, Deserialize)]
struct RemoveAck {
    message: Option<String>,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_jobs_tolerate_missing_run_time() {
        let list: ScheduledJobs = serde_json::from_str(
            r#"{"jobs": [{"id": "account_3", "name": "Auto Upload - Tech", "next_run_time": null}]}"#,
        )
        .unwrap();
        assert_eq!(list.jobs[0].id, account_job_id(3));
        assert!(list.jobs[0].next_run_time.is_none());
    }
}
