//! `/api/accounts` wrappers.

use super::{
    ApiClient, ApiError,
    types::{Account, AccountCreate, AccountDetail, AccountSettings, AccountUpdate},
};

/// List all channel accounts.
pub async fn list(api: &ApiClient) -> Result<Vec<Account>, ApiError> {
    api.get("/api/accounts/").await
}

/// Create an account and return the stored record.
pub async fn create(api: &ApiClient, body: &AccountCreate) -> Result<Account, ApiError> {
    api.post("/api/accounts/", body).await
}

/// Account with settings and job history.
pub async fn detail(api: &ApiClient, id: i64) -> Result<AccountDetail, ApiError> {
    api.get(&format!("/api/accounts/{id}")).await
}

pub async fn update(api: &ApiClient, id: i64, body: &AccountUpdate) -> Result<Account, ApiError> {
    api.put(&format!("/api/accounts/{id}"), body).await
}

pub async fn delete(api: &ApiClient, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("/api/accounts/{id}")).await
}

pub async fn settings(api: &ApiClient, id: i64) -> Result<AccountSettings, ApiError> {
    api.get(&format!("/api/accounts/{id}/settings")).await
}

/// Replace the account settings wholesale.
pub async fn update_settings(
    api: &ApiClient,
    id: i64,
    body: &AccountSettings,
) -> Result<AccountSettings, ApiError> {
    api.put(&format!("/api/accounts/{id}/settings"), body).await
}
