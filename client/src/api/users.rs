use async_trait::async_trait;
use reqwest::StatusCode;

use super::{ApiClient, RemoteError, UserDirectory};
use crate::models::user::UserSummary;

#[async_trait]
impl UserDirectory for ApiClient {
    async fn resolve_user_name(&self, user_id: &str) -> Result<Option<String>, RemoteError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Ok(None);
        }

        let response = self
            .get(format!("{}/{}", self.users_url.trim_end_matches('/'), user_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!("User {} not found in directory", user_id);
            return Ok(None);
        }

        let user: UserSummary = Self::parse_response(response).await?;
        Ok(user.display_name())
    }
}
