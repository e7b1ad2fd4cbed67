use async_trait::async_trait;

use super::{ApiClient, AssetDirectory, RemoteError};
use crate::models::{
    asset::{Asset, Category, SubCategory},
    common::{DbId, Envelope},
};

#[async_trait]
impl AssetDirectory for ApiClient {
    async fn list_assets(&self) -> Result<Vec<Asset>, RemoteError> {
        let response = self.get(self.url("Assets")).send().await?;
        let envelope: Envelope<Asset> = Self::parse_response(response).await?;
        Ok(envelope.into_items())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RemoteError> {
        let response = self.get(self.url("Categories")).send().await?;
        let envelope: Envelope<Category> = Self::parse_response(response).await?;
        Ok(envelope.into_items())
    }

    async fn list_sub_categories(
        &self,
        category_id: Option<DbId>,
    ) -> Result<Vec<SubCategory>, RemoteError> {
        let mut request = self.get(self.url("SubCategories"));
        if let Some(id) = category_id {
            request = request.query(&[("categoryId", id)]);
        }
        let envelope: Envelope<SubCategory> = Self::parse_response(request.send().await?).await?;

        // Some deployments ignore the query parameter.
        Ok(envelope
            .into_items()
            .into_iter()
            .filter(|sub| match (category_id, sub.category_id) {
                (Some(wanted), Some(owner)) => wanted == owner,
                _ => true,
            })
            .collect())
    }
}
