use async_trait::async_trait;

use super::{ApiClient, RemoteError, RequestStore};
use crate::models::{
    common::{wire_date, DbId, Envelope, RequestFilter},
    request::{AssetRequest, SubmissionPayload},
};

const RESOURCE: &str = "AssetRequests";

#[async_trait]
impl RequestStore for ApiClient {
    async fn list_filtered(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<AssetRequest>, RemoteError> {
        let request = match filter {
            RequestFilter::All => self.get(self.url(RESOURCE)),
            RequestFilter::Status(status) => self
                .get(self.url(&format!("{}/Status", RESOURCE)))
                .query(&[("status", status.code().to_string())]),
            RequestFilter::DateRange { from, to } => self
                .get(self.url(&format!("{}/filter-by-date-range", RESOURCE)))
                .query(&[
                    ("startDate", wire_date::format(*from)),
                    ("endDate", wire_date::format(*to)),
                ]),
            RequestFilter::MonthYear { month, year } => self
                .get(self.url(&format!("{}/filter-by-month-and-year", RESOURCE)))
                .query(&[("month", month.to_string()), ("year", year.to_string())]),
        };

        let envelope: Envelope<AssetRequest> =
            Self::parse_response(request.send().await?).await?;
        Ok(envelope.into_items())
    }

    async fn create(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<Option<AssetRequest>, RemoteError> {
        let response = self.post(self.url(RESOURCE)).json(payload).send().await?;
        Self::parse_acknowledgement(response).await
    }

    async fn update(
        &self,
        id: DbId,
        payload: &SubmissionPayload,
    ) -> Result<Option<AssetRequest>, RemoteError> {
        let response = self
            .put(self.url(&format!("{}/{}", RESOURCE, id)))
            .json(payload)
            .send()
            .await?;
        Self::parse_acknowledgement(response).await
    }
}
