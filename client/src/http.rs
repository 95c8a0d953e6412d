use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use uuid::Uuid;

use model::{
    BackfillOutcome, BackfillRequest, Composition, CreateSnapshotRequest, Snapshot, SnapshotPage,
    TimelineData, TimelineFilter,
};

use crate::envelope::Envelope;
use crate::error::ClientError;

/// Correlation id attached to every request for upstream log matching.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP adapter over the universe snapshot API.
///
/// Every endpoint speaks the uniform `{success, data, message}` envelope;
/// status codes are not interpreted beyond body decoding.
#[derive(Clone)]
pub struct UniverseClient {
    http: Client,
    base_url: String,
}

impl UniverseClient {
    pub fn new(base_url: String) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, base_url })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .query(query)
            .send()
            .await?;
        let envelope: Envelope<T> = resp.json().await?;

        envelope.into_result()
    }

    async fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .json(body)
            .send()
            .await?;
        let envelope: Envelope<T> = resp.json().await?;

        envelope.into_result()
    }
}

#[async_trait::async_trait]
impl crate::repository::UniverseRepository for UniverseClient {
    #[instrument(skip(self, filter), fields(universe_id = %universe_id), level = "debug")]
    async fn get_timeline(
        &self,
        universe_id: &str,
        filter: &TimelineFilter,
    ) -> Result<TimelineData, ClientError> {
        let data: TimelineData = self
            .get(
                &format!("/universes/{}/timeline", universe_id),
                &[
                    ("start_date", filter.date_range.start_date.to_string()),
                    ("end_date", filter.date_range.end_date.to_string()),
                    ("frequency", filter.frequency.to_string()),
                    (
                        "show_empty_periods",
                        filter.show_empty_periods.to_string(),
                    ),
                    (
                        "include_turnover_analysis",
                        filter.include_turnover_analysis.to_string(),
                    ),
                ],
            )
            .await?;

        debug!(snapshots = data.snapshots.len(), "timeline fetched");

        Ok(data)
    }

    #[instrument(skip(self), fields(universe_id = %universe_id), level = "debug")]
    async fn get_snapshots(
        &self,
        universe_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<SnapshotPage, ClientError> {
        self.get(
            &format!("/universes/{}/snapshots", universe_id),
            &[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .await
    }

    #[instrument(skip(self, request), fields(universe_id = %universe_id), level = "debug")]
    async fn create_snapshot(
        &self,
        universe_id: &str,
        request: &CreateSnapshotRequest,
    ) -> Result<Snapshot, ClientError> {
        self.post(&format!("/universes/{}/snapshots", universe_id), request)
            .await
    }

    #[instrument(skip(self), fields(universe_id = %universe_id, date = %date), level = "debug")]
    async fn composition_at(
        &self,
        universe_id: &str,
        date: NaiveDate,
    ) -> Result<Composition, ClientError> {
        self.get(
            &format!("/universes/{}/composition", universe_id),
            &[("date", date.to_string())],
        )
        .await
    }

    #[instrument(skip(self, request), fields(universe_id = %universe_id), level = "debug")]
    async fn backfill_history(
        &self,
        universe_id: &str,
        request: &BackfillRequest,
    ) -> Result<BackfillOutcome, ClientError> {
        self.post(&format!("/universes/{}/backfill", universe_id), request)
            .await
    }
}
