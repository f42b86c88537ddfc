use chrono::DateTime;
use chrono::Utc;
use reqwest::Client;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::SheetStoreSettings;
use crate::domain::SubscriberEmail;
use crate::domain::Topic;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriberStatus {
    Active,
    Unsubscribed,
}

/// One spreadsheet row. The store owns this data; we never keep a local copy
/// beyond the lifetime of a request.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SubscriberRow {
    pub email: String,
    pub topics: Vec<Topic>,
    pub max_items: u32,
    pub subscribed_at: DateTime<Utc>,
    pub status: SubscriberStatus,
}

impl SubscriberRow {
    pub fn new(
        email: &SubscriberEmail,
        topics: Vec<Topic>,
        max_items: u32,
    ) -> Self {
        Self {
            email: email.as_ref().to_string(),
            topics,
            max_items,
            subscribed_at: Utc::now(),
            status: SubscriberStatus::Active,
        }
    }
}

/// Client for the spreadsheet-backed subscriber store. The sheet lives behind
/// a small HTTP wrapper (one resource per row, keyed by email), so every
/// method here is a thin JSON call; all real persistence concerns belong to
/// the service.
pub struct SheetStore {
    http_client: Client,
    base_url: String,
    sheet_id: String,
    api_token: Secret<String>,
}

impl SheetStore {
    pub fn new(cfg: &SheetStoreSettings) -> Self {
        Self {
            http_client: Client::new(),
            base_url: cfg.base_url.clone(),
            sheet_id: cfg.sheet_id.clone(),
            api_token: cfg.api_token.clone(),
        }
    }

    fn row_url(
        &self,
        email: &str,
    ) -> String {
        format!(
            "{}/v1/sheets/{}/rows/{}",
            self.base_url,
            self.sheet_id,
            urlencoding::encode(email)
        )
    }

    fn rows_url(&self) -> String { format!("{}/v1/sheets/{}/rows", self.base_url, self.sheet_id) }

    /// Insert the row, or overwrite an existing row with the same email
    #[tracing::instrument(name = "Upserting subscriber row", skip(self, row), fields(email = %row.email))]
    pub async fn upsert_subscriber(
        &self,
        row: &SubscriberRow,
    ) -> Result<(), reqwest::Error> {
        self.http_client
            .put(self.row_url(&row.email))
            .bearer_auth(self.api_token.expose_secret())
            .json(row)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// `None` if no row exists for `email`
    #[tracing::instrument(name = "Fetching subscriber row", skip(self))]
    pub async fn get_subscriber(
        &self,
        email: &str,
    ) -> Result<Option<SubscriberRow>, reqwest::Error> {
        let resp = self
            .http_client
            .get(self.row_url(email))
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let row = resp.error_for_status()?.json::<SubscriberRow>().await?;
        Ok(Some(row))
    }

    #[tracing::instrument(name = "Listing subscriber rows", skip(self))]
    pub async fn list_subscribers(&self) -> Result<Vec<SubscriberRow>, reqwest::Error> {
        self.http_client
            .get(self.rows_url())
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<SubscriberRow>>()
            .await
    }

    /// Flip the status of an existing row (pause/resume)
    #[tracing::instrument(name = "Updating subscriber status", skip(self))]
    pub async fn set_status(
        &self,
        email: &str,
        status: SubscriberStatus,
    ) -> Result<(), reqwest::Error> {
        self.http_client
            .patch(self.row_url(email))
            .bearer_auth(self.api_token.expose_secret())
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Remove the row entirely; the subscriber's data is gone from the sheet
    #[tracing::instrument(name = "Deleting subscriber row", skip(self))]
    pub async fn delete_subscriber(
        &self,
        email: &str,
    ) -> Result<(), reqwest::Error> {
        self.http_client
            .delete(self.row_url(email))
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
