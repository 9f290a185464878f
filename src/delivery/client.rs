// Supabase REST Client
// Inserts contact rows through the PostgREST endpoint
// See: https://supabase.com/docs/guides/api
//
// IMPORTANT: This module ONLY inserts. Nothing here reads or updates rows.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::contact::ContactRecord;

/// Table endpoint relative to the project URL
const CONTACTS_PATH: &str = "/rest/v1/contacts";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error types for delivery operations
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP request failed before a response arrived
    #[error("Network error: {0}")]
    Network(String),
    /// Sink answered with something other than 200/201
    #[error("Failed to insert contact: {status} - {body}")]
    Rejected { status: u16, body: String },
    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Anything that can accept a normalized contact
#[allow(async_fn_in_trait)]
pub trait RecordSink {
    async fn deliver(&self, record: &ContactRecord) -> Result<(), DeliveryError>;
}

/// Supabase client posting to the `contacts` table
pub struct SupabaseClient {
    http: Client,
    endpoint: String,
    key: String,
}

impl SupabaseClient {
    /// Create a new client for a project URL and API key
    pub fn new(url: &str, key: &str) -> Result<Self, DeliveryError> {
        let http = Client::builder()
            .user_agent(concat!("QSOlive/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::Client(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", url.trim_end_matches('/'), CONTACTS_PATH),
            key: key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RecordSink for SupabaseClient {
    async fn deliver(&self, record: &ContactRecord) -> Result<(), DeliveryError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| {
                log::error!("Network error: {}", e);
                DeliveryError::Network(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            log::info!("[OK] Logged contact: {}", record.summary());
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        log::error!("Failed to insert contact: {} - {}", status.as_u16(), body);
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
