//! HttpRemoteStore: reqwest client for the ledger-cloud document API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use shared::cloud::{Collection, RemoteDocument};
use std::time::Duration;

use super::remote::{RemoteError, RemoteStore};
use crate::utils::AppError;

pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRemoteStore {
    /// `base_url` is the ledger-cloud root (e.g. "https://ledger.example.com")
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn collection_url(&self, owner_id: &str, collection: Collection) -> String {
        format!("{}/api/owners/{}/{}", self.base_url, owner_id, collection)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized(body),
            s if s.is_server_error() => RemoteError::Unavailable(format!("{s}: {body}")),
            s => RemoteError::Rejected {
                status: s.as_u16(),
                message: body,
            },
        })
    }
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    RemoteError::Unavailable(e.to_string())
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn set_document(
        &self,
        owner_id: &str,
        collection: Collection,
        document: &RemoteDocument,
    ) -> Result<(), RemoteError> {
        let url = format!("{}/{}", self.collection_url(owner_id, collection), document.id);
        let response = self
            .authorize(self.client.put(&url))
            .json(&document.fields)
            .send()
            .await
            .map_err(transport_error)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_documents(
        &self,
        owner_id: &str,
        collection: Collection,
    ) -> Result<Vec<RemoteDocument>, RemoteError> {
        let url = self.collection_url(owner_id, collection);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::check(response).await?;
        response
            .json::<Vec<RemoteDocument>>()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }

    async fn ping(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Remote store ping failed");
                false
            }
        }
    }
}
