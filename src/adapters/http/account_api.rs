//! reqwest client for the account REST API.
//!
//! Serves two roles:
//! - `UpdateSource` for the fallback poller:
//!   `GET /accounts/{id}/updates?since=<rfc3339>` → `{ "data": [Envelope…] }`
//! - `AccountOperations` for producers:
//!   `POST /accounts/{id}/transfers`, `POST /accounts/{id}/expenses`,
//!   `PUT /accounts/{id}/expenses/{expense_id}`
//!
//! Every request carries the bearer token from the `TokenProvider`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::domain::account::{Expense, ExpenseDraft, TransferCommand, TransferReceipt};
use crate::domain::foundation::{DomainError, ErrorCode, ResourceId, Timestamp};
use crate::ports::{AccountOperations, TokenProvider, TransportError, UpdateSource};

/// Configuration for the account API client.
#[derive(Debug, Clone)]
pub struct AccountApiConfig {
    /// Base URL, e.g. `https://api.example.com/v1`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl AccountApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    data: Vec<JsonValue>,
}

/// HTTP adapter for the account API.
pub struct HttpAccountApi {
    config: AccountApiConfig,
    client: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpAccountApi {
    pub fn new(
        config: AccountApiConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            tokens,
        })
    }

    fn updates_url(&self, resource_id: &ResourceId) -> String {
        format!("{}/accounts/{}/updates", self.config.base_url, resource_id)
    }

    fn transfers_url(&self, resource_id: &ResourceId) -> String {
        format!("{}/accounts/{}/transfers", self.config.base_url, resource_id)
    }

    fn expenses_url(&self, resource_id: &ResourceId) -> String {
        format!("{}/accounts/{}/expenses", self.config.base_url, resource_id)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, TransportError> {
        let token = self
            .tokens
            .access_token()
            .await
            .ok_or(TransportError::MissingToken)?;
        Ok(request.bearer_auth(token.expose_secret()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        self.authorized(request)
            .await?
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Http(format!("Request timed out after {:?}", self.config.timeout))
                } else if e.is_connect() {
                    TransportError::Http(format!("Connection failed: {}", e))
                } else {
                    TransportError::Http(e.to_string())
                }
            })
    }

    /// Sends a mutation and maps failures onto domain error codes.
    async fn mutate<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
        not_found: ErrorCode,
    ) -> Result<T, DomainError> {
        let response = self.send(request).await.map_err(|e| match e {
            TransportError::MissingToken => DomainError::new(ErrorCode::Unauthorized, e.to_string()),
            other => DomainError::new(ErrorCode::NetworkError, other.to_string()),
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_mutation_status(status, body, not_found))
    }
}

fn map_mutation_status(status: StatusCode, body: String, not_found: ErrorCode) -> DomainError {
    let code = match status.as_u16() {
        401 => ErrorCode::Unauthorized,
        403 => ErrorCode::Forbidden,
        404 => not_found,
        409 | 422 if body.to_lowercase().contains("insufficient") => ErrorCode::InsufficientFunds,
        400 | 422 => ErrorCode::ValidationFailed,
        _ => ErrorCode::NetworkError,
    };
    DomainError::new(code, format!("Request failed with status {}", status))
        .with_detail("status", status.as_u16().to_string())
        .with_detail("body", body)
}

#[async_trait]
impl UpdateSource for HttpAccountApi {
    async fn fetch_since(
        &self,
        resource_id: &ResourceId,
        since: Option<Timestamp>,
    ) -> Result<Vec<JsonValue>, TransportError> {
        let url = self.updates_url(resource_id);
        let mut request = self.client.get(&url);
        if let Some(since) = since {
            request = request.query(&[("since", since.to_rfc3339())]);
        }

        let response = self.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                endpoint: url,
            });
        }

        let body: UpdatesResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidBody(e.to_string()))?;
        Ok(body.data)
    }
}

#[async_trait]
impl AccountOperations for HttpAccountApi {
    async fn transfer(&self, cmd: &TransferCommand) -> Result<TransferReceipt, DomainError> {
        let request = self
            .client
            .post(self.transfers_url(&cmd.account_id))
            .json(cmd);
        self.mutate(request, ErrorCode::AccountNotFound).await
    }

    async fn create_expense(
        &self,
        account_id: &ResourceId,
        draft: &ExpenseDraft,
    ) -> Result<Expense, DomainError> {
        let request = self.client.post(self.expenses_url(account_id)).json(draft);
        self.mutate(request, ErrorCode::AccountNotFound).await
    }

    async fn update_expense(
        &self,
        account_id: &ResourceId,
        expense_id: &str,
        draft: &ExpenseDraft,
    ) -> Result<Expense, DomainError> {
        let url = format!("{}/{}", self.expenses_url(account_id), expense_id);
        let request = self.client.put(url).json(draft);
        self.mutate(request, ErrorCode::ExpenseNotFound).await
    }
}
