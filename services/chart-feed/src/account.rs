//! Account collaborator client
//!
//! Thin client for the remote `/login` and `/create-account` endpoints.
//! Requests are validated locally first; a remote `{ "error": ... }` body or
//! a non-2xx status becomes `ValidationError::Rejected` carrying the
//! server's message so the caller can show it inline.

use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};
use types::account::{CreateAccountRequest, LoginRequest};
use types::errors::{FeedError, ValidationError};

use crate::config::FeedConfig;
use crate::source::{build_client, post_json, RawResponse, CREATE_ACCOUNT_PATH, LOGIN_PATH};

/// Fallback message when the server rejects without saying why.
const GENERIC_REJECTION: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone)]
pub struct AccountClient {
    client: Client,
    login_url: String,
    create_account_url: String,
}

impl AccountClient {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_client(config)?,
            login_url: config.endpoint(LOGIN_PATH),
            create_account_url: config.endpoint(CREATE_ACCOUNT_PATH),
        })
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<(), FeedError> {
        request.validate()?;
        let response = post_json(&self.client, &self.login_url, request).await?;
        let result = interpret_account_response(&response);
        match &result {
            Ok(()) => info!(username = %request.username, "Login accepted"),
            Err(err) => warn!(username = %request.username, error = %err, "Login rejected"),
        }
        result
    }

    pub async fn create_account(&self, request: &CreateAccountRequest) -> Result<(), FeedError> {
        request.validate()?;
        let response = post_json(&self.client, &self.create_account_url, request).await?;
        let result = interpret_account_response(&response);
        match &result {
            Ok(()) => info!(username = %request.username, "Account created"),
            Err(err) => warn!(username = %request.username, error = %err, "Account creation rejected"),
        }
        result
    }
}

/// Success is a 2xx status without an `error` field.
pub fn interpret_account_response(response: &RawResponse) -> Result<(), FeedError> {
    let body: Option<Value> = serde_json::from_slice(&response.body).ok();
    let server_message = body
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string);

    match (response.is_success(), server_message) {
        (true, None) => Ok(()),
        (_, Some(message)) => Err(ValidationError::Rejected(message).into()),
        (false, None) if response.is_server_error() && body.is_none() => Err(FeedError::Server {
            status: response.status,
            message: String::from_utf8_lossy(&response.body).chars().take(200).collect(),
        }),
        (false, None) => Err(ValidationError::Rejected(GENERIC_REJECTION.to_string()).into()),
    }
}
