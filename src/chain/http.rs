use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::chain::provider::{CompletionOptions, Provider, ProviderError};

#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestPolicy {
    pub timeout_secs: Option<u64>,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            retries: 0,
            retry_delay_ms: 500,
        }
    }
}

impl From<&CompletionOptions> for RequestPolicy {
    fn from(options: &CompletionOptions) -> Self {
        Self {
            timeout_secs: options.timeout_secs,
            retries: options.retries,
            retry_delay_ms: options.retry_delay_ms,
        }
    }
}

pub(crate) async fn send_json_request<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    payload: &T,
    provider: Provider,
    policy: RequestPolicy,
) -> Result<reqwest::Response, ProviderError> {
    let max_attempts = policy.retries.saturating_add(1);
    let mut attempt = 0;

    loop {
        let mut request = client.post(url).bearer_auth(api_key).json(payload);

        if let Some(timeout_secs) = policy.timeout_secs {
            request = request.timeout(Duration::from_secs(timeout_secs));
        }

        match request.send().await {
            Ok(response) => {
                if response.status().is_success() {
                    return Ok(response);
                }

                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let can_retry = is_retryable_status(status) && attempt + 1 < max_attempts;

                if can_retry {
                    sleep(retry_delay(attempt, policy.retry_delay_ms)).await;
                    attempt += 1;
                    continue;
                }

                return Err(ProviderError::Api {
                    provider,
                    status,
                    body,
                });
            }
            Err(source) => {
                let can_retry = is_retryable_request_error(&source) && attempt + 1 < max_attempts;

                if can_retry {
                    sleep(retry_delay(attempt, policy.retry_delay_ms)).await;
                    attempt += 1;
                    continue;
                }

                return Err(classify_request_error(provider, source, policy.timeout_secs));
            }
        }
    }
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
    provider: Provider,
) -> Result<T, ProviderError> {
    response
        .json()
        .await
        .map_err(|source| ProviderError::Request { provider, source })
}

fn classify_request_error(
    provider: Provider,
    source: reqwest::Error,
    timeout_secs: Option<u64>,
) -> ProviderError {
    if source.is_timeout() {
        ProviderError::Timeout {
            provider,
            timeout_secs,
        }
    } else {
        ProviderError::Request { provider, source }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_request_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn retry_delay(attempt: u32, base_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_mul(factor).min(30_000);
    Duration::from_millis(delay_ms)
}
