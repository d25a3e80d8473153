use std::env;

use serde::{Deserialize, Serialize};

use crate::chain::http::{RequestPolicy, decode_json, send_json_request};
use crate::chain::provider::{
    ChatMessage, Completion, CompletionOptions, Provider, ProviderError, Usage, api_key_env,
    endpoint,
};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

pub async fn complete_messages(
    messages: &[ChatMessage],
    model: &str,
    options: CompletionOptions,
) -> Result<Completion, ProviderError> {
    let provider = Provider::Fireworks;
    let key_env = api_key_env(provider);
    let api_key =
        env::var(key_env).map_err(|_| ProviderError::MissingApiKey { key_env, provider })?;

    let payload = ChatCompletionRequest {
        model: model.to_string(),
        messages: messages.to_vec(),
        temperature: options.temperature,
        max_tokens: options.max_tokens,
    };

    let client = reqwest::Client::new();
    let response = send_json_request(
        &client,
        endpoint(provider),
        &api_key,
        &payload,
        provider,
        RequestPolicy::from(&options),
    )
    .await?;

    let body: ChatCompletionResponse = decode_json(response, provider).await?;
    let text = body
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .filter(|content| !content.is_empty())
        .ok_or(ProviderError::EmptyResponse { provider })?;
    let usage = body.usage.map(|usage| Usage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    });

    Ok(Completion { text, usage })
}
