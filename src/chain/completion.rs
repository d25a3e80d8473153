use async_trait::async_trait;

use crate::chain::provider::{
    self, ChatMessage, Completion, CompletionOptions, Provider, ProviderError, is_api_key_present,
};

/// The single seam between pipeline execution and a text-completion
/// backend. Runners only see this trait, so tests can substitute a stub.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, ProviderError>;
}

/// [`TextCompletion`] backed by a chat-completion provider.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    provider: Provider,
    model: String,
    verbose: bool,
}

impl CompletionClient {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[async_trait]
impl TextCompletion for CompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, ProviderError> {
        if self.verbose {
            eprintln!(
                "completion request provider={} model={} prompt_chars={} api_key_present={}",
                self.provider.as_str(),
                self.model,
                prompt.chars().count(),
                is_api_key_present(self.provider)
            );
        }
        let messages = [ChatMessage::user(prompt)];
        let completion =
            provider::complete(self.provider, &self.model, &messages, *options).await?;
        if self.verbose {
            eprintln!(
                "completion ok provider={} chars={}",
                self.provider.as_str(),
                completion.text.chars().count()
            );
        }
        Ok(completion)
    }
}
