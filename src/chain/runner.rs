use std::collections::HashMap;
use std::fmt;

use crate::chain::completion::TextCompletion;
use crate::chain::pipeline::{ExecutionResult, Pipeline, PipelineError};
use crate::chain::provider::{CompletionOptions, ProviderError, Usage};
use crate::chain::template::TemplateError;

#[derive(Debug)]
pub enum ChainError {
    Pipeline(PipelineError),
    Template(TemplateError),
    Provider(ProviderError),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::Pipeline(err) => write!(f, "{err}"),
            ChainError::Template(err) => write!(f, "{err}"),
            ChainError::Provider(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChainError::Pipeline(err) => Some(err),
            ChainError::Template(err) => Some(err),
            ChainError::Provider(err) => Some(err),
        }
    }
}

impl From<PipelineError> for ChainError {
    fn from(err: PipelineError) -> Self {
        ChainError::Pipeline(err)
    }
}

impl From<TemplateError> for ChainError {
    fn from(err: TemplateError) -> Self {
        ChainError::Template(err)
    }
}

impl From<ProviderError> for ChainError {
    fn from(err: ProviderError) -> Self {
        ChainError::Provider(err)
    }
}

/// Runs the steps one by one without validating the pipeline first. A bad
/// reference surfaces at the step that holds it, after every earlier step
/// has already called the completion backend.
pub async fn run_manual(
    client: &dyn TextCompletion,
    pipeline: &Pipeline,
    inputs: &HashMap<String, String>,
    options: &CompletionOptions,
) -> Result<ExecutionResult, ChainError> {
    execute_steps(client, pipeline, inputs, options).await
}

/// Validates the whole pipeline up front, then runs the same step loop as
/// [`run_manual`]. A bad reference fails before any completion call.
pub async fn run_sequential(
    client: &dyn TextCompletion,
    pipeline: &Pipeline,
    inputs: &HashMap<String, String>,
    options: &CompletionOptions,
) -> Result<ExecutionResult, ChainError> {
    pipeline.validate()?;
    execute_steps(client, pipeline, inputs, options).await
}

async fn execute_steps(
    client: &dyn TextCompletion,
    pipeline: &Pipeline,
    inputs: &HashMap<String, String>,
    options: &CompletionOptions,
) -> Result<ExecutionResult, ChainError> {
    let mut outputs: HashMap<String, String> = HashMap::new();
    let mut usage: Option<Usage> = None;

    for step in pipeline.steps() {
        let bindings = resolve_bindings(
            step.template().input_variables(),
            step.output_key(),
            inputs,
            &outputs,
        )?;
        let prompt = step.template().render(&bindings)?;
        let completion = client.complete(&prompt, options).await?;
        accumulate_usage(&mut usage, completion.usage);
        outputs.insert(step.output_key().to_string(), completion.text);
    }

    Ok(ExecutionResult::new(inputs.clone(), outputs, usage))
}

/// Gathers the values a step needs. Step outputs shadow initial inputs of
/// the same name.
fn resolve_bindings(
    names: &[String],
    output_key: &str,
    inputs: &HashMap<String, String>,
    outputs: &HashMap<String, String>,
) -> Result<HashMap<String, String>, ChainError> {
    let mut bindings = HashMap::new();
    for name in names {
        let value = outputs
            .get(name)
            .or_else(|| inputs.get(name))
            .ok_or_else(|| PipelineError::UnresolvedReference {
                output_key: output_key.to_string(),
                name: name.clone(),
            })?;
        bindings.insert(name.clone(), value.clone());
    }
    Ok(bindings)
}

fn accumulate_usage(total: &mut Option<Usage>, step: Option<Usage>) {
    let Some(step) = step else { return };
    match total {
        None => *total = Some(step),
        Some(total) => {
            total.prompt_tokens = add_counts(total.prompt_tokens, step.prompt_tokens);
            total.completion_tokens = add_counts(total.completion_tokens, step.completion_tokens);
            total.total_tokens = add_counts(total.total_tokens, step.total_tokens);
        }
    }
}

fn add_counts(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.saturating_add(b)),
        (Some(value), None) | (None, Some(value)) => Some(value),
        (None, None) => None,
    }
}
