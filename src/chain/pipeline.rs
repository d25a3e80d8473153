use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::chain::provider::Usage;
use crate::chain::template::PromptTemplate;

/// One pipeline step: render a template, complete it, store the text under
/// the step's output key.
#[derive(Debug, Clone)]
pub struct ChainStep {
    template: PromptTemplate,
    output_key: String,
}

impl ChainStep {
    pub fn new(template: PromptTemplate, output_key: impl Into<String>) -> Self {
        Self {
            template,
            output_key: output_key.into(),
        }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }
}

/// An ordered list of steps together with the names the caller must supply
/// and the names the pipeline promises to produce.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<ChainStep>,
    input_variables: Vec<String>,
    output_variables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Two steps share the same output key.
    DuplicateOutputKey { key: String },
    /// A step references a name that no earlier step and no initial input
    /// provides.
    UnresolvedReference { output_key: String, name: String },
    /// A declared output variable is not the output key of any step.
    UnproducedOutput { name: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::DuplicateOutputKey { key } => {
                write!(f, "duplicate output key '{key}' in pipeline")
            }
            PipelineError::UnresolvedReference { output_key, name } => {
                write!(
                    f,
                    "step '{output_key}' references '{name}', which no earlier step or initial input provides"
                )
            }
            PipelineError::UnproducedOutput { name } => {
                write!(f, "declared output '{name}' is not produced by any step")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

impl Pipeline {
    /// Builds a pipeline. Output keys must be unique across steps; full
    /// reference checking is deferred to [`Pipeline::validate`].
    pub fn new(
        steps: Vec<ChainStep>,
        input_variables: &[&str],
        output_variables: &[&str],
    ) -> Result<Self, PipelineError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for step in &steps {
            if !seen.insert(step.output_key()) {
                return Err(PipelineError::DuplicateOutputKey {
                    key: step.output_key().to_string(),
                });
            }
        }
        Ok(Self {
            steps,
            input_variables: input_variables.iter().map(|s| s.to_string()).collect(),
            output_variables: output_variables.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    pub fn output_variables(&self) -> &[String] {
        &self.output_variables
    }

    /// Checks that every step only references names available at its
    /// position, and that every declared output is produced by some step.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut available: HashSet<&str> = self
            .input_variables
            .iter()
            .map(String::as_str)
            .collect();
        for step in &self.steps {
            for name in step.template().input_variables() {
                if !available.contains(name.as_str()) {
                    return Err(PipelineError::UnresolvedReference {
                        output_key: step.output_key().to_string(),
                        name: name.clone(),
                    });
                }
            }
            available.insert(step.output_key());
        }
        for name in &self.output_variables {
            if !self.steps.iter().any(|step| step.output_key() == name) {
                return Err(PipelineError::UnproducedOutput { name: name.clone() });
            }
        }
        Ok(())
    }
}

/// The outcome of a pipeline run: the initial inputs, every step output
/// keyed by its output key, and token usage when the provider reported it.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    inputs: HashMap<String, String>,
    outputs: HashMap<String, String>,
    usage: Option<Usage>,
}

impl ExecutionResult {
    pub(crate) fn new(
        inputs: HashMap<String, String>,
        outputs: HashMap<String, String>,
        usage: Option<Usage>,
    ) -> Self {
        Self {
            inputs,
            outputs,
            usage,
        }
    }

    /// Looks up a step output by its output key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).map(String::as_str)
    }

    /// Looks up one of the initial inputs by name.
    pub fn input(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).map(String::as_str)
    }

    pub fn outputs(&self) -> &HashMap<String, String> {
        &self.outputs
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }
}
