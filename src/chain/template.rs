use std::collections::HashMap;
use std::fmt;

/// A prompt template with named `{placeholder}` slots.
///
/// The declared input variables and the placeholders referenced by the
/// template text must match exactly, in both directions. That check runs
/// once at construction, so a template that exists can always be rendered
/// from a complete set of bindings.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template text references a placeholder that was not declared.
    UndeclaredPlaceholder { name: String },
    /// A declared input variable never appears in the template text.
    UnusedVariable { name: String },
    /// A `{` without a matching `}`, or a stray `}` outside an escape.
    UnbalancedBrace,
    /// A `{}` with no name between the braces.
    EmptyPlaceholder,
    /// Rendering was asked to fill a placeholder with no binding for it.
    MissingBinding { name: String },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UndeclaredPlaceholder { name } => {
                write!(f, "template references undeclared placeholder '{name}'")
            }
            TemplateError::UnusedVariable { name } => {
                write!(f, "declared variable '{name}' does not appear in the template")
            }
            TemplateError::UnbalancedBrace => {
                write!(f, "template contains an unbalanced '{{' or '}}'")
            }
            TemplateError::EmptyPlaceholder => {
                write!(f, "template contains an empty '{{}}' placeholder")
            }
            TemplateError::MissingBinding { name } => {
                write!(f, "no binding provided for placeholder '{name}'")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

impl PromptTemplate {
    /// Builds a template, validating the declared variables against the
    /// placeholders found in the text.
    pub fn new(
        template: impl Into<String>,
        input_variables: &[&str],
    ) -> Result<Self, TemplateError> {
        let template = template.into();
        let referenced = placeholders(&template)?;
        let declared: Vec<String> = input_variables
            .iter()
            .map(|name| (*name).to_string())
            .collect();
        for name in &referenced {
            if !declared.iter().any(|declared| declared == name) {
                return Err(TemplateError::UndeclaredPlaceholder { name: name.clone() });
            }
        }
        for name in &declared {
            if !referenced.iter().any(|referenced| referenced == name) {
                return Err(TemplateError::UnusedVariable { name: name.clone() });
            }
        }
        Ok(Self {
            template,
            input_variables: declared,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Substitutes every placeholder from `bindings`.
    ///
    /// `{{` and `}}` produce literal braces. Bindings for names the template
    /// never references are ignored. An empty string is a valid binding.
    pub fn render(&self, bindings: &HashMap<String, String>) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(self.template.len());
        let mut chars = self.template.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '{' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        output.push('{');
                        continue;
                    }
                    let name = read_placeholder_name(&mut chars)?;
                    let value = bindings
                        .get(&name)
                        .ok_or(TemplateError::MissingBinding { name })?;
                    output.push_str(value);
                }
                '}' => {
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        output.push('}');
                    } else {
                        return Err(TemplateError::UnbalancedBrace);
                    }
                }
                other => output.push(other),
            }
        }
        Ok(output)
    }
}

/// Collects the distinct placeholder names referenced by `template`, in
/// order of first appearance.
fn placeholders(template: &str) -> Result<Vec<String>, TemplateError> {
    let mut names: Vec<String> = Vec::new();
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    continue;
                }
                let name = read_placeholder_name(&mut chars)?;
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                } else {
                    return Err(TemplateError::UnbalancedBrace);
                }
            }
            _ => {}
        }
    }
    Ok(names)
}

fn read_placeholder_name(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<String, TemplateError> {
    let mut name = String::new();
    for ch in chars.by_ref() {
        match ch {
            '}' => {
                if name.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder);
                }
                return Ok(name);
            }
            '{' => return Err(TemplateError::UnbalancedBrace),
            other => name.push(other),
        }
    }
    Err(TemplateError::UnbalancedBrace)
}
