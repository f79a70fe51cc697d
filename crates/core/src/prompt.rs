//! Two-message prompt construction.

use crate::TemplateConfig;
use serde::{Deserialize, Serialize};

/// The substitution point inside `user_prompt_template`.
pub const INPUT_PLACEHOLDER: &str = "{input_text}";

/// A system instruction and a user instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Taken verbatim from the template configuration.
    pub system: String,
    /// The user template with the input text substituted in.
    pub user: String,
}

impl Prompt {
    /// Build the prompt for `raw_text` under `config`.
    pub fn build(raw_text: &str, config: &TemplateConfig) -> Self {
        Self {
            system: config.system_prompt.clone(),
            user: render_user_prompt(&config.user_prompt_template, raw_text),
        }
    }
}

/// Substitute `raw_text` into `template` in a single left-to-right pass.
///
/// `{{` and `}}` collapse to literal braces so templates can embed JSON
/// examples. Inserted text is never rescanned, and any other brace is
/// copied through untouched.
pub fn render_user_prompt(template: &str, raw_text: &str) -> String {
    let mut output = String::with_capacity(template.len() + raw_text.len());
    let mut rest = template;

    while let Some(pos) = rest.find(&['{', '}'][..]) {
        output.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with(INPUT_PLACEHOLDER) {
            output.push_str(raw_text);
            rest = &tail[INPUT_PLACEHOLDER.len()..];
        } else if tail.starts_with("{{") || tail.starts_with("}}") {
            output.push_str(&tail[..1]);
            rest = &tail[2..];
        } else {
            output.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }

    output.push_str(rest);
    output
}
