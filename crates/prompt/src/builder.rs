//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use nyaya_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Render a prompt for one question and its assembled context.
///
/// # Example
/// ```
/// use nyaya_prompt::{build_prompt, PromptDefinition};
///
/// let def = PromptDefinition::builtin();
/// let built = build_prompt(&def, "What is bail?", "Section 436 CrPC ...").unwrap();
/// assert!(built.user.contains("Question: What is bail?"));
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    question: &str,
    context: &str,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut variables = HashMap::new();
    variables.insert("context", context);
    variables.insert("question", question);

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        system: definition.system.clone(),
        user,
        source_prompt_id: definition.id.clone(),
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<&str, &str>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Legal text is plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_builtin_template() {
        let def = PromptDefinition::builtin();
        let built = build_prompt(&def, "Punishment for cheating?", "Section 420 IPC: Cheating").unwrap();

        assert!(built.user.contains("Context:\nSection 420 IPC: Cheating\n\nQuestion: Punishment for cheating?"));
        assert!(built.system.is_none());
        assert_eq!(built.source_prompt_id, def.id);
    }

    #[test]
    fn test_no_html_escaping() {
        let def = PromptDefinition::from_template("t", "{{context}} / {{question}}");
        let built = build_prompt(&def, "A & B <c>?", "\"quoted\"").unwrap();
        assert_eq!(built.user, "\"quoted\" / A & B <c>?");
    }

    #[test]
    fn test_system_override_is_carried() {
        let mut def = PromptDefinition::from_template("t", "{{context}} {{question}}");
        def.system = Some("Be brief.".to_string());
        let built = build_prompt(&def, "q", "c").unwrap();
        assert_eq!(built.system.as_deref(), Some("Be brief."));
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        // Handlebars renders missing variables as empty string
        assert_eq!(render_template("Q: {{missing}}", &vars).unwrap(), "Q: ");
    }
}
