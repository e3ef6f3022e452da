//! Prompt loader for YAML and plain-text prompt files.

use crate::types::PromptDefinition;
use nyaya_core::{AppError, AppResult};
use std::path::Path;

/// Load a prompt definition from a file.
///
/// `.yml`/`.yaml` files are parsed as a [`PromptDefinition`]; any other
/// extension is treated as a raw template whose ID is the file stem.
///
/// # Example
/// ```no_run
/// use nyaya_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".nyaya/prompt.yml"))?;
/// println!("Loaded prompt: {}", prompt.id);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(path: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!("Prompt file not found: {:?}", path)));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e)))?;

    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yml") | Some("yaml")
    );

    let definition = if is_yaml {
        serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e))
        })?
    } else {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("custom")
            .to_string();
        PromptDefinition::from_template(id, contents)
    };

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {}", definition.id);

    Ok(definition)
}

/// Load the configured prompt, falling back to the built-in template.
///
/// A missing file is not an error. A file that exists but is invalid is
/// reported and the built-in template is used instead.
pub fn load_or_default(path: Option<&Path>) -> PromptDefinition {
    let Some(path) = path else {
        return PromptDefinition::builtin();
    };

    if !path.exists() {
        tracing::debug!("Prompt file {:?} not found, using built-in template", path);
        return PromptDefinition::builtin();
    }

    match load_prompt(path) {
        Ok(definition) => definition,
        Err(e) => {
            tracing::warn!("{}; using built-in template", e);
            PromptDefinition::builtin()
        }
    }
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt("Prompt template cannot be empty".to_string()));
    }

    for slot in ["{{context}}", "{{question}}"] {
        if !def.template.contains(slot) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' is missing the {} slot",
                def.id, slot
            )));
        }
    }

    Ok(())
}
