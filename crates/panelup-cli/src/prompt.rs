use anyhow::{anyhow, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

/// Human-in-the-loop answers. Injected so flows can run against scripted answers.
pub(crate) trait Prompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Free-form answer; the first suggestion is offered as the default.
    fn ask(&mut self, prompt: &str, suggestions: &[&str]) -> Result<String>;
}

pub(crate) struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub(crate) fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(|err| anyhow!("failed to read confirmation: {err}"))
    }

    fn ask(&mut self, prompt: &str, suggestions: &[&str]) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(format_ask_prompt(prompt, suggestions))
            .validate_with(|value: &String| -> Result<(), &'static str> {
                if value.trim().is_empty() {
                    Err("a name is required")
                } else {
                    Ok(())
                }
            });
        if let Some(first) = suggestions.first() {
            input = input.default((*first).to_string());
        }
        let answer = input
            .interact_text()
            .map_err(|err| anyhow!("failed to read answer: {err}"))?;
        Ok(answer.trim().to_string())
    }
}

pub(crate) fn format_ask_prompt(prompt: &str, suggestions: &[&str]) -> String {
    if suggestions.is_empty() {
        return prompt.to_string();
    }
    format!("{prompt} ({})", suggestions.join("/"))
}
