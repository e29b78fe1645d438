// UI layer: interactive prompts with `dialoguer` and spinners with
// `indicatif`. The workflow only sees the `Prompter` trait so it can be
// driven without a terminal.

use crate::error::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

const SEPARATOR_LABEL: &str = "──────────────";

/// One row of a selection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Item(String),
    /// Visual divider, never a valid answer.
    Separator,
}

impl Choice {
    pub fn item(label: impl Into<String>) -> Self {
        Choice::Item(label.into())
    }

    fn label(&self) -> &str {
        match self {
            Choice::Item(label) => label,
            Choice::Separator => SEPARATOR_LABEL,
        }
    }
}

#[cfg_attr(test, automock)]
pub trait Prompter {
    /// Free text. Empty answers are rejected by the prompt itself.
    fn input(&self, prompt: &str) -> Result<String>;

    /// Hidden input.
    fn password(&self, prompt: &str) -> Result<String>;

    /// Index into `choices` of an `Item` row. `choices` is never empty.
    fn select(&self, prompt: &str, choices: &[Choice]) -> Result<usize>;
}

/// `Prompter` on the real terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        TerminalPrompter {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn input(&self, prompt: &str) -> Result<String> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_text()?;
        Ok(answer)
    }

    fn password(&self, prompt: &str) -> Result<String> {
        let answer = Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact()?;
        Ok(answer)
    }

    fn select(&self, prompt: &str, choices: &[Choice]) -> Result<usize> {
        let labels: Vec<&str> = choices.iter().map(Choice::label).collect();
        loop {
            let index = Select::with_theme(&self.theme)
                .with_prompt(prompt)
                .items(&labels)
                .default(0)
                .interact()?;
            if let Some(Choice::Item(_)) = choices.get(index) {
                return Ok(index);
            }
        }
    }
}

/// Spinner shown while a network call is in flight.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
