use std::fmt;

use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Password};
use error_stack::{IntoReport, Result, ResultExt};

use crate::config::AppConfig;

#[derive(Debug)]
pub struct DialoguerError;

impl fmt::Display for DialoguerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dialoguer error")
    }
}

impl std::error::Error for DialoguerError {}

pub type DialoguerResult<T> = error_stack::Result<T, DialoguerError>;

#[derive(Debug, Clone)]
pub struct Dialoguer;

impl Dialoguer {
    pub fn input(prompt_text: String) -> Result<String, DialoguerError> {
        let colorful_theme = &ColorfulTheme::default();
        let mut input = Input::with_theme(colorful_theme);
        let dialog: String = input
            .with_prompt(&prompt_text)
            .allow_empty(true)
            .interact_text()
            .into_report()
            .change_context(DialoguerError)?;

        Ok(dialog)
    }

    pub fn password(prompt_text: String) -> Result<String, DialoguerError> {
        let colorful_theme = &ColorfulTheme::default();
        let mut input = Password::with_theme(colorful_theme);
        let dialog: String = input
            .with_prompt(&prompt_text)
            .allow_empty_password(true)
            .interact()
            .into_report()
            .change_context(DialoguerError)?;

        Ok(dialog)
    }

    /// Asks how many days back to look, keeping `default_days` on empty input.
    pub fn lookback_days(default_days: i64) -> DialoguerResult<i64> {
        let prompt_text = format!(
            "New tracks of the last {} days will be added (type a number to change it)",
            default_days
        );
        let answer = Self::input(prompt_text)?;
        Ok(parse_lookback_days(&answer, default_days))
    }
}

/// Empty input keeps the default, anything that is not a positive number
/// falls back to the application default.
pub fn parse_lookback_days(answer: &str, default_days: i64) -> i64 {
    let answer = answer.trim();
    if answer.is_empty() {
        return default_days;
    }
    match answer.parse::<i64>() {
        Ok(days) if days > 0 => days,
        Ok(_) => {
            println!(
                "{}",
                format!(
                    "Please type a positive number. Using {} days.",
                    AppConfig::DEFAULT_LOOKBACK_DAYS
                )
                .red()
            );
            AppConfig::DEFAULT_LOOKBACK_DAYS
        }
        Err(_) => {
            println!(
                "{}",
                format!(
                    "Invalid input. Using {} days.",
                    AppConfig::DEFAULT_LOOKBACK_DAYS
                )
                .red()
            );
            AppConfig::DEFAULT_LOOKBACK_DAYS
        }
    }
}
