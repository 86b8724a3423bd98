use anyhow::Result;
use calplan_core::EventTime;
use dialoguer::Input;
use owo_colors::OwoColorize;

use super::parse::{default_end, parse_end};

/// Prompt the user with retry on parse errors.
pub fn prompt_with_retry<F>(prompt: &str, parse: F) -> Result<EventTime>
where
    F: Fn(&str) -> Result<EventTime>,
{
    loop {
        let input: String = Input::new().with_prompt(prompt).interact_text()?;
        match parse(&input) {
            Ok(result) => return Ok(result),
            Err(e) => {
                eprintln!("  {}", e.to_string().red());
            }
        }
    }
}

/// Prompt for duration/end with retry on parse errors.
pub fn prompt_duration(start: &EventTime) -> Result<EventTime> {
    let default_hint = if matches!(start, EventTime::Date { .. }) {
        "1 day"
    } else {
        "1 hour"
    };

    loop {
        let input: String = Input::new()
            .with_prompt(format!("  How long? ({})", default_hint))
            .default(String::new())
            .show_default(false)
            .interact_text()?;
        if input.is_empty() {
            return Ok(default_end(start));
        }
        match parse_end(&input, start) {
            Ok(result) => return Ok(result),
            Err(e) => {
                eprintln!("  {}", e.to_string().red());
            }
        }
    }
}

pub fn prompt_title() -> Result<String> {
    Ok(Input::<String>::new().with_prompt("  Title").interact_text()?)
}
