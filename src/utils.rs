use once_cell::sync::Lazy;
use std::io::IsTerminal;

pub static INTERACTIVE: Lazy<bool> = Lazy::new(|| std::io::stdin().is_terminal());

/// Ask the user to confirm a destructive action. `assume_yes` skips the prompt;
/// without a terminal the answer is no.
pub fn confirm(prompt: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    if !*INTERACTIVE {
        return false;
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
