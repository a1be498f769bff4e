use inquire::validator::Validation;
use inquire::{Password, PasswordDisplayMode, Text};

use crate::types::validate_tenant_name;

/// Returns `value` if given, prompts for an existing password otherwise.
/// In non-interactive mode a missing value stays missing so the caller
/// reports it as a missing secret.
pub fn existing_password(
    value: Option<String>,
    prompt: &str,
    non_interactive: bool,
) -> anyhow::Result<Option<String>> {
    if value.is_some() || non_interactive {
        return Ok(value);
    }
    let password = Password::new(prompt)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    Ok(Some(password))
}

/// Like [`existing_password`], but asks for confirmation since the value
/// is being set for the first time.
pub fn new_password(
    value: Option<String>,
    prompt: &str,
    non_interactive: bool,
) -> anyhow::Result<Option<String>> {
    if value.is_some() || non_interactive {
        return Ok(value);
    }
    let password = Password::new(prompt)
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_validator(|input: &str| {
            if input.is_empty() {
                Ok(Validation::Invalid("Password cannot be empty".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .with_custom_confirmation_message("Confirm:")
        .prompt()?;
    Ok(Some(password))
}

pub fn tenant_name(value: Option<String>, non_interactive: bool) -> anyhow::Result<String> {
    if let Some(name) = value {
        return Ok(name);
    }
    if non_interactive {
        anyhow::bail!("--name is required in non-interactive mode");
    }
    let name = Text::new("Tenant name:")
        .with_validator(|input: &str| {
            Ok(validate_tenant_name(input)
                .map(|()| Validation::Valid)
                .unwrap_or_else(|e| Validation::Invalid(e.into())))
        })
        .prompt()?;
    Ok(name)
}

pub fn manager_email(value: Option<String>, non_interactive: bool) -> anyhow::Result<String> {
    if let Some(email) = value {
        return Ok(email);
    }
    if non_interactive {
        anyhow::bail!(
            "--manager-email is required in non-interactive mode (or pass --allow-default-manager)"
        );
    }
    let email = Text::new("Manager email:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("Email cannot be empty".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;
    Ok(email)
}
