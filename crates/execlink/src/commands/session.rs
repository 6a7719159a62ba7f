//! Login, registration, logout and whoami handlers.

use std::io::{self, IsTerminal};

use dialoguer::{Confirm, Input, Password};
use secrecy::SecretString;

use execlink_core::{Identity, Orchestrator, Registration};

use crate::cli::{LoginArgs, RegisterArgs};
use crate::error::CliError;
use crate::output::{self, Output};

use super::util::{self, prompt_err};

fn prompt_text(label: &str) -> Result<String, CliError> {
    Input::new()
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)
}

fn prompt_secret(label: &str) -> Result<SecretString, CliError> {
    Password::new()
        .with_prompt(label)
        .allow_empty_password(true)
        .interact()
        .map(SecretString::from)
        .map_err(prompt_err)
}

pub async fn login(orch: &Orchestrator, args: LoginArgs, out: &Output) -> Result<(), CliError> {
    let username = match args.username {
        Some(name) => name,
        None => prompt_text("Username")?,
    };
    let password = match args.password {
        Some(pw) => SecretString::from(pw),
        None => prompt_secret("Password")?,
    };

    // Blank fields fail here, before any probe is sent.
    execlink_core::validate_login(&username, &password)?;
    util::discover(orch, out).await?;
    let identity = orch.login(&username, &password).await?;
    print_identity(&identity, out, "Logged in as")
}

pub async fn register(
    orch: &Orchestrator,
    args: RegisterArgs,
    out: &Output,
) -> Result<(), CliError> {
    let username = match args.username {
        Some(name) => name,
        None => prompt_text("Username")?,
    };
    let email = match args.email {
        Some(email) => email,
        None => prompt_text("Email")?,
    };
    let password = prompt_secret("Password")?;
    let confirm_password = prompt_secret("Confirm password")?;
    let accept_tos = if !args.accept_tos && io::stdin().is_terminal() {
        Confirm::new()
            .with_prompt("Accept the Terms of Service?")
            .default(false)
            .interact()
            .map_err(prompt_err)?
    } else {
        args.accept_tos
    };

    let registration = Registration {
        username,
        email,
        password,
        confirm_password,
        accept_tos,
    };

    execlink_core::validate_registration(&registration)?;
    util::discover(orch, out).await?;
    let identity = orch.register(&registration).await?;
    print_identity(&identity, out, "Registered and logged in as")
}

pub fn logout(orch: &Orchestrator, out: &Output) -> Result<(), CliError> {
    let message = if orch.logout() {
        "Logged out successfully"
    } else {
        "No active session"
    };
    output::print_output(message, out.quiet);
    Ok(())
}

pub fn whoami(orch: &Orchestrator, out: &Output) -> Result<(), CliError> {
    let identity = orch.identity().ok_or(CliError::AuthRequired)?;
    let rendered =
        output::render_single(out.format, &identity, identity_detail, |i| i.username.clone())?;
    output::print_output(&rendered, out.quiet);
    Ok(())
}

fn print_identity(identity: &Identity, out: &Output, verb: &str) -> Result<(), CliError> {
    let rendered = output::render_single(
        out.format,
        identity,
        |i| format!("{verb} {}", i.username),
        |i| i.username.clone(),
    )?;
    output::print_output(&rendered, out.quiet);
    Ok(())
}

fn identity_detail(identity: &Identity) -> String {
    let when = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map_or_else(|| "-".to_owned(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string())
    };
    output::detail(&[
        ("Username", identity.username.clone()),
        (
            "Email",
            if identity.email.is_empty() {
                "-".to_owned()
            } else {
                identity.email.clone()
            },
        ),
        ("Created", when(identity.created_at)),
        ("Last login", when(identity.last_login)),
    ])
}
