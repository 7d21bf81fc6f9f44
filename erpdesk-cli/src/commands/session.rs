use std::{
    io::{self, Write},
    path::Path,
};

use anyhow::{Result, bail};
use clap::Args;
use client::Session;
use rpassword::prompt_password;
use shared::config::Config;

use super::{connect, report};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username, e-mail, or phone number. Prompted for when omitted.
    #[arg(long, short)]
    pub identifier: Option<String>,
}

pub async fn login(config: &Config, args: LoginArgs) -> Result<()> {
    let identifier = match args.identifier {
        Some(identifier) if !identifier.trim().is_empty() => identifier.trim().to_string(),
        _ => prompt("Login: ")?,
    };
    let password = prompt_password("Password: ")?;
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    let client = connect(config)?;
    let response = client
        .login(&identifier, &password)
        .await
        .map_err(|err| report(&client, err))?;

    println!("Logged in as {}", response.user.id);
    print_session(&client.session().snapshot(), &config.session.resolved_path());
    Ok(())
}

pub async fn logout(config: &Config) -> Result<()> {
    let client = connect(config)?;
    let path = config.session.resolved_path();

    if !client.session().is_authenticated() {
        println!("No stored session at {}", path.display());
        return Ok(());
    }

    client.logout().await.map_err(|err| report(&client, err))?;
    println!("Removed session at {}", path.display());
    Ok(())
}

pub fn whoami(config: &Config) -> Result<()> {
    let client = connect(config)?;
    let session = client.session().snapshot();
    let path = config.session.resolved_path();

    if session.is_authenticated {
        print_session(&session, &path);
    } else {
        println!("Not logged in (session file: {})", path.display());
    }
    Ok(())
}

fn print_session(session: &Session, path: &Path) {
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!("user id: {}", show(&session.user_id));
    println!("role: {}", show(&session.role));
    println!("location: {}", show(&session.location_id));
    println!("session stored at {}", path.display());
}

pub(crate) fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        bail!("input must not be empty");
    }
    Ok(trimmed)
}
