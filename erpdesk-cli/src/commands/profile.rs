use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use rpassword::prompt_password;
use shared::config::Config;
use shared::models::{EditUserRequest, PasswordChangeForm, UserProfile};

use super::{connect, report};

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Show the logged-in user's profile
    Show,

    /// Change profile fields; omitted fields keep their current value
    Edit(EditArgs),

    /// Change the password (prompts for old and new)
    Password,
}

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    #[arg(long)]
    pub full_name: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    /// New e-mail; pass an empty value to remove it
    #[arg(long)]
    pub email: Option<String>,
}

impl EditArgs {
    /// Overlay the given fields onto the stored profile.
    fn apply(self, profile: &UserProfile) -> EditUserRequest {
        let mut request = EditUserRequest::from_profile(profile);
        if let Some(full_name) = self.full_name {
            request.full_name = full_name.trim().to_string();
        }
        if let Some(username) = self.username {
            request.username = username.trim().to_string();
        }
        if let Some(email) = self.email {
            let email = email.trim().to_string();
            request.email = (!email.is_empty()).then_some(email);
        }
        request
    }
}

pub async fn run(config: &Config, command: ProfileCommand) -> Result<()> {
    let client = connect(config)?;
    let Some(profile) = client.current_user().await.map_err(|err| report(&client, err))? else {
        bail!("no user profile found for this location");
    };

    match command {
        ProfileCommand::Show => print_profile(&profile),
        ProfileCommand::Edit(args) => {
            let request = args.apply(&profile);
            request.validate()?;
            client
                .edit_user(&profile.id, request)
                .await
                .map_err(|err| report(&client, err))?;
            println!("Profile updated.");
        }
        ProfileCommand::Password => {
            let form = PasswordChangeForm {
                old_password: prompt_password("Current password: ")?,
                new_password: prompt_password("New password: ")?,
                confirm_password: prompt_password("Repeat new password: ")?,
            };
            let request = form.into_request()?;
            client
                .change_password(&profile.id, request)
                .await
                .map_err(|err| report(&client, err))?;
            println!("Password changed.");
        }
    }

    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("user id: {}", profile.id);
    println!("full name: {}", profile.full_name);
    println!("username: {}", profile.username);
    println!("e-mail: {}", profile.email.as_deref().unwrap_or("-"));
    println!("role: {}", profile.role.as_deref().unwrap_or("-"));
}
