use anyhow::Result;
use clap::Subcommand;
use shared::config::Config;
use shared::models::Location;

use super::{connect, report};

#[derive(Subcommand, Debug)]
pub enum LocationsCommand {
    /// List suppliers (factories)
    List,

    /// Show a location; defaults to the logged-in user's location
    Show { id: Option<String> },
}

pub async fn run(config: &Config, command: LocationsCommand) -> Result<()> {
    let client = connect(config)?;

    match command {
        LocationsCommand::List => {
            let factories = client.factories().await.map_err(|err| report(&client, err))?;
            if factories.is_empty() {
                println!("No locations found.");
            }
            for location in &factories {
                println!(
                    "{:<38} {:<32} {}",
                    location.id,
                    location.name,
                    location.phone.as_deref().unwrap_or("-")
                );
            }
        }
        LocationsCommand::Show { id } => {
            let location = client.location(id.as_deref()).await.map_err(|err| report(&client, err))?;
            print_location(&location);
        }
    }

    Ok(())
}

fn print_location(location: &Location) {
    println!("location: {}", location.id);
    println!("name: {}", location.name);
    if let Some(kind) = &location.kind {
        println!("type: {kind}");
    }
    if let Some(address) = &location.address {
        println!("address: {address}");
    }
    if let Some(phone) = &location.phone {
        println!("phone: {phone}");
    }
}
