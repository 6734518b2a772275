//! Command-line entry point: restore or open a session and print it.

use portal_auth::{Action, Resource};
use portal_client::{BootstrapOutcome, ClientConfig, Credentials, PortalClient};
use portal_observability::ObservabilityConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    portal_observability::init_with(ObservabilityConfig::human());

    let config = ClientConfig::from_env();
    tracing::info!(api_root = %config.api_root, "starting portal client");

    let client = PortalClient::from_config(config)?;

    match client.session().bootstrap().await {
        BootstrapOutcome::Anonymous => tracing::info!("no previous session"),
        BootstrapOutcome::Restored => tracing::info!("previous session restored"),
        BootstrapOutcome::Failed(err) => tracing::warn!(error = %err, "previous session could not be restored"),
    }

    if !client.store().is_logged_in() {
        if let (Ok(email), Ok(password)) = (std::env::var("PORTAL_EMAIL"), std::env::var("PORTAL_PASSWORD")) {
            client.session().login(&Credentials::new(email, password)).await?;
        }
    }

    let user = client.store().user();
    match &user.role {
        Some(role) => {
            println!("logged in as {} {} <{}> ({role})", user.first_name, user.last_name, user.email);
            for (resource, action) in [
                (Resource::ANNOUNCEMENTS, Action::READ_ANY),
                (Resource::ANNOUNCEMENTS, Action::CREATE_ANY),
                (Resource::APPLICATIONS, Action::CREATE_OWN),
                (Resource::APPLICATIONS, Action::READ_ANY),
                (Resource::TEAMS, Action::CREATE_OWN),
            ] {
                let permission = client.permission(&resource, action);
                println!(
                    "  {resource} {action}: {}",
                    if permission.granted { "allowed" } else { "denied" }
                );
            }
        }
        None if client.store().is_logged_in() => println!("logged in without a role"),
        None => println!("not logged in"),
    }

    Ok(())
}
