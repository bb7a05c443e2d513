//! Object store administration for Folio.
//!
//! Reads the same `object_store` settings as the server (`FOLIO__OBJECT_STORE__*`).

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_core::storage::{
    BucketConfig, BucketProvisioner, ObjectStoreClient, ProvisionOutcome, S3ObjectStore,
};
use folio_shared::config::ObjectStoreSettings;

#[derive(Parser)]
#[command(name = "storage-setup", about = "Folio object store administration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate settings and check that the bucket is reachable
    Check,
    /// Create the bucket with a public-read policy if it is missing
    Ensure,
    /// Reapply the public-read policy to an existing bucket
    SetPublic,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let settings = ObjectStoreSettings::load().context("failed to load object store settings")?;
    let config = Arc::new(BucketConfig::from(&settings));
    let client: Arc<dyn ObjectStoreClient> = Arc::new(S3ObjectStore::new(&config));
    let bucket = config.bucket()?.to_string();

    info!(endpoint = %config.endpoint_url(), %bucket, "using object store");

    match cli.command {
        Commands::Check => {
            let exists = client
                .bucket_exists(&bucket)
                .await
                .context("object store is not reachable")?;
            if exists {
                println!("OK: bucket '{bucket}' exists at {}", config.endpoint_url());
            } else {
                println!(
                    "OK: endpoint {} reachable, bucket '{bucket}' does not exist yet",
                    config.endpoint_url()
                );
            }
        }
        Commands::Ensure => {
            let outcome = BucketProvisioner::new(client, config.clone())
                .ensure()
                .await
                .context("failed to provision bucket")?;
            match outcome {
                ProvisionOutcome::AlreadyPresent => println!("bucket '{bucket}' already exists"),
                ProvisionOutcome::CreatedConcurrently => {
                    println!("bucket '{bucket}' was created by another process");
                }
                ProvisionOutcome::Created {
                    policy_attached: true,
                } => println!("bucket '{bucket}' created with public-read policy"),
                ProvisionOutcome::Created {
                    policy_attached: false,
                } => {
                    bail!("bucket '{bucket}' created but the public-read policy was rejected");
                }
            }
        }
        Commands::SetPublic => {
            let exists = client
                .bucket_exists(&bucket)
                .await
                .context("object store is not reachable")?;
            if !exists {
                bail!("bucket '{bucket}' does not exist, run `storage-setup ensure` first");
            }
            BucketProvisioner::new(client, config.clone())
                .apply_policy()
                .await
                .context("failed to apply public-read policy")?;
            println!("bucket '{bucket}' is now publicly readable");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommand_names() {
        assert!(matches!(
            Cli::try_parse_from(["storage-setup", "set-public"]).unwrap().command,
            Commands::SetPublic
        ));
        assert!(Cli::try_parse_from(["storage-setup", "drop"]).is_err());
    }
}
