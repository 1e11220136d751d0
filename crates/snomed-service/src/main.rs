//! SNOMED CT extension upgrade runner.

use std::process::ExitCode;

use snomed_service::{run, Seed, ServiceConfig};
use snomed_types::UpgradeStatus;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServiceConfig::from_env()?;
    tracing::info!("Loading seed from: {}", config.seed_path.display());
    let seed = Seed::load(&config.seed_path)?;

    let report = run(&config, &seed).await?;

    match report.job.status {
        UpgradeStatus::Failed => {
            tracing::error!(
                "Upgrade of {} to {} failed: {}",
                report.job.code_system_short_name,
                report.job.new_dependant_version,
                report.job.error_message.as_deref().unwrap_or("no message")
            );
            Ok(ExitCode::FAILURE)
        }
        _ => {
            tracing::info!(
                "Upgrade of {} to {} completed",
                report.job.code_system_short_name,
                report.job.new_dependant_version
            );
            tracing::info!(
                "Branch {} metadata: {}",
                report.branch.path,
                serde_json::to_string(&report.branch.metadata)?
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
