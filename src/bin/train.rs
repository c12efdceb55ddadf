//! Training entry point: fit the forest, write the model and metrics files.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iris_classifier::config::Config;
use iris_classifier::training::run_pipeline;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iris_classifier=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let outcome = run_pipeline(&config)
        .inspect_err(|e| tracing::error!("Training failed: {}", e))
        .context("training pipeline failed")?;

    tracing::info!(
        "Training pipeline completed: accuracy={:.4}, model={}, metrics={}",
        outcome.metrics.accuracy,
        outcome.model_path.display(),
        outcome.metrics_path.display()
    );
    Ok(())
}
