//! Shared server state

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::classifier::IrisClassifier;
use crate::config::Config;

/// Install-once holder for the serving model.
///
/// Written at most once (at startup), then only read; handlers clone the `Arc`.
#[derive(Debug, Default)]
pub struct ModelSlot {
    model: OnceCell<Arc<IrisClassifier>>,
}

impl ModelSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_model(model: IrisClassifier) -> Self {
        let slot = Self::empty();
        // A fresh cell cannot already be set
        let _ = slot.install(model);
        slot
    }

    /// Try to load the artifact at `path`. Failures are logged and leave the slot empty.
    pub fn load_from(path: &Path) -> Self {
        let slot = Self::empty();

        tracing::info!("Loading model from {}...", path.display());
        if !path.exists() {
            tracing::error!("Model file not found at {}", path.display());
            tracing::error!("Train the model first with: iris-train");
            return slot;
        }

        match IrisClassifier::load(path) {
            Ok(model) => {
                tracing::info!("Model loaded ({} trees)", model.n_trees());
                let _ = slot.install(model);
            }
            Err(e) => tracing::error!("Failed to load model: {}", e),
        }
        slot
    }

    /// Install the model. Returns it back if a model was already installed.
    pub fn install(&self, model: IrisClassifier) -> Result<(), IrisClassifier> {
        self.model
            .set(Arc::new(model))
            .map_err(|rejected| Arc::try_unwrap(rejected).unwrap_or_else(|arc| (*arc).clone()))
    }

    pub fn get(&self) -> Option<Arc<IrisClassifier>> {
        self.model.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelSlot>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(model: ModelSlot, config: Config) -> Self {
        Self {
            model: Arc::new(model),
            config: Arc::new(config),
        }
    }
}
