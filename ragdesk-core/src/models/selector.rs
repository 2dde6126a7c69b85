use crate::api::Backend;
use crate::lock;
use crate::preferences::Preferences;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// One selectable entry of the model menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOption {
    pub value: String,
    pub label: String,
}

impl ModelOption {
    fn installed(name: &str) -> Self {
        Self {
            value: name.to_string(),
            label: name.to_string(),
        }
    }

    fn annotated(name: &str, note: &str) -> Self {
        Self {
            value: name.to_string(),
            label: format!("{name} ({note})"),
        }
    }
}

/// The model menu: what is offered and what is selected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelMenu {
    pub options: Vec<ModelOption>,
    pub selected: String,
}

impl ModelMenu {
    pub fn contains(&self, model: &str) -> bool {
        self.options.iter().any(|o| o.value == model)
    }
}

/// Resolves which model chat requests use.
///
/// The preferred model is the stored preference, else the configured default.
/// It is always selectable, even when the server does not list it.
pub struct ModelSelector {
    backend: Arc<dyn Backend>,
    prefs: Preferences,
    default_model: String,
    menu: RwLock<ModelMenu>,
}

impl ModelSelector {
    pub fn new(backend: Arc<dyn Backend>, prefs: Preferences, default_model: impl Into<String>) -> Self {
        Self {
            backend,
            prefs,
            default_model: default_model.into(),
            menu: RwLock::new(ModelMenu::default()),
        }
    }

    /// The stored preference, else the configured default.
    pub fn preferred(&self) -> String {
        self.prefs
            .model()
            .unwrap_or_else(|| self.default_model.clone())
    }

    /// Fetches installed models and rebuilds the menu. Never fails.
    ///
    /// - empty list: a single "not installed yet" entry for the preferred model
    /// - preferred model missing from the list: listed models plus a "default" entry
    /// - unreachable endpoint: a single "endpoint unavailable" entry for the
    ///   configured default
    pub async fn load_models(&self) -> ModelMenu {
        let menu = match self.backend.list_models().await {
            Ok(list) => {
                let preferred = self.preferred();
                let mut options: Vec<ModelOption> = list
                    .models
                    .iter()
                    .map(|m| m.trim())
                    .filter(|m| !m.is_empty())
                    .map(ModelOption::installed)
                    .collect();

                if options.is_empty() {
                    options.push(ModelOption::annotated(&preferred, "not installed yet"));
                } else if !options.iter().any(|o| o.value == preferred) {
                    options.push(ModelOption::annotated(&preferred, "default"));
                }

                info!(count = list.models.len(), selected = %preferred, "Models loaded");
                ModelMenu {
                    options,
                    selected: preferred,
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to load models");
                ModelMenu {
                    options: vec![ModelOption::annotated(
                        &self.default_model,
                        "endpoint unavailable",
                    )],
                    selected: self.default_model.clone(),
                }
            }
        };

        *lock::write(&self.menu) = menu.clone();
        menu
    }

    /// User picked a model from the menu; persisted immediately.
    ///
    /// Returns `false` and changes nothing when the model is not on offer.
    pub fn select(&self, model: &str) -> bool {
        let mut menu = lock::write(&self.menu);
        if !menu.contains(model) {
            return false;
        }
        menu.selected = model.to_string();
        drop(menu);

        self.prefs.set_model(model);
        true
    }

    /// Model for the next request: the current selection, else the configured default.
    pub fn current(&self) -> String {
        let selected = lock::read(&self.menu).selected.clone();
        if selected.trim().is_empty() {
            self.default_model.clone()
        } else {
            selected
        }
    }

    pub fn menu(&self) -> ModelMenu {
        lock::read(&self.menu).clone()
    }
}
