//! Application state management
//!
//! `ResourceManager` turns configuration documents into live instances. It
//! owns the model registry, keeps the lifecycle handle of every instance it
//! built, and publishes the capability side into the instance registry the
//! RPC dispatcher reads from.

use filament_core::{
    Api, ComponentConfig, Dependencies, InstanceRegistry, Model, ModelRegistry, Reconfigurable,
    ResourceError, ResourceName, Rgb,
};
use filament_rpc::RgbService;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::load_config;

/// What `apply` did with one component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    /// Built and registered under a new name
    Created,
    /// Same model, configuration swapped in place
    Reconfigured,
    /// Model changed; a new instance replaced and closed the old one
    Replaced,
    /// No longer configured; deregistered and closed
    Removed,
}

#[derive(Debug)]
pub struct Outcome {
    pub name: ResourceName,
    pub result: Result<Change, ResourceError>,
}

/// Inventory entry for a hosted resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceInfo {
    pub name: String,
    pub api: Api,
    pub model: Model,
}

struct Hosted {
    config: ComponentConfig,
    lifecycle: Arc<dyn Reconfigurable>,
}

pub struct ResourceManager {
    models: ModelRegistry<dyn Rgb>,
    instances: Arc<InstanceRegistry<dyn Rgb>>,
    hosted: Mutex<HashMap<ResourceName, Hosted>>,
}

impl ResourceManager {
    pub fn new(models: ModelRegistry<dyn Rgb>) -> Self {
        Self {
            models,
            instances: Arc::new(InstanceRegistry::new()),
            hosted: Mutex::new(HashMap::new()),
        }
    }

    /// Registry the dispatcher resolves names against
    pub fn instances(&self) -> Arc<InstanceRegistry<dyn Rgb>> {
        self.instances.clone()
    }

    pub fn models(&self) -> &ModelRegistry<dyn Rgb> {
        &self.models
    }

    /// Bring the hosted set in line with `configs`.
    ///
    /// Each component is handled on its own: a rejected config leaves that
    /// resource as it was and does not stop the rest from being applied.
    pub async fn apply(&self, configs: &[ComponentConfig]) -> Vec<Outcome> {
        let mut hosted = self.hosted.lock().await;
        let mut outcomes = Vec::with_capacity(configs.len());

        for config in configs {
            let name = config.resource_name();
            let result = self.apply_one(&mut hosted, config).await;
            match &result {
                Ok(change) => info!(
                    resource = %name,
                    model = %config.model,
                    change = ?change,
                    "Applied configuration"
                ),
                Err(e) => warn!(
                    resource = %name,
                    model = %config.model,
                    error = %e,
                    "Rejected configuration"
                ),
            }
            outcomes.push(Outcome { name, result });
        }

        let wanted: HashSet<ResourceName> =
            configs.iter().map(ComponentConfig::resource_name).collect();
        let stale: Vec<ResourceName> = hosted
            .keys()
            .filter(|name| !wanted.contains(*name))
            .cloned()
            .collect();
        for name in stale {
            self.teardown(&mut hosted, &name).await;
            outcomes.push(Outcome {
                name,
                result: Ok(Change::Removed),
            });
        }

        outcomes
    }

    async fn apply_one(
        &self,
        hosted: &mut HashMap<ResourceName, Hosted>,
        config: &ComponentConfig,
    ) -> Result<Change, ResourceError> {
        self.models.validate(config)?;
        let name = config.resource_name();
        let dependencies = Dependencies::new();

        if let Some(current) = hosted.get_mut(&name) {
            if current.config.model == config.model {
                current.lifecycle.reconfigure(config, &dependencies)?;
                current.config = config.clone();
                return Ok(Change::Reconfigured);
            }
        }

        let built = self.models.construct(config, &dependencies)?;
        self.instances
            .register_instance(name.clone(), built.resource)
            .await;
        let previous = hosted.insert(
            name,
            Hosted {
                config: config.clone(),
                lifecycle: built.lifecycle,
            },
        );

        match previous {
            Some(old) => {
                old.lifecycle.close();
                Ok(Change::Replaced)
            }
            None => Ok(Change::Created),
        }
    }

    async fn teardown(
        &self,
        hosted: &mut HashMap<ResourceName, Hosted>,
        name: &ResourceName,
    ) -> bool {
        self.instances.remove(name).await;
        match hosted.remove(name) {
            Some(old) => {
                old.lifecycle.close();
                info!(resource = %name, "Removed resource");
                true
            }
            None => false,
        }
    }

    /// Deregister and close one resource. Returns false if it was not hosted.
    pub async fn remove(&self, name: &ResourceName) -> bool {
        let mut hosted = self.hosted.lock().await;
        self.teardown(&mut hosted, name).await
    }

    /// Deregister and close everything, e.g. on shutdown
    pub async fn close_all(&self) {
        let mut hosted = self.hosted.lock().await;
        let names: Vec<ResourceName> = hosted.keys().cloned().collect();
        for name in &names {
            self.teardown(&mut hosted, name).await;
        }
        info!(count = names.len(), "Closed all resources");
    }

    /// Hosted resources, sorted by name
    pub async fn resources(&self) -> Vec<ResourceInfo> {
        let hosted = self.hosted.lock().await;
        let mut resources: Vec<ResourceInfo> = hosted
            .values()
            .map(|h| ResourceInfo {
                name: h.config.name.clone(),
                api: h.config.api.clone(),
                model: h.config.model.clone(),
            })
            .collect();
        resources.sort_by(|a, b| a.name.cmp(&b.name));
        resources
    }
}

/// Shared application state
pub struct AppState {
    pub manager: Arc<ResourceManager>,
    pub rgb: Arc<RgbService>,
    /// File the configuration was loaded from, re-read on reload
    pub config_path: PathBuf,
}

impl AppState {
    pub fn new(manager: Arc<ResourceManager>, config_path: PathBuf) -> Arc<Self> {
        let rgb = Arc::new(RgbService::new(manager.instances()));
        Arc::new(Self {
            manager,
            rgb,
            config_path,
        })
    }

    /// Re-read the configuration file and apply its components
    pub async fn reload(&self) -> anyhow::Result<Vec<Outcome>> {
        let config = load_config(&self.config_path)?;
        let outcomes = self.manager.apply(&config.components).await;
        let rejected = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(
            path = %self.config_path.display(),
            applied = outcomes.len() - rejected,
            rejected,
            "Reloaded configuration"
        );
        Ok(outcomes)
    }
}
