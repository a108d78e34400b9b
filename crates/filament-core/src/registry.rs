//! Model and instance registries
//!
//! The model registry maps (api, model) to a factory and a validator and is
//! filled once at startup. The instance registry maps resource names to live
//! instances and is what a dispatcher queries for every call. Both are
//! generic over the capability they hand out, e.g. `dyn Rgb`.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ComponentConfig;
use crate::error::ResourceError;
use crate::lifecycle::Reconfigurable;
use crate::resource::{Api, Model, ResourceName};

/// Other resources an instance was built against
pub type Dependencies = HashMap<ResourceName, Arc<dyn Any + Send + Sync>>;

/// Pure check of a candidate configuration
pub type Validator = Arc<dyn Fn(&ComponentConfig) -> Result<(), ResourceError> + Send + Sync>;

/// Builds and configures a new instance
pub type Factory<T> = Arc<
    dyn Fn(&ComponentConfig, &Dependencies) -> Result<Constructed<T>, ResourceError>
        + Send
        + Sync,
>;

/// A freshly built instance, viewed both as its capability and its lifecycle
pub struct Constructed<T: ?Sized> {
    pub resource: Arc<T>,
    pub lifecycle: Arc<dyn Reconfigurable>,
}

/// How to validate and build one model
pub struct Registration<T: ?Sized> {
    pub factory: Factory<T>,
    pub validator: Validator,
}

impl<T: ?Sized> Registration<T> {
    pub fn new<F, V>(factory: F, validator: V) -> Self
    where
        F: Fn(&ComponentConfig, &Dependencies) -> Result<Constructed<T>, ResourceError>
            + Send
            + Sync
            + 'static,
        V: Fn(&ComponentConfig) -> Result<(), ResourceError> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            validator: Arc::new(validator),
        }
    }
}

impl<T: ?Sized> Clone for Registration<T> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            validator: self.validator.clone(),
        }
    }
}

/// (api, model) -> registration
pub struct ModelRegistry<T: ?Sized> {
    models: HashMap<(Api, Model), Registration<T>>,
}

impl<T: ?Sized> Default for ModelRegistry<T> {
    fn default() -> Self {
        Self {
            models: HashMap::new(),
        }
    }
}

impl<T: ?Sized> ModelRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model. A second registration for the same key replaces the first.
    pub fn register(&mut self, api: Api, model: Model, registration: Registration<T>) {
        info!(api = %api, model = %model, "Registered model");
        if self
            .models
            .insert((api.clone(), model.clone()), registration)
            .is_some()
        {
            warn!(api = %api, model = %model, "Model registration replaced");
        }
    }

    pub fn lookup(&self, api: &Api, model: &Model) -> Result<&Registration<T>, ResourceError> {
        self.models
            .get(&(api.clone(), model.clone()))
            .ok_or_else(|| ResourceError::UnknownModel {
                api: api.clone(),
                model: model.clone(),
            })
    }

    /// Run the model's validator against `config` without building anything
    pub fn validate(&self, config: &ComponentConfig) -> Result<(), ResourceError> {
        let registration = self.lookup(&config.api, &config.model)?;
        (registration.validator)(config)
    }

    /// Validate `config`, then build a configured instance
    pub fn construct(
        &self,
        config: &ComponentConfig,
        dependencies: &Dependencies,
    ) -> Result<Constructed<T>, ResourceError> {
        let registration = self.lookup(&config.api, &config.model)?;
        (registration.validator)(config)?;
        let constructed = (registration.factory)(config, dependencies)?;
        debug!(resource = %config.resource_name(), model = %config.model, "Constructed instance");
        Ok(constructed)
    }

    pub fn models(&self) -> impl Iterator<Item = (&Api, &Model)> {
        self.models.keys().map(|(api, model)| (api, model))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// resource name -> live instance
pub struct InstanceRegistry<T: ?Sized> {
    instances: RwLock<HashMap<ResourceName, Arc<T>>>,
}

impl<T: ?Sized> Default for InstanceRegistry<T> {
    fn default() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: ?Sized> InstanceRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `instance`, returning any prior binding.
    ///
    /// Tearing down the returned instance is the caller's job.
    pub async fn register_instance(&self, name: ResourceName, instance: Arc<T>) -> Option<Arc<T>> {
        let previous = self.instances.write().await.insert(name.clone(), instance);
        if previous.is_some() {
            debug!(resource = %name, "Replaced instance binding");
        } else {
            debug!(resource = %name, "Registered instance");
        }
        previous
    }

    pub async fn lookup(&self, name: &ResourceName) -> Result<Arc<T>, ResourceError> {
        self.instances
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound { name: name.clone() })
    }

    pub async fn remove(&self, name: &ResourceName) -> Option<Arc<T>> {
        self.instances.write().await.remove(name)
    }

    pub async fn names(&self) -> Vec<ResourceName> {
        self.instances.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.instances.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.instances.read().await.is_empty()
    }
}
