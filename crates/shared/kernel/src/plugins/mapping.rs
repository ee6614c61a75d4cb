use super::ModelPlugin;
use super::error::PluginError;
use super::intermediate::IntermediateInstance;
use super::model::{DomainValue, ModelType, OneOrMany};
use std::sync::Arc;

/// The plugin chosen for a domain type, kept to rebuild domain values from
/// validated instances.
#[derive(Debug, Clone)]
pub struct PluginMapping {
    plugin: Arc<dyn ModelPlugin>,
    model: ModelType,
}

impl PluginMapping {
    #[must_use]
    pub const fn new(plugin: Arc<dyn ModelPlugin>, model: ModelType) -> Self {
        Self { plugin, model }
    }

    #[must_use]
    pub fn plugin(&self) -> &dyn ModelPlugin {
        self.plugin.as_ref()
    }

    #[must_use]
    pub const fn model(&self) -> &ModelType {
        &self.model
    }

    /// Converts validated instances back into domain values of the mapped type.
    /// Sequences keep their order.
    ///
    /// # Errors
    /// Propagates the first conversion error reported by the plugin.
    pub fn value_to_domain(
        &self,
        converted: OneOrMany<IntermediateInstance>,
    ) -> Result<OneOrMany<DomainValue>, PluginError> {
        converted.try_map(|instance| self.plugin.from_intermediate_instance(&self.model, instance))
    }
}
