//! Plugin protocol bridging domain models and the validating intermediate representation.
//!
//! A [`ModelPlugin`] claims a set of domain types and converts them both ways.
//! Plugins are registered once in a [`PluginRegistry`] and consulted in
//! registration order; the first plugin whose [`ModelPlugin::supports`] returns
//! `true` wins.
//!
//! ```rust
//! use spire_kernel::plugins::{
//!     Candidate, FieldKind, FieldSpec, IntermediateModel, ModelType, PluginRegistry, SerdePlugin,
//! };
//!
//! #[derive(serde::Serialize, serde::Deserialize)]
//! struct Tag {
//!     label: String,
//! }
//!
//! let registry = PluginRegistry::builder()
//!     .register(SerdePlugin::<Tag>::new(
//!         IntermediateModel::new("Tag").field(FieldSpec::required("label", FieldKind::String)),
//!     ))
//!     .build();
//!
//! let ty = ModelType::sequence_of::<Tag>();
//! assert_eq!(registry.resolve(Candidate::Type(&ty)).map(|p| p.name()), Some("Tag"));
//! assert!(registry.resolve(Candidate::Sequence(&[])).is_none());
//! ```

mod error;
mod intermediate;
mod mapping;
mod model;
mod serde_plugin;

pub use error::{PluginError, PluginErrorExt};
pub use intermediate::{FieldError, FieldKind, FieldSpec, IntermediateInstance, IntermediateModel, ValidationError};
pub use mapping::PluginMapping;
pub use model::{DomainValue, ModelType, OneOrMany};
pub use serde_plugin::SerdePlugin;

use serde_json::{Map, Value};
use std::any::type_name;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::trace;

/// What a plugin is asked about: a concrete value or a bare type.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Instance(&'a DomainValue),
    Type(&'a ModelType),
}

impl Subject<'_> {
    #[must_use]
    pub const fn model_type(&self) -> &ModelType {
        match self {
            Self::Instance(value) => value.model_type(),
            Self::Type(model) => model,
        }
    }
}

/// Input to plugin resolution before unwrapping.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    Value(&'a DomainValue),
    /// Assumed homogeneous; only the first element is inspected.
    Sequence(&'a [DomainValue]),
    Type(&'a ModelType),
}

impl<'a> Candidate<'a> {
    /// Picks the subject a plugin is asked about: the first element of a sequence,
    /// or the first type parameter of a parameterized type.
    #[must_use]
    pub fn representative(self) -> Option<Subject<'a>> {
        match self {
            Self::Value(value) => Some(Subject::Instance(value)),
            Self::Sequence(values) => values.first().map(Subject::Instance),
            Self::Type(model) => Some(Subject::Type(model.first_param().unwrap_or(model))),
        }
    }
}

/// Bidirectional converter between a family of domain types and the intermediate model.
///
/// Round-trip fidelity (`from_dict(to_dict(x)) == x`) is part of the plugin's contract;
/// the registry does not check it.
pub trait ModelPlugin: Debug + Send + Sync {
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Pure type-membership test.
    fn supports(&self, subject: Subject<'_>) -> bool;

    /// # Errors
    /// Returns [`PluginError::Unsupported`] for types outside the plugin's family.
    fn to_intermediate_model(&self, model: &ModelType) -> Result<IntermediateModel, PluginError>;

    /// # Errors
    /// Returns an error when the instance cannot be turned into the domain type.
    fn from_intermediate_instance(
        &self,
        model: &ModelType,
        instance: IntermediateInstance,
    ) -> Result<DomainValue, PluginError>;

    /// # Errors
    /// Returns an error when the value is not one of the plugin's types.
    fn to_dict(&self, value: &DomainValue) -> Result<Map<String, Value>, PluginError>;

    /// # Errors
    /// Returns an error when `fields` cannot build the domain type.
    fn from_dict(&self, model: &ModelType, fields: Map<String, Value>) -> Result<DomainValue, PluginError>;

    /// Validates `to_dict(value)` against the intermediate model of the value's type.
    ///
    /// # Errors
    /// Propagates conversion and validation failures.
    fn to_intermediate_instance(&self, value: &DomainValue) -> Result<IntermediateInstance, PluginError> {
        let model = self.to_intermediate_model(value.model_type())?;
        Ok(model.validate_map(self.to_dict(value)?)?)
    }
}

/// Returns the first plugin, in registration order, that supports the candidate.
///
/// `None` for an empty registry, an empty sequence, or when nothing matches.
#[must_use]
pub fn resolve<'p>(candidate: Candidate<'_>, plugins: &'p [Arc<dyn ModelPlugin>]) -> Option<&'p Arc<dyn ModelPlugin>> {
    if plugins.is_empty() {
        return None;
    }
    let subject = candidate.representative()?;
    let found = plugins.iter().find(|plugin| plugin.supports(subject));
    trace!(model = ?subject.model_type(), plugin = found.map(|p| p.name()), "Plugin resolution");
    found
}

/// Ordered, immutable set of plugins shared by every request.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Arc<[Arc<dyn ModelPlugin>]>,
}

impl PluginRegistry {
    #[must_use]
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::default()
    }

    #[must_use]
    pub fn plugins(&self) -> &[Arc<dyn ModelPlugin>] {
        &self.plugins
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    #[must_use]
    pub fn resolve(&self, candidate: Candidate<'_>) -> Option<&Arc<dyn ModelPlugin>> {
        resolve(candidate, &self.plugins)
    }

    /// Resolves the plugin for a (possibly parameterized) type and pairs it with
    /// the representative type.
    #[must_use]
    pub fn mapping_for(&self, model: &ModelType) -> Option<PluginMapping> {
        let representative = model.first_param().unwrap_or(model);
        self.resolve(Candidate::Type(model)).map(|plugin| PluginMapping::new(Arc::clone(plugin), representative.clone()))
    }

    /// Validates a JSON object (or array of objects) and rebuilds domain values of `model`.
    ///
    /// # Errors
    /// [`PluginError::Unsupported`] when no plugin claims the type, otherwise any
    /// validation or conversion failure.
    pub fn decode(&self, model: &ModelType, payload: Value) -> Result<OneOrMany<DomainValue>, PluginError> {
        let mapping = self.mapping_for(model).ok_or_else(|| PluginError::unsupported(model.name()))?;
        let intermediate = mapping.plugin().to_intermediate_model(mapping.model())?;

        let instances = match payload {
            Value::Array(items) => OneOrMany::Many(items),
            item => OneOrMany::One(item),
        }
        .try_map(|item| intermediate.validate(item))?;

        mapping.value_to_domain(instances)
    }
}

#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct PluginRegistryBuilder {
    plugins: Vec<Arc<dyn ModelPlugin>>,
}

impl PluginRegistryBuilder {
    pub fn register(mut self, plugin: impl ModelPlugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn register_shared(mut self, plugin: Arc<dyn ModelPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn build(self) -> PluginRegistry {
        PluginRegistry { plugins: self.plugins.into() }
    }
}
