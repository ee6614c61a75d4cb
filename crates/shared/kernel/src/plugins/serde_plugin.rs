use super::error::PluginError;
use super::intermediate::{IntermediateInstance, IntermediateModel};
use super::model::{DomainValue, ModelType};
use super::{ModelPlugin, Subject};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// Plugin for plain serde types, described by a hand-written [`IntermediateModel`].
pub struct SerdePlugin<T> {
    model: IntermediateModel,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdePlugin<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    #[must_use]
    pub const fn new(model: IntermediateModel) -> Self {
        Self { model, _marker: PhantomData }
    }

    fn ensure_model(model: &ModelType) -> Result<(), PluginError> {
        if model.is::<T>() { Ok(()) } else { Err(PluginError::unsupported(model.name())) }
    }
}

impl<T> fmt::Debug for SerdePlugin<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdePlugin").field("type", &type_name::<T>()).field("model", &self.model.name()).finish()
    }
}

impl<T> ModelPlugin for SerdePlugin<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.model.name()
    }

    fn supports(&self, subject: Subject<'_>) -> bool {
        subject.model_type().is::<T>()
    }

    fn to_intermediate_model(&self, model: &ModelType) -> Result<IntermediateModel, PluginError> {
        Self::ensure_model(model)?;
        Ok(self.model.clone())
    }

    fn from_intermediate_instance(
        &self,
        model: &ModelType,
        instance: IntermediateInstance,
    ) -> Result<DomainValue, PluginError> {
        self.from_dict(model, instance.into_fields())
    }

    fn to_dict(&self, value: &DomainValue) -> Result<Map<String, Value>, PluginError> {
        let typed = value.downcast_ref::<T>().ok_or_else(|| PluginError::unsupported(value.model_type().name()))?;

        match serde_json::to_value(typed)? {
            Value::Object(fields) => Ok(fields),
            other => Err(PluginError::Conversion {
                message: format!("{} serialized to {other} instead of an object", type_name::<T>()).into(),
                context: None,
            }),
        }
    }

    fn from_dict(&self, model: &ModelType, fields: Map<String, Value>) -> Result<DomainValue, PluginError> {
        Self::ensure_model(model)?;
        let value: T = serde_json::from_value(Value::Object(fields))?;
        Ok(DomainValue::serializable(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::intermediate::{FieldKind, FieldSpec};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Book {
        title: String,
        pages: u32,
    }

    fn plugin() -> SerdePlugin<Book> {
        SerdePlugin::new(
            IntermediateModel::new("Book")
                .field(FieldSpec::required("title", FieldKind::String))
                .field(FieldSpec::required("pages", FieldKind::Integer)),
        )
    }

    #[test]
    fn converts_through_plain_dicts() {
        let plugin = plugin();
        let value = DomainValue::new(Book { title: "Dune".into(), pages: 412 });

        let dict = plugin.to_dict(&value).expect("to dict");
        assert_eq!(Value::Object(dict.clone()), json!({ "title": "Dune", "pages": 412 }));

        let rebuilt = plugin.from_dict(&ModelType::of::<Book>(), dict).expect("from dict");
        assert_eq!(rebuilt.downcast::<Book>().expect("a book"), Book { title: "Dune".into(), pages: 412 });
    }

    #[test]
    fn intermediate_instance_is_validated() {
        let instance = plugin().to_intermediate_instance(&DomainValue::new(Book { title: "x".into(), pages: 1 }));
        assert_eq!(instance.expect("valid").get("pages"), Some(&json!(1)));
    }

    #[test]
    fn rejects_foreign_types() {
        let plugin = plugin();
        assert!(!plugin.supports(Subject::Type(&ModelType::of::<String>())));
        assert!(matches!(
            plugin.to_intermediate_model(&ModelType::of::<String>()),
            Err(PluginError::Unsupported { .. })
        ));
    }
}
