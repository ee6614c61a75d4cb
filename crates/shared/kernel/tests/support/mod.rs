#![allow(dead_code, unreachable_pub)]

use serde_json::{Map, Value, json};
use spire_kernel::plugins::{
    DomainValue, FieldKind, FieldSpec, IntermediateInstance, IntermediateModel, ModelPlugin, ModelType, PluginError,
    Subject,
};

/// A domain type with no serde support, converted by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
}

impl Person {
    pub fn new(first_name: &str, last_name: &str, age: u32) -> Self {
        Self { first_name: first_name.to_owned(), last_name: last_name.to_owned(), age }
    }
}

#[derive(Debug, Default)]
pub struct PersonPlugin;

impl ModelPlugin for PersonPlugin {
    fn name(&self) -> &str {
        "person"
    }

    fn supports(&self, subject: Subject<'_>) -> bool {
        subject.model_type().is::<Person>()
    }

    fn to_intermediate_model(&self, model: &ModelType) -> Result<IntermediateModel, PluginError> {
        if !model.is::<Person>() {
            return Err(PluginError::Unsupported { type_name: model.name().into(), context: None });
        }
        Ok(IntermediateModel::new("Person")
            .field(FieldSpec::required("first_name", FieldKind::String))
            .field(FieldSpec::required("last_name", FieldKind::String))
            .field(FieldSpec::required("age", FieldKind::Integer)))
    }

    fn from_intermediate_instance(
        &self,
        model: &ModelType,
        instance: IntermediateInstance,
    ) -> Result<DomainValue, PluginError> {
        self.from_dict(model, instance.into_fields())
    }

    fn to_dict(&self, value: &DomainValue) -> Result<Map<String, Value>, PluginError> {
        let person = value
            .downcast_ref::<Person>()
            .ok_or_else(|| PluginError::Unsupported { type_name: value.model_type().name().into(), context: None })?;

        let Value::Object(fields) =
            json!({ "first_name": person.first_name, "last_name": person.last_name, "age": person.age })
        else {
            unreachable!("json! object literal");
        };
        Ok(fields)
    }

    fn from_dict(&self, _model: &ModelType, fields: Map<String, Value>) -> Result<DomainValue, PluginError> {
        let text = |key: &str| {
            fields.get(key).and_then(Value::as_str).map(ToOwned::to_owned).ok_or_else(|| PluginError::Conversion {
                message: format!("missing {key}").into(),
                context: None,
            })
        };
        let age = fields
            .get("age")
            .and_then(Value::as_u64)
            .and_then(|age| u32::try_from(age).ok())
            .ok_or_else(|| PluginError::Conversion { message: "invalid age".into(), context: None })?;

        Ok(DomainValue::new(Person { first_name: text("first_name")?, last_name: text("last_name")?, age }))
    }
}

/// Claims nothing; used to check registration order.
#[derive(Debug, Default)]
pub struct NeverPlugin;

impl ModelPlugin for NeverPlugin {
    fn supports(&self, _subject: Subject<'_>) -> bool {
        false
    }

    fn to_intermediate_model(&self, model: &ModelType) -> Result<IntermediateModel, PluginError> {
        Err(PluginError::Unsupported { type_name: model.name().into(), context: None })
    }

    fn from_intermediate_instance(
        &self,
        model: &ModelType,
        _instance: IntermediateInstance,
    ) -> Result<DomainValue, PluginError> {
        Err(PluginError::Unsupported { type_name: model.name().into(), context: None })
    }

    fn to_dict(&self, value: &DomainValue) -> Result<Map<String, Value>, PluginError> {
        Err(PluginError::Unsupported { type_name: value.model_type().name().into(), context: None })
    }

    fn from_dict(&self, model: &ModelType, _fields: Map<String, Value>) -> Result<DomainValue, PluginError> {
        Err(PluginError::Unsupported { type_name: model.name().into(), context: None })
    }
}
