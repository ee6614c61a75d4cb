use serde_json::{Map, Value, json};
use spire::plugins::{
    DomainValue, FieldKind, FieldSpec, IntermediateInstance, IntermediateModel, ModelPlugin, ModelType, PluginError,
    Subject,
};
use std::sync::{Arc, PoisonError, RwLock};

/// A person in the demo directory. Deliberately not serde-enabled; it crosses
/// the wire only through [`PersonPlugin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
}

impl Person {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Hand-written converter between [`Person`] and its intermediate model.
#[derive(Debug, Default, Clone, Copy)]
pub struct PersonPlugin;

impl PersonPlugin {
    /// `id` is optional so the same model validates creation payloads.
    #[must_use]
    pub fn model() -> IntermediateModel {
        IntermediateModel::new("Person")
            .field(FieldSpec::optional("id", FieldKind::Integer).description("Assigned by the server").example(1))
            .field(FieldSpec::required("first_name", FieldKind::String).example("Ada"))
            .field(FieldSpec::required("last_name", FieldKind::String).example("Lovelace"))
            .field(FieldSpec::required("age", FieldKind::Integer).example(36))
    }

    fn person<'a>(&self, value: &'a DomainValue) -> Result<&'a Person, PluginError> {
        value.downcast_ref::<Person>().ok_or_else(|| PluginError::Unsupported {
            type_name: value.model_type().name().into(),
            context: Some("PersonPlugin".into()),
        })
    }
}

impl ModelPlugin for PersonPlugin {
    fn name(&self) -> &str {
        "person"
    }

    fn supports(&self, subject: Subject<'_>) -> bool {
        subject.model_type().is::<Person>()
    }

    fn to_intermediate_model(&self, model: &ModelType) -> Result<IntermediateModel, PluginError> {
        if model.is::<Person>() {
            Ok(Self::model())
        } else {
            Err(PluginError::Unsupported { type_name: model.name().into(), context: Some("PersonPlugin".into()) })
        }
    }

    fn from_intermediate_instance(
        &self,
        model: &ModelType,
        instance: IntermediateInstance,
    ) -> Result<DomainValue, PluginError> {
        self.from_dict(model, instance.into_fields())
    }

    fn to_dict(&self, value: &DomainValue) -> Result<Map<String, Value>, PluginError> {
        let person = self.person(value)?;
        let mut fields = Map::new();
        fields.insert("id".to_owned(), json!(person.id));
        fields.insert("first_name".to_owned(), json!(person.first_name));
        fields.insert("last_name".to_owned(), json!(person.last_name));
        fields.insert("age".to_owned(), json!(person.age));
        Ok(fields)
    }

    fn from_dict(&self, _model: &ModelType, fields: Map<String, Value>) -> Result<DomainValue, PluginError> {
        let text = |key: &str| {
            fields.get(key).and_then(Value::as_str).map(str::to_owned).ok_or_else(|| conversion(format!("{key} must be a string")))
        };
        let number = |key: &str| fields.get(key).and_then(Value::as_u64).map(u32::try_from);

        let id = match number("id") {
            Some(id) => id.map_err(|_| conversion("id is out of range"))?,
            None => 0,
        };
        let age = number("age")
            .ok_or_else(|| conversion("age must be a non-negative integer"))?
            .map_err(|_| conversion("age is out of range"))?;

        Ok(DomainValue::new(Person { id, first_name: text("first_name")?, last_name: text("last_name")?, age }))
    }
}

fn conversion(message: impl Into<std::borrow::Cow<'static, str>>) -> PluginError {
    PluginError::Conversion { message: message.into(), context: Some("PersonPlugin".into()) }
}

/// In-memory directory shared by the demo handlers.
#[derive(Debug, Clone, Default)]
pub struct PeopleStore {
    people: Arc<RwLock<Vec<Person>>>,
}

impl PeopleStore {
    /// A store holding a few well-known people.
    #[must_use]
    pub fn seeded() -> Self {
        let store = Self::default();
        for (first_name, last_name, age) in [("Ada", "Lovelace", 36), ("Alan", "Turing", 41), ("Grace", "Hopper", 85)] {
            store.insert(Person { id: 0, first_name: first_name.to_owned(), last_name: last_name.to_owned(), age });
        }
        store
    }

    #[must_use]
    pub fn all(&self) -> Vec<Person> {
        self.people.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<Person> {
        self.people.read().unwrap_or_else(PoisonError::into_inner).iter().find(|p| p.id == id).cloned()
    }

    /// Stores `person` under the next free id, ignoring any id it carries.
    pub fn insert(&self, mut person: Person) -> Person {
        let mut people = self.people.write().unwrap_or_else(PoisonError::into_inner);
        person.id = people.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        people.push(person.clone());
        person
    }

    pub fn remove(&self, id: u32) -> Option<Person> {
        let mut people = self.people.write().unwrap_or_else(PoisonError::into_inner);
        let index = people.iter().position(|p| p.id == id)?;
        Some(people.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Person {
        Person { id: 7, first_name: "Ada".to_owned(), last_name: "Lovelace".to_owned(), age: 36 }
    }

    #[test]
    fn plugin_round_trips_people() {
        let plugin = PersonPlugin;
        let fields = plugin.to_dict(&DomainValue::new(ada())).expect("dict");
        let rebuilt = plugin.from_dict(&ModelType::of::<Person>(), fields).expect("person");

        assert_eq!(rebuilt.downcast::<Person>().expect("person"), ada());
    }

    #[test]
    fn plugin_rejects_other_types() {
        let plugin = PersonPlugin;
        assert!(!plugin.supports(Subject::Type(&ModelType::of::<String>())));
        assert!(plugin.to_dict(&DomainValue::new("ada")).is_err());
        assert!(plugin.to_intermediate_model(&ModelType::of::<u32>()).is_err());
    }

    #[test]
    fn store_assigns_increasing_ids() {
        let store = PeopleStore::seeded();
        let created = store.insert(ada());

        assert_eq!(created.id, 4);
        assert_eq!(store.get(4).map(|p| p.full_name()).as_deref(), Some("Ada Lovelace"));
        assert_eq!(store.remove(4), Some(created));
        assert!(store.get(4).is_none());
    }
}
