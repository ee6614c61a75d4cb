use serde_json::{Map, Value};
use std::fmt;
use utoipa::openapi::RefOr;
use utoipa::openapi::schema::{ArrayBuilder, ObjectBuilder, Schema, SchemaType, Type};

/// Value kinds understood by the validating intermediate representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<FieldKind>),
    Object,
    Any,
}

impl FieldKind {
    #[must_use]
    pub fn array_of(item: Self) -> Self {
        Self::Array(Box::new(item))
    }

    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _)
            | (Self::String, Value::String(_))
            | (Self::Number, Value::Number(_))
            | (Self::Boolean, Value::Bool(_))
            | (Self::Object, Value::Object(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Array(item), Value::Array(items)) => items.iter().all(|v| item.accepts(v)),
            _ => false,
        }
    }

    #[must_use]
    pub fn schema(&self) -> RefOr<Schema> {
        let object = |ty: SchemaType| RefOr::T(Schema::Object(ObjectBuilder::new().schema_type(ty).build()));
        match self {
            Self::String => object(Type::String.into()),
            Self::Integer => object(Type::Integer.into()),
            Self::Number => object(Type::Number.into()),
            Self::Boolean => object(Type::Boolean.into()),
            Self::Object => object(Type::Object.into()),
            Self::Any => object(SchemaType::AnyValue),
            Self::Array(item) => RefOr::T(Schema::Array(ArrayBuilder::new().items(item.schema()).build())),
        }
    }

    #[must_use]
    pub fn example(&self) -> Value {
        match self {
            Self::String => Value::from("string"),
            Self::Integer => Value::from(0),
            Self::Number => Value::from(0.0),
            Self::Boolean => Value::Bool(true),
            Self::Array(item) => Value::Array(vec![item.example()]),
            Self::Object => Value::Object(Map::new()),
            Self::Any => Value::Null,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Number => f.write_str("number"),
            Self::Boolean => f.write_str("boolean"),
            Self::Array(item) => write!(f, "array of {item}"),
            Self::Object => f.write_str("object"),
            Self::Any => f.write_str("any"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub description: Option<String>,
    pub example: Option<Value>,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind, required: true, description: None, example: None }
    }

    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { required: false, ..Self::required(name, kind) }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }
}

/// Introspectable, validating stand-in for a domain type.
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateModel {
    name: String,
    fields: Vec<FieldSpec>,
}

impl IntermediateModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validates a JSON document, which must be an object.
    ///
    /// # Errors
    /// See [`IntermediateModel::validate_map`]; non-objects fail as a whole.
    pub fn validate(&self, value: Value) -> Result<IntermediateInstance, ValidationError> {
        match value {
            Value::Object(map) => self.validate_map(map),
            other => Err(ValidationError::new(&self.name, vec![FieldError {
                field: String::new(),
                message: format!("expected an object, got {}", json_kind(&other)),
            }])),
        }
    }

    /// Checks every declared field, collecting all failures before giving up.
    /// Unknown fields are dropped and absent optional fields are set to `null`.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] listing each missing or mistyped field.
    pub fn validate_map(&self, mut input: Map<String, Value>) -> Result<IntermediateInstance, ValidationError> {
        let mut fields = Map::new();
        let mut errors = Vec::new();

        for spec in &self.fields {
            match input.remove(&spec.name) {
                None | Some(Value::Null) if spec.required => errors.push(FieldError {
                    field: spec.name.clone(),
                    message: "field required".to_owned(),
                }),
                None | Some(Value::Null) => {
                    fields.insert(spec.name.clone(), Value::Null);
                }
                Some(value) if spec.kind.accepts(&value) => {
                    fields.insert(spec.name.clone(), value);
                }
                Some(value) => errors.push(FieldError {
                    field: spec.name.clone(),
                    message: format!("expected {}, got {}", spec.kind, json_kind(&value)),
                }),
            }
        }

        if errors.is_empty() {
            Ok(IntermediateInstance { model: self.name.clone(), fields })
        } else {
            Err(ValidationError::new(&self.name, errors))
        }
    }

    /// Object schema with one property per field.
    #[must_use]
    pub fn schema(&self) -> Schema {
        self.schema_with_example(false)
    }

    #[must_use]
    pub fn schema_with_example(&self, with_example: bool) -> Schema {
        let mut builder = ObjectBuilder::new().schema_type(Type::Object).title(Some(self.name.clone()));

        for spec in &self.fields {
            let property = match (spec.kind.schema(), &spec.description) {
                (RefOr::T(Schema::Object(mut object)), Some(description)) => {
                    object.description = Some(description.clone());
                    RefOr::T(Schema::Object(object))
                }
                (schema, _) => schema,
            };
            builder = builder.property(&spec.name, property);
            if spec.required {
                builder = builder.required(&spec.name);
            }
        }

        if with_example {
            builder = builder.examples([self.example()]);
        }

        Schema::Object(builder.build())
    }

    /// Synthesizes an example document from field examples, falling back to a
    /// placeholder per kind.
    #[must_use]
    pub fn example(&self) -> Value {
        self.fields
            .iter()
            .map(|spec| (spec.name.clone(), spec.example.clone().unwrap_or_else(|| spec.kind.example())))
            .collect::<Map<_, _>>()
            .into()
    }
}

/// A validated instance of an [`IntermediateModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateInstance {
    model: String,
    fields: Map<String, Value>,
}

impl IntermediateInstance {
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Empty when the document itself is rejected.
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() { f.write_str(&self.message) } else { write!(f, "{}: {}", self.field, self.message) }
    }
}

/// Every field failure found while validating one document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} validation error(s) for {model}: {}", .errors.len(), join(.errors))]
pub struct ValidationError {
    pub model: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    fn new(model: &str, errors: Vec<FieldError>) -> Self {
        Self { model: model.to_owned(), errors }
    }
}

fn join(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> IntermediateModel {
        IntermediateModel::new("Person")
            .field(FieldSpec::required("name", FieldKind::String).example("Ada"))
            .field(FieldSpec::required("age", FieldKind::Integer))
            .field(FieldSpec::optional("tags", FieldKind::array_of(FieldKind::String)))
    }

    #[test]
    fn validate_fills_optional_and_drops_unknown_fields() {
        let instance = person().validate(json!({ "name": "Ada", "age": 36, "extra": true })).expect("valid");

        assert_eq!(instance.model_name(), "Person");
        assert_eq!(instance.get("tags"), Some(&Value::Null));
        assert!(instance.get("extra").is_none());
    }

    #[test]
    fn validate_collects_every_field_error() {
        let err = person().validate(json!({ "age": 1.5, "tags": ["a", 1] })).expect_err("invalid");

        let fields: Vec<_> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["name", "age", "tags"]);
        assert!(err.to_string().starts_with("3 validation error(s) for Person"));
    }

    #[test]
    fn validate_rejects_non_objects() {
        let err = person().validate(json!([1, 2])).expect_err("not an object");
        assert_eq!(err.errors[0].message, "expected an object, got array");
    }

    #[test]
    fn example_prefers_field_examples() {
        assert_eq!(person().example(), json!({ "name": "Ada", "age": 0, "tags": ["string"] }));
    }

    #[test]
    fn schema_lists_required_fields() {
        let Schema::Object(object) = person().schema() else { panic!("object schema expected") };

        assert_eq!(object.required, ["name", "age"]);
        assert_eq!(object.properties.len(), 3);
    }
}
