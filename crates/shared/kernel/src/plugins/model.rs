use serde::Serialize;
use serde_json::Value;
use std::any::{Any, TypeId, type_name};
use std::fmt;

/// Runtime descriptor of a domain type.
///
/// `params` stands in for the type arguments of a parameterized annotation, so a
/// `Vec<Person>` return type is described as `generic::<Vec<Person>>([of::<Person>()])`.
#[derive(Clone)]
pub struct ModelType {
    id: TypeId,
    name: &'static str,
    params: Vec<ModelType>,
}

impl ModelType {
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self { id: TypeId::of::<T>(), name: type_name::<T>(), params: Vec::new() }
    }

    #[must_use]
    pub fn generic<T: Any>(params: impl IntoIterator<Item = Self>) -> Self {
        Self { params: params.into_iter().collect(), ..Self::of::<T>() }
    }

    /// Shorthand for `generic::<Vec<T>>([of::<T>()])`.
    #[must_use]
    pub fn sequence_of<T: Any>() -> Self {
        Self::generic::<Vec<T>>([Self::of::<T>()])
    }

    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn params(&self) -> &[Self] {
        &self.params
    }

    #[must_use]
    pub fn first_param(&self) -> Option<&Self> {
        self.params.first()
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.params == other.params
    }
}

impl Eq for ModelType {}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        if !self.params.is_empty() {
            f.debug_list().entries(&self.params).finish()?;
        }
        Ok(())
    }
}

type SerializeFn = fn(&(dyn Any + Send + Sync)) -> Result<Value, serde_json::Error>;

/// A type-erased domain instance that remembers its [`ModelType`].
///
/// Values built with [`DomainValue::serializable`] also carry a serde fallback used
/// when no plugin claims them.
pub struct DomainValue {
    value: Box<dyn Any + Send + Sync>,
    model: ModelType,
    serialize: Option<SerializeFn>,
}

impl DomainValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self { value: Box::new(value), model: ModelType::of::<T>(), serialize: None }
    }

    pub fn serializable<T>(value: T) -> Self
    where
        T: Any + Send + Sync + Serialize,
    {
        Self { serialize: Some(serialize_erased::<T>), ..Self::new(value) }
    }

    #[must_use]
    pub const fn model_type(&self) -> &ModelType {
        &self.model
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Unwraps the concrete value, handing `self` back on a type mismatch.
    ///
    /// # Errors
    /// Returns the original value if it does not hold a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let Self { value, model, serialize } = self;
        value.downcast::<T>().map(|boxed| *boxed).map_err(|value| Self { value, model, serialize })
    }

    /// Serializes through the serde fallback, if the value was built with one.
    #[must_use]
    pub fn to_json(&self) -> Option<Result<Value, serde_json::Error>> {
        self.serialize.map(|serialize| serialize(self.value.as_ref()))
    }
}

impl fmt::Debug for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainValue")
            .field("model", &self.model)
            .field("serializable", &self.serialize.is_some())
            .finish_non_exhaustive()
    }
}

fn serialize_erased<T>(value: &(dyn Any + Send + Sync)) -> Result<Value, serde_json::Error>
where
    T: Any + Serialize,
{
    value.downcast_ref::<T>().map_or_else(
        || Err(<serde_json::Error as serde::ser::Error>::custom("domain value changed type")),
        serde_json::to_value,
    )
}

/// A single item or an ordered collection of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    #[must_use]
    pub const fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> OneOrMany<U> {
        match self {
            Self::One(item) => OneOrMany::One(f(item)),
            Self::Many(items) => OneOrMany::Many(items.into_iter().map(f).collect()),
        }
    }

    /// Applies `f` to every item, stopping at the first error.
    ///
    /// # Errors
    /// Returns the first error produced by `f`.
    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<OneOrMany<U>, E> {
        match self {
            Self::One(item) => f(item).map(OneOrMany::One),
            Self::Many(items) => items.into_iter().map(f).collect::<Result<_, _>>().map(OneOrMany::Many),
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}
