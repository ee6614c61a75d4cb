use super::intermediate::ValidationError;
use std::borrow::Cow;

#[spire_derive::spire_error]
pub enum PluginError {
    #[error("No plugin supports {type_name}{}", format_context(.context))]
    Unsupported { type_name: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Model conversion failed{}: {message}", format_context(.context))]
    Conversion { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Model validation failed{}: {source}", format_context(.context))]
    Validation { source: ValidationError, context: Option<Cow<'static, str>> },
    #[error("Model serialization failed{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },
}

impl PluginError {
    pub(crate) fn unsupported(type_name: &'static str) -> Self {
        Self::Unsupported { type_name: Cow::Borrowed(type_name), context: None }
    }
}
