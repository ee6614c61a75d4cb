pub use crate::plugins::{
    Candidate, DomainValue, FieldKind, FieldSpec, IntermediateInstance, IntermediateModel, ModelPlugin, ModelType,
    OneOrMany, PluginError, PluginMapping, PluginRegistry, SerdePlugin, Subject,
};
pub use crate::response::{
    Content, FallbackPolicy, File, HandlerOutput, Redirect, ResponseContext, ResponseError, ResponseSettings, Stream,
    Template, to_response,
};
pub use crate::server::{AppState, build_router, cached};
#[cfg(feature = "templates")]
pub use crate::template::JinjaEngine;
pub use crate::template::{TemplateConfig, TemplateEngine};
pub use axum::http::StatusCode;
pub use spire_domain::media::MediaType;
