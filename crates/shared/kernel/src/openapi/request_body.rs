use crate::plugins::IntermediateModel;
use spire_domain::media::RequestEncodingType;
use utoipa::openapi::Required;
use utoipa::openapi::content::ContentBuilder;
use utoipa::openapi::request_body::{RequestBody, RequestBodyBuilder};
use utoipa::openapi::schema::Schema;

/// The declared body parameter of a route handler.
#[derive(Debug, Clone)]
pub struct BodyField {
    pub model: IntermediateModel,
    pub media_type: RequestEncodingType,
    pub description: Option<String>,
    pub required: bool,
}

impl BodyField {
    /// A required JSON body.
    #[must_use]
    pub const fn new(model: IntermediateModel) -> Self {
        Self { model, media_type: RequestEncodingType::Json, description: None, required: true }
    }

    #[must_use]
    pub const fn media_type(mut self, media_type: RequestEncodingType) -> Self {
        self.media_type = media_type;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Builds the request body of a route, keyed by the field's media type.
#[must_use]
pub fn create_request_body(field: &BodyField, create_examples: bool) -> RequestBody {
    let mut schema = field.model.schema_with_example(create_examples);
    if let (Schema::Object(object), Some(description)) = (&mut schema, &field.description) {
        object.description = Some(description.clone());
    }

    let mut content = ContentBuilder::new().schema(Some(schema));
    if create_examples {
        content = content.example(Some(field.model.example()));
    }

    RequestBodyBuilder::new()
        .content(field.media_type.as_str(), content.build())
        .description(field.description.clone())
        .required(Some(if field.required { Required::True } else { Required::False }))
        .build()
}
