//! `OpenAPI` document assembly from the `[openapi]` configuration section.

mod request_body;

pub use request_body::{BodyField, create_request_body};

use serde_json::Value;
use spire_domain::config::OpenApiConfig;
use utoipa::openapi::external_docs::ExternalDocsBuilder;
use utoipa::openapi::security::SecurityRequirement;
use utoipa::openapi::server::ServerBuilder;
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{ContactBuilder, Info, InfoBuilder, LicenseBuilder, OpenApi, OpenApiBuilder};

/// A document with the configured metadata and no paths.
#[must_use]
pub fn create_openapi(config: &OpenApiConfig) -> OpenApi {
    let servers = config
        .servers
        .iter()
        .map(|server| ServerBuilder::new().url(&server.url).description(server.description.clone()).build());

    let tags = config
        .tags
        .iter()
        .map(|tag| TagBuilder::new().name(&tag.name).description(tag.description.clone()).build());

    let security = config.security.iter().map(|requirement| {
        requirement
            .iter()
            .fold(SecurityRequirement::default(), |acc, (scheme, scopes)| acc.add(scheme, scopes))
    });

    let external_docs = config
        .external_docs
        .as_ref()
        .map(|docs| ExternalDocsBuilder::new().url(&docs.url).description(docs.description.clone()).build());

    OpenApiBuilder::new()
        .info(info(config))
        .servers(Some(servers.collect::<Vec<_>>()))
        .tags((!config.tags.is_empty()).then(|| tags.collect::<Vec<_>>()))
        .security((!config.security.is_empty()).then(|| security.collect::<Vec<_>>()))
        .external_docs(external_docs)
        .build()
}

/// Overrides the metadata of a route-derived document with the configured values,
/// keeping its paths and components. Tags declared by routes are kept after the
/// configured ones.
#[must_use]
pub fn apply_config(config: &OpenApiConfig, mut api: OpenApi) -> OpenApi {
    let configured = create_openapi(config);

    let mut tags = configured.tags.unwrap_or_default();
    for tag in api.tags.take().unwrap_or_default() {
        if !tags.iter().any(|known| known.name == tag.name) {
            tags.push(tag);
        }
    }

    api.info = configured.info;
    api.servers = configured.servers;
    api.security = configured.security;
    api.external_docs = configured.external_docs;
    api.tags = (!tags.is_empty()).then_some(tags);
    api
}

/// Serializes the document, adding the configured webhooks.
///
/// # Errors
/// Returns an error if the document cannot be serialized.
pub fn to_document(config: &OpenApiConfig, api: &OpenApi) -> Result<Value, serde_json::Error> {
    let mut document = serde_json::to_value(api)?;
    if let (Value::Object(fields), false) = (&mut document, config.webhooks.is_empty()) {
        let webhooks = config.webhooks.iter().map(|(name, item)| (name.clone(), item.clone())).collect();
        fields.insert("webhooks".to_owned(), Value::Object(webhooks));
    }
    Ok(document)
}

fn info(config: &OpenApiConfig) -> Info {
    let contact = config.contact.as_ref().map(|contact| {
        ContactBuilder::new()
            .name(contact.name.clone())
            .url(contact.url.clone())
            .email(contact.email.clone())
            .build()
    });
    let license =
        config.license.as_ref().map(|license| LicenseBuilder::new().name(&license.name).url(license.url.clone()).build());

    InfoBuilder::new()
        .title(&config.title)
        .version(&config.version)
        .description(config.description.clone())
        .terms_of_service(config.terms_of_service.clone())
        .contact(contact)
        .license(license)
        .build()
}
