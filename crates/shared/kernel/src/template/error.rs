use std::borrow::Cow;

#[spire_derive::spire_error]
pub enum TemplateError {
    #[error("Template directory not found{}: {path}", format_context(.context))]
    MissingDirectory { path: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Template engine failed{}: {message}", format_context(.context))]
    Engine { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[cfg(feature = "templates")]
    #[error("Template rendering failed{}: {source}", format_context(.context))]
    Render { source: minijinja::Error, context: Option<Cow<'static, str>> },
}
