use std::borrow::Cow;

/// Errors raised while assembling a cache configuration.
#[spire_derive::spire_error]
pub enum CacheError {
    #[error("Invalid cache configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
