//! Pluggable template engines used by [`crate::response::Template`] responses.

mod error;
#[cfg(feature = "templates")]
mod jinja;

pub use error::{TemplateError, TemplateErrorExt};
#[cfg(feature = "templates")]
pub use jinja::JinjaEngine;

use serde_json::Value;
use std::fmt::{self, Debug};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// A template engine that looks templates up by name in a set of directories.
pub trait TemplateEngine: Debug + Send + Sync {
    /// # Errors
    /// Returns an error if the engine cannot be set up for `directories`.
    fn from_directories(directories: &[PathBuf]) -> Result<Self, TemplateError>
    where
        Self: Sized;

    /// # Errors
    /// Returns an error if the template is missing or fails to render.
    fn render(&self, name: &str, context: &Value) -> Result<String, TemplateError>;
}

type EngineCallback<E> = Box<dyn FnOnce(&mut E) + Send>;

/// Template directories plus the engine type that serves them.
///
/// The optional callback runs once on the freshly built engine, e.g. to register
/// filters or globals.
pub struct TemplateConfig<E> {
    directories: Vec<PathBuf>,
    callback: Option<EngineCallback<E>>,
}

impl<E: TemplateEngine + 'static> TemplateConfig<E> {
    /// # Errors
    /// Returns [`TemplateError::MissingDirectory`] for the first directory that does not exist.
    pub fn new<I>(directories: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        let directories: Vec<PathBuf> = directories.into_iter().map(Into::into).collect();
        if let Some(missing) = directories.iter().find(|dir| !dir.is_dir()) {
            return Err(TemplateError::MissingDirectory { path: missing.display().to_string().into(), context: None });
        }
        Ok(Self { directories, callback: None })
    }

    #[must_use]
    pub fn engine_callback(mut self, callback: impl FnOnce(&mut E) + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Builds the engine and applies the callback.
    ///
    /// # Errors
    /// Propagates engine construction failures.
    pub fn build(self) -> Result<Arc<dyn TemplateEngine>, TemplateError> {
        let mut engine = E::from_directories(&self.directories)?;
        if let Some(callback) = self.callback {
            callback(&mut engine);
        }
        info!(directories = ?self.directories, engine = std::any::type_name::<E>(), "Template engine ready");
        Ok(Arc::new(engine))
    }
}

impl<E> Debug for TemplateConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateConfig")
            .field("directories", &self.directories)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
