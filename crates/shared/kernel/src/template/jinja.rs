use super::{TemplateEngine, TemplateError};
use minijinja::{Environment, ErrorKind};
use serde_json::Value;
use std::io;
use std::path::{Component, Path, PathBuf};

/// `MiniJinja` engine searching its directories in order.
///
/// Names containing `..` or absolute paths never resolve.
#[derive(Debug)]
pub struct JinjaEngine {
    env: Environment<'static>,
}

impl JinjaEngine {
    /// Direct access for registering filters, functions and globals.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl TemplateEngine for JinjaEngine {
    fn from_directories(directories: &[PathBuf]) -> Result<Self, TemplateError> {
        let directories = directories.to_vec();
        let mut env = Environment::new();
        env.set_loader(move |name| load_template(&directories, name));
        Ok(Self { env })
    }

    fn render(&self, name: &str, context: &Value) -> Result<String, TemplateError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(context)?)
    }
}

fn load_template(directories: &[PathBuf], name: &str) -> Result<Option<String>, minijinja::Error> {
    let relative = Path::new(name);
    if !relative.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
        return Ok(None);
    }

    for directory in directories {
        match std::fs::read_to_string(directory.join(relative)) {
            Ok(source) => return Ok(Some(source)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(minijinja::Error::new(ErrorKind::InvalidOperation, "failed to read template").with_source(err));
            }
        }
    }
    Ok(None)
}
