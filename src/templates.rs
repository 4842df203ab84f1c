/// Template rendering boundary and the bundled renderer
///
/// Templates are plain HTML with `{{ path.to.value }}` placeholders resolved
/// against the JSON context built for a component. Rendering is strict: an
/// unknown template or a placeholder that does not resolve is an error, so a
/// misconfigured component shows up in the logs instead of as a blank fragment.
use crate::config::TemplatesConfig;
use crate::errors::RenderError;
use crate::logger::{self, LogTag};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*\}\}")
        .expect("placeholder pattern is valid")
});

/// Which template a component renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// Template asset looked up by name
    Named(String),
    /// Template source carried by the component itself
    Inline(String),
}

impl Template {
    pub fn named(name: impl Into<String>) -> Self {
        Template::Named(name.into())
    }

    pub fn inline(source: impl Into<String>) -> Self {
        Template::Inline(source.into())
    }

    /// Name used in logs and errors
    pub fn label(&self) -> &str {
        match self {
            Template::Named(name) => name,
            Template::Inline(_) => "<inline>",
        }
    }
}

/// Template renderer collaborator
pub trait Renderer: Send + Sync {
    fn render(&self, template: &Template, context: &Value) -> Result<String, RenderError>;
}

/// Placeholder renderer backed by a template directory and/or registered sources
pub struct TemplateRenderer {
    directory: Option<PathBuf>,
    extension: String,
    cache: RwLock<HashMap<String, Arc<str>>>,
}

impl TemplateRenderer {
    /// Renderer with no template directory; only `insert`ed and inline templates
    pub fn new() -> Self {
        Self {
            directory: None,
            extension: "html".to_string(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Renderer loading `<directory>/<name>.<extension>` on first use
    pub fn from_dir(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: Some(directory.into()),
            extension: extension.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &TemplatesConfig) -> Self {
        Self::from_dir(&config.directory, config.extension.clone())
    }

    /// Register (or replace) a named template source
    pub fn insert(&self, name: impl Into<String>, source: impl Into<String>) {
        let source: String = source.into();
        self.cache.write().insert(name.into(), Arc::from(source));
    }

    fn source(&self, name: &str) -> Result<Arc<str>, RenderError> {
        if let Some(source) = self.cache.read().get(name) {
            return Ok(source.clone());
        }

        let directory = self
            .directory
            .as_ref()
            .ok_or_else(|| RenderError::TemplateNotFound(name.to_string()))?;

        if name.is_empty() || name.contains("..") || name.contains(['/', '\\']) {
            return Err(RenderError::TemplateNotFound(name.to_string()));
        }

        let path = directory.join(format!("{}.{}", name, self.extension));
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::TemplateNotFound(name.to_string()));
            }
            Err(source) => {
                return Err(RenderError::Io {
                    name: name.to_string(),
                    source,
                });
            }
        };

        logger::debug(
            LogTag::Templates,
            &format!("Loaded template '{}' from {}", name, path.display()),
        );

        let source: Arc<str> = Arc::from(source);
        self.cache.write().insert(name.to_string(), source.clone());
        Ok(source)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, template: &Template, context: &Value) -> Result<String, RenderError> {
        match template {
            Template::Named(name) => render_source(name, &self.source(name)?, context),
            Template::Inline(source) => render_source(template.label(), source, context),
        }
    }
}

/// Substitute every placeholder in `source` with its HTML-escaped value
pub fn render_source(label: &str, source: &str, context: &Value) -> Result<String, RenderError> {
    let mut output = String::with_capacity(source.len());
    let mut last = 0;

    for captures in PLACEHOLDER.captures_iter(source) {
        let (Some(whole), Some(path)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        output.push_str(&source[last..whole.start()]);

        let value = lookup(context, path.as_str()).ok_or_else(|| RenderError::MissingBinding {
            template: label.to_string(),
            path: path.as_str().to_string(),
        })?;

        match value {
            Value::Null => {}
            Value::String(s) => output.push_str(&htmlescape::encode_minimal(s)),
            Value::Number(n) => output.push_str(&n.to_string()),
            Value::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
            Value::Array(_) | Value::Object(_) => {
                return Err(RenderError::NotPrintable {
                    template: label.to_string(),
                    path: path.as_str().to_string(),
                });
            }
        }

        last = whole.end();
    }

    output.push_str(&source[last..]);
    Ok(output)
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
