//! Parsed template cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::ParseError;
use crate::template::Template;

/// Caches parsed templates by their exact source text.
///
/// Parsing runs once per distinct text; every later lookup shares the same
/// [`Template`]. Failed parses are not cached.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: RwLock<HashMap<String, Arc<Template>>>,
}

impl TemplateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached template for `source`, parsing it on first use.
    pub fn get_or_parse(&self, source: &str) -> Result<Arc<Template>, ParseError> {
        if let Some(template) = self.templates.read().get(source) {
            debug!(len = source.len(), "Template cache hit");
            return Ok(Arc::clone(template));
        }

        debug!(len = source.len(), "Template cache miss");
        let parsed = Arc::new(Template::parse(source)?);
        let mut templates = self.templates.write();
        // Another thread may have parsed the same text meanwhile; keep the first.
        let template = templates
            .entry(String::from(source))
            .or_insert(parsed);
        Ok(Arc::clone(template))
    }

    /// Returns the number of cached templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.read().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.read().is_empty()
    }

    /// Drops every cached template.
    pub fn clear(&self) {
        self.templates.write().clear();
    }
}
