//! URL building for API endpoints
//!
//! Resolves path templates with named placeholders and serializes query
//! strings.

use std::collections::BTreeMap;
use tracing::warn;

/// Placeholder names that may be filled from environment-derived defaults.
/// Any other placeholder resolves only from explicit path parameters.
const DEFAULT_PLACEHOLDERS: &[&str] = &["accountId", "clientId", "environment"];

/// Characters never legal in a path template outside placeholder braces
const ILLEGAL_CHARS: &[char] = &['<', '>', '"', '|', '\\', '^', '`'];

/// URL builder with explicit, allow-listed defaults.
///
/// Defaults are injected at construction rather than read ambiently, so two
/// builders configured differently never interfere.
#[derive(Clone, Debug, Default)]
pub struct UrlBuilder {
    defaults: BTreeMap<String, String>,
}

impl UrlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a default value for an allow-listed placeholder.
    /// Values for names outside the allow-list are ignored.
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if DEFAULT_PLACEHOLDERS.contains(&name.as_str()) {
            self.defaults.insert(name, value.into());
        } else {
            warn!("Ignoring default for non-allow-listed placeholder: {name}");
        }
        self
    }

    /// Resolve a path template into a concrete path with query string.
    ///
    /// Every `{name}` is replaced from `path_params`, then from the
    /// allow-listed defaults. Unresolved placeholders stay literal and are
    /// logged as a warning; a malformed URL is a test-authoring defect to be
    /// surfaced, not a runtime fault.
    pub fn build(
        &self,
        template: &str,
        path_params: &BTreeMap<String, String>,
        query_params: &[(String, String)],
    ) -> String {
        let mut path = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '{' {
                path.push(c);
                continue;
            }

            let mut name = String::new();
            let mut closed = false;
            for inner in chars.by_ref() {
                if inner == '}' {
                    closed = true;
                    break;
                }
                name.push(inner);
            }

            if !closed {
                // Unterminated brace: keep the literal text
                path.push('{');
                path.push_str(&name);
                continue;
            }

            match path_params.get(&name).or_else(|| self.defaults.get(&name)) {
                Some(value) => path.push_str(value),
                None => {
                    warn!("Unresolved placeholder {{{name}}} in template {template}");
                    path.push('{');
                    path.push_str(&name);
                    path.push('}');
                }
            }
        }

        if query_params.is_empty() {
            return path;
        }

        // Repeated keys serialize as repeated pairs, in caller order
        let query: Vec<String> = query_params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();

        format!("{path}?{}", query.join("&"))
    }
}

/// Validate a path template.
///
/// A valid template starts with `/`, has balanced placeholder braces, and
/// contains no characters illegal in a URL path outside those braces.
pub fn is_valid_endpoint(template: &str) -> bool {
    if !template.starts_with('/') {
        return false;
    }

    let mut in_braces = false;
    for c in template.chars() {
        match c {
            '{' => {
                if in_braces {
                    return false;
                }
                in_braces = true;
            }
            '}' => {
                if !in_braces {
                    return false;
                }
                in_braces = false;
            }
            _ if !in_braces && ILLEGAL_CHARS.contains(&c) => return false,
            _ => {}
        }
    }

    !in_braces
}
