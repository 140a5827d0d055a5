use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use url::Url;

/// The document's base URL.
///
/// Relative URLs in the document (anchor hrefs, form actions, frame srcs)
/// resolve against this using standard URL resolution rules. The URL is
/// reference counted so frames and postponed actions can hold onto the base
/// they were queued against.
#[derive(Debug, Clone)]
pub struct DocumentUrl {
    base_url: Arc<Url>,
}

impl DocumentUrl {
    /// Resolve a relative URL against this document's base URL.
    /// Returns None if the input is not a valid relative URL.
    pub fn resolve_relative(&self, raw: &str) -> Option<Url> {
        self.base_url.join(raw).ok()
    }

    pub fn url(&self) -> &Url {
        &self.base_url
    }
}

impl Default for DocumentUrl {
    fn default() -> Self {
        // about:blank is the standard placeholder for an empty document;
        // "data:" is the minimal parseable fallback
        if let Ok(url) = Url::parse("about:blank") {
            return Self::from(url);
        }
        match Url::parse("data:") {
            Ok(url) => Self::from(url),
            Err(_) => panic!("no parseable fallback base URL"),
        }
    }
}

impl FromStr for DocumentUrl {
    type Err = url::ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input.trim())?;
        Ok(Self::from(url))
    }
}

impl From<Url> for DocumentUrl {
    fn from(base_url: Url) -> Self {
        Self {
            base_url: Arc::new(base_url),
        }
    }
}

impl Deref for DocumentUrl {
    type Target = Url;
    fn deref(&self) -> &Self::Target {
        &self.base_url
    }
}
