//! Navigation seam between the DOM and its embedder.

use bytes::Bytes;
use url::Url;

/// A request to navigate to a new document, produced by link clicks and
/// form submissions.
#[derive(Debug, Clone)]
pub struct NavigationOptions {
    /// The URL to navigate to
    pub url: Url,
    /// The content type of `document_resource` (for POST submissions)
    pub content_type: String,
    /// The id of the document that initiated the navigation
    pub source_document: usize,
    /// The body to send with the request, if any
    pub document_resource: Option<Bytes>,
}

impl NavigationOptions {
    pub fn new(url: Url, content_type: String, source_document: usize) -> Self {
        Self {
            url,
            content_type,
            source_document,
            document_resource: None,
        }
    }

    pub fn set_document_resource(mut self, resource: Option<Bytes>) -> Self {
        self.document_resource = resource;
        self
    }

    /// Convert into an `http::Request`, using POST when a body is present
    pub fn into_request(self) -> http::Request<Bytes> {
        let method = if self.document_resource.is_some() {
            http::Method::POST
        } else {
            http::Method::GET
        };
        let mut builder = http::Request::builder()
            .method(method)
            .uri(self.url.as_str());
        if self.document_resource.is_some() {
            builder = builder.header(http::header::CONTENT_TYPE, self.content_type.as_str());
        }
        builder
            .body(self.document_resource.unwrap_or_default())
            .expect("a parsed Url is always a valid uri")
    }
}

/// Handler for navigation events (clicking a link, submitting a form)
pub trait NavigationProvider: Send + Sync + 'static {
    fn navigate_to(&self, options: NavigationOptions);
}

/// A [`NavigationProvider`] that simply ignores all navigations
pub struct DummyNavigationProvider;

impl NavigationProvider for DummyNavigationProvider {
    fn navigate_to(&self, _options: NavigationOptions) {
        // Default impl: do nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_method_follows_body() {
        let url = Url::parse("https://example.com/form").unwrap();
        let get = NavigationOptions::new(url.clone(), "text/plain".into(), 1).into_request();
        assert_eq!(get.method(), http::Method::GET);

        let post = NavigationOptions::new(url, "application/x-www-form-urlencoded".into(), 1)
            .set_document_resource(Some(Bytes::from_static(b"a=b")))
            .into_request();
        assert_eq!(post.method(), http::Method::POST);
        assert_eq!(
            post.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
    }
}
