use std::sync::Arc;

use weft_traits::{
    navigation::NavigationProvider,
    net::PageLoader,
    script::ScriptHost,
};

/// Options used when constructing a [`Document`](crate::Document)
#[derive(Default)]
pub struct DocumentConfig {
    /// The base url which relative URLs are resolved against
    pub base_url: Option<String>,
    /// Report DOM contract violations as errors instead of silently
    /// ignoring them
    pub strict_errors: bool,
    /// Browser-compatibility quirk: cloned checkboxes copy the live checked
    /// state rather than re-deriving it from the `checked` attribute
    pub checkbox_clone_copies_state: bool,
    /// Navigation provider to handle link clicks and form submissions
    pub navigation_provider: Option<Arc<dyn NavigationProvider>>,
    /// Page loader used to fetch frame content
    pub page_loader: Option<Arc<dyn PageLoader>>,
    /// Script host used to execute inline scripts and event handlers
    pub script_host: Option<Arc<dyn ScriptHost>>,
}
