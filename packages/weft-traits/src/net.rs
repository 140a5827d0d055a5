//! Page loading seam used by frame elements.

use crate::navigation::NavigationOptions;

/// Failure to load a page into a frame or window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The server answered with a failing HTTP status
    Status(u16),
    /// A lower-level I/O failure (DNS, connect, read, ...)
    Io(String),
    /// The URL scheme is not loadable (e.g. `mailto:`)
    UnsupportedScheme(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Status(code) => write!(f, "failing http status {code}"),
            LoadError::Io(msg) => write!(f, "i/o failure: {msg}"),
            LoadError::UnsupportedScheme(scheme) => write!(f, "unsupported scheme {scheme}"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Loads pages on behalf of the DOM. Used by frame/iframe elements when
/// their `src` attribute resolves to a loadable URL.
///
/// Returns the id of the freshly loaded document on success.
pub trait PageLoader: Send + Sync + 'static {
    fn load_page(&self, options: NavigationOptions) -> Result<usize, LoadError>;
}

/// A [`PageLoader`] that refuses to load anything
pub struct DummyPageLoader;

impl PageLoader for DummyPageLoader {
    fn load_page(&self, _options: NavigationOptions) -> Result<usize, LoadError> {
        Err(LoadError::Io("no page loader configured".to_string()))
    }
}
