//! Script execution seam.
//!
//! The JavaScript engine itself lives outside the DOM crate. The DOM only
//! needs to know whether a script turn is currently executing (to decide
//! whether side effects must be postponed) and how to hand inline script
//! source to the engine.

use crate::events::HandlerOutcome;

/// The script engine as seen from the DOM.
pub trait ScriptHost: Send + Sync + 'static {
    /// Whether a script-execution turn is currently in progress.
    ///
    /// While this is true, side effects such as executing freshly inserted
    /// `<script>` elements must be deferred until the turn completes.
    fn is_script_running(&self) -> bool;

    /// Execute inline script source.
    ///
    /// `source_description` and `line_no` identify the script for error
    /// reporting (typically the document URL and the element's line).
    fn execute_inline(
        &self,
        code: &str,
        source_description: &str,
        line_no: u32,
    ) -> HandlerOutcome;
}

/// A [`ScriptHost`] with no engine behind it: never running, never handles
pub struct DummyScriptHost;

impl ScriptHost for DummyScriptHost {
    fn is_script_running(&self) -> bool {
        false
    }

    fn execute_inline(
        &self,
        _code: &str,
        _source_description: &str,
        _line_no: u32,
    ) -> HandlerOutcome {
        HandlerOutcome::NoHandler
    }
}
