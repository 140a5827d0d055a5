//! Postponed actions: work queued during tree mutation that must not run
//! until the mutation completes.
//!
//! Inserting a `<script>` element queues its execution; inserting a frame
//! (or changing its `src`) queues a page load. The queue drains when the
//! current mutation batch ends. Staleness is judged at drain time, not at
//! queue time: an action whose element has left the document in the
//! meantime is dropped, and a frame load that has been superseded by a
//! newer load for the same frame is dropped in favor of the newer one.

use markup5ever::local_name;
use url::Url;
use weft_traits::navigation::NavigationOptions;

use crate::document::Document;

/// A unit of work deferred until the current mutation batch completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostponedAction {
    /// Execute an inline `<script>` element that entered the document
    ExecuteScript { node_id: usize },
    /// Load a frame element's `src` into the frame
    LoadFrame { node_id: usize, src: String },
}

impl PostponedAction {
    fn node_id(&self) -> usize {
        match self {
            PostponedAction::ExecuteScript { node_id } => *node_id,
            PostponedAction::LoadFrame { node_id, .. } => *node_id,
        }
    }
}

impl Document {
    /// Drain and run the postponed action queue.
    ///
    /// Runs to completion: actions executed here may queue further actions
    /// (a frame load inserting more frames), which are picked up in the
    /// same drain. Re-entrant calls return immediately.
    pub fn process_postponed_actions(&mut self) {
        if self.processing_postponed {
            return;
        }
        // While the script engine is mid-turn, side effects stay queued
        // until the turn completes
        if self.script_host.is_script_running() {
            return;
        }
        self.processing_postponed = true;

        while let Some(action) = self.postponed_actions.pop_front() {
            if self.is_action_stale(&action) {
                continue;
            }
            match action {
                PostponedAction::ExecuteScript { node_id } => self.execute_script(node_id),
                PostponedAction::LoadFrame { node_id, src } => {
                    self.load_frame_if_possible(node_id, &src)
                }
            }
        }

        self.processing_postponed = false;
    }

    /// Whether an action no longer applies at drain time
    fn is_action_stale(&self, action: &PostponedAction) -> bool {
        let node_id = action.node_id();
        let Some(node) = self.get_node(node_id) else {
            return true;
        };
        if !node.flags.is_in_document() {
            return true;
        }
        // A newer load for the same frame supersedes this one
        if matches!(action, PostponedAction::LoadFrame { .. }) {
            let superseded = self.postponed_actions.iter().any(|queued| {
                matches!(queued, PostponedAction::LoadFrame { node_id: id, .. } if *id == node_id)
            });
            if superseded {
                return true;
            }
        }
        false
    }

    /// Execute an inline script element's source exactly once
    fn execute_script(&mut self, node_id: usize) {
        let pending = self
            .get_node_mut(node_id)
            .and_then(|node| node.element_data_mut())
            .and_then(|elem| elem.script_data_mut())
            .map(|script| {
                let pending = !script.already_executed;
                script.already_executed = true;
                pending
            })
            .unwrap_or(false);
        if !pending {
            return;
        }

        // External scripts (src attribute) are the loader's concern, not
        // the inline path
        if self.nodes[node_id].attr(local_name!("src")).is_some() {
            return;
        }

        let code = self.text_content(node_id);
        if code.trim().is_empty() {
            return;
        }

        let source_description = format!("script in {}", self.url.as_str());
        #[cfg(feature = "tracing")]
        tracing::debug!("Executing inline script (node {})", node_id);
        let script_host = std::sync::Arc::clone(&self.script_host);
        script_host.execute_inline(&code, &source_description, 1);
    }

    /// Load a frame's `src` if doing so cannot recurse.
    ///
    /// A frame whose resolved URL equals the containing document's URL, or
    /// the loaded URL of any ancestor frame, would load pages forever; such
    /// loads are refused.
    pub(crate) fn load_frame_if_possible(&mut self, node_id: usize, src: &str) {
        let Some(resolved) = self.url.resolve_relative(src) else {
            let message = format!(
                "frame src {src:?} does not resolve against {}",
                self.url.as_str()
            );
            self.report_resource_failure(message);
            return;
        };

        if self.would_recurse(node_id, &resolved) {
            #[cfg(feature = "tracing")]
            tracing::warn!("Refusing recursive frame load of {}", resolved.as_str());
            return;
        }

        let options = NavigationOptions::new(resolved.clone(), String::new(), self.id());
        let page_loader = std::sync::Arc::clone(&self.page_loader);
        match page_loader.load_page(options) {
            Ok(page_id) => {
                if let Some(frame) = self
                    .get_node_mut(node_id)
                    .and_then(|node| node.element_data_mut())
                    .and_then(|elem| elem.frame_data_mut())
                {
                    frame.loaded_url = Some(resolved);
                    frame.content_document = Some(page_id);
                }
                self.note_changed(node_id);
            }
            Err(err) => {
                let message = format!("failed to load frame {}: {err}", resolved.as_str());
                self.report_resource_failure(message);
            }
        }
    }

    fn would_recurse(&self, frame_id: usize, url: &Url) -> bool {
        if *url == *self.url {
            return true;
        }
        // Check ancestor frames
        let mut current = self.get_node(frame_id).and_then(|node| node.parent);
        while let Some(id) = current {
            let node = &self.nodes[id];
            if let Some(loaded) = node
                .element_data()
                .and_then(|elem| elem.frame_data())
                .and_then(|frame| frame.loaded_url.as_ref())
            {
                if loaded == url {
                    return true;
                }
            }
            current = node.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use markup5ever::{QualName, namespace_url, ns};
    use weft_traits::net::{LoadError, PageLoader};

    use super::*;
    use crate::DocumentConfig;
    use crate::node::Attribute;

    fn qual(name: &str) -> QualName {
        QualName::new(None, ns!(), markup5ever::LocalName::from(name))
    }

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl PageLoader for CountingLoader {
        fn load_page(&self, _options: NavigationOptions) -> Result<usize, LoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(99)
        }
    }

    fn frame_doc(loader: Arc<CountingLoader>) -> Document {
        Document::new(DocumentConfig {
            base_url: Some("https://example.com/index.html".to_string()),
            page_loader: Some(loader),
            ..Default::default()
        })
    }

    #[test]
    fn inserting_frame_loads_its_src() {
        let loader = Arc::new(CountingLoader::default());
        let mut doc = frame_doc(Arc::clone(&loader));
        let frame = {
            let mut mutr = doc.mutate();
            let frame = mutr.create_element(
                qual("iframe"),
                vec![Attribute::new(qual("src"), "child.html".into())],
            );
            mutr.append_children(0, &[frame]);
            frame
        };

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        let loaded = doc[frame]
            .element_data()
            .unwrap()
            .frame_data()
            .unwrap()
            .loaded_url
            .clone();
        assert_eq!(
            loaded.unwrap().as_str(),
            "https://example.com/child.html"
        );
    }

    #[test]
    fn frame_pointing_at_own_document_is_refused() {
        let loader = Arc::new(CountingLoader::default());
        let mut doc = frame_doc(Arc::clone(&loader));
        {
            let mut mutr = doc.mutate();
            let frame = mutr.create_element(
                qual("iframe"),
                vec![Attribute::new(qual("src"), "index.html".into())],
            );
            mutr.append_children(0, &[frame]);
        }
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stale_actions_are_dropped_at_drain_time() {
        let loader = Arc::new(CountingLoader::default());
        let mut doc = frame_doc(Arc::clone(&loader));
        {
            let mut mutr = doc.mutate();
            let frame = mutr.create_element(
                qual("iframe"),
                vec![Attribute::new(qual("src"), "child.html".into())],
            );
            mutr.append_children(0, &[frame]);
            // Removed again within the same batch: the queued load is stale
            mutr.remove_node(frame);
        }
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn newer_frame_load_supersedes_older() {
        let loader = Arc::new(CountingLoader::default());
        let mut doc = frame_doc(Arc::clone(&loader));
        let frame = {
            let mut mutr = doc.mutate();
            let frame = mutr.create_element(
                qual("iframe"),
                vec![Attribute::new(qual("src"), "a.html".into())],
            );
            mutr.append_children(0, &[frame]);
            mutr.set_attribute(frame, qual("src"), "b.html".into());
            frame
        };

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        let loaded = doc[frame]
            .element_data()
            .unwrap()
            .frame_data()
            .unwrap()
            .loaded_url
            .clone();
        assert_eq!(loaded.unwrap().as_str(), "https://example.com/b.html");
    }

    struct FailingLoader;

    impl PageLoader for FailingLoader {
        fn load_page(&self, _options: NavigationOptions) -> Result<usize, LoadError> {
            Err(LoadError::Status(404))
        }
    }

    fn failing_frame_doc(strict_errors: bool) -> Document {
        let mut doc = Document::new(DocumentConfig {
            base_url: Some("https://example.com/index.html".to_string()),
            strict_errors,
            page_loader: Some(Arc::new(FailingLoader) as _),
            ..Default::default()
        });
        let mut mutr = doc.mutate();
        let frame = mutr.create_element(
            qual("iframe"),
            vec![Attribute::new(qual("src"), "child.html".into())],
        );
        mutr.append_children(0, &[frame]);
        drop(mutr);
        doc
    }

    #[test]
    fn strict_document_records_failed_frame_load() {
        let mut doc = failing_frame_doc(true);
        let failures = doc.drain_deferred_failures();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], crate::DomError::Deferred(_)));
        // Draining empties the record
        assert!(doc.drain_deferred_failures().is_empty());
    }

    #[test]
    fn lenient_document_swallows_failed_frame_load() {
        let mut doc = failing_frame_doc(false);
        assert!(doc.drain_deferred_failures().is_empty());
    }

    #[test]
    fn scripts_execute_once() {
        use std::sync::atomic::AtomicUsize;
        use weft_traits::events::HandlerOutcome;
        use weft_traits::script::ScriptHost;

        #[derive(Default)]
        struct CountingHost {
            runs: AtomicUsize,
        }
        impl ScriptHost for CountingHost {
            fn is_script_running(&self) -> bool {
                false
            }
            fn execute_inline(&self, _: &str, _: &str, _: u32) -> HandlerOutcome {
                self.runs.fetch_add(1, Ordering::SeqCst);
                HandlerOutcome::NoHandler
            }
        }

        let host = Arc::new(CountingHost::default());
        let mut doc = Document::new(DocumentConfig {
            script_host: Some(Arc::clone(&host) as _),
            ..Default::default()
        });

        let (script, div) = {
            let mut mutr = doc.mutate();
            let div = mutr.create_element(qual("div"), Vec::new());
            let script = mutr.create_element(qual("script"), Vec::new());
            let code = mutr.create_text_node("doSomething()");
            mutr.append_children(script, &[code]);
            mutr.append_children(0, &[div, script]);
            (script, div)
        };
        assert_eq!(host.runs.load(Ordering::SeqCst), 1);

        // Moving the script within the document must not re-run it
        {
            let mut mutr = doc.mutate();
            mutr.remove_node(script);
            mutr.append_children(div, &[script]);
        }
        assert_eq!(host.runs.load(Ordering::SeqCst), 1);
    }
}
