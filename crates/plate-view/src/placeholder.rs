use std::rc::Rc;

use crate::context::{EditorHandle, WeakEditor};
use crate::dom::ElementId;
use crate::resize::{Platform, ResizeCallback, ResizeEntry, ResizeObserver, create_resize_observer};
use crate::style::min_height_rule;

enum SyncState {
    NoObserver,
    Observing {
        element: ElementId,
        observer: Option<Box<dyn ResizeObserver>>,
    },
}

/// Mirrors the measured height of a leaf's placeholder overlay into its
/// editor's injected style element as a `min-height` rule.
///
/// Owned by exactly one leaf. At most one subscription is live at a time, and
/// it is torn down before a new one is created and when the synchronizer drops.
pub struct PlaceholderHeightSync {
    editor: EditorHandle,
    platform: Rc<dyn Platform>,
    use_where_selector: bool,
    state: SyncState,
}

impl PlaceholderHeightSync {
    pub fn new(editor: EditorHandle, platform: Rc<dyn Platform>, use_where_selector: bool) -> Self {
        Self {
            editor,
            platform,
            use_where_selector,
            state: SyncState::NoObserver,
        }
    }

    pub fn observed_element(&self) -> Option<ElementId> {
        match &self.state {
            SyncState::NoObserver => None,
            SyncState::Observing { element, .. } => Some(*element),
        }
    }

    /// True while a measurement subscription is connected.
    pub fn is_observing(&self) -> bool {
        match &self.state {
            SyncState::Observing {
                observer: Some(observer),
                ..
            } => observer.is_connected(),
            _ => false,
        }
    }

    /// Advances the state machine to the placeholder element of the pass that
    /// just committed.
    pub fn sync(&mut self, element: Option<ElementId>) {
        let editor = self.editor.id().0;
        match (self.observed_element(), element) {
            (None, None) => {}
            (Some(current), Some(next)) if current == next => {}
            (None, Some(next)) => {
                tracing::debug!(editor, element = next.0, "placeholder appeared; observing");
                self.state = self.observe(next);
            }
            (Some(current), Some(next)) => {
                tracing::debug!(
                    editor,
                    from = current.0,
                    to = next.0,
                    "placeholder element replaced; re-observing"
                );
                self.disconnect();
                self.state = self.observe(next);
            }
            (Some(current), None) => {
                tracing::debug!(editor, element = current.0, "placeholder gone; clearing min-height");
                self.disconnect();
                self.state = SyncState::NoObserver;
                if let Some(style) = self.editor.style_element() {
                    style.clear();
                }
            }
        }
    }

    fn observe(&self, element: ElementId) -> SyncState {
        let callback = min_height_writer(
            self.editor.downgrade(),
            self.use_where_selector && self.platform.supports_where_selector(),
        );
        let mut observer = create_resize_observer(self.platform.as_ref(), callback);
        if let Some(observer) = observer.as_mut() {
            observer.observe(element);
        }
        SyncState::Observing { element, observer }
    }

    fn disconnect(&mut self) {
        if let SyncState::Observing {
            observer: Some(observer),
            ..
        } = &mut self.state
        {
            observer.disconnect();
        }
    }
}

impl Drop for PlaceholderHeightSync {
    fn drop(&mut self) {
        self.disconnect();
        // Another leaf may already own the placeholder role; only clear the
        // rule when nobody does.
        if self.observed_element().is_some() && self.editor.placeholder_element().is_none() {
            if let Some(style) = self.editor.style_element() {
                style.clear();
            }
        }
    }
}

fn min_height_writer(editor: WeakEditor, use_where: bool) -> ResizeCallback {
    Rc::new(move |entries: &[ResizeEntry]| {
        let Some(entry) = entries.last() else {
            return;
        };
        let Some(editor) = editor.upgrade() else {
            return;
        };
        let Some(style) = editor.style_element() else {
            return;
        };
        let rule = min_height_rule(editor.id(), entry.client_height, use_where);
        if style.set_css(rule) {
            tracing::trace!(
                editor = editor.id().0,
                element = entry.target.0,
                height = entry.client_height,
                "placeholder min-height updated"
            );
        }
    })
}
