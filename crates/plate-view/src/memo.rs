use std::rc::Rc;

use crate::config::ViewConfig;
use crate::dom::VNode;
use crate::error::ScopeError;
use crate::leaf::{LeafProps, LeafView};
use crate::resize::Platform;

/// Whether `next` would render the same output as `prev`.
///
/// Parents, texts and overrides are compared by identity; callers hand in the
/// same `Rc` when nothing upstream changed. The leaf itself is compared by
/// value because leaves are rebuilt on every pass.
pub fn leaf_props_equal(prev: &LeafProps, next: &LeafProps) -> bool {
    Rc::ptr_eq(&next.parent, &prev.parent)
        && next.is_last == prev.is_last
        && match (&next.render_leaf, &prev.render_leaf) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        }
        && next.render_placeholder.ptr_eq(&prev.render_placeholder)
        && Rc::ptr_eq(&next.text, &prev.text)
        && next.leaf.content_eq(&prev.leaf)
        && next.leaf.placeholder == prev.leaf.placeholder
}

/// A [`LeafView`] behind a render-skip gate.
pub struct MemoLeaf {
    view: LeafView,
    last: Option<(LeafProps, VNode)>,
    pending_commit: bool,
}

impl MemoLeaf {
    pub fn mount(platform: Rc<dyn Platform>, config: &ViewConfig) -> Result<Self, ScopeError> {
        Ok(Self {
            view: LeafView::mount(platform, config)?,
            last: None,
            pending_commit: false,
        })
    }

    /// Returns the previous output untouched when the gate holds.
    pub fn render(&mut self, props: LeafProps) -> VNode {
        if let Some((prev, output)) = &self.last {
            if leaf_props_equal(prev, &props) {
                return output.clone();
            }
        }
        let output = self.view.render(&props);
        self.last = Some((props, output.clone()));
        self.pending_commit = true;
        output
    }

    /// True when the last `render` actually re-rendered.
    pub fn needs_commit(&self) -> bool {
        self.pending_commit
    }

    pub fn commit(&mut self) {
        if std::mem::take(&mut self.pending_commit) {
            self.view.commit();
        }
    }

    pub fn view(&self) -> &LeafView {
        &self.view
    }
}
