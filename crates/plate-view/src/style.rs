use std::cell::RefCell;
use std::rc::Rc;

use crate::context::EditorId;
use crate::dom::Style;

/// The injected `<style>` element an editor writes its computed rules into.
///
/// Shared between the surface that mounts it and the editor that writes it.
#[derive(Debug, Clone, Default)]
pub struct StyleElement {
    inner: Rc<RefCell<StyleElementState>>,
}

#[derive(Debug, Default)]
struct StyleElementState {
    nonce: Option<String>,
    css: String,
    writes: usize,
}

impl StyleElement {
    pub fn new(nonce: Option<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StyleElementState {
                nonce,
                ..StyleElementState::default()
            })),
        }
    }

    pub fn css(&self) -> String {
        self.inner.borrow().css.clone()
    }

    pub fn nonce(&self) -> Option<String> {
        self.inner.borrow().nonce.clone()
    }

    /// Number of times the contents actually changed.
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }

    /// Replaces the contents. Returns false when the contents were already equal.
    pub fn set_css(&self, css: impl Into<String>) -> bool {
        let css = css.into();
        let mut state = self.inner.borrow_mut();
        if state.css == css {
            return false;
        }
        state.css = css;
        state.writes += 1;
        true
    }

    pub fn clear(&self) -> bool {
        self.set_css(String::new())
    }

    pub fn ptr_eq(&self, other: &StyleElement) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

pub fn editor_selector(id: EditorId) -> String {
    format!("[data-slate-editor-id=\"{}\"]", id.0)
}

/// Wraps `selector` in `:where(...)` when supported so the rule adds no specificity.
pub fn where_if_supported(selector: &str, styles: &str, supported: bool) -> String {
    if supported {
        format!(":where({selector}) {{ {styles} }}")
    } else {
        format!("{selector} {{ {styles} }}")
    }
}

pub fn min_height_rule(id: EditorId, height: f32, use_where: bool) -> String {
    let styles = format!("min-height: {height}px;");
    where_if_supported(&editor_selector(id), &styles, use_where)
}

/// Presentation of the placeholder overlay: stacked over the text, never
/// interactive, never selectable.
pub fn placeholder_style(opacity: f32) -> Style {
    Style::new()
        .set("position", "absolute")
        .set("pointer-events", "none")
        .set("width", "100%")
        .set("max-width", "100%")
        .set("display", "block")
        .set("opacity", opacity.to_string())
        .set("user-select", "none")
        .set("text-decoration", "none")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_height_rule_formats_whole_pixels() {
        assert_eq!(
            min_height_rule(EditorId(7), 24.0, false),
            "[data-slate-editor-id=\"7\"] { min-height: 24px; }"
        );
        assert_eq!(
            min_height_rule(EditorId(7), 24.5, true),
            ":where([data-slate-editor-id=\"7\"]) { min-height: 24.5px; }"
        );
    }

    #[test]
    fn set_css_reports_unchanged_writes() {
        let el = StyleElement::new(None);
        assert!(el.set_css("a"));
        assert!(!el.set_css("a"));
        assert!(el.clear());
        assert!(!el.clear());
        assert_eq!(el.write_count(), 2);
    }
}
