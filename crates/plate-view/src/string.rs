use plate_core::{ElementNode, Leaf, Node, TextNode};

use crate::dom::VNode;

const ZERO_WIDTH: &str = "\u{FEFF}";

/// Renders the text run of one leaf.
///
/// Empty leaves become a zero-width marker so the caret has something to sit
/// on; an empty line additionally carries a `<br>`.
pub fn render_text_run(leaf: &Leaf, is_last: bool, text: &TextNode, parent: &ElementNode) -> VNode {
    if leaf.text.is_empty() {
        let is_line_break = is_last && text.text.is_empty() && element_text_is_empty(parent);
        return zero_width(0, is_line_break);
    }

    let is_trailing = is_last && leaf.text.ends_with('\n');
    let mut run = VNode::element("span")
        .attr("data-slate-string", true)
        .child(VNode::text(leaf.text.clone()));
    if is_trailing {
        run = run.child(VNode::text("\n"));
    }
    run.build()
}

fn zero_width(length: usize, is_line_break: bool) -> VNode {
    let mut node = VNode::element("span")
        .attr("data-slate-zero-width", if is_line_break { "n" } else { "z" })
        .attr("data-slate-length", length)
        .child(VNode::text(ZERO_WIDTH));
    if is_line_break {
        node = node.child(VNode::element("br").build());
    }
    node.build()
}

fn element_text_is_empty(el: &ElementNode) -> bool {
    el.children.iter().all(|child| match child {
        Node::Text(t) => t.text.is_empty(),
        Node::Element(inner) => element_text_is_empty(inner),
    })
}
