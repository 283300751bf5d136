use std::rc::Rc;

use plate_core::{Attrs, Editor, ElementNode, Leaf, Marks, Node, Placeholder, TextNode};
use plate_view::{
    EditorHandle, EditorScope, HeadlessHost, LeafProps, MemoLeaf, RenderLeaf, RenderPlaceholder,
    VNode, ViewConfig, default_leaf, default_placeholder, leaf_props_equal,
};
use serde_json::json;

fn paragraph(text: &TextNode) -> Rc<ElementNode> {
    Rc::new(ElementNode {
        kind: "paragraph".to_string(),
        attrs: Attrs::default(),
        children: vec![Node::Text(text.clone())],
    })
}

fn nested_marks() -> Marks {
    [
        ("bold", json!(true)),
        ("font", json!({"family": "serif", "features": ["liga", "kern"]})),
    ]
    .into_iter()
    .collect()
}

fn base_props() -> LeafProps {
    let text = Rc::new(TextNode {
        text: "hello".to_string(),
        marks: nested_marks(),
    });
    let parent = paragraph(&text);
    let leaf = Leaf::new("hello").with_marks(nested_marks());
    LeafProps::new(leaf, text, parent).is_last(true)
}

#[test]
fn rebuilt_equal_leaf_with_same_refs_is_equal() {
    let prev = base_props();
    let mut next = prev.clone();
    // Same content, freshly built, marks inserted in another order.
    next.leaf = Leaf::new("hello").with_marks(
        [
            ("font", json!({"features": ["liga", "kern"], "family": "serif"})),
            ("bold", json!(true)),
        ]
        .into_iter()
        .collect(),
    );
    assert!(leaf_props_equal(&prev, &next));
}

#[test]
fn different_leaf_text_is_not_equal() {
    let prev = base_props();
    let mut next = prev.clone();
    next.leaf.text = "hellO".to_string();
    assert!(!leaf_props_equal(&prev, &next));
}

#[test]
fn nested_mark_change_is_not_equal() {
    let prev = base_props();
    let mut next = prev.clone();
    next.leaf
        .marks
        .set("font", json!({"family": "serif", "features": ["liga"]}));
    assert!(!leaf_props_equal(&prev, &next));
}

#[test]
fn placeholder_flag_change_is_not_equal() {
    let prev = base_props();
    let mut next = prev.clone();
    next.leaf.placeholder = Some(Placeholder::new("hint"));
    assert!(!leaf_props_equal(&prev, &next));
}

#[test]
fn references_are_compared_by_identity() {
    let prev = base_props();

    let mut next = prev.clone();
    next.parent = Rc::new((*prev.parent).clone());
    assert!(!leaf_props_equal(&prev, &next), "structurally equal parent");

    let mut next = prev.clone();
    next.text = Rc::new((*prev.text).clone());
    assert!(!leaf_props_equal(&prev, &next), "structurally equal text");

    let mut next = prev.clone();
    next.is_last = false;
    assert!(!leaf_props_equal(&prev, &next));

    let mut next = prev.clone();
    next.render_leaf = Some(RenderLeaf::new(default_leaf));
    assert!(!leaf_props_equal(&prev, &next), "override added");

    let override_a = RenderLeaf::new(default_leaf);
    let override_b = RenderLeaf::new(default_leaf);
    let with_a = prev.clone().render_leaf(Some(override_a.clone()));
    assert!(leaf_props_equal(&with_a, &with_a.clone().render_leaf(Some(override_a))));
    assert!(!leaf_props_equal(&with_a, &with_a.clone().render_leaf(Some(override_b))));

    let mut next = prev.clone();
    next.render_placeholder = RenderPlaceholder::new(default_placeholder);
    assert!(!leaf_props_equal(&prev, &next), "distinct placeholder renderer");

    let mut next = prev.clone();
    next.render_placeholder = RenderPlaceholder::default();
    assert!(leaf_props_equal(&prev, &next), "default renderer is shared");
}

#[test]
fn memo_leaf_reuses_output_until_something_changes() -> anyhow::Result<()> {
    let host = HeadlessHost::new();
    let editor = EditorHandle::new(Editor::empty());
    let _scope = EditorScope::enter(&editor);
    let mut memo = MemoLeaf::mount(host.as_platform(), &ViewConfig::new())?;

    let props = base_props();
    let first = memo.render(props.clone());
    assert!(memo.needs_commit());
    memo.commit();
    assert!(!memo.needs_commit());

    let mut rebuilt = props.clone();
    rebuilt.leaf = Leaf::new("hello").with_marks(nested_marks());
    let second = memo.render(rebuilt);
    assert!(first.ptr_eq(&second));
    assert!(!memo.needs_commit());

    let mut edited = props.clone();
    edited.leaf.text = "hello!".to_string();
    let third = memo.render(edited);
    assert!(!first.ptr_eq(&third));
    assert!(memo.needs_commit());
    assert_eq!(third.text_content(), "hello!");
    Ok(())
}

#[test]
fn custom_leaf_renderer_receives_attributes_and_leaf() -> anyhow::Result<()> {
    let host = HeadlessHost::new();
    let editor = EditorHandle::new(Editor::empty());
    let _scope = EditorScope::enter(&editor);
    let mut memo = MemoLeaf::mount(host.as_platform(), &ViewConfig::new())?;

    let bold_as_strong = RenderLeaf::new(|props| {
        let tag = if props.leaf.marks.is_active("bold") { "strong" } else { "span" };
        VNode::element(tag)
            .attrs(props.attributes)
            .attr("data-text-len", props.text.text.len())
            .child(props.children)
            .build()
    });
    let out = memo.render(base_props().render_leaf(Some(bold_as_strong)));

    let el = out.as_element().expect("leaf root is an element");
    assert_eq!(el.tag, "strong");
    assert!(el.has_flag("data-slate-leaf"));
    assert_eq!(el.attr("data-text-len"), Some(&json!(5)));
    Ok(())
}
