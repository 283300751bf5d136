use plate_core::{Document, Editor, Node};
use plate_view::{
    EditorHandle, Editable, ElementVNode, HeadlessHost, RenderLeaf, VNode, ViewConfig,
    current_editor, min_height_rule,
};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn placeholders(root: &VNode) -> Vec<&ElementVNode> {
    root.find_all(&|el| el.has_flag("data-slate-placeholder"))
}

fn leaves(root: &VNode) -> Vec<&ElementVNode> {
    root.find_all(&|el| el.has_flag("data-slate-leaf"))
}

#[test]
fn empty_editor_reserves_placeholder_height() -> anyhow::Result<()> {
    init_tracing();
    let host = HeadlessHost::new();
    let editor = EditorHandle::new(Editor::empty());
    let mut editable = Editable::new(
        editor.clone(),
        host.clone(),
        ViewConfig::new().placeholder("Enter some rich text…"),
    );

    let root = editable.update()?;
    let surface = root.as_element().unwrap();
    assert_eq!(
        surface.attr("data-slate-editor-id"),
        Some(&json!(editor.id().0))
    );
    assert_eq!(placeholders(&root).len(), 1);
    assert!(current_editor().is_err(), "scope ends with the pass");

    let el = editor.placeholder_element().expect("placeholder registered");
    host.set_client_height(el, 48.0);
    host.flush();
    assert_eq!(
        editable.style_element().css(),
        min_height_rule(editor.id(), 48.0, true)
    );
    Ok(())
}

#[test]
fn unchanged_pass_reuses_leaf_output() -> anyhow::Result<()> {
    let host = HeadlessHost::new();
    let doc = Document {
        children: vec![Node::paragraph("one"), Node::paragraph("two")],
    };
    let editor = EditorHandle::new(Editor::new(doc));
    let mut editable = Editable::new(editor.clone(), host.clone(), ViewConfig::new());

    let first = editable.update()?;
    let second = editable.update()?;
    let (a, b) = (leaves(&first), leaves(&second));
    assert_eq!(a.len(), 2);
    assert!(a.iter().zip(&b).all(|(x, y)| std::ptr::eq(*x, *y)));

    // Editing the second paragraph repaints only its leaf.
    editor.model_mut().set_doc(Document {
        children: vec![Node::paragraph("one"), Node::paragraph("two!")],
    });
    let third = editable.update()?;
    let c = leaves(&third);
    assert!(std::ptr::eq(a[0], c[0]));
    assert!(!std::ptr::eq(a[1], c[1]));
    assert_eq!(third.text_content(), "onetwo!");
    Ok(())
}

#[test]
fn typing_removes_placeholder_and_min_height() -> anyhow::Result<()> {
    let host = HeadlessHost::new();
    let editor = EditorHandle::new(Editor::empty());
    let mut editable = Editable::new(
        editor.clone(),
        host.clone(),
        ViewConfig::new().placeholder("Write…"),
    );

    editable.update()?;
    let el = editor.placeholder_element().unwrap();
    host.set_client_height(el, 36.0);
    host.flush();
    assert!(!editable.style_element().css().is_empty());

    editor.model_mut().set_doc(Document {
        children: vec![Node::paragraph("h")],
    });
    let root = editable.update()?;
    assert!(placeholders(&root).is_empty());
    assert_eq!(editor.placeholder_element(), None);
    assert_eq!(editable.style_element().css(), "");
    assert_eq!(host.active_observers(), 0);

    // Clearing the text brings the placeholder back with a fresh element.
    editor.model_mut().set_doc(Document {
        children: vec![Node::paragraph("")],
    });
    editable.update()?;
    let again = editor.placeholder_element().unwrap();
    assert_ne!(again, el);
    host.set_client_height(again, 36.0);
    host.flush();
    assert_eq!(
        editable.style_element().css(),
        min_height_rule(editor.id(), 36.0, true)
    );
    Ok(())
}

#[test]
fn dropping_the_surface_detaches_editor_state() -> anyhow::Result<()> {
    let host = HeadlessHost::new();
    let editor = EditorHandle::new(Editor::empty());
    let mut editable = Editable::new(
        editor.clone(),
        host.clone(),
        ViewConfig::new().placeholder("…").csp_nonce("abc123"),
    );
    editable.update()?;
    assert_eq!(editable.style_element().nonce().as_deref(), Some("abc123"));
    assert!(editor.style_element().is_some());
    assert!(editor.placeholder_element().is_some());

    drop(editable);
    assert!(editor.style_element().is_none());
    assert!(editor.placeholder_element().is_none());
    assert_eq!(host.active_observers(), 0);
    Ok(())
}

#[test]
fn surface_renders_marks_through_custom_leaf() -> anyhow::Result<()> {
    let mut editable = Editable::load(
        r#"[{"node":"element","kind":"paragraph","children":[
            {"node":"text","text":"plain "},
            {"node":"text","text":"bold","bold":true}
        ]}]"#,
        HeadlessHost::new(),
        ViewConfig::new().placeholder("Write…"),
    )?
    .render_leaf(
        RenderLeaf::new(|props| {
            let tag = if props.leaf.marks.is_active("bold") { "strong" } else { "span" };
            VNode::element(tag)
                .attrs(props.attributes)
                .child(props.children)
                .build()
        }),
    );

    let root = editable.update()?;
    let tags: Vec<_> = leaves(&root).iter().map(|el| el.tag.clone()).collect();
    assert_eq!(tags, vec!["span", "strong"]);
    assert!(editable.leaf(&[0, 1], 0).is_some());
    assert!(editable.leaf(&[0, 2], 0).is_none());

    // Non-empty documents never get a placeholder, even when configured.
    assert!(placeholders(&root).is_empty());
    Ok(())
}

#[test]
fn two_editors_keep_separate_state() -> anyhow::Result<()> {
    let (host_a, host_b) = (HeadlessHost::new(), HeadlessHost::new());
    let a = EditorHandle::new(Editor::empty());
    let b = EditorHandle::new(Editor::empty());
    let config = ViewConfig::new().placeholder("…");
    let mut first = Editable::new(a.clone(), host_a.clone(), config.clone());
    let mut second = Editable::new(b.clone(), host_b.clone(), config);

    first.update()?;
    second.update()?;

    host_a.set_client_height(a.placeholder_element().unwrap(), 10.0);
    host_b.set_client_height(b.placeholder_element().unwrap(), 20.0);
    host_a.flush();
    host_b.flush();
    assert_eq!(first.style_element().css(), min_height_rule(a.id(), 10.0, true));
    assert_eq!(second.style_element().css(), min_height_rule(b.id(), 20.0, true));
    assert!(!first.style_element().ptr_eq(second.style_element()));
    Ok(())
}

#[test]
fn saved_surface_reloads_with_same_content() -> anyhow::Result<()> {
    let editor = EditorHandle::new(Editor::empty());
    let mut editable = Editable::new(editor.clone(), HeadlessHost::new(), ViewConfig::new());
    editor.model_mut().set_doc(Document {
        children: vec![Node::paragraph("draft"), Node::paragraph("")],
    });
    let before = editable.update()?;
    let saved = editable.save()?;
    drop(editable);

    let mut reloaded = Editable::load(&saved, HeadlessHost::new(), ViewConfig::new())?;
    assert_ne!(reloaded.editor().id(), editor.id());
    assert_eq!(reloaded.editor().model().doc(), editor.model().doc());
    let after = reloaded.update()?;
    assert_eq!(after.text_content(), before.text_content());
    Ok(())
}
