use plate_core::Editor;
use plate_view::{
    EditorHandle, EditorScope, HeadlessHost, LeafView, ScopeError, ViewConfig, current_editor,
    current_editor_with_version, expect_editor, with_editor_scope,
};

#[test]
fn accessor_outside_scope_is_an_error() {
    let err = current_editor().unwrap_err();
    assert_eq!(err, ScopeError::NoEditorScope);
    assert!(err.to_string().contains("EditorScope"));
}

#[test]
fn leaf_cannot_mount_outside_scope() {
    let host = HeadlessHost::new();
    let result = LeafView::mount(host.as_platform(), &ViewConfig::new());
    assert!(matches!(result, Err(ScopeError::NoEditorScope)));
}

#[test]
fn scopes_nest_and_unwind() {
    let outer = EditorHandle::new(Editor::empty());
    let inner = EditorHandle::new(Editor::empty());
    assert_ne!(outer.id(), inner.id());

    {
        let _outer = EditorScope::enter_with_version(&outer, 3);
        let (editor, version) = current_editor_with_version().unwrap();
        assert!(editor.ptr_eq(&outer));
        assert_eq!(version, 3);

        with_editor_scope(&inner, || {
            assert!(current_editor().unwrap().ptr_eq(&inner));
        });

        assert!(current_editor().unwrap().ptr_eq(&outer));
    }

    assert!(current_editor().is_err());
}

#[test]
#[should_panic(expected = "EditorScope")]
fn expect_editor_panics_without_scope() {
    let _ = expect_editor();
}

#[test]
fn weak_editor_does_not_keep_editor_alive() {
    let editor = EditorHandle::new(Editor::empty());
    let weak = editor.downgrade();
    assert_eq!(weak.id(), editor.id());
    assert!(weak.upgrade().is_some());
    drop(editor);
    assert!(weak.upgrade().is_none());
}

#[test]
fn guards_dropped_out_of_order_remove_their_own_frame() {
    let a = EditorHandle::new(Editor::empty());
    let b = EditorHandle::new(Editor::empty());

    let guard_a = EditorScope::enter(&a);
    let guard_b = EditorScope::enter(&b);
    drop(guard_a);
    assert!(current_editor().unwrap().ptr_eq(&b));

    drop(guard_b);
    assert!(current_editor().is_err());
}
