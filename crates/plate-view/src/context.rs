use std::cell::{Cell, Ref, RefCell, RefMut};
use std::marker::PhantomData;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use plate_core::Editor;

use crate::dom::ElementId;
use crate::error::ScopeError;
use crate::style::StyleElement;

static NEXT_EDITOR_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditorId(pub u64);

/// Shared handle to a live editor and the view state keyed by it.
///
/// The placeholder element and style element registrations live on the
/// editor itself, so they go away with the last handle and never need a
/// separate cleanup.
#[derive(Clone)]
pub struct EditorHandle {
    inner: Rc<EditorInner>,
}

struct EditorInner {
    id: EditorId,
    model: RefCell<Editor>,
    placeholder_element: Cell<Option<ElementId>>,
    style_element: RefCell<Option<StyleElement>>,
}

impl EditorHandle {
    pub fn new(model: Editor) -> Self {
        let id = EditorId(NEXT_EDITOR_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Rc::new(EditorInner {
                id,
                model: RefCell::new(model),
                placeholder_element: Cell::new(None),
                style_element: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> EditorId {
        self.inner.id
    }

    pub fn model(&self) -> Ref<'_, Editor> {
        self.inner.model.borrow()
    }

    pub fn model_mut(&self) -> RefMut<'_, Editor> {
        self.inner.model.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &EditorHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakEditor {
        WeakEditor {
            id: self.inner.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn placeholder_element(&self) -> Option<ElementId> {
        self.inner.placeholder_element.get()
    }

    pub(crate) fn set_placeholder_element(&self, element: ElementId) {
        self.inner.placeholder_element.set(Some(element));
    }

    /// Clears the registration only if it still points at `element`, so a leaf
    /// never erases another leaf's registration.
    pub(crate) fn release_placeholder_element(&self, element: ElementId) -> bool {
        if self.inner.placeholder_element.get() == Some(element) {
            self.inner.placeholder_element.set(None);
            true
        } else {
            false
        }
    }

    pub fn style_element(&self) -> Option<StyleElement> {
        self.inner.style_element.borrow().clone()
    }

    pub fn set_style_element(&self, element: Option<StyleElement>) {
        *self.inner.style_element.borrow_mut() = element;
    }
}

impl std::fmt::Debug for EditorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorHandle")
            .field("id", &self.inner.id)
            .field("placeholder_element", &self.inner.placeholder_element.get())
            .finish_non_exhaustive()
    }
}

/// Non-owning editor reference held by measurement callbacks.
#[derive(Clone)]
pub struct WeakEditor {
    id: EditorId,
    inner: Weak<EditorInner>,
}

impl WeakEditor {
    pub fn id(&self) -> EditorId {
        self.id
    }

    pub fn upgrade(&self) -> Option<EditorHandle> {
        self.inner.upgrade().map(|inner| EditorHandle { inner })
    }
}

struct ScopeFrame {
    id: u64,
    editor: EditorHandle,
    version: u64,
}

thread_local! {
    static SCOPES: RefCell<Vec<ScopeFrame>> = const { RefCell::new(Vec::new()) };
    static NEXT_FRAME: Cell<u64> = const { Cell::new(1) };
}

/// The live-context lifetime during which [`current_editor`] is valid.
pub struct EditorScope;

impl EditorScope {
    pub fn enter(editor: &EditorHandle) -> ScopeGuard {
        Self::enter_with_version(editor, 0)
    }

    pub fn enter_with_version(editor: &EditorHandle, version: u64) -> ScopeGuard {
        let frame = NEXT_FRAME.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        SCOPES.with(|scopes| {
            scopes.borrow_mut().push(ScopeFrame {
                id: frame,
                editor: editor.clone(),
                version,
            })
        });
        ScopeGuard {
            frame,
            _not_send: PhantomData,
        }
    }
}

/// Removes its own scope frame when dropped, wherever that frame sits in the
/// stack. Frames entered later stay live.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard {
    frame: u64,
    _not_send: PhantomData<Rc<()>>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let removed = SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            let ix = scopes.iter().rposition(|frame| frame.id == self.frame)?;
            Some(scopes.remove(ix))
        });
        if removed.is_none() {
            tracing::warn!(frame = self.frame, "scope frame already gone");
        }
    }
}

/// Runs `f` with `editor` as the current editor.
pub fn with_editor_scope<R>(editor: &EditorHandle, f: impl FnOnce() -> R) -> R {
    let _guard = EditorScope::enter(editor);
    f()
}

/// The editor of the innermost live scope.
pub fn current_editor() -> Result<EditorHandle, ScopeError> {
    current_editor_with_version().map(|(editor, _)| editor)
}

/// The editor of the innermost live scope and the pass counter it was entered with.
pub fn current_editor_with_version() -> Result<(EditorHandle, u64), ScopeError> {
    SCOPES.with(|scopes| {
        scopes
            .borrow()
            .last()
            .map(|frame| (frame.editor.clone(), frame.version))
            .ok_or(ScopeError::NoEditorScope)
    })
}

/// Like [`current_editor`], for call sites where a missing scope is a bug.
#[track_caller]
pub fn expect_editor() -> EditorHandle {
    match current_editor() {
        Ok(editor) => editor,
        Err(err) => panic!("{err}"),
    }
}
