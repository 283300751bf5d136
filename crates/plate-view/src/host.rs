use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::dom::{ElementId, NodeRef, VNode, VNodeKind};
use crate::resize::{
    Platform, ResizeCallback, ResizeEntry, ResizeObserver, poll_polyfill_observers,
};

/// A rendering engine the editable surface can commit visual trees to.
pub trait Host: Platform {
    fn commit(&self, root: &VNode);
}

/// An in-memory rendering host.
///
/// Only elements that carry a [`NodeRef`] get an identity; that is all the
/// leaf layer ever needs to address. Layout is simulated through
/// [`HeadlessHost::set_client_height`], and resize notifications are queued
/// until [`HeadlessHost::flush`], the host's "next turn".
#[derive(Clone)]
pub struct HeadlessHost {
    inner: Rc<HostInner>,
}

struct HostInner {
    native_observer: bool,
    measurable: bool,
    where_selector: bool,
    next_element: Cell<u64>,
    next_observer: Cell<u64>,
    mounted: RefCell<BTreeMap<ElementId, MountedElement>>,
    /// Connected subscriptions only; disconnecting removes the entry.
    observers: RefCell<BTreeMap<ObserverId, NativeObserverState>>,
    queue: RefCell<Vec<(ObserverId, ResizeEntry)>>,
}

struct MountedElement {
    tag: String,
    node_ref: NodeRef,
    client_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ObserverId(u64);

struct NativeObserverState {
    target: Option<ElementId>,
    callback: ResizeCallback,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::build(true, true)
    }

    /// A host whose measurement has to go through the polyfill.
    pub fn without_native_observer() -> Self {
        Self::build(false, true)
    }

    /// A host that can neither observe nor measure.
    pub fn without_measurement() -> Self {
        Self::build(false, false)
    }

    fn build(native_observer: bool, measurable: bool) -> Self {
        Self {
            inner: Rc::new(HostInner {
                native_observer,
                measurable,
                where_selector: true,
                next_element: Cell::new(1),
                next_observer: Cell::new(1),
                mounted: RefCell::new(BTreeMap::new()),
                observers: RefCell::new(BTreeMap::new()),
                queue: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn as_platform(&self) -> Rc<dyn Platform> {
        Rc::new(self.clone())
    }

    /// Mounts `root`. Elements whose ref already points at a mounted element
    /// keep that element; everything no longer referenced is unmounted and
    /// its ref cleared.
    pub fn commit(&self, root: &VNode) {
        let mut seen = Vec::new();
        self.mount(root, &mut seen);

        let mut mounted = self.inner.mounted.borrow_mut();
        let stale: Vec<ElementId> = mounted
            .keys()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();
        for id in stale {
            if let Some(el) = mounted.remove(&id) {
                if el.node_ref.get() == Some(id) {
                    el.node_ref.set(None);
                }
                tracing::trace!(element = id.0, tag = %el.tag, "unmounted");
            }
        }
    }

    fn mount(&self, node: &VNode, seen: &mut Vec<ElementId>) {
        match node.kind() {
            VNodeKind::Text(_) => {}
            VNodeKind::Fragment(children) => {
                for child in children {
                    self.mount(child, seen);
                }
            }
            VNodeKind::Element(el) => {
                if let Some(node_ref) = &el.node_ref {
                    let existing = node_ref
                        .get()
                        .filter(|id| self.inner.mounted.borrow().contains_key(id));
                    let id = match existing {
                        Some(id) => id,
                        None => {
                            let id = ElementId(self.inner.next_element.get());
                            self.inner.next_element.set(id.0 + 1);
                            self.inner.mounted.borrow_mut().insert(
                                id,
                                MountedElement {
                                    tag: el.tag.clone(),
                                    node_ref: node_ref.clone(),
                                    client_height: 0.0,
                                },
                            );
                            node_ref.set(Some(id));
                            tracing::trace!(element = id.0, tag = %el.tag, "mounted");
                            id
                        }
                    };
                    seen.push(id);
                }
                for child in &el.children {
                    self.mount(child, seen);
                }
            }
        }
    }

    pub fn is_mounted(&self, element: ElementId) -> bool {
        self.inner.mounted.borrow().contains_key(&element)
    }

    /// Simulates a layout change; observers of `element` are notified on the next flush.
    pub fn set_client_height(&self, element: ElementId, height: f32) {
        {
            let mut mounted = self.inner.mounted.borrow_mut();
            let Some(el) = mounted.get_mut(&element) else {
                return;
            };
            if el.client_height == height {
                return;
            }
            el.client_height = height;
        }
        let observers = self.inner.observers.borrow();
        let mut queue = self.inner.queue.borrow_mut();
        for (id, observer) in observers.iter() {
            if observer.target == Some(element) {
                queue.push((
                    *id,
                    ResizeEntry {
                        target: element,
                        client_height: height,
                    },
                ));
            }
        }
    }

    /// Delivers pending resize notifications. Returns how many were delivered.
    pub fn flush(&self) -> usize {
        let pending = std::mem::take(&mut *self.inner.queue.borrow_mut());
        let mut delivered = 0;
        for (id, entry) in pending {
            let callback = self
                .inner
                .observers
                .borrow()
                .get(&id)
                .filter(|o| o.target == Some(entry.target))
                .map(|o| o.callback.clone());
            if let Some(callback) = callback {
                callback(&[entry]);
                delivered += 1;
            }
        }
        if !self.inner.native_observer && self.inner.measurable {
            poll_polyfill_observers(self);
        }
        delivered
    }

    /// Number of native subscriptions still connected.
    pub fn active_observers(&self) -> usize {
        self.inner.observers.borrow().len()
    }
}

impl Host for HeadlessHost {
    fn commit(&self, root: &VNode) {
        HeadlessHost::commit(self, root);
    }
}

impl Platform for HeadlessHost {
    fn native_resize_observer(&self, callback: ResizeCallback) -> Option<Box<dyn ResizeObserver>> {
        if !self.inner.native_observer {
            return None;
        }
        let id = ObserverId(self.inner.next_observer.get());
        self.inner.next_observer.set(id.0 + 1);
        self.inner.observers.borrow_mut().insert(
            id,
            NativeObserverState {
                target: None,
                callback,
            },
        );
        Some(Box::new(HeadlessResizeObserver {
            host: Rc::downgrade(&self.inner),
            id,
        }))
    }

    fn client_height(&self, element: ElementId) -> Option<f32> {
        if !self.inner.measurable {
            return None;
        }
        self.inner
            .mounted
            .borrow()
            .get(&element)
            .map(|el| el.client_height)
    }

    fn can_measure(&self) -> bool {
        self.inner.measurable
    }

    fn supports_where_selector(&self) -> bool {
        self.inner.where_selector
    }
}

struct HeadlessResizeObserver {
    host: Weak<HostInner>,
    id: ObserverId,
}

impl ResizeObserver for HeadlessResizeObserver {
    fn observe(&mut self, target: ElementId) {
        let Some(host) = self.host.upgrade() else {
            return;
        };
        let mut observers = host.observers.borrow_mut();
        let Some(state) = observers.get_mut(&self.id) else {
            tracing::warn!(element = target.0, "observe on a disconnected observer ignored");
            return;
        };
        state.target = Some(target);
        // Observation always starts with one report of the current size.
        let height = host
            .mounted
            .borrow()
            .get(&target)
            .map(|el| el.client_height);
        if let Some(client_height) = height {
            host.queue.borrow_mut().push((
                self.id,
                ResizeEntry {
                    target,
                    client_height,
                },
            ));
        }
    }

    fn disconnect(&mut self) {
        let Some(host) = self.host.upgrade() else {
            return;
        };
        // Drop the callback only after the borrow is released.
        let removed = host.observers.borrow_mut().remove(&self.id);
        drop(removed);
    }

    fn is_connected(&self) -> bool {
        let Some(host) = self.host.upgrade() else {
            return false;
        };
        host.observers.borrow().contains_key(&self.id)
    }
}

impl Drop for HeadlessResizeObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}
