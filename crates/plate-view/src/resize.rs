use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::dom::ElementId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEntry {
    pub target: ElementId,
    pub client_height: f32,
}

/// Invoked with the batch of size changes seen since the last delivery.
pub type ResizeCallback = Rc<dyn Fn(&[ResizeEntry])>;

/// A subscription to the rendered size of at most one element.
///
/// `disconnect` is idempotent. A disconnected observer stays disconnected:
/// later `observe` calls are ignored and its callback never fires again.
pub trait ResizeObserver {
    fn observe(&mut self, target: ElementId);
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
}

/// The host rendering engine, as far as measurement is concerned.
pub trait Platform {
    /// The host's own measurement facility, if it has one.
    fn native_resize_observer(&self, _callback: ResizeCallback) -> Option<Box<dyn ResizeObserver>> {
        None
    }

    /// Current laid-out content height of a mounted element.
    fn client_height(&self, element: ElementId) -> Option<f32>;

    /// Whether `client_height` returns anything at all. The polyfill is only
    /// usable when this holds.
    fn can_measure(&self) -> bool {
        true
    }

    fn supports_where_selector(&self) -> bool {
        true
    }
}

/// Native facility first, then the polling polyfill. `None` means the
/// platform cannot measure at all and callers should skip height syncing.
pub fn create_resize_observer(
    platform: &dyn Platform,
    callback: ResizeCallback,
) -> Option<Box<dyn ResizeObserver>> {
    if let Some(observer) = platform.native_resize_observer(callback.clone()) {
        return Some(observer);
    }
    if platform.can_measure() {
        tracing::debug!("native resize observer unavailable, using polyfill");
        return Some(Box::new(PolyfillResizeObserver::new(callback)));
    }
    tracing::warn!("platform cannot measure elements; placeholder height sync disabled");
    None
}

struct PolyfillState {
    target: Option<ElementId>,
    last_height: Option<f32>,
    /// `None` once disconnected.
    callback: Option<ResizeCallback>,
}

thread_local! {
    static POLYFILLS: RefCell<Vec<Weak<RefCell<PolyfillState>>>> = const { RefCell::new(Vec::new()) };
}

/// Drop-in replacement for hosts without a native facility. Heights are
/// sampled by [`poll_polyfill_observers`], which the host calls once per frame.
pub struct PolyfillResizeObserver {
    state: Rc<RefCell<PolyfillState>>,
}

impl PolyfillResizeObserver {
    pub fn new(callback: ResizeCallback) -> Self {
        let state = Rc::new(RefCell::new(PolyfillState {
            target: None,
            last_height: None,
            callback: Some(callback),
        }));
        POLYFILLS.with(|all| all.borrow_mut().push(Rc::downgrade(&state)));
        Self { state }
    }
}

impl ResizeObserver for PolyfillResizeObserver {
    fn observe(&mut self, target: ElementId) {
        let mut state = self.state.borrow_mut();
        if state.callback.is_none() {
            tracing::warn!(element = target.0, "observe on a disconnected polyfill observer ignored");
            return;
        }
        if state.target != Some(target) {
            state.target = Some(target);
            state.last_height = None;
        }
    }

    fn disconnect(&mut self) {
        let callback = {
            let mut state = self.state.borrow_mut();
            state.target = None;
            state.callback.take()
        };
        drop(callback);
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().callback.is_some()
    }
}

impl Drop for PolyfillResizeObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Samples every live polyfill observer and notifies those whose target
/// height changed (or was never sampled).
pub fn poll_polyfill_observers(platform: &dyn Platform) {
    let live: Vec<Rc<RefCell<PolyfillState>>> = POLYFILLS.with(|all| {
        let mut all = all.borrow_mut();
        all.retain(|weak| weak.strong_count() > 0);
        all.iter().filter_map(Weak::upgrade).collect()
    });

    for state in live {
        // Checked per observer, after earlier callbacks in this poll ran.
        let (callback, entry) = {
            let mut state = state.borrow_mut();
            let Some(callback) = state.callback.clone() else {
                continue;
            };
            let Some(target) = state.target else {
                continue;
            };
            let Some(height) = platform.client_height(target) else {
                continue;
            };
            if state.last_height == Some(height) {
                continue;
            }
            state.last_height = Some(height);
            (
                callback,
                ResizeEntry {
                    target,
                    client_height: height,
                },
            )
        };
        callback(&[entry]);
    }
}
