//! A positioned DOM element together with the listeners and timers that
//! belong to it, so everything can be released in one place.
//!
//! Held by value inside the concrete actor; the gloo handle types remove
//! the listener / cancel the timer when dropped, which makes `destroy`
//! a matter of clearing collections.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement};

use crate::util::cwarn;

pub struct TrackedElement {
    name: &'static str,
    el: Option<HtmlElement>,
    x: f64,
    y: f64,
    listeners: Vec<EventListener>,
    // Shared with timeout callbacks so a fired timeout can unregister itself.
    timeouts: Rc<RefCell<HashMap<u64, Timeout>>>,
    next_timeout: u64,
}

impl TrackedElement {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            el: None,
            x: 0.0,
            y: 0.0,
            listeners: Vec::new(),
            timeouts: Rc::new(RefCell::new(HashMap::new())),
            next_timeout: 0,
        }
    }

    pub fn element(&self) -> Option<&HtmlElement> {
        self.el.as_ref()
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Build the element through `factory` and attach it under `parent` at
    /// the stored position. Spawning twice is a warning, not an error.
    /// Returns whether a new element was attached.
    pub fn spawn<F>(&mut self, parent: &Element, factory: F) -> bool
    where
        F: FnOnce(&Document) -> Option<HtmlElement>,
    {
        if self.el.is_some() {
            cwarn(&format!("{}: already spawned, ignoring", self.name));
            return false;
        }
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return false;
        };
        let Some(el) = factory(&document) else {
            return false;
        };
        apply_position(&el, self.x, self.y);
        let _ = parent.append_child(&el);
        self.el = Some(el);
        true
    }

    /// Store the coordinates and place the element directly; no interpolation.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        if let Some(el) = &self.el {
            apply_position(el, x, y);
        }
    }

    /// Subscribe and keep the handle so `destroy` removes it.
    pub fn listen<F>(&mut self, target: &EventTarget, event: &'static str, callback: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.listeners.push(EventListener::new(target, event, callback));
    }

    /// Fire-once subscription. The platform drops it after the first event,
    /// so there is nothing for `destroy` to release and it is not tracked.
    pub fn listen_once<F>(&self, target: &EventTarget, event: &'static str, callback: F)
    where
        F: FnOnce(&Event) + 'static,
    {
        EventListener::once(target, event, callback).forget();
    }

    /// One-shot delayed callback, tracked until it fires or `destroy` runs.
    pub fn schedule<F>(&mut self, delay_ms: u32, callback: F)
    where
        F: FnOnce() + 'static,
    {
        let id = self.next_timeout;
        self.next_timeout += 1;
        let slots = Rc::clone(&self.timeouts);
        let handle = Timeout::new(delay_ms, move || {
            // A fired timeout must not cancel itself from inside its own
            // callback; forget the spent handle instead.
            if let Some(spent) = slots.borrow_mut().remove(&id) {
                spent.forget();
            }
            callback();
        });
        self.timeouts.borrow_mut().insert(id, handle);
    }

    /// Release every subscription, cancel pending timeouts and detach the
    /// element. Calling this again is a no-op.
    pub fn destroy(&mut self) {
        let Some(el) = self.el.take() else {
            return;
        };
        self.listeners.clear();
        self.timeouts.borrow_mut().clear();
        el.remove();
    }
}

fn apply_position(el: &HtmlElement, x: f64, y: f64) {
    let style = el.style();
    let _ = style.set_property("left", &format!("{x}px"));
    let _ = style.set_property("top", &format!("{y}px"));
}
