//! Event dispatch from DOM callbacks into the player
//!
//! DOM listeners and hls.js callbacks fire while nothing in Rust holds the
//! player, but they must never re-enter it directly. They enqueue instead,
//! and a single microtask drains the queue into the player.

use playdeck_core::{ListenerId, MediaEvent};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// Queue of media events awaiting delivery
pub struct Dispatcher {
    queue: RefCell<VecDeque<(ListenerId, MediaEvent)>>,
    scheduled: Rc<Cell<bool>>,
    pump: RefCell<Option<Closure<dyn FnMut(JsValue)>>>,
}

impl Dispatcher {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            queue: RefCell::new(VecDeque::new()),
            scheduled: Rc::new(Cell::new(false)),
            pump: RefCell::new(None),
        })
    }

    /// Install the drain callback. `deliver` runs once per pump; it returns
    /// false when the player is busy, leaving the queue for the next pump.
    pub fn set_pump<F>(self: &Rc<Self>, mut deliver: F)
    where
        F: FnMut(&Dispatcher) -> bool + 'static,
    {
        let dispatcher = Rc::downgrade(self);
        let scheduled = Rc::clone(&self.scheduled);
        let pump = Closure::<dyn FnMut(JsValue)>::new(move |_: JsValue| {
            scheduled.set(false);
            let Some(dispatcher) = dispatcher.upgrade() else {
                return;
            };
            if !deliver(&dispatcher) {
                dispatcher.schedule();
            }
        });
        *self.pump.borrow_mut() = Some(pump);
        if !self.queue.borrow().is_empty() {
            self.schedule();
        }
    }

    pub fn push(&self, listener: ListenerId, event: MediaEvent) {
        self.queue.borrow_mut().push_back((listener, event));
        self.schedule();
    }

    pub fn pop(&self) -> Option<(ListenerId, MediaEvent)> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    fn schedule(&self) {
        if self.scheduled.get() {
            return;
        }
        if let Some(pump) = self.pump.borrow().as_ref() {
            self.scheduled.set(true);
            let _ = js_sys::Promise::resolve(&JsValue::UNDEFINED).then(pump);
        }
    }
}
