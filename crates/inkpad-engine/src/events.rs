//! Single-threaded observables and the events a host feeds the editor.
//!
//! A [`Listeners`] set hands out [`Subscription`] guards; dropping a guard
//! removes its callback. Callbacks may subscribe, unsubscribe or emit again
//! while an emit is in progress: changes to the set apply to later emits.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::editing::selection::SelectionRange;

new_key_type! {
    /// Identifies one registered callback.
    pub struct ListenerId;
}

type Callback<E> = Box<dyn FnMut(&E)>;

struct Registry<E> {
    // `None` while the callback is running
    slots: SlotMap<ListenerId, Option<Callback<E>>>,
}

/// A set of callbacks interested in events of type `E`.
///
/// Cloning yields another handle to the same set.
pub struct Listeners<E: 'static> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E: 'static> Listeners<E> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                slots: SlotMap::with_key(),
            })),
        }
    }

    /// Registers `callback` until the returned guard is dropped.
    #[must_use = "the listener is removed as soon as the subscription is dropped"]
    pub fn subscribe(&self, callback: impl FnMut(&E) + 'static) -> Subscription {
        let id = self
            .registry
            .borrow_mut()
            .slots
            .insert(Some(Box::new(callback)));
        let registry: Weak<RefCell<Registry<E>>> = Rc::downgrade(&self.registry);
        Subscription {
            id,
            release: Some(Box::new(move |id| {
                if let Some(registry) = registry.upgrade() {
                    let removed = registry.borrow_mut().slots.remove(id);
                    // Run the callback's destructor outside the borrow
                    drop(removed);
                }
            })),
        }
    }

    /// Calls every listener registered when the emit starts.
    pub fn emit(&self, event: &E) {
        let ids: Vec<ListenerId> = self.registry.borrow().slots.keys().collect();
        for id in ids {
            let taken = self
                .registry
                .borrow_mut()
                .slots
                .get_mut(id)
                .and_then(Option::take);
            let Some(mut callback) = taken else {
                continue;
            };
            callback(event);
            let leftover = match self.registry.borrow_mut().slots.get_mut(id) {
                Some(slot) => {
                    *slot = Some(callback);
                    None
                }
                // Unsubscribed while running
                None => Some(callback),
            };
            drop(leftover);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<E: 'static> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}

/// Keeps a callback registered. Dropping it unsubscribes, including while a
/// panic unwinds.
pub struct Subscription {
    id: ListenerId,
    release: Option<Box<dyn FnOnce(ListenerId)>>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Unsubscribes now. Same as dropping the guard.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Subscription").field(&self.id).finish()
    }
}

/// What a pointer event landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Surface,
    Toolbar,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    /// A modifier pressed on its own.
    Shift,
    Control,
    Other,
}

impl Key {
    /// Keys that only move the caret or extend the selection.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Key::Left
                | Key::Right
                | Key::Up
                | Key::Down
                | Key::Home
                | Key::End
                | Key::PageUp
                | Key::PageDown
                | Key::Shift
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
    /// Whether keyboard focus was inside the editable surface.
    pub inside_surface: bool,
}

impl KeyInput {
    pub fn new(key: Key, shift: bool, inside_surface: bool) -> Self {
        Self {
            key,
            shift,
            inside_surface,
        }
    }
}

/// Events a host dispatches, in the order its platform delivers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// The global selection changed. `None` when nothing is selected.
    SelectionChange(Option<SelectionRange>),
    PointerDown { target: PointerTarget },
    /// A click finished; `collapsed` describes the selection it left.
    Click {
        target: PointerTarget,
        collapsed: bool,
    },
    KeyDown(KeyInput),
}

/// The process-wide source of selection, pointer and key events.
pub type SelectionEvents = Listeners<EditorEvent>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_emit_reaches_every_listener() {
        let listeners = Listeners::<u32>::new();
        let total = Rc::new(Cell::new(0));

        let first = {
            let total = Rc::clone(&total);
            listeners.subscribe(move |n| total.set(total.get() + n))
        };
        let second = {
            let total = Rc::clone(&total);
            listeners.subscribe(move |n| total.set(total.get() + n * 10))
        };

        listeners.emit(&2);

        assert_eq!(total.get(), 22);
        assert_eq!(listeners.len(), 2);
        drop((first, second));
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let listeners = Listeners::<()>::new();
        let calls = Rc::new(Cell::new(0));

        let subscription = {
            let calls = Rc::clone(&calls);
            listeners.subscribe(move |_| calls.set(calls.get() + 1))
        };
        listeners.emit(&());
        drop(subscription);
        listeners.emit(&());

        assert_eq!(calls.get(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_cancel_unsubscribes_immediately() {
        let listeners = Listeners::<()>::new();
        let calls = Rc::new(Cell::new(0));
        let subscription = {
            let calls = Rc::clone(&calls);
            listeners.subscribe(move |_| calls.set(calls.get() + 1))
        };

        subscription.cancel();
        listeners.emit(&());

        assert_eq!(calls.get(), 0);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_listener_can_unsubscribe_itself_during_emit() {
        let listeners = Listeners::<()>::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let subscription = {
            let slot = Rc::clone(&slot);
            let calls = Rc::clone(&calls);
            listeners.subscribe(move |_| {
                calls.set(calls.get() + 1);
                slot.borrow_mut().take();
            })
        };
        *slot.borrow_mut() = Some(subscription);

        listeners.emit(&());
        listeners.emit(&());

        assert_eq!(calls.get(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_listener_added_during_emit_runs_next_time() {
        let listeners = Listeners::<()>::new();
        let added: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
        let late_calls = Rc::new(Cell::new(0));

        let _outer = {
            let handle = listeners.clone();
            let added = Rc::clone(&added);
            let late_calls = Rc::clone(&late_calls);
            listeners.subscribe(move |_| {
                if added.borrow().is_empty() {
                    let late_calls = Rc::clone(&late_calls);
                    let sub = handle.subscribe(move |_| late_calls.set(late_calls.get() + 1));
                    added.borrow_mut().push(sub);
                }
            })
        };

        listeners.emit(&());
        assert_eq!(late_calls.get(), 0);
        listeners.emit(&());
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn test_subscription_outliving_listeners_is_harmless() {
        let listeners = Listeners::<()>::new();
        let subscription = listeners.subscribe(|_| {});
        drop(listeners);
        drop(subscription);
    }

    #[test]
    fn test_navigation_keys() {
        assert!(Key::Left.is_navigation());
        assert!(Key::Shift.is_navigation());
        assert!(!Key::Char('a').is_navigation());
        assert!(!Key::Backspace.is_navigation());
    }
}
