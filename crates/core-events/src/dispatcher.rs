//! Single-threaded, ordered broadcast of actions.
//!
//! Handlers run synchronously in registration order. At most one dispatch is
//! active: a handler that tries to dispatch again gets
//! [`DispatchError::Reentrant`] and nothing runs. Registrations and
//! unregistrations made while a dispatch is running take effect from the next
//! dispatch.

use std::cell::{Cell, RefCell};
use std::error::Error;

use thiserror::Error;
use tracing::{debug, warn};

use crate::action::{Action, ActionKind};

/// Error type handlers report back to the dispatcher.
pub type HandlerError = Box<dyn Error + Send + Sync + 'static>;

type Handler = Box<dyn FnMut(&Action) -> Result<(), HandlerError>>;

/// Identifies one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("cannot dispatch `{action}` while another dispatch is running")]
    Reentrant { action: ActionKind },
    #[error("handler {token:?} failed on `{action}`: {source}")]
    HandlerFailure {
        token: Token,
        action: ActionKind,
        #[source]
        source: HandlerError,
    },
}

#[derive(Default)]
pub struct Dispatcher {
    handlers: RefCell<Vec<(Token, Handler)>>,
    /// Tokens of the handlers moved out by the running dispatch.
    in_flight: RefCell<Vec<Token>>,
    removed_during_dispatch: RefCell<Vec<Token>>,
    dispatching: Cell<bool>,
    next_token: Cell<u64>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, handler: F) -> Token
    where
        F: FnMut(&Action) -> Result<(), HandlerError> + 'static,
    {
        let token = Token(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.handlers.borrow_mut().push((token, Box::new(handler)));
        debug!(target: "dispatch", ?token, deferred = self.dispatching.get(), "handler_registered");
        token
    }

    /// Removes a handler. While a dispatch is running the removal is
    /// scheduled and takes effect once the dispatch returns.
    pub fn unregister(&self, token: Token) -> bool {
        if self.dispatching.get() {
            let known = self.live_tokens().any(|t| t == token);
            if known {
                self.removed_during_dispatch.borrow_mut().push(token);
            }
            return known;
        }
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(t, _)| *t != token);
        before != handlers.len()
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }

    /// Number of handlers that will see the next dispatch, including
    /// registrations and removals made by a running one.
    pub fn len(&self) -> usize {
        self.live_tokens().count()
    }

    fn live_tokens(&self) -> impl Iterator<Item = Token> {
        let removed = self.removed_during_dispatch.borrow();
        let mut tokens: Vec<Token> = self.in_flight.borrow().clone();
        tokens.extend(self.handlers.borrow().iter().map(|(t, _)| *t));
        tokens.retain(|t| !removed.contains(t));
        tokens.into_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `action` to every handler. Every handler runs even when an
    /// earlier one fails; the first failure is returned afterwards.
    pub fn dispatch(&self, action: &Action) -> Result<(), DispatchError> {
        if self.dispatching.replace(true) {
            warn!(target: "dispatch", action = %action.kind(), "reentrant_dispatch_rejected");
            return Err(DispatchError::Reentrant {
                action: action.kind(),
            });
        }

        // The list is moved out so handlers may register or unregister
        // without holding a borrow across the call.
        let mut active = std::mem::take(&mut *self.handlers.borrow_mut());
        *self.in_flight.borrow_mut() = active.iter().map(|(t, _)| *t).collect();
        let mut first_failure = None;
        for (token, handler) in active.iter_mut() {
            if let Err(source) = handler(action) {
                warn!(
                    target: "dispatch",
                    token = ?token,
                    action = %action.kind(),
                    error = %source,
                    "handler_failed"
                );
                if first_failure.is_none() {
                    first_failure = Some(DispatchError::HandlerFailure {
                        token: *token,
                        action: action.kind(),
                        source,
                    });
                }
            }
        }

        self.in_flight.borrow_mut().clear();
        let added = std::mem::take(&mut *self.handlers.borrow_mut());
        active.extend(added);
        let removed = std::mem::take(&mut *self.removed_during_dispatch.borrow_mut());
        if !removed.is_empty() {
            active.retain(|(t, _)| !removed.contains(t));
        }
        *self.handlers.borrow_mut() = active;
        self.dispatching.set(false);

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> impl FnMut(&Action) -> Result<(), HandlerError> + 'static {
        let log = Rc::clone(log);
        move |action| {
            log.borrow_mut().push(format!("{name}:{}", action.kind()));
            Ok(())
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let d = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        d.register(recorder(&log, "a"));
        d.register(recorder(&log, "b"));
        d.dispatch(&Action::ClearAll).unwrap();
        d.dispatch(&Action::BusyStart).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["a:clear-all", "b:clear-all", "a:busy-start", "b:busy-start"]
        );
    }

    #[test]
    fn tokens_are_unique_and_increasing() {
        let d = Dispatcher::new();
        let a = d.register(|_| Ok(()));
        let b = d.register(|_| Ok(()));
        assert!(a < b);
        assert!(d.unregister(a));
        assert!(!d.unregister(a));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn reentrant_dispatch_is_rejected() {
        let d = Rc::new(Dispatcher::new());
        let inner = Rc::new(RefCell::new(None));
        let counter = Rc::new(Cell::new(0));
        {
            let d2 = Rc::clone(&d);
            let inner = Rc::clone(&inner);
            let counter = Rc::clone(&counter);
            d.register(move |action| {
                counter.set(counter.get() + 1);
                if matches!(action, Action::ClearAll) {
                    *inner.borrow_mut() = Some(d2.dispatch(&Action::ClearEol));
                }
                Ok(())
            });
        }
        d.dispatch(&Action::ClearAll).unwrap();
        let nested = inner.borrow_mut().take().unwrap();
        assert!(matches!(
            nested,
            Err(DispatchError::Reentrant {
                action: ActionKind::ClearEol
            })
        ));
        // The nested dispatch ran no handler.
        assert_eq!(counter.get(), 1);
        assert!(!d.is_dispatching());
    }

    #[test]
    fn failing_handler_does_not_stop_others() {
        let d = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let bad = d.register(|_| Err("boom".into()));
        d.register(recorder(&log, "after"));
        let err = d.dispatch(&Action::BusyStop).unwrap_err();
        match err {
            DispatchError::HandlerFailure { token, action, source } => {
                assert_eq!(token, bad);
                assert_eq!(action, ActionKind::BusyStop);
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(*log.borrow(), vec!["after:busy-stop"]);
    }

    #[test]
    fn registration_during_dispatch_applies_next_time() {
        let d = Rc::new(Dispatcher::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let d2 = Rc::clone(&d);
            let log = Rc::clone(&log);
            let mut registered = false;
            d.register(move |_| {
                if !registered {
                    registered = true;
                    d2.register(recorder(&log, "late"));
                }
                Ok(())
            });
        }
        d.dispatch(&Action::ClearAll).unwrap();
        assert!(log.borrow().is_empty());
        d.dispatch(&Action::ClearEol).unwrap();
        assert_eq!(*log.borrow(), vec!["late:clear-eol"]);
    }

    #[test]
    fn unregister_during_dispatch_applies_next_time() {
        let d = Rc::new(Dispatcher::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let victim = Rc::new(Cell::new(None));
        {
            let d2 = Rc::clone(&d);
            let victim = Rc::clone(&victim);
            d.register(move |_| {
                if let Some(token) = victim.take() {
                    assert!(d2.unregister(token));
                }
                Ok(())
            });
        }
        victim.set(Some(d.register(recorder(&log, "victim"))));
        d.dispatch(&Action::ClearAll).unwrap();
        d.dispatch(&Action::ClearEol).unwrap();
        assert_eq!(*log.borrow(), vec!["victim:clear-all"]);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn len_counts_pending_changes_during_dispatch() {
        let d = Rc::new(Dispatcher::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let victim = d.register(|_| Ok(()));
        {
            let d2 = Rc::clone(&d);
            let seen = Rc::clone(&seen);
            d.register(move |_| {
                seen.borrow_mut().push(d2.len());
                d2.register(|_| Ok(()));
                seen.borrow_mut().push(d2.len());
                assert!(d2.unregister(victim));
                assert!(!d2.unregister(victim));
                assert!(!d2.unregister(Token(99)));
                seen.borrow_mut().push(d2.len());
                Ok(())
            });
        }
        assert_eq!(d.len(), 2);
        d.dispatch(&Action::ClearAll).unwrap();
        assert_eq!(*seen.borrow(), vec![2, 3, 2]);
        assert_eq!(d.len(), 2);
        assert!(!d.is_empty());
    }
}
