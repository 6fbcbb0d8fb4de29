//! Auth-state fan-out shared by the identity adapters

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::AuthUser;

/// Callback receiving the signed-in user, or `None` after sign-out
pub type AuthListener = Rc<dyn Fn(Option<&AuthUser>)>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    listeners: Vec<(u64, AuthListener)>,
}

/// Listener registry for auth-state transitions
#[derive(Clone, Default)]
pub struct AuthStateHub {
    inner: Rc<RefCell<HubInner>>,
}

impl AuthStateHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` and deliver `current` to it immediately
    pub fn subscribe(&self, listener: AuthListener, current: Option<&AuthUser>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Rc::clone(&listener)));
            id
        };

        listener(current);

        Subscription {
            hub: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Deliver a transition to every registered listener
    pub fn notify(&self, user: Option<&AuthUser>) {
        let listeners: Vec<AuthListener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();

        for listener in listeners {
            listener(user);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Keeps an auth-state listener registered; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    hub: Weak<RefCell<HubInner>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(uid: &str) -> AuthUser {
        AuthUser {
            uid: uid.to_string(),
            email: format!("{}@example.com", uid),
            display_name: None,
            photo_url: None,
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<Option<String>>>>, AuthListener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let listener: AuthListener = Rc::new(move |user: Option<&AuthUser>| {
            seen_clone.borrow_mut().push(user.map(|u| u.uid.clone()));
        });
        (seen, listener)
    }

    #[test]
    fn test_subscribe_delivers_current_state() {
        let hub = AuthStateHub::new();
        let (seen, listener) = recorder();
        let _sub = hub.subscribe(listener, Some(&user("u1")));
        assert_eq!(*seen.borrow(), vec![Some("u1".to_string())]);
    }

    #[test]
    fn test_notify_and_unsubscribe_on_drop() {
        let hub = AuthStateHub::new();
        let (seen, listener) = recorder();
        let sub = hub.subscribe(listener, None);

        hub.notify(Some(&user("u2")));
        assert_eq!(hub.listener_count(), 1);

        drop(sub);
        assert_eq!(hub.listener_count(), 0);
        hub.notify(None);

        assert_eq!(*seen.borrow(), vec![None, Some("u2".to_string())]);
    }
}
