//! Application callbacks attached to controls.
//!
//! A callback is a callable, a declared arity (with or without the [`Event`]
//! argument), and an optional human-readable title.  Whether it finishes
//! immediately or hands back a future is part of its [`Handler`] variant, so
//! the dispatcher never has to inspect the callable itself.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::domain::event::Event;

/// Error returned by a failing callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of running a callback to completion.
pub type CallbackResult = Result<(), CallbackError>;

type SyncFn = dyn Fn() -> CallbackResult + Send + Sync;
type SyncEventFn = dyn Fn(&Event) -> CallbackResult + Send + Sync;
type DeferredFn = dyn Fn() -> BoxFuture<'static, CallbackResult> + Send + Sync;
type DeferredEventFn = dyn Fn(Event) -> BoxFuture<'static, CallbackResult> + Send + Sync;

/// The callable, tagged by arity and execution mode.
#[derive(Clone)]
pub enum Handler {
    Sync(Arc<SyncFn>),
    SyncWithEvent(Arc<SyncEventFn>),
    Deferred(Arc<DeferredFn>),
    DeferredWithEvent(Arc<DeferredEventFn>),
}

/// A registered callback.
#[derive(Clone)]
pub struct Callback {
    title: Option<String>,
    handler: Handler,
}

impl Callback {
    /// A callback that runs to completion immediately and ignores the event.
    pub fn sync<F>(title: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> CallbackResult + Send + Sync + 'static,
    {
        Self::titled(title, Handler::Sync(Arc::new(f)))
    }

    /// A callback that runs to completion immediately and receives the event.
    pub fn sync_with_event<F>(title: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Event) -> CallbackResult + Send + Sync + 'static,
    {
        Self::titled(title, Handler::SyncWithEvent(Arc::new(f)))
    }

    /// A callback returning a future that the dispatcher runs in the background.
    pub fn deferred<F, Fut>(title: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        Self::titled(title, Handler::Deferred(Arc::new(move || f().boxed())))
    }

    /// Like [`Callback::deferred`], receiving an owned copy of the event.
    ///
    /// The copy shares liveness with the original, so a long-running callback
    /// can poll [`Event::is_active`] to notice that it has been superseded.
    pub fn deferred_with_event<F, Fut>(title: impl Into<String>, f: F) -> Self
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        Self::titled(title, Handler::DeferredWithEvent(Arc::new(move |e| f(e).boxed())))
    }

    /// Drops the title; untitled callbacks never win the listing title.
    pub fn untitled(mut self) -> Self {
        self.title = None;
        self
    }

    fn titled(title: impl Into<String>, handler: Handler) -> Self {
        Self {
            title: Some(title.into()),
            handler,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Whether the callable declared the event parameter.
    pub fn takes_event(&self) -> bool {
        matches!(
            self.handler,
            Handler::SyncWithEvent(_) | Handler::DeferredWithEvent(_)
        )
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.handler, Handler::Deferred(_) | Handler::DeferredWithEvent(_))
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("title", &self.title)
            .field("takes_event", &self.takes_event())
            .field("deferred", &self.is_deferred())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_flags_follow_variant() {
        let plain = Callback::sync("honk", || Ok(()));
        let with_event = Callback::sync_with_event("steer", |_e| Ok(()));
        let deferred = Callback::deferred("spin", || async { Ok::<(), CallbackError>(()) });
        let deferred_with_event =
            Callback::deferred_with_event("drive", |_e| async { Ok::<(), CallbackError>(()) });

        assert!(!plain.takes_event() && !plain.is_deferred());
        assert!(with_event.takes_event() && !with_event.is_deferred());
        assert!(!deferred.takes_event() && deferred.is_deferred());
        assert!(deferred_with_event.takes_event() && deferred_with_event.is_deferred());
    }

    #[test]
    fn test_untitled_clears_title() {
        let cb = Callback::sync("honk", || Ok(())).untitled();
        assert_eq!(cb.title(), None);
    }
}
