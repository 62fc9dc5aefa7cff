//! A pending operation completed from any thread.
//!
//! [`pair`] hands back the two ends of one resolution: the [`Resolver`] is
//! given to whatever will eventually produce the value (an I/O callback, a
//! worker thread), and the [`Source`] is what a task body suspends on. This
//! is the canonical sub-operation for [`begin`](crate::begin): resolving
//! wakes the suspended frame on the resolving thread.
//!
//! ```
//! let (resolver, source) = brisk::source::pair();
//!
//! std::thread::spawn(move || {
//!   resolver.resolve(7).unwrap();
//! });
//!
//! assert_eq!(brisk::future::block_on(source), Ok(7));
//! ```

use std::{
  future::Future,
  mem,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll, Waker},
};

use thiserror::Error;

use crate::awaitable::Awaitable;
use crate::loom::sync::Mutex;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SourceError {
  /// The resolver was dropped without delivering a value.
  #[error("resolver dropped before resolving")]
  Abandoned,
  /// The awaited end was dropped; the resolution has nowhere to go.
  #[error("source dropped before resolution")]
  Closed,
}

enum State<V> {
  /// No waiter, no value yet.
  Pending,
  /// A waiter registered and suspended.
  Waiting(Waker),
  /// Value delivered; `None` once taken.
  Resolved(Option<V>),
  /// Resolver dropped without delivering.
  Abandoned,
  /// Source dropped.
  Closed,
}

struct Shared<V> {
  state: Mutex<State<V>>,
}

/// The awaited end: implements both [`Awaitable`] and
/// [`Future`](std::future::Future).
pub struct Source<V> {
  shared: Arc<Shared<V>>,
}

/// The completing end. May hop threads; resolving wakes the waiter on the
/// resolving thread.
pub struct Resolver<V> {
  shared: Arc<Shared<V>>,
}

#[cfg(test)]
static_assertions::assert_impl_all!(Source<u8>: Send, Sync);
#[cfg(test)]
static_assertions::assert_impl_all!(Resolver<u8>: Send, Sync);

/// Creates a connected resolver/source pair.
pub fn pair<V>() -> (Resolver<V>, Source<V>) {
  let shared = Arc::new(Shared { state: Mutex::new(State::Pending) });

  (Resolver { shared: shared.clone() }, Source { shared })
}

impl<V> Resolver<V> {
  /// Delivers `value` and wakes the waiter, if one suspended.
  pub fn resolve(self, value: V) -> Result<(), SourceError> {
    let waiter = {
      let mut state = self.shared.state.lock().unwrap();
      match mem::replace(&mut *state, State::Resolved(Some(value))) {
        State::Pending => None,
        State::Waiting(waker) => Some(waker),
        State::Closed => {
          *state = State::Closed;
          return Err(SourceError::Closed);
        }
        // `resolve` consumes the resolver, so neither can recur.
        State::Resolved(_) | State::Abandoned => unreachable!(),
      }
    };

    // Wake outside the lock; the waiter may re-poll this source inline.
    if let Some(waker) = waiter {
      waker.wake();
    }
    Ok(())
  }
}

impl<V> Drop for Resolver<V> {
  fn drop(&mut self) {
    let waiter = {
      let mut state = self.shared.state.lock().unwrap();
      match &*state {
        State::Pending => {
          *state = State::Abandoned;
          None
        }
        State::Waiting(_) => {
          let State::Waiting(waker) =
            mem::replace(&mut *state, State::Abandoned)
          else {
            unreachable!()
          };
          Some(waker)
        }
        // Resolved (this drop runs at the end of `resolve` too) or closed.
        _ => None,
      }
    };

    if let Some(waker) = waiter {
      waker.wake();
    }
  }
}

impl<V> Source<V> {
  /// Non-suspending probe: `Ok(Some)` once resolved, `Ok(None)` while
  /// still pending (or after the value was already taken).
  pub fn try_take(&self) -> Result<Option<V>, SourceError> {
    let mut state = self.shared.state.lock().unwrap();
    match &mut *state {
      State::Resolved(value) => Ok(value.take()),
      State::Abandoned => Err(SourceError::Abandoned),
      _ => Ok(None),
    }
  }
}

impl<V> Drop for Source<V> {
  fn drop(&mut self) {
    let mut state = self.shared.state.lock().unwrap();
    if matches!(*state, State::Pending | State::Waiting(_)) {
      *state = State::Closed;
    }
  }
}

impl<V> Awaitable for Source<V> {
  type Output = Result<V, SourceError>;

  fn ready(&self) -> bool {
    matches!(
      *self.shared.state.lock().unwrap(),
      State::Resolved(_) | State::Abandoned
    )
  }

  fn register(&self, parent: &Waker) -> bool {
    let mut state = self.shared.state.lock().unwrap();
    match &*state {
      State::Resolved(_) | State::Abandoned => false,
      _ => {
        *state = State::Waiting(parent.clone());
        true
      }
    }
  }

  fn take(&mut self) -> Result<V, SourceError> {
    let mut state = self.shared.state.lock().unwrap();
    match &mut *state {
      State::Resolved(value) => {
        Ok(value.take().expect("source resolution already taken"))
      }
      State::Abandoned => Err(SourceError::Abandoned),
      _ => panic!("source taken before resolution"),
    }
  }
}

impl<V> Future for Source<V> {
  type Output = Result<V, SourceError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    if this.ready() || !Awaitable::register(this, cx.waker()) {
      Poll::Ready(this.take())
    } else {
      Poll::Pending
    }
  }
}
