use std::{
  future::Future,
  panic,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll, Waker},
};

use thiserror::Error;

use crate::awaitable::Awaitable;

use super::frame::{Frame, TaskId};

/// Errors reported by the await protocol on a [`Task`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TaskError {
  /// A protocol operation was invoked on a handle with no frame bound.
  #[error("cannot await an empty task")]
  Unbound,
  /// The body has not completed yet.
  #[error("task has not completed yet")]
  NotReady,
  /// The produced value was already moved out.
  #[error("task result was already retrieved")]
  AlreadyRetrieved,
}

/// Move-only owner of one running-or-completed task frame.
///
/// A `Task` is created with [`begin`](crate::begin) and its body is already
/// running by the time the handle exists. The handle is the frame's sole
/// owner: dropping it while the body is still running is a programming
/// error and panics, because a later resumption would otherwise race with
/// teardown.
///
/// Awaiting the handle (it implements [`Future`]) resumes the awaiter
/// exactly once, strictly after the body completed. Awaiting an empty
/// handle panics; the inherent protocol methods report
/// [`TaskError::Unbound`] instead.
pub struct Task<R> {
  frame: Option<Arc<Frame<R>>>,
}

#[cfg(test)]
static_assertions::assert_impl_all!(Task<u8>: Send, Sync, Unpin);

impl<R> Task<R> {
  pub(crate) fn bind(frame: Arc<Frame<R>>) -> Self {
    Self { frame: Some(frame) }
  }

  /// Identifier of the bound frame, if any.
  pub fn id(&self) -> Option<TaskId> {
    self.frame.as_ref().map(|frame| frame.id())
  }

  /// Readiness check of the await protocol.
  ///
  /// While the frame has never observed asynchrony this is lock-free: the
  /// whole body already ran to completion on the stack that created it, so
  /// no other thread can be touching the frame. Otherwise the frame's lock
  /// decides.
  pub fn is_ready(&self) -> Result<bool, TaskError> {
    let frame = self.frame.as_ref().ok_or(TaskError::Unbound)?;
    if frame.all_sync() {
      return Ok(true);
    }
    Ok(frame.chain().done)
  }

  /// Suspension registration, invoked after [`is_ready`](Task::is_ready)
  /// reported not-ready. `Ok(true)` means the caller must suspend and will
  /// be woken through `parent`; `Ok(false)` means the frame completed in
  /// the interim and the caller proceeds without suspending.
  ///
  /// This is the only place registration can race completion, and the
  /// frame's lock makes the race safe: a parent recorded here is either
  /// woken exactly once from final resolution, or never recorded because
  /// completion already happened.
  pub fn register(&self, parent: &Waker) -> Result<bool, TaskError> {
    let frame = self.frame.as_ref().ok_or(TaskError::Unbound)?;
    Ok(frame.register(parent))
  }

  /// Result retrieval. Re-raises a panic captured from the body, otherwise
  /// moves the produced value out, leaving the slot absent.
  pub fn result(&mut self) -> Result<R, TaskError> {
    let frame = self.frame.as_ref().ok_or(TaskError::Unbound)?;
    let mut chain = frame.chain();
    if let Some(payload) = chain.failure.take() {
      drop(chain);
      panic::resume_unwind(payload);
    }
    if !chain.done {
      return Err(TaskError::NotReady);
    }
    chain.value.take().ok_or(TaskError::AlreadyRetrieved)
  }

  /// Whether the body has finished, independent of the await protocol.
  /// An empty handle reports false.
  pub fn done(&self) -> bool {
    self.frame.as_ref().is_some_and(|frame| frame.is_done())
  }
}

impl<R> Default for Task<R> {
  /// An empty handle, not bound to any frame.
  fn default() -> Self {
    Self { frame: None }
  }
}

impl<R> Drop for Task<R> {
  fn drop(&mut self) {
    if let Some(frame) = self.frame.take() {
      if !frame.is_done() && !std::thread::panicking() {
        panic!("task dropped before its body finished");
      }
    }
  }
}

impl<R> std::fmt::Debug for Task<R> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Task")
      .field("id", &self.id())
      .field("done", &self.done())
      .finish()
  }
}

impl<R> Future for Task<R> {
  type Output = R;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();

    let suspend = {
      let Some(frame) = this.frame.as_ref() else {
        panic!("{}", TaskError::Unbound);
      };
      let ready = frame.all_sync() || frame.chain().done;
      !ready && frame.register(cx.waker())
    };

    if suspend {
      return Poll::Pending;
    }
    match this.result() {
      Ok(value) => Poll::Ready(value),
      // Only reachable by polling again after completion.
      Err(error) => panic!("{error}"),
    }
  }
}

impl<R> Awaitable for Task<R> {
  type Output = R;

  fn ready(&self) -> bool {
    match self.is_ready() {
      Ok(ready) => ready,
      Err(error) => panic!("{error}"),
    }
  }

  fn register(&self, parent: &Waker) -> bool {
    match Task::register(self, parent) {
      Ok(suspend) => suspend,
      Err(error) => panic!("{error}"),
    }
  }

  fn take(&mut self) -> R {
    match self.result() {
      Ok(value) => value,
      Err(error) => panic!("{error}"),
    }
  }
}
