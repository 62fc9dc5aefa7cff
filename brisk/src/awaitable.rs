//! The protocol another computation chains onto.
//!
//! Anything a task body can suspend on, and the task itself, exposes the
//! same three operations: a readiness query, registration of the caller's
//! continuation, and retrieval of the result. [`Await`] adapts any
//! implementor into a [`Future`] so it can be awaited inside a body.

use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll, Waker},
};

/// A suspendable operation that at most one caller may chain onto.
pub trait Awaitable {
  type Output;

  /// Readiness query. `true` means the result can be taken right away and
  /// the caller must not suspend.
  fn ready(&self) -> bool;

  /// Invoked after [`ready`](Awaitable::ready) returned `false`. Records
  /// `parent` as the continuation to wake on completion and returns `true`
  /// ("suspend the caller"), or returns `false` if the operation completed
  /// in the interim and the caller should proceed without suspending.
  fn register(&self, parent: &Waker) -> bool;

  /// Retrieval of the produced result. Valid only once the operation has
  /// completed.
  fn take(&mut self) -> Self::Output;
}

/// Adapter that drives an [`Awaitable`] through the standard [`Future`]
/// machinery.
///
/// ```
/// let (resolver, source) = brisk::source::pair();
/// resolver.resolve("ok").unwrap();
///
/// let value = brisk::future::block_on(brisk::Await::new(source));
/// assert_eq!(value, Ok("ok"));
/// ```
pub struct Await<A> {
  op: A,
}

impl<A: Awaitable> Await<A> {
  pub fn new(op: A) -> Self {
    Self { op }
  }

  /// Gives the wrapped operation back.
  pub fn into_inner(self) -> A {
    self.op
  }
}

impl<A: Awaitable + Unpin> Future for Await<A> {
  type Output = A::Output;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    if this.op.ready() || !this.op.register(cx.waker()) {
      Poll::Ready(this.op.take())
    } else {
      Poll::Pending
    }
  }
}
