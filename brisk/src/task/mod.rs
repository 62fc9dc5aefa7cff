//! Eager single-result tasks.
//!
//! A task is a suspendable computation that begins executing the moment it
//! is created: [`begin`] runs the body on the current stack until it either
//! completes or suspends on something that is not ready yet. There is no
//! executor behind it. A suspended body is resumed by whichever thread
//! completes the operation it suspended on, and the [`Task`] handle is how
//! exactly one other party chains onto the result.
//!
//! The handle exposes the await protocol directly ([`Task::is_ready`],
//! [`Task::register`], [`Task::result`]) and implements
//! [`Future`](std::future::Future) on top of it, so it composes with any
//! async code. [`Task::done`] answers "has the body finished" for polling
//! use without touching the protocol.

mod frame;
mod handle;

pub use frame::TaskId;
pub use handle::{Task, TaskError};

use std::future::Future;

use frame::Frame;

/// Starts `body` immediately and returns the handle to its result.
///
/// The body runs on the calling thread, up to its first suspension that
/// cannot resolve right away or to completion. If it never suspends, the
/// returned task is already done:
///
/// ```
/// let mut task = brisk::begin(async { 2 + 2 });
/// assert!(task.done());
/// assert_eq!(task.result(), Ok(4));
/// ```
///
/// If the body suspends, the task completes later, driven by whichever
/// thread resolves the awaited operation; awaiting the handle resumes the
/// awaiter exactly once, strictly after completion.
///
/// A panic inside `body` does not propagate out of `begin`. It is captured
/// into the task and re-raised when the result is retrieved, so the
/// completion handoff to a waiter happens regardless of how the body ended.
pub fn begin<F>(body: F) -> Task<F::Output>
where
  F: Future + Send + 'static,
  F::Output: Send + 'static,
{
  Frame::spawn(body)
}
