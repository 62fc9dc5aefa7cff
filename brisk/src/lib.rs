//! Eager, single-result asynchronous tasks.
//!
//! A [`Task`] starts running its body the moment it is created, on the
//! creating thread's stack, and keeps running until the body hits a
//! suspension that cannot resolve right away. From then on the body is
//! driven by whichever thread completes the operations it suspends on.
//! At most one waiter can chain onto a task, and the result (a value or a
//! captured panic) is handed over exactly once, even when completion and
//! the waiter's registration race on different threads.
//!
//! ```
//! let mut task = brisk::begin(async { 6 * 7 });
//!
//! // The body had nothing to wait for, so it already ran to completion.
//! assert!(task.done());
//! assert_eq!(task.result(), Ok(42));
//! ```
//!
//! Bodies suspend on anything implementing [`Future`](std::future::Future),
//! such as a [`source`] pair resolved from another thread:
//!
//! ```
//! let (resolver, source) = brisk::source::pair();
//! let task = brisk::begin(async move { source.await.unwrap() + 1 });
//!
//! assert!(!task.done());
//! resolver.resolve(41).unwrap();
//! assert_eq!(brisk::future::block_on(task), 42);
//! ```

mod loom;

pub mod awaitable;
pub mod future;
pub mod source;
pub mod task;

pub use awaitable::{Await, Awaitable};
pub use task::{begin, Task, TaskError};
