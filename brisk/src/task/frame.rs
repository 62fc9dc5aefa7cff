use std::{
  any::Any,
  future::Future,
  panic::{self, AssertUnwindSafe},
  pin::Pin,
  sync::Arc,
  task::{Context, Poll, Wake, Waker},
};

use crate::loom::sync::{
  atomic::{AtomicBool, AtomicU8, Ordering},
  Mutex, MutexGuard,
};

use super::handle::Task;

/// Payload of a panic caught inside a task body.
pub(crate) type Failure = Box<dyn Any + Send + 'static>;

type Body<R> = Pin<Box<dyn Future<Output = R> + Send + 'static>>;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TaskId(pub usize);

impl TaskId {
  fn next() -> Self {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(0);
    Self(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}

// Drive claim. Exactly one thread polls the body at a time; a wake that
// lands mid-poll sets NOTIFIED and the current driver polls again before
// releasing the claim, so no wakeup is ever lost and a sub-operation waking
// from inside its own poll cannot recurse into the body.
const IDLE: u8 = 0;
const DRIVING: u8 = 1 << 0;
const NOTIFIED: u8 = 1 << 1;

/// Fields shared between a frame's body and whoever awaits its handle,
/// guarded by the frame's lock whenever asynchrony is possible.
pub(crate) struct Chain<R> {
  /// The waiting continuation. Taken exactly once, at final resolution.
  pub(crate) parent: Option<Waker>,
  pub(crate) failure: Option<Failure>,
  /// Absent until the body produces it; only moves are required of `R`.
  pub(crate) value: Option<R>,
  pub(crate) done: bool,
}

/// The suspendable state of one task's body.
pub(crate) struct Frame<R> {
  id: TaskId,
  chain: Mutex<Chain<R>>,
  /// True while every suspension so far resolved on the driving stack.
  /// Once false, stays false for the rest of the frame's life.
  all_sync: AtomicBool,
  drive: AtomicU8,
  /// Taken out (set to `None`) once the body finishes.
  body: Mutex<Option<Body<R>>>,
}

impl<R> Frame<R> {
  pub(crate) fn id(&self) -> TaskId {
    self.id
  }

  /// Lock-free fast-path flag: true only while no suspension has crossed
  /// threads, in which case the body already ran to completion on the
  /// stack that created it by the time any handle holder can look.
  pub(crate) fn all_sync(&self) -> bool {
    self.all_sync.load(Ordering::Acquire)
  }

  pub(crate) fn chain(&self) -> MutexGuard<'_, Chain<R>> {
    self.chain.lock().unwrap()
  }

  pub(crate) fn is_done(&self) -> bool {
    if self.all_sync() {
      return true;
    }
    self.chain().done
  }

  /// Registration step of the await protocol; the caller checked readiness
  /// first and got "not ready". Returns false if the frame completed in the
  /// interim, in which case the caller must not suspend.
  pub(crate) fn register(&self, parent: &Waker) -> bool {
    let mut chain = self.chain();
    if chain.done {
      return false;
    }
    chain.parent = Some(parent.clone());
    true
  }

  /// Final resolution: record the outcome under the lock, then resume the
  /// registered parent, or no one.
  fn finish(&self, value: Option<R>, failure: Option<Failure>) {
    let parent = {
      let mut chain = self.chain();
      chain.value = value;
      chain.failure = failure;
      chain.done = true;
      chain.parent.take()
    };

    tracing::trace!(
      id = self.id.0,
      resumes_parent = parent.is_some(),
      "frame completed"
    );

    // Wake outside the lock: the parent may poll this frame inline.
    if let Some(parent) = parent {
      parent.wake();
    }
  }
}

impl<R: Send + 'static> Frame<R> {
  /// Creates a frame around `body` and immediately drives it on the current
  /// stack, up to its first unresolved suspension or to completion. A new
  /// frame never pre-suspends.
  pub(crate) fn spawn<F>(body: F) -> Task<R>
  where
    F: Future<Output = R> + Send + 'static,
  {
    let frame = Arc::new(Frame {
      id: TaskId::next(),
      chain: Mutex::new(Chain {
        parent: None,
        failure: None,
        value: None,
        done: false,
      }),
      all_sync: AtomicBool::new(true),
      drive: AtomicU8::new(IDLE),
      body: Mutex::new(Some(Box::pin(body))),
    });

    tracing::trace!(id = frame.id.0, "frame created");
    Frame::drive(&frame);
    Task::bind(frame)
  }

  /// Polls the body on the calling thread. Safe to call from any thread at
  /// any time: the claim guarantees a single driver and no lost wakeups.
  pub(crate) fn drive(frame: &Arc<Frame<R>>) {
    loop {
      let state = frame.drive.load(Ordering::Acquire);
      if state & DRIVING != 0 {
        // Someone is mid-poll; leave a note for them instead of contending.
        if frame
          .drive
          .compare_exchange(
            state,
            state | NOTIFIED,
            Ordering::AcqRel,
            Ordering::Acquire,
          )
          .is_ok()
        {
          return;
        }
      } else if frame
        .drive
        .compare_exchange(state, DRIVING, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
      {
        break;
      }
    }

    loop {
      Frame::poll_body(frame);
      match frame.drive.compare_exchange(
        DRIVING,
        IDLE,
        Ordering::AcqRel,
        Ordering::Acquire,
      ) {
        Ok(_) => return,
        // A wake arrived while polling; clear the note and go again.
        Err(_) => frame.drive.store(DRIVING, Ordering::Release),
      }
    }
  }

  fn poll_body(frame: &Arc<Frame<R>>) {
    let mut slot = frame.body.lock().unwrap();

    let polled = {
      let Some(body) = slot.as_mut() else {
        // Completed already; a late wake has nothing left to do.
        return;
      };
      let waker = Waker::from(frame.clone());
      let mut cx = Context::from_waker(&waker);
      panic::catch_unwind(AssertUnwindSafe(|| body.as_mut().poll(&mut cx)))
    };

    match polled {
      Ok(Poll::Ready(value)) => {
        *slot = None;
        drop(slot);
        frame.finish(Some(value), None);
      }
      Ok(Poll::Pending) => {
        // A suspension that did not resolve on this stack: from here on,
        // readiness checks must take the locked path.
        frame.all_sync.store(false, Ordering::Release);
        tracing::trace!(id = frame.id.0, "frame suspended");
      }
      Err(payload) => {
        *slot = None;
        drop(slot);
        frame.finish(None, Some(payload));
      }
    }
  }
}

// Waking a frame re-polls its body on the waking thread. This is how a
// worker completing an I/O operation resumes a suspended frame.
impl<R: Send + 'static> Wake for Frame<R> {
  fn wake(self: Arc<Self>) {
    Frame::drive(&self);
  }

  fn wake_by_ref(self: &Arc<Self>) {
    Frame::drive(self);
  }
}
