use std::{
  future::Future,
  pin::pin,
  sync::Arc,
  task::{Context, Poll, Wake, Waker},
};

use parking::Unparker;

struct ParkWaker(Unparker);

impl Wake for ParkWaker {
  fn wake(self: Arc<Self>) {
    self.0.unpark();
  }

  fn wake_by_ref(self: &Arc<Self>) {
    self.0.unpark();
  }
}

/// Drives `fut` to completion on the current thread, parking between polls.
///
/// This is how a plain thread awaits a [`Task`](crate::Task), or any other
/// future, without an executor.
pub fn block_on<Fut>(fut: Fut) -> Fut::Output
where
  Fut: Future,
{
  let (parker, unparker) = parking::pair();
  let waker = Waker::from(Arc::new(ParkWaker(unparker)));
  let mut cx = Context::from_waker(&waker);
  let mut pinned = pin!(fut);

  loop {
    match pinned.as_mut().poll(&mut cx) {
      Poll::Ready(value) => return value,
      Poll::Pending => {
        parker.park();
      }
    }
  }
}
