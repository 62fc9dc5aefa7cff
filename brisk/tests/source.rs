// Integration tests for the completion source
use std::future::Future;

use brisk::source::{self, SourceError};

macro_rules! get_ready {
  ($expr:expr) => {{
    let mut pinned = std::pin::pin!($expr);
    match pinned
      .as_mut()
      .poll(&mut std::task::Context::from_waker(&futures_task::noop_waker()))
    {
      std::task::Poll::Ready(value) => value,
      std::task::Poll::Pending => unreachable!("was Poll::Pending"),
    }
  }};
}

macro_rules! should_pending {
  ($expr:expr) => {{
    let mut pinned = std::pin::pin!(&mut $expr);
    match pinned
      .as_mut()
      .poll(&mut std::task::Context::from_waker(&futures_task::noop_waker()))
    {
      std::task::Poll::Ready(_) => false,
      std::task::Poll::Pending => true,
    }
  }};
}

const VALUE: u8 = 2;

#[test]
fn resolve_then_await() {
  let (resolver, source) = source::pair();

  resolver.resolve(VALUE).unwrap();

  assert_eq!(get_ready!(source), Ok(VALUE));
}

#[test]
fn await_then_resolve() {
  let (resolver, mut source) = source::pair();

  assert!(should_pending!(source));

  resolver.resolve(VALUE).unwrap();

  assert_eq!(get_ready!(source), Ok(VALUE));
}

#[test]
fn abandoned_resolver_fails_the_await() {
  let (resolver, source) = source::pair::<u8>();

  drop(resolver);

  assert_eq!(get_ready!(source), Err(SourceError::Abandoned));
}

#[test]
fn resolving_a_dropped_source_reports_closed() {
  let (resolver, source) = source::pair();

  drop(source);

  assert_eq!(resolver.resolve(VALUE), Err(SourceError::Closed));
}

#[test]
fn try_take_probes_without_suspending() {
  let (resolver, source) = source::pair();

  assert_eq!(source.try_take(), Ok(None));

  resolver.resolve(VALUE).unwrap();

  assert_eq!(source.try_take(), Ok(Some(VALUE)));
  // At most one resolution; the slot is empty after.
  assert_eq!(source.try_take(), Ok(None));
}

#[test]
fn cross_thread_resolution() {
  let (resolver, source) = source::pair();

  std::thread::spawn(move || {
    resolver.resolve(VALUE).unwrap();
  });

  assert_eq!(brisk::future::block_on(source), Ok(VALUE));
}
