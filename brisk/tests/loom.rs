// Model checks for the one genuine race in the crate: a waiter registering
// itself against a frame while the frame's body completes on another
// thread. Run with RUSTFLAGS="--cfg loom".
#![cfg(loom)]

use brisk::source::{self, SourceError};

#[test]
fn registration_races_completion() {
  loom::model(|| {
    let (resolver, source) = source::pair();
    let task = brisk::begin(async move { source.await.unwrap() + 1 });

    let resolver_thread = loom::thread::spawn(move || {
      resolver.resolve(41).unwrap();
    });

    // Either we observe the task already done, or we register and get
    // resumed from final resolution. Never early, never lost.
    let value = loom::future::block_on(task);
    assert_eq!(value, 42);

    resolver_thread.join().unwrap();
  });
}

#[test]
fn completion_settles_before_the_handle_looks() {
  loom::model(|| {
    let (resolver, source) = source::pair();
    let mut task = brisk::begin(async move { source.await.unwrap() });

    let resolver_thread = loom::thread::spawn(move || {
      resolver.resolve(5u8).unwrap();
    });
    resolver_thread.join().unwrap();

    assert!(task.done());
    assert_eq!(task.result(), Ok(5));
  });
}

#[test]
fn abandonment_races_the_await() {
  loom::model(|| {
    let (resolver, source) = source::pair::<u8>();

    let drop_thread = loom::thread::spawn(move || {
      drop(resolver);
    });

    let result = loom::future::block_on(source);
    assert_eq!(result, Err(SourceError::Abandoned));

    drop_thread.join().unwrap();
  });
}
