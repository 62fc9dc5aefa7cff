#![allow(unused_imports)]

pub(crate) mod sync {
  #[cfg(loom)]
  pub(crate) use loom::sync::{Mutex, MutexGuard};
  #[cfg(not(loom))]
  pub(crate) use std::sync::{Mutex, MutexGuard};

  pub(crate) mod atomic {
    #[cfg(loom)]
    pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU8, Ordering};
    #[cfg(not(loom))]
    pub(crate) use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
  }
}
