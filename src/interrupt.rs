use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use crate::error::{KResult, KernelError};

/// Cooperative cancellation token polled by every long traversal.
///
/// Clones share the same flag, so one clone can be handed to another thread
/// (or a signal handler) and raised while the kernel is busy. `none()` is a
/// token that can never fire.
#[derive(Clone, Debug, Default)]
pub struct Interrupt(Option<Arc<AtomicBool>>);

impl Interrupt {
  pub fn new() -> Self {
    Interrupt(Some(Arc::new(AtomicBool::new(false))))
  }

  pub fn none() -> Self {
    Interrupt(None)
  }

  pub fn request(&self) {
    if let Some(flag) = &self.0 {
      flag.store(true, Ordering::Relaxed);
    }
  }

  pub fn reset(&self) {
    if let Some(flag) = &self.0 {
      flag.store(false, Ordering::Relaxed);
    }
  }

  pub fn is_requested(&self) -> bool {
    self.0.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
  }

  #[inline]
  pub fn check(&self, during: &'static str) -> KResult<()> {
    if self.is_requested() {
      tracing::debug!(during, "interrupt observed");
      return Err(KernelError::Interrupted { during });
    }
    Ok(())
  }
}
