use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

/// A shared flag asking a running evaluation to stop.
///
/// Clones observe the same flag, so one clone can be handed to the engine
/// while another is cancelled from a different thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn cancel(&self) {
    self.0.store(true, Ordering::Release);
  }

  #[inline]
  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Acquire)
  }
}
