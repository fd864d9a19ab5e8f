//! Per-call resolution context: traversal bound and cancellation.
//!
//! Every resolver entry point takes a [`ResolveContext`] explicitly. There is
//! no process-wide state.

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::{Duration, Instant},
};

use crate::{Error, Result};

/// Default bound on parent hops walked from any person.
pub const DEFAULT_MAX_DEPTH: u32 = 64;

// ─── CancelToken ─────────────────────────────────────────────────────────────

/// A cancellation flag shared between a caller and the traversals it starts,
/// optionally combined with a deadline.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
  flag:     Arc<AtomicBool>,
  deadline: Option<Instant>,
}

impl CancelToken {
  pub fn new() -> Self { Self::default() }

  /// A token that reports cancellation once `timeout` has elapsed.
  pub fn with_timeout(timeout: Duration) -> Self {
    Self { flag: Arc::default(), deadline: Some(Instant::now() + timeout) }
  }

  pub fn cancel(&self) { self.flag.store(true, Ordering::Release); }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::Acquire)
      || self.deadline.is_some_and(|d| Instant::now() >= d)
  }
}

// ─── ResolveContext ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ResolveContext {
  /// Maximum number of parent hops before a walk is declared cyclic.
  pub max_depth: u32,
  pub cancel:    CancelToken,
}

impl Default for ResolveContext {
  fn default() -> Self {
    Self { max_depth: DEFAULT_MAX_DEPTH, cancel: CancelToken::default() }
  }
}

impl ResolveContext {
  pub fn new(max_depth: u32, cancel: CancelToken) -> Self {
    Self { max_depth, cancel }
  }

  /// Return [`Error::Cancelled`] if the caller gave up on this request.
  pub fn checkpoint(&self) -> Result<()> {
    if self.cancel.is_cancelled() {
      return Err(Error::Cancelled);
    }
    Ok(())
  }
}
