// core/src/rate_limit.rs

//! Per-client sliding-window request limiter. State is process-local and is
//! lost on restart.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Above this many tracked clients, idle ones are swept at most once per window.
const SWEEP_THRESHOLD: usize = 4096;

#[derive(Debug, Default)]
struct RequestLog {
  clients: HashMap<String, VecDeque<Instant>>,
  last_sweep: Option<Instant>,
}

impl RequestLog {
  fn sweep_due(&self, window: Duration, now: Instant) -> bool {
    self.clients.len() >= SWEEP_THRESHOLD
      && self
        .last_sweep
        .map_or(true, |last| now.saturating_duration_since(last) >= window)
  }

  /// Drops clients with no request inside the window ending at `now`.
  fn sweep_idle(&mut self, window: Duration, now: Instant) {
    self.clients.retain(|_, timestamps| {
      timestamps
        .back()
        .is_some_and(|&latest| now.saturating_duration_since(latest) < window)
    });
    self.last_sweep = Some(now);
  }
}

#[derive(Debug)]
pub struct RateLimiter {
  requests: Mutex<RequestLog>,
  max_requests: usize,
  window: Duration,
}

impl RateLimiter {
  pub fn new(max_requests: usize, window: Duration) -> Self {
    Self {
      requests: Mutex::new(RequestLog::default()),
      max_requests,
      window,
    }
  }

  pub fn allow(&self, client_key: &str) -> bool {
    self.allow_at(client_key, Instant::now())
  }

  /// Records a request from `client_key` at `now` and reports whether it is
  /// within the limit. Rejected requests are not recorded, so a client that
  /// keeps retrying is admitted again as soon as its oldest accepted request
  /// leaves the window.
  pub fn allow_at(&self, client_key: &str, now: Instant) -> bool {
    let mut requests = self.requests.lock();
    if requests.sweep_due(self.window, now) {
      requests.sweep_idle(self.window, now);
    }
    let timestamps = requests.clients.entry(client_key.to_string()).or_default();

    while let Some(&oldest) = timestamps.front() {
      if now.saturating_duration_since(oldest) >= self.window {
        timestamps.pop_front();
      } else {
        break;
      }
    }

    if timestamps.len() >= self.max_requests {
      return false;
    }
    timestamps.push_back(now);
    true
  }

  /// Drops clients with no request inside the window ending at `now`.
  pub fn purge_idle(&self, now: Instant) {
    self.requests.lock().sweep_idle(self.window, now);
  }

  pub fn tracked_clients(&self) -> usize {
    self.requests.lock().clients.len()
  }

  pub fn max_requests(&self) -> usize {
    self.max_requests
  }

  pub fn window(&self) -> Duration {
    self.window
  }
}
