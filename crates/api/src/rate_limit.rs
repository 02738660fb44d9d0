use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window request counter keyed by client address.
///
/// Keys are client supplied (`x-forwarded-for`), so entries whose hits have
/// all left the window are swept at most once per window.
#[derive(Debug, Clone)]
pub struct IpRateLimiter {
    state: Arc<Mutex<WindowState>>,
    window: Duration,
    max_requests: usize,
}

#[derive(Debug)]
struct WindowState {
    hits: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl IpRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(WindowState {
                hits: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            window,
            max_requests,
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut state = self.state.lock();

        if now.saturating_duration_since(state.last_sweep) > self.window {
            let window = self.window;
            state.hits.retain(|_, queue| {
                queue
                    .back()
                    .is_some_and(|last| now.saturating_duration_since(*last) <= window)
            });
            state.last_sweep = now;
        }

        if self.max_requests == 0 {
            return false;
        }

        let queue = state.hits.entry(key.to_string()).or_default();
        while queue
            .front()
            .is_some_and(|front| now.saturating_duration_since(*front) > self.window)
        {
            queue.pop_front();
        }

        if queue.len() >= self.max_requests {
            return false;
        }

        queue.push_back(now);
        true
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.state.lock().hits.len()
    }
}
