//
//  jamfpro
//  api/throttle.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! Adaptive Response-Time Throttling
//!
//! Jamf Pro does not emit rate-limit HTTP headers (no `Retry-After`,
//! `X-RateLimit-Remaining`, or `X-RateLimit-Reset`). Throttling must be
//! inferred entirely from observed response times, per Jamf's scalability
//! guidance: "Measure response times and dynamically adjust time between
//! requests accordingly."
//!
//! [`ResponseTimeTracker`] keeps an exponential moving average of response
//! durations. When the server begins responding more slowly than its own
//! baseline, the excess latency is returned as a suggested pause before the
//! next request.

use std::sync::Mutex;
use std::time::Duration;

/// Maximum adaptive pause returned by [`ResponseTimeTracker::record`].
///
/// Caps the sleep when a single response is dramatically slower than the
/// baseline, preventing unbounded stalls in bulk operations.
pub(crate) const ADAPTIVE_DELAY_MAX: Duration = Duration::from_secs(5);

/// EMA smoothing factor: the most recent sample is weighted at 20%,
/// providing a stable baseline that still reacts to sustained slowdowns
/// within a few samples.
const ALPHA: f64 = 0.2;

#[derive(Debug, Default)]
struct TrackerState {
    ema_nanos: f64,
    initialized: bool,
}

/// Tracks per-request latency and derives an adaptive inter-request delay
/// when the server begins responding slowly.
///
/// Safe for concurrent use; samples from parallel requests are folded into
/// the same baseline.
#[derive(Debug, Default)]
pub(crate) struct ResponseTimeTracker {
    state: Mutex<TrackerState>,
}

impl ResponseTimeTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a response duration sample and returns the pause the caller
    /// should take before issuing the next request, if any.
    ///
    /// When the observed duration exceeds twice the current EMA, the server
    /// is under measurable pressure and the excess over the baseline is
    /// returned, capped at [`ADAPTIVE_DELAY_MAX`]. No delay is suggested
    /// while the server responds at or below its baseline.
    pub(crate) fn record(&self, duration: Duration) -> Option<Duration> {
        let mut state = self.state.lock().expect("response tracker lock poisoned");
        let sample = duration.as_nanos() as f64;

        if !state.initialized {
            state.ema_nanos = sample;
            state.initialized = true;
            return None;
        }

        // EMA update: ema = alpha*current + (1-alpha)*previous
        state.ema_nanos = sample * ALPHA + state.ema_nanos * (1.0 - ALPHA);

        // Server is responding at or below its own baseline.
        if sample <= 2.0 * state.ema_nanos {
            return None;
        }

        let excess = Duration::from_nanos((sample - state.ema_nanos) as u64);
        Some(excess.min(ADAPTIVE_DELAY_MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_initializes_baseline() {
        let tracker = ResponseTimeTracker::new();
        assert_eq!(tracker.record(Duration::from_millis(100)), None);
    }

    #[test]
    fn test_steady_latency_suggests_no_delay() {
        let tracker = ResponseTimeTracker::new();
        for _ in 0..10 {
            assert_eq!(tracker.record(Duration::from_millis(100)), None);
        }
    }

    #[test]
    fn test_spike_suggests_excess_over_baseline() {
        let tracker = ResponseTimeTracker::new();
        for _ in 0..10 {
            tracker.record(Duration::from_millis(100));
        }
        let delay = tracker
            .record(Duration::from_millis(500))
            .expect("spike should suggest a pause");
        assert!(delay > Duration::from_millis(200));
        assert!(delay <= ADAPTIVE_DELAY_MAX);
    }

    #[test]
    fn test_delay_is_capped() {
        let tracker = ResponseTimeTracker::new();
        tracker.record(Duration::from_millis(10));
        let delay = tracker
            .record(Duration::from_secs(60))
            .expect("huge spike should suggest a pause");
        assert_eq!(delay, ADAPTIVE_DELAY_MAX);
    }
}
