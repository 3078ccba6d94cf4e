use hive_core::Timestamp;

/// Turns host `peer_connected`/`peer_disconnected` events (spec §6) into a
/// rolling `uptime_fraction` over a fixed window. One instance per tracked
/// peer; the caller persists the computed fraction into the member row.
#[derive(Debug)]
pub struct UptimeTracker {
    window_secs: i64,
    window_start_ts: Timestamp,
    connected_since: Option<Timestamp>,
    accumulated_connected_secs: i64,
}

impl UptimeTracker {
    pub fn new(now: Timestamp, window_secs: i64) -> Self {
        Self {
            window_secs,
            window_start_ts: now,
            connected_since: None,
            accumulated_connected_secs: 0,
        }
    }

    pub fn on_peer_connected(&mut self, now: Timestamp) {
        self.roll_window(now);
        if self.connected_since.is_none() {
            self.connected_since = Some(now);
        }
    }

    pub fn on_peer_disconnected(&mut self, now: Timestamp) {
        self.roll_window(now);
        if let Some(since) = self.connected_since.take() {
            self.accumulated_connected_secs += (now - since).max(0);
        }
    }

    /// Rolling 30-day uptime fraction in `[0.0, 1.0]`, as of `now`.
    pub fn uptime_fraction(&mut self, now: Timestamp) -> f64 {
        self.roll_window(now);
        let mut connected = self.accumulated_connected_secs;
        if let Some(since) = self.connected_since {
            connected += (now - since).max(0);
        }
        let elapsed = (now - self.window_start_ts).max(1);
        (connected as f64 / elapsed as f64).clamp(0.0, 1.0)
    }

    /// Resets the window once it exceeds `window_secs`, carrying the
    /// in-progress connection (if any) forward into the fresh window.
    fn roll_window(&mut self, now: Timestamp) {
        if now - self.window_start_ts <= self.window_secs {
            return;
        }
        self.window_start_ts = now;
        self.accumulated_connected_secs = 0;
        if let Some(since) = self.connected_since {
            self.connected_since = Some(since.max(now - self.window_secs));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_connected_tracks_toward_one() {
        let mut tracker = UptimeTracker::new(0, 1000);
        tracker.on_peer_connected(0);
        assert!((tracker.uptime_fraction(1000) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disconnected_half_the_window_is_half_uptime() {
        let mut tracker = UptimeTracker::new(0, 1000);
        tracker.on_peer_connected(0);
        tracker.on_peer_disconnected(500);
        assert!((tracker.uptime_fraction(1000) - 0.5).abs() < 1e-9);
    }
}
