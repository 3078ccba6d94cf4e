use hive_core::Timestamp;

/// Token-bucket backpressure for outbound gossip classes (spec §5): general
/// gossip is limited to 1 message/sender/minute with the forced heartbeat
/// exempted, and separate per-hour/per-day buckets apply to opportunity,
/// task, strategy, and alert message classes.
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    limit: u32,
    window_secs: i64,
    window_start_ts: Timestamp,
    count: u32,
}

impl RateWindow {
    pub fn new(limit: u32, window_secs: i64, now: Timestamp) -> Self {
        Self {
            limit,
            window_secs,
            window_start_ts: now,
            count: 0,
        }
    }

    /// Returns `true` if a message may be sent now, and records it if so.
    /// Heartbeat emissions should bypass this check entirely rather than
    /// call it (spec §4.7: the heartbeat is forced regardless of threshold).
    pub fn try_consume(&mut self, now: Timestamp) -> bool {
        if now - self.window_start_ts >= self.window_secs {
            self.window_start_ts = now;
            self.count = 0;
        }
        if self.count >= self.limit {
            return false;
        }
        self.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_blocks() {
        let mut window = RateWindow::new(2, 60, 0);
        assert!(window.try_consume(0));
        assert!(window.try_consume(10));
        assert!(!window.try_consume(20));
    }

    #[test]
    fn resets_after_window_elapses() {
        let mut window = RateWindow::new(1, 60, 0);
        assert!(window.try_consume(0));
        assert!(!window.try_consume(30));
        assert!(window.try_consume(61));
    }
}
