use chrono::{DateTime, Utc};

/// Update time of the newest record processed so far. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.0
    }

    /// Moves to `candidate` if it is newer. Returns true when the watermark moved.
    pub fn advance(&mut self, candidate: DateTime<Utc>) -> bool {
        if candidate > self.0 {
            self.0 = candidate;
            true
        } else {
            false
        }
    }
}

impl std::fmt::Display for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.0.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn advance_ignores_older_and_equal_times() {
        let mut wm = Watermark::new(ts(100));
        assert!(!wm.advance(ts(50)));
        assert!(!wm.advance(ts(100)));
        assert_eq!(wm.at(), ts(100));
        assert!(wm.advance(ts(101)));
        assert_eq!(wm.at(), ts(101));
    }

    #[test]
    fn displays_as_rfc3339_utc() {
        let wm = Watermark::new(ts(0));
        assert_eq!(wm.to_string(), "1970-01-01T00:00:00.000Z");
    }
}
