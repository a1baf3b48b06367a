//! Transfer progress accounting.

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Local file to storage.
    Upload,
    /// Storage to local file.
    Download,
}

impl Direction {
    /// Lower-case label for logs and progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

/// Bytes moved so far against the expected total.
///
/// Progress is advisory. A server that omits the content length leaves the
/// total unknown, and the ratio is then `None` rather than a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes transferred so far.
    pub done: u64,
    /// Bytes expected in total, if known.
    pub total: Option<u64>,
}

impl Progress {
    /// Progress with a known total.
    pub fn new(done: u64, total: u64) -> Self {
        Self {
            done,
            total: Some(total),
        }
    }

    /// Progress without a known total.
    pub fn unbounded(done: u64) -> Self {
        Self { done, total: None }
    }

    /// Fraction complete in `0.0..=1.0`.
    ///
    /// An empty transfer is complete (`1.0`); an unknown total yields `None`.
    pub fn ratio(&self) -> Option<f64> {
        match self.total {
            None => None,
            Some(0) => Some(1.0),
            Some(total) => Some((self.done as f64 / total as f64).min(1.0)),
        }
    }

    /// Whole percent complete, if the total is known.
    pub fn percent(&self) -> Option<u8> {
        self.ratio().map(|r| (r * 100.0).floor() as u8)
    }

    /// Advance by `bytes`.
    pub fn advance(&mut self, bytes: u64) {
        self.done = self.done.saturating_add(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_known_total() {
        assert_eq!(Progress::new(0, 200).ratio(), Some(0.0));
        assert_eq!(Progress::new(50, 200).ratio(), Some(0.25));
        assert_eq!(Progress::new(200, 200).percent(), Some(100));
    }

    #[test]
    fn empty_transfer_is_complete() {
        assert_eq!(Progress::new(0, 0).ratio(), Some(1.0));
    }

    #[test]
    fn unknown_total_has_no_ratio() {
        let p = Progress::unbounded(4096);
        assert_eq!(p.ratio(), None);
        assert_eq!(p.percent(), None);
    }

    #[test]
    fn overshoot_is_clamped() {
        assert_eq!(Progress::new(300, 200).ratio(), Some(1.0));
    }

    #[test]
    fn advance_accumulates() {
        let mut p = Progress::new(0, 10);
        p.advance(4);
        p.advance(6);
        assert_eq!(p.done, 10);
        assert_eq!(Direction::Download.label(), "download");
    }
}
