//! Watermark arithmetic

use chrono::NaiveDate;

/// Decide the floor to store after a run.
///
/// Returns `Some(date)` when the run observed a filing date at or above the
/// stored floor, `None` when nothing should be written. Equal dates are
/// written again, which keeps the boundary date inclusive for the next run.
pub fn advance_floor(
    previous: Option<NaiveDate>,
    observed: Option<NaiveDate>,
) -> Option<NaiveDate> {
    let observed = observed?;
    match previous {
        Some(prev) if observed < prev => None,
        _ => Some(observed),
    }
}

/// Running maximum of the filing dates seen during one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermark {
    newest: Option<NaiveDate>,
    seen: usize,
}

impl Watermark {
    /// Create an empty watermark
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one record's filing date
    pub fn observe(&mut self, filed: Option<NaiveDate>) {
        self.seen += 1;
        if let Some(date) = filed {
            self.newest = Some(self.newest.map_or(date, |n| n.max(date)));
        }
    }

    /// Newest filing date observed
    pub fn newest(&self) -> Option<NaiveDate> {
        self.newest
    }

    /// Records observed, dated or not
    pub fn seen(&self) -> usize {
        self.seen
    }
}
