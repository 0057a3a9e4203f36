//! Intervals of validity.

use std::fmt;

use crate::error::{ConditionsError, ConditionsResult};

/// Which kind of run a window applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RunType {
    /// Both recorded data and simulation.
    #[default]
    Any,
    /// Recorded data only.
    Data,
    /// Simulation only.
    #[cfg_attr(feature = "serde", serde(rename = "mc", alias = "sim", alias = "simulation"))]
    Simulation,
}

impl RunType {
    /// Interprets the `RUNTYPE` column of an entries index: `MC` and `DATA`
    /// (any case) restrict the window, anything else applies to both.
    #[must_use]
    pub fn from_index_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("mc") {
            Self::Simulation
        } else if label.eq_ignore_ascii_case("data") {
            Self::Data
        } else {
            Self::Any
        }
    }

    const fn applies_to_data(self) -> bool {
        matches!(self, Self::Any | Self::Data)
    }

    const fn applies_to_simulation(self) -> bool {
        matches!(self, Self::Any | Self::Simulation)
    }
}

/// The run being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunContext {
    /// Run number.
    pub run: u32,
    /// `true` for simulated (Monte Carlo) events.
    pub is_simulated: bool,
}

impl RunContext {
    #[must_use]
    pub const fn new(run: u32, is_simulated: bool) -> Self {
        Self { run, is_simulated }
    }

    /// A recorded-data run.
    #[must_use]
    pub const fn data(run: u32) -> Self {
        Self::new(run, false)
    }

    /// A simulated run.
    #[must_use]
    pub const fn simulation(run: u32) -> Self {
        Self::new(run, true)
    }
}

/// A run range plus the run categories it covers.
///
/// A missing bound is unbounded on that side. Windows are immutable once
/// built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidityWindow {
    first_run: Option<u32>,
    last_run: Option<u32>,
    run_type: RunType,
}

impl ValidityWindow {
    /// Creates a window. Fails if both bounds are set and `first > last`.
    pub fn new(
        first_run: Option<u32>,
        last_run: Option<u32>,
        run_type: RunType,
    ) -> ConditionsResult<Self> {
        if let (Some(first_run), Some(last_run)) = (first_run, last_run) {
            if first_run > last_run {
                return Err(ConditionsError::InvalidWindow {
                    first_run,
                    last_run,
                });
            }
        }
        Ok(Self {
            first_run,
            last_run,
            run_type,
        })
    }

    /// A window covering every run of every category.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            first_run: None,
            last_run: None,
            run_type: RunType::Any,
        }
    }

    /// Creates a window from signed bounds where `-1` means unbounded.
    pub fn from_signed(first_run: i64, last_run: i64, run_type: RunType) -> ConditionsResult<Self> {
        Self::new(run_bound(first_run)?, run_bound(last_run)?, run_type)
    }

    #[must_use]
    pub const fn first_run(&self) -> Option<u32> {
        self.first_run
    }

    #[must_use]
    pub const fn last_run(&self) -> Option<u32> {
        self.last_run
    }

    #[must_use]
    pub const fn run_type(&self) -> RunType {
        self.run_type
    }

    #[must_use]
    pub const fn applies_to_data(&self) -> bool {
        self.run_type.applies_to_data()
    }

    #[must_use]
    pub const fn applies_to_simulation(&self) -> bool {
        self.run_type.applies_to_simulation()
    }

    /// Returns `true` if the window covers the run.
    #[must_use]
    pub fn contains(&self, run: u32, is_simulated: bool) -> bool {
        let after_start = self.first_run.map_or(true, |first| run >= first);
        let before_end = self.last_run.map_or(true, |last| run <= last);
        let category = if is_simulated {
            self.applies_to_simulation()
        } else {
            self.applies_to_data()
        };
        after_start && before_end && category
    }

    /// Returns `true` if the window covers the run context.
    #[must_use]
    pub fn contains_context(&self, context: RunContext) -> bool {
        self.contains(context.run, context.is_simulated)
    }

    /// Returns `true` if some run of some category is covered by both
    /// windows.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let lo = self.first_run.max(other.first_run);
        let hi = match (self.last_run, other.last_run) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let runs = match (lo, hi) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        };
        let categories = (self.applies_to_data() && other.applies_to_data())
            || (self.applies_to_simulation() && other.applies_to_simulation());
        runs && categories
    }
}

impl fmt::Display for ValidityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_run {
            Some(first) => write!(f, "[{first}, ")?,
            None => f.write_str("(-inf, ")?,
        }
        match self.last_run {
            Some(last) => write!(f, "{last}]")?,
            None => f.write_str("+inf)")?,
        }
        match self.run_type {
            RunType::Any => Ok(()),
            RunType::Data => f.write_str(" data"),
            RunType::Simulation => f.write_str(" mc"),
        }
    }
}

/// Converts a signed run bound: `-1` is unbounded, other negatives and
/// values past `u32::MAX` are errors.
pub(crate) fn run_bound(value: i64) -> ConditionsResult<Option<u32>> {
    if value == -1 {
        return Ok(None);
    }
    u32::try_from(value)
        .map(Some)
        .map_err(|_| ConditionsError::InvalidRunNumber { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(first: Option<u32>, last: Option<u32>, run_type: RunType) -> ValidityWindow {
        ValidityWindow::new(first, last, run_type).unwrap()
    }

    #[test]
    fn contains_respects_bounds() {
        let w = window(Some(10), Some(20), RunType::Any);
        assert!(!w.contains(9, false));
        assert!(w.contains(10, false));
        assert!(w.contains(20, true));
        assert!(!w.contains(21, false));
    }

    #[test]
    fn unbounded_sides() {
        let open_end = window(Some(101), None, RunType::Any);
        assert!(open_end.contains(u32::MAX, false));
        assert!(!open_end.contains(100, false));
        let open_start = window(None, Some(5), RunType::Any);
        assert!(open_start.contains(0, true));
        assert!(ValidityWindow::unbounded().contains(123, true));
    }

    #[test]
    fn categories() {
        let data = window(None, None, RunType::Data);
        assert!(data.contains(1, false));
        assert!(!data.contains(1, true));
        let sim = window(None, None, RunType::Simulation);
        assert!(sim.contains(1, true));
        assert!(!sim.contains(1, false));
        assert!(sim.contains_context(RunContext::simulation(1)));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = ValidityWindow::new(Some(5), Some(4), RunType::Any).unwrap_err();
        assert_eq!(
            err,
            ConditionsError::InvalidWindow {
                first_run: 5,
                last_run: 4
            }
        );
        assert!(ValidityWindow::new(Some(5), Some(5), RunType::Any).is_ok());
    }

    #[test]
    fn overlap_needs_runs_and_categories() {
        let a = window(Some(0), Some(100), RunType::Any);
        let b = window(Some(101), None, RunType::Any);
        assert!(!a.overlaps(&b));
        let c = window(Some(100), Some(200), RunType::Any);
        assert!(a.overlaps(&c));

        let data = window(Some(0), Some(100), RunType::Data);
        let sim = window(Some(0), Some(100), RunType::Simulation);
        assert!(!data.overlaps(&sim));
        assert!(data.overlaps(&a));
        assert!(ValidityWindow::unbounded().overlaps(&sim));
    }

    #[test]
    fn signed_bounds() {
        let w = ValidityWindow::from_signed(-1, 50, RunType::Data).unwrap();
        assert_eq!(w.first_run(), None);
        assert_eq!(w.last_run(), Some(50));
        assert_eq!(
            ValidityWindow::from_signed(-2, 5, RunType::Any).unwrap_err(),
            ConditionsError::InvalidRunNumber { value: -2 }
        );
        assert!(ValidityWindow::from_signed(0, i64::from(u32::MAX) + 1, RunType::Any).is_err());
    }

    #[test]
    fn index_labels() {
        assert_eq!(RunType::from_index_label("MC"), RunType::Simulation);
        assert_eq!(RunType::from_index_label("data"), RunType::Data);
        assert_eq!(RunType::from_index_label("any"), RunType::Any);
        assert_eq!(RunType::from_index_label(""), RunType::Any);
    }

    #[test]
    fn display() {
        assert_eq!(window(Some(1), Some(2), RunType::Any).to_string(), "[1, 2]");
        assert_eq!(window(None, None, RunType::Simulation).to_string(), "(-inf, +inf) mc");
        assert_eq!(window(Some(7), None, RunType::Data).to_string(), "[7, +inf) data");
    }
}
