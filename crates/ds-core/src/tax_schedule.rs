//! The consumption tax schedule.
//!
//! A [`TaxSchedule`] owns an ordered list of [`TaxPeriod`]s that partitions
//! the whole time axis: sorted by begin, no gap or overlap between
//! neighbors, first begin pinned to [`MIN_INSTANT`], last end pinned to
//! [`MAX_INSTANT`], and no two neighbors sharing a rate. Every public
//! operation leaves the list in that canonical form.
//!
//! Lookups are linear scans and insertion uses one binary search; schedules
//! hold tens of periods at most, so nothing fancier is warranted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::tax_period::{MAX_INSTANT, MIN_INSTANT, TaxPeriod};
use crate::types::{TaxRate, ValidationError};

/// Errors for schedule construction and mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A schedule needs at least one period.
    #[error("a tax schedule needs at least one period")]
    Empty,

    /// Adjacent periods overlap or leave a gap.
    #[error("tax periods are not contiguous: expected a period beginning at {expected}, found {found}")]
    Discontinuous {
        expected: DateTime<Utc>,
        found: DateTime<Utc>,
    },

    /// The queried instant lies outside the managed axis.
    #[error("no tax period manages {0}")]
    Unmanaged(DateTime<Utc>),

    /// No period with the given id.
    #[error("no tax period with id {0}")]
    PeriodNotFound(Uuid),

    /// Removing the only period would leave the axis uncovered.
    #[error("cannot remove the only remaining tax period")]
    CannotRemoveLast,

    /// The supplied rate failed validation.
    #[error(transparent)]
    InvalidRate(#[from] ValidationError),
}

/// An ordered, gapless partition of the time axis into tax periods.
#[derive(Debug, Clone)]
pub struct TaxSchedule {
    periods: Vec<TaxPeriod>,
}

impl TaxSchedule {
    /// Builds a schedule from an arbitrarily ordered, non-empty list.
    ///
    /// The list is sorted by begin and checked for continuity; the first
    /// begin and last end are then pinned to the axis sentinels, and equal
    /// rate neighbors are merged.
    pub fn new(mut periods: Vec<TaxPeriod>) -> Result<Self, ScheduleError> {
        if periods.is_empty() {
            return Err(ScheduleError::Empty);
        }
        periods.sort_by_key(TaxPeriod::begin);
        for pair in periods.windows(2) {
            if pair[0].end() != pair[1].begin() {
                return Err(ScheduleError::Discontinuous {
                    expected: pair[0].end(),
                    found: pair[1].begin(),
                });
            }
        }
        let mut schedule = Self { periods };
        schedule.pin_to_axis();
        schedule.merge_neighbors();
        Ok(schedule)
    }

    /// The managed periods, ordered by begin.
    #[must_use]
    pub fn periods(&self) -> &[TaxPeriod] {
        &self.periods
    }

    /// Consumes the schedule, handing the period list back for persistence.
    #[must_use]
    pub fn into_periods(self) -> Vec<TaxPeriod> {
        self.periods
    }

    /// Returns the rate in force at `at`.
    ///
    /// Fails with [`ScheduleError::Unmanaged`] for instants outside
    /// `[MIN_INSTANT, MAX_INSTANT)`; `MAX_INSTANT` itself is an exclusive
    /// bound and never falls inside any period.
    ///
    /// # Panics
    ///
    /// Panics if no period covers an on-axis instant. That would mean the
    /// coverage invariant is broken, which no public operation allows.
    pub fn rate_at(&self, at: DateTime<Utc>) -> Result<TaxRate, ScheduleError> {
        if at < *MIN_INSTANT || *MAX_INSTANT <= at {
            return Err(ScheduleError::Unmanaged(at));
        }
        let Some(period) = self
            .periods
            .iter()
            .find(|p| p.begin() <= at && at < p.end())
        else {
            unreachable!("tax schedule invariant broken: no period covers {at}");
        };
        Ok(period.rate())
    }

    /// Splices a new period into the schedule.
    ///
    /// If an existing period fully contains `addition`, it is split into up
    /// to three fragments: the remainder before, the addition, and the
    /// remainder after. The leading remainder keeps the split period's id;
    /// a trailing remainder is a fresh record. Otherwise every period that
    /// `addition` wholly covers is dropped, the addition is placed by
    /// binary search on begin, and the surviving neighbors are trimmed to
    /// meet it. Either way equal-rate neighbors are merged afterwards.
    pub fn insert(&mut self, addition: TaxPeriod) {
        let a_begin = addition.begin();
        let a_end = addition.end();

        if let Some(idx) = self.periods.iter().position(|p| p.contains(&addition)) {
            let existing = self.periods[idx].clone();
            let mut fragments = Vec::with_capacity(3);
            if existing.begin() < a_begin {
                fragments.push(existing.fragment(existing.id(), existing.begin(), a_begin));
            }
            fragments.push(addition);
            if a_end < existing.end() {
                fragments.push(existing.fragment(Uuid::new_v4(), a_end, existing.end()));
            }
            self.periods.splice(idx..=idx, fragments);
        } else {
            self.periods.retain(|p| !addition.contains(p));
            let pos = self.periods.partition_point(|p| p.begin() < a_begin);
            self.periods.insert(pos, addition);
            if pos > 0 {
                self.periods[pos - 1].set_end(a_begin);
            }
            if pos + 1 < self.periods.len() {
                self.periods[pos + 1].set_begin(a_end);
            }
            self.pin_to_axis();
        }
        self.merge_neighbors();
    }

    /// Changes the rate of the period with the given id.
    ///
    /// The rate is validated before any lookup, so a bad rate leaves the
    /// schedule untouched. Equal-rate neighbors merge afterwards, which can
    /// shrink the list.
    pub fn set_rate(&mut self, id: Uuid, rate: Decimal) -> Result<(), ScheduleError> {
        let rate = TaxRate::new(rate)?;
        let period = self
            .periods
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(ScheduleError::PeriodNotFound(id))?;
        period.set_rate(rate);
        self.merge_neighbors();
        Ok(())
    }

    /// Removes the period with the given id, re-stitching its neighbors.
    ///
    /// An interior removal extends the successor back to the predecessor's
    /// end; removing the first or last period re-pins the new boundary to
    /// the axis sentinel instead.
    pub fn remove(&mut self, id: Uuid) -> Result<(), ScheduleError> {
        if self.periods.len() <= 1 {
            return Err(ScheduleError::CannotRemoveLast);
        }
        let idx = self
            .periods
            .iter()
            .position(|p| p.id() == id)
            .ok_or(ScheduleError::PeriodNotFound(id))?;
        if idx > 0 && idx + 1 < self.periods.len() {
            let bridge = self.periods[idx - 1].end();
            self.periods[idx + 1].set_begin(bridge);
        }
        self.periods.remove(idx);
        self.pin_to_axis();
        self.merge_neighbors();
        Ok(())
    }

    /// Pins the outermost boundaries to the axis sentinels.
    fn pin_to_axis(&mut self) {
        if let Some(first) = self.periods.first_mut() {
            first.set_begin(*MIN_INSTANT);
        }
        if let Some(last) = self.periods.last_mut() {
            last.set_end(*MAX_INSTANT);
        }
    }

    /// Collapses runs of equal-rate neighbors into single periods.
    ///
    /// The earlier period absorbs the later one's span and keeps its id.
    fn merge_neighbors(&mut self) {
        let mut i = 0;
        while i + 1 < self.periods.len() {
            if self.periods[i].rate() == self.periods[i + 1].rate() {
                let end = self.periods[i + 1].end();
                self.periods[i].set_end(end);
                self.periods.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}
