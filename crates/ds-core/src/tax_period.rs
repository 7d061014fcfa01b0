//! Tax periods on the shared time axis.
//!
//! A [`TaxPeriod`] is a half-open span `[begin, end)` tagged with a rate and
//! an identity. The axis runs from [`MIN_INSTANT`] (inclusive, only ever a
//! begin) to [`MAX_INSTANT`] (exclusive, only ever an end).

use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::types::{TaxRate, ValidationError};

/// Earliest instant a tax period can begin at.
pub static MIN_INSTANT: LazyLock<DateTime<Utc>> =
    LazyLock::new(|| Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap());

/// Latest instant a tax period can end at. Never inside any period.
pub static MAX_INSTANT: LazyLock<DateTime<Utc>> =
    LazyLock::new(|| Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap());

/// A consumption tax rate applied over `[begin, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxPeriod {
    id: Uuid,
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
    rate: TaxRate,
}

impl TaxPeriod {
    /// Creates a new period after validating its span.
    ///
    /// `begin` must lie within `[MIN_INSTANT, MAX_INSTANT)`, `end` within
    /// `(MIN_INSTANT, MAX_INSTANT]`, and `begin` must precede `end`.
    pub fn new(
        id: Uuid,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        rate: TaxRate,
    ) -> Result<Self, ValidationError> {
        if begin < *MIN_INSTANT || *MAX_INSTANT <= begin {
            return Err(ValidationError::BeginOutOfRange { begin });
        }
        if end <= *MIN_INSTANT || *MAX_INSTANT < end {
            return Err(ValidationError::EndOutOfRange { end });
        }
        if end <= begin {
            return Err(ValidationError::EmptySpan { begin, end });
        }
        Ok(Self {
            id,
            begin,
            end,
            rate,
        })
    }

    /// Returns the period's identity.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the inclusive begin instant.
    #[must_use]
    pub const fn begin(&self) -> DateTime<Utc> {
        self.begin
    }

    /// Returns the exclusive end instant.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns the rate applied over the span.
    #[must_use]
    pub const fn rate(&self) -> TaxRate {
        self.rate
    }

    /// Whether this period's span fully covers `other`'s, boundaries
    /// inclusive.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    // Schedule-internal mutators. The schedule owns every period and keeps
    // the coverage invariant; periods never reach callers half-adjusted.

    pub(crate) fn set_begin(&mut self, begin: DateTime<Utc>) {
        self.begin = begin;
    }

    pub(crate) fn set_end(&mut self, end: DateTime<Utc>) {
        self.end = end;
    }

    pub(crate) fn set_rate(&mut self, rate: TaxRate) {
        self.rate = rate;
    }

    /// A fragment of this period over `[begin, end)`, keeping the rate.
    pub(crate) fn fragment(&self, id: Uuid, begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(begin < end);
        Self {
            id,
            begin,
            end,
            rate: self.rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn rate(value: rust_decimal::Decimal) -> TaxRate {
        TaxRate::new(value).unwrap()
    }

    fn on(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn sentinels_bound_the_axis() {
        assert!(*MIN_INSTANT < *MAX_INSTANT);
    }

    #[test]
    fn new_accepts_valid_span() {
        let period = TaxPeriod::new(
            Uuid::new_v4(),
            on(2024, 1, 1),
            on(2024, 4, 1),
            rate(dec!(0.1)),
        )
        .unwrap();
        assert_eq!(period.begin(), on(2024, 1, 1));
        assert_eq!(period.end(), on(2024, 4, 1));
        assert_eq!(period.rate(), rate(dec!(0.1)));
    }

    #[test]
    fn new_accepts_full_axis() {
        let period = TaxPeriod::new(Uuid::new_v4(), *MIN_INSTANT, *MAX_INSTANT, rate(dec!(0.1)));
        assert!(period.is_ok());
    }

    #[test]
    fn new_rejects_begin_at_axis_end() {
        let result = TaxPeriod::new(Uuid::new_v4(), *MAX_INSTANT, *MAX_INSTANT, rate(dec!(0.1)));
        assert_eq!(
            result.unwrap_err(),
            ValidationError::BeginOutOfRange {
                begin: *MAX_INSTANT
            }
        );
    }

    #[test]
    fn new_rejects_begin_before_axis() {
        let early = on(-1, 1, 1);
        let result = TaxPeriod::new(Uuid::new_v4(), early, on(2024, 1, 1), rate(dec!(0.1)));
        assert_eq!(
            result.unwrap_err(),
            ValidationError::BeginOutOfRange { begin: early }
        );
    }

    #[test]
    fn new_rejects_end_at_axis_begin() {
        let result = TaxPeriod::new(Uuid::new_v4(), *MIN_INSTANT, *MIN_INSTANT, rate(dec!(0.1)));
        assert_eq!(
            result.unwrap_err(),
            ValidationError::EndOutOfRange { end: *MIN_INSTANT }
        );
    }

    #[test]
    fn new_rejects_inverted_span() {
        let result = TaxPeriod::new(
            Uuid::new_v4(),
            on(2024, 4, 1),
            on(2024, 1, 1),
            rate(dec!(0.1)),
        );
        assert_eq!(
            result.unwrap_err(),
            ValidationError::EmptySpan {
                begin: on(2024, 4, 1),
                end: on(2024, 1, 1),
            }
        );
    }

    #[test]
    fn contains_is_boundary_inclusive() {
        let outer = TaxPeriod::new(
            Uuid::new_v4(),
            on(2024, 1, 1),
            on(2024, 7, 1),
            rate(dec!(0.1)),
        )
        .unwrap();
        let same = TaxPeriod::new(
            Uuid::new_v4(),
            on(2024, 1, 1),
            on(2024, 7, 1),
            rate(dec!(0.2)),
        )
        .unwrap();
        let inner = TaxPeriod::new(
            Uuid::new_v4(),
            on(2024, 2, 1),
            on(2024, 6, 1),
            rate(dec!(0.2)),
        )
        .unwrap();
        let straddling = TaxPeriod::new(
            Uuid::new_v4(),
            on(2024, 6, 1),
            on(2024, 8, 1),
            rate(dec!(0.2)),
        )
        .unwrap();

        assert!(outer.contains(&same));
        assert!(outer.contains(&inner));
        assert!(!outer.contains(&straddling));
        assert!(!inner.contains(&outer));
    }
}
