//! ND 33.90.30 / ND 33.90.39 allocation by difference.
//!
//! A budget line has one total that regulation splits across two expense
//! natures. Each form decides up front which of the two is typed by the user
//! (the manual field); the other one is always `total - manual`. The engine
//! never fails: bad input is coerced to zero and a mismatch is something the
//! caller queries through [`NdAllocation::is_allocation_correct`] before saving.

use crate::core::money::{MONEY_TOLERANCE, round_cents, sanitize, to_decimal, to_f64};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which expense nature the user types on a given form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManualField {
    /// ND 33.90.30 (material) is typed, ND 33.90.39 is derived
    Nd30,
    /// ND 33.90.39 (service) is typed, ND 33.90.30 is derived
    Nd39,
}

impl ManualField {
    /// The field that is computed from the other one.
    #[must_use]
    pub const fn derived(self) -> Self {
        match self {
            Self::Nd30 => Self::Nd39,
            Self::Nd39 => Self::Nd30,
        }
    }
}

/// Editing state of the three numeric fields of a budget line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NdAllocation {
    manual: ManualField,
    total: f64,
    nd30: f64,
    nd39: f64,
}

impl NdAllocation {
    /// Empty allocation for a form whose manual field is `manual`.
    #[must_use]
    pub const fn new(manual: ManualField) -> Self {
        Self {
            manual,
            total: 0.0,
            nd30: 0.0,
            nd39: 0.0,
        }
    }

    /// Seeds the engine from stored values, e.g. when opening an edit form.
    ///
    /// Values are coerced and rounded but not rebalanced, so a stored mismatch
    /// stays visible through [`Self::is_allocation_correct`].
    #[must_use]
    pub fn from_parts(manual: ManualField, total: f64, nd30: f64, nd39: f64) -> Self {
        Self {
            manual,
            total: to_f64(to_decimal(sanitize(total))),
            nd30: to_f64(to_decimal(sanitize(nd30))),
            nd39: to_f64(to_decimal(sanitize(nd39))),
        }
    }

    /// Which field this form treats as manual.
    #[must_use]
    pub const fn manual_field(&self) -> ManualField {
        self.manual
    }

    /// Full amount of the budget line.
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// ND 33.90.30 portion.
    #[must_use]
    pub const fn nd30(&self) -> f64 {
        self.nd30
    }

    /// ND 33.90.39 portion.
    #[must_use]
    pub const fn nd39(&self) -> f64 {
        self.nd39
    }

    /// Current value of the given field.
    #[must_use]
    pub const fn value_of(&self, field: ManualField) -> f64 {
        match field {
            ManualField::Nd30 => self.nd30,
            ManualField::Nd39 => self.nd39,
        }
    }

    /// Replaces the total of the line.
    ///
    /// * zero total clears both portions;
    /// * first entry (previous total zero) puts everything on the manual field;
    /// * a previously correct split is rescaled keeping its ratio;
    /// * a previously incorrect split is left alone for the user to fix.
    pub fn set_total(&mut self, new_total: f64) {
        let new_total = round_cents(to_decimal(sanitize(new_total)));

        if new_total.is_zero() {
            debug!("allocation total cleared");
            self.total = 0.0;
            self.nd30 = 0.0;
            self.nd39 = 0.0;
            return;
        }

        let old_total = to_decimal(self.total);
        if old_total.is_zero() {
            debug!(total = %new_total, "first allocation entry, whole total on manual field");
            self.apply_split(new_total, new_total);
            return;
        }

        if self.is_allocation_correct() {
            let old_manual = to_decimal(self.value_of(self.manual));
            let ratio = old_manual.checked_div(old_total).unwrap_or(Decimal::ONE);
            let rescaled = round_cents(new_total.saturating_mul(ratio));
            debug!(total = %new_total, manual = %rescaled, "rescaling correct allocation");
            self.apply_split(new_total, rescaled);
        } else {
            debug!(total = %new_total, "allocation was unbalanced, only total updated");
            self.total = to_f64(new_total);
        }
    }

    /// Sets the form's manual field, clamped to `[0, total]`, and derives the other.
    pub fn set_manual_field(&mut self, value: f64) {
        let total = to_decimal(self.total);
        self.apply_split(total, to_decimal(sanitize(value)));
    }

    /// True iff `nd30 + nd39` matches the total within one centavo.
    #[must_use]
    pub fn is_allocation_correct(&self) -> bool {
        self.unallocated_decimal().abs() < MONEY_TOLERANCE
    }

    /// Amount of the total not covered by the two portions (negative when over-allocated).
    #[must_use]
    pub fn unallocated(&self) -> f64 {
        to_f64(self.unallocated_decimal())
    }

    fn unallocated_decimal(&self) -> Decimal {
        let covered = to_decimal(self.nd30).saturating_add(to_decimal(self.nd39));
        to_decimal(self.total).saturating_sub(covered)
    }

    fn apply_split(&mut self, total: Decimal, manual_value: Decimal) {
        let manual_value = round_cents(manual_value).clamp(Decimal::ZERO, total);
        let derived_value = total - manual_value;

        self.total = to_f64(total);
        match self.manual {
            ManualField::Nd30 => {
                self.nd30 = to_f64(manual_value);
                self.nd39 = to_f64(derived_value);
            }
            ManualField::Nd39 => {
                self.nd39 = to_f64(manual_value);
                self.nd30 = to_f64(derived_value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_entry_goes_to_manual_field() {
        let mut alloc = NdAllocation::new(ManualField::Nd30);
        alloc.set_total(100.0);
        assert_eq!(alloc.nd30(), 100.0);
        assert_eq!(alloc.nd39(), 0.0);

        let mut alloc = NdAllocation::new(ManualField::Nd39);
        alloc.set_total(100.0);
        assert_eq!(alloc.nd30(), 0.0);
        assert_eq!(alloc.nd39(), 100.0);
    }

    #[test]
    fn test_manual_edit_then_proportional_rescale() {
        let mut alloc = NdAllocation::new(ManualField::Nd30);
        alloc.set_total(100.0);
        alloc.set_manual_field(30.0);
        assert_eq!(alloc.nd30(), 30.0);
        assert_eq!(alloc.nd39(), 70.0);

        alloc.set_total(200.0);
        assert_eq!(alloc.total(), 200.0);
        assert_eq!(alloc.nd30(), 60.0);
        assert_eq!(alloc.nd39(), 140.0);
        assert!(alloc.is_allocation_correct());
    }

    #[test]
    fn test_manual_field_is_clamped_to_total() {
        let mut alloc = NdAllocation::new(ManualField::Nd39);
        alloc.set_total(80.0);
        alloc.set_manual_field(500.0);
        assert_eq!(alloc.nd39(), 80.0);
        assert_eq!(alloc.nd30(), 0.0);
    }

    #[test]
    fn test_invalid_manual_input_is_coerced_to_zero() {
        let mut alloc = NdAllocation::new(ManualField::Nd30);
        alloc.set_total(50.0);

        alloc.set_manual_field(f64::NAN);
        assert_eq!(alloc.nd30(), 0.0);
        assert_eq!(alloc.nd39(), 50.0);

        alloc.set_manual_field(-10.0);
        assert_eq!(alloc.nd30(), 0.0);
        assert_eq!(alloc.nd39(), 50.0);
    }

    #[test]
    fn test_zero_total_clears_everything() {
        let mut alloc = NdAllocation::from_parts(ManualField::Nd30, 100.0, 10.0, 20.0);
        alloc.set_total(0.0);
        assert_eq!(alloc.total(), 0.0);
        assert_eq!(alloc.nd30(), 0.0);
        assert_eq!(alloc.nd39(), 0.0);

        let mut alloc = NdAllocation::from_parts(ManualField::Nd39, 100.0, 40.0, 60.0);
        alloc.set_total(f64::NAN);
        assert_eq!(alloc.total(), 0.0);
        assert_eq!(alloc.nd30(), 0.0);
        assert_eq!(alloc.nd39(), 0.0);
    }

    #[test]
    fn test_unbalanced_split_is_left_untouched() {
        let mut alloc = NdAllocation::from_parts(ManualField::Nd30, 100.0, 10.0, 20.0);
        assert!(!alloc.is_allocation_correct());
        assert_eq!(alloc.unallocated(), 70.0);

        alloc.set_total(300.0);
        assert_eq!(alloc.total(), 300.0);
        assert_eq!(alloc.nd30(), 10.0);
        assert_eq!(alloc.nd39(), 20.0);
        assert!(!alloc.is_allocation_correct());

        alloc.set_manual_field(100.0);
        assert_eq!(alloc.nd39(), 200.0);
        assert!(alloc.is_allocation_correct());
    }

    #[test]
    fn test_over_allocation_reports_negative_difference() {
        let alloc = NdAllocation::from_parts(ManualField::Nd30, 100.0, 80.0, 30.0);
        assert!(!alloc.is_allocation_correct());
        assert_eq!(alloc.unallocated(), -10.0);
    }

    #[test]
    fn test_rescale_with_uneven_ratio_stays_balanced() {
        let mut alloc = NdAllocation::new(ManualField::Nd30);
        alloc.set_total(3.0);
        alloc.set_manual_field(1.0);
        alloc.set_total(10.0);
        assert_eq!(alloc.nd30(), 3.33);
        assert_eq!(alloc.nd39(), 6.67);
        assert!(alloc.is_allocation_correct());
    }

    #[test]
    fn test_derived_field() {
        assert_eq!(ManualField::Nd30.derived(), ManualField::Nd39);
        assert_eq!(ManualField::Nd39.derived(), ManualField::Nd30);
    }

    proptest! {
        #[test]
        fn prop_manual_edit_always_balances(
            total in 0.0f64..1_000_000.0,
            value in -1_000.0f64..2_000_000.0,
            nd39_manual in any::<bool>(),
        ) {
            let manual = if nd39_manual { ManualField::Nd39 } else { ManualField::Nd30 };
            let mut alloc = NdAllocation::new(manual);
            alloc.set_total(total);
            alloc.set_manual_field(value);

            prop_assert!(alloc.is_allocation_correct());
            prop_assert!(alloc.nd30() >= 0.0 && alloc.nd39() >= 0.0);
            prop_assert!(alloc.value_of(manual) <= alloc.total());
        }

        #[test]
        fn prop_rescale_preserves_sum_and_ratio(
            old_total in 1.0f64..100_000.0,
            share in 0.0f64..1.0,
            new_total in 1.0f64..100_000.0,
        ) {
            let mut alloc = NdAllocation::new(ManualField::Nd30);
            alloc.set_total(old_total);
            alloc.set_manual_field(old_total * share);
            let old_ratio = alloc.nd30() / alloc.total();

            alloc.set_total(new_total);
            prop_assert!(alloc.is_allocation_correct());
            let expected_nd30 = alloc.total() * old_ratio;
            prop_assert!((alloc.nd30() - expected_nd30).abs() <= 0.01 + 1e-9);
        }

        #[test]
        fn prop_zero_total_always_clears(
            total in 0.0f64..10_000.0,
            value in 0.0f64..10_000.0,
        ) {
            let mut alloc = NdAllocation::new(ManualField::Nd39);
            alloc.set_total(total);
            alloc.set_manual_field(value);
            alloc.set_total(0.0);
            prop_assert_eq!(alloc.nd30(), 0.0);
            prop_assert_eq!(alloc.nd39(), 0.0);
        }
    }

    #[test]
    fn test_rescale_of_large_amounts_does_not_overflow() {
        let mut alloc = NdAllocation::new(ManualField::Nd30);
        alloc.set_total(1e20);
        alloc.set_manual_field(5e19);
        alloc.set_total(2e20);

        assert_eq!(alloc.nd30(), 1e20);
        assert_eq!(alloc.nd39(), 1e20);
        assert!(alloc.is_allocation_correct());
    }

    #[test]
    fn test_amounts_past_decimal_range_saturate() {
        let mut alloc = NdAllocation::new(ManualField::Nd39);
        alloc.set_total(f64::MAX);
        alloc.set_manual_field(f64::MAX);
        alloc.set_total(f64::MAX);

        assert!(alloc.total() > 7.9e28 && alloc.total().is_finite());
        assert_eq!(alloc.nd30(), 0.0);
        assert!(alloc.unallocated().is_finite());
    }
}
