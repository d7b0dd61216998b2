//! Projection calculators for systematic investment and withdrawal plans.
//!
//! Rates are annual percentages compounded monthly. Every calculator is pure
//! and rejects negative or non-finite inputs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Months a withdrawal plan is simulated before it counts as sustainable.
pub const SWP_HORIZON_MONTHS: u32 = 50 * 12;

/// Annual share of the corpus the 4% rule allows withdrawing.
const SAFE_WITHDRAWAL_RATE: f64 = 0.04;

#[derive(Debug, Error, PartialEq)]
pub enum CalculatorError {
    #[error("{field} must be a finite, non-negative number")]
    InvalidInput { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SipProjection {
    pub invested: f64,
    pub estimated_returns: f64,
    pub future_value: f64,
    pub cagr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepUpProjection {
    pub invested: f64,
    pub estimated_returns: f64,
    pub maturity_value: f64,
    /// Maturity of the same plan without yearly increases.
    pub regular_value: f64,
    pub regular_invested: f64,
    pub additional_gain: f64,
    /// Monthly contribution during the final year.
    pub final_monthly: f64,
    pub cagr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalOutcome {
    pub total_withdrawals: f64,
    pub remaining_value: f64,
    pub months_lasted: u32,
    /// The corpus survived the whole simulation horizon.
    pub sustainable: bool,
    pub cagr: f64,
    pub safe_monthly_withdrawal: f64,
}

impl WithdrawalOutcome {
    pub fn years_lasted(&self) -> f64 {
        f64::from(self.months_lasted) / 12.0
    }
}

/// Future value of a fixed monthly contribution paid at the start of each
/// month.
pub fn sip(monthly: f64, annual_rate: f64, years: u32) -> Result<SipProjection, CalculatorError> {
    check("monthly amount", monthly)?;
    check("expected return", annual_rate)?;
    let rate = monthly_rate(annual_rate);
    let months = f64::from(years) * 12.0;
    let future_value = monthly * annuity_due_factor(rate, months);
    let invested = monthly * months;
    Ok(SipProjection {
        invested,
        estimated_returns: future_value - invested,
        future_value,
        cagr: cagr(future_value, invested, f64::from(years)),
    })
}

/// A monthly plan whose contribution grows by `step_up` percent at the start
/// of every year after the first.
pub fn step_up_sip(
    initial_monthly: f64,
    annual_rate: f64,
    years: u32,
    step_up: f64,
) -> Result<StepUpProjection, CalculatorError> {
    check("monthly amount", initial_monthly)?;
    check("expected return", annual_rate)?;
    check("step-up", step_up)?;
    let rate = monthly_rate(annual_rate);
    let total_months = years.saturating_mul(12);

    let mut contribution = initial_monthly;
    let mut invested = 0.0;
    let mut maturity_value = 0.0;
    for month in 1..=total_months {
        if month > 1 && (month - 1) % 12 == 0 {
            contribution *= 1.0 + step_up / 100.0;
        }
        invested += contribution;
        let remaining = f64::from(total_months - month + 1);
        maturity_value += contribution * (1.0 + rate).powf(remaining);
    }

    let regular_value = initial_monthly * annuity_due_factor(rate, f64::from(total_months));
    Ok(StepUpProjection {
        invested,
        estimated_returns: maturity_value - invested,
        maturity_value,
        regular_value,
        regular_invested: initial_monthly * f64::from(total_months),
        additional_gain: maturity_value - regular_value,
        final_monthly: contribution,
        cagr: cagr(maturity_value, invested, f64::from(years)),
    })
}

/// Simulates monthly growth followed by a fixed withdrawal until the corpus
/// runs out or the horizon ends. The last withdrawal takes whatever is left.
pub fn swp(
    corpus: f64,
    monthly_withdrawal: f64,
    annual_rate: f64,
) -> Result<WithdrawalOutcome, CalculatorError> {
    check("corpus", corpus)?;
    check("monthly withdrawal", monthly_withdrawal)?;
    check("expected return", annual_rate)?;
    let rate = monthly_rate(annual_rate);

    let mut value = corpus;
    let mut months = 0;
    let mut total_withdrawals = 0.0;
    while value > 0.0 && months < SWP_HORIZON_MONTHS {
        value *= 1.0 + rate;
        months += 1;
        if value >= monthly_withdrawal {
            value -= monthly_withdrawal;
            total_withdrawals += monthly_withdrawal;
        } else {
            total_withdrawals += value;
            value = 0.0;
        }
    }

    let sustainable = months >= SWP_HORIZON_MONTHS;
    let cagr = if sustainable {
        annual_rate
    } else {
        cagr(value + total_withdrawals, corpus, f64::from(months) / 12.0)
    };
    Ok(WithdrawalOutcome {
        total_withdrawals,
        remaining_value: value,
        months_lasted: months,
        sustainable,
        cagr,
        safe_monthly_withdrawal: corpus * SAFE_WITHDRAWAL_RATE / 12.0,
    })
}

fn check(field: &'static str, value: f64) -> Result<(), CalculatorError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CalculatorError::InvalidInput { field })
    }
}

fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 100.0 / 12.0
}

/// Growth of one unit paid at the start of each of `months` periods.
fn annuity_due_factor(rate: f64, months: f64) -> f64 {
    if rate == 0.0 {
        return months;
    }
    ((1.0 + rate).powf(months) - 1.0) / rate * (1.0 + rate)
}

/// Compound annual growth as a percentage; zero when undefined.
fn cagr(final_value: f64, initial: f64, years: f64) -> f64 {
    if initial <= 0.0 || years <= 0.0 {
        return 0.0;
    }
    let growth = ((final_value / initial).powf(1.0 / years) - 1.0) * 100.0;
    if growth.is_finite() {
        growth
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn sip_compounds_monthly_contributions() {
        let projection = sip(1000.0, 12.0, 1).unwrap();
        assert_eq!(projection.invested, 12000.0);
        assert!(close(projection.future_value, 12809.33));
        assert!(close(projection.estimated_returns, 809.33));
    }

    #[test]
    fn zero_rate_sip_returns_contributions() {
        let projection = sip(500.0, 0.0, 2).unwrap();
        assert_eq!(projection.future_value, 12000.0);
        assert_eq!(projection.estimated_returns, 0.0);
        assert_eq!(projection.cagr, 0.0);
    }

    #[test]
    fn step_up_without_increase_matches_regular_plan() {
        let flat = step_up_sip(1000.0, 12.0, 2, 0.0).unwrap();
        let regular = sip(1000.0, 12.0, 2).unwrap();
        assert!(close(flat.maturity_value, regular.future_value));
        assert!(close(flat.additional_gain, 0.0));
        assert_eq!(flat.invested, flat.regular_invested);
    }

    #[test]
    fn step_up_raises_contribution_each_year() {
        let projection = step_up_sip(1000.0, 12.0, 2, 10.0).unwrap();
        assert!(close(projection.invested, 25200.0));
        assert!(close(projection.final_monthly, 1100.0));
        assert!(projection.additional_gain > 0.0);
    }

    #[test]
    fn withdrawals_drain_a_flat_corpus() {
        let outcome = swp(10000.0, 1000.0, 0.0).unwrap();
        assert_eq!(outcome.months_lasted, 10);
        assert_eq!(outcome.total_withdrawals, 10000.0);
        assert_eq!(outcome.remaining_value, 0.0);
        assert!(!outcome.sustainable);
        assert_eq!(outcome.cagr, 0.0);
    }

    #[test]
    fn final_withdrawal_takes_the_remainder() {
        let outcome = swp(2500.0, 1000.0, 0.0).unwrap();
        assert_eq!(outcome.months_lasted, 3);
        assert_eq!(outcome.total_withdrawals, 2500.0);
    }

    #[test]
    fn withdrawals_below_growth_are_sustainable() {
        let outcome = swp(100_000.0, 100.0, 12.0).unwrap();
        assert!(outcome.sustainable);
        assert_eq!(outcome.months_lasted, SWP_HORIZON_MONTHS);
        assert_eq!(outcome.years_lasted(), 50.0);
        assert_eq!(outcome.cagr, 12.0);
        assert!(close(outcome.safe_monthly_withdrawal, 333.33));
    }

    #[test]
    fn negative_inputs_are_rejected() {
        assert_eq!(
            sip(-1.0, 12.0, 1),
            Err(CalculatorError::InvalidInput {
                field: "monthly amount"
            })
        );
        assert!(swp(1000.0, 10.0, f64::NAN).is_err());
        assert!(step_up_sip(1000.0, 12.0, 1, -5.0).is_err());
    }
}
