use serde::{Deserialize, Serialize};

/// Deductible expense categories recognized by the estimator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionBreakdown {
    pub maintenance: i64,
    pub insurance: i64,
    pub property_tax: i64,
    pub other: i64,
}

impl DeductionBreakdown {
    pub fn total(&self) -> i64 {
        self.maintenance + self.insurance + self.property_tax + self.other
    }

    fn first_negative(&self) -> Option<(&'static str, i64)> {
        [
            ("maintenance", self.maintenance),
            ("insurance", self.insurance),
            ("property_tax", self.property_tax),
            ("other", self.other),
        ]
        .into_iter()
        .find(|(_, amount)| *amount < 0)
    }
}

/// Estimated liability for one fiscal year. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub year: i32,
    pub total_income: i64,
    pub total_expenses: i64,
    pub net_income: i64,
    pub estimated_tax: i64,
    pub tax_rate: f64,
    pub deductions: DeductionBreakdown,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TaxInputError {
    #[error("income must be non-negative, got {0}")]
    NegativeIncome(i64),
    #[error("deduction '{category}' must be non-negative, got {amount}")]
    NegativeDeduction { category: &'static str, amount: i64 },
    #[error("tax rate must be between 0 and 100 percent, got {0}")]
    InvalidRate(f64),
}

/// Estimate the year's tax liability at a flat percentage rate.
///
/// Negative net income is a legitimate outcome (expenses exceeded income)
/// and yields zero tax; negative inputs are rejected before any computation.
pub fn estimate(
    year: i32,
    income: i64,
    deductions: DeductionBreakdown,
    tax_rate: f64,
) -> Result<TaxSummary, TaxInputError> {
    if income < 0 {
        return Err(TaxInputError::NegativeIncome(income));
    }
    if let Some((category, amount)) = deductions.first_negative() {
        return Err(TaxInputError::NegativeDeduction { category, amount });
    }
    if !tax_rate.is_finite() || !(0.0..=100.0).contains(&tax_rate) {
        return Err(TaxInputError::InvalidRate(tax_rate));
    }

    let total_expenses = deductions.total();
    let net_income = income - total_expenses;
    let taxable = net_income.max(0);
    let estimated_tax = (taxable as f64 * tax_rate / 100.0).round() as i64;

    Ok(TaxSummary {
        year,
        total_income: income,
        total_expenses,
        net_income,
        estimated_tax,
        tax_rate,
        deductions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_deductions() -> DeductionBreakdown {
        DeductionBreakdown {
            maintenance: 2_000,
            insurance: 500,
            property_tax: 500,
            other: 0,
        }
    }

    #[test]
    fn estimates_flat_rate_on_net_income() {
        let summary =
            estimate(2025, 10_000, standard_deductions(), 20.0).expect("valid inputs estimate");

        assert_eq!(summary.total_expenses, 3_000);
        assert_eq!(summary.net_income, 7_000);
        assert_eq!(summary.estimated_tax, 1_400);
        assert_eq!(summary.year, 2025);
    }

    #[test]
    fn negative_net_income_yields_zero_tax() {
        let summary =
            estimate(2025, 1_000, standard_deductions(), 20.0).expect("loss year still estimates");

        assert_eq!(summary.net_income, -2_000);
        assert_eq!(summary.estimated_tax, 0);
    }

    #[test]
    fn rejects_negative_income() {
        let error = estimate(2025, -100, standard_deductions(), 20.0).expect_err("negative income");
        assert_eq!(error, TaxInputError::NegativeIncome(-100));
    }

    #[test]
    fn rejects_negative_deduction_naming_the_category() {
        let deductions = DeductionBreakdown {
            insurance: -50,
            ..standard_deductions()
        };
        let error = estimate(2025, 10_000, deductions, 20.0).expect_err("negative deduction");
        assert_eq!(
            error,
            TaxInputError::NegativeDeduction {
                category: "insurance",
                amount: -50
            }
        );
    }

    #[test]
    fn rejects_out_of_range_rates() {
        assert!(matches!(
            estimate(2025, 10_000, standard_deductions(), -1.0),
            Err(TaxInputError::InvalidRate(_))
        ));
        assert!(matches!(
            estimate(2025, 10_000, standard_deductions(), 120.0),
            Err(TaxInputError::InvalidRate(_))
        ));
    }

    #[test]
    fn zero_rate_is_allowed() {
        let summary = estimate(2025, 10_000, standard_deductions(), 0.0).expect("zero rate");
        assert_eq!(summary.estimated_tax, 0);
    }
}
