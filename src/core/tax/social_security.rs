use serde::Serialize;

use crate::core::types::FilingStatus;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsaThresholds {
    pub base: f64,
    pub max: f64,
}

pub fn ssa_thresholds(status: FilingStatus) -> SsaThresholds {
    match status {
        FilingStatus::Single | FilingStatus::HeadOfHousehold => SsaThresholds {
            base: 25_000.0,
            max: 34_000.0,
        },
        FilingStatus::MarriedFilingJointly => SsaThresholds {
            base: 32_000.0,
            max: 44_000.0,
        },
        FilingStatus::MarriedFilingSeparately => SsaThresholds {
            base: 0.0,
            max: 0.0,
        },
    }
}

pub fn provisional_income(ssa_income: f64, other_ordinary_income: f64, tax_exempt_interest: f64) -> f64 {
    other_ordinary_income + tax_exempt_interest + 0.5 * ssa_income
}

/// Taxable share of annual Social Security benefits under the three-tier
/// provisional income method. Never more than 85% of `ssa_income`.
pub fn taxable_ssa(
    ssa_income: f64,
    other_ordinary_income: f64,
    status: FilingStatus,
    tax_exempt_interest: f64,
) -> f64 {
    if ssa_income <= 0.0 {
        return 0.0;
    }

    let SsaThresholds { base, max } = ssa_thresholds(status);
    let provisional = provisional_income(ssa_income, other_ordinary_income, tax_exempt_interest);

    if provisional <= base {
        return 0.0;
    }

    if provisional <= max {
        return (0.5 * (provisional - base)).min(0.5 * ssa_income);
    }

    let fifty_percent_portion = 0.5 * (max - base);
    let eighty_five_percent_portion = 0.85 * (provisional - max);
    (fifty_percent_portion + eighty_five_percent_portion).min(0.85 * ssa_income)
}

pub fn non_taxable_ssa(
    ssa_income: f64,
    other_ordinary_income: f64,
    status: FilingStatus,
    tax_exempt_interest: f64,
) -> f64 {
    ssa_income - taxable_ssa(ssa_income, other_ordinary_income, status, tax_exempt_interest)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SsaTaxationSummary {
    pub ssa_income: f64,
    pub provisional_income: f64,
    pub taxable_ssa: f64,
    pub taxable_percentage: f64,
    pub tier: u8,
    pub base_threshold: f64,
    pub max_threshold: f64,
}

pub fn ssa_taxation_summary(
    ssa_income: f64,
    other_ordinary_income: f64,
    status: FilingStatus,
    tax_exempt_interest: f64,
) -> SsaTaxationSummary {
    let thresholds = ssa_thresholds(status);
    let provisional = provisional_income(ssa_income, other_ordinary_income, tax_exempt_interest);
    let taxable = taxable_ssa(ssa_income, other_ordinary_income, status, tax_exempt_interest);

    let taxable_percentage = if ssa_income > 0.0 {
        taxable / ssa_income * 100.0
    } else {
        0.0
    };

    let tier = if provisional <= thresholds.base {
        1
    } else if provisional <= thresholds.max {
        2
    } else {
        3
    };

    SsaTaxationSummary {
        ssa_income,
        provisional_income: provisional,
        taxable_ssa: taxable,
        taxable_percentage,
        tier,
        base_threshold: thresholds.base,
        max_threshold: thresholds.max,
    }
}
