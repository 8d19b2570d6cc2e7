use serde::Serialize;

use super::{Bracket, progressive_tax};
use crate::core::types::FilingStatus;

const SINGLE_2024: [Bracket; 7] = [
    Bracket::new(11_600.0, 0.10),
    Bracket::new(47_150.0, 0.12),
    Bracket::new(100_525.0, 0.22),
    Bracket::new(191_950.0, 0.24),
    Bracket::new(243_725.0, 0.32),
    Bracket::new(609_350.0, 0.35),
    Bracket::new(f64::INFINITY, 0.37),
];

const MARRIED_FILING_JOINTLY_2024: [Bracket; 7] = [
    Bracket::new(23_200.0, 0.10),
    Bracket::new(94_300.0, 0.12),
    Bracket::new(201_050.0, 0.22),
    Bracket::new(383_900.0, 0.24),
    Bracket::new(487_450.0, 0.32),
    Bracket::new(731_200.0, 0.35),
    Bracket::new(f64::INFINITY, 0.37),
];

const MARRIED_FILING_SEPARATELY_2024: [Bracket; 7] = [
    Bracket::new(11_600.0, 0.10),
    Bracket::new(47_150.0, 0.12),
    Bracket::new(100_525.0, 0.22),
    Bracket::new(191_950.0, 0.24),
    Bracket::new(243_725.0, 0.32),
    Bracket::new(365_600.0, 0.35),
    Bracket::new(f64::INFINITY, 0.37),
];

const HEAD_OF_HOUSEHOLD_2024: [Bracket; 7] = [
    Bracket::new(16_550.0, 0.10),
    Bracket::new(63_100.0, 0.12),
    Bracket::new(100_500.0, 0.22),
    Bracket::new(191_950.0, 0.24),
    Bracket::new(243_700.0, 0.32),
    Bracket::new(609_350.0, 0.35),
    Bracket::new(f64::INFINITY, 0.37),
];

pub fn federal_brackets(status: FilingStatus) -> &'static [Bracket] {
    match status {
        FilingStatus::Single => &SINGLE_2024,
        FilingStatus::MarriedFilingJointly => &MARRIED_FILING_JOINTLY_2024,
        FilingStatus::MarriedFilingSeparately => &MARRIED_FILING_SEPARATELY_2024,
        FilingStatus::HeadOfHousehold => &HEAD_OF_HOUSEHOLD_2024,
    }
}

pub fn standard_deduction(status: FilingStatus, override_amount: Option<f64>) -> f64 {
    if let Some(amount) = override_amount {
        return amount;
    }
    match status {
        FilingStatus::Single | FilingStatus::MarriedFilingSeparately => 14_600.0,
        FilingStatus::MarriedFilingJointly => 29_200.0,
        FilingStatus::HeadOfHousehold => 21_900.0,
    }
}

pub fn adjusted_gross_income(
    ordinary_income: f64,
    taxable_ssa_income: f64,
    capital_gains: f64,
    adjustments: f64,
) -> f64 {
    ordinary_income + taxable_ssa_income + capital_gains - adjustments
}

pub fn taxable_income(agi: f64, status: FilingStatus, deduction_override: Option<f64>) -> f64 {
    (agi - standard_deduction(status, deduction_override)).max(0.0)
}

pub fn federal_tax(taxable_income: f64, status: FilingStatus) -> f64 {
    progressive_tax(taxable_income, federal_brackets(status))
}

pub fn effective_tax_rate(total_tax: f64, agi: f64) -> f64 {
    if agi <= 0.0 { 0.0 } else { total_tax / agi }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BracketSlice {
    pub rate: f64,
    pub lower_limit: f64,
    pub upper_limit: Option<f64>,
    pub amount_in_bracket: f64,
    pub tax_in_bracket: f64,
}

pub fn bracket_breakdown(taxable_income: f64, status: FilingStatus) -> Vec<BracketSlice> {
    let mut slices = Vec::new();
    if taxable_income <= 0.0 {
        return slices;
    }

    let mut lower = 0.0;
    for bracket in federal_brackets(status) {
        if taxable_income <= lower {
            break;
        }
        let amount = taxable_income.min(bracket.upper) - lower;
        slices.push(BracketSlice {
            rate: bracket.rate,
            lower_limit: lower,
            upper_limit: bracket.upper.is_finite().then_some(bracket.upper),
            amount_in_bracket: amount,
            tax_in_bracket: amount * bracket.rate,
        });
        lower = bracket.upper;
    }
    slices
}
