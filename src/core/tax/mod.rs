pub mod federal;
pub mod social_security;
pub mod state;

use std::collections::{BTreeMap, BTreeSet};

use super::types::{FilingStatus, IncomeStream, IncomeStreamType, MonthlyProjection, TaxBucket, TaxSummary};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub upper: f64,
    pub rate: f64,
}

impl Bracket {
    pub const fn new(upper: f64, rate: f64) -> Self {
        Self { upper, rate }
    }
}

pub fn progressive_tax(income: f64, brackets: &[Bracket]) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }
    let mut tax = 0.0;
    let mut lower = 0.0;
    for bracket in brackets {
        if income <= lower {
            break;
        }
        tax += (income.min(bracket.upper) - lower) * bracket.rate;
        lower = bracket.upper;
    }
    tax
}

pub fn monthly_estimate(annual: f64, months: u32) -> f64 {
    if months == 0 { 0.0 } else { annual / f64::from(months) }
}

#[derive(Debug, Default, Clone, Copy)]
struct YearTotals {
    ssa_income: f64,
    other_ordinary_income: f64,
    filing_status: Option<FilingStatus>,
}

#[derive(Debug, Clone)]
pub struct TaxCalculator {
    filing_status: FilingStatus,
    residence_state: String,
    standard_deduction_override: Option<f64>,
}

impl TaxCalculator {
    pub fn new(
        filing_status: FilingStatus,
        residence_state: impl Into<String>,
        standard_deduction_override: Option<f64>,
    ) -> Self {
        Self {
            filing_status,
            residence_state: residence_state.into(),
            standard_deduction_override,
        }
    }

    pub fn calculate_annual_taxes(
        &self,
        year: i32,
        filing_status: FilingStatus,
        ssa_income: f64,
        other_ordinary_income: f64,
        tax_exempt_interest: f64,
    ) -> TaxSummary {
        let taxable_ssa_income = social_security::taxable_ssa(
            ssa_income,
            other_ordinary_income,
            filing_status,
            tax_exempt_interest,
        );
        let agi = federal::adjusted_gross_income(other_ordinary_income, taxable_ssa_income, 0.0, 0.0);
        let standard_deduction =
            federal::standard_deduction(filing_status, self.standard_deduction_override);
        let taxable_income =
            federal::taxable_income(agi, filing_status, self.standard_deduction_override);
        let federal_tax = federal::federal_tax(taxable_income, filing_status);
        let state_tax = state::state_tax(agi, &self.residence_state, filing_status);
        let total_tax = federal_tax + state_tax;

        TaxSummary {
            year,
            filing_status,
            total_ssa_income: ssa_income,
            taxable_ssa_income,
            other_ordinary_income,
            agi,
            standard_deduction,
            taxable_income,
            federal_tax,
            state_tax,
            total_tax,
            effective_tax_rate: federal::effective_tax_rate(total_tax, agi),
        }
    }

    /// One summary per calendar year present in `projections`, ascending.
    ///
    /// Social Security streams are identified by type. Ordinary income is
    /// every other stream plus withdrawals from non-Roth buckets. Each year
    /// is taxed under the filing status of its last projected month.
    pub fn calculate_taxes_from_monthly_projections(
        &self,
        projections: &[MonthlyProjection],
        streams: &[IncomeStream],
    ) -> Vec<TaxSummary> {
        let ssa_stream_ids: BTreeSet<&str> = streams
            .iter()
            .filter(|s| s.stream_type == IncomeStreamType::SocialSecurity)
            .map(|s| s.stream_id.as_str())
            .collect();

        let mut by_year: BTreeMap<i32, YearTotals> = BTreeMap::new();
        for projection in projections {
            let totals = by_year.entry(projection.month.year()).or_default();
            for (stream_id, amount) in &projection.income_by_stream {
                if ssa_stream_ids.contains(stream_id.as_str()) {
                    totals.ssa_income += amount;
                } else {
                    totals.other_ordinary_income += amount;
                }
            }
            totals.other_ordinary_income += projection
                .withdrawals_by_tax_bucket
                .iter()
                .filter(|(bucket, _)| **bucket != TaxBucket::Roth)
                .map(|(_, amount)| amount)
                .sum::<f64>();
            totals.filing_status = Some(projection.filing_status);
        }

        by_year
            .into_iter()
            .map(|(year, totals)| {
                self.calculate_annual_taxes(
                    year,
                    totals.filing_status.unwrap_or(self.filing_status),
                    totals.ssa_income,
                    totals.other_ordinary_income,
                    0.0,
                )
            })
            .collect()
    }

    pub fn estimate_monthly_taxes(&self, annual_federal: f64, annual_state: f64, months: u32) -> (f64, f64) {
        (
            monthly_estimate(annual_federal, months),
            monthly_estimate(annual_state, months),
        )
    }
}

pub fn calculate_taxes(
    projections: &[MonthlyProjection],
    streams: &[IncomeStream],
    filing_status: FilingStatus,
    residence_state: &str,
    standard_deduction_override: Option<f64>,
) -> Vec<TaxSummary> {
    TaxCalculator::new(filing_status, residence_state, standard_deduction_override)
        .calculate_taxes_from_monthly_projections(projections, streams)
}
