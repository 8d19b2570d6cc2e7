use std::collections::BTreeMap;

use super::error::ProjectionError;
use super::tax::monthly_estimate;
use super::timeline::YearMonth;
use super::types::{
    AnnualNetIncomeSummary, DeficitPeriod, FinancialSummary, MonthlyProjection,
    NetIncomeProjection, TaxSummary,
};

pub const DEFAULT_DEFICIT_MIN_MONTHS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthlyTaxEstimate {
    pub federal: f64,
    pub state: f64,
    pub total: f64,
}

#[derive(Debug, Clone)]
pub struct NetIncomeCalculator {
    monthly_taxes: BTreeMap<i32, MonthlyTaxEstimate>,
}

impl NetIncomeCalculator {
    pub fn new(tax_summaries: &[TaxSummary]) -> Self {
        let monthly_taxes = tax_summaries
            .iter()
            .map(|summary| {
                (
                    summary.year,
                    MonthlyTaxEstimate {
                        federal: monthly_estimate(summary.federal_tax, 12),
                        state: monthly_estimate(summary.state_tax, 12),
                        total: monthly_estimate(summary.total_tax, 12),
                    },
                )
            })
            .collect();
        Self { monthly_taxes }
    }

    pub fn monthly_tax_estimate(&self, month: YearMonth) -> MonthlyTaxEstimate {
        self.monthly_taxes
            .get(&month.year())
            .copied()
            .unwrap_or_default()
    }

    pub fn create_projection(&self, projection: &MonthlyProjection, spending: f64) -> NetIncomeProjection {
        let tax = self.monthly_tax_estimate(projection.month);
        let net_income_after_tax = projection.total_gross_cashflow - tax.total;
        NetIncomeProjection {
            month: projection.month,
            gross_cashflow: projection.total_gross_cashflow,
            estimated_federal_tax: tax.federal,
            estimated_state_tax: tax.state,
            estimated_total_tax: tax.total,
            net_income_after_tax,
            inflation_adjusted_spending: spending,
            surplus_deficit: net_income_after_tax - spending,
        }
    }
}

pub fn calculate_net_income(
    projections: &[MonthlyProjection],
    tax_summaries: &[TaxSummary],
    spending: &[f64],
) -> Result<Vec<NetIncomeProjection>, ProjectionError> {
    if projections.len() != spending.len() {
        return Err(ProjectionError::LengthMismatch {
            projections: projections.len(),
            spending: spending.len(),
        });
    }
    let calculator = NetIncomeCalculator::new(tax_summaries);
    Ok(projections
        .iter()
        .zip(spending)
        .map(|(projection, amount)| calculator.create_projection(projection, *amount))
        .collect())
}

pub fn get_financial_summary(net_income: &[NetIncomeProjection]) -> FinancialSummary {
    if net_income.is_empty() {
        return FinancialSummary::default();
    }

    let total_surplus_deficit: f64 = net_income.iter().map(|p| p.surplus_deficit).sum();
    FinancialSummary {
        total_gross_income: net_income.iter().map(|p| p.gross_cashflow).sum(),
        total_taxes: net_income.iter().map(|p| p.estimated_total_tax).sum(),
        total_spending: net_income.iter().map(|p| p.inflation_adjusted_spending).sum(),
        total_surplus_deficit,
        average_monthly_surplus_deficit: total_surplus_deficit / net_income.len() as f64,
        months_in_surplus: net_income.iter().filter(|p| p.surplus_deficit > 0.0).count(),
        months_in_deficit: net_income.iter().filter(|p| p.surplus_deficit < 0.0).count(),
        total_months: net_income.len(),
    }
}

pub fn annual_net_income_summaries(net_income: &[NetIncomeProjection]) -> Vec<AnnualNetIncomeSummary> {
    let mut by_year: BTreeMap<i32, Vec<&NetIncomeProjection>> = BTreeMap::new();
    for projection in net_income {
        by_year.entry(projection.month.year()).or_default().push(projection);
    }

    by_year
        .into_iter()
        .map(|(year, months)| {
            let total_surplus_deficit: f64 = months.iter().map(|p| p.surplus_deficit).sum();
            AnnualNetIncomeSummary {
                year,
                total_gross_income: months.iter().map(|p| p.gross_cashflow).sum(),
                total_taxes: months.iter().map(|p| p.estimated_total_tax).sum(),
                total_net_income: months.iter().map(|p| p.net_income_after_tax).sum(),
                total_spending: months.iter().map(|p| p.inflation_adjusted_spending).sum(),
                total_surplus_deficit,
                average_monthly_surplus: total_surplus_deficit / months.len() as f64,
            }
        })
        .collect()
}

/// Runs of consecutive deficit months at least `min_months` long. A month
/// with exactly zero surplus ends a run.
pub fn identify_deficit_periods(net_income: &[NetIncomeProjection], min_months: usize) -> Vec<DeficitPeriod> {
    let mut periods = Vec::new();
    let mut current: Option<DeficitPeriod> = None;

    for projection in net_income {
        if projection.surplus_deficit < 0.0 {
            match current.as_mut() {
                Some(period) => {
                    period.end_month = projection.month;
                    period.total_deficit += projection.surplus_deficit;
                    period.months += 1;
                }
                None => {
                    current = Some(DeficitPeriod {
                        start_month: projection.month,
                        end_month: projection.month,
                        total_deficit: projection.surplus_deficit,
                        months: 1,
                    });
                }
            }
        } else if let Some(period) = current.take() {
            if period.months >= min_months {
                periods.push(period);
            }
        }
    }

    if let Some(period) = current {
        if period.months >= min_months {
            periods.push(period);
        }
    }
    periods
}
