use std::collections::BTreeMap;

use super::types::{AnnualSummary, MonthlyProjection, PortfolioGrowth, ProjectionSummary};

#[derive(Debug, Clone, Copy)]
pub struct AnnualAggregator<'a> {
    projections: &'a [MonthlyProjection],
}

impl<'a> AnnualAggregator<'a> {
    pub fn new(projections: &'a [MonthlyProjection]) -> Self {
        Self { projections }
    }

    pub fn aggregate(&self) -> Vec<AnnualSummary> {
        let mut by_year: BTreeMap<i32, AnnualSummary> = BTreeMap::new();
        for projection in self.projections {
            let year = projection.month.year();
            let summary = by_year.entry(year).or_insert(AnnualSummary {
                year,
                total_income_year: 0.0,
                end_of_year_total_investments: 0.0,
            });
            summary.total_income_year += projection.total_gross_cashflow;
            summary.end_of_year_total_investments = projection.total_investments;
        }
        by_year.into_values().collect()
    }

    pub fn year_data(&self, year: i32) -> Vec<&'a MonthlyProjection> {
        self.projections
            .iter()
            .filter(|p| p.month.year() == year)
            .collect()
    }

    pub fn total_income_by_year(&self) -> BTreeMap<i32, f64> {
        let mut totals = BTreeMap::new();
        for projection in self.projections {
            *totals.entry(projection.month.year()).or_insert(0.0) += projection.total_gross_cashflow;
        }
        totals
    }

    pub fn end_of_year_balances(&self) -> BTreeMap<i32, f64> {
        self.projections
            .iter()
            .map(|p| (p.month.year(), p.total_investments))
            .collect()
    }

    // Annualized change from the first to the last month's total, ignoring
    // cashflows. Zero under two months, within one calendar year, or from a
    // zero start.
    pub fn average_annual_return(&self) -> f64 {
        let (Some(first), Some(last)) = (self.projections.first(), self.projections.last()) else {
            return 0.0;
        };
        if self.projections.len() < 2 {
            return 0.0;
        }
        let years = last.month.year() - first.month.year();
        if years == 0 || first.total_investments == 0.0 {
            return 0.0;
        }
        (last.total_investments / first.total_investments).powf(1.0 / f64::from(years)) - 1.0
    }
}

pub fn portfolio_growth(projections: &[MonthlyProjection]) -> PortfolioGrowth {
    let (Some(first), Some(last)) = (projections.first(), projections.last()) else {
        return PortfolioGrowth::default();
    };
    let total_growth = last.total_investments - first.total_investments;
    PortfolioGrowth {
        starting_balance: first.total_investments,
        ending_balance: last.total_investments,
        total_growth,
        growth_percentage: if first.total_investments > 0.0 {
            total_growth / first.total_investments * 100.0
        } else {
            0.0
        },
    }
}

pub fn projection_summary(projections: &[MonthlyProjection]) -> Option<ProjectionSummary> {
    let last = projections.last()?;
    let total_income: f64 = projections.iter().map(|p| p.total_gross_cashflow).sum();
    Some(ProjectionSummary {
        total_months: projections.len(),
        total_income,
        average_monthly_income: total_income / projections.len() as f64,
        final_portfolio_value: last.total_investments,
        final_month: last.month,
    })
}
