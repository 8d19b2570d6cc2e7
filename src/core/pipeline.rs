use std::time::Instant;

use serde::Serialize;

use super::aggregator::{AnnualAggregator, portfolio_growth, projection_summary};
use super::budget::BudgetProcessor;
use super::error::ProjectionError;
use super::net_income::{
    DEFAULT_DEFICIT_MIN_MONTHS, annual_net_income_summaries, calculate_net_income,
    get_financial_summary, identify_deficit_periods,
};
use super::projector::ProjectionEngine;
use super::surplus::apply_surplus_to_accounts;
use super::tax::calculate_taxes;
use super::types::{
    AnnualNetIncomeSummary, AnnualSummary, DeficitPeriod, FinancialSummary, MonthlyProjection,
    NetIncomeProjection, PortfolioGrowth, ProjectionSummary, Scenario, TaxSummary,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionReport {
    pub scenario_id: String,
    pub scenario_name: String,
    pub calculation_time_ms: f64,
    pub monthly_projections: Vec<MonthlyProjection>,
    pub annual_summaries: Vec<AnnualSummary>,
    pub tax_summaries: Vec<TaxSummary>,
    pub net_income_projections: Vec<NetIncomeProjection>,
    pub annual_net_income: Vec<AnnualNetIncomeSummary>,
    pub financial_summary: FinancialSummary,
    pub deficit_periods: Vec<DeficitPeriod>,
    pub portfolio_growth: PortfolioGrowth,
    pub projection_summary: Option<ProjectionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickSummary {
    pub scenario_id: String,
    pub scenario_name: String,
    pub calculation_time_ms: f64,
    pub total_months: usize,
    pub starting_portfolio: f64,
    pub ending_portfolio: f64,
    pub portfolio_growth: f64,
    pub financial_summary: FinancialSummary,
}

impl From<&ProjectionReport> for QuickSummary {
    fn from(report: &ProjectionReport) -> Self {
        Self {
            scenario_id: report.scenario_id.clone(),
            scenario_name: report.scenario_name.clone(),
            calculation_time_ms: report.calculation_time_ms,
            total_months: report.monthly_projections.len(),
            starting_portfolio: report.portfolio_growth.starting_balance,
            ending_portfolio: report.portfolio_growth.ending_balance,
            portfolio_growth: report.portfolio_growth.total_growth,
            financial_summary: report.financial_summary,
        }
    }
}

pub fn run_scenario(scenario: &Scenario) -> Result<ProjectionReport, ProjectionError> {
    let started = Instant::now();
    tracing::info!(scenario_id = %scenario.scenario_id, "starting projection");

    let engine = ProjectionEngine::new(scenario)?;
    let mut monthly_projections = engine.run();
    tracing::info!(months = monthly_projections.len(), "generated monthly projections");

    let tax_summaries = calculate_taxes(
        &monthly_projections,
        &scenario.income_streams,
        scenario.tax_settings.filing_status,
        &scenario.global_settings.residence_state,
        scenario.tax_settings.standard_deduction_override,
    );
    tracing::info!(years = tax_summaries.len(), "calculated taxes");

    let mut budget = BudgetProcessor::new(&scenario.budget_settings, &scenario.people);
    let spending = monthly_projections
        .iter()
        .map(|p| budget.process_month(p.month, p.month.month()))
        .collect::<Vec<_>>();

    let net_income_projections = calculate_net_income(&monthly_projections, &tax_summaries, &spending)?;
    tracing::info!(months = net_income_projections.len(), "calculated net income");

    apply_surplus_to_accounts(&mut monthly_projections, &net_income_projections, &scenario.accounts)?;

    let annual_summaries = AnnualAggregator::new(&monthly_projections).aggregate();
    let report = ProjectionReport {
        scenario_id: scenario.scenario_id.clone(),
        scenario_name: scenario.scenario_name.clone(),
        calculation_time_ms: 0.0,
        annual_net_income: annual_net_income_summaries(&net_income_projections),
        financial_summary: get_financial_summary(&net_income_projections),
        deficit_periods: identify_deficit_periods(&net_income_projections, DEFAULT_DEFICIT_MIN_MONTHS),
        portfolio_growth: portfolio_growth(&monthly_projections),
        projection_summary: projection_summary(&monthly_projections),
        annual_summaries,
        tax_summaries,
        net_income_projections,
        monthly_projections,
    };

    let calculation_time_ms = started.elapsed().as_secs_f64() * 1_000.0;
    tracing::info!(
        scenario_id = %scenario.scenario_id,
        calculation_time_ms,
        "projection complete"
    );
    Ok(ProjectionReport {
        calculation_time_ms,
        ..report
    })
}
