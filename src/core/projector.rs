use super::accounts::AccountProcessor;
use super::error::ProjectionError;
use super::filing::FilingStatusTracker;
use super::income::IncomeProcessor;
use super::timeline::Timeline;
use super::types::{MonthlyProjection, Scenario};
use super::validation::validate_scenario;

#[derive(Debug)]
pub struct ProjectionEngine<'a> {
    scenario: &'a Scenario,
    timeline: Timeline,
    filing: FilingStatusTracker,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(scenario: &'a Scenario) -> Result<Self, ProjectionError> {
        validate_scenario(scenario)?;
        let settings = &scenario.global_settings;
        Ok(Self {
            scenario,
            timeline: Timeline::new(settings.projection_start_month, settings.projection_end_year),
            filing: FilingStatusTracker::new(&scenario.people, scenario.tax_settings.filing_status),
        })
    }

    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    pub fn run(&self) -> Vec<MonthlyProjection> {
        let mut income = IncomeProcessor::new(&self.scenario.income_streams);
        let mut accounts = AccountProcessor::new(&self.scenario.accounts);
        let mut projections = Vec::with_capacity(self.timeline.total_months());

        for (month, _) in self.timeline.months() {
            let filing_status = self.filing.status_for(month);
            let income_by_stream = income.process_month(month);
            let (withdrawals_by_account, balances_by_account) = accounts.process_month(month, 0.0);

            let total_income = income.total_income(&income_by_stream);
            let total_withdrawals: f64 = withdrawals_by_account.values().sum();

            projections.push(MonthlyProjection {
                month,
                withdrawals_by_tax_bucket: accounts.withdrawals_by_tax_bucket(&withdrawals_by_account),
                balances_by_tax_bucket: accounts.balances_by_tax_bucket(),
                total_investments: accounts.total_balance(),
                total_gross_cashflow: total_income + total_withdrawals,
                income_by_stream,
                withdrawals_by_account,
                balances_by_account,
                filing_status,
            });
        }

        projections
    }
}

pub fn run_projection(scenario: &Scenario) -> Result<Vec<MonthlyProjection>, ProjectionError> {
    Ok(ProjectionEngine::new(scenario)?.run())
}
