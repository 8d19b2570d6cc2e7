mod accounts;
mod aggregator;
mod budget;
mod error;
mod filing;
mod income;
mod net_income;
mod pipeline;
mod projector;
mod surplus;
pub mod tax;
mod timeline;
mod types;
mod validation;

pub use accounts::AccountProcessor;
pub use aggregator::{AnnualAggregator, portfolio_growth, projection_summary};
pub use budget::{BudgetProcessor, estimate_lifetime_spending, inflation_adjusted_amount};
pub use error::{FieldViolation, MonthParseError, ProjectionError, ValidationErrors};
pub use filing::FilingStatusTracker;
pub use income::IncomeProcessor;
pub use net_income::{
    DEFAULT_DEFICIT_MIN_MONTHS, MonthlyTaxEstimate, NetIncomeCalculator,
    annual_net_income_summaries, calculate_net_income, get_financial_summary,
    identify_deficit_periods,
};
pub use pipeline::{ProjectionReport, QuickSummary, run_scenario};
pub use projector::{ProjectionEngine, run_projection};
pub use surplus::apply_surplus_to_accounts;
pub use tax::{TaxCalculator, calculate_taxes};
pub use timeline::{Timeline, YearMonth, months_between};
pub use types::{
    AnnualNetIncomeSummary, AnnualSummary, BudgetCategory, BudgetSettings, CategoryType,
    DeficitPeriod, FilingStatus, FinancialSummary, GlobalSettings, IncomeStream,
    IncomeStreamType, InvestmentAccount, MonthlyProjection, NetIncomeProjection, Person,
    PortfolioGrowth, ProjectionSummary, Scenario, SurvivorReductionMode, TaxBucket, TaxSettings,
    TaxSummary,
};
pub use validation::validate_scenario;
