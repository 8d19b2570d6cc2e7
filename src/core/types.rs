use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::timeline::YearMonth;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxBucket {
    Taxable,
    TaxDeferred,
    Roth,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeStreamType {
    Pension,
    SocialSecurity,
    Salary,
    SelfEmployment,
    Other,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
}

impl FilingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedFilingJointly => "married_filing_jointly",
            FilingStatus::MarriedFilingSeparately => "married_filing_separately",
            FilingStatus::HeadOfHousehold => "head_of_household",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Fixed,
    Flexible,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurvivorReductionMode {
    #[default]
    FlexOnly,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: String,
    pub name: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub life_expectancy_years: Option<u32>,
}

impl Person {
    pub fn death_year_month(&self) -> Option<YearMonth> {
        let years = i32::try_from(self.life_expectancy_years?).ok()?;
        YearMonth::new(self.birth_date.year() + years, self.birth_date.month()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStream {
    pub stream_id: String,
    #[serde(rename = "type")]
    pub stream_type: IncomeStreamType,
    pub owner_person_id: String,
    pub start_month: YearMonth,
    #[serde(default)]
    pub end_month: Option<YearMonth>,
    pub monthly_amount_at_start: f64,
    #[serde(default)]
    pub cola_percent_annual: f64,
    #[serde(default = "default_cola_month")]
    pub cola_month: u32,
}

impl IncomeStream {
    pub fn is_active(&self, month: YearMonth) -> bool {
        if month.is_before(self.start_month) {
            return false;
        }
        !matches!(self.end_month, Some(end) if month.is_after(end))
    }
}

fn default_cola_month() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAccount {
    pub account_id: String,
    pub name: String,
    pub tax_bucket: TaxBucket,
    pub starting_balance: f64,
    pub annual_return_rate: f64,
    #[serde(default)]
    pub monthly_contribution: f64,
    #[serde(default)]
    pub contribution_start_month: Option<YearMonth>,
    #[serde(default)]
    pub contribution_end_month: Option<YearMonth>,
    #[serde(default)]
    pub monthly_withdrawal: f64,
    #[serde(default)]
    pub withdrawal_start_month: Option<YearMonth>,
    #[serde(default)]
    pub withdrawal_end_month: Option<YearMonth>,
    #[serde(default)]
    pub receives_surplus: bool,
}

impl InvestmentAccount {
    pub fn monthly_return_rate(&self) -> f64 {
        (1.0 + self.annual_return_rate).powf(1.0 / 12.0) - 1.0
    }

    pub fn contributes_in(&self, month: YearMonth) -> bool {
        within_window(month, self.contribution_start_month, self.contribution_end_month)
    }

    pub fn withdraws_in(&self, month: YearMonth) -> bool {
        within_window(month, self.withdrawal_start_month, self.withdrawal_end_month)
    }
}

fn within_window(month: YearMonth, start: Option<YearMonth>, end: Option<YearMonth>) -> bool {
    if matches!(start, Some(start) if month.is_before(start)) {
        return false;
    }
    !matches!(end, Some(end) if month.is_after(end))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    pub category_name: String,
    pub category_type: CategoryType,
    pub monthly_amount: f64,
    #[serde(default = "default_true")]
    pub include: bool,
    #[serde(default)]
    pub end_month: Option<YearMonth>,
}

impl BudgetCategory {
    pub fn is_active(&self, month: YearMonth) -> bool {
        !matches!(self.end_month, Some(end) if month.is_after(end))
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSettings {
    #[serde(default)]
    pub categories: Vec<BudgetCategory>,
    #[serde(default = "default_inflation")]
    pub inflation_annual_percent: f64,
    #[serde(default)]
    pub survivor_flexible_reduction_percent: f64,
    #[serde(default)]
    pub survivor_reduction_mode: SurvivorReductionMode,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            inflation_annual_percent: default_inflation(),
            survivor_flexible_reduction_percent: 0.0,
            survivor_reduction_mode: SurvivorReductionMode::FlexOnly,
        }
    }
}

impl BudgetSettings {
    pub fn total_monthly_spending(&self) -> f64 {
        self.categories
            .iter()
            .filter(|c| c.include)
            .map(|c| c.monthly_amount)
            .sum()
    }

    pub fn total_fixed_spending(&self) -> f64 {
        self.total_for(CategoryType::Fixed)
    }

    pub fn total_flexible_spending(&self) -> f64 {
        self.total_for(CategoryType::Flexible)
    }

    fn total_for(&self, kind: CategoryType) -> f64 {
        self.categories
            .iter()
            .filter(|c| c.include && c.category_type == kind)
            .map(|c| c.monthly_amount)
            .sum()
    }
}

fn default_inflation() -> f64 {
    0.025
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSettings {
    pub filing_status: FilingStatus,
    #[serde(default)]
    pub standard_deduction_override: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub projection_start_month: YearMonth,
    pub projection_end_year: i32,
    pub residence_state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: String,
    pub scenario_name: String,
    #[serde(default)]
    pub description: String,
    pub global_settings: GlobalSettings,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub income_streams: Vec<IncomeStream>,
    #[serde(default)]
    pub accounts: Vec<InvestmentAccount>,
    #[serde(default, alias = "budget")]
    pub budget_settings: BudgetSettings,
    pub tax_settings: TaxSettings,
}

impl Scenario {
    pub fn surplus_account(&self) -> Option<&InvestmentAccount> {
        self.accounts.iter().find(|a| a.receives_surplus)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProjection {
    pub month: YearMonth,
    pub income_by_stream: BTreeMap<String, f64>,
    pub withdrawals_by_account: BTreeMap<String, f64>,
    pub withdrawals_by_tax_bucket: BTreeMap<TaxBucket, f64>,
    pub balances_by_account: BTreeMap<String, f64>,
    pub balances_by_tax_bucket: BTreeMap<TaxBucket, f64>,
    pub total_investments: f64,
    pub total_gross_cashflow: f64,
    pub filing_status: FilingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaxSummary {
    pub year: i32,
    pub filing_status: FilingStatus,
    pub total_ssa_income: f64,
    pub taxable_ssa_income: f64,
    pub other_ordinary_income: f64,
    pub agi: f64,
    pub standard_deduction: f64,
    pub taxable_income: f64,
    pub federal_tax: f64,
    pub state_tax: f64,
    pub total_tax: f64,
    pub effective_tax_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetIncomeProjection {
    pub month: YearMonth,
    pub gross_cashflow: f64,
    pub estimated_federal_tax: f64,
    pub estimated_state_tax: f64,
    pub estimated_total_tax: f64,
    pub net_income_after_tax: f64,
    pub inflation_adjusted_spending: f64,
    pub surplus_deficit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnualSummary {
    pub year: i32,
    pub total_income_year: f64,
    pub end_of_year_total_investments: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnualNetIncomeSummary {
    pub year: i32,
    pub total_gross_income: f64,
    pub total_taxes: f64,
    pub total_net_income: f64,
    pub total_spending: f64,
    pub total_surplus_deficit: f64,
    pub average_monthly_surplus: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub total_gross_income: f64,
    pub total_taxes: f64,
    pub total_spending: f64,
    pub total_surplus_deficit: f64,
    pub average_monthly_surplus_deficit: f64,
    pub months_in_surplus: usize,
    pub months_in_deficit: usize,
    pub total_months: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeficitPeriod {
    pub start_month: YearMonth,
    pub end_month: YearMonth,
    pub total_deficit: f64,
    pub months: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PortfolioGrowth {
    pub starting_balance: f64,
    pub ending_balance: f64,
    pub total_growth: f64,
    pub growth_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionSummary {
    pub total_months: usize,
    pub total_income: f64,
    pub average_monthly_income: f64,
    pub final_portfolio_value: f64,
    pub final_month: YearMonth,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(s: &str) -> YearMonth {
        s.parse().expect("valid month")
    }

    #[test]
    fn death_year_month_keeps_birth_month() {
        let person = Person {
            person_id: "p1".to_string(),
            name: "Jon".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1963, 6, 9).expect("valid date"),
            life_expectancy_years: Some(83),
        };
        assert_eq!(person.death_year_month(), Some(ym("2046-06")));

        let immortal = Person {
            life_expectancy_years: None,
            ..person
        };
        assert_eq!(immortal.death_year_month(), None);
    }

    #[test]
    fn monthly_return_rate_compounds_to_annual() {
        let account = InvestmentAccount {
            account_id: "a".to_string(),
            name: "A".to_string(),
            tax_bucket: TaxBucket::Taxable,
            starting_balance: 0.0,
            annual_return_rate: 0.06,
            monthly_contribution: 0.0,
            contribution_start_month: None,
            contribution_end_month: None,
            monthly_withdrawal: 0.0,
            withdrawal_start_month: None,
            withdrawal_end_month: None,
            receives_surplus: false,
        };
        let compounded = (1.0 + account.monthly_return_rate()).powi(12);
        assert!((compounded - 1.06).abs() < 1e-12);
    }

    #[test]
    fn windows_are_inclusive_on_both_ends() {
        let stream = IncomeStream {
            stream_id: "s".to_string(),
            stream_type: IncomeStreamType::Salary,
            owner_person_id: "p1".to_string(),
            start_month: ym("2026-03"),
            end_month: Some(ym("2026-06")),
            monthly_amount_at_start: 1.0,
            cola_percent_annual: 0.0,
            cola_month: 1,
        };
        assert!(!stream.is_active(ym("2026-02")));
        assert!(stream.is_active(ym("2026-03")));
        assert!(stream.is_active(ym("2026-06")));
        assert!(!stream.is_active(ym("2026-07")));
    }

    #[test]
    fn scenario_json_applies_defaults() {
        let json = r#"{
            "scenario_id": "s1",
            "scenario_name": "Base",
            "global_settings": {
                "projection_start_month": "2026-01",
                "projection_end_year": 2030,
                "residence_state": "AZ"
            },
            "income_streams": [{
                "stream_id": "pension",
                "type": "pension",
                "owner_person_id": "p1",
                "start_month": "2026-01",
                "monthly_amount_at_start": 5000.0
            }],
            "budget": {
                "categories": [{
                    "category_name": "Travel",
                    "category_type": "flexible",
                    "monthly_amount": 400.0
                }]
            },
            "tax_settings": { "filing_status": "married_filing_jointly" }
        }"#;

        let scenario: Scenario = serde_json::from_str(json).expect("valid scenario json");
        assert_eq!(scenario.description, "");
        assert!(scenario.people.is_empty());
        assert_eq!(scenario.income_streams[0].cola_month, 1);
        assert_eq!(scenario.income_streams[0].cola_percent_annual, 0.0);
        assert!(scenario.budget_settings.categories[0].include);
        assert_eq!(scenario.budget_settings.inflation_annual_percent, 0.025);
        assert_eq!(
            scenario.budget_settings.survivor_reduction_mode,
            SurvivorReductionMode::FlexOnly
        );
        assert_eq!(
            scenario.tax_settings.filing_status,
            FilingStatus::MarriedFilingJointly
        );
        assert_eq!(scenario.tax_settings.standard_deduction_override, None);
    }

    #[test]
    fn budget_totals_split_by_category_type() {
        let settings = BudgetSettings {
            categories: vec![
                BudgetCategory {
                    category_name: "Housing".to_string(),
                    category_type: CategoryType::Fixed,
                    monthly_amount: 1500.0,
                    include: true,
                    end_month: None,
                },
                BudgetCategory {
                    category_name: "Travel".to_string(),
                    category_type: CategoryType::Flexible,
                    monthly_amount: 400.0,
                    include: true,
                    end_month: None,
                },
                BudgetCategory {
                    category_name: "Boat".to_string(),
                    category_type: CategoryType::Flexible,
                    monthly_amount: 900.0,
                    include: false,
                    end_month: None,
                },
            ],
            ..BudgetSettings::default()
        };
        assert_eq!(settings.total_monthly_spending(), 1900.0);
        assert_eq!(settings.total_fixed_spending(), 1500.0);
        assert_eq!(settings.total_flexible_spending(), 400.0);
    }
}
