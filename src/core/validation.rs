use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Utc};

use super::error::{ProjectionError, ValidationErrors};
use super::types::{BudgetSettings, GlobalSettings, IncomeStream, InvestmentAccount, Person, Scenario};

const MIN_PROJECTION_YEAR: i32 = 2000;
const MAX_PROJECTION_YEAR: i32 = 2100;

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ProjectionError> {
    let mut errors = ValidationErrors::new();

    if scenario.scenario_id.trim().is_empty() {
        errors.push("scenario_id", "must not be empty");
    }
    if scenario.scenario_name.trim().is_empty() {
        errors.push("scenario_name", "must not be empty");
    }

    check_global_settings(&scenario.global_settings, &mut errors);
    check_people(&scenario.people, Utc::now().date_naive(), &mut errors);
    check_income_streams(&scenario.income_streams, &scenario.people, &mut errors);
    check_accounts(&scenario.accounts, &mut errors);
    check_budget(&scenario.budget_settings, &mut errors);

    if let Some(amount) = scenario.tax_settings.standard_deduction_override {
        if !(amount >= 0.0) {
            errors.push("tax_settings.standard_deduction_override", "must be >= 0");
        }
    }

    if !errors.is_empty() {
        tracing::warn!(
            scenario_id = %scenario.scenario_id,
            violations = errors.len(),
            "scenario failed validation"
        );
    }
    errors.into_result()
}

fn check_global_settings(settings: &GlobalSettings, errors: &mut ValidationErrors) {
    let start_year = settings.projection_start_month.year();
    if !(MIN_PROJECTION_YEAR..=MAX_PROJECTION_YEAR).contains(&start_year) {
        errors.push(
            "global_settings.projection_start_month",
            format!("year must be within {MIN_PROJECTION_YEAR}..={MAX_PROJECTION_YEAR}"),
        );
    }
    if !(MIN_PROJECTION_YEAR..=MAX_PROJECTION_YEAR).contains(&settings.projection_end_year) {
        errors.push(
            "global_settings.projection_end_year",
            format!("must be within {MIN_PROJECTION_YEAR}..={MAX_PROJECTION_YEAR}"),
        );
    } else if settings.projection_end_year < start_year {
        errors.push(
            "global_settings.projection_end_year",
            "must not precede the start year",
        );
    }
    let state = settings.residence_state.trim();
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        errors.push(
            "global_settings.residence_state",
            "must be a two-letter state code",
        );
    }
}

fn check_people(people: &[Person], today: NaiveDate, errors: &mut ValidationErrors) {
    let mut seen = BTreeSet::new();
    for (idx, person) in people.iter().enumerate() {
        if person.person_id.trim().is_empty() {
            errors.push(format!("people[{idx}].person_id"), "must not be empty");
        } else if !seen.insert(person.person_id.as_str()) {
            errors.push(format!("people[{idx}].person_id"), "duplicate person id");
        }
        if person.name.trim().is_empty() {
            errors.push(format!("people[{idx}].name"), "must not be empty");
        }
        if person.birth_date.year() < 1900 {
            errors.push(format!("people[{idx}].birth_date"), "year must be 1900 or later");
        } else if person.birth_date > today {
            errors.push(format!("people[{idx}].birth_date"), "must not be in the future");
        }
        if matches!(person.life_expectancy_years, Some(years) if years > 120) {
            errors.push(format!("people[{idx}].life_expectancy_years"), "must be within 0..=120");
        }
    }
}

fn check_income_streams(streams: &[IncomeStream], people: &[Person], errors: &mut ValidationErrors) {
    let person_ids: BTreeSet<&str> = people.iter().map(|p| p.person_id.as_str()).collect();
    let mut seen = BTreeSet::new();

    for (idx, stream) in streams.iter().enumerate() {
        let prefix = format!("income_streams[{idx}]");
        if stream.stream_id.trim().is_empty() {
            errors.push(format!("{prefix}.stream_id"), "must not be empty");
        } else if !seen.insert(stream.stream_id.as_str()) {
            errors.push(format!("{prefix}.stream_id"), "duplicate stream id");
        }
        if !person_ids.contains(stream.owner_person_id.as_str()) {
            errors.push(
                format!("{prefix}.owner_person_id"),
                format!("unknown person {:?}", stream.owner_person_id),
            );
        }
        if !(stream.monthly_amount_at_start > 0.0) {
            errors.push(format!("{prefix}.monthly_amount_at_start"), "must be > 0");
        }
        if !(0.0..=0.5).contains(&stream.cola_percent_annual) {
            errors.push(format!("{prefix}.cola_percent_annual"), "must be within 0..=0.5");
        }
        if !(1..=12).contains(&stream.cola_month) {
            errors.push(format!("{prefix}.cola_month"), "must be within 1..=12");
        }
        if matches!(stream.end_month, Some(end) if end.is_before(stream.start_month)) {
            errors.push(format!("{prefix}.end_month"), "must not precede start_month");
        }
    }
}

fn check_accounts(accounts: &[InvestmentAccount], errors: &mut ValidationErrors) {
    let mut seen = BTreeSet::new();
    let mut surplus_accounts = 0;

    for (idx, account) in accounts.iter().enumerate() {
        let prefix = format!("accounts[{idx}]");
        if account.account_id.trim().is_empty() {
            errors.push(format!("{prefix}.account_id"), "must not be empty");
        } else if !seen.insert(account.account_id.as_str()) {
            errors.push(format!("{prefix}.account_id"), "duplicate account id");
        }
        if account.name.trim().is_empty() {
            errors.push(format!("{prefix}.name"), "must not be empty");
        }
        if !(account.starting_balance >= 0.0) {
            errors.push(format!("{prefix}.starting_balance"), "must be >= 0");
        }
        if !(-0.5..=0.5).contains(&account.annual_return_rate) {
            errors.push(format!("{prefix}.annual_return_rate"), "must be within -0.5..=0.5");
        }
        if !(account.monthly_contribution >= 0.0) {
            errors.push(format!("{prefix}.monthly_contribution"), "must be >= 0");
        }
        if !(account.monthly_withdrawal >= 0.0) {
            errors.push(format!("{prefix}.monthly_withdrawal"), "must be >= 0");
        }
        if let (Some(start), Some(end)) = (account.contribution_start_month, account.contribution_end_month) {
            if end.is_before(start) {
                errors.push(format!("{prefix}.contribution_end_month"), "must not precede contribution_start_month");
            }
        }
        if let (Some(start), Some(end)) = (account.withdrawal_start_month, account.withdrawal_end_month) {
            if end.is_before(start) {
                errors.push(format!("{prefix}.withdrawal_end_month"), "must not precede withdrawal_start_month");
            }
        }
        if account.receives_surplus {
            surplus_accounts += 1;
        }
    }

    if surplus_accounts > 1 {
        errors.push("accounts", "at most one account may receive surplus");
    }
}

fn check_budget(budget: &BudgetSettings, errors: &mut ValidationErrors) {
    if !(0.0..=0.2).contains(&budget.inflation_annual_percent) {
        errors.push("budget_settings.inflation_annual_percent", "must be within 0..=0.2");
    }
    if !(0.0..=1.0).contains(&budget.survivor_flexible_reduction_percent) {
        errors.push(
            "budget_settings.survivor_flexible_reduction_percent",
            "must be within 0..=1",
        );
    }

    let mut seen = BTreeSet::new();
    for (idx, category) in budget.categories.iter().enumerate() {
        let prefix = format!("budget_settings.categories[{idx}]");
        if category.category_name.trim().is_empty() {
            errors.push(format!("{prefix}.category_name"), "must not be empty");
        } else if !seen.insert(category.category_name.as_str()) {
            errors.push(format!("{prefix}.category_name"), "duplicate category name");
        }
        if !(category.monthly_amount >= 0.0) {
            errors.push(format!("{prefix}.monthly_amount"), "must be >= 0");
        }
    }
}
