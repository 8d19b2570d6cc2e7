use std::collections::BTreeMap;

use super::timeline::YearMonth;
use super::types::{BudgetCategory, BudgetSettings, CategoryType, Person, SurvivorReductionMode};

#[derive(Debug, Clone)]
struct CategoryState<'a> {
    category: &'a BudgetCategory,
    current_amount: f64,
}

#[derive(Debug, Clone)]
pub struct BudgetProcessor<'a> {
    settings: &'a BudgetSettings,
    first_death: Option<YearMonth>,
    household_size: usize,
    categories: Vec<CategoryState<'a>>,
    last_inflation_year: Option<i32>,
    survivor_reduction_applied: bool,
}

impl<'a> BudgetProcessor<'a> {
    pub fn new(settings: &'a BudgetSettings, people: &[Person]) -> Self {
        Self {
            settings,
            first_death: people.iter().filter_map(Person::death_year_month).min(),
            household_size: people.len(),
            categories: settings
                .categories
                .iter()
                .filter(|c| c.include)
                .map(|category| CategoryState {
                    category,
                    current_amount: category.monthly_amount,
                })
                .collect(),
            last_inflation_year: None,
            survivor_reduction_applied: false,
        }
    }

    pub fn process_month(&mut self, month: YearMonth, month_number: u32) -> f64 {
        self.apply_inflation_if_due(month, month_number);
        self.apply_survivor_reduction_if_due(month);
        self.categories
            .iter()
            .filter(|state| state.category.is_active(month))
            .map(|state| state.current_amount)
            .sum()
    }

    fn apply_inflation_if_due(&mut self, month: YearMonth, month_number: u32) {
        if month_number != 1 || self.last_inflation_year == Some(month.year()) {
            return;
        }
        let rate = self.settings.inflation_annual_percent;
        if rate > 0.0 {
            for state in &mut self.categories {
                state.current_amount *= 1.0 + rate;
            }
            self.last_inflation_year = Some(month.year());
        }
    }

    fn apply_survivor_reduction_if_due(&mut self, month: YearMonth) {
        if self.survivor_reduction_applied || self.household_size < 2 {
            return;
        }
        match self.first_death {
            Some(death) if !month.is_before(death) => {}
            _ => return,
        }

        let reduction = self.settings.survivor_flexible_reduction_percent;
        if reduction > 0.0 {
            let mode = self.settings.survivor_reduction_mode;
            for state in &mut self.categories {
                let applies = match mode {
                    SurvivorReductionMode::All => true,
                    SurvivorReductionMode::FlexOnly => {
                        state.category.category_type == CategoryType::Flexible
                    }
                };
                if applies {
                    state.current_amount *= 1.0 - reduction;
                }
            }
        }
        self.survivor_reduction_applied = true;
    }

    pub fn current_spending(&self) -> f64 {
        self.categories.iter().map(|s| s.current_amount).sum()
    }

    pub fn spending_breakdown(&self) -> BTreeMap<String, f64> {
        self.categories
            .iter()
            .map(|s| (s.category.category_name.clone(), s.current_amount))
            .collect()
    }

    pub fn annual_spending(&self) -> f64 {
        self.current_spending() * 12.0
    }

    pub fn survivor_reduction_applied(&self) -> bool {
        self.survivor_reduction_applied
    }
}

pub fn inflation_adjusted_amount(amount: f64, years: u32, annual_rate: f64) -> f64 {
    amount * (1.0 + annual_rate).powi(years as i32)
}

pub fn estimate_lifetime_spending(monthly_spending: f64, years: u32, annual_rate: f64) -> f64 {
    (0..years)
        .map(|year| inflation_adjusted_amount(monthly_spending * 12.0, year, annual_rate))
        .sum()
}
