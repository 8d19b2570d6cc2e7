use std::collections::BTreeMap;

use super::timeline::YearMonth;
use super::types::{InvestmentAccount, TaxBucket};

#[derive(Debug, Clone)]
struct AccountState {
    balance: f64,
    monthly_rate: f64,
}

impl AccountState {
    fn new(account: &InvestmentAccount) -> Self {
        Self {
            balance: account.starting_balance,
            monthly_rate: account.monthly_return_rate(),
        }
    }

    fn apply_contribution(&mut self, account: &InvestmentAccount, month: YearMonth) {
        if account.contributes_in(month) {
            self.balance += account.monthly_contribution;
        }
    }

    fn apply_withdrawal(&mut self, account: &InvestmentAccount, month: YearMonth) -> f64 {
        if !account.withdraws_in(month) {
            return 0.0;
        }
        let requested = account.monthly_withdrawal;
        self.balance -= requested;
        if self.balance < 0.0 {
            let actual = requested + self.balance;
            self.balance = 0.0;
            return actual;
        }
        requested
    }

    fn apply_growth(&mut self) {
        self.balance *= 1.0 + self.monthly_rate;
    }
}

/// Per-account balances advanced one month at a time.
///
/// Each month applies, in order: contributions, withdrawals, the prior
/// month's surplus into the surplus account, then growth. Surplus lands
/// before growth so it compounds in the month it is deposited.
#[derive(Debug, Clone)]
pub struct AccountProcessor<'a> {
    accounts: &'a [InvestmentAccount],
    states: Vec<AccountState>,
    surplus_index: Option<usize>,
}

impl<'a> AccountProcessor<'a> {
    pub fn new(accounts: &'a [InvestmentAccount]) -> Self {
        Self {
            accounts,
            states: accounts.iter().map(AccountState::new).collect(),
            surplus_index: accounts.iter().position(|a| a.receives_surplus),
        }
    }

    pub fn deposit_surplus(&mut self, surplus: f64) {
        let Some(idx) = self.surplus_index else {
            return;
        };
        let state = &mut self.states[idx];
        state.balance += surplus;
        if state.balance < 0.0 {
            state.balance = 0.0;
        }
    }

    pub fn process_month(
        &mut self,
        month: YearMonth,
        prior_month_surplus: f64,
    ) -> (BTreeMap<String, f64>, BTreeMap<String, f64>) {
        let mut withdrawals = BTreeMap::new();
        let mut balances = BTreeMap::new();

        for (account, state) in self.accounts.iter().zip(self.states.iter_mut()) {
            state.apply_contribution(account, month);
        }

        for (account, state) in self.accounts.iter().zip(self.states.iter_mut()) {
            let withdrawn = state.apply_withdrawal(account, month);
            withdrawals.insert(account.account_id.clone(), withdrawn);
        }

        if prior_month_surplus != 0.0 {
            self.deposit_surplus(prior_month_surplus);
        }

        for (account, state) in self.accounts.iter().zip(self.states.iter_mut()) {
            state.apply_growth();
            balances.insert(account.account_id.clone(), state.balance);
        }

        (withdrawals, balances)
    }

    pub fn total_balance(&self) -> f64 {
        self.states.iter().map(|s| s.balance).sum()
    }

    pub fn balances_by_tax_bucket(&self) -> BTreeMap<TaxBucket, f64> {
        let mut by_bucket = BTreeMap::new();
        for (account, state) in self.accounts.iter().zip(self.states.iter()) {
            *by_bucket.entry(account.tax_bucket).or_insert(0.0) += state.balance;
        }
        by_bucket
    }

    pub fn withdrawals_by_tax_bucket(
        &self,
        withdrawals_by_account: &BTreeMap<String, f64>,
    ) -> BTreeMap<TaxBucket, f64> {
        let mut by_bucket = BTreeMap::new();
        for account in self.accounts {
            let withdrawn = withdrawals_by_account
                .get(&account.account_id)
                .copied()
                .unwrap_or(0.0);
            *by_bucket.entry(account.tax_bucket).or_insert(0.0) += withdrawn;
        }
        by_bucket
    }

    pub fn taxable_withdrawals(&self, withdrawals_by_account: &BTreeMap<String, f64>) -> f64 {
        self.accounts
            .iter()
            .filter(|a| a.tax_bucket != TaxBucket::Roth)
            .filter_map(|a| withdrawals_by_account.get(&a.account_id))
            .sum()
    }

    pub fn account_balance(&self, account_id: &str) -> f64 {
        self.accounts
            .iter()
            .position(|a| a.account_id == account_id)
            .map(|idx| self.states[idx].balance)
            .unwrap_or(0.0)
    }
}
