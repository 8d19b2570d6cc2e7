use super::error::ProjectionError;
use super::types::{InvestmentAccount, MonthlyProjection, NetIncomeProjection};

/// Reinvests each month's surplus (or draws down each deficit) through the
/// account flagged `receives_surplus`, updating `projections` in place.
///
/// The reinvested amount compounds at the account's monthly rate:
/// `invested = (invested + surplus) × (1 + r)`, added on top of the
/// engine-computed balance. The account never goes below zero; a deficit
/// larger than the balance is absorbed and the shortfall is not carried.
/// Without a flagged account nothing changes. Both series must cover the
/// same months.
pub fn apply_surplus_to_accounts(
    projections: &mut [MonthlyProjection],
    net_income: &[NetIncomeProjection],
    accounts: &[InvestmentAccount],
) -> Result<(), ProjectionError> {
    if projections.len() != net_income.len() {
        return Err(ProjectionError::NetIncomeMismatch {
            projections: projections.len(),
            net_income: net_income.len(),
        });
    }
    let Some(account) = accounts.iter().find(|a| a.receives_surplus) else {
        return Ok(());
    };
    tracing::info!(
        account_id = %account.account_id,
        account_name = %account.name,
        "applying surplus to account"
    );

    let monthly_rate = account.monthly_return_rate();
    let mut invested = 0.0;

    for (projection, net) in projections.iter_mut().zip(net_income) {
        let Some(balance) = projection.balances_by_account.get_mut(&account.account_id) else {
            tracing::warn!(
                account_id = %account.account_id,
                month = %projection.month,
                "surplus account missing from monthly balances"
            );
            continue;
        };

        invested = (invested + net.surplus_deficit) * (1.0 + monthly_rate);
        if *balance + invested < 0.0 {
            invested = -*balance;
        }

        *balance += invested;
        projection.total_investments += invested;
        *projection
            .balances_by_tax_bucket
            .entry(account.tax_bucket)
            .or_insert(0.0) += invested;

        tracing::debug!(
            month = %projection.month,
            surplus = net.surplus_deficit,
            reinvested = invested,
            balance = *balance,
            "applied monthly surplus"
        );
    }
    Ok(())
}
