use crate::{
    exchange::error::{ExchangeError, arithmetic_error, insufficient_funds, invalid_amount},
    types::Coins,
};

/// `balance >= amount`, except that a zero amount is always affordable.
pub fn has_sufficient_balance(balance: Coins, amount: Coins) -> bool {
    amount == 0 || balance >= amount
}

pub fn debit(balance: Coins, amount: Coins) -> Result<Coins, ExchangeError> {
    if amount < 0 {
        return Err(invalid_amount(format!(
            "debit amount must be non-negative: amount={amount}"
        )));
    }

    if !has_sufficient_balance(balance, amount) {
        return Err(insufficient_funds(format!(
            "insufficient coin balance: required={amount}, available={balance}"
        )));
    }

    balance
        .checked_sub(amount)
        .ok_or_else(|| arithmetic_error("coin balance underflow during debit"))
}

pub fn credit(balance: Coins, amount: Coins) -> Result<Coins, ExchangeError> {
    if amount < 0 {
        return Err(invalid_amount(format!(
            "credit amount must be non-negative: amount={amount}"
        )));
    }

    balance
        .checked_add(amount)
        .ok_or_else(|| arithmetic_error("coin balance overflow during credit"))
}

/// Paired debit and credit. Both sides are computed before anything is
/// returned, so a failure on either side yields no new balances at all.
pub fn transfer(
    from_balance: Coins,
    to_balance: Coins,
    amount: Coins,
) -> Result<(Coins, Coins), ExchangeError> {
    let from_after = debit(from_balance, amount)?;
    let to_after = credit(to_balance, amount)?;
    Ok((from_after, to_after))
}
