use std::collections::BTreeMap;

use crate::{
    exchange::error::{ExchangeError, arithmetic_error, invalid_amount, not_found},
    ledger::{
        balance,
        types::{CoinReason, JournalEntry, JournalEntryId},
    },
    types::{Coins, UserBalance, UserId},
};

/// Per-user coin balances plus the append-only journal of every movement.
///
/// This is a plain value owned by the caller; it holds no locks and performs
/// no I/O. Every mutation either fully applies (balances and journal) or
/// returns an error with the ledger untouched.
#[derive(Debug, Clone, Default)]
pub struct CoinLedger {
    balances: BTreeMap<UserId, Coins>,
    next_sequence: u64,
    entries: Vec<JournalEntry>,
}

impl CoinLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an account with a starting grant. Reopening an existing account
    /// is a no-op that returns the current balance.
    pub fn open_account(&mut self, user_id: UserId, initial: Coins) -> Result<Coins, ExchangeError> {
        if initial < 0 {
            return Err(invalid_amount(format!(
                "initial balance must be non-negative: initial={initial}"
            )));
        }

        if let Some(existing) = self.balances.get(&user_id) {
            return Ok(*existing);
        }

        self.balances.insert(user_id, initial);
        if initial > 0 {
            self.append_entry(user_id, initial, CoinReason::InitialGrant, None, initial)?;
        }
        Ok(initial)
    }

    pub fn balance_of(&self, user_id: UserId) -> Option<Coins> {
        self.balances.get(&user_id).copied()
    }

    pub fn balance_record(&self, user_id: UserId) -> Option<UserBalance> {
        self.balance_of(user_id).map(|coin_balance| UserBalance {
            user_id,
            coin_balance,
        })
    }

    pub fn total_supply(&self) -> i128 {
        self.balances.values().map(|value| *value as i128).sum()
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn entries_for(&self, user_id: UserId) -> impl Iterator<Item = &JournalEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.user_id == user_id)
    }

    pub fn apply_credit(
        &mut self,
        user_id: UserId,
        amount: Coins,
        reason: CoinReason,
        reference_id: Option<String>,
    ) -> Result<Coins, ExchangeError> {
        let current = self.require_account(user_id)?;
        let after = balance::credit(current, amount)?;
        self.commit(user_id, amount, reason, reference_id, after)?;
        Ok(after)
    }

    pub fn apply_debit(
        &mut self,
        user_id: UserId,
        amount: Coins,
        reason: CoinReason,
        reference_id: Option<String>,
    ) -> Result<Coins, ExchangeError> {
        let current = self.require_account(user_id)?;
        let after = balance::debit(current, amount)?;
        self.commit(user_id, -amount, reason, reference_id, after)?;
        Ok(after)
    }

    /// Balances `(from, to)` that `apply_transfer` would produce, without
    /// writing anything.
    pub fn quote_transfer(
        &self,
        from: UserId,
        to: UserId,
        amount: Coins,
    ) -> Result<(Coins, Coins), ExchangeError> {
        let from_current = self.require_account(from)?;
        let to_current = self.require_account(to)?;
        if from == to {
            // Self-transfer still validates the amount but cannot change the balance.
            balance::transfer(from_current, from_current, amount)?;
            return Ok((from_current, from_current));
        }
        balance::transfer(from_current, to_current, amount)
    }

    /// Moves `amount` from one account to another. Returns the new balances as
    /// `(from, to)`.
    pub fn apply_transfer(
        &mut self,
        from: UserId,
        to: UserId,
        amount: Coins,
        reference_id: &str,
    ) -> Result<(Coins, Coins), ExchangeError> {
        let (from_after, to_after) = self.quote_transfer(from, to, amount)?;
        if from == to {
            return Ok((from_after, to_after));
        }

        // Reserve both sequence numbers up front so the journal append cannot
        // fail halfway through the pair.
        if self.next_sequence.checked_add(2).is_none() {
            return Err(arithmetic_error("journal sequence overflow"));
        }

        self.commit(
            from,
            -amount,
            CoinReason::ExchangePurchase,
            Some(reference_id.to_string()),
            from_after,
        )?;
        self.commit(
            to,
            amount,
            CoinReason::CardExchanged,
            Some(reference_id.to_string()),
            to_after,
        )?;

        Ok((from_after, to_after))
    }

    fn require_account(&self, user_id: UserId) -> Result<Coins, ExchangeError> {
        self.balance_of(user_id)
            .ok_or_else(|| not_found(format!("no coin account for user '{user_id}'")))
    }

    fn commit(
        &mut self,
        user_id: UserId,
        amount: Coins,
        reason: CoinReason,
        reference_id: Option<String>,
        balance_after: Coins,
    ) -> Result<(), ExchangeError> {
        self.append_entry(user_id, amount, reason, reference_id, balance_after)?;
        self.balances.insert(user_id, balance_after);
        Ok(())
    }

    fn append_entry(
        &mut self,
        user_id: UserId,
        amount: Coins,
        reason: CoinReason,
        reference_id: Option<String>,
        balance_after: Coins,
    ) -> Result<JournalEntryId, ExchangeError> {
        self.next_sequence = self
            .next_sequence
            .checked_add(1)
            .ok_or_else(|| arithmetic_error("journal sequence overflow"))?;

        let entry_id = format!("coin:{:016}", self.next_sequence);
        self.entries.push(JournalEntry {
            entry_id: entry_id.clone(),
            seq_no: self.next_sequence,
            user_id,
            amount,
            reason,
            reference_id,
            balance_after,
        });
        Ok(entry_id)
    }
}
