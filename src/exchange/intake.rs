use crate::{
    exchange::{
        error::{
            ExchangeError, already_collected, arithmetic_error, duplicate_pending,
            insufficient_funds, self_exchange,
        },
        pricing::ExchangePrice,
        types::{ExchangeRequest, ExchangeStatus},
    },
    ledger::balance::has_sufficient_balance,
    types::{Card, CollectedCards, Coins, ExchangeId, UnixMillis, UserId},
    visibility::resolve_visibility,
};

#[derive(Debug, Clone, Copy)]
pub struct IntakeInput<'a> {
    pub exchange_id: ExchangeId,
    pub requester_id: UserId,
    pub requester_balance: Coins,
    pub requester_collection: &'a CollectedCards,
    pub card: &'a Card,
    pub has_pending_for_card: bool,
    pub created_at: UnixMillis,
    pub ttl_ms: i64,
}

/// Files a new `pending` request. The owner and price are snapshotted from
/// the card here and never re-read at settlement. No coins move at intake.
pub fn open_request(input: IntakeInput<'_>) -> Result<ExchangeRequest, ExchangeError> {
    let price = ExchangePrice::for_card(input.card)?;

    let visibility = resolve_visibility(
        input.card.creator_id,
        input.requester_id,
        input.requester_collection.contains(&input.card.id),
    );
    if !visibility.can_request_exchange {
        if visibility.is_owner() {
            return Err(self_exchange("cannot exchange your own card"));
        }
        return Err(already_collected(format!(
            "card '{}' is already in the collection",
            input.card.id
        )));
    }

    if input.has_pending_for_card {
        return Err(duplicate_pending(format!(
            "a pending exchange request for card '{}' already exists",
            input.card.id
        )));
    }

    if !has_sufficient_balance(input.requester_balance, price.final_price) {
        return Err(insufficient_funds(format!(
            "insufficient coin balance. required={}, available={}",
            price.final_price, input.requester_balance
        )));
    }

    let expires_at = input
        .created_at
        .checked_add(input.ttl_ms)
        .ok_or_else(|| arithmetic_error("expiration timestamp overflow"))?;

    Ok(ExchangeRequest {
        id: input.exchange_id,
        requester_id: input.requester_id,
        card_id: input.card.id,
        card_owner_id: input.card.creator_id,
        coin_cost: price.final_price,
        status: ExchangeStatus::Pending,
        created_at: input.created_at,
        expires_at,
    })
}
