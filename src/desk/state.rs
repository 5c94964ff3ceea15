use std::collections::BTreeMap;

use crate::{
    exchange::{
        ExchangeRecord, ExchangeRequest,
        error::{ExchangeError, not_found},
    },
    ledger::CoinLedger,
    types::{Card, CardId, CollectedCards, ExchangeId, UserId},
};

/// Everything the desk knows, as one value. The desk swaps pieces of it only
/// after the pure core has accepted a decision.
#[derive(Debug, Clone, Default)]
pub struct DeskState {
    pub ledger: CoinLedger,
    pub cards: BTreeMap<CardId, Card>,
    pub collections: BTreeMap<UserId, CollectedCards>,
    pub requests: BTreeMap<ExchangeId, ExchangeRequest>,
    pub records: Vec<ExchangeRecord>,
}

impl DeskState {
    pub fn request(&self, exchange_id: ExchangeId) -> Result<&ExchangeRequest, ExchangeError> {
        self.requests
            .get(&exchange_id)
            .ok_or_else(|| not_found(format!("exchange request '{exchange_id}' not found")))
    }

    pub fn card(&self, card_id: CardId) -> Result<&Card, ExchangeError> {
        self.cards
            .get(&card_id)
            .ok_or_else(|| not_found(format!("card '{card_id}' not found")))
    }

    pub fn balance(&self, user_id: UserId) -> Result<i64, ExchangeError> {
        self.ledger
            .balance_of(user_id)
            .ok_or_else(|| not_found(format!("user '{user_id}' not found")))
    }

    pub fn collection(&self, user_id: UserId) -> CollectedCards {
        self.collections.get(&user_id).cloned().unwrap_or_default()
    }

    pub fn has_pending(&self, requester_id: UserId, card_id: CardId) -> bool {
        self.requests.values().any(|request| {
            request.is_pending() && request.requester_id == requester_id && request.card_id == card_id
        })
    }
}
