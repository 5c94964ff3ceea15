use sha2::{Digest, Sha256};

use crate::{
    exchange::{
        error::{ExchangeError, insufficient_funds, not_pending, owner_mismatch},
        state_machine::{Transition, advance},
        types::{ExchangeRequest, SettlementNotice},
    },
    ledger::balance::{has_sufficient_balance, transfer},
    types::{CollectedCards, Coins, ExchangeId, UserId},
};

/// Snapshot the caller hands to the engine. The engine reads nothing else.
#[derive(Debug, Clone, Copy)]
pub struct CompletionInput<'a> {
    pub request: &'a ExchangeRequest,
    pub requester_balance: Coins,
    pub owner_balance: Coins,
    pub card_creator_id: UserId,
    pub requester_collection: &'a CollectedCards,
}

/// New values for every fact touched by an acceptance. The caller commits all
/// of them or none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub request: ExchangeRequest,
    pub requester_balance: Coins,
    pub owner_balance: Coins,
    pub requester_collection: CollectedCards,
    pub notice: SettlementNotice,
}

/// Settles a pending request: status to `accepted`, `coin_cost` from
/// requester to owner, card into the requester's collection.
///
/// Preconditions are checked in a fixed order and the first failure wins:
/// not pending, insufficient funds, then owner mismatch.
pub fn complete_exchange(input: CompletionInput<'_>) -> Result<Settlement, ExchangeError> {
    let request = input.request;

    if !request.status.can_accept() {
        return Err(not_pending(format!(
            "exchange request '{}' is {}, not pending",
            request.id, request.status
        )));
    }

    if !has_sufficient_balance(input.requester_balance, request.coin_cost) {
        return Err(insufficient_funds(format!(
            "insufficient coin balance. required={}, available={}",
            request.coin_cost, input.requester_balance
        )));
    }

    if input.card_creator_id != request.card_owner_id {
        return Err(owner_mismatch(format!(
            "card '{}' is now owned by '{}', request was filed against '{}'",
            request.card_id, input.card_creator_id, request.card_owner_id
        )));
    }

    let (requester_balance, owner_balance) =
        transfer(input.requester_balance, input.owner_balance, request.coin_cost)?;

    let mut requester_collection = input.requester_collection.clone();
    requester_collection.insert(request.card_id);

    let accepted = advance(request, Transition::Accept)?;

    let notice = SettlementNotice {
        exchange_id: request.id,
        record_id: derive_record_id(request.id),
        card_id: request.card_id,
        requester_id: request.requester_id,
        owner_id: request.card_owner_id,
        coin_amount: request.coin_cost,
        requester_balance,
        owner_balance,
    };

    Ok(Settlement {
        request: accepted,
        requester_balance,
        owner_balance,
        requester_collection,
        notice,
    })
}

/// Stable id for the history record of an exchange, so replaying the same
/// settlement cannot mint a second record id.
pub fn derive_record_id(exchange_id: ExchangeId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"exchange-record:");
    hasher.update(exchange_id.as_bytes());
    let digest = hasher.finalize();
    let hex = format!("{:x}", digest);
    format!("xrec:{}", &hex[..24])
}
