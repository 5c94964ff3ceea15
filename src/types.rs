use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type CardId = Uuid;
pub type ExchangeId = Uuid;

/// Coin amounts are signed so that negative inputs can be rejected explicitly
/// instead of being unrepresentable at the API edge.
pub type Coins = i64;

pub type UnixMillis = i64;

pub type CollectedCards = BTreeSet<CardId>;

pub const MILLIS_PER_HOUR: i64 = 60 * 60 * 1_000;

/// Card as seen by the exchange subsystem. Creator and price components are
/// set at creation elsewhere and never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub creator_id: UserId,
    pub base_price: Coins,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub exchange_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalance {
    pub user_id: UserId,
    pub coin_balance: Coins,
}
