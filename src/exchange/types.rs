use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{CardId, Coins, ExchangeId, UnixMillis, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Expired,
}

impl ExchangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "pending",
            ExchangeStatus::Accepted => "accepted",
            ExchangeStatus::Rejected => "rejected",
            ExchangeStatus::Cancelled => "cancelled",
            ExchangeStatus::Expired => "expired",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ExchangeStatus::Pending),
            "accepted" => Some(ExchangeStatus::Accepted),
            "rejected" => Some(ExchangeStatus::Rejected),
            "cancelled" => Some(ExchangeStatus::Cancelled),
            "expired" => Some(ExchangeStatus::Expired),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExchangeStatus::Pending)
    }

    pub fn can_accept(&self) -> bool {
        matches!(self, ExchangeStatus::Pending)
    }

    pub fn can_reject(&self) -> bool {
        matches!(self, ExchangeStatus::Pending)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, ExchangeStatus::Pending)
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposal by `requester_id` to acquire `card_id` from its owner for
/// `coin_cost` coins. `card_owner_id` and `coin_cost` are snapshots taken when
/// the request was filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    pub id: ExchangeId,
    pub requester_id: UserId,
    pub card_id: CardId,
    pub card_owner_id: UserId,
    pub coin_cost: Coins,
    pub status: ExchangeStatus,
    pub created_at: UnixMillis,
    pub expires_at: UnixMillis,
}

impl ExchangeRequest {
    pub fn is_pending(&self) -> bool {
        self.status == ExchangeStatus::Pending
    }
}

/// Emitted to the caller once per successful settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementNotice {
    pub exchange_id: ExchangeId,
    pub record_id: String,
    pub card_id: CardId,
    pub requester_id: UserId,
    pub owner_id: UserId,
    pub coin_amount: Coins,
    pub requester_balance: Coins,
    pub owner_balance: Coins,
}
