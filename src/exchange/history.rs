use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    exchange::types::SettlementNotice,
    types::{CardId, Coins, ExchangeId, UnixMillis, UserId},
};

/// Completed exchange. The card travels from `from_user_id` (owner) to
/// `to_user_id` (requester); coins travel the other way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub record_id: String,
    pub exchange_id: ExchangeId,
    pub card_id: CardId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub coin_amount: Coins,
    pub completed_at: UnixMillis,
}

impl ExchangeRecord {
    pub fn from_notice(notice: &SettlementNotice, completed_at: UnixMillis) -> Self {
        Self {
            record_id: notice.record_id.clone(),
            exchange_id: notice.exchange_id,
            card_id: notice.card_id,
            from_user_id: notice.owner_id,
            to_user_id: notice.requester_id,
            coin_amount: notice.coin_amount,
            completed_at,
        }
    }

    /// `None` when the viewer took no part in the exchange.
    pub fn view_for(&self, viewer_id: UserId) -> Option<ExchangeRecordView> {
        let (direction, counterparty_id) = if self.from_user_id == viewer_id {
            (ExchangeDirection::Sent, self.to_user_id)
        } else if self.to_user_id == viewer_id {
            (ExchangeDirection::Received, self.from_user_id)
        } else {
            return None;
        };

        Some(ExchangeRecordView {
            record_id: self.record_id.clone(),
            card_id: self.card_id,
            counterparty_id,
            direction,
            coin_amount: self.coin_amount,
            completed_at: self.completed_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeDirection {
    Sent,
    Received,
}

impl fmt::Display for ExchangeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeDirection::Sent => write!(f, "sent"),
            ExchangeDirection::Received => write!(f, "received"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRecordView {
    pub record_id: String,
    pub card_id: CardId,
    pub counterparty_id: UserId,
    pub direction: ExchangeDirection,
    pub coin_amount: Coins,
    pub completed_at: UnixMillis,
}
