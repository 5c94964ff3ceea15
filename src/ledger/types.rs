use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Coins, UserId};

pub type JournalEntryId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinReason {
    InitialGrant,
    CardCreated,
    CardExchanged,
    DailyLogin,
    ExchangePurchase,
    ExchangeRefund,
}

impl CoinReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoinReason::InitialGrant => "initial_grant",
            CoinReason::CardCreated => "card_created",
            CoinReason::CardExchanged => "card_exchanged",
            CoinReason::DailyLogin => "daily_login",
            CoinReason::ExchangePurchase => "exchange_purchase",
            CoinReason::ExchangeRefund => "exchange_refund",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "initial_grant" => Some(CoinReason::InitialGrant),
            "card_created" => Some(CoinReason::CardCreated),
            "card_exchanged" => Some(CoinReason::CardExchanged),
            "daily_login" => Some(CoinReason::DailyLogin),
            "exchange_purchase" => Some(CoinReason::ExchangePurchase),
            "exchange_refund" => Some(CoinReason::ExchangeRefund),
            _ => None,
        }
    }
}

impl fmt::Display for CoinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One balance movement. `amount` is signed: negative for debits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: JournalEntryId,
    pub seq_no: u64,
    pub user_id: UserId,
    pub amount: Coins,
    pub reason: CoinReason,
    #[serde(default)]
    pub reference_id: Option<String>,
    pub balance_after: Coins,
}
