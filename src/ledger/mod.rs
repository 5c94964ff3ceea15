pub mod balance;
pub mod ledger;
pub mod types;

pub use balance::{credit, debit, has_sufficient_balance, transfer};
pub use ledger::CoinLedger;
pub use types::{CoinReason, JournalEntry, JournalEntryId};
