pub mod completion;
pub mod error;
pub mod expiry;
pub mod history;
pub mod intake;
pub mod pricing;
pub mod state_machine;
pub mod types;

pub use completion::{CompletionInput, Settlement, complete_exchange, derive_record_id};
pub use error::{ExchangeError, ExchangeErrorKind};
pub use expiry::{ExpirySummary, expire, is_overdue, sweep_expired};
pub use history::{ExchangeDirection, ExchangeRecord, ExchangeRecordView};
pub use intake::{IntakeInput, open_request};
pub use pricing::ExchangePrice;
pub use state_machine::{Transition, cancel, check_actor, check_transition, reject};
pub use types::{ExchangeRequest, ExchangeStatus, SettlementNotice};
