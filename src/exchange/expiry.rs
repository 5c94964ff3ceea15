use serde::{Deserialize, Serialize};

use crate::{
    exchange::{
        error::{ExchangeError, not_due},
        state_machine::{Transition, advance, check_transition},
        types::ExchangeRequest,
    },
    types::{ExchangeId, UnixMillis},
};

pub fn is_overdue(request: &ExchangeRequest, now: UnixMillis) -> bool {
    now >= request.expires_at
}

pub fn expire(request: &ExchangeRequest, now: UnixMillis) -> Result<ExchangeRequest, ExchangeError> {
    check_transition(request.status, Transition::Expire)?;
    if !is_overdue(request, now) {
        return Err(not_due(format!(
            "exchange request '{}' expires at {}, now is {}",
            request.id, request.expires_at, now
        )));
    }
    advance(request, Transition::Expire)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirySummary {
    pub total_found: usize,
    pub processed: usize,
    pub failed: usize,
    pub expired: Vec<ExchangeId>,
}

impl ExpirySummary {
    pub fn has_processed(&self) -> bool {
        self.processed > 0
    }
}

/// Moves every overdue pending request to `expired`. Requests that are not
/// pending or not yet due are left alone and do not count as found.
pub fn sweep_expired<'a>(
    requests: impl IntoIterator<Item = &'a mut ExchangeRequest>,
    now: UnixMillis,
) -> ExpirySummary {
    let mut summary = ExpirySummary::default();
    for request in requests {
        if !request.is_pending() || !is_overdue(request, now) {
            continue;
        }
        summary.total_found += 1;
        match expire(request, now) {
            Ok(next) => {
                *request = next;
                summary.processed += 1;
                summary.expired.push(request.id);
            }
            Err(err) => {
                summary.failed += 1;
                tracing::warn!(
                    target: "exchange_expiry",
                    exchange_id = %request.id,
                    error_kind = %err.kind,
                    error = %err,
                    "exchange_expire_failed"
                );
            }
        }
    }
    summary
}
