use serde::{Deserialize, Serialize};

use crate::{
    exchange::{
        error::{ExchangeError, invalid_state_transition, unauthorized},
        types::{ExchangeRequest, ExchangeStatus},
    },
    types::UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Accept,
    Reject,
    Cancel,
    Expire,
}

impl Transition {
    pub fn target(&self) -> ExchangeStatus {
        match self {
            Transition::Accept => ExchangeStatus::Accepted,
            Transition::Reject => ExchangeStatus::Rejected,
            Transition::Cancel => ExchangeStatus::Cancelled,
            Transition::Expire => ExchangeStatus::Expired,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Accept => "accept",
            Transition::Reject => "reject",
            Transition::Cancel => "cancel",
            Transition::Expire => "expire",
        }
    }
}

/// Only `pending` has outgoing edges, and no edge leads back into it.
pub fn check_transition(
    status: ExchangeStatus,
    transition: Transition,
) -> Result<(), ExchangeError> {
    match status {
        ExchangeStatus::Pending => Ok(()),
        ExchangeStatus::Accepted
        | ExchangeStatus::Rejected
        | ExchangeStatus::Cancelled
        | ExchangeStatus::Expired => Err(invalid_state_transition(format!(
            "cannot {} exchange request with status: {}",
            transition.as_str(),
            status
        ))),
    }
}

/// Owner decides accept/reject, requester may cancel. Expiry has no actor.
pub fn check_actor(
    request: &ExchangeRequest,
    actor: UserId,
    transition: Transition,
) -> Result<(), ExchangeError> {
    let allowed = match transition {
        Transition::Accept | Transition::Reject => request.card_owner_id,
        Transition::Cancel => request.requester_id,
        Transition::Expire => return Ok(()),
    };

    if actor != allowed {
        return Err(unauthorized(format!(
            "user '{}' may not {} exchange request '{}'",
            actor,
            transition.as_str(),
            request.id
        )));
    }
    Ok(())
}

/// Returns the request moved to the transition's target status. The input is
/// never modified, so a failure leaves the caller's record as it was.
///
/// `Accept` is crate-private: accepting without settlement would expose an
/// `accepted` status with no transfer behind it.
pub(crate) fn advance(
    request: &ExchangeRequest,
    transition: Transition,
) -> Result<ExchangeRequest, ExchangeError> {
    check_transition(request.status, transition)?;
    let mut next = request.clone();
    next.status = transition.target();
    Ok(next)
}

pub fn reject(request: &ExchangeRequest, actor: UserId) -> Result<ExchangeRequest, ExchangeError> {
    check_transition(request.status, Transition::Reject)?;
    check_actor(request, actor, Transition::Reject)?;
    advance(request, Transition::Reject)
}

pub fn cancel(request: &ExchangeRequest, actor: UserId) -> Result<ExchangeRequest, ExchangeError> {
    check_transition(request.status, Transition::Cancel)?;
    check_actor(request, actor, Transition::Cancel)?;
    advance(request, Transition::Cancel)
}
