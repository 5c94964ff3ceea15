use lifecard_exchange::exchange::{
    ExchangeErrorKind, ExchangeStatus, Transition, cancel, check_actor, check_transition, reject,
};
use uuid::Uuid;

use crate::{TERMINAL_STATUSES, pending_request, request_with};

const TRANSITIONS: [Transition; 4] = [
    Transition::Accept,
    Transition::Reject,
    Transition::Cancel,
    Transition::Expire,
];

#[test]
fn given_pending_request_when_owner_rejects_then_status_is_rejected() {
    let request = pending_request(10);
    let rejected = reject(&request, request.card_owner_id).expect("owner may reject");
    assert_eq!(rejected.status, ExchangeStatus::Rejected);
    assert_eq!(request.status, ExchangeStatus::Pending);
}

#[test]
fn given_pending_request_when_requester_rejects_then_unauthorized() {
    let request = pending_request(10);
    let err = reject(&request, request.requester_id).expect_err("requester may not reject");
    assert_eq!(err.kind, ExchangeErrorKind::Unauthorized);
}

#[test]
fn given_pending_request_when_requester_cancels_then_status_is_cancelled() {
    let request = pending_request(10);
    let cancelled = cancel(&request, request.requester_id).expect("requester may cancel");
    assert_eq!(cancelled.status, ExchangeStatus::Cancelled);
}

#[test]
fn given_pending_request_when_owner_cancels_then_unauthorized() {
    let request = pending_request(10);
    let err = cancel(&request, request.card_owner_id).expect_err("owner may not cancel");
    assert_eq!(err.kind, ExchangeErrorKind::Unauthorized);
}

#[test]
fn given_terminal_status_when_any_transition_checked_then_invalid_state_transition() {
    for status in TERMINAL_STATUSES {
        for transition in TRANSITIONS {
            let err = check_transition(status, transition).expect_err("terminal has no edges");
            assert_eq!(err.kind, ExchangeErrorKind::InvalidStateTransition);
        }
    }
}

#[test]
fn given_terminal_request_when_stranger_rejects_then_state_error_wins_over_actor() {
    for status in TERMINAL_STATUSES {
        let request = request_with(10, status);
        let err = reject(&request, Uuid::new_v4()).expect_err("must fail");
        assert_eq!(err.kind, ExchangeErrorKind::InvalidStateTransition);
        let err = cancel(&request, Uuid::new_v4()).expect_err("must fail");
        assert_eq!(err.kind, ExchangeErrorKind::InvalidStateTransition);
    }
}

#[test]
fn given_expire_transition_when_actor_checked_then_any_actor_passes() {
    let request = pending_request(10);
    check_actor(&request, Uuid::new_v4(), Transition::Expire).expect("expiry has no actor");
}

#[test]
fn given_status_strings_when_parsed_then_they_round_trip() {
    for status in [ExchangeStatus::Pending]
        .into_iter()
        .chain(TERMINAL_STATUSES)
    {
        assert_eq!(ExchangeStatus::from_db_str(status.as_str()), Some(status));
        assert_eq!(status.is_terminal(), status != ExchangeStatus::Pending);
    }
    assert_eq!(ExchangeStatus::from_db_str("archived"), None);
    assert_eq!(ExchangeStatus::default(), ExchangeStatus::Pending);
}
