use lifecard_exchange::{
    exchange::{ExchangeDirection, ExchangeErrorKind, ExchangeStatus},
    types::{Card, MILLIS_PER_HOUR},
};
use uuid::Uuid;

use crate::{card, fixture, user};

#[tokio::test]
async fn given_funded_requester_when_owner_accepts_then_state_and_notice_are_committed() {
    let mut fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 150).await;
    let card = card(&fx.desk, owner, 150).await;

    let request = fx
        .desk
        .request_exchange(requester, card.id)
        .await
        .expect("request");
    assert_eq!(fx.desk.pending_for_owner(owner).await, vec![request.clone()]);

    let notice = fx.desk.accept(request.id, owner).await.expect("accept");

    assert_eq!(fx.desk.balance_of(requester).await, Some(0));
    assert_eq!(fx.desk.balance_of(owner).await, Some(150));
    assert!(fx.desk.collection_of(requester).await.contains(&card.id));
    assert_eq!(
        fx.desk.request(request.id).await.expect("stored").status,
        ExchangeStatus::Accepted
    );
    assert!(fx.desk.pending_for_owner(owner).await.is_empty());

    let received = fx.notices.recv().await.expect("notice delivered");
    assert_eq!(received, notice);
    assert_eq!(received.coin_amount, 150);

    let owner_history = fx.desk.history_for(owner).await;
    assert_eq!(owner_history.len(), 1);
    assert_eq!(owner_history[0].direction, ExchangeDirection::Sent);
    let requester_history = fx.desk.history_for(requester).await;
    assert_eq!(requester_history[0].direction, ExchangeDirection::Received);
    assert_eq!(requester_history[0].counterparty_id, owner);
}

#[tokio::test]
async fn given_accepted_request_when_accepted_again_then_not_pending_and_balances_hold() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 150).await;
    let card = card(&fx.desk, owner, 150).await;
    let request = fx.desk.request_exchange(requester, card.id).await.expect("request");
    fx.desk.accept(request.id, owner).await.expect("first accept");

    let err = fx
        .desk
        .accept(request.id, owner)
        .await
        .expect_err("second accept must fail");

    assert_eq!(err.kind, ExchangeErrorKind::NotPending);
    assert_eq!(fx.desk.balance_of(requester).await, Some(0));
    assert_eq!(fx.desk.balance_of(owner).await, Some(150));
    assert_eq!(fx.desk.history_for(owner).await.len(), 1);
}

#[tokio::test]
async fn given_balance_spent_elsewhere_when_accepted_then_insufficient_and_request_stays_pending() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 150).await;
    let first = card(&fx.desk, owner, 100).await;
    let second = card(&fx.desk, owner, 100).await;

    let first_request = fx.desk.request_exchange(requester, first.id).await.expect("first");
    let second_request = fx
        .desk
        .request_exchange(requester, second.id)
        .await
        .expect("no coins are held at intake");

    fx.desk.accept(first_request.id, owner).await.expect("first settles");
    let err = fx
        .desk
        .accept(second_request.id, owner)
        .await
        .expect_err("only 50 coins left");

    assert_eq!(err.kind, ExchangeErrorKind::InsufficientFunds);
    assert_eq!(fx.desk.balance_of(requester).await, Some(50));
    assert_eq!(
        fx.desk.request(second_request.id).await.expect("stored").status,
        ExchangeStatus::Pending
    );
    assert!(!fx.desk.collection_of(requester).await.contains(&second.id));
}

#[tokio::test]
async fn given_card_changed_hands_when_accepted_then_owner_mismatch() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let new_owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 100).await;
    let card = card(&fx.desk, owner, 10).await;
    let request = fx.desk.request_exchange(requester, card.id).await.expect("request");

    fx.desk
        .upsert_card(Card {
            creator_id: new_owner,
            ..card.clone()
        })
        .await
        .expect("move card");

    let err = fx
        .desk
        .accept(request.id, owner)
        .await
        .expect_err("owner moved");

    assert_eq!(err.kind, ExchangeErrorKind::OwnerMismatch);
    assert_eq!(fx.desk.balance_of(requester).await, Some(100));
    assert_eq!(fx.desk.balance_of(owner).await, Some(0));
}

#[tokio::test]
async fn given_price_rises_after_request_when_accepted_then_snapshot_price_is_charged() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 100).await;
    let card = card(&fx.desk, owner, 10).await;
    let request = fx.desk.request_exchange(requester, card.id).await.expect("request");

    fx.desk
        .upsert_card(Card {
            like_count: 500,
            ..card.clone()
        })
        .await
        .expect("card got popular");

    let notice = fx.desk.accept(request.id, owner).await.expect("accept");
    assert_eq!(notice.coin_amount, 10);
    assert_eq!(fx.desk.balance_of(requester).await, Some(90));
}

#[tokio::test]
async fn given_stranger_when_accepting_then_unauthorized() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 100).await;
    let card = card(&fx.desk, owner, 10).await;
    let request = fx.desk.request_exchange(requester, card.id).await.expect("request");

    let err = fx
        .desk
        .accept(request.id, requester)
        .await
        .expect_err("requester may not accept");
    assert_eq!(err.kind, ExchangeErrorKind::Unauthorized);
}

#[tokio::test]
async fn given_rejected_request_when_accepted_then_not_pending() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 100).await;
    let card = card(&fx.desk, owner, 10).await;
    let request = fx.desk.request_exchange(requester, card.id).await.expect("request");

    let rejected = fx.desk.reject(request.id, owner).await.expect("reject");
    assert_eq!(rejected.status, ExchangeStatus::Rejected);

    let err = fx.desk.accept(request.id, owner).await.expect_err("closed");
    assert_eq!(err.kind, ExchangeErrorKind::NotPending);
    assert_eq!(fx.desk.balance_of(requester).await, Some(100));
}

#[tokio::test]
async fn given_cancelled_request_when_requested_again_then_new_request_is_allowed() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 100).await;
    let card = card(&fx.desk, owner, 10).await;
    let request = fx.desk.request_exchange(requester, card.id).await.expect("request");

    let err = fx
        .desk
        .request_exchange(requester, card.id)
        .await
        .expect_err("duplicate");
    assert_eq!(err.kind, ExchangeErrorKind::DuplicatePending);

    let cancelled = fx.desk.cancel(request.id, requester).await.expect("cancel");
    assert_eq!(cancelled.status, ExchangeStatus::Cancelled);

    fx.desk
        .request_exchange(requester, card.id)
        .await
        .expect("cancelled request no longer blocks");
    assert_eq!(fx.desk.sent_by(requester).await.len(), 2);
}

#[tokio::test]
async fn given_request_past_deadline_when_accepted_then_expired_and_marked() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 100).await;
    let card = card(&fx.desk, owner, 10).await;
    let request = fx.desk.request_exchange(requester, card.id).await.expect("request");

    fx.clock.advance(72 * MILLIS_PER_HOUR);

    let err = fx.desk.accept(request.id, owner).await.expect_err("expired");
    assert_eq!(err.kind, ExchangeErrorKind::Expired);
    assert_eq!(
        fx.desk.request(request.id).await.expect("stored").status,
        ExchangeStatus::Expired
    );
    assert_eq!(fx.desk.balance_of(requester).await, Some(100));
}

#[tokio::test]
async fn given_overdue_and_fresh_requests_when_swept_then_only_overdue_expire() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 100).await;
    let old_card = card(&fx.desk, owner, 10).await;
    let new_card = card(&fx.desk, owner, 10).await;

    let old = fx.desk.request_exchange(requester, old_card.id).await.expect("old");
    fx.clock.advance(48 * MILLIS_PER_HOUR);
    let fresh = fx.desk.request_exchange(requester, new_card.id).await.expect("fresh");
    fx.clock.advance(24 * MILLIS_PER_HOUR);

    let summary = fx.desk.sweep_expired().await;
    assert_eq!(summary.expired, vec![old.id]);
    assert_eq!(
        fx.desk.request(fresh.id).await.expect("stored").status,
        ExchangeStatus::Pending
    );
}

#[tokio::test]
async fn given_settled_exchange_when_visibility_resolved_then_collector_cannot_request_again() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 100).await;
    let card = card(&fx.desk, owner, 10).await;

    let before = fx.desk.visibility(card.id, requester).await.expect("card");
    assert!(before.can_request_exchange);

    let request = fx.desk.request_exchange(requester, card.id).await.expect("request");
    fx.desk.accept(request.id, owner).await.expect("accept");

    let after = fx.desk.visibility(card.id, requester).await.expect("card");
    assert!(!after.can_request_exchange);
    assert!(after.shows_price);

    let err = fx
        .desk
        .request_exchange(requester, card.id)
        .await
        .expect_err("already collected");
    assert_eq!(err.kind, ExchangeErrorKind::AlreadyCollected);

    let owner_view = fx.desk.visibility(card.id, owner).await.expect("card");
    assert!(owner_view.can_edit && owner_view.can_delete);
}

#[tokio::test]
async fn given_unknown_ids_when_operating_then_not_found() {
    let fx = fixture();
    let requester = user(&fx.desk, 100).await;

    let err = fx
        .desk
        .request_exchange(requester, Uuid::new_v4())
        .await
        .expect_err("unknown card");
    assert_eq!(err.kind, ExchangeErrorKind::NotFound);

    let err = fx
        .desk
        .accept(Uuid::new_v4(), requester)
        .await
        .expect_err("unknown request");
    assert_eq!(err.kind, ExchangeErrorKind::NotFound);
}

#[tokio::test]
async fn given_default_policy_when_user_registered_without_balance_then_default_grant_applies() {
    let fx = fixture();
    let user_id = Uuid::new_v4();
    let balance = fx.desk.register_user(user_id, None).await.expect("register");
    assert_eq!(balance, 100);
    assert_eq!(
        fx.desk.register_user(user_id, Some(5)).await.expect("again"),
        100
    );
}

#[tokio::test]
async fn given_settled_card_when_next_collector_requests_then_price_includes_exchange_bonus() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let first_requester = user(&fx.desk, 100).await;
    let second_requester = user(&fx.desk, 100).await;
    let card = card(&fx.desk, owner, 10).await;

    let first = fx
        .desk
        .request_exchange(first_requester, card.id)
        .await
        .expect("first request");
    fx.desk.accept(first.id, owner).await.expect("first settles");

    let snapshot = fx.desk.snapshot().await;
    assert_eq!(snapshot.cards[&card.id].exchange_count, 1);

    let second = fx
        .desk
        .request_exchange(second_requester, card.id)
        .await
        .expect("second request");
    assert_eq!(second.coin_cost, 12);
}

#[tokio::test]
async fn given_refused_settlement_when_checked_then_card_count_is_untouched() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 150).await;
    let first = card(&fx.desk, owner, 100).await;
    let second = card(&fx.desk, owner, 100).await;
    let first_request = fx.desk.request_exchange(requester, first.id).await.expect("first");
    let second_request = fx.desk.request_exchange(requester, second.id).await.expect("second");
    fx.desk.accept(first_request.id, owner).await.expect("first settles");
    let journal_before = fx.desk.snapshot().await.ledger.entries().len();

    fx.desk
        .accept(second_request.id, owner)
        .await
        .expect_err("only 50 coins left");

    let snapshot = fx.desk.snapshot().await;
    assert_eq!(snapshot.cards[&second.id].exchange_count, 0);
    assert_eq!(snapshot.ledger.entries().len(), journal_before);
}

#[tokio::test]
async fn given_overdue_unswept_request_when_owner_lists_pending_then_it_is_hidden() {
    let fx = fixture();
    let owner = user(&fx.desk, 0).await;
    let requester = user(&fx.desk, 100).await;
    let old_card = card(&fx.desk, owner, 10).await;
    let new_card = card(&fx.desk, owner, 10).await;

    let old = fx.desk.request_exchange(requester, old_card.id).await.expect("old");
    fx.clock.advance(48 * MILLIS_PER_HOUR);
    let fresh = fx.desk.request_exchange(requester, new_card.id).await.expect("fresh");
    fx.clock.advance(24 * MILLIS_PER_HOUR);

    let listed = fx.desk.pending_for_owner(owner).await;
    assert_eq!(listed, vec![fresh.clone()]);
    // still stored as pending until a sweep or an accept touches it
    assert_eq!(
        fx.desk.request(old.id).await.expect("stored").status,
        ExchangeStatus::Pending
    );
    fx.desk.accept(fresh.id, owner).await.expect("listed request settles");
}
