use lifecard_exchange::{
    exchange::{
        CompletionInput, ExchangeErrorKind, ExchangeRequest, ExchangeStatus, Transition,
        cancel, check_transition, complete_exchange, reject,
    },
    ledger::has_sufficient_balance,
    types::CollectedCards,
    visibility::resolve_visibility,
};
use proptest::prelude::*;
use uuid::Uuid;

fn any_uuid() -> impl Strategy<Value = Uuid> {
    any::<[u8; 16]>().prop_map(Uuid::from_bytes)
}

fn terminal_status() -> impl Strategy<Value = ExchangeStatus> {
    prop_oneof![
        Just(ExchangeStatus::Accepted),
        Just(ExchangeStatus::Rejected),
        Just(ExchangeStatus::Cancelled),
        Just(ExchangeStatus::Expired),
    ]
}

fn request(owner: Uuid, requester: Uuid, coin_cost: i64, status: ExchangeStatus) -> ExchangeRequest {
    ExchangeRequest {
        id: Uuid::new_v4(),
        requester_id: requester,
        card_id: Uuid::new_v4(),
        card_owner_id: owner,
        coin_cost,
        status,
        created_at: 0,
        expires_at: 1,
    }
}

proptest! {
    #[test]
    fn sufficiency_matches_comparison(balance in 0i64..1_000_000, amount in 0i64..1_000_000) {
        prop_assert_eq!(has_sufficient_balance(balance, amount), balance >= amount);
        prop_assert!(has_sufficient_balance(balance, 0));
    }

    #[test]
    fn settlement_conserves_coins(
        requester_balance in 0i64..1_000_000,
        owner_balance in 0i64..1_000_000,
        cost_ratio in 0.0f64..=1.0,
    ) {
        let coin_cost = (requester_balance as f64 * cost_ratio).floor() as i64;
        let req = request(Uuid::new_v4(), Uuid::new_v4(), coin_cost, ExchangeStatus::Pending);
        let collection = CollectedCards::new();

        let settlement = complete_exchange(CompletionInput {
            request: &req,
            requester_balance,
            owner_balance,
            card_creator_id: req.card_owner_id,
            requester_collection: &collection,
        })
        .expect("preconditions hold");

        prop_assert_eq!(
            settlement.requester_balance + settlement.owner_balance,
            requester_balance + owner_balance
        );
        prop_assert_eq!(settlement.requester_balance, requester_balance - coin_cost);
        prop_assert!(settlement.requester_collection.contains(&req.card_id));
    }

    #[test]
    fn zero_cost_always_settles(requester_balance in 0i64..1_000, owner_balance in 0i64..1_000) {
        let req = request(Uuid::new_v4(), Uuid::new_v4(), 0, ExchangeStatus::Pending);
        let collection = CollectedCards::new();

        let settlement = complete_exchange(CompletionInput {
            request: &req,
            requester_balance,
            owner_balance,
            card_creator_id: req.card_owner_id,
            requester_collection: &collection,
        })
        .expect("zero cost settles");

        prop_assert_eq!(settlement.requester_balance, requester_balance);
        prop_assert_eq!(settlement.owner_balance, owner_balance);
    }

    #[test]
    fn terminal_requests_refuse_every_transition(
        status in terminal_status(),
        owner in any_uuid(),
        requester in any_uuid(),
        coin_cost in 0i64..1_000,
    ) {
        let req = request(owner, requester, coin_cost, status);
        let collection = CollectedCards::new();

        for transition in [Transition::Accept, Transition::Reject, Transition::Cancel, Transition::Expire] {
            prop_assert!(check_transition(status, transition).is_err());
        }
        prop_assert_eq!(
            reject(&req, owner).map_err(|err| err.kind),
            Err(ExchangeErrorKind::InvalidStateTransition)
        );
        prop_assert_eq!(
            cancel(&req, requester).map_err(|err| err.kind),
            Err(ExchangeErrorKind::InvalidStateTransition)
        );
        let input = CompletionInput {
            request: &req,
            requester_balance: coin_cost,
            owner_balance: 0,
            card_creator_id: owner,
            requester_collection: &collection,
        };
        prop_assert_eq!(
            complete_exchange(input).map_err(|err| err.kind),
            Err(ExchangeErrorKind::NotPending)
        );
        prop_assert_eq!(req.status, status);
    }

    #[test]
    fn visibility_invariants_hold(
        creator in any_uuid(),
        other in any_uuid(),
        viewer_is_creator in any::<bool>(),
        collected in any::<bool>(),
    ) {
        let viewer = if viewer_is_creator { creator } else { other };
        let visibility = resolve_visibility(creator, viewer, collected);

        prop_assert_eq!(visibility.can_edit, visibility.can_delete);
        prop_assert!(!(visibility.can_edit && visibility.can_request_exchange));
        prop_assert_eq!(visibility.shows_price, !visibility.can_edit);
        prop_assert_eq!(visibility, resolve_visibility(creator, viewer, collected));
        if creator != viewer {
            prop_assert_eq!(visibility.can_request_exchange, !collected);
        }
    }
}
