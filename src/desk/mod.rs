//! Caller-side orchestration around the pure exchange core.
//!
//! The desk owns the mutable facts (balances, cards, collections, requests)
//! behind one async mutex. Each operation reads a snapshot, asks the core for
//! a decision and commits the result before the lock is released, so a
//! precondition check and its effects are observed as one step.

pub mod state;
pub mod sweeper;

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::{
    clock::Clock,
    exchange::{
        CompletionInput, ExchangePrice, ExchangeRecord, ExchangeRecordView, ExchangeRequest,
        ExpirySummary, IntakeInput, SettlementNotice, complete_exchange,
        error::{ExchangeError, arithmetic_error, expired, internal_error, not_pending},
        expiry, open_request, state_machine,
        state_machine::Transition,
    },
    types::{
        Card, CardId, CollectedCards, Coins, ExchangeId, MILLIS_PER_HOUR, UnixMillis, UserId,
    },
    visibility::{Visibility, resolve_visibility},
};

pub use state::DeskState;
pub use sweeper::ExpirySweeper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangePolicy {
    pub default_coin_balance: Coins,
    pub default_card_price: Coins,
    pub request_ttl_ms: i64,
}

impl Default for ExchangePolicy {
    fn default() -> Self {
        Self {
            default_coin_balance: 100,
            default_card_price: 10,
            request_ttl_ms: 72 * MILLIS_PER_HOUR,
        }
    }
}

pub struct ExchangeDesk {
    state: Mutex<DeskState>,
    policy: ExchangePolicy,
    clock: Arc<dyn Clock>,
    notices: Option<mpsc::Sender<SettlementNotice>>,
}

impl ExchangeDesk {
    pub fn new(
        policy: ExchangePolicy,
        clock: Arc<dyn Clock>,
        notices: Option<mpsc::Sender<SettlementNotice>>,
    ) -> Self {
        Self {
            state: Mutex::new(DeskState::default()),
            policy,
            clock,
            notices,
        }
    }

    pub fn policy(&self) -> &ExchangePolicy {
        &self.policy
    }

    pub async fn register_user(
        &self,
        user_id: UserId,
        initial_balance: Option<Coins>,
    ) -> Result<Coins, ExchangeError> {
        let initial = initial_balance.unwrap_or(self.policy.default_coin_balance);
        let mut state = self.state.lock().await;
        let balance = state.ledger.open_account(user_id, initial)?;
        state.collections.entry(user_id).or_default();
        tracing::info!(
            target: "exchange_desk",
            user_id = %user_id,
            coin_balance = balance,
            "user_registered"
        );
        Ok(balance)
    }

    /// Registers a card or replaces its snapshot. Replacing the creator models
    /// an ownership move made elsewhere; pending requests keep their snapshot.
    pub async fn upsert_card(&self, card: Card) -> Result<ExchangePrice, ExchangeError> {
        let price = ExchangePrice::for_card(&card)?;
        let mut state = self.state.lock().await;
        if let Some(previous) = state.cards.get(&card.id)
            && previous.creator_id != card.creator_id
        {
            tracing::warn!(
                target: "exchange_desk",
                card_id = %card.id,
                previous_owner = %previous.creator_id,
                new_owner = %card.creator_id,
                "card_owner_changed"
            );
        }
        state.cards.insert(card.id, card);
        Ok(price)
    }

    pub async fn request_exchange(
        &self,
        requester_id: UserId,
        card_id: CardId,
    ) -> Result<ExchangeRequest, ExchangeError> {
        let now = self.clock.now_millis();
        let mut state = self.state.lock().await;

        let request = self
            .intake_locked(&state, requester_id, card_id, now)
            .inspect_err(|err| log_refusal("request_exchange", None, err))?;
        state.requests.insert(request.id, request.clone());
        tracing::info!(
            target: "exchange_desk",
            exchange_id = %request.id,
            requester_id = %request.requester_id,
            card_id = %request.card_id,
            owner_id = %request.card_owner_id,
            coin_cost = request.coin_cost,
            expires_at = request.expires_at,
            "exchange_requested"
        );
        Ok(request)
    }

    fn intake_locked(
        &self,
        state: &DeskState,
        requester_id: UserId,
        card_id: CardId,
        now: UnixMillis,
    ) -> Result<ExchangeRequest, ExchangeError> {
        let card = state.card(card_id)?;
        let collection = state.collection(requester_id);
        open_request(IntakeInput {
            exchange_id: Uuid::now_v7(),
            requester_id,
            requester_balance: state.balance(requester_id)?,
            requester_collection: &collection,
            card,
            has_pending_for_card: state.has_pending(requester_id, card_id),
            created_at: now,
            ttl_ms: self.policy.request_ttl_ms,
        })
    }

    /// Owner accepts: settles the request through the completion engine and
    /// emits a settlement notice once the new state is committed.
    #[tracing::instrument(name = "exchange_accept", target = "exchange_desk", skip(self))]
    pub async fn accept(
        &self,
        exchange_id: ExchangeId,
        actor: UserId,
    ) -> Result<SettlementNotice, ExchangeError> {
        let now = self.clock.now_millis();
        let notice = {
            let mut state = self.state.lock().await;
            self.settle_locked(&mut state, exchange_id, actor, now)
                .inspect_err(|err| log_refusal("accept", Some(exchange_id), err))?
        };

        tracing::info!(
            target: "exchange_desk",
            exchange_id = %notice.exchange_id,
            record_id = %notice.record_id,
            coin_amount = notice.coin_amount,
            requester_balance = notice.requester_balance,
            owner_balance = notice.owner_balance,
            "exchange_settled"
        );

        if let Some(notices) = &self.notices
            && notices.send(notice.clone()).await.is_err()
        {
            tracing::warn!(
                target: "exchange_desk",
                exchange_id = %notice.exchange_id,
                "settlement_notice_dropped"
            );
        }

        Ok(notice)
    }

    fn settle_locked(
        &self,
        state: &mut DeskState,
        exchange_id: ExchangeId,
        actor: UserId,
        now: UnixMillis,
    ) -> Result<SettlementNotice, ExchangeError> {
        let request = state.request(exchange_id)?.clone();
        if !request.status.can_accept() {
            return Err(not_pending(format!(
                "exchange request '{}' is {}, not pending",
                request.id, request.status
            )));
        }
        state_machine::check_actor(&request, actor, Transition::Accept)?;

        if expiry::is_overdue(&request, now) {
            let expired_request = expiry::expire(&request, now)?;
            state.requests.insert(exchange_id, expired_request);
            return Err(expired(format!(
                "exchange request '{}' expired at {}",
                request.id, request.expires_at
            )));
        }

        let mut card = state.card(request.card_id)?.clone();
        let requester_collection = state.collection(request.requester_id);
        let settlement = complete_exchange(CompletionInput {
            request: &request,
            requester_balance: state.balance(request.requester_id)?,
            owner_balance: state.balance(request.card_owner_id)?,
            card_creator_id: card.creator_id,
            requester_collection: &requester_collection,
        })?;

        card.exchange_count = card.exchange_count.checked_add(1).ok_or_else(|| {
            arithmetic_error(format!("exchange count overflow for card '{}'", card.id))
        })?;

        // Every check runs before the first write, so a refusal leaves the
        // ledger, journal, card and request exactly as they were.
        let quoted = state.ledger.quote_transfer(
            request.requester_id,
            request.card_owner_id,
            request.coin_cost,
        )?;
        if quoted != (settlement.requester_balance, settlement.owner_balance) {
            return Err(internal_error(format!(
                "ledger and settlement disagree for '{}': ledger=({}, {}), settlement=({}, {})",
                request.id,
                quoted.0,
                quoted.1,
                settlement.requester_balance,
                settlement.owner_balance
            )));
        }

        state.ledger.apply_transfer(
            request.requester_id,
            request.card_owner_id,
            request.coin_cost,
            &settlement.notice.record_id,
        )?;
        state.cards.insert(card.id, card);
        state
            .collections
            .insert(request.requester_id, settlement.requester_collection);
        state.requests.insert(exchange_id, settlement.request);
        state
            .records
            .push(ExchangeRecord::from_notice(&settlement.notice, now));

        Ok(settlement.notice)
    }

    pub async fn reject(
        &self,
        exchange_id: ExchangeId,
        actor: UserId,
    ) -> Result<ExchangeRequest, ExchangeError> {
        self.decide(exchange_id, actor, Transition::Reject, state_machine::reject)
            .await
    }

    pub async fn cancel(
        &self,
        exchange_id: ExchangeId,
        actor: UserId,
    ) -> Result<ExchangeRequest, ExchangeError> {
        self.decide(exchange_id, actor, Transition::Cancel, state_machine::cancel)
            .await
    }

    async fn decide(
        &self,
        exchange_id: ExchangeId,
        actor: UserId,
        transition: Transition,
        apply: fn(&ExchangeRequest, UserId) -> Result<ExchangeRequest, ExchangeError>,
    ) -> Result<ExchangeRequest, ExchangeError> {
        let mut state = self.state.lock().await;
        let next = state
            .request(exchange_id)
            .and_then(|request| apply(request, actor))
            .inspect_err(|err| log_refusal(transition.as_str(), Some(exchange_id), err))?;

        state.requests.insert(exchange_id, next.clone());
        tracing::info!(
            target: "exchange_desk",
            exchange_id = %exchange_id,
            actor = %actor,
            status = %next.status,
            "exchange_decided"
        );
        Ok(next)
    }

    pub async fn sweep_expired(&self) -> ExpirySummary {
        let now = self.clock.now_millis();
        let mut state = self.state.lock().await;
        let summary = expiry::sweep_expired(state.requests.values_mut(), now);
        if summary.has_processed() {
            tracing::info!(
                target: "exchange_desk",
                total_found = summary.total_found,
                processed = summary.processed,
                failed = summary.failed,
                "exchange_requests_expired"
            );
        }
        summary
    }

    pub async fn balance_of(&self, user_id: UserId) -> Option<Coins> {
        self.state.lock().await.ledger.balance_of(user_id)
    }

    pub async fn collection_of(&self, user_id: UserId) -> CollectedCards {
        self.state.lock().await.collection(user_id)
    }

    pub async fn request(&self, exchange_id: ExchangeId) -> Result<ExchangeRequest, ExchangeError> {
        self.state.lock().await.request(exchange_id).cloned()
    }

    pub async fn history_for(&self, user_id: UserId) -> Vec<ExchangeRecordView> {
        let state = self.state.lock().await;
        state
            .records
            .iter()
            .rev()
            .filter_map(|record| record.view_for(user_id))
            .collect()
    }

    /// Pending requests the owner can still accept or reject. Overdue
    /// requests are left out even before a sweep has marked them.
    pub async fn pending_for_owner(&self, owner_id: UserId) -> Vec<ExchangeRequest> {
        let now = self.clock.now_millis();
        let state = self.state.lock().await;
        state
            .requests
            .values()
            .filter(|request| {
                request.is_pending()
                    && request.card_owner_id == owner_id
                    && !expiry::is_overdue(request, now)
            })
            .cloned()
            .collect()
    }

    /// Every request the user has filed, in any status.
    pub async fn sent_by(&self, requester_id: UserId) -> Vec<ExchangeRequest> {
        let state = self.state.lock().await;
        state
            .requests
            .values()
            .filter(|request| request.requester_id == requester_id)
            .cloned()
            .collect()
    }

    pub async fn visibility(
        &self,
        card_id: CardId,
        viewer_id: UserId,
    ) -> Result<Visibility, ExchangeError> {
        let state = self.state.lock().await;
        let card = state.card(card_id)?;
        let collected = state
            .collections
            .get(&viewer_id)
            .is_some_and(|cards| cards.contains(&card_id));
        Ok(resolve_visibility(card.creator_id, viewer_id, collected))
    }

    pub async fn snapshot(&self) -> DeskState {
        self.state.lock().await.clone()
    }
}

fn log_refusal(operation: &str, exchange_id: Option<ExchangeId>, err: &ExchangeError) {
    tracing::warn!(
        target: "exchange_desk",
        operation = operation,
        exchange_id = ?exchange_id,
        error_kind = %err.kind,
        error = %err,
        "exchange_refused"
    );
}
