//! NDJSON command protocol spoken by the binary on stdin/stdout.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::{
    desk::ExchangeDesk,
    exchange::ExchangeError,
    types::{Card, CardId, Coins, ExchangeId, UserId},
};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed command: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    RegisterUser {
        user_id: UserId,
        #[serde(default)]
        initial_balance: Option<Coins>,
    },
    RegisterCard {
        card_id: CardId,
        creator_id: UserId,
        #[serde(default)]
        base_price: Option<Coins>,
        #[serde(default)]
        like_count: i64,
        #[serde(default)]
        exchange_count: i64,
    },
    RequestExchange {
        requester_id: UserId,
        card_id: CardId,
    },
    Accept {
        exchange_id: ExchangeId,
        actor_id: UserId,
    },
    Reject {
        exchange_id: ExchangeId,
        actor_id: UserId,
    },
    Cancel {
        exchange_id: ExchangeId,
        actor_id: UserId,
    },
    SweepExpired,
    Balance {
        user_id: UserId,
    },
    History {
        user_id: UserId,
    },
    Visibility {
        card_id: CardId,
        viewer_id: UserId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok { result: Value },
    Error { kind: String, message: String },
}

impl Response {
    pub fn malformed(err: &WireError) -> Self {
        Response::Error {
            kind: "malformed_command".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ExchangeError> for Response {
    fn from(err: ExchangeError) -> Self {
        Response::Error {
            kind: err.kind.as_str().to_string(),
            message: err.message,
        }
    }
}

pub fn decode_command(line: &str) -> Result<Command, WireError> {
    serde_json::from_str(line).map_err(WireError::Decode)
}

pub fn encode_response(response: &Response) -> Result<String, WireError> {
    serde_json::to_string(response).map_err(WireError::Encode)
}

fn ok<T: Serialize>(value: T) -> Response {
    match serde_json::to_value(value) {
        Ok(result) => Response::Ok { result },
        Err(err) => Response::Error {
            kind: "internal".to_string(),
            message: format!("failed to encode result: {err}"),
        },
    }
}

fn respond<T: Serialize>(result: Result<T, ExchangeError>) -> Response {
    match result {
        Ok(value) => ok(value),
        Err(err) => err.into(),
    }
}

pub async fn handle_command(desk: &ExchangeDesk, command: Command) -> Response {
    match command {
        Command::RegisterUser {
            user_id,
            initial_balance,
        } => respond(
            desk.register_user(user_id, initial_balance)
                .await
                .map(|coin_balance| json!({ "user_id": user_id, "coin_balance": coin_balance })),
        ),
        Command::RegisterCard {
            card_id,
            creator_id,
            base_price,
            like_count,
            exchange_count,
        } => {
            let card = Card {
                id: card_id,
                creator_id,
                base_price: base_price.unwrap_or(desk.policy().default_card_price),
                like_count,
                exchange_count,
            };
            respond(desk.upsert_card(card).await)
        }
        Command::RequestExchange {
            requester_id,
            card_id,
        } => respond(desk.request_exchange(requester_id, card_id).await),
        Command::Accept {
            exchange_id,
            actor_id,
        } => respond(desk.accept(exchange_id, actor_id).await),
        Command::Reject {
            exchange_id,
            actor_id,
        } => respond(desk.reject(exchange_id, actor_id).await),
        Command::Cancel {
            exchange_id,
            actor_id,
        } => respond(desk.cancel(exchange_id, actor_id).await),
        Command::SweepExpired => ok(desk.sweep_expired().await),
        Command::Balance { user_id } => match desk.balance_of(user_id).await {
            Some(coin_balance) => ok(json!({ "user_id": user_id, "coin_balance": coin_balance })),
            None => Response::Error {
                kind: "not_found".to_string(),
                message: format!("user '{user_id}' not found"),
            },
        },
        Command::History { user_id } => ok(desk.history_for(user_id).await),
        Command::Visibility { card_id, viewer_id } => {
            respond(desk.visibility(card_id, viewer_id).await)
        }
    }
}

/// Decodes, executes and encodes one protocol line.
pub async fn handle_line(desk: &ExchangeDesk, line: &str) -> Result<String, WireError> {
    let response = match decode_command(line) {
        Ok(command) => handle_command(desk, command).await,
        Err(err) => {
            tracing::warn!(target: "wire", error = %err, "command_rejected");
            Response::malformed(&err)
        }
    };
    encode_response(&response)
}
