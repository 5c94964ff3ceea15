use serde::{Deserialize, Serialize};

use crate::{
    exchange::error::{ExchangeError, arithmetic_error, invalid_amount},
    types::{Card, CardId, Coins},
};

pub const LIKES_PER_BONUS_COIN: i64 = 10;
pub const BONUS_COINS_PER_EXCHANGE: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangePrice {
    pub card_id: CardId,
    pub base_price: Coins,
    pub popularity_bonus: Coins,
    pub final_price: Coins,
}

impl ExchangePrice {
    /// +1 coin per 10 likes, +2 coins per completed exchange.
    pub fn for_card(card: &Card) -> Result<Self, ExchangeError> {
        if card.base_price < 0 || card.like_count < 0 || card.exchange_count < 0 {
            return Err(invalid_amount(format!(
                "card '{}' has negative price components: base={}, likes={}, exchanges={}",
                card.id, card.base_price, card.like_count, card.exchange_count
            )));
        }

        let popularity_bonus = (card.like_count / LIKES_PER_BONUS_COIN)
            .checked_add(
                card.exchange_count
                    .checked_mul(BONUS_COINS_PER_EXCHANGE)
                    .ok_or_else(|| arithmetic_error("exchange bonus overflow"))?,
            )
            .ok_or_else(|| arithmetic_error("popularity bonus overflow"))?;
        let final_price = card
            .base_price
            .checked_add(popularity_bonus)
            .ok_or_else(|| arithmetic_error("exchange price overflow"))?;

        Ok(Self {
            card_id: card.id,
            base_price: card.base_price,
            popularity_bonus,
            final_price,
        })
    }
}
