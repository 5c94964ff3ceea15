use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// UI permissions for one viewer looking at one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Visibility {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_request_exchange: bool,
    pub shows_price: bool,
}

impl Visibility {
    pub fn is_owner(&self) -> bool {
        self.can_edit
    }
}

/// Edit and delete go together and belong to the creator alone; only a
/// non-owner who has not collected the card may ask for it.
pub fn resolve_visibility(
    card_creator_id: UserId,
    viewer_id: UserId,
    is_already_collected: bool,
) -> Visibility {
    let is_owner = card_creator_id == viewer_id;
    Visibility {
        can_edit: is_owner,
        can_delete: is_owner,
        can_request_exchange: !is_owner && !is_already_collected,
        shows_price: !is_owner,
    }
}
