//! Facts published by the ledger for external indexing.

use drip_common::types::{amount_serde, Address, Amount};
use serde::{Deserialize, Serialize};

/// One-way notification emitted by a committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FaucetEvent {
    TokensClaimed(TokensClaimed),
    PauseStatus { paused: bool },
}

/// A self-service claim paid out. Totals are the claimer's, after the claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensClaimed {
    pub claimer: Address,
    /// Amount sent to the claimer, bonus included
    #[serde(with = "amount_serde")]
    pub amount: Amount,
    pub referrer: Option<Address>,
    #[serde(with = "amount_serde")]
    pub total_tokens_claimed: Amount,
    pub total_claims_made: u64,
    pub total_referral_claims_received: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = FaucetEvent::PauseStatus { paused: true };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"event": "pause_status", "paused": true}));

        let claimed = FaucetEvent::TokensClaimed(TokensClaimed {
            claimer: Address::from_low_u64(1),
            amount: 110,
            referrer: None,
            total_tokens_claimed: 100,
            total_claims_made: 1,
            total_referral_claims_received: 0,
        });
        let json = serde_json::to_value(&claimed).unwrap();
        assert_eq!(json["event"], "tokens_claimed");
        assert_eq!(json["amount"], "110");
        assert!(json["referrer"].is_null());
    }
}
