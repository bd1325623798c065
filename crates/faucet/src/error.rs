//! Error types for the faucet ledger

use serde::Serialize;
use thiserror::Error;

/// Why a faucet operation was rejected.
///
/// Every variant is a synchronous, non-retryable rejection. The ledger is
/// left exactly as it was before the operation started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaucetError {
    #[error("faucet is paused")]
    FaucetPaused,

    #[error("address is blacklisted")]
    AddressBlacklisted,

    #[error("claim frequency is not configured")]
    FrequencyNotConfigured,

    #[error("cooldown active: next claim allowed at {next_claim_at}")]
    CooldownActive { next_claim_at: u64 },

    #[error("invalid referrer")]
    InvalidReferrer,

    #[error("invalid claimer")]
    InvalidClaimer,

    #[error("insufficient faucet funds: pool holds {available}, claim needs {required}")]
    InsufficientFaucetFunds { available: u128, required: u128 },

    #[error("token transfer to claimer failed")]
    TransferFailed,

    #[error("token transfer to referrer failed")]
    ReferrerTransferFailed,

    #[error("deposit into the pool failed")]
    DepositFailed,

    #[error("token withdrawal failed")]
    WithdrawalFailed,

    #[error("native currency withdrawal failed")]
    NativeWithdrawalFailed,

    #[error("caller is not the owner")]
    NotOwner,

    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
}

/// Coarse grouping of rejections, used for logging levels and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Policy rejection, expected in normal operation.
    Guard,
    /// The asset ledger refused a movement of funds.
    Transfer,
    Authorization,
    Arithmetic,
}

impl FaucetError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FaucetError::FaucetPaused => "FAUCET_PAUSED",
            FaucetError::AddressBlacklisted => "ADDRESS_BLACKLISTED",
            FaucetError::FrequencyNotConfigured => "FREQUENCY_NOT_CONFIGURED",
            FaucetError::CooldownActive { .. } => "COOLDOWN_ACTIVE",
            FaucetError::InvalidReferrer => "INVALID_REFERRER",
            FaucetError::InvalidClaimer => "INVALID_CLAIMER",
            FaucetError::InsufficientFaucetFunds { .. } => "INSUFFICIENT_FAUCET_FUNDS",
            FaucetError::TransferFailed => "TRANSFER_FAILED",
            FaucetError::ReferrerTransferFailed => "REFERRER_TRANSFER_FAILED",
            FaucetError::DepositFailed => "DEPOSIT_FAILED",
            FaucetError::WithdrawalFailed => "WITHDRAWAL_FAILED",
            FaucetError::NativeWithdrawalFailed => "NATIVE_WITHDRAWAL_FAILED",
            FaucetError::NotOwner => "NOT_OWNER",
            FaucetError::ArithmeticOverflow(_) => "ARITHMETIC_OVERFLOW",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FaucetError::FaucetPaused
            | FaucetError::AddressBlacklisted
            | FaucetError::FrequencyNotConfigured
            | FaucetError::CooldownActive { .. }
            | FaucetError::InvalidReferrer
            | FaucetError::InvalidClaimer => ErrorCategory::Guard,
            FaucetError::InsufficientFaucetFunds { .. }
            | FaucetError::TransferFailed
            | FaucetError::ReferrerTransferFailed
            | FaucetError::DepositFailed
            | FaucetError::WithdrawalFailed
            | FaucetError::NativeWithdrawalFailed => ErrorCategory::Transfer,
            FaucetError::NotOwner => ErrorCategory::Authorization,
            FaucetError::ArithmeticOverflow(_) => ErrorCategory::Arithmetic,
        }
    }
}

pub type FaucetResult<T> = Result<T, FaucetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_categories() {
        assert_eq!(FaucetError::FaucetPaused.code(), "FAUCET_PAUSED");
        assert_eq!(FaucetError::FaucetPaused.category(), ErrorCategory::Guard);
        assert_eq!(
            FaucetError::CooldownActive { next_claim_at: 10 }.category(),
            ErrorCategory::Guard
        );
        assert_eq!(FaucetError::ReferrerTransferFailed.category(), ErrorCategory::Transfer);
        assert_eq!(FaucetError::NotOwner.category(), ErrorCategory::Authorization);
        assert_eq!(
            FaucetError::ArithmeticOverflow("bonus").code(),
            "ARITHMETIC_OVERFLOW"
        );
    }

    #[test]
    fn test_display_carries_detail() {
        let err = FaucetError::InsufficientFaucetFunds { available: 5, required: 100 };
        assert_eq!(
            err.to_string(),
            "insufficient faucet funds: pool holds 5, claim needs 100"
        );
    }
}
