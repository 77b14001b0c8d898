//! Optional economy provider boundary.

use crate::ids::PlayerId;

/// Raw response of an economy deposit.
#[derive(Clone, Debug, PartialEq)]
pub struct DepositResponse {
    /// Whether the money arrived.
    pub success: bool,
    /// Amount actually deposited.
    pub amount: f64,
    /// Provider error message on failure.
    pub error: Option<String>,
}

impl DepositResponse {
    /// A successful deposit of `amount`.
    #[must_use]
    pub fn ok(amount: f64) -> Self {
        Self {
            success: true,
            amount,
            error: None,
        }
    }

    /// A failed deposit.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            amount: 0.0,
            error: Some(error.into()),
        }
    }
}

/// Economy plugin (implemented by the host adapter when one is installed).
pub trait EconomyProvider: Send + Sync {
    /// Deposits `amount` into the player's account.
    fn deposit(&self, player: PlayerId, amount: f64) -> DepositResponse;
}

/// What happened to the monetary part of a reward.
#[derive(Clone, Debug, PartialEq)]
pub enum MoneyOutcome {
    /// The reward carries no money.
    None,
    /// No economy provider is installed.
    Unavailable,
    /// Money deposited.
    Deposited(f64),
    /// The provider refused or failed; the rest of the reward still applies.
    Failed(String),
}

/// Deposits a reward, degrading every failure to a [`MoneyOutcome`].
pub fn deposit_reward(
    economy: Option<&dyn EconomyProvider>,
    player: PlayerId,
    amount: f64,
) -> MoneyOutcome {
    if amount <= 0.0 || !amount.is_finite() {
        return MoneyOutcome::None;
    }
    let Some(economy) = economy else {
        return MoneyOutcome::Unavailable;
    };
    let response = economy.deposit(player, amount);
    if response.success {
        MoneyOutcome::Deposited(response.amount)
    } else {
        let reason = response
            .error
            .unwrap_or_else(|| "deposit rejected".to_string());
        tracing::warn!(%player, amount, %reason, "Economy deposit failed");
        MoneyOutcome::Failed(reason)
    }
}
