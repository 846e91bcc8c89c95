//! Settlement planning for `take_escrow`.
//!
//! A [`SettlementPlan`] is only produced once every precondition of both legs
//! holds, so the handler never issues the first transfer of a swap whose second
//! transfer is already known to fail.

use anchor_lang::prelude::*;

use crate::{errors::EscrowError, state::Escrow, validation};

/// Balance snapshot of one token account taking part in the swap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenBalance {
    pub key: Pubkey,
    pub amount: u64,
}

/// Amounts the taker believes the escrow holds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TakeTerms {
    /// Token X the taker expects out of the vault
    pub initializer_amount: u64,
    /// Token Y the taker is willing to pay
    pub taker_amount: u64,
}

/// One transfer of the swap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Leg {
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
}

/// Both legs of a validated settlement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementPlan {
    /// Leg A: Token Y from the taker to the initializer, signed by the taker
    pub payment: Leg,
    /// Leg B: the whole vault balance from the vault to the taker, signed by
    /// the custody authority. The vault must be empty before it can be closed.
    pub release: Leg,
}

impl SettlementPlan {
    pub fn prepare(
        escrow: &Escrow,
        terms: TakeTerms,
        vault: TokenBalance,
        taker_send: TokenBalance,
        taker_receive: Pubkey,
        initializer_receive: Pubkey,
    ) -> Result<Self> {
        require!(escrow.is_initialized, EscrowError::NotInitialized);

        require_eq!(
            terms.initializer_amount,
            escrow.initializer_amount,
            EscrowError::AmountMismatch
        );
        require_eq!(terms.taker_amount, escrow.taker_amount, EscrowError::AmountMismatch);

        require_keys_eq!(
            initializer_receive,
            escrow.initializer_token_account_receive,
            EscrowError::AccountMismatch
        );
        require_keys_eq!(vault.key, escrow.escrow_token_account, EscrowError::AccountMismatch);

        validation::require_funds(taker_send.amount, escrow.taker_amount)?;
        require_gte!(
            vault.amount,
            escrow.initializer_amount,
            EscrowError::VaultBalanceMismatch
        );

        Ok(Self {
            payment: Leg {
                from: taker_send.key,
                to: initializer_receive,
                amount: escrow.taker_amount,
            },
            release: Leg {
                from: vault.key,
                to: taker_receive,
                amount: vault.amount,
            },
        })
    }
}
