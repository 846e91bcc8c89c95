//! Checks shared by `initialize_escrow` and `take_escrow`.
//!
//! Every entry point runs these before the first token transfer, so a
//! malformed or adversarial call is rejected without moving any balance.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, TokenAccount};

use crate::errors::EscrowError;

pub fn require_positive(amount: u64) -> Result<()> {
    require_gt!(amount, 0, EscrowError::InvalidAmount);
    Ok(())
}

/// Re-derive a PDA from `seeds` and the caller's `bump`, accepting only the
/// canonical bump for the supplied address
pub fn verify_address(supplied: &Pubkey, seeds: &[&[u8]], bump: u8, program_id: &Pubkey) -> Result<()> {
    let (expected, canonical_bump) = Pubkey::find_program_address(seeds, program_id);
    require_keys_eq!(*supplied, expected, EscrowError::AddressMismatch);
    require_eq!(bump, canonical_bump, EscrowError::AddressMismatch);
    Ok(())
}

/// Re-derive a PDA from `seeds` alone and return its bump for signing
pub fn canonical_address(supplied: &Pubkey, seeds: &[&[u8]], program_id: &Pubkey) -> Result<u8> {
    let (expected, bump) = Pubkey::find_program_address(seeds, program_id);
    require_keys_eq!(*supplied, expected, EscrowError::AddressMismatch);
    Ok(bump)
}

/// Decode an SPL token account, rejecting anything the Token program does not own
pub fn load_token_account(account: &AccountInfo) -> Result<TokenAccount> {
    require_keys_eq!(*account.owner, token::ID, EscrowError::InvalidTokenAccount);

    let data = account.try_borrow_data()?;
    TokenAccount::try_deserialize(&mut &data[..]).map_err(|_| error!(EscrowError::InvalidTokenAccount))
}

/// The token account must belong to `owner` and hold `mint`
pub fn check_token_account(account: &TokenAccount, owner: &Pubkey, mint: &Pubkey) -> Result<()> {
    require_keys_eq!(account.owner, *owner, EscrowError::OwnerMismatch);
    check_mint(account, mint)
}

pub fn check_mint(account: &TokenAccount, mint: &Pubkey) -> Result<()> {
    require_keys_eq!(account.mint, *mint, EscrowError::MintMismatch);
    Ok(())
}

pub fn require_funds(balance: u64, amount: u64) -> Result<()> {
    require_gte!(balance, amount, EscrowError::InsufficientFunds);
    Ok(())
}
