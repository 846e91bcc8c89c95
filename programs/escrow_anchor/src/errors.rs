use anchor_lang::prelude::*;

#[error_code]
pub enum EscrowError {
    #[msg("Invalid amount: amount must be greater than zero")]
    InvalidAmount,
    #[msg("Address mismatch: account does not match its derived address")]
    AddressMismatch,
    #[msg("Escrow state account is already initialized")]
    AlreadyInitialized,
    #[msg("No escrow exists at the given address")]
    EscrowNotFound,
    #[msg("Escrow is not initialized or has already been taken")]
    NotInitialized,
    #[msg("Amount mismatch: declared amounts disagree with the escrow")]
    AmountMismatch,
    #[msg("Account mismatch: account does not match the escrow")]
    AccountMismatch,
    #[msg("Owner mismatch: token account is not owned by the expected wallet")]
    OwnerMismatch,
    #[msg("Mint mismatch: token account holds the wrong mint")]
    MintMismatch,
    #[msg("Insufficient funds in source token account")]
    InsufficientFunds,
    #[msg("Vault holds less than the escrowed amount")]
    VaultBalanceMismatch,
    #[msg("Account is not a valid token account")]
    InvalidTokenAccount,
}
