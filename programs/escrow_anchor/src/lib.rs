use anchor_lang::prelude::*;

pub mod errors;
mod instructions;
pub mod pda;
pub mod settlement;
pub mod state;
pub mod validation;

use instructions::*;

declare_id!("Escrow7nSwapXY111111111111111111111111111111");

#[program]
pub mod escrow_anchor {
    use super::*;

    /// Open an escrow: initializer locks Token X and names the Token Y price
    #[instruction(discriminator = 0)]
    pub fn initialize_escrow(
        ctx: Context<InitializeEscrow>,
        custody_bump: u8,
        escrow_bump: u8,
        vault_bump: u8,
        initializer_amount: u64,
        taker_amount: u64,
    ) -> Result<()> {
        instructions::initialize::handler(
            ctx,
            custody_bump,
            escrow_bump,
            vault_bump,
            initializer_amount,
            taker_amount,
        )
    }

    /// Take the escrow: taker pays Token Y, receives Token X, escrow is retired
    #[instruction(discriminator = 1)]
    pub fn take_escrow(
        ctx: Context<TakeEscrow>,
        expected_initializer_amount: u64,
        expected_taker_amount: u64,
    ) -> Result<()> {
        instructions::take::handler(ctx, expected_initializer_amount, expected_taker_amount)
    }
}
