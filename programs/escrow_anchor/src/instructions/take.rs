use anchor_lang::prelude::*;
use anchor_spl::token::{
    close_account, transfer_checked, CloseAccount, Mint, Token, TokenAccount, TransferChecked,
};

use crate::{
    errors::EscrowError,
    pda::{CUSTODY_SEED, ESCROW_STATE_SEED, ESCROW_TOKEN_SEED},
    settlement::{Leg, SettlementPlan, TakeTerms, TokenBalance},
    state::Escrow,
    validation,
};

#[derive(Accounts)]
pub struct TakeEscrow<'info> {
    /// The taker who pays Token Y and receives Token X
    #[account(mut)]
    pub taker: Signer<'info>,

    /// Taker's Token Y account (source of the payment)
    #[account(mut)]
    pub taker_token_account_send: Box<Account<'info, TokenAccount>>,

    /// Taker's Token X account (receives the deposit)
    #[account(mut)]
    pub taker_token_account_receive: Box<Account<'info, TokenAccount>>,

    /// The initializer, refunded the rent of the escrow state and vault
    #[account(mut)]
    pub initializer: SystemAccount<'info>,

    /// Initializer's Token Y account recorded in the escrow
    #[account(mut)]
    pub initializer_token_account_receive: Box<Account<'info, TokenAccount>>,

    /// CHECK: custody authority PDA `["escrow"]`, re-derived in the handler
    pub escrow_account: UncheckedAccount<'info>,

    /// CHECK: loaded through `Escrow::load_live` and re-derived in the handler
    #[account(mut)]
    pub escrow_state_account: UncheckedAccount<'info>,

    /// CHECK: vault, decoded by `validation::load_token_account` and re-derived in the handler
    #[account(mut)]
    pub escrow_token_account: UncheckedAccount<'info>,

    /// Token X mint
    pub token_x_mint: Box<Account<'info, Mint>>,

    /// Token Y mint
    pub token_y_mint: Box<Account<'info, Mint>>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

impl<'info> TakeEscrow<'info> {
    /// Re-derive escrow state, custody authority and vault. Returns the
    /// custody bump used to sign for the vault.
    pub fn verify_addresses(&self, program_id: &Pubkey, escrow: &Escrow) -> Result<u8> {
        require_keys_eq!(
            escrow.initializer,
            self.initializer.key(),
            EscrowError::AccountMismatch
        );

        let initializer = self.initializer.key();
        let mint = self.token_x_mint.key();
        validation::canonical_address(
            self.escrow_state_account.key,
            &[ESCROW_STATE_SEED, initializer.as_ref(), mint.as_ref()],
            program_id,
        )?;

        validation::canonical_address(
            self.escrow_token_account.key,
            &[ESCROW_TOKEN_SEED, self.escrow_state_account.key.as_ref()],
            program_id,
        )?;

        validation::canonical_address(self.escrow_account.key, &[CUSTODY_SEED], program_id)
    }

    /// Check every token account and both balances, producing the two legs
    pub fn plan(&self, escrow: &Escrow, terms: TakeTerms) -> Result<SettlementPlan> {
        let mint_x = self.token_x_mint.key();
        let mint_y = self.token_y_mint.key();

        let vault = validation::load_token_account(&self.escrow_token_account)?;
        validation::check_token_account(&vault, self.escrow_account.key, &mint_x)?;
        validation::check_token_account(&self.taker_token_account_send, &self.taker.key(), &mint_y)?;
        validation::check_mint(&self.taker_token_account_receive, &mint_x)?;
        validation::check_mint(&self.initializer_token_account_receive, &mint_y)?;

        SettlementPlan::prepare(
            escrow,
            terms,
            TokenBalance {
                key: self.escrow_token_account.key(),
                amount: vault.amount,
            },
            TokenBalance {
                key: self.taker_token_account_send.key(),
                amount: self.taker_token_account_send.amount,
            },
            self.taker_token_account_receive.key(),
            self.initializer_token_account_receive.key(),
        )
    }

    /// Leg A: transfer Token Y from taker to initializer
    pub fn pay_initializer(&self, leg: &Leg) -> Result<()> {
        let cpi_accounts = TransferChecked {
            from: self.taker_token_account_send.to_account_info(),
            mint: self.token_y_mint.to_account_info(),
            to: self.initializer_token_account_receive.to_account_info(),
            authority: self.taker.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new(cpi_program, cpi_accounts);

        transfer_checked(cpi_ctx, leg.amount, self.token_y_mint.decimals)
    }

    /// Leg B: transfer Token X from vault to taker, then close the vault
    pub fn release_and_close_vault(&self, leg: &Leg, custody_bump: u8) -> Result<()> {
        let signer_seeds: &[&[&[u8]]] = &[&[CUSTODY_SEED, &[custody_bump]]];

        let cpi_accounts = TransferChecked {
            from: self.escrow_token_account.to_account_info(),
            mint: self.token_x_mint.to_account_info(),
            to: self.taker_token_account_receive.to_account_info(),
            authority: self.escrow_account.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds);

        transfer_checked(cpi_ctx, leg.amount, self.token_x_mint.decimals)?;

        // Close the drained vault and return rent to initializer
        let cpi_accounts = CloseAccount {
            account: self.escrow_token_account.to_account_info(),
            destination: self.initializer.to_account_info(),
            authority: self.escrow_account.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds);

        close_account(cpi_ctx)
    }
}

/// Handler for the take_escrow instruction
pub fn handler(
    ctx: Context<TakeEscrow>,
    expected_initializer_amount: u64,
    expected_taker_amount: u64,
) -> Result<()> {
    let program_id = ctx.program_id;
    let accounts = &ctx.accounts;

    // A missing or retired record stops a second take here
    let escrow = Escrow::load_live(&accounts.escrow_state_account, program_id)?;
    let custody_bump = accounts.verify_addresses(program_id, &escrow)?;

    let plan = accounts.plan(
        &escrow,
        TakeTerms {
            initializer_amount: expected_initializer_amount,
            taker_amount: expected_taker_amount,
        },
    )?;

    // Both legs run inside this instruction; a failure in either reverts both
    accounts.pay_initializer(&plan.payment)?;
    accounts.release_and_close_vault(&plan.release, custody_bump)?;

    // Retire the escrow state and return its rent to initializer
    Escrow::close(
        &accounts.escrow_state_account.to_account_info(),
        &accounts.initializer.to_account_info(),
    )?;

    msg!(
        "Escrow {} taken by {}: {} released for {}",
        accounts.escrow_state_account.key(),
        accounts.taker.key(),
        plan.release.amount,
        plan.payment.amount,
    );

    Ok(())
}
