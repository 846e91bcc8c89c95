use anchor_lang::prelude::*;
use anchor_lang::system_program::{
    allocate, assign, create_account, transfer, Allocate, Assign, CreateAccount, Transfer,
};
use anchor_spl::token::{
    self, initialize_account3, transfer_checked, InitializeAccount3, Mint, Token, TokenAccount,
    TransferChecked,
};

use crate::{
    errors::EscrowError,
    pda::{CUSTODY_SEED, ESCROW_STATE_SEED, ESCROW_TOKEN_SEED},
    state::Escrow,
    validation,
};

#[derive(Accounts)]
pub struct InitializeEscrow<'info> {
    /// The initializer who deposits Token X and pays for the new accounts
    #[account(mut)]
    pub initializer: Signer<'info>,

    /// Initializer's Token X account (source of the deposit)
    #[account(mut)]
    pub initializer_token_account_send: Box<Account<'info, TokenAccount>>,

    /// Initializer's Token Y account (receives the taker's payment)
    pub initializer_token_account_receive: Box<Account<'info, TokenAccount>>,

    /// CHECK: custody authority PDA `["escrow"]`, re-derived in the handler
    pub escrow_account: UncheckedAccount<'info>,

    /// CHECK: escrow state PDA `["escrow-state", initializer, mint]`, allocated by this instruction
    #[account(mut)]
    pub escrow_state_account: UncheckedAccount<'info>,

    /// CHECK: vault PDA `["escrow-token", escrow_state]`, allocated by this instruction
    #[account(mut)]
    pub escrow_token_account: UncheckedAccount<'info>,

    /// Token X mint
    pub token_mint: Box<Account<'info, Mint>>,

    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
    pub token_program: Program<'info, Token>,
}

impl<'info> InitializeEscrow<'info> {
    /// Re-derive custody authority, escrow state and vault from the supplied bumps
    pub fn verify_addresses(
        &self,
        program_id: &Pubkey,
        custody_bump: u8,
        escrow_bump: u8,
        vault_bump: u8,
    ) -> Result<()> {
        validation::verify_address(self.escrow_account.key, &[CUSTODY_SEED], custody_bump, program_id)?;

        let initializer = self.initializer.key();
        let mint = self.token_mint.key();
        validation::verify_address(
            self.escrow_state_account.key,
            &[ESCROW_STATE_SEED, initializer.as_ref(), mint.as_ref()],
            escrow_bump,
            program_id,
        )?;

        validation::verify_address(
            self.escrow_token_account.key,
            &[ESCROW_TOKEN_SEED, self.escrow_state_account.key.as_ref()],
            vault_bump,
            program_id,
        )
    }

    /// Both token accounts belong to the initializer and the source can cover the deposit
    pub fn verify_token_accounts(&self, initializer_amount: u64) -> Result<()> {
        let initializer = self.initializer.key();

        validation::check_token_account(
            &self.initializer_token_account_send,
            &initializer,
            &self.token_mint.key(),
        )?;
        require_keys_eq!(
            self.initializer_token_account_receive.owner,
            initializer,
            EscrowError::OwnerMismatch
        );

        validation::require_funds(self.initializer_token_account_send.amount, initializer_amount)
    }

    /// Allocate the escrow state account, owned by this program
    pub fn create_escrow_state(&self, program_id: &Pubkey, escrow_bump: u8) -> Result<()> {
        require!(
            !Escrow::is_allocated(&self.escrow_state_account, program_id),
            EscrowError::AlreadyInitialized
        );

        let initializer = self.initializer.key();
        let mint = self.token_mint.key();
        let signer_seeds: &[&[&[u8]]] = &[&[
            ESCROW_STATE_SEED,
            initializer.as_ref(),
            mint.as_ref(),
            &[escrow_bump],
        ]];

        self.create_pda_account(&self.escrow_state_account, Escrow::LEN, program_id, signer_seeds)
    }

    /// Allocate the vault and make the custody authority its token owner
    pub fn create_vault(&self, vault_bump: u8) -> Result<()> {
        require_keys_neq!(
            *self.escrow_token_account.owner,
            token::ID,
            EscrowError::AlreadyInitialized
        );

        let escrow_state = self.escrow_state_account.key();
        let signer_seeds: &[&[&[u8]]] = &[&[ESCROW_TOKEN_SEED, escrow_state.as_ref(), &[vault_bump]]];

        self.create_pda_account(&self.escrow_token_account, TokenAccount::LEN, &token::ID, signer_seeds)?;

        let cpi_accounts = InitializeAccount3 {
            account: self.escrow_token_account.to_account_info(),
            mint: self.token_mint.to_account_info(),
            authority: self.escrow_account.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new(cpi_program, cpi_accounts);

        initialize_account3(cpi_ctx)
    }

    /// Write the escrow terms; the record is never modified afterwards
    pub fn init_escrow(&self, initializer_amount: u64, taker_amount: u64) -> Result<()> {
        Escrow::open(
            self.initializer.key(),
            self.initializer_token_account_receive.key(),
            self.escrow_token_account.key(),
            initializer_amount,
            taker_amount,
        )
        .store(&self.escrow_state_account)
    }

    /// Transfer Token X from initializer to vault
    pub fn deposit(&self, amount: u64) -> Result<()> {
        let cpi_accounts = TransferChecked {
            from: self.initializer_token_account_send.to_account_info(),
            mint: self.token_mint.to_account_info(),
            to: self.escrow_token_account.to_account_info(),
            authority: self.initializer.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new(cpi_program, cpi_accounts);

        transfer_checked(cpi_ctx, amount, self.token_mint.decimals)
    }

    /// Create a rent-exempt PDA account paid by the initializer. A PDA that
    /// already holds lamports cannot go through `create_account`, so it is
    /// topped up, allocated and assigned instead.
    fn create_pda_account(
        &self,
        target: &AccountInfo<'info>,
        space: usize,
        owner: &Pubkey,
        signer_seeds: &[&[&[u8]]],
    ) -> Result<()> {
        let required = self.rent.minimum_balance(space);
        let system_program = self.system_program.to_account_info();

        if target.lamports() == 0 {
            let cpi_accounts = CreateAccount {
                from: self.initializer.to_account_info(),
                to: target.clone(),
            };
            let cpi_ctx = CpiContext::new_with_signer(system_program, cpi_accounts, signer_seeds);

            return create_account(cpi_ctx, required, space as u64, owner);
        }

        let top_up = required.saturating_sub(target.lamports());
        if top_up > 0 {
            let cpi_accounts = Transfer {
                from: self.initializer.to_account_info(),
                to: target.clone(),
            };
            transfer(CpiContext::new(system_program.clone(), cpi_accounts), top_up)?;
        }

        let cpi_accounts = Allocate {
            account_to_allocate: target.clone(),
        };
        allocate(
            CpiContext::new_with_signer(system_program.clone(), cpi_accounts, signer_seeds),
            space as u64,
        )?;

        let cpi_accounts = Assign {
            account_to_assign: target.clone(),
        };
        assign(CpiContext::new_with_signer(system_program, cpi_accounts, signer_seeds), owner)
    }
}

/// Handler for the initialize_escrow instruction
pub fn handler(
    ctx: Context<InitializeEscrow>,
    custody_bump: u8,
    escrow_bump: u8,
    vault_bump: u8,
    initializer_amount: u64,
    taker_amount: u64,
) -> Result<()> {
    // Validate both sides of the offer before anything is allocated
    validation::require_positive(initializer_amount)?;
    validation::require_positive(taker_amount)?;

    let program_id = ctx.program_id;
    let accounts = &ctx.accounts;
    accounts.verify_addresses(program_id, custody_bump, escrow_bump, vault_bump)?;
    accounts.verify_token_accounts(initializer_amount)?;

    // Allocate escrow state and vault, then record the terms
    accounts.create_escrow_state(program_id, escrow_bump)?;
    accounts.create_vault(vault_bump)?;
    accounts.init_escrow(initializer_amount, taker_amount)?;

    // Lock Token X in the vault
    accounts.deposit(initializer_amount)?;

    msg!(
        "Escrow {} opened: {} locked for {} by {}",
        accounts.escrow_state_account.key(),
        initializer_amount,
        taker_amount,
        accounts.initializer.key(),
    );

    Ok(())
}
