use anchor_lang::prelude::*;

/// Seed of the keyless custody authority that signs for every vault
pub const CUSTODY_SEED: &[u8] = b"escrow";

/// Seed prefix of the escrow state account, followed by initializer and mint
pub const ESCROW_STATE_SEED: &[u8] = b"escrow-state";

/// Seed prefix of the vault token account, followed by the escrow state key
pub const ESCROW_TOKEN_SEED: &[u8] = b"escrow-token";

/// Custody authority PDA: `["escrow"]`
pub fn custody_authority_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CUSTODY_SEED], program_id)
}

/// Escrow state PDA: `["escrow-state", initializer, mint]`
pub fn escrow_state_address(initializer: &Pubkey, mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[ESCROW_STATE_SEED, initializer.as_ref(), mint.as_ref()],
        program_id,
    )
}

/// Vault PDA: `["escrow-token", escrow_state]`
pub fn escrow_vault_address(escrow_state: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ESCROW_TOKEN_SEED, escrow_state.as_ref()], program_id)
}

/// Every address an escrow needs, with the bumps `initialize_escrow` expects
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EscrowAddresses {
    pub custody_authority: Pubkey,
    pub custody_bump: u8,
    pub escrow_state: Pubkey,
    pub escrow_bump: u8,
    pub vault: Pubkey,
    pub vault_bump: u8,
}

impl EscrowAddresses {
    pub fn derive(initializer: &Pubkey, mint: &Pubkey, program_id: &Pubkey) -> Self {
        let (custody_authority, custody_bump) = custody_authority_address(program_id);
        let (escrow_state, escrow_bump) = escrow_state_address(initializer, mint, program_id);
        let (vault, vault_bump) = escrow_vault_address(&escrow_state, program_id);

        Self {
            custody_authority,
            custody_bump,
            escrow_state,
            escrow_bump,
            vault,
            vault_bump,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_state_derivation_is_deterministic() {
        let initializer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let first = escrow_state_address(&initializer, &mint, &crate::ID);
        let second = escrow_state_address(&initializer, &mint, &crate::ID);

        assert_eq!(first, second);
    }

    #[test]
    fn escrow_state_is_scoped_per_initializer_and_mint() {
        let initializer = Pubkey::new_unique();
        let other_initializer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let other_mint = Pubkey::new_unique();

        let (base, _) = escrow_state_address(&initializer, &mint, &crate::ID);
        let (by_mint, _) = escrow_state_address(&initializer, &other_mint, &crate::ID);
        let (by_initializer, _) = escrow_state_address(&other_initializer, &mint, &crate::ID);

        assert_ne!(base, by_mint);
        assert_ne!(base, by_initializer);
    }

    #[test]
    fn derived_addresses_have_no_private_key() {
        let addresses = EscrowAddresses::derive(&Pubkey::new_unique(), &Pubkey::new_unique(), &crate::ID);

        assert!(!addresses.custody_authority.is_on_curve());
        assert!(!addresses.escrow_state.is_on_curve());
        assert!(!addresses.vault.is_on_curve());
    }

    #[test]
    fn addresses_depend_on_program_id() {
        let initializer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let ours = EscrowAddresses::derive(&initializer, &mint, &crate::ID);
        let theirs = EscrowAddresses::derive(&initializer, &mint, &Pubkey::new_unique());

        assert_ne!(ours.custody_authority, theirs.custody_authority);
        assert_ne!(ours.escrow_state, theirs.escrow_state);
        assert_ne!(ours.vault, theirs.vault);
    }

    #[test]
    fn bumps_recreate_the_derived_addresses() {
        let initializer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let addresses = EscrowAddresses::derive(&initializer, &mint, &crate::ID);

        let escrow_state = Pubkey::create_program_address(
            &[ESCROW_STATE_SEED, initializer.as_ref(), mint.as_ref(), &[addresses.escrow_bump]],
            &crate::ID,
        )
        .unwrap();
        let vault = Pubkey::create_program_address(
            &[ESCROW_TOKEN_SEED, addresses.escrow_state.as_ref(), &[addresses.vault_bump]],
            &crate::ID,
        )
        .unwrap();

        assert_eq!(escrow_state, addresses.escrow_state);
        assert_eq!(vault, addresses.vault);
    }
}
