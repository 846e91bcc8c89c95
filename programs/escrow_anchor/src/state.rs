use anchor_lang::{prelude::*, system_program, Discriminator};

use crate::errors::EscrowError;

/// Escrow state account describing one open offer
#[account(discriminator = 1)]
#[derive(InitSpace, Debug, PartialEq, Eq)]
pub struct Escrow {
    /// Live offer vs. retired or never written
    pub is_initialized: bool,
    /// Wallet that deposited Token X
    pub initializer: Pubkey,
    /// Initializer's Token Y account that receives the taker's payment
    pub initializer_token_account_receive: Pubkey,
    /// Vault holding the deposited Token X
    pub escrow_token_account: Pubkey,
    /// Amount of Token X locked in the vault
    pub initializer_amount: u64,
    /// Amount of Token Y required to unlock the vault
    pub taker_amount: u64,
}

impl Escrow {
    /// Allocated size: discriminator + 1 (flag) + 3 * 32 (keys) + 2 * 8 (amounts)
    pub const LEN: usize = Self::DISCRIMINATOR.len() + Self::INIT_SPACE;

    pub fn open(
        initializer: Pubkey,
        initializer_token_account_receive: Pubkey,
        escrow_token_account: Pubkey,
        initializer_amount: u64,
        taker_amount: u64,
    ) -> Self {
        Self {
            is_initialized: true,
            initializer,
            initializer_token_account_receive,
            escrow_token_account,
            initializer_amount,
            taker_amount,
        }
    }

    /// True when the account already carries a record of this program,
    /// whether live or not yet reclaimed
    pub fn is_allocated(account: &AccountInfo, program_id: &Pubkey) -> bool {
        account.owner == program_id && !account.data_is_empty()
    }

    /// Load a live record, failing closed on anything else
    pub fn load_live(account: &AccountInfo, program_id: &Pubkey) -> Result<Self> {
        if !Self::is_allocated(account, program_id) {
            return err!(EscrowError::EscrowNotFound);
        }

        let data = account.try_borrow_data()?;
        let escrow = Self::try_deserialize(&mut &data[..])
            .map_err(|_| error!(EscrowError::NotInitialized))?;
        require!(escrow.is_initialized, EscrowError::NotInitialized);

        Ok(escrow)
    }

    /// Write the record into freshly allocated account data
    pub fn store(&self, account: &AccountInfo) -> Result<()> {
        let mut data = account.try_borrow_mut_data()?;
        let mut writer: &mut [u8] = &mut data[..];
        self.try_serialize(&mut writer)
    }

    /// Retire the record: move its lamports to `destination`, hand the account
    /// back to the System program and shrink its data to zero so the same
    /// address can be allocated again
    pub fn close<'info>(account: &AccountInfo<'info>, destination: &AccountInfo<'info>) -> Result<()> {
        let lamports = account.lamports();
        let credited = destination
            .lamports()
            .checked_add(lamports)
            .ok_or(ProgramError::ArithmeticOverflow)?;

        **destination.try_borrow_mut_lamports()? = credited;
        **account.try_borrow_mut_lamports()? = 0;

        account.try_borrow_mut_data()?.fill(0);
        account.assign(&system_program::ID);
        account.resize(0)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::error::Error;

    fn sample() -> Escrow {
        Escrow::open(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            5,
            10,
        )
    }

    fn encode(escrow: &Escrow) -> Vec<u8> {
        let mut data = vec![0u8; Escrow::LEN];
        let mut writer: &mut [u8] = &mut data[..];
        escrow.try_serialize(&mut writer).unwrap();
        data
    }

    #[test]
    fn record_layout_is_fixed() {
        assert_eq!(Escrow::INIT_SPACE, 1 + 32 + 32 + 32 + 8 + 8);
        assert_eq!(Escrow::LEN, 114);
    }

    #[test]
    fn record_fields_sit_at_fixed_offsets() {
        let escrow = sample();
        let data = encode(&escrow);

        assert_eq!(data[0], 1);
        assert_eq!(data[1], 1);
        assert_eq!(&data[2..34], escrow.initializer.as_ref());
        assert_eq!(&data[34..66], escrow.initializer_token_account_receive.as_ref());
        assert_eq!(&data[66..98], escrow.escrow_token_account.as_ref());
        assert_eq!(&data[98..106], &5u64.to_le_bytes());
        assert_eq!(&data[106..114], &10u64.to_le_bytes());
    }

    #[test]
    fn load_live_reads_a_stored_record() {
        let escrow = sample();
        let key = Pubkey::new_unique();
        let mut lamports = 1_000_000;
        let mut data = encode(&escrow);
        let account = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &crate::ID, false, 0);

        assert_eq!(Escrow::load_live(&account, &crate::ID).unwrap(), escrow);
    }

    #[test]
    fn load_live_rejects_missing_account() {
        let key = Pubkey::new_unique();
        let mut lamports = 0;
        let mut data: Vec<u8> = vec![];
        let account = AccountInfo::new(
            &key,
            false,
            true,
            &mut lamports,
            &mut data,
            &system_program::ID,
            false,
            0,
        );

        assert_eq!(
            Escrow::load_live(&account, &crate::ID).unwrap_err(),
            Error::from(EscrowError::EscrowNotFound)
        );
    }

    #[test]
    fn load_live_rejects_foreign_owner() {
        let key = Pubkey::new_unique();
        let foreign = Pubkey::new_unique();
        let mut lamports = 1_000_000;
        let mut data = encode(&sample());
        let account = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &foreign, false, 0);

        assert_eq!(
            Escrow::load_live(&account, &crate::ID).unwrap_err(),
            Error::from(EscrowError::EscrowNotFound)
        );
    }

    #[test]
    fn load_live_rejects_retired_record() {
        let mut escrow = sample();
        escrow.is_initialized = false;
        let key = Pubkey::new_unique();
        let mut lamports = 1_000_000;
        let mut data = encode(&escrow);
        let account = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &crate::ID, false, 0);

        assert_eq!(
            Escrow::load_live(&account, &crate::ID).unwrap_err(),
            Error::from(EscrowError::NotInitialized)
        );
    }

    #[test]
    fn load_live_rejects_wiped_record() {
        let key = Pubkey::new_unique();
        let mut lamports = 1_000_000;
        let mut data = vec![0u8; Escrow::LEN];
        let account = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &crate::ID, false, 0);

        assert_eq!(
            Escrow::load_live(&account, &crate::ID).unwrap_err(),
            Error::from(EscrowError::NotInitialized)
        );
    }

    /// Key preceded by the original data length, as the runtime lays it out
    #[allow(dead_code)]
    #[repr(C)]
    struct SerializedKey {
        original_data_len: u32,
        key: Pubkey,
    }

    /// Record data preceded by its length, as the runtime lays it out
    #[allow(dead_code)]
    #[repr(C, align(8))]
    struct SerializedData {
        data_len: u64,
        data: [u8; Escrow::LEN],
    }

    #[test]
    fn close_moves_lamports_and_releases_the_address() {
        let slot = SerializedKey {
            original_data_len: Escrow::LEN as u32,
            key: Pubkey::new_unique(),
        };
        let mut serialized = SerializedData {
            data_len: Escrow::LEN as u64,
            data: [0u8; Escrow::LEN],
        };
        serialized.data.copy_from_slice(&encode(&sample()));
        let owner = crate::ID;
        let mut lamports = 1_500_000;
        let account = AccountInfo::new(
            &slot.key,
            false,
            true,
            &mut lamports,
            &mut serialized.data,
            &owner,
            false,
            0,
        );

        let destination_key = Pubkey::new_unique();
        let mut destination_lamports = 10;
        let mut destination_data: Vec<u8> = vec![];
        let destination = AccountInfo::new(
            &destination_key,
            false,
            true,
            &mut destination_lamports,
            &mut destination_data,
            &system_program::ID,
            false,
            0,
        );

        Escrow::close(&account, &destination).unwrap();

        assert_eq!(account.lamports(), 0);
        assert_eq!(destination.lamports(), 1_500_010);
        assert!(account.data_is_empty());
        assert!(!Escrow::is_allocated(&account, &crate::ID));
        assert_eq!(
            Escrow::load_live(&account, &crate::ID).unwrap_err(),
            Error::from(EscrowError::EscrowNotFound)
        );
    }
}
