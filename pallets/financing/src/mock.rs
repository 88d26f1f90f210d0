// Polimec Blockchain – https://www.polimec.org/
// Copyright (C) Polimec 2022. All rights reserved.

// The Polimec Blockchain is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// The Polimec Blockchain is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

// If you feel like getting in touch with us, you can do so at info@polimec.org

use crate::traits::InvestmentAuthorization;
use frame_support::{
	derive_impl, parameter_types,
	traits::{AsEnsureOriginWithArg, ConstU128, ConstU32, ConstU64},
	PalletId,
};
use frame_system::{mocking::MockBlock, EnsureRoot, EnsureSigned};
use sp_runtime::{
	traits::{AccountIdConversion, IdentityLookup},
	BuildStorage, Percent,
};
use std::{cell::RefCell, collections::BTreeSet};

pub type AccountId = u64;
pub type Balance = u128;

pub const RESERVE_ASSET: u32 = 1984;
pub const RESERVE_DECIMALS: u8 = 4;
pub const RESERVE_UNIT: Balance = 10u128.pow(RESERVE_DECIMALS as u32);
/// Seconds between blocks in the mock chain.
pub const BLOCK_INTERVAL: u64 = 6;

// Configure a mock runtime to test the pallet.
#[frame_support::runtime]
mod test_runtime {
	#[runtime::runtime]
	#[runtime::derive(
		RuntimeCall,
		RuntimeEvent,
		RuntimeError,
		RuntimeOrigin,
		RuntimeFreezeReason,
		RuntimeHoldReason,
		RuntimeSlashReason,
		RuntimeLockId,
		RuntimeTask
	)]
	pub struct TestRuntime;

	#[runtime::pallet_index(0)]
	pub type System = frame_system;

	#[runtime::pallet_index(1)]
	pub type Balances = pallet_balances;

	#[runtime::pallet_index(2)]
	pub type Timestamp = pallet_timestamp;

	#[runtime::pallet_index(3)]
	pub type FundingAssets = pallet_assets<Instance1>;

	#[runtime::pallet_index(4)]
	pub type ProjectTokens = pallet_assets<Instance2>;

	#[runtime::pallet_index(5)]
	pub type Financing = crate;
}

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for TestRuntime {
	type AccountData = pallet_balances::AccountData<Balance>;
	type AccountId = AccountId;
	type Block = MockBlock<TestRuntime>;
	type Lookup = IdentityLookup<Self::AccountId>;
}

#[derive_impl(pallet_balances::config_preludes::TestDefaultConfig)]
impl pallet_balances::Config for TestRuntime {
	type AccountStore = System;
	type Balance = Balance;
	type ExistentialDeposit = ConstU128<1>;
}

impl pallet_timestamp::Config for TestRuntime {
	type MinimumPeriod = ConstU64<3000>;
	type Moment = u64;
	type OnTimestampSet = ();
	type WeightInfo = ();
}

pub type FundingAssetsInstance = pallet_assets::Instance1;
pub type ProjectTokensInstance = pallet_assets::Instance2;

#[derive_impl(pallet_assets::config_preludes::TestDefaultConfig)]
impl pallet_assets::Config<FundingAssetsInstance> for TestRuntime {
	type ApprovalDeposit = ConstU128<1>;
	type AssetAccountDeposit = ConstU128<10>;
	type AssetDeposit = ConstU128<1>;
	type Balance = Balance;
	type CreateOrigin = AsEnsureOriginWithArg<EnsureSigned<AccountId>>;
	type Currency = Balances;
	type ForceOrigin = EnsureRoot<AccountId>;
	type Freezer = ();
	type MetadataDepositBase = ConstU128<1>;
	type MetadataDepositPerByte = ConstU128<1>;
}

#[derive_impl(pallet_assets::config_preludes::TestDefaultConfig)]
impl pallet_assets::Config<ProjectTokensInstance> for TestRuntime {
	type ApprovalDeposit = ConstU128<1>;
	type AssetAccountDeposit = ConstU128<10>;
	type AssetDeposit = ConstU128<1>;
	type Balance = Balance;
	type CreateOrigin = AsEnsureOriginWithArg<EnsureSigned<AccountId>>;
	type Currency = Balances;
	type ForceOrigin = EnsureRoot<AccountId>;
	type Freezer = ();
	type MetadataDepositBase = ConstU128<1>;
	type MetadataDepositPerByte = ConstU128<1>;
}

thread_local! {
	pub static DENIED_INVESTORS: RefCell<BTreeSet<AccountId>> = RefCell::new(BTreeSet::new());
}

/// Allows everyone except the accounts put on the deny list by a test.
pub struct MockAuthorization;
impl InvestmentAuthorization<AccountId> for MockAuthorization {
	fn is_authorized(who: &AccountId, _project_id: crate::ProjectId) -> bool {
		DENIED_INVESTORS.with(|denied| !denied.borrow().contains(who))
	}
}

impl MockAuthorization {
	pub fn deny(who: AccountId) {
		DENIED_INVESTORS.with(|denied| {
			denied.borrow_mut().insert(who);
		});
	}
}

parameter_types! {
	pub const ReserveAssetId: u32 = RESERVE_ASSET;
	pub const FinancingPalletId: PalletId = PalletId(*b"fin/proj");
	pub TrancheRelease: Percent = Percent::from_percent(30);
}

impl crate::Config for TestRuntime {
	type Authorization = MockAuthorization;
	type Balance = Balance;
	type BlockInterval = ConstU64<BLOCK_INTERVAL>;
	type FundingCurrency = FundingAssets;
	type PalletId = FinancingPalletId;
	type ProjectTokens = ProjectTokens;
	type ReserveAssetId = ReserveAssetId;
	type RuntimeEvent = RuntimeEvent;
	type StringLimit = ConstU32<64>;
	type Time = Timestamp;
	type TranchePercent = TrancheRelease;
}

// Build genesis storage according to the mock runtime. Every test account
// starts with some native currency so asset accounts can be created for it.
pub fn new_test_ext() -> sp_io::TestExternalities {
	let mut t = frame_system::GenesisConfig::<TestRuntime>::default().build_storage().unwrap();
	// Every test account starts with native currency, and so does the project
	// escrow account: the escrow owns the project token and must cover its
	// metadata deposit, but only ever receives reserve-asset balance otherwise.
	// The 8-byte `AccountId` leaves no room for the sub-id, so every project
	// truncates to the same escrow account.
	let escrow_account: AccountId = FinancingPalletId::get().into_sub_account_truncating(0u32);
	pallet_balances::GenesisConfig::<TestRuntime> {
		balances: (1..50)
			.map(|account| (account, 1_000_000u128))
			.chain(sp_std::iter::once((escrow_account, 1_000_000u128)))
			.collect(),
	}
	.assimilate_storage(&mut t)
	.unwrap();

	let mut ext = sp_io::TestExternalities::new(t);
	// In order to emit events the block number must be more than 0
	ext.execute_with(|| System::set_block_number(1));
	ext
}
