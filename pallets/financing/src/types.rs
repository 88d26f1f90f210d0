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

//! Types for the Financing pallet.

use frame_support::{pallet_prelude::*, traits::tokens::Balance as BalanceT};
use serde::{Deserialize, Serialize};
use sp_runtime::{traits::Zero, FixedU128};

/// Metadata of a project asset open for financing. Set once at registration and
/// never modified afterwards; every evaluator reads it.
#[derive(Default, Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, MaxEncodedLen, TypeInfo)]
pub struct ProjectMetadata<AccountId, Balance: BalanceT, BlockNumber, BoundedString> {
	/// The account that registered the project and collects the raised funds
	pub issuer: AccountId,
	/// Name, symbol and decimals of the project token
	pub token_information: CurrencyMetadata<BoundedString>,
	/// Whether anyone can invest, or only accounts chosen by the issuer off-chain
	pub offering_type: OfferingType,
	/// Market-issued assets track an external price feed and cannot be financed
	pub market_issued: bool,
	/// Raising less than this by the end of the window fails the round
	#[codec(compact)]
	pub minimum_financing_amount: Balance,
	/// Hard cap of reserve currency accepted; reaching it closes the window early
	#[codec(compact)]
	pub maximum_financing_amount: Balance,
	/// First block at which investments are accepted
	pub start_financing_block: BlockNumber,
	/// Length of the funding window, in seconds. Converted to a block count
	/// through the chain's block interval.
	pub financing_cycle: u64,
	/// Vesting horizon for the issuer's claims over the raised funds, in seconds
	pub project_cycle: u64,
	/// Price of one reserve-currency unit expressed in core units
	pub reserve_price: FixedU128,
	/// Project tokens issued per core unit
	pub token_price: FixedU128,
	/// Cap on the project token supply
	#[codec(compact)]
	pub max_supply: Balance,
}

/// The accounting state of a project asset. One per project, mutated by every
/// evaluator.
///
/// `financing_confidential_supply` is the high-water snapshot of the gross
/// amount raised: it is frozen when the round closes and is the immutable basis
/// for all proportional math, while `financing_current_supply` is the working
/// pool that depletes as funds are refunded or claimed. The working pool never
/// exceeds the snapshot.
#[derive(Default, Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, MaxEncodedLen, TypeInfo)]
pub struct ProjectDetails<Balance: BalanceT, BlockNumber, Moment> {
	/// The current status of the project
	pub status: ProjectStatus,
	/// Project tokens minted so far
	#[codec(compact)]
	pub current_supply: Balance,
	/// Refundable/claimable pool of raised reserve currency
	#[codec(compact)]
	pub financing_current_supply: Balance,
	/// Gross raised amount, frozen at round close
	#[codec(compact)]
	pub financing_confidential_supply: Balance,
	/// Tokens allocated to investors and not yet collected
	#[codec(compact)]
	pub investment_current_supply: Balance,
	/// Total tokens allocated to investors at issuance
	#[codec(compact)]
	pub investment_confidential_supply: Balance,
	/// How many of the three issuer tranches have been released
	pub claim_times: u8,
	/// When (expressed in block numbers) the funding window closed
	pub end_financing_block: Option<BlockNumber>,
	/// Chain time at which the funding window closed
	pub end_financing_time: Option<Moment>,
}

/// A single investment. Created once per `invest` call; an account may hold
/// several records for the same project. Records are never deleted and their
/// flags only ever go from `false` to `true`.
#[derive(Default, Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, MaxEncodedLen, TypeInfo)]
pub struct InvestmentInfo<AccountId, Balance: BalanceT, BlockNumber, Moment> {
	pub investor: AccountId,
	/// Reserve currency taken from the investor, after clamping to the cap
	#[codec(compact)]
	pub amount: Balance,
	pub created_at: BlockNumber,
	pub created_time: Moment,
	/// The investment was returned after a failed round
	pub refunded: bool,
	/// The allocated tokens were collected by the investor
	pub token_claimed: bool,
	/// Tokens allocated at issuance; zero until then
	#[codec(compact)]
	pub investment_tokens: Balance,
}

#[derive(Default, Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, MaxEncodedLen, TypeInfo)]
pub struct CurrencyMetadata<BoundedString> {
	/// The user friendly name of this asset. Limited in length by `StringLimit`.
	pub name: BoundedString,
	/// The ticker symbol for this asset. Limited in length by `StringLimit`.
	pub symbol: BoundedString,
	/// The number of decimals this asset uses to represent one unit.
	pub decimals: u8,
}

#[derive(
	Default, Clone, Copy, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen, Serialize, Deserialize,
)]
pub enum OfferingType {
	Private,
	#[default]
	Public,
}

#[derive(
	Default, Clone, Copy, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen, Serialize, Deserialize,
)]
pub enum ProjectStatus {
	/// The funding window is open and investments are accepted
	#[default]
	Financing,
	/// The cap was reached before the window expired; awaiting the round decision
	FinancingLock,
	FinancingSuccess,
	FinancingFailure,
}

#[derive(Debug)]
pub enum ValidityError {
	PriceTooLow,
	FinancingAmountError,
	CycleError,
	MaxSupplyError,
}

impl<AccountId, Balance: BalanceT, BlockNumber, BoundedString>
	ProjectMetadata<AccountId, Balance, BlockNumber, BoundedString>
{
	pub fn validity_check(&self) -> Result<(), ValidityError> {
		if self.reserve_price.is_zero() || self.token_price.is_zero() {
			return Err(ValidityError::PriceTooLow)
		}
		if self.maximum_financing_amount.is_zero() ||
			self.minimum_financing_amount > self.maximum_financing_amount
		{
			return Err(ValidityError::FinancingAmountError)
		}
		if self.financing_cycle == 0 || self.project_cycle == 0 {
			return Err(ValidityError::CycleError)
		}
		if self.max_supply.is_zero() {
			return Err(ValidityError::MaxSupplyError)
		}
		Ok(())
	}
}
