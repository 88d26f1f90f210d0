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

//! # Financing Pallet
//!
//! On-chain crowdfunding of project assets. Accounts invest a designated
//! reserve currency into a project during its funding window; on success the
//! project tokens are distributed to investors in proportion to their
//! investments and the issuer withdraws the raised funds in three time-gated
//! tranches; on failure every investor is refunded.
//!
//! ## Lifecycle
//!
//! 1. The issuer registers the project asset with [`Pallet::create_project`].
//! 2. Investors call [`Pallet::invest`] while the window is open. An
//!    investment that would push the total over the maximum financing amount
//!    is clamped to the remaining room and closes the window early.
//! 3. Once the window is over (or the cap closed it), anyone calls
//!    [`Pallet::end_financing`]: reaching the minimum financing amount decides
//!    the round as successful, anything less fails it.
//! 4. On success the issuer calls [`Pallet::issue_to_investors`], which
//!    converts the raised amount into project tokens through the configured
//!    exchange rates and allocates them per investment record; investors
//!    collect with [`Pallet::claim_tokens`] and the issuer releases the raised
//!    funds with [`Pallet::claim_financing`].
//! 5. On failure each investor recovers their investments with
//!    [`Pallet::refund_investment`].
//!
//! Raised funds sit in a per-project escrow account derived from
//! [`Config::PalletId`] until they are refunded or claimed.
//!
//! Every extrinsic first evaluates all of its preconditions against current
//! state without mutating anything, and only then applies the values computed
//! during evaluation. A rejected operation leaves no trace on the ledger.

#![cfg_attr(not(feature = "std"), no_std)]
// Needed due to empty sections raising the warning
#![allow(unreachable_patterns)]
extern crate alloc;

pub use pallet::*;

pub mod amount;
mod functions;
pub mod traits;
mod types;
pub use types::*;

#[cfg(test)]
mod mock;

#[frame_support::pallet]
pub mod pallet {
	use super::*;
	use crate::traits::InvestmentAuthorization;
	use frame_support::{
		pallet_prelude::*,
		traits::{
			fungibles,
			tokens::Balance,
			Time,
		},
		PalletId,
	};
	use frame_system::pallet_prelude::*;
	use sp_runtime::Percent;

	pub type ProjectId = u32;
	pub type AssetId = u32;
	pub type AccountIdOf<T> = <T as frame_system::Config>::AccountId;
	pub type BalanceOf<T> = <T as Config>::Balance;
	pub type MomentOf<T> = <<T as Config>::Time as Time>::Moment;
	pub type BoundedStringOf<T> = BoundedVec<u8, <T as Config>::StringLimit>;
	pub type ProjectMetadataOf<T> =
		ProjectMetadata<AccountIdOf<T>, BalanceOf<T>, BlockNumberFor<T>, BoundedStringOf<T>>;
	pub type ProjectDetailsOf<T> = ProjectDetails<BalanceOf<T>, BlockNumberFor<T>, MomentOf<T>>;
	pub type InvestmentInfoOf<T> = InvestmentInfo<AccountIdOf<T>, BalanceOf<T>, BlockNumberFor<T>, MomentOf<T>>;

	#[pallet::config]
	pub trait Config: frame_system::Config {
		/// The overarching event type.
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		/// The balance type shared by the reserve currency and project tokens.
		/// The 128-bit conversions feed the widened proportional arithmetic.
		type Balance: Balance + From<u64> + Into<u128> + TryFrom<u128> + MaybeSerializeDeserialize;

		/// The pallet giving access to the reserve currency.
		type FundingCurrency: fungibles::Inspect<AccountIdOf<Self>, AssetId = AssetId, Balance = Self::Balance>
			+ fungibles::Mutate<AccountIdOf<Self>>
			+ fungibles::metadata::Inspect<AccountIdOf<Self>>;

		/// The pallet minting project tokens. Asset ids are project ids.
		type ProjectTokens: fungibles::Create<AccountIdOf<Self>>
			+ fungibles::Inspect<AccountIdOf<Self>, AssetId = ProjectId, Balance = Self::Balance>
			+ fungibles::Mutate<AccountIdOf<Self>>
			+ fungibles::metadata::Mutate<AccountIdOf<Self>>;

		/// Compliance check every investor/project pair must pass before an
		/// investment is accepted.
		type Authorization: InvestmentAuthorization<AccountIdOf<Self>>;

		/// Chain clock used to stamp investments and the end of financing.
		type Time: Time;

		/// The asset id of the reserve currency projects are financed with.
		#[pallet::constant]
		type ReserveAssetId: Get<AssetId>;

		/// Seconds between blocks. Converts the cycle lengths of a project
		/// into block counts.
		#[pallet::constant]
		type BlockInterval: Get<u64>;

		/// Share of the raised funds released in each of the first two issuer
		/// tranches. The third tranche takes the exact remainder, so the three
		/// always sum to the amount raised.
		#[pallet::constant]
		type TranchePercent: Get<Percent>;

		/// Used to derive the per-project escrow accounts holding raised funds.
		#[pallet::constant]
		type PalletId: Get<PalletId>;

		/// The maximum length of token names and symbols stored on-chain.
		#[pallet::constant]
		type StringLimit: Get<u32>;
	}

	#[pallet::pallet]
	pub struct Pallet<T>(_);

	#[pallet::storage]
	/// The id assigned to the next registered project.
	pub type NextProjectId<T: Config> = StorageValue<_, ProjectId, ValueQuery>;

	#[pallet::storage]
	/// Immutable configuration of a project asset.
	pub type ProjectsMetadata<T: Config> = StorageMap<_, Blake2_128Concat, ProjectId, ProjectMetadataOf<T>>;

	#[pallet::storage]
	/// Accounting state of a project asset.
	pub type ProjectsDetails<T: Config> = StorageMap<_, Blake2_128Concat, ProjectId, ProjectDetailsOf<T>>;

	#[pallet::storage]
	/// Investment records, keyed by project and a per-project sequential id.
	/// Iterating the ids from zero visits records in creation order, which the
	/// remainder rule of token issuance relies on.
	pub type Investments<T: Config> =
		StorageDoubleMap<_, Blake2_128Concat, ProjectId, Blake2_128Concat, u32, InvestmentInfoOf<T>>;

	#[pallet::storage]
	/// The id assigned to the next investment of a project.
	pub type NextInvestmentId<T: Config> = StorageMap<_, Blake2_128Concat, ProjectId, u32, ValueQuery>;

	#[pallet::event]
	#[pallet::generate_deposit(pub(super) fn deposit_event)]
	pub enum Event<T: Config> {
		/// A project asset was registered and can be financed.
		ProjectCreated { project_id: ProjectId, issuer: AccountIdOf<T> },
		/// An investment was recorded. The amount is what was actually taken
		/// after clamping to the financing cap.
		Invested { project_id: ProjectId, investor: AccountIdOf<T>, amount: BalanceOf<T> },
		/// The funding round was decided.
		FinancingEnded { project_id: ProjectId, status: ProjectStatus },
		/// Project tokens were allocated to the investors of a project.
		TokensIssued { project_id: ProjectId, total_issue: BalanceOf<T> },
		/// All outstanding investments of an account were returned.
		InvestmentRefunded { project_id: ProjectId, investor: AccountIdOf<T>, amount: BalanceOf<T> },
		/// The issuer released one tranche of the raised funds.
		FinancingClaimed { project_id: ProjectId, tranche: u8, amount: BalanceOf<T> },
		/// An investor collected their allocated project tokens.
		TokensClaimed { project_id: ProjectId, investor: AccountIdOf<T>, amount: BalanceOf<T> },
	}

	#[pallet::error]
	pub enum Error<T> {
		/// No project is registered under this id.
		ProjectMetadataNotFound,
		ProjectDetailsNotFound,
		/// The exchange rates of a project must be positive.
		PriceTooLow,
		/// Zero maximum, or a minimum above the maximum.
		FinancingAmountError,
		/// Financing and project cycles must be positive.
		CycleError,
		MaxSupplyError,
		/// Investments are only accepted in the reserve currency.
		WrongCurrency,
		/// The invested amount must be positive.
		InvalidAmount,
		/// The investor/project pair failed the compliance check.
		AuthorizationDenied,
		/// The investor does not hold the invested amount.
		InsufficientBalance,
		/// The project is not a public offering.
		NotPublicOffering,
		/// Market-issued assets cannot be financed.
		MarketIssuedAsset,
		/// The financing cap was already reached, or the round is over.
		FundingClosed,
		/// The current block is outside the window this operation is gated to.
		OutsideWindow,
		/// The funding window is still running, or the round is undecided.
		NotClosed,
		/// Tried to end the round before its window was over.
		TooEarlyForRound,
		/// The round failed; tokens cannot be issued.
		FinancingFailed,
		/// Refunds or claims already touched the raised pool.
		SupplyMismatch,
		/// Tokens were already issued for this project.
		AlreadyIssued,
		/// The round closed without anything raised.
		NothingToIssue,
		/// The floored per-investor allocations exceed the total issue.
		ProportionOverflow,
		/// The investment records do not add up to the raised amount.
		AccountingMismatch,
		/// Issuing would push the token supply over its cap.
		SupplyCapExceeded,
		/// Refunds require a failed round.
		NotFailed,
		/// The account never invested into this project.
		NothingToRefund,
		/// Every investment of this account was already refunded.
		AlreadyRefunded,
		/// The raised pool cannot cover this refund or claim.
		Underflow,
		/// All three tranches were already released.
		AllClaimed,
		/// Nothing is left to claim.
		NothingToClaim,
		/// Only the project issuer may call this.
		NotIssuer,
		/// Tokens must be issued to investors before funds can be claimed.
		NotYetIssued,
		/// The allocated tokens were already collected.
		AlreadyClaimed,
		/// The claimed tokens exceed the outstanding allocation pool.
		SupplyUnderflow,
		BadMath,
		ImpossibleState,
	}

	#[pallet::hooks]
	impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Register a project asset and open it for financing from
		/// `start_financing_block` on. The dispatch origin becomes the issuer.
		#[pallet::call_index(0)]
		#[pallet::weight(Weight::from_parts(10_000, 0).saturating_add(T::DbWeight::get().reads_writes(1, 3)))]
		pub fn create_project(origin: OriginFor<T>, metadata: ProjectMetadataOf<T>) -> DispatchResult {
			let issuer = ensure_signed(origin)?;
			let mut metadata = metadata;
			metadata.issuer = issuer.clone();

			match metadata.validity_check() {
				Err(error) => match error {
					ValidityError::PriceTooLow => Err(Error::<T>::PriceTooLow.into()),
					ValidityError::FinancingAmountError => Err(Error::<T>::FinancingAmountError.into()),
					ValidityError::CycleError => Err(Error::<T>::CycleError.into()),
					ValidityError::MaxSupplyError => Err(Error::<T>::MaxSupplyError.into()),
				},
				Ok(()) => Self::do_create_project(issuer, metadata),
			}
		}

		/// Invest `amount` of the reserve currency into a project. A request
		/// above the remaining room is clamped: no funds beyond the cap are
		/// ever taken, and reaching the cap closes the funding window.
		#[pallet::call_index(1)]
		#[pallet::weight(Weight::from_parts(10_000, 0).saturating_add(T::DbWeight::get().reads_writes(4, 4)))]
		pub fn invest(
			origin: OriginFor<T>,
			project_id: ProjectId,
			asset: AssetId,
			amount: BalanceOf<T>,
		) -> DispatchResult {
			let investor = ensure_signed(origin)?;
			Self::do_invest(investor, project_id, asset, amount)
		}

		/// Decide a funding round once its window is over: reaching the
		/// minimum financing amount succeeds it, anything less fails it.
		/// Callable by anyone.
		#[pallet::call_index(2)]
		#[pallet::weight(Weight::from_parts(10_000, 0).saturating_add(T::DbWeight::get().reads_writes(2, 1)))]
		pub fn end_financing(origin: OriginFor<T>, project_id: ProjectId) -> DispatchResult {
			ensure_signed(origin)?;
			Self::do_end_financing(project_id)
		}

		/// Convert the raised funds of a successful round into project tokens
		/// and allocate them to every investment, proportionally and without
		/// remainder. Only the issuer may call this, exactly once per project.
		#[pallet::call_index(3)]
		#[pallet::weight(Weight::from_parts(10_000, 0).saturating_add(T::DbWeight::get().reads_writes(3, 3)))]
		pub fn issue_to_investors(origin: OriginFor<T>, project_id: ProjectId) -> DispatchResult {
			let issuer = ensure_signed(origin)?;
			Self::do_issue_to_investors(issuer, project_id)
		}

		/// Return every not-yet-refunded investment of the caller after a
		/// failed round. Safe to retry: already refunded records are skipped.
		#[pallet::call_index(4)]
		#[pallet::weight(Weight::from_parts(10_000, 0).saturating_add(T::DbWeight::get().reads_writes(3, 3)))]
		pub fn refund_investment(origin: OriginFor<T>, project_id: ProjectId) -> DispatchResult {
			let investor = ensure_signed(origin)?;
			Self::do_refund_investment(investor, project_id)
		}

		/// Release the next tranche of the raised funds to the issuer. The
		/// first two tranches unlock 30% each at the close and half way
		/// through the project cycle; the last one releases the exact
		/// remainder once the cycle is over.
		#[pallet::call_index(5)]
		#[pallet::weight(Weight::from_parts(10_000, 0).saturating_add(T::DbWeight::get().reads_writes(3, 2)))]
		pub fn claim_financing(origin: OriginFor<T>, project_id: ProjectId) -> DispatchResult {
			let issuer = ensure_signed(origin)?;
			Self::do_claim_financing(issuer, project_id)
		}

		/// Collect the project tokens allocated to the caller's investments.
		#[pallet::call_index(6)]
		#[pallet::weight(Weight::from_parts(10_000, 0).saturating_add(T::DbWeight::get().reads_writes(3, 3)))]
		pub fn claim_tokens(origin: OriginFor<T>, project_id: ProjectId) -> DispatchResult {
			let investor = ensure_signed(origin)?;
			Self::do_claim_tokens(investor, project_id)
		}
	}
}
