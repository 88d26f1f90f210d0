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

//! Functions for the Financing pallet.
//!
//! Each operation is split into an `evaluate_*` step that checks every
//! precondition against current state and computes the values the mutation
//! needs, and an `apply_*` step that performs the mutation with exactly those
//! values. Nothing is written before evaluation succeeds, and apply never
//! re-reads state it is in the middle of changing.

use super::*;
use crate::{amount, traits::InvestmentAuthorization};

use frame_support::{
	dispatch::DispatchResult,
	ensure, transactional,
	traits::{
		fungibles::{
			metadata::{Inspect as FungiblesMetadataInspect, Mutate as FungiblesMetadataMutate},
			Create as FungiblesCreate, Inspect as FungiblesInspect, Mutate as FungiblesMutate,
		},
		tokens::Preservation,
		Get, Time,
	},
};
use frame_system::pallet_prelude::BlockNumberFor;
use sp_runtime::{
	traits::{AccountIdConversion, One, Saturating, Zero},
	DispatchError, FixedPointNumber, FixedU128, SaturatedConversion,
};
use sp_std::prelude::*;

/// Values computed while evaluating an investment.
struct InvestEvaluation<T: Config> {
	/// What is actually taken from the investor, after clamping to the cap
	actual: BalanceOf<T>,
	/// The investment fills the cap and closes the funding window
	closes_window: bool,
}

/// Values computed while evaluating a token issuance.
struct IssueEvaluation<T: Config> {
	total_issue: BalanceOf<T>,
	/// Tokens per investment record, in creation order, summing to `total_issue`
	allocations: Vec<(u32, BalanceOf<T>)>,
}

/// Values computed while evaluating a refund.
struct RefundEvaluation<T: Config> {
	/// The not-yet-refunded records of the caller, with their amounts
	records: Vec<(u32, BalanceOf<T>)>,
	total: BalanceOf<T>,
}

/// Values computed while evaluating an issuer tranche claim.
struct TrancheEvaluation<T: Config> {
	tranche: u8,
	claim_amount: BalanceOf<T>,
}

/// Values computed while evaluating an investor token claim.
struct TokenClaimEvaluation<T: Config> {
	records: Vec<u32>,
	tokens: BalanceOf<T>,
}

// Extrinsic functions
impl<T: Config> Pallet<T> {
	/// Called by user extrinsic
	/// Registers a project asset, making it available for investment from its
	/// start block on. Validity of the metadata was already checked.
	#[transactional]
	pub fn do_create_project(issuer: AccountIdOf<T>, metadata: ProjectMetadataOf<T>) -> DispatchResult {
		// * Get variables *
		let project_id = NextProjectId::<T>::get();

		// * Update storage *
		ProjectsMetadata::<T>::insert(project_id, metadata);
		ProjectsDetails::<T>::insert(project_id, ProjectDetailsOf::<T>::default());
		NextProjectId::<T>::put(project_id.saturating_add(1));

		// * Emit events *
		Self::deposit_event(Event::ProjectCreated { project_id, issuer });

		Ok(())
	}

	/// Called by user extrinsic
	/// Validates and records a single investment of reserve currency into a
	/// project.
	///
	/// # Storage access
	/// * `ProjectsMetadata` - Checking the offering and the financing window.
	/// * `ProjectsDetails` - Checking the cap, incrementing the raised supplies,
	///   and closing the window when the cap is reached.
	/// * `Investments` / `NextInvestmentId` - Appending the new record.
	/// * `T::FundingCurrency` - Moving the invested amount into the project escrow.
	///
	/// # Success path
	/// The payment is in the reserve currency, the investor is authorized and
	/// funded, the project is a running public offering and the current block is
	/// inside the financing window. A request larger than the remaining room is
	/// clamped to it; only the clamped amount ever leaves the investor.
	///
	/// # Next step
	/// Once the window is over (or the cap closed it), `do_end_financing`
	/// decides the round.
	#[transactional]
	pub fn do_invest(
		investor: AccountIdOf<T>,
		project_id: ProjectId,
		asset: AssetId,
		investment_amount: BalanceOf<T>,
	) -> DispatchResult {
		let evaluation = Self::evaluate_invest(&investor, project_id, asset, investment_amount)?;
		Self::apply_invest(investor, project_id, evaluation)
	}

	/// Called by user extrinsic
	/// Decides a funding round once its window is over: raising at least the
	/// minimum financing amount succeeds it, anything less fails it. A round
	/// whose cap already closed the window can be decided right away.
	#[transactional]
	pub fn do_end_financing(project_id: ProjectId) -> DispatchResult {
		// * Get variables *
		let metadata = ProjectsMetadata::<T>::get(project_id).ok_or(Error::<T>::ProjectMetadataNotFound)?;
		let mut details = ProjectsDetails::<T>::get(project_id).ok_or(Error::<T>::ProjectDetailsNotFound)?;
		let now = <frame_system::Pallet<T>>::block_number();
		let window_end = Self::financing_window_end(&metadata);

		// * Validity checks *
		match details.status {
			ProjectStatus::Financing => ensure!(now > window_end, Error::<T>::TooEarlyForRound),
			ProjectStatus::FinancingLock => {},
			_ => return Err(Error::<T>::FundingClosed.into()),
		}

		// * Calculate new variables *
		if details.end_financing_block.is_none() {
			details.end_financing_block = Some(window_end);
			details.end_financing_time = Some(T::Time::now());
		}
		let funding_successful = details.financing_confidential_supply >= metadata.minimum_financing_amount;
		let status =
			if funding_successful { ProjectStatus::FinancingSuccess } else { ProjectStatus::FinancingFailure };
		details.status = status;

		// * Update storage *
		ProjectsDetails::<T>::insert(project_id, details);

		// * Emit events *
		Self::deposit_event(Event::FinancingEnded { project_id, status });

		Ok(())
	}

	/// Called by user extrinsic
	/// Converts the raised funds of a successful round into project tokens and
	/// allocates them across the investment records.
	///
	/// # Storage access
	/// * `ProjectsDetails` - Checking that the pool is untouched and nothing was
	///   issued yet; recording the issued supplies.
	/// * `Investments` - Reading every record in creation order, writing the
	///   allocated token amounts.
	/// * `T::ProjectTokens` - Creating the token asset and setting its metadata.
	///
	/// # Success path
	/// The round is decided successful and untouched by refunds or claims. The
	/// raised amount is pushed through the reserve and token prices, every
	/// record gets the floor of its proportional share, and the last record
	/// absorbs the rounding remainder so the shares sum to the total exactly.
	///
	/// # Next step
	/// Investors collect their allocations via `do_claim_tokens`; the issuer
	/// releases the raised funds via `do_claim_financing`.
	#[transactional]
	pub fn do_issue_to_investors(issuer: AccountIdOf<T>, project_id: ProjectId) -> DispatchResult {
		let evaluation = Self::evaluate_issue(&issuer, project_id)?;
		Self::apply_issue(project_id, evaluation)
	}

	/// Called by user extrinsic
	/// Returns every outstanding investment of the caller after a failed round.
	/// Records already refunded are skipped, so retrying is harmless.
	#[transactional]
	pub fn do_refund_investment(investor: AccountIdOf<T>, project_id: ProjectId) -> DispatchResult {
		let evaluation = Self::evaluate_refund(&investor, project_id)?;
		Self::apply_refund(investor, project_id, evaluation)
	}

	/// Called by user extrinsic
	/// Releases the next tranche of raised funds to the issuer: 30% at the
	/// close, 30% half way through the project cycle, and the exact remainder
	/// once the cycle is over.
	#[transactional]
	pub fn do_claim_financing(issuer: AccountIdOf<T>, project_id: ProjectId) -> DispatchResult {
		let evaluation = Self::evaluate_issuer_claim(&issuer, project_id)?;
		Self::apply_issuer_claim(issuer, project_id, evaluation)
	}

	/// Called by user extrinsic
	/// Mints the tokens allocated to the caller's investments, exactly once.
	#[transactional]
	pub fn do_claim_tokens(investor: AccountIdOf<T>, project_id: ProjectId) -> DispatchResult {
		let evaluation = Self::evaluate_token_claim(&investor, project_id)?;
		Self::apply_token_claim(investor, project_id, evaluation)
	}
}

// Evaluate/apply steps
impl<T: Config> Pallet<T> {
	fn evaluate_invest(
		investor: &AccountIdOf<T>,
		project_id: ProjectId,
		asset: AssetId,
		investment_amount: BalanceOf<T>,
	) -> Result<InvestEvaluation<T>, DispatchError> {
		// * Get variables *
		let metadata = ProjectsMetadata::<T>::get(project_id).ok_or(Error::<T>::ProjectMetadataNotFound)?;
		let details = ProjectsDetails::<T>::get(project_id).ok_or(Error::<T>::ProjectDetailsNotFound)?;
		let now = <frame_system::Pallet<T>>::block_number();

		// * Validity checks *
		ensure!(asset == T::ReserveAssetId::get(), Error::<T>::WrongCurrency);
		ensure!(!investment_amount.is_zero(), Error::<T>::InvalidAmount);
		ensure!(T::Authorization::is_authorized(investor, project_id), Error::<T>::AuthorizationDenied);
		ensure!(
			T::FundingCurrency::balance(asset, investor) >= investment_amount,
			Error::<T>::InsufficientBalance
		);
		ensure!(
			metadata.offering_type == OfferingType::Public && !metadata.market_issued,
			Error::<T>::NotPublicOffering
		);
		ensure!(details.status == ProjectStatus::Financing, Error::<T>::FundingClosed);
		ensure!(
			details.financing_current_supply < metadata.maximum_financing_amount,
			Error::<T>::FundingClosed
		);
		let window_end = Self::financing_window_end(&metadata);
		ensure!(now >= metadata.start_financing_block && now <= window_end, Error::<T>::OutsideWindow);

		// * Calculate new variables *
		let room = metadata.maximum_financing_amount.saturating_sub(details.financing_current_supply);
		let closes_window = investment_amount >= room;
		let actual = if closes_window { room } else { investment_amount };

		Ok(InvestEvaluation { actual, closes_window })
	}

	fn apply_invest(
		investor: AccountIdOf<T>,
		project_id: ProjectId,
		evaluation: InvestEvaluation<T>,
	) -> DispatchResult {
		// * Get variables *
		let InvestEvaluation { actual, closes_window } = evaluation;
		let now = <frame_system::Pallet<T>>::block_number();
		let now_time = T::Time::now();

		// * Update storage *
		let investment_id = NextInvestmentId::<T>::get(project_id);
		Investments::<T>::insert(
			project_id,
			investment_id,
			InvestmentInfo {
				investor: investor.clone(),
				amount: actual,
				created_at: now,
				created_time: now_time,
				refunded: false,
				token_claimed: false,
				investment_tokens: Zero::zero(),
			},
		);
		NextInvestmentId::<T>::insert(project_id, investment_id.saturating_add(1));

		ProjectsDetails::<T>::mutate(project_id, |maybe_details| -> DispatchResult {
			let details = maybe_details.as_mut().ok_or(Error::<T>::ImpossibleState)?;
			details.financing_current_supply.saturating_accrue(actual);
			details.financing_confidential_supply.saturating_accrue(actual);
			if closes_window {
				details.end_financing_block = Some(now);
				details.end_financing_time = Some(now_time);
				details.status = ProjectStatus::FinancingLock;
			}
			Ok(())
		})?;

		T::FundingCurrency::transfer(
			T::ReserveAssetId::get(),
			&investor,
			&Self::fund_account_id(project_id),
			actual,
			Preservation::Expendable,
		)?;

		log::debug!(
			"account {:?} invested {} reserve units into project {}",
			investor,
			amount::amount_to_string(Self::balance_to_u128(actual) as i128, Self::reserve_decimals()),
			project_id,
		);

		// * Emit events *
		Self::deposit_event(Event::Invested { project_id, investor, amount: actual });

		Ok(())
	}

	fn evaluate_issue(
		issuer: &AccountIdOf<T>,
		project_id: ProjectId,
	) -> Result<IssueEvaluation<T>, DispatchError> {
		// * Get variables *
		let metadata = ProjectsMetadata::<T>::get(project_id).ok_or(Error::<T>::ProjectMetadataNotFound)?;
		let details = ProjectsDetails::<T>::get(project_id).ok_or(Error::<T>::ProjectDetailsNotFound)?;

		// * Validity checks *
		ensure!(*issuer == metadata.issuer, Error::<T>::NotIssuer);
		match details.status {
			ProjectStatus::FinancingSuccess => {},
			ProjectStatus::FinancingFailure => return Err(Error::<T>::FinancingFailed.into()),
			_ => return Err(Error::<T>::NotClosed.into()),
		}
		ensure!(!metadata.market_issued, Error::<T>::MarketIssuedAsset);
		ensure!(
			details.financing_confidential_supply == details.financing_current_supply,
			Error::<T>::SupplyMismatch
		);
		ensure!(details.current_supply.is_zero(), Error::<T>::AlreadyIssued);
		ensure!(!details.financing_confidential_supply.is_zero(), Error::<T>::NothingToIssue);

		// * Calculate new variables *
		let confidential = Self::balance_to_u128(details.financing_confidential_supply);
		let total_issue = Self::convert_raised_to_tokens(confidential, &metadata)?;

		let mut allocations: Vec<(u32, u128)> = Vec::new();
		let mut invested_total: u128 = 0;
		let mut allocated: u128 = 0;
		for investment_id in 0..NextInvestmentId::<T>::get(project_id) {
			let record =
				Investments::<T>::get(project_id, investment_id).ok_or(Error::<T>::ImpossibleState)?;
			if record.refunded {
				continue
			}
			let invested = Self::balance_to_u128(record.amount);
			invested_total = invested_total.checked_add(invested).ok_or(Error::<T>::BadMath)?;
			let share = amount::mul_div(total_issue, invested, confidential).ok_or(Error::<T>::BadMath)?;
			allocated = allocated.checked_add(share).ok_or(Error::<T>::BadMath)?;
			allocations.push((investment_id, share));
		}

		ensure!(allocated <= total_issue, Error::<T>::ProportionOverflow);
		// The last record absorbs the rounding remainder, so the allocations
		// sum to the total issue exactly.
		if let Some((_, share)) = allocations.last_mut() {
			*share += total_issue - allocated;
		}
		ensure!(invested_total == confidential, Error::<T>::AccountingMismatch);
		let new_supply = Self::balance_to_u128(details.current_supply)
			.checked_add(total_issue)
			.ok_or(Error::<T>::BadMath)?;
		ensure!(new_supply <= Self::balance_to_u128(metadata.max_supply), Error::<T>::SupplyCapExceeded);

		let total_issue = Self::balance_from_u128(total_issue)?;
		let allocations = allocations
			.into_iter()
			.map(|(investment_id, share)| Ok((investment_id, Self::balance_from_u128(share)?)))
			.collect::<Result<Vec<_>, DispatchError>>()?;

		Ok(IssueEvaluation { total_issue, allocations })
	}

	fn apply_issue(project_id: ProjectId, evaluation: IssueEvaluation<T>) -> DispatchResult {
		// * Get variables *
		let metadata = ProjectsMetadata::<T>::get(project_id).ok_or(Error::<T>::ProjectMetadataNotFound)?;
		let escrow_account = Self::fund_account_id(project_id);
		let IssueEvaluation { total_issue, allocations } = evaluation;

		// * Update storage *
		// The project token becomes a real asset only now that there is
		// something to distribute.
		T::ProjectTokens::create(project_id, escrow_account.clone(), false, One::one())?;
		T::ProjectTokens::set(
			project_id,
			&escrow_account,
			metadata.token_information.name.to_vec(),
			metadata.token_information.symbol.to_vec(),
			metadata.token_information.decimals,
		)?;

		for (investment_id, tokens) in allocations {
			Investments::<T>::mutate(project_id, investment_id, |maybe_record| -> DispatchResult {
				let record = maybe_record.as_mut().ok_or(Error::<T>::ImpossibleState)?;
				record.investment_tokens = tokens;
				record.token_claimed = false;
				Ok(())
			})?;
		}

		ProjectsDetails::<T>::mutate(project_id, |maybe_details| -> DispatchResult {
			let details = maybe_details.as_mut().ok_or(Error::<T>::ImpossibleState)?;
			details.current_supply.saturating_accrue(total_issue);
			details.investment_confidential_supply = total_issue;
			details.investment_current_supply = total_issue;
			Ok(())
		})?;

		// * Emit events *
		Self::deposit_event(Event::TokensIssued { project_id, total_issue });

		Ok(())
	}

	fn evaluate_refund(
		investor: &AccountIdOf<T>,
		project_id: ProjectId,
	) -> Result<RefundEvaluation<T>, DispatchError> {
		// * Get variables *
		let details = ProjectsDetails::<T>::get(project_id).ok_or(Error::<T>::ProjectDetailsNotFound)?;

		// * Validity checks *
		ensure!(details.status == ProjectStatus::FinancingFailure, Error::<T>::NotFailed);

		let mut records: Vec<(u32, BalanceOf<T>)> = Vec::new();
		let mut total: u128 = 0;
		let mut has_invested = false;
		for investment_id in 0..NextInvestmentId::<T>::get(project_id) {
			let record =
				Investments::<T>::get(project_id, investment_id).ok_or(Error::<T>::ImpossibleState)?;
			if record.investor != *investor {
				continue
			}
			has_invested = true;
			if record.refunded {
				continue
			}
			total = total.checked_add(Self::balance_to_u128(record.amount)).ok_or(Error::<T>::BadMath)?;
			records.push((investment_id, record.amount));
		}
		ensure!(has_invested, Error::<T>::NothingToRefund);
		ensure!(!records.is_empty(), Error::<T>::AlreadyRefunded);

		let total = Self::balance_from_u128(total)?;
		ensure!(details.financing_current_supply >= total, Error::<T>::Underflow);

		Ok(RefundEvaluation { records, total })
	}

	fn apply_refund(
		investor: AccountIdOf<T>,
		project_id: ProjectId,
		evaluation: RefundEvaluation<T>,
	) -> DispatchResult {
		// * Get variables *
		let escrow_account = Self::fund_account_id(project_id);
		let RefundEvaluation { records, total } = evaluation;

		// * Update storage *
		for (investment_id, refund_amount) in records {
			ProjectsDetails::<T>::mutate(project_id, |maybe_details| -> DispatchResult {
				let details = maybe_details.as_mut().ok_or(Error::<T>::ImpossibleState)?;
				details.financing_current_supply.saturating_reduce(refund_amount);
				Ok(())
			})?;

			T::FundingCurrency::transfer(
				T::ReserveAssetId::get(),
				&escrow_account,
				&investor,
				refund_amount,
				Preservation::Expendable,
			)?;

			Investments::<T>::mutate(project_id, investment_id, |maybe_record| -> DispatchResult {
				let record = maybe_record.as_mut().ok_or(Error::<T>::ImpossibleState)?;
				record.refunded = true;
				Ok(())
			})?;
		}

		// * Emit events *
		Self::deposit_event(Event::InvestmentRefunded { project_id, investor, amount: total });

		Ok(())
	}

	fn evaluate_issuer_claim(
		issuer: &AccountIdOf<T>,
		project_id: ProjectId,
	) -> Result<TrancheEvaluation<T>, DispatchError> {
		// * Get variables *
		let metadata = ProjectsMetadata::<T>::get(project_id).ok_or(Error::<T>::ProjectMetadataNotFound)?;
		let details = ProjectsDetails::<T>::get(project_id).ok_or(Error::<T>::ProjectDetailsNotFound)?;
		let now = <frame_system::Pallet<T>>::block_number();

		// * Validity checks *
		ensure!(details.claim_times < 3, Error::<T>::AllClaimed);
		ensure!(!details.financing_current_supply.is_zero(), Error::<T>::NothingToClaim);
		ensure!(*issuer == metadata.issuer, Error::<T>::NotIssuer);
		ensure!(!details.current_supply.is_zero(), Error::<T>::NotYetIssued);
		let end_financing_block = details.end_financing_block.ok_or(Error::<T>::NotClosed)?;
		ensure!(now >= end_financing_block, Error::<T>::NotClosed);

		// * Calculate new variables *
		let project_cycle_blocks = metadata.project_cycle / T::BlockInterval::get().max(1);
		let unlock_offset: u64 = match details.claim_times {
			0 => 0,
			1 => project_cycle_blocks / 2,
			_ => project_cycle_blocks,
		};
		let unlock_block = end_financing_block.saturating_add(unlock_offset.saturated_into());
		ensure!(now >= unlock_block, Error::<T>::OutsideWindow);

		let confidential = Self::balance_to_u128(details.financing_confidential_supply);
		let tranche_share = T::TranchePercent::get().mul_floor(confidential);
		// The last tranche takes whatever the two 30% floors left over, so the
		// three releases sum to the confidential supply exactly.
		let claim = match details.claim_times {
			0 | 1 => tranche_share,
			_ => confidential
				.checked_sub(tranche_share.checked_mul(2).ok_or(Error::<T>::BadMath)?)
				.ok_or(Error::<T>::BadMath)?,
		};
		let claim_amount = Self::balance_from_u128(claim)?;
		ensure!(details.financing_current_supply >= claim_amount, Error::<T>::Underflow);

		Ok(TrancheEvaluation { tranche: details.claim_times, claim_amount })
	}

	fn apply_issuer_claim(
		issuer: AccountIdOf<T>,
		project_id: ProjectId,
		evaluation: TrancheEvaluation<T>,
	) -> DispatchResult {
		// * Get variables *
		let escrow_account = Self::fund_account_id(project_id);
		let TrancheEvaluation { tranche, claim_amount } = evaluation;

		// * Update storage *
		T::FundingCurrency::transfer(
			T::ReserveAssetId::get(),
			&escrow_account,
			&issuer,
			claim_amount,
			Preservation::Expendable,
		)?;

		ProjectsDetails::<T>::mutate(project_id, |maybe_details| -> DispatchResult {
			let details = maybe_details.as_mut().ok_or(Error::<T>::ImpossibleState)?;
			details.financing_current_supply.saturating_reduce(claim_amount);
			details.claim_times = details.claim_times.saturating_add(1);
			Ok(())
		})?;

		log::debug!(
			"issuer {:?} claimed tranche {} of project {}: {} reserve units",
			issuer,
			tranche,
			project_id,
			amount::amount_to_string(Self::balance_to_u128(claim_amount) as i128, Self::reserve_decimals()),
		);

		// * Emit events *
		Self::deposit_event(Event::FinancingClaimed { project_id, tranche, amount: claim_amount });

		Ok(())
	}

	fn evaluate_token_claim(
		investor: &AccountIdOf<T>,
		project_id: ProjectId,
	) -> Result<TokenClaimEvaluation<T>, DispatchError> {
		// * Get variables *
		let details = ProjectsDetails::<T>::get(project_id).ok_or(Error::<T>::ProjectDetailsNotFound)?;

		// * Validity checks *
		let mut records: Vec<u32> = Vec::new();
		let mut tokens: u128 = 0;
		for investment_id in 0..NextInvestmentId::<T>::get(project_id) {
			let record =
				Investments::<T>::get(project_id, investment_id).ok_or(Error::<T>::ImpossibleState)?;
			if record.investor != *investor {
				continue
			}
			// Claims mark every record of the caller at once, so a claimed
			// record here means the whole allocation was collected already.
			ensure!(!record.token_claimed, Error::<T>::AlreadyClaimed);
			tokens =
				tokens.checked_add(Self::balance_to_u128(record.investment_tokens)).ok_or(Error::<T>::BadMath)?;
			records.push(investment_id);
		}
		let tokens = Self::balance_from_u128(tokens)?;
		ensure!(!tokens.is_zero(), Error::<T>::NothingToClaim);
		ensure!(tokens <= details.investment_current_supply, Error::<T>::SupplyUnderflow);

		Ok(TokenClaimEvaluation { records, tokens })
	}

	fn apply_token_claim(
		investor: AccountIdOf<T>,
		project_id: ProjectId,
		evaluation: TokenClaimEvaluation<T>,
	) -> DispatchResult {
		// * Get variables *
		let TokenClaimEvaluation { records, tokens } = evaluation;

		// * Update storage *
		T::ProjectTokens::mint_into(project_id, &investor, tokens)?;

		ProjectsDetails::<T>::mutate(project_id, |maybe_details| -> DispatchResult {
			let details = maybe_details.as_mut().ok_or(Error::<T>::ImpossibleState)?;
			details.investment_current_supply.saturating_reduce(tokens);
			Ok(())
		})?;

		for investment_id in records {
			Investments::<T>::mutate(project_id, investment_id, |maybe_record| -> DispatchResult {
				let record = maybe_record.as_mut().ok_or(Error::<T>::ImpossibleState)?;
				record.token_claimed = true;
				Ok(())
			})?;
		}

		// * Emit events *
		Self::deposit_event(Event::TokensClaimed { project_id, investor, amount: tokens });

		Ok(())
	}
}

// Helper functions
impl<T: Config> Pallet<T> {
	/// The escrow account holding the raised funds of a project.
	pub fn fund_account_id(project_id: ProjectId) -> AccountIdOf<T> {
		T::PalletId::get().into_sub_account_truncating(project_id)
	}

	/// The last block of a project's funding window.
	pub fn financing_window_end(metadata: &ProjectMetadataOf<T>) -> BlockNumberFor<T> {
		let cycle_blocks = metadata.financing_cycle / T::BlockInterval::get().max(1);
		metadata.start_financing_block.saturating_add(cycle_blocks.saturated_into())
	}

	/// Push a raised reserve amount through both exchange rates: reserve to
	/// core units, then core units to project tokens. Both steps truncate.
	fn convert_raised_to_tokens(raised: u128, metadata: &ProjectMetadataOf<T>) -> Result<u128, DispatchError> {
		let core_amount = amount::mul_div(raised, metadata.reserve_price.into_inner(), FixedU128::DIV)
			.ok_or(Error::<T>::BadMath)?;
		let tokens = amount::mul_div(core_amount, metadata.token_price.into_inner(), FixedU128::DIV)
			.ok_or(Error::<T>::BadMath)?;
		Ok(tokens)
	}

	fn reserve_decimals() -> u8 {
		<T::FundingCurrency as FungiblesMetadataInspect<AccountIdOf<T>>>::decimals(T::ReserveAssetId::get())
	}

	fn balance_to_u128(value: BalanceOf<T>) -> u128 {
		value.into()
	}

	fn balance_from_u128(value: u128) -> Result<BalanceOf<T>, DispatchError> {
		value.try_into().map_err(|_| Error::<T>::BadMath.into())
	}
}
