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

//! Scaled-amount rendering and parsing, plus the widened multiply-then-divide
//! used by every proportional computation in this pallet.
//!
//! Amounts are stored on chain as integers scaled by `10^precision`. The codec
//! here converts between that representation and decimal strings, and the two
//! directions are exact inverses of each other for every representable amount.

use alloc::string::{String, ToString};
use sp_arithmetic::{helpers_128bit::multiply_by_rational_with_rounding, Rounding};

/// Ceiling on any scaled amount the chain can represent.
pub const MAX_ASSET_SUPPLY: u128 = 1_000_000_000_000_000;

/// Largest precision a scaled amount can carry.
pub const MAX_AMOUNT_PRECISION: u8 = 18;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AmountError {
	/// A character other than digits, a leading `-` and a single `.` was found
	InvalidFormat,
	/// The fractional part carries more digits than the precision allows
	PrecisionOverflow,
	/// The parsed amount exceeds [`MAX_ASSET_SUPPLY`], or the precision is not
	/// representable
	OutOfRange,
}

/// Render a scaled integer as a decimal string.
///
/// The fractional part is zero-padded to `precision` digits and omitted
/// entirely when it is zero, so `150000` at precision 4 renders as `"15"` and
/// `150` as `"0.0150"`.
pub fn amount_to_string(amount: i128, precision: u8) -> String {
	debug_assert!(precision <= MAX_AMOUNT_PRECISION);
	let scale = 10_i128.pow(u32::from(precision));
	let magnitude = amount.unsigned_abs();
	let scale = scale.unsigned_abs();

	let mut result = String::new();
	if amount < 0 {
		result.push('-');
	}
	result.push_str(&(magnitude / scale).to_string());
	let decimals = magnitude % scale;
	if decimals != 0 {
		result.push('.');
		let mut digits = decimals.to_string();
		while digits.len() < precision as usize {
			digits.insert(0, '0');
		}
		result.push_str(&digits);
	}
	result
}

/// Parse a decimal string back into a scaled integer. Exact inverse of
/// [`amount_to_string`].
pub fn amount_from_string(amount_string: &str, precision: u8) -> Result<i128, AmountError> {
	if precision > MAX_AMOUNT_PRECISION {
		return Err(AmountError::OutOfRange)
	}

	let mut negative_found = false;
	let mut decimal_found = false;
	for (position, character) in amount_string.chars().enumerate() {
		if character.is_ascii_digit() {
			continue
		}
		if character == '-' && position == 0 && !negative_found {
			negative_found = true;
			continue
		}
		if character == '.' && !decimal_found {
			decimal_found = true;
			continue
		}
		return Err(AmountError::InvalidFormat)
	}

	let unsigned = &amount_string[usize::from(negative_found)..];
	let (integer_part, fraction_part) = match unsigned.split_once('.') {
		Some((lhs, rhs)) => (lhs, rhs),
		None => (unsigned, ""),
	};
	if integer_part.is_empty() && fraction_part.is_empty() {
		return Err(AmountError::InvalidFormat)
	}
	if fraction_part.len() > precision as usize {
		return Err(AmountError::PrecisionOverflow)
	}

	let scale = 10_u128.pow(u32::from(precision));
	let mut satoshis: u128 = 0;
	for digit in integer_part.bytes() {
		satoshis = satoshis
			.checked_mul(10)
			.and_then(|value| value.checked_add(u128::from(digit - b'0')))
			.ok_or(AmountError::OutOfRange)?;
	}
	satoshis = satoshis.checked_mul(scale).ok_or(AmountError::OutOfRange)?;

	let mut fraction: u128 = 0;
	for digit in fraction_part.bytes() {
		fraction = fraction * 10 + u128::from(digit - b'0');
	}
	for _ in 0..precision as usize - fraction_part.len() {
		fraction *= 10;
	}
	satoshis = satoshis.checked_add(fraction).ok_or(AmountError::OutOfRange)?;

	if satoshis > MAX_ASSET_SUPPLY {
		return Err(AmountError::OutOfRange)
	}

	let satoshis = satoshis as i128;
	Ok(if negative_found { -satoshis } else { satoshis })
}

/// `value * numerator / denominator` with a 256-bit intermediate, truncated
/// toward zero. Returns `None` when the denominator is zero or the final
/// result does not fit in 128 bits; the multiply step itself cannot overflow.
pub fn mul_div(value: u128, numerator: u128, denominator: u128) -> Option<u128> {
	multiply_by_rational_with_rounding(value, numerator, denominator, Rounding::Down)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_whole_and_fractional_amounts() {
		assert_eq!(amount_to_string(150_000, 4), "15");
		assert_eq!(amount_to_string(150, 4), "0.0150");
		assert_eq!(amount_to_string(123_456, 4), "12.3456");
		assert_eq!(amount_to_string(0, 4), "0");
		assert_eq!(amount_to_string(7, 0), "7");
		assert_eq!(amount_to_string(-150, 4), "-0.0150");
	}

	#[test]
	fn parses_rendered_amounts_back() {
		assert_eq!(amount_from_string("15", 4), Ok(150_000));
		assert_eq!(amount_from_string("0.0150", 4), Ok(150));
		assert_eq!(amount_from_string("12.3456", 4), Ok(123_456));
		assert_eq!(amount_from_string("-0.0150", 4), Ok(-150));
		assert_eq!(amount_from_string("12.34", 4), Ok(123_400));
	}

	#[test]
	fn round_trips_exactly() {
		for precision in [0u8, 1, 4, 8, 18] {
			for amount in
				[0i128, 1, -1, 7, 99, 10_000, -10_203, 123_456_789, 1_000_000_000_000_000, -1_000_000_000_000_000]
			{
				let rendered = amount_to_string(amount, precision);
				assert_eq!(
					amount_from_string(&rendered, precision),
					Ok(amount),
					"amount {} precision {} rendered {}",
					amount,
					precision,
					rendered
				);
			}
		}
	}

	#[test]
	fn rejects_malformed_strings() {
		assert_eq!(amount_from_string("12a", 4), Err(AmountError::InvalidFormat));
		assert_eq!(amount_from_string("1.2.3", 4), Err(AmountError::InvalidFormat));
		assert_eq!(amount_from_string("1-2", 4), Err(AmountError::InvalidFormat));
		assert_eq!(amount_from_string("--12", 4), Err(AmountError::InvalidFormat));
		assert_eq!(amount_from_string("", 4), Err(AmountError::InvalidFormat));
		assert_eq!(amount_from_string(".", 4), Err(AmountError::InvalidFormat));
		assert_eq!(amount_from_string(" 12", 4), Err(AmountError::InvalidFormat));
	}

	#[test]
	fn rejects_excess_fraction_digits() {
		assert_eq!(amount_from_string("1.00001", 4), Err(AmountError::PrecisionOverflow));
		assert_eq!(amount_from_string("1.1", 0), Err(AmountError::PrecisionOverflow));
		assert_eq!(amount_from_string("1.0001", 4), Ok(10_001));
	}

	#[test]
	fn rejects_amounts_beyond_max_supply() {
		assert_eq!(amount_from_string("1000000000000000", 0), Ok(MAX_ASSET_SUPPLY as i128));
		assert_eq!(amount_from_string("1000000000000001", 0), Err(AmountError::OutOfRange));
		assert_eq!(amount_from_string("100000000000000000000000000000000000000000", 0), Err(AmountError::OutOfRange));
		assert_eq!(amount_from_string("1", 19), Err(AmountError::OutOfRange));
	}

	#[test]
	fn mul_div_survives_wide_intermediates() {
		// value * numerator overflows 128 bits, the result does not
		let value = 1u128 << 100;
		assert_eq!(mul_div(value, 1 << 30, 1 << 30), Some(value));
		assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX), Some(u128::MAX));
	}

	#[test]
	fn mul_div_truncates_toward_zero() {
		assert_eq!(mul_div(10, 1, 3), Some(3));
		assert_eq!(mul_div(1000, 600, 1000), Some(600));
		assert_eq!(mul_div(7, 0, 3), Some(0));
		assert_eq!(mul_div(1, 1, 0), None);
	}
}
