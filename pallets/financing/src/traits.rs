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

use crate::ProjectId;

/// Compliance check consumed before an account may invest into a project
/// asset. Implemented by the runtime, typically backed by a whitelist or a
/// credential registry.
pub trait InvestmentAuthorization<AccountId> {
	fn is_authorized(who: &AccountId, project_id: ProjectId) -> bool;
}

/// Allows everyone. Useful for chains without a compliance layer, and for
/// testing.
impl<AccountId> InvestmentAuthorization<AccountId> for () {
	fn is_authorized(_who: &AccountId, _project_id: ProjectId) -> bool {
		true
	}
}
