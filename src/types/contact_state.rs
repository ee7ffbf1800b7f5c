// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contact sensor state.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// State reported on a contact sensor's `sensor/state` topic.
///
/// Parsing is an exact, case-sensitive match on the firmware's payload text.
///
/// # Examples
///
/// ```
/// use shellor_lib::types::ContactState;
///
/// assert_eq!("open".parse::<ContactState>().unwrap(), ContactState::Open);
/// assert_eq!("close".parse::<ContactState>().unwrap(), ContactState::Close);
/// assert!("OPEN".parse::<ContactState>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactState {
    /// The door or window is open.
    Open,
    /// The door or window is closed.
    Close,
}

impl ContactState {
    /// Returns the payload text used by the firmware.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for ContactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Close),
            _ => Err(ValueError::InvalidContactState(s.to_string())),
        }
    }
}
