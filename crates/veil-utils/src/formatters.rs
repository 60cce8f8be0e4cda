// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

/// Hex formatter for byte payloads that keeps log lines readable by eliding
/// the middle of anything longer than 100 hex chars.
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    let hex: String = data.iter().map(|b| format!("{:02x}", b)).collect();

    if hex.len() <= 100 {
        write!(f, "0x{}", hex)
    } else {
        write!(
            f,
            "<bytes({}):0x{}..{}>",
            hex.len(),
            &hex[..25],
            &hex[hex.len() - 25..]
        )
    }
}
