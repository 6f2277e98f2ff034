use rust_decimal::prelude::*;

use crate::constants::native::LAMPORTS_PER_SOL;

/// Convert Lamports (u64) to SOL without going through floating point
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    let lamports_dec = Decimal::from(lamports);
    let divisor = Decimal::from(LAMPORTS_PER_SOL);

    lamports_dec / divisor
}

/// Shorten an address for display: first 3 and last 3 characters joined by an ellipsis
///
/// Addresses of 6 characters or fewer are returned unchanged.
pub fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 6 {
        return address.to_string();
    }

    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", head, tail)
}
