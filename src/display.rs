//! Formatting helpers for addresses, amounts and explorer links

use crate::chain::Cluster;

/// Kept back from the balance by the max-amount shortcut to cover fees
const MAX_AMOUNT_FEE_RESERVE: f64 = 0.01;

/// `abcd...wxyz`; empty input stays empty
pub fn short_address(address: &str) -> String {
    abbreviate(address, 4, "...", 4)
}

/// `abcd..wxyz`, used for signatures in the history list
pub fn short_signature(signature: &str) -> String {
    abbreviate(signature, 4, "..", 4)
}

/// `abcdef...wxyz`, used for the signature of a completed transfer
pub fn short_hash(signature: &str) -> String {
    abbreviate(signature, 6, "...", 4)
}

fn abbreviate(value: &str, head: usize, sep: &str, tail: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= head + tail {
        return value.to_string();
    }
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{}{}{}", start, sep, end)
}

/// Keep digits and the first decimal point
pub fn sanitize_amount(input: &str) -> String {
    let mut seen_point = false;
    input
        .chars()
        .filter(|c| match *c {
            '0'..='9' => true,
            '.' if !seen_point => {
                seen_point = true;
                true
            }
            _ => false,
        })
        .collect()
}

/// Balance with four decimals
pub fn format_balance(balance: f64) -> String {
    format!("{:.4}", balance)
}

/// Largest amount offered by the max shortcut
pub fn max_sendable(balance: f64) -> String {
    format_balance((balance - MAX_AMOUNT_FEE_RESERVE).max(0.0))
}

pub fn explorer_url(signature: &str, cluster: Cluster) -> String {
    format!(
        "https://explorer.solana.com/tx/{}?cluster={}",
        signature,
        cluster.explorer_param()
    )
}
