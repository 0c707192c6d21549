//! Display helpers for addresses and provider error messages.

use cosign_types::Address;

/// Shorten an address to `0x1234...abcd` for log lines and summaries.
pub fn truncate_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Strip the parenthesised detail providers append to error messages
/// (`"execution reverted (action=..., data=...)"` becomes `"execution reverted"`).
pub fn clean_provider_error(message: &str) -> &str {
    match message.find('(') {
        Some(idx) => message[..idx].trim(),
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_checksummed_address() {
        let addr = Address::repeat_byte(0xab);
        let short = truncate_address(&addr);
        assert!(short.starts_with("0x"));
        assert_eq!(short.len(), 6 + 3 + 4);
        assert!(short.to_lowercase().ends_with("abab"));
    }

    #[test]
    fn strips_parenthesised_detail() {
        assert_eq!(
            clean_provider_error("execution reverted (reason=\"not owner\")"),
            "execution reverted"
        );
        assert_eq!(clean_provider_error("nonce too low"), "nonce too low");
    }
}
