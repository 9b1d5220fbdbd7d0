// src/supervisor/account.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{NodeError, Result};

static ACCOUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(.+?)\}").expect("account pattern is a valid regex"));

/// Extract the first account address from `account list` output.
///
/// Lines look like `Account #0: {3cd4...} keystore:///.../UTC--...`; the
/// address between the braces is returned without a `0x` prefix.
pub fn parse_account_list(output: &str) -> Result<String> {
    ACCOUNT_PATTERN
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|account| !account.is_empty())
        .ok_or_else(|| NodeError::AccountParse {
            output: output.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_account() {
        let out = "Account #0: {3cd4e0c1b7a2} keystore:///tmp/k/UTC--a\n\
                   Account #1: {ffff} keystore:///tmp/k/UTC--b";
        assert_eq!(parse_account_list(out).unwrap(), "3cd4e0c1b7a2");
    }

    #[test]
    fn empty_listing_is_an_error() {
        assert!(matches!(
            parse_account_list(""),
            Err(NodeError::AccountParse { .. })
        ));
        assert!(matches!(
            parse_account_list("WARN no keys {}"),
            Err(NodeError::AccountParse { .. })
        ));
    }
}
