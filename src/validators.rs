//! Input validation for wizard answers
//!
//! Every line the user types passes through one of these functions before it
//! is recorded. The same address check is applied again by the assembler, so
//! answers reloaded from disk are held to the same rules.

use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// Words accepted as "yes"
pub const YES_WORDS: &[&str] = &["yes", "y"];
/// Words accepted as "no"
pub const NO_WORDS: &[&str] = &["no", "n"];
/// Words that abort the wizard
pub const CANCEL_WORDS: &[&str] = &["cancel", "c"];

/// Result of parsing a yes/no response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
    Cancel,
}

/// Returns true if `input` is one of the cancel words (case-insensitive).
pub fn is_cancel(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    CANCEL_WORDS.contains(&lower.as_str())
}

/// Parses a yes/no/cancel response.
///
/// # Errors
///
/// Returns `Err` if the response is none of `yes`, `y`, `no`, `n`, `cancel`, `c`.
pub fn parse_yes_no(input: &str) -> Result<YesNo, String> {
    let lower = input.trim().to_lowercase();
    if YES_WORDS.contains(&lower.as_str()) {
        Ok(YesNo::Yes)
    } else if NO_WORDS.contains(&lower.as_str()) {
        Ok(YesNo::No)
    } else if CANCEL_WORDS.contains(&lower.as_str()) {
        Ok(YesNo::Cancel)
    } else {
        Err(r#"The answer must be of form, "yes", "y", "no", "n", "cancel", "c""#.to_string())
    }
}

/// Parses a space-separated multi-choice selection.
///
/// An empty line is a valid, empty selection.
///
/// # Errors
///
/// Returns `Err` if:
/// - A token is not a non-negative integer
/// - A number is repeated
/// - A number is not in `allowed`
pub fn parse_selection(input: &str, allowed: &[u32]) -> Result<Vec<u32>, String> {
    const FORMAT_HINT: &str = r#"The answer must be of form, "cancel","c" or "x y z...", where x y and z are valid numbers and no numbers are repeated"#;

    let mut selection = Vec::new();
    for token in input.split_whitespace() {
        if !token.chars().all(|c| c.is_ascii_digit()) {
            return Err(FORMAT_HINT.to_string());
        }
        let number: u32 = token.parse().map_err(|_| FORMAT_HINT.to_string())?;
        if selection.contains(&number) || !allowed.contains(&number) {
            return Err(FORMAT_HINT.to_string());
        }
        selection.push(number);
    }
    Ok(selection)
}

/// Validates an IP address or CIDR network.
///
/// Accepts plain addresses (`192.0.2.1`, `2001:db8::1`) and networks
/// (`192.0.2.0/24`). Returns the trimmed input unchanged so the rule text
/// shows exactly what the user typed.
///
/// # Errors
///
/// Returns `Err` if the address or prefix length is invalid.
///
/// # Examples
///
/// ```
/// use firewalle::validators::validate_address;
///
/// assert_eq!(validate_address(" 10.0.0.1 ").unwrap(), "10.0.0.1");
/// assert!(validate_address("10.0.0.0/8").is_ok());
/// assert!(validate_address("999.999.999.999").is_err());
/// ```
pub fn validate_address(input: &str) -> Result<String, String> {
    let trimmed = input.trim();
    let (addr, prefix) = match trimmed.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (trimmed, None),
    };

    // Parse the address strictly; ipnetwork alone accepts truncated forms like "10.0"
    let ip: IpAddr = addr
        .parse()
        .map_err(|_| format!("'{trimmed}' is not a valid IP address"))?;

    if let Some(prefix) = prefix {
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| format!("'{trimmed}' has an invalid prefix length"))?;
        IpNetwork::new(ip, prefix).map_err(|e| format!("'{trimmed}' is not a valid network: {e}"))?;
    }

    Ok(trimmed.to_string())
}

/// Warns about addresses whose blocking is likely a mistake.
///
/// Returns `Some(warning)` for loopback and unspecified addresses.
pub fn check_reserved_address(input: &str) -> Option<String> {
    let addr = input.trim().split('/').next()?.parse::<IpAddr>().ok()?;
    if addr.is_loopback() {
        Some(format!("{addr} is a loopback address"))
    } else if addr.is_unspecified() {
        Some(format!("{addr} is the unspecified address (matches everything)"))
    } else {
        None
    }
}
