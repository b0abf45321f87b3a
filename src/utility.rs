//! Helpers for the `KEY=VALUE` configuration format.

use crate::error::{KnxError, Result};

/// Meaningful lines of a configuration text, paired with their 1-based
/// line number. Blank lines and `#` comments are skipped, the rest trimmed.
pub fn config_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Split `KEY=VALUE` at the first `=`, trimming both sides.
///
/// The value may be empty, the key may not.
pub fn split_key_value(line: &str) -> Result<(&str, &str)> {
    let (key, value) = line
        .split_once('=')
        .ok_or_else(KnxError::malformed_config_line)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(KnxError::malformed_config_line());
    }
    Ok((key, value.trim()))
}

/// Decode exactly `N` bytes written as `2 * N` hex digits.
pub fn parse_hex<const N: usize>(value: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(value, &mut out).map_err(|_| KnxError::invalid_config_value())?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_lines() {
        let text = "\n# comment\n  KNX_USER_ID = 2 \n\n   # indented comment\nA=B\n";
        let lines: Vec<_> = config_lines(text).collect();
        assert_eq!(lines, vec![(3, "KNX_USER_ID = 2"), (6, "A=B")]);
    }

    #[test]
    fn test_split_key_value() {
        assert_eq!(split_key_value("KEY=VALUE").unwrap(), ("KEY", "VALUE"));
        assert_eq!(split_key_value(" KEY = a=b ").unwrap(), ("KEY", "a=b"));
        assert_eq!(split_key_value("KEY=").unwrap(), ("KEY", ""));

        match split_key_value("NO_SEPARATOR") {
            Err(KnxError::Config(e)) => assert!(e.is_malformed_line()),
            other => panic!("unexpected {other:?}"),
        }
        assert!(split_key_value("=value").is_err());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex::<2>("0aFF").unwrap(), [0x0A, 0xFF]);
        assert!(parse_hex::<2>("0a").is_err());
        assert!(parse_hex::<2>("0aFF00").is_err());
        match parse_hex::<1>("zz") {
            Err(KnxError::Config(e)) => assert!(e.is_invalid_value()),
            other => panic!("unexpected {other:?}"),
        }
    }
}
