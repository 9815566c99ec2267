//! PEM-style armor for encrypted message envelopes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::{SmaError, SmaResult};

const MESSAGE_HEADER: &str = "-----BEGIN SMA MESSAGE-----";
const MESSAGE_FOOTER: &str = "-----END SMA MESSAGE-----";
const LINE_WIDTH: usize = 64;

/// Wrap binary envelope bytes in message armor.
pub fn armor(bytes: &[u8]) -> String {
    let body = BASE64.encode(bytes);
    let mut out = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 64);

    out.push_str(MESSAGE_HEADER);
    out.push('\n');
    // base64 output is ASCII, so byte chunks are valid str slices
    for line in body.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(std::str::from_utf8(line).unwrap_or_default());
        out.push('\n');
    }
    out.push_str(MESSAGE_FOOTER);
    out.push('\n');
    out
}

/// Strip message armor and return the envelope bytes.
pub fn dearmor(text: &str) -> SmaResult<Vec<u8>> {
    let text = text.trim();

    let inner = text
        .strip_prefix(MESSAGE_HEADER)
        .and_then(|rest| rest.strip_suffix(MESSAGE_FOOTER))
        .ok_or_else(|| SmaError::DecryptionError("missing message armor".to_string()))?;

    let body: String = inner.split_whitespace().collect();
    BASE64
        .decode(body)
        .map_err(|e| SmaError::DecryptionError(format!("corrupt armor body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armor_wraps_lines() {
        let data = vec![0xAB; 200];
        let armored = armor(&data);

        assert!(armored.starts_with(MESSAGE_HEADER));
        assert!(armored.trim_end().ends_with(MESSAGE_FOOTER));
        assert!(armored.lines().all(|l| l.len() <= LINE_WIDTH || l.starts_with("-----")));
        assert_eq!(dearmor(&armored).unwrap(), data);
    }

    #[test]
    fn test_dearmor_rejects_missing_header() {
        let err = dearmor("AAAA\n-----END SMA MESSAGE-----").unwrap_err();
        assert!(matches!(err, SmaError::DecryptionError(_)));
    }

    #[test]
    fn test_dearmor_rejects_bad_body() {
        let text = format!("{}\n!!!not base64!!!\n{}", MESSAGE_HEADER, MESSAGE_FOOTER);
        assert!(matches!(dearmor(&text), Err(SmaError::DecryptionError(_))));
    }
}
