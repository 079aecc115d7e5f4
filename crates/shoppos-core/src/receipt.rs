//! Receipt code formatting for printed receipts and QR payloads.
//!
//! All three functions are display-only and accept any stored code,
//! including legacy undashed ones such as `HD123456789`.

/// Placeholder shown when a sale has no code.
pub const MISSING_CODE: &str = "---";

/// Formats a sale code for display.
///
/// Dashed codes are returned unchanged. An undashed `HD` code has the last
/// six characters split off: `HD123456789` becomes `HD-123-456789`.
pub fn format_receipt_code(code: &str) -> String {
    if code.is_empty() {
        return MISSING_CODE.to_string();
    }
    if code.contains('-') {
        return code.to_string();
    }

    if let Some(rest) = code.strip_prefix("HD") {
        let chars: Vec<char> = rest.chars().collect();
        if chars.len() > 6 {
            let (head, tail) = chars.split_at(chars.len() - 6);
            return format!(
                "HD-{}-{}",
                head.iter().collect::<String>(),
                tail.iter().collect::<String>()
            );
        }
        if chars.len() > 4 {
            return format!("HD-{}", rest);
        }
    }

    code.to_string()
}

/// Last 8 characters of the code without dashes, left-padded with `0`.
pub fn short_code(code: &str) -> String {
    if code.is_empty() {
        return MISSING_CODE.to_string();
    }
    last_n_padded(code, 8)
}

/// Last 6 characters of the code without dashes, left-padded with `0`.
pub fn qr_code(code: &str) -> String {
    if code.is_empty() {
        return "000000".to_string();
    }
    last_n_padded(code, 6)
}

fn last_n_padded(code: &str, n: usize) -> String {
    let clean: Vec<char> = code.chars().filter(|c| *c != '-').collect();
    let start = clean.len().saturating_sub(n);
    let tail: String = clean[start..].iter().collect();
    format!("{:0>width$}", tail, width = n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_receipt_code() {
        assert_eq!(format_receipt_code(""), "---");
        assert_eq!(format_receipt_code("HD-225600"), "HD-225600");
        assert_eq!(format_receipt_code("HD123456789"), "HD-123-456789");
        assert_eq!(format_receipt_code("HD12345"), "HD-12345");
        assert_eq!(format_receipt_code("HD12"), "HD12");
        assert_eq!(format_receipt_code("INV42"), "INV42");
    }

    #[test]
    fn test_short_code() {
        assert_eq!(short_code(""), "---");
        assert_eq!(short_code("HD-225600"), "HD225600");
        assert_eq!(short_code("HD-1"), "00000HD1");
        assert_eq!(short_code("HD-123-456789"), "23456789");
    }

    #[test]
    fn test_qr_code() {
        assert_eq!(qr_code(""), "000000");
        assert_eq!(qr_code("HD-225600"), "225600");
        assert_eq!(qr_code("HD-42"), "00HD42");
    }
}
