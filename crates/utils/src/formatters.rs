// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

/// Formatter for byte payloads such as ciphertext handles. Long payloads are elided in the
/// middle so a BFV ciphertext does not flood the logs.
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", truncate(hex::encode(data)))
}

/// Short `0xabcd..ef01` form used in log fields for fingerprints and handles.
pub fn short_hex(data: &[u8]) -> String {
    let encoded = hex::encode(data);
    if encoded.len() <= 12 {
        return format!("0x{encoded}");
    }
    format!("0x{}..{}", &encoded[..8], &encoded[encoded.len() - 4..])
}

fn truncate(s: String) -> String {
    let threshold = 100;
    let limit = 50;
    let cutoff = limit / 2;
    if s.len() <= threshold {
        format!("0x{}", s)
    } else {
        let start = &s[..cutoff];
        let end = &s[s.len() - (limit - cutoff)..];
        format!("<bytes({}):0x{}..{}>", s.len() / 2, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hex<'a>(&'a [u8]);

    impl fmt::Display for Hex<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            hexf(self.0, f)
        }
    }

    #[test]
    fn short_payloads_are_printed_in_full() {
        assert_eq!(Hex(&[0xde, 0xad]).to_string(), "0xdead");
        assert_eq!(short_hex(&[0xbe, 0xef]), "0xbeef");
    }

    #[test]
    fn long_payloads_are_elided() {
        let data = vec![0xabu8; 200];
        let printed = Hex(&data).to_string();
        assert!(printed.starts_with("<bytes(200):0xabab"));
        assert_eq!(short_hex(&data), "0xabababab..abab");
    }
}
