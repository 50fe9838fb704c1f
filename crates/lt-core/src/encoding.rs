//! Ordered text-encoding fallback for table files
//!
//! Files come from spreadsheet exports on machines with different locales and
//! carry no encoding metadata. Decoding tries a fixed list of encodings and
//! keeps the first one that both decodes strictly and parses.

use encoding_rs::{Encoding, EUC_JP, GBK, SHIFT_JIS, UTF_16LE, UTF_8};
use std::fmt::Display;

/// Candidate encodings in the order they are tried.
///
/// `SHIFT_JIS` is the WHATWG decoder, i.e. Windows-31J / CP932, and comes
/// right after UTF-8. The legacy byte grammars overlap, so a later legacy
/// candidate only wins on bytes every earlier one rejects. UTF-16LE without
/// a BOM is last; its ASCII code units carry NUL bytes, which rules out
/// every other candidate.
pub fn candidates() -> [&'static Encoding; 5] {
    [UTF_8, SHIFT_JIS, EUC_JP, GBK, UTF_16LE]
}

/// One rejected candidate
#[derive(Debug, Clone)]
pub struct Attempt {
    /// Encoding that was tried
    pub encoding: &'static Encoding,
    /// Why it was rejected
    pub reason: String,
}

/// Successful decode: the parsed value and the encoding that produced it
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub value: T,
    pub encoding: &'static Encoding,
}

/// Decode `bytes` with each candidate in turn and hand the text to `parse`.
///
/// A byte-order mark, when present, puts its encoding at the front of the
/// list (with the mark stripped). Returns the first success, or every
/// rejected attempt in order.
pub fn decode_first<T, E, F>(bytes: &[u8], mut parse: F) -> Result<Decoded<T>, Vec<Attempt>>
where
    E: Display,
    F: FnMut(&str) -> Result<T, E>,
{
    let bom = Encoding::for_bom(bytes);

    let mut order: Vec<(&'static Encoding, &[u8])> = Vec::with_capacity(6);
    if let Some((encoding, bom_len)) = bom {
        order.push((encoding, &bytes[bom_len..]));
    }
    for encoding in candidates() {
        if bom.is_some_and(|(b, _)| b == encoding) {
            continue;
        }
        order.push((encoding, bytes));
    }

    let mut attempts = Vec::new();
    for (encoding, input) in order {
        let text = match encoding.decode_without_bom_handling_and_without_replacement(input) {
            Some(text) => text,
            None => {
                tracing::debug!(encoding = encoding.name(), "malformed input");
                attempts.push(Attempt {
                    encoding,
                    reason: "malformed input".to_string(),
                });
                continue;
            }
        };

        if text.contains('\0') {
            tracing::debug!(encoding = encoding.name(), "NUL in decoded text");
            attempts.push(Attempt {
                encoding,
                reason: "NUL in decoded text".to_string(),
            });
            continue;
        }

        match parse(&text) {
            Ok(value) => return Ok(Decoded { value, encoding }),
            Err(e) => {
                tracing::debug!(encoding = encoding.name(), error = %e, "parse failed");
                attempts.push(Attempt {
                    encoding,
                    reason: e.to_string(),
                });
            }
        }
    }

    Err(attempts)
}

/// Summary of rejected attempts, for error messages
pub fn describe_attempts(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.encoding.name(), a.reason))
        .collect::<Vec<_>>()
        .join(", ")
}
