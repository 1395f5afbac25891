// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Self-contained image sources (RFC 2397 `data:` URIs).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Whether `src` already carries its bytes and needs no fetch.
pub fn is_self_contained(src: &str) -> bool {
    src.trim_start()
        .get(..SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SCHEME))
}

/// Encode bytes as a base64 `data:` URI.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    let mut out = String::with_capacity(SCHEME.len() + mime_type.len() + 8 + bytes.len() * 4 / 3 + 4);
    out.push_str(SCHEME);
    out.push_str(mime_type);
    out.push_str(BASE64_MARKER);
    out.push(',');
    STANDARD.encode_string(bytes, &mut out);
    out
}

/// Decode a base64 `data:` URI into its MIME type and bytes.
///
/// Returns `None` for anything that is not a well-formed base64 data URI.
pub fn decode(src: &str) -> Option<(String, Vec<u8>)> {
    if !is_self_contained(src) {
        return None;
    }
    let rest = &src.trim_start()[SCHEME.len()..];
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(BASE64_MARKER)?;
    let mime = if mime.is_empty() { "text/plain" } else { mime };
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime.to_string(), bytes))
}
