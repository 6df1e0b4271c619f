use percent_encoding::percent_decode_str;

/// Query-unescape: `+` becomes a space and `%XX` a byte.
///
/// Returns `None` for a malformed escape or a non-UTF-8 result.
pub(crate) fn query_unescape(raw: &str) -> Option<String> {
    if !escapes_are_well_formed(raw) {
        return None;
    }
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

pub(crate) fn decode_or_raw(raw: &str) -> String {
    query_unescape(raw).unwrap_or_else(|| raw.to_string())
}

fn escapes_are_well_formed(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3);
            if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}
