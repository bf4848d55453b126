//! `data:` URI parsing (spec.md §4.A).

use base64::Engine;

/// The fixed `data:` URI prefix every ethscription content URI must start with.
const SCHEME_PREFIX: &str = "data:";

/// A parsed `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// The full, unparsed media type as written (e.g. `"text/plain;charset=utf-8"`)
    pub mimetype: String,
    /// The portion of the media type before `/`, empty when no media type was given
    pub media_type: String,
    /// The portion of the media type after `/`, empty when no media type was given
    pub mime_subtype: String,
    /// Whether the `;base64` marker was present
    pub is_base64: bool,
    /// The raw, never percent-decoded payload bytes
    pub decoded_data: Vec<u8>,
}

/// True if `uri` is a syntactically valid `data:` URI: starts with the scheme
/// prefix and has a `,` separating the metadata from the payload.
pub fn valid(uri: &str) -> bool {
    uri.starts_with(SCHEME_PREFIX) && uri[SCHEME_PREFIX.len()..].contains(',')
}

/// True when the URI's media-type parameter list syntactically declares
/// ESIP-6 duplicate-content tolerance (a `;rule=esip6` parameter).
pub fn esip6(uri: &str) -> bool {
    match split(uri) {
        Some((meta, _)) => meta.split(';').any(|p| p.eq_ignore_ascii_case("rule=esip6")),
        None => false,
    }
}

/// Splits a `data:` URI into its `(metadata, payload)` halves, on the first comma.
fn split(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix(SCHEME_PREFIX)?;
    let comma = rest.find(',')?;
    Some((&rest[..comma], &rest[comma + 1..]))
}

/// Parses a `data:` URI into its components.
///
/// For non-base64 payloads `decoded_data` is the raw substring bytes —
/// percent-decoding is never performed, per spec.md §4.A's contract.
pub fn parse(uri: &str) -> Option<DataUri> {
    let (meta, payload) = split(uri)?;

    let mut parts = meta.split(';');
    let mimetype_field = parts.next().unwrap_or("");
    let is_base64 = meta.split(';').skip(1).any(|p| p.eq_ignore_ascii_case("base64"));

    let (media_type, mime_subtype) = match mimetype_field.split_once('/') {
        Some((a, b)) => (a.to_string(), b.to_string()),
        None => (String::new(), String::new()),
    };

    let decoded_data = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .ok()?
    } else {
        payload.as_bytes().to_vec()
    };

    Some(DataUri {
        mimetype: mimetype_field.to_string(),
        media_type,
        mime_subtype,
        is_base64,
        decoded_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_uri() {
        assert!(valid("data:,hello world"));
        let parsed = parse("data:,hello world").unwrap();
        assert_eq!(parsed.decoded_data, b"hello world");
        assert_eq!(parsed.mimetype, "");
        assert!(!parsed.is_base64);
    }

    #[test]
    fn base64_uri_round_trips_losslessly() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"\x00\x01binary\xff");
        let uri = format!("data:application/octet-stream;base64,{encoded}");
        let parsed = parse(&uri).unwrap();
        assert_eq!(parsed.decoded_data, b"\x00\x01binary\xff");
        assert_eq!(parsed.media_type, "application");
        assert_eq!(parsed.mime_subtype, "octet-stream");
        assert!(parsed.is_base64);
    }

    #[test]
    fn non_base64_payload_is_never_percent_decoded() {
        let parsed = parse("data:text/plain,hello%20world").unwrap();
        assert_eq!(parsed.decoded_data, b"hello%20world");
    }

    #[test]
    fn invalid_uri_missing_comma() {
        assert!(!valid("data:text/plain"));
        assert!(parse("data:text/plain").is_none());
    }

    #[test]
    fn esip6_marker_detected() {
        assert!(esip6("data:text/plain;rule=esip6,hi"));
        assert!(!esip6("data:text/plain,hi"));
    }
}
