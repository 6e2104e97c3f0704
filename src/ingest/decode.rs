use anyhow::{Context, Result};
use encoding_rs::{Encoding, GB18030, UTF_8};
use tracing::{debug, trace, warn};

use crate::config::FALLBACK_ENCODING;

pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode `bytes` as `label`, failing on any malformed sequence. `utf-8` also
/// accepts (and strips) a leading BOM.
pub fn decode_strict(bytes: &[u8], label: &str) -> Option<String> {
    let label = label.trim().to_ascii_lowercase();
    if matches!(label.as_str(), "utf-8" | "utf8" | "utf-8-sig") {
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        return UTF_8
            .decode_without_bom_handling_and_without_replacement(body)
            .map(|text| text.into_owned());
    }

    let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
        warn!(label = %label, "unknown encoding label");
        return None;
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

/// Decode with replacement characters; never fails.
pub fn decode_lossy(bytes: &[u8], label: &str) -> String {
    let encoding = Encoding::for_label(label.as_bytes()).unwrap_or(GB18030);
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        debug!(encoding = encoding.name(), "lossy decode replaced malformed input");
    }
    text.into_owned()
}

/// Try each encoding in order until both decoding and `parse` succeed, then fall
/// back to a lossy decode of [`FALLBACK_ENCODING`]. Returns the parsed value and
/// the label of the encoding that worked.
pub fn decode_with<T, F>(bytes: &[u8], encodings: &[String], parse: F) -> Result<(T, String)>
where
    F: Fn(&str) -> Result<T>,
{
    for label in encodings {
        let Some(text) = decode_strict(bytes, label) else {
            trace!(encoding = %label, "not decodable");
            continue;
        };
        match parse(&text) {
            Ok(value) => return Ok((value, label.clone())),
            Err(e) => debug!(encoding = %label, "decoded but failed to parse: {:#}", e),
        }
    }

    let text = decode_lossy(bytes, FALLBACK_ENCODING);
    let value = parse(&text)
        .with_context(|| format!("all encodings exhausted, lossy {} also failed", FALLBACK_ENCODING))?;
    Ok((value, format!("{}-lossy", FALLBACK_ENCODING)))
}
