//! Share tokens: one string carrying both the cipher token and the server
//! identifier of an upload
//!
//! ```text
//! share token = base64("<96 hex cipher token>:<identifier>")
//! share link  = "<base>/link/<share token>"
//! ```
//!
//! Share tokens arrive from users (pasted links), so `unpack` treats every
//! malformed input as an expected outcome and returns `None`.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

/// Identifiers longer than this are cut; anything past it is trailing garbage.
pub const IDENTIFIER_MAX_LEN: usize = 36;

const LINK_SEGMENT: &str = "/link/";

/// Standard alphabet, padding optional on decode (pasted links often lose `=`).
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A share token split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareParts {
    pub token: String,
    pub identifier: String,
}

/// Bundle `token` and `identifier` into one share token.
pub fn pack(token: &str, identifier: &str) -> String {
    STANDARD.encode(format!("{token}:{identifier}"))
}

/// Split a share token into cipher token and identifier.
///
/// Splits on the first `:`, so a colon inside the identifier survives.
pub fn unpack(packed: &str) -> Option<ShareParts> {
    let decoded = LENIENT.decode(packed.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (token, identifier) = text.split_once(':')?;
    if token.is_empty() || identifier.is_empty() {
        return None;
    }
    Some(ShareParts {
        token: token.to_string(),
        identifier: identifier.chars().take(IDENTIFIER_MAX_LEN).collect(),
    })
}

/// Build a share link under `base` (e.g. `https://share.example.com`).
pub fn share_link(base: &str, packed: &str) -> String {
    format!("{}{LINK_SEGMENT}{packed}", base.trim_end_matches('/'))
}

/// Accept either a bare share token or a full share link and return the
/// share token part.
pub fn parse_share_link(input: &str) -> &str {
    let input = input.trim();
    match input.rfind(LINK_SEGMENT) {
        Some(pos) => input[pos + LINK_SEGMENT.len()..].trim_end_matches('/'),
        None => input,
    }
}
