use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use crate::foundation::error::{ToonlinkError, ToonlinkResult};
use crate::schema::validate::check_structure;
use crate::scene::model::{CreationDef, WIRE_VERSION};

/// Tokens longer than this are rejected as abuse or corruption.
pub const MAX_TOKEN_LEN: usize = 5000;

/// URL length under which a share link fits in a tweet.
const TWITTER_URL_LIMIT: usize = 280;

/// URL length most social platforms accept.
const SOCIAL_URL_LIMIT: usize = 2000;

/// Compression capability injected into the codec at construction.
///
/// Decided once at startup rather than probed per call; a decoder without the
/// capability reports compressed tokens as undecodable instead of guessing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compressor {
    /// zlib deflate/inflate (what the web builder emits via pako).
    #[default]
    Deflate,
    /// No compression available; encode emits `u_` tokens only.
    None,
}

impl Compressor {
    fn deflate(self, bytes: &[u8]) -> Option<Vec<u8>> {
        match self {
            Self::None => None,
            Self::Deflate => {
                let mut enc = flate2::write::ZlibEncoder::new(
                    Vec::with_capacity(bytes.len() / 2),
                    flate2::Compression::default(),
                );
                // Writing to a Vec cannot fail in practice; fall back to the
                // uncompressed path on any error so sharing never blocks.
                let ok = enc.write_all(bytes).is_ok();
                match enc.finish() {
                    Ok(out) if ok => Some(out),
                    _ => {
                        tracing::warn!("deflate failed, encoding uncompressed");
                        None
                    }
                }
            }
        }
    }

    fn inflate(self, bytes: &[u8]) -> ToonlinkResult<Vec<u8>> {
        match self {
            Self::None => Err(ToonlinkError::decode(
                "token is compressed but no decompressor is configured",
            )),
            Self::Deflate => {
                let mut out = Vec::with_capacity(bytes.len() * 4);
                flate2::read::ZlibDecoder::new(bytes)
                    .read_to_end(&mut out)
                    .map_err(|e| ToonlinkError::decode(format!("inflate failed: {e}")))?;
                Ok(out)
            }
        }
    }
}

/// Encoder/decoder between [`CreationDef`] records and URL-safe share tokens.
///
/// Token layout: `{c_|u_}` compression tag, then the zlib-or-plain JSON bytes
/// base64-encoded with `+ / =` remapped to the URL-safe `- _ ~`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenCodec {
    compressor: Compressor,
}

impl TokenCodec {
    /// Codec with an explicit compression capability.
    pub fn new(compressor: Compressor) -> Self {
        Self { compressor }
    }

    /// Encode a creation into a URL-safe token.
    ///
    /// Stamps `version` when absent. Compression is best-effort: a failing
    /// compressor falls back to the uncompressed form and never blocks
    /// sharing.
    pub fn encode(&self, def: &CreationDef) -> ToonlinkResult<String> {
        let mut def = def.clone();
        if def.version.is_none() {
            def.version = Some(WIRE_VERSION.to_owned());
        }

        let json = serde_json::to_vec(&def)
            .map_err(|e| ToonlinkError::validation(format!("serialize creation JSON: {e}")))?;

        let (payload, tag) = match self.compressor.deflate(&json) {
            Some(compressed) => (compressed, "c_"),
            None => (json, "u_"),
        };

        let mut token = String::with_capacity(2 + payload.len().div_ceil(3) * 4);
        token.push_str(tag);
        for ch in BASE64_STANDARD.encode(&payload).chars() {
            token.push(match ch {
                '+' => '-',
                '/' => '_',
                '=' => '~',
                other => other,
            });
        }

        Ok(token)
    }

    /// Decode a URL-safe token back into a creation.
    ///
    /// Every low-level failure (tag, charset, base64, decompression, JSON)
    /// surfaces as a single [`ToonlinkError::Decode`] carrying the cause. A
    /// structurally hollow record (no body / no background) surfaces as
    /// [`ToonlinkError::Validation`].
    pub fn decode(&self, token: &str) -> ToonlinkResult<CreationDef> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(ToonlinkError::decode(format!(
                "token length {} exceeds limit {MAX_TOKEN_LEN}",
                token.len()
            )));
        }

        let (compressed, body) = match token.split_at_checked(2) {
            Some(("c_", rest)) => (true, rest),
            Some(("u_", rest)) => (false, rest),
            _ => {
                return Err(ToonlinkError::decode(
                    "missing or unrecognized compression tag",
                ));
            }
        };

        if body.is_empty() {
            return Err(ToonlinkError::decode("empty token payload"));
        }
        if let Some(bad) = body
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '~'))
        {
            return Err(ToonlinkError::decode(format!(
                "invalid token character {bad:?}"
            )));
        }

        let base64: String = body
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                '~' => '=',
                other => other,
            })
            .collect();

        let bytes = BASE64_STANDARD
            .decode(base64.as_bytes())
            .map_err(|e| ToonlinkError::decode(format!("base64 decode failed: {e}")))?;

        let json = if compressed {
            self.compressor.inflate(&bytes)?
        } else {
            bytes
        };

        let mut def: CreationDef = serde_json::from_slice(&json)
            .map_err(|e| ToonlinkError::decode(format!("creation JSON parse failed: {e}")))?;

        match def.version.as_deref() {
            None => {
                tracing::warn!(assumed = WIRE_VERSION, "no version in token, backfilling");
                def.version = Some(WIRE_VERSION.to_owned());
            }
            Some(v) if v != WIRE_VERSION => {
                tracing::warn!(got = v, expected = WIRE_VERSION, "token version mismatch");
            }
            Some(_) => {}
        }

        check_structure(&def)?;

        Ok(def)
    }

    /// Build the canonical share URL `{base_origin}/b/{token}`.
    pub fn share_url(&self, def: &CreationDef, base_origin: &str) -> ToonlinkResult<String> {
        let token = self.encode(def)?;
        Ok(format!("{}/b/{token}", base_origin.trim_end_matches('/')))
    }

    /// Size and sharing-limit stats for an encoded token.
    pub fn url_info(&self, token: &str, base_origin: &str) -> TokenInfo {
        let full_url_len = base_origin.trim_end_matches('/').len() + "/b/".len() + token.len();
        TokenInfo {
            token_len: token.len(),
            full_url_len,
            compressed: token.starts_with("c_"),
            twitter_safe: full_url_len < TWITTER_URL_LIMIT,
            social_safe: full_url_len < SOCIAL_URL_LIMIT,
        }
    }
}

/// Size and platform-limit information about an encoded share URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    /// Token length in characters.
    pub token_len: usize,
    /// Full share URL length in characters.
    pub full_url_len: usize,
    /// Whether the token carries the compressed tag.
    pub compressed: bool,
    /// Full URL fits in a tweet.
    pub twitter_safe: bool,
    /// Full URL fits common social-platform limits.
    pub social_safe: bool,
}

/// Extract the token from a viewer path of the form `/b/{token}`.
pub fn token_from_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/b/")?;
    (!rest.is_empty()).then_some(rest)
}

/// Extract the token from a query string via the `d` parameter fallback
/// (`?d={token}`), for environments without path-based routing.
pub fn token_from_query(query: &str) -> Option<&str> {
    query
        .trim_start_matches('?')
        .split('&')
        .find_map(|pair| pair.strip_prefix("d="))
        .filter(|t| !t.is_empty())
}
