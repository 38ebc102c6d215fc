//! Opaque identifier minting.
//!
//! Two identifier spaces are minted independently: the public session id
//! carried in the cookie, and the internal record id used as the table's
//! primary key. Both default to [`mint_token`], but the
//! [`SessionInterface`](crate::SessionInterface) accepts a separate minter for
//! each so that knowing one never tells you anything about the other.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;

/// Number of random bytes behind each token.
pub const TOKEN_BYTES: usize = 30;

/// A shareable identifier factory.
pub type IdMinter = Arc<dyn Fn() -> String + Send + Sync>;

/// Generates a cryptographically random, URL- and cookie-safe token.
///
/// Returns a 40-character string (30 random bytes → base64url, unpadded).
#[must_use]
pub fn mint_token() -> String {
    let random_bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

pub(crate) fn default_minter() -> IdMinter {
    Arc::new(mint_token)
}
