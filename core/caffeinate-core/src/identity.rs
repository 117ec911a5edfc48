//! Tab identity.
//!
//! Each browsing context gets one stable random identifier for its
//! lifetime, stored in the context-scoped slot so that two simultaneously
//! open tabs can never observe the same value. The id survives in-context
//! navigations and dies with the context, which is all the bookmark keying
//! needs.

use std::fmt;

use rand::Rng;

use crate::host::TabHost;

const TAB_ID_PREFIX: &str = "tab_";
const TAB_ID_ENTROPY_CHARS: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Stable per-context identifier, e.g. `tab_k3q09xzpa`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabId(String);

impl TabId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn generate() -> String {
    let mut rng = rand::thread_rng();
    let entropy: String = (0..TAB_ID_ENTROPY_CHARS)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}{}", TAB_ID_PREFIX, entropy)
}

/// Returns this context's identity, minting one on first call.
///
/// Idempotent: repeated calls within the same context return the same id.
/// A slot value that doesn't carry our prefix (the host may have put its
/// own data there) is left conceptually foreign and replaced.
pub fn ensure_identity(host: &mut dyn TabHost) -> TabId {
    match host.context_slot() {
        Some(existing) if existing.starts_with(TAB_ID_PREFIX) => TabId(existing),
        _ => {
            let fresh = generate();
            host.set_context_slot(&fresh);
            tracing::debug!(tab_id = %fresh, "Minted tab identity");
            TabId(fresh)
        }
    }
}
