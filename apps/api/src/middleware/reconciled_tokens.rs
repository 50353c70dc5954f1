use std::collections::HashMap;
use std::time::{Duration, Instant};

use pmaas_core::IdentityClaims;
use pmaas_domain::UserId;
use tokio::sync::RwLock;

const PRUNE_THRESHOLD: usize = 10_000;

/// Identity tokens whose claims were already synced to a local user.
///
/// Keyed by subject and issued-at, so a fresh token from the provider always
/// triggers a new sync. Tokens without `iat` are never remembered.
#[derive(Debug)]
pub struct ReconciledTokens {
    ttl: Duration,
    entries: RwLock<HashMap<String, (UserId, Instant)>>,
}

impl ReconciledTokens {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the user a still-fresh reconciliation of `claims` resolved to.
    pub async fn lookup(&self, claims: &IdentityClaims) -> Option<UserId> {
        let key = cache_key(claims, self.ttl)?;
        let entries = self.entries.read().await;
        let (user_id, reconciled_at) = entries.get(&key)?;
        (reconciled_at.elapsed() < self.ttl).then_some(*user_id)
    }

    pub async fn remember(&self, claims: &IdentityClaims, user_id: UserId) {
        let Some(key) = cache_key(claims, self.ttl) else {
            return;
        };

        let mut entries = self.entries.write().await;
        if entries.len() >= PRUNE_THRESHOLD {
            let ttl = self.ttl;
            entries.retain(|_, (_, reconciled_at)| reconciled_at.elapsed() < ttl);
        }
        entries.insert(key, (user_id, Instant::now()));
    }

    pub async fn forget(&self, claims: &IdentityClaims) {
        if let Some(key) = cache_key(claims, self.ttl) {
            self.entries.write().await.remove(&key);
        }
    }
}

fn cache_key(claims: &IdentityClaims, ttl: Duration) -> Option<String> {
    if ttl.is_zero() {
        return None;
    }
    claims
        .issued_at()
        .map(|issued_at| format!("{}:{issued_at}", claims.subject()))
}
