//! Expiring per-index build claims.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

/// A build can take minutes (acquisition throttling plus the batch job), so
/// the lease is generous. Expiry only matters when a holder crashes without
/// releasing.
const LEASE_DURATION_MS: u64 = 30 * 60 * 1000;

#[derive(Debug, Clone)]
struct Lease {
    holder: String,
    expires_at: u64,
}

/// Per-index build locks with a crash-recovery expiry.
///
/// A claim hands out a holder token; release only succeeds with the matching
/// token, so a lease reclaimed after expiry cannot be released by the stale
/// holder.
pub struct BuildLeases {
    leases: DashMap<String, Lease>,
    duration_ms: u64,
}

impl BuildLeases {
    pub fn new() -> Self {
        Self::with_duration_ms(LEASE_DURATION_MS)
    }

    pub fn with_duration_ms(duration_ms: u64) -> Self {
        BuildLeases {
            leases: DashMap::new(),
            duration_ms,
        }
    }

    /// Attempt to claim the build lease for `index_id`. Returns the holder
    /// token on success, or `None` while another unexpired claim is active.
    pub fn try_claim(&self, index_id: &str) -> Option<String> {
        let now = now_ms();
        let lease = Lease {
            holder: Uuid::new_v4().to_string(),
            expires_at: now + self.duration_ms,
        };
        match self.leases.entry(index_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at > now {
                    return None;
                }
                tracing::warn!(
                    "Reclaiming expired build lease for index {} (previous holder {})",
                    index_id,
                    occupied.get().holder
                );
                occupied.insert(lease.clone());
                Some(lease.holder)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(lease.clone());
                Some(lease.holder)
            }
        }
    }

    /// Release a claim. Only the current holder's token succeeds.
    pub fn release(&self, index_id: &str, holder: &str) -> bool {
        self.leases
            .remove_if(index_id, |_, lease| lease.holder == holder)
            .is_some()
    }

    /// Whether an unexpired claim is active for `index_id`.
    pub fn is_held(&self, index_id: &str) -> bool {
        self.leases
            .get(index_id)
            .map(|lease| lease.expires_at > now_ms())
            .unwrap_or(false)
    }
}

impl Default for BuildLeases {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time in milliseconds since the epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
