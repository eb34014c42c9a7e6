use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Remaining-seat tracking for one flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityEntry {
    pub fid: i32,
    pub remaining: i32,
    pub base: i32,
}

/// Per-flight remaining-seat counters, the sole gate against overselling.
///
/// Entries are created lazily from the catalog's base capacity the first
/// time a booking touches the flight and are never recreated afterward.
/// Callers serialize access; admission is a test-and-decrement against the
/// current entry.
pub struct CapacityLedger {
    entries: HashMap<i32, CapacityEntry>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Initialize the entry for a flight if it does not exist yet.
    /// Idempotent: an existing entry is left untouched.
    pub fn ensure_entry(&mut self, fid: i32, base: i32) {
        self.entries.entry(fid).or_insert(CapacityEntry {
            fid,
            remaining: base,
            base,
        });
    }

    /// Get the current entry
    pub fn get(&self, fid: i32) -> Option<&CapacityEntry> {
        self.entries.get(&fid)
    }

    /// Claim one seat if any remain.
    pub fn admit(&mut self, fid: i32) -> Result<(), CapacityError> {
        let entry = self
            .entries
            .get_mut(&fid)
            .ok_or(CapacityError::Unknown(fid))?;

        if entry.remaining <= 0 {
            return Err(CapacityError::Exhausted(fid));
        }

        entry.remaining -= 1;
        Ok(())
    }

    /// Return one seat, never exceeding the base capacity. An attempt to go
    /// past the base is an invariant violation: it is logged and clamped.
    pub fn release(&mut self, fid: i32) {
        match self.entries.get_mut(&fid) {
            Some(entry) => {
                if entry.remaining >= entry.base {
                    tracing::warn!(
                        fid,
                        remaining = entry.remaining,
                        base = entry.base,
                        "capacity release would exceed base capacity, clamping"
                    );
                    entry.remaining = entry.base;
                } else {
                    entry.remaining += 1;
                }
            }
            None => {
                tracing::warn!(fid, "capacity release for a flight never admitted");
            }
        }
    }
}

impl Default for CapacityLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CapacityError {
    #[error("No capacity entry for flight {0}")]
    Unknown(i32),

    #[error("No seats remaining on flight {0}")]
    Exhausted(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_lifecycle() {
        let mut ledger = CapacityLedger::new();

        // Lazy init
        ledger.ensure_entry(7, 2);
        assert_eq!(ledger.get(7).unwrap().remaining, 2);

        // Re-init is a no-op even after consumption
        ledger.admit(7).unwrap();
        ledger.ensure_entry(7, 2);
        assert_eq!(ledger.get(7).unwrap().remaining, 1);

        // Drain and reject
        ledger.admit(7).unwrap();
        assert!(matches!(ledger.admit(7), Err(CapacityError::Exhausted(7))));
        assert_eq!(ledger.get(7).unwrap().remaining, 0);

        // Release restores a seat
        ledger.release(7);
        assert_eq!(ledger.get(7).unwrap().remaining, 1);
    }

    #[test]
    fn test_release_is_bounded_by_base() {
        let mut ledger = CapacityLedger::new();
        ledger.ensure_entry(7, 3);

        // Full ledger: releasing again must clamp, not exceed base
        ledger.release(7);
        assert_eq!(ledger.get(7).unwrap().remaining, 3);
    }

    #[test]
    fn test_admit_unknown_flight() {
        let mut ledger = CapacityLedger::new();
        assert!(matches!(ledger.admit(99), Err(CapacityError::Unknown(99))));
    }
}
