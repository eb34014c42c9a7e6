use chrono::Utc;
use skyfare_core::reservation::{Itinerary, Reservation};
use skyfare_core::BookingError;
use std::collections::BTreeMap;

/// In-memory reservation records keyed by rid.
///
/// Rids are allocated monotonically from 1 and never reused: a canceled
/// reservation keeps its slot forever. Callers serialize access.
pub struct ReservationBook {
    reservations: BTreeMap<i64, Reservation>,
    next_rid: i64,
}

impl ReservationBook {
    pub fn new() -> Self {
        Self {
            reservations: BTreeMap::new(),
            next_rid: 1,
        }
    }

    /// Persist a new unpaid reservation for `itinerary`, returning its rid.
    pub fn insert(&mut self, username: &str, itinerary: &Itinerary) -> i64 {
        let rid = self.next_rid;
        self.next_rid += 1;
        self.reservations.insert(
            rid,
            Reservation {
                rid,
                fid1: itinerary.fid1,
                fid2: itinerary.fid2,
                username: username.to_string(),
                cost: itinerary.cost,
                paid: false,
                canceled: false,
                created_at: Utc::now(),
            },
        );
        rid
    }

    pub fn get(&self, rid: i64) -> Option<&Reservation> {
        self.reservations.get(&rid)
    }

    /// Every reservation ever made by `username`, canceled ones included.
    /// BTreeMap iteration order gives ascending rid.
    pub fn for_user(&self, username: &str) -> Vec<Reservation> {
        self.reservations
            .values()
            .filter(|r| r.username == username)
            .cloned()
            .collect()
    }

    pub fn mark_paid(&mut self, rid: i64) -> Result<(), ReservationError> {
        let r = self.get_mut(rid)?;
        r.paid = true;
        Ok(())
    }

    /// Cancellation is terminal; it also clears the paid flag, matching the
    /// ledger's refund of the full cost.
    pub fn mark_canceled(&mut self, rid: i64) -> Result<(), ReservationError> {
        let r = self.get_mut(rid)?;
        r.paid = false;
        r.canceled = true;
        Ok(())
    }

    fn get_mut(&mut self, rid: i64) -> Result<&mut Reservation, ReservationError> {
        self.reservations
            .get_mut(&rid)
            .ok_or(ReservationError::NotFound(rid))
    }
}

impl Default for ReservationBook {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Reservation not found: {0}")]
    NotFound(i64),
}

impl From<ReservationError> for BookingError {
    fn from(e: ReservationError) -> Self {
        match e {
            ReservationError::NotFound(rid) => BookingError::ReservationNotFound(rid),
        }
    }
}
