use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer account. Balances are integer currency minor units, debited by
/// payment and credited by cancellation refunds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub balance: i32,
}

/// A candidate travel plan produced by search, addressable only by its
/// position in the session's most recent result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    pub fid1: i32,
    /// Second leg; `None` for a direct itinerary.
    pub fid2: Option<i32>,
    pub day: i32,
    /// Sum of the leg prices at search time.
    pub cost: i32,
}

impl Itinerary {
    pub fn flight_count(&self) -> usize {
        if self.fid2.is_some() {
            2
        } else {
            1
        }
    }

    pub fn legs(&self) -> impl Iterator<Item = i32> + '_ {
        std::iter::once(self.fid1).chain(self.fid2)
    }
}

/// A persisted booking. Reservation ids are globally unique and monotonic
/// from 1; a canceled rid is permanently retired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub rid: i64,
    pub fid1: i32,
    pub fid2: Option<i32>,
    pub username: String,
    pub cost: i32,
    pub paid: bool,
    pub canceled: bool,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn legs(&self) -> impl Iterator<Item = i32> + '_ {
        std::iter::once(self.fid1).chain(self.fid2)
    }

    /// True if this reservation holds a seat on `fid`.
    pub fn holds_flight(&self, fid: i32) -> bool {
        self.fid1 == fid || self.fid2 == Some(fid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_itinerary_legs() {
        let direct = Itinerary {
            fid1: 7,
            fid2: None,
            day: 3,
            cost: 100,
        };
        assert_eq!(direct.flight_count(), 1);
        assert_eq!(direct.legs().collect::<Vec<_>>(), vec![7]);

        let two_hop = Itinerary {
            fid1: 7,
            fid2: Some(9),
            day: 3,
            cost: 250,
        };
        assert_eq!(two_hop.flight_count(), 2);
        assert_eq!(two_hop.legs().collect::<Vec<_>>(), vec![7, 9]);
    }

    #[test]
    fn test_reservation_holds_flight() {
        let r = Reservation {
            rid: 1,
            fid1: 7,
            fid2: Some(9),
            username: "amy".to_string(),
            cost: 250,
            paid: false,
            canceled: false,
            created_at: Utc::now(),
        };
        assert!(r.holds_flight(7));
        assert!(r.holds_flight(9));
        assert!(!r.holds_flight(11));
    }
}
