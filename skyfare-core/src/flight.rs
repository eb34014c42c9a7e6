use serde::{Deserialize, Serialize};
use std::fmt;

/// One flight record from the reference catalog. Never mutated; seat
/// consumption is tracked separately in the capacity ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub fid: i32,
    pub day_of_month: i32,
    pub carrier_id: String,
    pub flight_num: String,
    pub origin_city: String,
    pub dest_city: String,
    /// Flight duration in minutes.
    pub actual_time: i32,
    /// Base seat capacity; the capacity ledger's upper bound.
    pub capacity: i32,
    pub price: i32,
    pub canceled: bool,
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} Day: {} Carrier: {} Number: {} Origin: {} Dest: {} Duration: {} Capacity: {} Price: {}",
            self.fid,
            self.day_of_month,
            self.carrier_id,
            self.flight_num,
            self.origin_city,
            self.dest_city,
            self.actual_time,
            self.capacity,
            self.price
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Flight {
        Flight {
            fid: 703,
            day_of_month: 14,
            carrier_id: "AA".to_string(),
            flight_num: "102".to_string(),
            origin_city: "Seattle WA".to_string(),
            dest_city: "Boston MA".to_string(),
            actual_time: 307,
            capacity: 10,
            price: 452,
            canceled: false,
        }
    }

    #[test]
    fn test_flight_line_format() {
        let line = sample().to_string();
        assert_eq!(
            line,
            "ID: 703 Day: 14 Carrier: AA Number: 102 Origin: Seattle WA \
             Dest: Boston MA Duration: 307 Capacity: 10 Price: 452"
        );
    }
}
