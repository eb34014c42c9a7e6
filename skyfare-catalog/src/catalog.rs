use async_trait::async_trait;
use skyfare_core::flight::Flight;
use skyfare_core::repository::FlightCatalog;
use skyfare_core::CoreResult;
use std::collections::HashMap;

/// In-memory flight catalog backed by a preloaded flight list.
///
/// Reference data only; nothing here mutates after construction, so reads
/// need no synchronization.
pub struct MemoryCatalog {
    flights: HashMap<i32, Flight>,
}

impl MemoryCatalog {
    pub fn new(flights: impl IntoIterator<Item = Flight>) -> Self {
        Self {
            flights: flights.into_iter().map(|f| (f.fid, f)).collect(),
        }
    }

    fn active_on(&self, day: i32) -> impl Iterator<Item = &Flight> {
        self.flights
            .values()
            .filter(move |f| !f.canceled && f.day_of_month == day)
    }
}

#[async_trait]
impl FlightCatalog for MemoryCatalog {
    async fn flights_by_route(
        &self,
        day: i32,
        origin: &str,
        dest: &str,
        limit: u32,
    ) -> CoreResult<Vec<Flight>> {
        let mut hits: Vec<Flight> = self
            .active_on(day)
            .filter(|f| f.origin_city == origin && f.dest_city == dest)
            .cloned()
            .collect();

        hits.sort_by_key(|f| (f.actual_time, f.fid));
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn connections_by_route(
        &self,
        day: i32,
        origin: &str,
        dest: &str,
        limit: u32,
    ) -> CoreResult<Vec<(Flight, Flight)>> {
        // Index second legs by their origin so each first leg joins in one
        // lookup instead of a full scan.
        let mut by_origin: HashMap<&str, Vec<&Flight>> = HashMap::new();
        for f in self.active_on(day).filter(|f| f.dest_city == dest) {
            by_origin.entry(f.origin_city.as_str()).or_default().push(f);
        }

        let mut pairs: Vec<(Flight, Flight)> = Vec::new();
        for leg1 in self.active_on(day).filter(|f| f.origin_city == origin) {
            if let Some(second_legs) = by_origin.get(leg1.dest_city.as_str()) {
                for leg2 in second_legs {
                    pairs.push((leg1.clone(), (*leg2).clone()));
                }
            }
        }

        pairs.sort_by_key(|(a, b)| (a.actual_time + b.actual_time, a.fid, b.fid));
        pairs.truncate(limit as usize);
        Ok(pairs)
    }

    async fn flight_by_id(&self, fid: i32) -> CoreResult<Option<Flight>> {
        Ok(self.flights.get(&fid).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(fid: i32, day: i32, origin: &str, dest: &str, time: i32, canceled: bool) -> Flight {
        Flight {
            fid,
            day_of_month: day,
            carrier_id: "AA".to_string(),
            flight_num: format!("{}", 100 + fid),
            origin_city: origin.to_string(),
            dest_city: dest.to_string(),
            actual_time: time,
            capacity: 10,
            price: 100,
            canceled,
        }
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new(vec![
            flight(1, 5, "Seattle WA", "Boston MA", 300, false),
            flight(2, 5, "Seattle WA", "Boston MA", 250, false),
            flight(3, 5, "Seattle WA", "Boston MA", 250, false),
            flight(4, 5, "Seattle WA", "Boston MA", 200, true),
            flight(5, 6, "Seattle WA", "Boston MA", 100, false),
            flight(6, 5, "Seattle WA", "Denver CO", 120, false),
            flight(7, 5, "Denver CO", "Boston MA", 180, false),
            flight(8, 5, "Seattle WA", "Chicago IL", 110, false),
            flight(9, 5, "Chicago IL", "Boston MA", 170, false),
        ])
    }

    #[tokio::test]
    async fn test_direct_ordering_and_ties() {
        let hits = catalog()
            .flights_by_route(5, "Seattle WA", "Boston MA", 10)
            .await
            .unwrap();
        // Canceled flight 4 excluded, day-6 flight 5 excluded; ties on
        // duration break by ascending fid.
        let fids: Vec<i32> = hits.iter().map(|f| f.fid).collect();
        assert_eq!(fids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_direct_limit() {
        let hits = catalog()
            .flights_by_route(5, "Seattle WA", "Boston MA", 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].fid, 2);
    }

    #[tokio::test]
    async fn test_connections_ordered_by_total_duration() {
        let pairs = catalog()
            .connections_by_route(5, "Seattle WA", "Boston MA", 10)
            .await
            .unwrap();
        let fids: Vec<(i32, i32)> = pairs.iter().map(|(a, b)| (a.fid, b.fid)).collect();
        // 8->9 totals 280, 6->7 totals 300.
        assert_eq!(fids, vec![(8, 9), (6, 7)]);
    }

    #[tokio::test]
    async fn test_connections_require_matching_transfer_city() {
        let pairs = catalog()
            .connections_by_route(5, "Denver CO", "Chicago IL", 10)
            .await
            .unwrap();
        assert!(pairs.is_empty());
    }

    #[tokio::test]
    async fn test_flight_by_id() {
        let c = catalog();
        assert_eq!(c.flight_by_id(6).await.unwrap().unwrap().fid, 6);
        assert!(c.flight_by_id(999).await.unwrap().is_none());
    }
}
