use crate::accounts::BalanceLedger;
use crate::reservations::ReservationBook;
use async_trait::async_trait;
use skyfare_catalog::capacity::CapacityLedger;
use skyfare_catalog::CapacityError;
use skyfare_core::flight::Flight;
use skyfare_core::repository::{FlightCatalog, TransactionStore};
use skyfare_core::reservation::{Itinerary, Reservation};
use skyfare_core::{BookingError, CoreResult};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The three mutable ledgers, guarded together.
struct LedgerState {
    accounts: BalanceLedger,
    capacity: CapacityLedger,
    reservations: ReservationBook,
}

/// In-memory `TransactionStore`.
///
/// One mutex over the account, capacity, and reservation ledgers makes every
/// store operation a serializable transaction: a two-leg admission, a
/// debit-plus-paid flag, or a refund-plus-release-plus-canceled flag each
/// commit inside a single critical section. Catalog lookups happen before
/// the lock is taken; nothing awaits while holding it.
pub struct MemoryStore {
    catalog: Arc<dyn FlightCatalog>,
    state: Mutex<LedgerState>,
}

impl MemoryStore {
    pub fn new(catalog: Arc<dyn FlightCatalog>) -> Self {
        Self {
            catalog,
            state: Mutex::new(LedgerState {
                accounts: BalanceLedger::new(),
                capacity: CapacityLedger::new(),
                reservations: ReservationBook::new(),
            }),
        }
    }

    /// Current remaining seats for a flight, if any booking has touched it.
    pub async fn remaining_seats(&self, fid: i32) -> Option<i32> {
        let state = self.state.lock().await;
        state.capacity.get(fid).map(|e| e.remaining)
    }

    async fn leg_flights(&self, itinerary: &Itinerary) -> CoreResult<Vec<Flight>> {
        let mut flights = Vec::with_capacity(itinerary.flight_count());
        for fid in itinerary.legs() {
            let flight = self.catalog.flight_by_id(fid).await?.ok_or_else(|| {
                BookingError::Unavailable(format!("flight {} missing from catalog", fid))
            })?;
            flights.push(flight);
        }
        Ok(flights)
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create_customer(
        &self,
        username: &str,
        password: &str,
        init_amount: i32,
    ) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        state.accounts.create(username, password, init_amount)?;
        Ok(())
    }

    async fn authenticate(&self, username: &str, password: &str) -> CoreResult<bool> {
        let state = self.state.lock().await;
        Ok(state.accounts.verify(username, password))
    }

    async fn reservations_for(&self, username: &str) -> CoreResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(state.reservations.for_user(username))
    }

    async fn reserve(&self, username: &str, itinerary: &Itinerary) -> CoreResult<i64> {
        // Base capacities come from the read-only catalog; fetch them before
        // entering the critical section.
        let flights = self.leg_flights(itinerary).await?;

        let mut state = self.state.lock().await;
        for flight in &flights {
            state.capacity.ensure_entry(flight.fid, flight.capacity);
        }

        // Both legs admit as a unit: roll back the first leg if the second
        // has no seats left.
        let mut admitted = Vec::with_capacity(flights.len());
        for fid in itinerary.legs() {
            match state.capacity.admit(fid) {
                Ok(()) => admitted.push(fid),
                Err(CapacityError::Exhausted(fid)) | Err(CapacityError::Unknown(fid)) => {
                    for held in admitted {
                        state.capacity.release(held);
                    }
                    return Err(BookingError::CapacityExceeded(fid));
                }
            }
        }

        Ok(state.reservations.insert(username, itinerary))
    }

    async fn settle_payment(&self, rid: i64, username: &str) -> CoreResult<i32> {
        let mut state = self.state.lock().await;

        let reservation = match state.reservations.get(rid) {
            Some(r) if r.username == username && !r.paid && !r.canceled => r.clone(),
            // Missing, foreign, paid, and canceled are indistinguishable to
            // the caller: no payable reservation exists.
            _ => return Err(BookingError::ReservationNotFound(rid)),
        };

        let remaining = state.accounts.debit(username, reservation.cost)?;
        state.reservations.mark_paid(rid)?;
        Ok(remaining)
    }

    async fn cancel_reservation(&self, rid: i64, username: &str) -> CoreResult<()> {
        let mut state = self.state.lock().await;

        let reservation = match state.reservations.get(rid) {
            Some(r) if r.username == username && !r.canceled => r.clone(),
            _ => return Err(BookingError::ReservationNotFound(rid)),
        };

        // Refund is unconditional: an unpaid reservation still credits its
        // cost back.
        state.accounts.credit(username, reservation.cost)?;
        for fid in reservation.legs() {
            state.capacity.release(fid);
        }
        state.reservations.mark_canceled(rid)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfare_catalog::MemoryCatalog;

    fn flight(fid: i32, capacity: i32, price: i32) -> Flight {
        Flight {
            fid,
            day_of_month: 5,
            carrier_id: "AA".to_string(),
            flight_num: format!("{}", 100 + fid),
            origin_city: "Seattle WA".to_string(),
            dest_city: "Boston MA".to_string(),
            actual_time: 300,
            capacity,
            price,
            canceled: false,
        }
    }

    fn store_with(flights: Vec<Flight>) -> Arc<MemoryStore> {
        let catalog: Arc<dyn FlightCatalog> = Arc::new(MemoryCatalog::new(flights));
        Arc::new(MemoryStore::new(catalog))
    }

    fn direct(fid: i32, cost: i32) -> Itinerary {
        Itinerary {
            fid1: fid,
            fid2: None,
            day: 5,
            cost,
        }
    }

    #[tokio::test]
    async fn test_one_seat_two_concurrent_bookings() {
        let store = store_with(vec![flight(1, 1, 100)]);

        let mut handles = Vec::new();
        for user in ["amy", "bob"] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.reserve(user, &direct(1, 100)).await
            }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        let wins = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(BookingError::CapacityExceeded(1)))));
        assert_eq!(store.remaining_seats(1).await, Some(0));
    }

    #[tokio::test]
    async fn test_two_seats_admit_both_callers() {
        let store = store_with(vec![flight(1, 2, 100)]);

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.reserve("amy", &direct(1, 100)).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.reserve("bob", &direct(1, 100)).await })
        };

        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
        assert_eq!(store.remaining_seats(1).await, Some(0));
    }

    #[tokio::test]
    async fn test_concurrent_rids_never_collide() {
        let store = store_with(vec![flight(1, 20, 100)]);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.reserve(&format!("user{}", i), &direct(1, 100)).await
            }));
        }

        let mut rids = Vec::new();
        for handle in handles {
            rids.push(handle.await.unwrap().unwrap());
        }
        rids.sort_unstable();
        assert_eq!(rids, (1..=8).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_two_leg_failure_rolls_back_first_leg() {
        let store = store_with(vec![flight(1, 5, 100), flight(2, 0, 100)]);

        let two_leg = Itinerary {
            fid1: 1,
            fid2: Some(2),
            day: 5,
            cost: 200,
        };
        let err = store.reserve("amy", &two_leg).await.unwrap_err();
        assert!(matches!(err, BookingError::CapacityExceeded(2)));

        // Leg 1 was admitted then rolled back.
        assert_eq!(store.remaining_seats(1).await, Some(5));
    }

    #[tokio::test]
    async fn test_pay_is_exactly_once() {
        let store = store_with(vec![flight(1, 5, 300)]);
        store.create_customer("amy", "pw", 1000).await.unwrap();
        let rid = store.reserve("amy", &direct(1, 300)).await.unwrap();

        assert_eq!(store.settle_payment(rid, "amy").await.unwrap(), 700);

        // A second pay finds no payable reservation and moves no money.
        let err = store.settle_payment(rid, "amy").await.unwrap_err();
        assert!(matches!(err, BookingError::ReservationNotFound(_)));
        let listed = store.reservations_for("amy").await.unwrap();
        assert!(listed[0].paid);
    }

    #[tokio::test]
    async fn test_pay_enforces_ownership() {
        let store = store_with(vec![flight(1, 5, 300)]);
        store.create_customer("amy", "pw", 1000).await.unwrap();
        store.create_customer("bob", "pw", 1000).await.unwrap();
        let rid = store.reserve("amy", &direct(1, 300)).await.unwrap();

        let err = store.settle_payment(rid, "bob").await.unwrap_err();
        assert!(matches!(err, BookingError::ReservationNotFound(_)));
    }

    #[tokio::test]
    async fn test_pay_reports_balance_and_cost() {
        let store = store_with(vec![flight(1, 5, 300)]);
        store.create_customer("amy", "pw", 120).await.unwrap();
        let rid = store.reserve("amy", &direct(1, 300)).await.unwrap();

        let err = store.settle_payment(rid, "amy").await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::InsufficientFunds {
                balance: 120,
                cost: 300
            }
        ));
    }

    #[tokio::test]
    async fn test_cancel_after_pay_refunds_cost() {
        let store = store_with(vec![flight(1, 1, 300)]);
        store.create_customer("amy", "pw", 1000).await.unwrap();
        let rid = store.reserve("amy", &direct(1, 300)).await.unwrap();
        store.settle_payment(rid, "amy").await.unwrap();
        assert_eq!(store.remaining_seats(1).await, Some(0));

        store.cancel_reservation(rid, "amy").await.unwrap();

        // Refund restores the debit and the seat comes back.
        let listed = store.reservations_for("amy").await.unwrap();
        assert!(listed[0].canceled);
        assert_eq!(store.remaining_seats(1).await, Some(1));
        let err = store.cancel_reservation(rid, "amy").await.unwrap_err();
        assert!(matches!(err, BookingError::ReservationNotFound(_)));
    }

    #[tokio::test]
    async fn test_unpaid_cancel_still_credits() {
        let store = store_with(vec![flight(1, 1, 300)]);
        store.create_customer("amy", "pw", 0).await.unwrap();
        let rid = store.reserve("amy", &direct(1, 300)).await.unwrap();

        store.cancel_reservation(rid, "amy").await.unwrap();

        // The refund does not check whether the reservation was ever paid.
        let second = store.reserve("amy", &direct(1, 300)).await.unwrap();
        assert_eq!(store.settle_payment(second, "amy").await.unwrap(), 0);
    }
}
