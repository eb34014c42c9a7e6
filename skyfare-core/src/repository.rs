use crate::flight::Flight;
use crate::reservation::{Itinerary, Reservation};
use crate::CoreResult;
use async_trait::async_trait;

/// Repository trait for read-only flight reference data.
///
/// Implementations are side-effect free and safe for unlimited concurrent
/// callers. Origin and destination strings come straight from callers and
/// must be bound, never interpolated, by SQL-backed implementations.
#[async_trait]
pub trait FlightCatalog: Send + Sync {
    /// Direct flights on `day` from `origin` to `dest`, canceled flights
    /// excluded, ordered by duration ascending then fid ascending, truncated
    /// to `limit`.
    async fn flights_by_route(
        &self,
        day: i32,
        origin: &str,
        dest: &str,
        limit: u32,
    ) -> CoreResult<Vec<Flight>>;

    /// Two-leg connections on `day`: leg 1 departs `origin`, leg 2 arrives
    /// `dest`, leg 1's destination is leg 2's origin, neither canceled.
    /// Ordered by summed duration ascending then leg-1 fid ascending,
    /// truncated to `limit`.
    async fn connections_by_route(
        &self,
        day: i32,
        origin: &str,
        dest: &str,
        limit: u32,
    ) -> CoreResult<Vec<(Flight, Flight)>>;

    async fn flight_by_id(&self, fid: i32) -> CoreResult<Option<Flight>>;
}

/// Repository trait for the mutable shared state: accounts, seat capacity,
/// and reservations.
///
/// Every method is one atomic transaction. `reserve` admits both legs of an
/// itinerary as a unit or not at all; `settle_payment` and
/// `cancel_reservation` commit their balance and status changes together.
/// Implementations back these with a single lock over the ledgers or with
/// database transactions and row locks.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create_customer(
        &self,
        username: &str,
        password: &str,
        init_amount: i32,
    ) -> CoreResult<()>;

    /// True if the username/password pair matches a stored account.
    async fn authenticate(&self, username: &str, password: &str) -> CoreResult<bool>;

    /// All reservations ever made by `username`, canceled ones included,
    /// ordered by ascending rid.
    async fn reservations_for(&self, username: &str) -> CoreResult<Vec<Reservation>>;

    /// Admit every leg of `itinerary` against remaining capacity and persist
    /// a new unpaid reservation, returning its rid. Capacity entries are
    /// lazily initialized from the catalog's base capacity on first touch.
    /// Fails with `CapacityExceeded` leaving all leg capacities unchanged.
    async fn reserve(&self, username: &str, itinerary: &Itinerary) -> CoreResult<i64>;

    /// Debit the owner's balance by the reservation cost and mark it paid,
    /// returning the remaining balance. The reservation must exist, belong
    /// to `username`, and be neither paid nor canceled.
    async fn settle_payment(&self, rid: i64, username: &str) -> CoreResult<i32>;

    /// Refund the reservation cost, release its seats, and mark it canceled.
    /// The reservation must exist, belong to `username`, and not already be
    /// canceled.
    async fn cancel_reservation(&self, rid: i64, username: &str) -> CoreResult<()>;
}
