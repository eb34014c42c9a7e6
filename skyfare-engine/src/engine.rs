use crate::session::SessionContext;
use skyfare_core::repository::{FlightCatalog, TransactionStore};
use skyfare_core::reservation::Itinerary;
use skyfare_core::search::SearchRequest;
use skyfare_core::{BookingError, CoreResult};
use std::sync::Arc;

/// Orchestrates the reservation operations over the flight catalog and the
/// transactional store, owning every cross-entity business rule.
///
/// Each public operation returns the caller-facing response text, success or
/// failure; no error crosses this boundary. Storage failures are logged and
/// collapsed into the operation's generic failure literal, so callers cannot
/// tell infrastructure trouble from a plain business rejection.
pub struct BookingEngine {
    catalog: Arc<dyn FlightCatalog>,
    store: Arc<dyn TransactionStore>,
}

impl BookingEngine {
    pub fn new(catalog: Arc<dyn FlightCatalog>, store: Arc<dyn TransactionStore>) -> Self {
        Self { catalog, store }
    }

    pub async fn create_customer(
        &self,
        username: &str,
        password: &str,
        init_amount: i32,
    ) -> String {
        match self.store.create_customer(username, password, init_amount).await {
            Ok(()) => format!("Created user {}\n", username),
            Err(err) => {
                log_failure("create_customer", &err);
                "Failed to create user\n".to_string()
            }
        }
    }

    pub async fn login(
        &self,
        session: &mut SessionContext,
        username: &str,
        password: &str,
    ) -> String {
        match self.try_login(session, username, password).await {
            Ok(()) => format!("Logged in as {}\n", username),
            Err(BookingError::AlreadyAuthenticated) => "User already logged in\n".to_string(),
            Err(err) => {
                log_failure("login", &err);
                "Login failed\n".to_string()
            }
        }
    }

    async fn try_login(
        &self,
        session: &mut SessionContext,
        username: &str,
        password: &str,
    ) -> CoreResult<()> {
        if session.current_user().is_some() {
            return Err(BookingError::AlreadyAuthenticated);
        }
        if !self.store.authenticate(username, password).await? {
            return Err(BookingError::InvalidCredentials);
        }
        session.bind_user(username)
    }

    pub async fn search(&self, session: &mut SessionContext, req: &SearchRequest) -> String {
        match self.try_search(req).await {
            Ok((itineraries, report)) => {
                // Replace the previous result list even when nothing matched:
                // stale indices must never resolve against old results.
                session.record_search(itineraries);
                report
            }
            Err(err) => {
                log_failure("search", &err);
                "Failed to search\n".to_string()
            }
        }
    }

    /// Direct flights first, in their own duration order; connections only
    /// fill whatever room the limit leaves, never displacing a direct hit.
    async fn try_search(&self, req: &SearchRequest) -> CoreResult<(Vec<Itinerary>, String)> {
        let direct = self
            .catalog
            .flights_by_route(
                req.day_of_month,
                &req.origin_city,
                &req.dest_city,
                req.num_itineraries,
            )
            .await?;

        let mut connections = Vec::new();
        if !req.direct_only && (direct.len() as u32) < req.num_itineraries {
            let room = req.num_itineraries - direct.len() as u32;
            connections = self
                .catalog
                .connections_by_route(req.day_of_month, &req.origin_city, &req.dest_city, room)
                .await?;
        }

        if direct.is_empty() && connections.is_empty() {
            return Ok((Vec::new(), "No flights match your selection\n".to_string()));
        }

        let mut itineraries = Vec::new();
        let mut report = String::new();

        for flight in &direct {
            report.push_str(&format!(
                "Itinerary {}: 1 flight(s), {} minutes\n{}\n",
                itineraries.len(),
                flight.actual_time,
                flight
            ));
            itineraries.push(Itinerary {
                fid1: flight.fid,
                fid2: None,
                day: flight.day_of_month,
                cost: flight.price,
            });
        }

        for (leg1, leg2) in &connections {
            report.push_str(&format!(
                "Itinerary {}: 2 flight(s), {} minutes\n{}\n{}\n",
                itineraries.len(),
                leg1.actual_time + leg2.actual_time,
                leg1,
                leg2
            ));
            itineraries.push(Itinerary {
                fid1: leg1.fid,
                fid2: Some(leg2.fid),
                day: leg1.day_of_month,
                cost: leg1.price + leg2.price,
            });
        }

        Ok((itineraries, report))
    }

    pub async fn book(&self, session: &mut SessionContext, itinerary_id: i32) -> String {
        match self.try_book(session, itinerary_id).await {
            Ok(rid) => format!("Booked flight(s), reservation ID: {}\n", rid),
            Err(BookingError::AuthRequired) => {
                "Cannot book reservations, not logged in\n".to_string()
            }
            Err(BookingError::NoSuchItinerary(id)) => format!("No such itinerary {}\n", id),
            Err(BookingError::DuplicateLegConflict(_)) => {
                "You cannot book two flights in the same day\n".to_string()
            }
            Err(err) => {
                log_failure("book", &err);
                "Booking failed\n".to_string()
            }
        }
    }

    async fn try_book(&self, session: &mut SessionContext, itinerary_id: i32) -> CoreResult<i64> {
        let username = session
            .current_user()
            .ok_or(BookingError::AuthRequired)?
            .to_string();
        let itinerary = session.resolve_itinerary(itinerary_id)?.clone();

        // A leg already held by any of the caller's reservations, canceled
        // ones included, blocks the booking. The comparison is by flight id.
        let existing = self.store.reservations_for(&username).await?;
        for reservation in &existing {
            for fid in itinerary.legs() {
                if reservation.holds_flight(fid) {
                    return Err(BookingError::DuplicateLegConflict(fid));
                }
            }
        }

        self.store.reserve(&username, &itinerary).await
    }

    pub async fn pay(&self, session: &SessionContext, reservation_id: i64) -> String {
        let Some(username) = session.current_user() else {
            return "Cannot pay, not logged in\n".to_string();
        };

        match self.store.settle_payment(reservation_id, username).await {
            Ok(balance) => format!(
                "Paid reservation: {} remaining balance: {}\n",
                reservation_id, balance
            ),
            Err(BookingError::ReservationNotFound(_)) => format!(
                "Cannot find unpaid reservation {} under user: {}\n",
                reservation_id, username
            ),
            Err(BookingError::InsufficientFunds { balance, cost }) => format!(
                "User has only {} in account but itinerary costs {}\n",
                balance, cost
            ),
            Err(err) => {
                log_failure("pay", &err);
                format!("Failed to pay for reservation {}\n", reservation_id)
            }
        }
    }

    pub async fn reservations(&self, session: &SessionContext) -> String {
        let Some(username) = session.current_user() else {
            return "Cannot view reservations, not logged in\n".to_string();
        };

        match self.try_reservations(username).await {
            Ok(report) => report,
            Err(err) => {
                log_failure("reservations", &err);
                "Failed to retrieve reservations\n".to_string()
            }
        }
    }

    async fn try_reservations(&self, username: &str) -> CoreResult<String> {
        let reservations = self.store.reservations_for(username).await?;
        if reservations.is_empty() {
            return Ok("No reservations found\n".to_string());
        }

        let mut report = String::new();
        for reservation in &reservations {
            report.push_str(&format!(
                "Reservation {} paid: {}:\n",
                reservation.rid, reservation.paid
            ));
            // Leg details come live from the catalog, not from a snapshot
            // taken at booking time.
            for fid in reservation.legs() {
                let flight = self.catalog.flight_by_id(fid).await?.ok_or_else(|| {
                    BookingError::Unavailable(format!("flight {} missing from catalog", fid))
                })?;
                report.push_str(&format!("{}\n", flight));
            }
        }
        Ok(report)
    }

    pub async fn cancel(&self, session: &SessionContext, reservation_id: i64) -> String {
        let Some(username) = session.current_user() else {
            return "Cannot cancel reservations, not logged in\n".to_string();
        };

        match self.store.cancel_reservation(reservation_id, username).await {
            Ok(()) => format!("Canceled reservation {}\n", reservation_id),
            Err(err) => {
                log_failure("cancel", &err);
                format!("Failed to cancel reservation {}\n", reservation_id)
            }
        }
    }
}

/// Storage trouble is an error for the operator; a plain business rejection
/// only merits debug-level noise.
fn log_failure(op: &str, err: &BookingError) {
    match err {
        BookingError::Unavailable(reason) => {
            tracing::error!(op, %reason, "storage failure");
        }
        other => {
            tracing::debug!(op, error = %other, "operation rejected");
        }
    }
}
