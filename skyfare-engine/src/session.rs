use skyfare_core::reservation::Itinerary;
use skyfare_core::{BookingError, CoreResult};

/// Per-caller session state: the authenticated username, if any, and the
/// itinerary list from the caller's most recent search.
///
/// A session belongs to exactly one caller and is never shared, so it needs
/// no internal locking. Itinerary indices are only meaningful against the
/// current list; every search replaces it wholesale and numbering restarts
/// at zero.
pub struct SessionContext {
    user: Option<String>,
    itineraries: Vec<Itinerary>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            user: None,
            itineraries: Vec::new(),
        }
    }

    pub fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Bind the session to a username for its remaining lifetime. A second
    /// login is rejected, not treated as idempotent; there is no logout.
    pub fn bind_user(&mut self, username: &str) -> CoreResult<()> {
        if self.user.is_some() {
            return Err(BookingError::AlreadyAuthenticated);
        }
        self.user = Some(username.to_string());
        Ok(())
    }

    /// Replace the itinerary list with the results of a new search.
    pub fn record_search(&mut self, itineraries: Vec<Itinerary>) {
        self.itineraries = itineraries;
    }

    pub fn resolve_itinerary(&self, itinerary_id: i32) -> CoreResult<&Itinerary> {
        if itinerary_id < 0 {
            return Err(BookingError::NoSuchItinerary(itinerary_id));
        }
        self.itineraries
            .get(itinerary_id as usize)
            .ok_or(BookingError::NoSuchItinerary(itinerary_id))
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn itinerary(fid1: i32) -> Itinerary {
        Itinerary {
            fid1,
            fid2: None,
            day: 1,
            cost: 100,
        }
    }

    #[test]
    fn test_second_login_rejected() {
        let mut session = SessionContext::new();
        session.bind_user("amy").unwrap();
        assert!(matches!(
            session.bind_user("amy"),
            Err(BookingError::AlreadyAuthenticated)
        ));
        assert_eq!(session.current_user(), Some("amy"));
    }

    #[test]
    fn test_resolve_bounds() {
        let mut session = SessionContext::new();
        assert!(session.resolve_itinerary(0).is_err());

        session.record_search(vec![itinerary(7), itinerary(9)]);
        assert_eq!(session.resolve_itinerary(1).unwrap().fid1, 9);
        assert!(matches!(
            session.resolve_itinerary(2),
            Err(BookingError::NoSuchItinerary(2))
        ));
        assert!(matches!(
            session.resolve_itinerary(-1),
            Err(BookingError::NoSuchItinerary(-1))
        ));
    }

    #[test]
    fn test_new_search_replaces_list_and_resets_indices() {
        let mut session = SessionContext::new();
        session.record_search(vec![itinerary(7), itinerary(9), itinerary(11)]);
        assert_eq!(session.resolve_itinerary(2).unwrap().fid1, 11);

        session.record_search(vec![itinerary(21)]);
        assert_eq!(session.resolve_itinerary(0).unwrap().fid1, 21);
        assert!(session.resolve_itinerary(2).is_err());
    }
}
