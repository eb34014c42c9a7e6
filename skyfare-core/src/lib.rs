pub mod flight;
pub mod repository;
pub mod reservation;
pub mod search;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("no user is logged in on this session")]
    AuthRequired,
    #[error("a user is already logged in on this session")]
    AlreadyAuthenticated,
    #[error("username or password did not match")]
    InvalidCredentials,
    #[error("username is already taken")]
    DuplicateUser,
    #[error("initial balance must be non-negative")]
    InvalidInitialBalance,
    #[error("no itinerary {0} in the current search results")]
    NoSuchItinerary(i32),
    #[error("flight {0} is already reserved by this user")]
    DuplicateLegConflict(i32),
    #[error("no seats remaining on flight {0}")]
    CapacityExceeded(i32),
    #[error("no such reservation {0} for this user")]
    ReservationNotFound(i64),
    #[error("balance {balance} does not cover cost {cost}")]
    InsufficientFunds { balance: i32, cost: i32 },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type CoreResult<T> = Result<T, BookingError>;
