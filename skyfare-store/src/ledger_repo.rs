use crate::database::db_err;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skyfare_core::repository::TransactionStore;
use skyfare_core::reservation::{Itinerary, Reservation};
use skyfare_core::{BookingError, CoreResult};
use sqlx::PgPool;
use tracing::warn;

/// Postgres-backed `TransactionStore`.
///
/// Each operation runs inside one sqlx transaction; contended rows are taken
/// with `SELECT ... FOR UPDATE` so the test-and-decrement on capacity and the
/// balance/status pairs commit atomically. Dropping the transaction on an
/// early return rolls everything back.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    rid: i64,
    fid1: i32,
    fid2: Option<i32>,
    username: String,
    cost: i32,
    paid: bool,
    canceled: bool,
    created_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation {
            rid: row.rid,
            fid1: row.fid1,
            fid2: row.fid2,
            username: row.username,
            cost: row.cost,
            paid: row.paid,
            canceled: row.canceled,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl TransactionStore for PgStore {
    async fn create_customer(
        &self,
        username: &str,
        password: &str,
        init_amount: i32,
    ) -> CoreResult<()> {
        if init_amount < 0 {
            return Err(BookingError::InvalidInitialBalance);
        }

        let result = sqlx::query(
            "INSERT INTO users (username, password, balance) VALUES ($1, $2, $3) \
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(username)
        .bind(password)
        .bind(init_amount)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::DuplicateUser);
        }
        Ok(())
    }

    async fn authenticate(&self, username: &str, password: &str) -> CoreResult<bool> {
        let hit: Option<String> =
            sqlx::query_scalar("SELECT username FROM users WHERE username = $1 AND password = $2")
                .bind(username)
                .bind(password)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(hit.is_some())
    }

    async fn reservations_for(&self, username: &str) -> CoreResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            "SELECT rid, fid1, fid2, username, cost, paid, canceled, created_at \
             FROM reservations WHERE username = $1 ORDER BY rid ASC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn reserve(&self, username: &str, itinerary: &Itinerary) -> CoreResult<i64> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // 1. Lazy capacity init, idempotent per flight.
        for fid in itinerary.legs() {
            sqlx::query(
                "INSERT INTO capacities (fid, remaining, base) \
                 SELECT f.fid, f.capacity, f.capacity FROM flights f WHERE f.fid = $1 \
                 ON CONFLICT (fid) DO NOTHING",
            )
            .bind(fid)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        // 2. Test-and-decrement each leg under a row lock. An exhausted leg
        // aborts the whole transaction, rolling back any earlier decrement.
        for fid in itinerary.legs() {
            let remaining: Option<i32> =
                sqlx::query_scalar("SELECT remaining FROM capacities WHERE fid = $1 FOR UPDATE")
                    .bind(fid)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db_err)?;

            match remaining {
                Some(n) if n > 0 => {
                    sqlx::query("UPDATE capacities SET remaining = remaining - 1 WHERE fid = $1")
                        .bind(fid)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err)?;
                }
                Some(_) => return Err(BookingError::CapacityExceeded(fid)),
                None => {
                    return Err(BookingError::Unavailable(format!(
                        "flight {} missing from catalog",
                        fid
                    )))
                }
            }
        }

        // 3. The rid comes from the table's sequence, so concurrent bookings
        // never collide and canceled ids are never reissued.
        let rid: i64 = sqlx::query_scalar(
            "INSERT INTO reservations (fid1, fid2, username, cost, paid, canceled, created_at) \
             VALUES ($1, $2, $3, $4, FALSE, FALSE, NOW()) RETURNING rid",
        )
        .bind(itinerary.fid1)
        .bind(itinerary.fid2)
        .bind(username)
        .bind(itinerary.cost)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(rid)
    }

    async fn settle_payment(&self, rid: i64, username: &str) -> CoreResult<i32> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row: Option<ReservationRow> = sqlx::query_as(
            "SELECT rid, fid1, fid2, username, cost, paid, canceled, created_at \
             FROM reservations WHERE rid = $1 FOR UPDATE",
        )
        .bind(rid)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let reservation = match row {
            Some(r) if r.username == username && !r.paid && !r.canceled => r,
            _ => return Err(BookingError::ReservationNotFound(rid)),
        };

        let balance: Option<i32> =
            sqlx::query_scalar("SELECT balance FROM users WHERE username = $1 FOR UPDATE")
                .bind(username)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        let balance = balance
            .ok_or_else(|| BookingError::Unavailable(format!("account missing: {}", username)))?;

        if balance < reservation.cost {
            return Err(BookingError::InsufficientFunds {
                balance,
                cost: reservation.cost,
            });
        }

        sqlx::query("UPDATE users SET balance = balance - $1 WHERE username = $2")
            .bind(reservation.cost)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        sqlx::query("UPDATE reservations SET paid = TRUE WHERE rid = $1")
            .bind(rid)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(balance - reservation.cost)
    }

    async fn cancel_reservation(&self, rid: i64, username: &str) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row: Option<ReservationRow> = sqlx::query_as(
            "SELECT rid, fid1, fid2, username, cost, paid, canceled, created_at \
             FROM reservations WHERE rid = $1 FOR UPDATE",
        )
        .bind(rid)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let reservation: Reservation = match row {
            Some(r) if r.username == username && !r.canceled => r.into(),
            _ => return Err(BookingError::ReservationNotFound(rid)),
        };

        // Refund is unconditional, paid or not.
        sqlx::query("UPDATE users SET balance = balance + $1 WHERE username = $2")
            .bind(reservation.cost)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        // Release each seat, clamped at the base capacity.
        for fid in reservation.legs() {
            let row: Option<(i32, i32)> =
                sqlx::query_as("SELECT remaining, base FROM capacities WHERE fid = $1 FOR UPDATE")
                    .bind(fid)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db_err)?;

            match row {
                Some((remaining, base)) if remaining < base => {
                    sqlx::query("UPDATE capacities SET remaining = remaining + 1 WHERE fid = $1")
                        .bind(fid)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err)?;
                }
                Some((remaining, base)) => {
                    warn!(
                        fid,
                        remaining, base, "capacity release would exceed base capacity, clamping"
                    );
                }
                None => {
                    warn!(fid, "capacity release for a flight never admitted");
                }
            }
        }

        sqlx::query("UPDATE reservations SET paid = FALSE, canceled = TRUE WHERE rid = $1")
            .bind(rid)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}
