use crate::database::db_err;
use async_trait::async_trait;
use skyfare_core::flight::Flight;
use skyfare_core::repository::FlightCatalog;
use skyfare_core::CoreResult;
use sqlx::PgPool;

/// Postgres-backed flight catalog.
///
/// Origin and destination strings are caller input and are always bound as
/// parameters, never spliced into the query text.
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct FlightRow {
    fid: i32,
    day_of_month: i32,
    carrier_id: String,
    flight_num: String,
    origin_city: String,
    dest_city: String,
    actual_time: i32,
    capacity: i32,
    price: i32,
    canceled: bool,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            fid: row.fid,
            day_of_month: row.day_of_month,
            carrier_id: row.carrier_id,
            flight_num: row.flight_num,
            origin_city: row.origin_city,
            dest_city: row.dest_city,
            actual_time: row.actual_time,
            capacity: row.capacity,
            price: row.price,
            canceled: row.canceled,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ConnectionRow {
    fid1: i32,
    carrier_id1: String,
    flight_num1: String,
    origin_city1: String,
    dest_city1: String,
    actual_time1: i32,
    capacity1: i32,
    price1: i32,
    fid2: i32,
    carrier_id2: String,
    flight_num2: String,
    origin_city2: String,
    dest_city2: String,
    actual_time2: i32,
    capacity2: i32,
    price2: i32,
    day_of_month: i32,
}

impl ConnectionRow {
    fn into_pair(self) -> (Flight, Flight) {
        let leg1 = Flight {
            fid: self.fid1,
            day_of_month: self.day_of_month,
            carrier_id: self.carrier_id1,
            flight_num: self.flight_num1,
            origin_city: self.origin_city1,
            dest_city: self.dest_city1,
            actual_time: self.actual_time1,
            capacity: self.capacity1,
            price: self.price1,
            canceled: false,
        };
        let leg2 = Flight {
            fid: self.fid2,
            day_of_month: self.day_of_month,
            carrier_id: self.carrier_id2,
            flight_num: self.flight_num2,
            origin_city: self.origin_city2,
            dest_city: self.dest_city2,
            actual_time: self.actual_time2,
            capacity: self.capacity2,
            price: self.price2,
            canceled: false,
        };
        (leg1, leg2)
    }
}

#[async_trait]
impl FlightCatalog for PgCatalog {
    async fn flights_by_route(
        &self,
        day: i32,
        origin: &str,
        dest: &str,
        limit: u32,
    ) -> CoreResult<Vec<Flight>> {
        let rows: Vec<FlightRow> = sqlx::query_as(
            r#"
            SELECT fid, day_of_month, carrier_id, flight_num, origin_city,
                   dest_city, actual_time, capacity, price, canceled
            FROM flights
            WHERE day_of_month = $1
              AND origin_city = $2
              AND dest_city = $3
              AND NOT canceled
            ORDER BY actual_time ASC, fid ASC
            LIMIT $4
            "#,
        )
        .bind(day)
        .bind(origin)
        .bind(dest)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn connections_by_route(
        &self,
        day: i32,
        origin: &str,
        dest: &str,
        limit: u32,
    ) -> CoreResult<Vec<(Flight, Flight)>> {
        let rows: Vec<ConnectionRow> = sqlx::query_as(
            r#"
            SELECT f1.fid AS fid1, f1.carrier_id AS carrier_id1,
                   f1.flight_num AS flight_num1, f1.origin_city AS origin_city1,
                   f1.dest_city AS dest_city1, f1.actual_time AS actual_time1,
                   f1.capacity AS capacity1, f1.price AS price1,
                   f2.fid AS fid2, f2.carrier_id AS carrier_id2,
                   f2.flight_num AS flight_num2, f2.origin_city AS origin_city2,
                   f2.dest_city AS dest_city2, f2.actual_time AS actual_time2,
                   f2.capacity AS capacity2, f2.price AS price2,
                   f1.day_of_month AS day_of_month
            FROM flights f1
            JOIN flights f2
              ON f1.dest_city = f2.origin_city
             AND f2.day_of_month = f1.day_of_month
            WHERE f1.day_of_month = $1
              AND f1.origin_city = $2
              AND f2.dest_city = $3
              AND NOT f1.canceled
              AND NOT f2.canceled
            ORDER BY f1.actual_time + f2.actual_time ASC, f1.fid ASC, f2.fid ASC
            LIMIT $4
            "#,
        )
        .bind(day)
        .bind(origin)
        .bind(dest)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(ConnectionRow::into_pair).collect())
    }

    async fn flight_by_id(&self, fid: i32) -> CoreResult<Option<Flight>> {
        let row: Option<FlightRow> = sqlx::query_as(
            r#"
            SELECT fid, day_of_month, carrier_id, flight_num, origin_city,
                   dest_city, actual_time, capacity, price, canceled
            FROM flights
            WHERE fid = $1
            "#,
        )
        .bind(fid)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Into::into))
    }
}
