//! PostgreSQL booking repository implementation.
//!
//! Source of truth for confirmed bookings and read access to show metadata.
//! Confirmation is a compare-and-set scoped to `PAYMENT_PENDING`, executed
//! in one transaction together with the `confirmed_seats` inserts whose
//! primary key `(show_id, seat_id)` backs the no-double-booking invariant
//! even if the coordinator were ever bypassed.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::error::{BookingError, Result};
use crate::providers::BookingRepository;
use crate::state::{Customer, Order, OrderId, OrderStatus, SeatId, Show, ShowId, ShowStatus, UserId};

/// PostgreSQL-backed [`BookingRepository`].
#[derive(Clone)]
pub struct PostgresBookingRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresBookingRepository {
    /// Create a repository over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and build a repository.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Database`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| BookingError::Database(format!("Failed to connect: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Database`] if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying pool, for callers that share it.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_show(row: &PgRow) -> Result<Show> {
        let status: String = get(row, "status")?;
        Ok(Show {
            show_id: ShowId(get(row, "show_id")?),
            movie_title: get(row, "movie_title")?,
            theatre_id: get::<Uuid>(row, "theatre_id")?,
            theatre_name: get(row, "theatre_name")?,
            start_time: get(row, "start_time")?,
            price: get(row, "price")?,
            status: ShowStatus::parse(&status)?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = get(row, "status")?;
        let seat_ids: Vec<String> = get(row, "seat_ids")?;
        let seat_ids = seat_ids
            .iter()
            .map(|s| SeatId::parse(s))
            .collect::<Result<Vec<_>>>()
            .map_err(|_| BookingError::Database("Corrupt seat id in order row".into()))?;

        Ok(Order {
            order_id: OrderId(get(row, "order_id")?),
            user_id: UserId::new(get(row, "user_id")?),
            show_id: ShowId(get(row, "show_id")?),
            seat_ids,
            customer: Customer {
                name: get(row, "customer_name")?,
                email: get(row, "customer_email")?,
                phone: get(row, "customer_phone")?,
            },
            amount: get(row, "amount")?,
            status: OrderStatus::parse(&status)?,
            ticket_code: get(row, "ticket_code")?,
            created_at: get(row, "created_at")?,
            expires_at: get(row, "expires_at")?,
            updated_at: get(row, "updated_at")?,
        })
    }
}

/// `try_get` with the column name folded into the error.
fn get<'r, T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>>(
    row: &'r PgRow,
    column: &str,
) -> Result<T> {
    row.try_get(column)
        .map_err(|e| BookingError::Database(format!("Failed to read column {column}: {e}")))
}

impl BookingRepository for PostgresBookingRepository {
    async fn show_by_id(&self, show_id: ShowId) -> Result<Option<Show>> {
        let row = sqlx::query(
            r"
            SELECT s.show_id, s.theatre_id, s.start_time, s.price, s.status,
                   t.name AS theatre_name, m.title AS movie_title
            FROM shows s
            JOIN theatres t ON s.theatre_id = t.theatre_id
            JOIN movies m ON s.movie_id = m.movie_id
            WHERE s.show_id = $1
            ",
        )
        .bind(show_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BookingError::Database(format!("Failed to get show: {e}")))?;

        row.as_ref().map(Self::row_to_show).transpose()
    }

    async fn confirmed_seats(&self, show_id: ShowId) -> Result<Vec<SeatId>> {
        let rows: Vec<(Vec<String>,)> = sqlx::query_as(
            r"
            SELECT seat_ids FROM orders
            WHERE show_id = $1 AND status = 'CONFIRMED'
            ",
        )
        .bind(show_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BookingError::Database(format!("Failed to get confirmed seats: {e}")))?;

        let mut seats: Vec<SeatId> = rows
            .into_iter()
            .flat_map(|(ids,)| ids)
            .filter_map(|s| SeatId::parse(&s).ok())
            .collect();
        seats.sort();
        seats.dedup();

        Ok(seats)
    }

    async fn create_order(&self, order: &Order) -> Result<()> {
        let seat_ids: Vec<String> = order.seat_ids.iter().map(|s| s.as_str().to_string()).collect();

        sqlx::query(
            r"
            INSERT INTO orders (
                order_id, user_id, show_id, seat_ids,
                customer_name, customer_email, customer_phone,
                amount, status, ticket_code, created_at, expires_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ",
        )
        .bind(order.order_id.0)
        .bind(order.user_id.as_str())
        .bind(order.show_id.0)
        .bind(&seat_ids)
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(&order.customer.phone)
        .bind(order.amount)
        .bind(order.status.as_str())
        .bind(order.ticket_code.as_deref())
        .bind(order.created_at)
        .bind(order.expires_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return BookingError::Database("Order already exists".to_string());
                }
            }
            BookingError::Database(format!("Failed to create order: {e}"))
        })?;

        tracing::info!(
            order_id = %order.order_id,
            show_id = %order.show_id,
            user_id = %order.user_id,
            amount = order.amount,
            "Order persisted"
        );

        Ok(())
    }

    async fn order_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r"
            SELECT order_id, user_id, show_id, seat_ids,
                   customer_name, customer_email, customer_phone,
                   amount, status, ticket_code, created_at, expires_at, updated_at
            FROM orders
            WHERE order_id = $1
            ",
        )
        .bind(order_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BookingError::Database(format!("Failed to get order: {e}")))?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn confirm_order_payment(&self, order: &Order, ticket_code: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BookingError::Database(format!("Failed to begin transaction: {e}")))?;

        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = 'CONFIRMED', ticket_code = $1, updated_at = NOW()
            WHERE order_id = $2 AND status = 'PAYMENT_PENDING'
            ",
        )
        .bind(ticket_code)
        .bind(order.order_id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| BookingError::Database(format!("Failed to confirm order: {e}")))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| BookingError::Database(format!("Failed to roll back: {e}")))?;
            return Ok(false);
        }

        let seat_ids: Vec<String> = order.seat_ids.iter().map(|s| s.as_str().to_string()).collect();

        sqlx::query(
            r"
            INSERT INTO confirmed_seats (show_id, seat_id, order_id)
            SELECT $1, UNNEST($2::text[]), $3
            ",
        )
        .bind(order.show_id.0)
        .bind(&seat_ids)
        .bind(order.order_id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    tracing::error!(
                        order_id = %order.order_id,
                        show_id = %order.show_id,
                        "Confirmation rejected: seat already confirmed for this show"
                    );
                    return BookingError::Database(
                        "Seat already confirmed for this show".to_string(),
                    );
                }
            }
            BookingError::Database(format!("Failed to record confirmed seats: {e}"))
        })?;

        tx.commit()
            .await
            .map_err(|e| BookingError::Database(format!("Failed to commit confirmation: {e}")))?;

        metrics::counter!("booking.orders.confirmed").increment(1);

        Ok(true)
    }
}
