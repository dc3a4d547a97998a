// Module database - PostgreSQL pool and persistence for searched points and trips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Coordinate, HoriSegment, HoriSummary};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(i32),
}

/// Searched point as stored (DB representation).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SearchedPoint {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub place_name: String,
    pub lat: f64,
    pub lon: f64,
    pub hori: i32,
    pub aqi: i32,
    pub temp_c: f64,
    pub reason: String,
}

/// Searched point to insert; identity and timestamp come from the database.
#[derive(Debug, Clone)]
pub struct NewSearchedPoint {
    pub place_name: String,
    pub lat: f64,
    pub lon: f64,
    pub hori: i32,
    pub aqi: i32,
    pub temp_c: f64,
    pub reason: String,
}

/// Trip row (DB representation).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub src_lon: f64,
    pub src_lat: f64,
    pub dst_lon: f64,
    pub dst_lat: f64,
    pub src_name: Option<String>,
    pub dst_name: Option<String>,
    pub stop_names: Vec<String>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub depart_iso: String,
    pub arrive_iso: String,
    pub avg_hori: f64,
    pub worst_hori: i32,
    pub worst_idx: i32,
    pub max_aqi: i32,
    pub avg_temp_c: f64,
}

/// Stored segment of a trip, ordered by `idx`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripSegment {
    pub id: i32,
    pub idx: i32,
    pub lon: f64,
    pub lat: f64,
    pub ts: String,
    pub temp_c: f64,
    pub aqi: i32,
    pub hori: i32,
    pub reason: String,
}

/// Trip row together with its ordered segments.
#[derive(Debug, Clone, Serialize)]
pub struct TripDetail {
    #[serde(flatten)]
    pub trip: Trip,
    pub segments: Vec<TripSegment>,
}

/// Trip to insert, built from one scored route.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub src: Coordinate,
    pub dst: Coordinate,
    pub src_name: Option<String>,
    pub dst_name: Option<String>,
    pub stop_names: Vec<String>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub depart_iso: String,
    pub arrive_iso: String,
    pub summary: HoriSummary,
    pub segments: Vec<HoriSegment>,
}

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new connection pool against `database_url`.
    ///
    /// # Errors
    /// Returns DatabaseError if the connection fails
    pub async fn connect(database_url: &str) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool created");

        Ok(Self { pool })
    }

    /// Run database migrations
    ///
    /// # Errors
    /// Returns DatabaseError if migration fails
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        // SQLx query() cannot handle multiple statements, so we use a raw
        // connection
        let mut conn = self.pool.acquire().await?;

        let migration_sql = include_str!("../migrations/20250412_create_hori_tables.sql");

        sqlx::raw_sql(migration_sql).execute(&mut *conn).await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }

    /// Save a scored point of interest
    ///
    /// # Returns
    /// The saved point with generated ID and creation timestamp
    pub async fn save_searched_point(
        &self,
        new: NewSearchedPoint,
    ) -> Result<SearchedPoint, DatabaseError> {
        let point = sqlx::query_as::<_, SearchedPoint>(
            r#"
            INSERT INTO searched_points (place_name, lat, lon, hori, aqi, temp_c, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&new.place_name)
        .bind(new.lat)
        .bind(new.lon)
        .bind(new.hori)
        .bind(new.aqi)
        .bind(new.temp_c)
        .bind(&new.reason)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Searched point saved: {} (ID: {})", point.place_name, point.id);
        Ok(point)
    }

    /// Get recently searched points, newest first
    pub async fn list_searched_points(
        &self,
        limit: i64,
    ) -> Result<Vec<SearchedPoint>, DatabaseError> {
        let points = sqlx::query_as::<_, SearchedPoint>(
            "SELECT * FROM searched_points ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        tracing::info!("Retrieved {} searched points", points.len());
        Ok(points)
    }

    /// Get a specific searched point by ID
    pub async fn get_searched_point(&self, id: i32) -> Result<SearchedPoint, DatabaseError> {
        let point = sqlx::query_as::<_, SearchedPoint>(
            "SELECT * FROM searched_points WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound(id))?;

        Ok(point)
    }

    /// Save a trip and its ordered segments in one transaction
    ///
    /// # Returns
    /// The saved trip row with generated ID
    pub async fn save_trip(&self, new: NewTrip) -> Result<Trip, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let trip = sqlx::query_as::<_, Trip>(
            r#"
            INSERT INTO trips (
                src_lon, src_lat, dst_lon, dst_lat, src_name, dst_name, stop_names,
                distance_km, duration_min, depart_iso, arrive_iso,
                avg_hori, worst_hori, worst_idx, max_aqi, avg_temp_c
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(new.src.lon)
        .bind(new.src.lat)
        .bind(new.dst.lon)
        .bind(new.dst.lat)
        .bind(&new.src_name)
        .bind(&new.dst_name)
        .bind(&new.stop_names)
        .bind(new.distance_km)
        .bind(new.duration_min)
        .bind(&new.depart_iso)
        .bind(&new.arrive_iso)
        .bind(new.summary.avg_hori)
        .bind(new.summary.worst_hori)
        .bind(new.summary.worst_idx)
        .bind(new.summary.max_aqi)
        .bind(new.summary.avg_temp_c)
        .fetch_one(&mut *tx)
        .await?;

        for (i, segment) in new.segments.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO segments (trip_id, idx, lon, lat, ts, temp_c, aqi, hori, reason)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(trip.id)
            .bind(i as i32)
            .bind(segment.lon)
            .bind(segment.lat)
            .bind(&segment.ts)
            .bind(segment.temp_c)
            .bind(segment.aqi)
            .bind(segment.hori)
            .bind(segment.reason.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Trip saved: {} segments (ID: {})",
            new.segments.len(),
            trip.id
        );
        Ok(trip)
    }

    /// Get recent trips, newest first, without segments
    pub async fn list_trips(&self, limit: i64) -> Result<Vec<Trip>, DatabaseError> {
        let trips = sqlx::query_as::<_, Trip>(
            "SELECT * FROM trips ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        tracing::info!("Retrieved {} trips", trips.len());
        Ok(trips)
    }

    /// Get one trip with its segments in travel order
    pub async fn get_trip(&self, id: i32) -> Result<TripDetail, DatabaseError> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DatabaseError::NotFound(id))?;

        let segments = sqlx::query_as::<_, TripSegment>(
            "SELECT * FROM segments WHERE trip_id = $1 ORDER BY idx",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(TripDetail { trip, segments })
    }
}
