use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use transit_map::models::{Marker, MarkerPatch, NewMarker};
use uuid::Uuid;

const CREATE_MARKERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS markers (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    color TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

#[derive(sqlx::FromRow)]
struct MarkerRow {
    id: String,
    title: String,
    description: Option<String>,
    latitude: f64,
    longitude: f64,
    color: String,
    created_at: DateTime<Utc>,
}

impl From<MarkerRow> for Marker {
    fn from(row: MarkerRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            latitude: row.latitude,
            longitude: row.longitude,
            color: row.color,
            created_at: row.created_at,
        }
    }
}

/// Persistent marker collection. Callers validate payloads before writing.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    pool: SqlitePool,
}

impl MarkerStore {
    /// Open the database at `url` and make sure the schema exists
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new().connect(url).await?;
        Self::from_pool(pool).await
    }

    /// Single-connection in-memory database; every connection would otherwise get
    /// its own empty database
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(CREATE_MARKERS_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Every marker in insertion order
    pub async fn list(&self) -> Result<Vec<Marker>, sqlx::Error> {
        let rows: Vec<MarkerRow> = sqlx::query_as(
            r"
            SELECT id, title, description, latitude, longitude, color, created_at
            FROM markers
            ORDER BY created_at, rowid
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Marker::from).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Marker>, sqlx::Error> {
        let row: Option<MarkerRow> = sqlx::query_as(
            r"
            SELECT id, title, description, latitude, longitude, color, created_at
            FROM markers
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Marker::from))
    }

    /// Insert with a fresh id and the current time
    pub async fn create(&self, new: NewMarker) -> Result<Marker, sqlx::Error> {
        let marker = Marker {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            latitude: new.latitude,
            longitude: new.longitude,
            color: new.color,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO markers (id, title, description, latitude, longitude, color, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&marker.id)
        .bind(&marker.title)
        .bind(&marker.description)
        .bind(marker.latitude)
        .bind(marker.longitude)
        .bind(&marker.color)
        .bind(marker.created_at)
        .execute(&self.pool)
        .await?;

        Ok(marker)
    }

    /// Apply `patch` to the stored marker. `None` when no marker has that id.
    pub async fn update(&self, id: &str, patch: MarkerPatch) -> Result<Option<Marker>, sqlx::Error> {
        let Some(mut marker) = self.get(id).await? else {
            return Ok(None);
        };
        patch.apply_to(&mut marker);

        sqlx::query(
            r"
            UPDATE markers
            SET title = ?, description = ?, latitude = ?, longitude = ?, color = ?
            WHERE id = ?
            ",
        )
        .bind(&marker.title)
        .bind(&marker.description)
        .bind(marker.latitude)
        .bind(marker.longitude)
        .bind(&marker.color)
        .bind(&marker.id)
        .execute(&self.pool)
        .await?;

        Ok(Some(marker))
    }

    /// `false` when no marker had that id
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM markers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
