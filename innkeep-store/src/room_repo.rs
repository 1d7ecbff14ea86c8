use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use innkeep_core::models::Room;
use innkeep_core::repository::{RoomRepository, RoomSearchFilter};
use innkeep_core::CoreResult;

use crate::storage_err;

pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    name: String,
    description: String,
    room_type: String,
    price_cents: i64,
    capacity: i32,
    size_sqm: i32,
    is_available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        Room {
            id: row.id,
            name: row.name,
            description: row.description,
            room_type: row.room_type,
            price_cents: row.price_cents,
            capacity: row.capacity,
            size_sqm: row.size_sqm,
            is_available: row.is_available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ROOM_COLUMNS: &str = "id, name, description, room_type, price_cents, capacity, size_sqm, is_available, created_at, updated_at";

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn insert_room(&self, room: &Room) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rooms (id, name, description, room_type, price_cents, capacity, size_sqm, is_available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                room_type = EXCLUDED.room_type,
                price_cents = EXCLUDED.price_cents,
                capacity = EXCLUDED.capacity,
                size_sqm = EXCLUDED.size_sqm,
                is_available = EXCLUDED.is_available,
                updated_at = NOW()
            "#,
        )
        .bind(room.id)
        .bind(&room.name)
        .bind(&room.description)
        .bind(&room.room_type)
        .bind(room.price_cents)
        .bind(room.capacity)
        .bind(room.size_sqm)
        .bind(room.is_available)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn get_room(&self, id: Uuid) -> CoreResult<Option<Room>> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(row.map(Room::from))
    }

    async fn list_available(&self) -> CoreResult<Vec<Room>> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE is_available ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(rows.into_iter().map(Room::from).collect())
    }

    async fn list_all(&self) -> CoreResult<Vec<Room>> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(rows.into_iter().map(Room::from).collect())
    }

    async fn search(&self, filter: &RoomSearchFilter) -> CoreResult<Vec<Room>> {
        let term = filter.term.as_ref().map(|t| format!("%{t}%"));
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            r#"
            SELECT {ROOM_COLUMNS} FROM rooms
            WHERE is_available
              AND ($1::TEXT IS NULL OR name ILIKE $1 OR description ILIKE $1)
              AND ($2::TEXT IS NULL OR room_type = $2)
              AND ($3::BIGINT IS NULL OR price_cents >= $3)
              AND ($4::BIGINT IS NULL OR price_cents <= $4)
            ORDER BY name
            "#
        ))
        .bind(term)
        .bind(&filter.room_type)
        .bind(filter.min_price_cents)
        .bind(filter.max_price_cents)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(rows.into_iter().map(Room::from).collect())
    }

    async fn count_rooms(&self) -> CoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rooms")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)
    }
}
