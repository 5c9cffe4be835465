//! Room store: inventory, status and availability search.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::{now_db, to_db, Db};
use crate::models::{AvailableRoom, HousekeepingStatus, Room, RoomStatus};

#[derive(Debug, Clone)]
pub struct RoomInput {
    pub name: String,
    pub room_type_id: i64,
    pub description: Option<String>,
}

/// Optional filters for the room listing.
#[derive(Debug, Default, Clone)]
pub struct RoomFilters {
    pub name: Option<String>,
    pub room_type_id: Option<i64>,
    pub status: Option<RoomStatus>,
    pub housekeeping_status: Option<HousekeepingStatus>,
}

/// Availability search parameters. With no window given the search runs
/// from now, open-ended.
#[derive(Debug, Default, Clone)]
pub struct AvailabilityQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub room_id: Option<i64>,
    pub room_type_id: Option<i64>,
    pub occupancy: Option<i64>,
    pub min_base_rate: Option<f64>,
    pub max_base_rate: Option<f64>,
}

const COLUMNS: &str = "id, name, room_type_id, description, status, housekeeping_status, \
     created_at, created_by, updated_at, updated_by";

fn map_room(row: &Row<'_>) -> rusqlite::Result<Room> {
    let status_str: String = row.get(4)?;
    let hk_str: String = row.get(5)?;
    Ok(Room {
        id: row.get(0)?,
        name: row.get(1)?,
        room_type_id: row.get(2)?,
        description: row.get(3)?,
        status: RoomStatus::from_str(&status_str).unwrap_or(RoomStatus::OutOfService),
        housekeeping_status: HousekeepingStatus::from_str(&hk_str)
            .unwrap_or(HousekeepingStatus::OutOfOrder),
        created_at: row.get(6)?,
        created_by: row.get(7)?,
        updated_at: row.get(8)?,
        updated_by: row.get(9)?,
    })
}

fn filter_clause(filters: &RoomFilters) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(name) = &filters.name {
        conditions.push("name LIKE ?");
        values.push(Box::new(format!("%{}%", name)));
    }
    if let Some(room_type_id) = filters.room_type_id {
        conditions.push("room_type_id = ?");
        values.push(Box::new(room_type_id));
    }
    if let Some(status) = filters.status {
        conditions.push("status = ?");
        values.push(Box::new(status.as_str().to_string()));
    }
    if let Some(hk) = filters.housekeeping_status {
        conditions.push("housekeeping_status = ?");
        values.push(Box::new(hk.as_str().to_string()));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    (clause, values)
}

impl Db {
    pub fn count_rooms(&self, filters: &RoomFilters) -> Result<i64> {
        let conn = self.open()?;
        let (clause, values) = filter_clause(filters);
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM rooms{}", clause),
            refs.as_slice(),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn list_rooms(&self, filters: &RoomFilters, skip: i64, limit: i64) -> Result<Vec<Room>> {
        let conn = self.open()?;
        let (clause, mut values) = filter_clause(filters);
        values.push(Box::new(limit));
        values.push(Box::new(skip));
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let sql = format!(
            "SELECT {} FROM rooms{} ORDER BY name LIMIT ? OFFSET ?",
            COLUMNS, clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rooms = stmt
            .query_map(refs.as_slice(), map_room)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rooms)
    }

    pub fn get_room(&self, id: i64) -> Result<Option<Room>> {
        let conn = self.open()?;
        let room = conn
            .query_row(
                &format!("SELECT {} FROM rooms WHERE id = ?1", COLUMNS),
                params![id],
                map_room,
            )
            .optional()?;
        Ok(room)
    }

    pub fn get_room_by_name(&self, name: &str) -> Result<Option<Room>> {
        let conn = self.open()?;
        let room = conn
            .query_row(
                &format!("SELECT {} FROM rooms WHERE name = ?1", COLUMNS),
                params![name],
                map_room,
            )
            .optional()?;
        Ok(room)
    }

    pub fn create_room(&self, input: &RoomInput, created_by: i64) -> Result<Room> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO rooms (name, room_type_id, description, status, housekeeping_status,
                 created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                input.name,
                input.room_type_id,
                input.description,
                RoomStatus::Available.as_str(),
                HousekeepingStatus::Clean.as_str(),
                now_db(),
                created_by,
            ],
        )
        .context("Failed to insert room")?;

        let id = conn.last_insert_rowid();
        self.get_room(id)?
            .context("Room vanished immediately after insert")
    }

    pub fn update_room(&self, id: i64, input: &RoomInput, updated_by: i64) -> Result<Option<Room>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE rooms SET name = ?1, room_type_id = ?2, description = ?3,
                 updated_at = ?4, updated_by = ?5
             WHERE id = ?6",
            params![
                input.name,
                input.room_type_id,
                input.description,
                now_db(),
                updated_by,
                id,
            ],
        )
        .context("Failed to update room")?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_room(id)
    }

    pub fn set_room_status(
        &self,
        id: i64,
        status: RoomStatus,
        updated_by: i64,
    ) -> Result<Option<Room>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE rooms SET status = ?1, updated_at = ?2, updated_by = ?3 WHERE id = ?4",
            params![status.as_str(), now_db(), updated_by, id],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_room(id)
    }

    pub fn set_housekeeping_status(
        &self,
        id: i64,
        status: HousekeepingStatus,
        updated_by: i64,
    ) -> Result<Option<Room>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE rooms SET housekeeping_status = ?1, updated_at = ?2, updated_by = ?3
             WHERE id = ?4",
            params![status.as_str(), now_db(), updated_by, id],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_room(id)
    }

    pub fn delete_room(&self, id: i64) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM rooms WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Number of bookings referencing a room; deletion is refused while
    /// this is non-zero.
    pub fn count_bookings_for_room(&self, room_id: i64) -> Result<i64> {
        let conn = self.open()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE room_id = ?1",
            params![room_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Rooms free in the given window, joined with their type so the
    /// front desk can quote rates directly.
    pub fn available_rooms(&self, query: &AvailabilityQuery) -> Result<Vec<AvailableRoom>> {
        let conn = self.open()?;

        let from = query.from.unwrap_or_else(Utc::now);
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(room_id) = query.room_id {
            conditions.push("r.id = ?".to_string());
            values.push(Box::new(room_id));
        }
        if let Some(room_type_id) = query.room_type_id {
            conditions.push("r.room_type_id = ?".to_string());
            values.push(Box::new(room_type_id));
        }
        if let Some(occupancy) = query.occupancy {
            conditions.push("rt.max_occupancy >= ?".to_string());
            values.push(Box::new(occupancy));
        }
        if let Some(min_rate) = query.min_base_rate {
            conditions.push("rt.base_rate >= ?".to_string());
            values.push(Box::new(min_rate));
        }
        if let Some(max_rate) = query.max_base_rate {
            conditions.push("rt.base_rate <= ?".to_string());
            values.push(Box::new(max_rate));
        }

        // A room conflicts when an open booking overlaps the window.
        let overlap = match query.to {
            Some(to) => {
                values.push(Box::new(to_db(&to)));
                values.push(Box::new(to_db(&from)));
                "b.checkin < ? AND (b.checkout IS NULL OR b.checkout > ?)"
            }
            None => {
                values.push(Box::new(to_db(&from)));
                "(b.checkout IS NULL OR b.checkout > ?)"
            }
        };

        let extra = if conditions.is_empty() {
            String::new()
        } else {
            format!(" AND {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT r.id, r.name, r.room_type_id, rt.name, rt.base_rate, rt.hour_rate,
                    rt.base_occupancy, rt.max_occupancy, r.housekeeping_status
             FROM rooms r
             JOIN room_types rt ON r.room_type_id = rt.id
             WHERE r.status != 'OutOfService'{}
               AND NOT EXISTS (
                   SELECT 1 FROM bookings b
                   WHERE b.room_id = r.id
                     AND b.status IN ('Reserved', 'CheckedIn')
                     AND {}
               )
             ORDER BY r.name",
            extra, overlap
        );

        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rooms = stmt
            .query_map(refs.as_slice(), |row| {
                let hk_str: String = row.get(8)?;
                Ok(AvailableRoom {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    room_type_id: row.get(2)?,
                    room_type_name: row.get(3)?,
                    base_rate: row.get(4)?,
                    hour_rate: row.get(5)?,
                    base_occupancy: row.get(6)?,
                    max_occupancy: row.get(7)?,
                    housekeeping_status: HousekeepingStatus::from_str(&hk_str)
                        .unwrap_or(HousekeepingStatus::OutOfOrder),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rooms)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{seed_room_type, test_db};
    use super::*;

    fn room_input(name: &str, room_type_id: i64) -> RoomInput {
        RoomInput {
            name: name.to_string(),
            room_type_id,
            description: None,
        }
    }

    #[test]
    fn test_create_list_filter() {
        let (db, _temp) = test_db();
        let rt = seed_room_type(&db, "STD");

        db.create_room(&room_input("101", rt.id), 1).unwrap();
        db.create_room(&room_input("102", rt.id), 1).unwrap();
        db.create_room(&room_input("201", rt.id), 1).unwrap();

        let all = db.list_rooms(&RoomFilters::default(), 0, 50).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(db.count_rooms(&RoomFilters::default()).unwrap(), 3);

        let filters = RoomFilters {
            name: Some("10".to_string()),
            ..Default::default()
        };
        let floor1 = db.list_rooms(&filters, 0, 50).unwrap();
        assert_eq!(floor1.len(), 2);
        assert_eq!(db.count_rooms(&filters).unwrap(), 2);
    }

    #[test]
    fn test_room_name_unique() {
        let (db, _temp) = test_db();
        let rt = seed_room_type(&db, "STD");

        db.create_room(&room_input("101", rt.id), 1).unwrap();
        assert!(db.create_room(&room_input("101", rt.id), 1).is_err());
    }

    #[test]
    fn test_status_updates() {
        let (db, _temp) = test_db();
        let rt = seed_room_type(&db, "STD");
        let room = db.create_room(&room_input("101", rt.id), 1).unwrap();

        assert_eq!(room.status, RoomStatus::Available);
        assert_eq!(room.housekeeping_status, HousekeepingStatus::Clean);

        let updated = db
            .set_room_status(room.id, RoomStatus::Occupied, 1)
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, RoomStatus::Occupied);

        let updated = db
            .set_housekeeping_status(room.id, HousekeepingStatus::Dirty, 1)
            .unwrap()
            .unwrap();
        assert_eq!(updated.housekeeping_status, HousekeepingStatus::Dirty);

        assert!(db.set_room_status(9999, RoomStatus::Occupied, 1).unwrap().is_none());
    }

    #[test]
    fn test_availability_excludes_out_of_service() {
        let (db, _temp) = test_db();
        let rt = seed_room_type(&db, "STD");
        let ok = db.create_room(&room_input("101", rt.id), 1).unwrap();
        let broken = db.create_room(&room_input("102", rt.id), 1).unwrap();
        db.set_room_status(broken.id, RoomStatus::OutOfService, 1)
            .unwrap();

        let available = db.available_rooms(&AvailabilityQuery::default()).unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, ok.id);
        assert_eq!(available[0].room_type_name, rt.name);
    }

    #[test]
    fn test_availability_occupancy_filter() {
        let (db, _temp) = test_db();
        let rt = seed_room_type(&db, "STD"); // max_occupancy 4
        db.create_room(&room_input("101", rt.id), 1).unwrap();

        let query = AvailabilityQuery {
            occupancy: Some(5),
            ..Default::default()
        };
        assert!(db.available_rooms(&query).unwrap().is_empty());

        let query = AvailabilityQuery {
            occupancy: Some(4),
            ..Default::default()
        };
        assert_eq!(db.available_rooms(&query).unwrap().len(), 1);
    }
}
