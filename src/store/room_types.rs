//! Room type store: categories, rates and occupancy limits.

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use super::{now_db, Db};
use crate::models::RoomType;

/// Fields accepted when creating or updating a room type.
#[derive(Debug, Clone)]
pub struct RoomTypeInput {
    pub code: String,
    pub name: String,
    pub base_occupancy: i64,
    pub max_occupancy: i64,
    pub base_rate: f64,
    pub hour_rate: f64,
    pub extra_adult_fee: f64,
    pub extra_child_fee: f64,
    pub description: Option<String>,
}

const COLUMNS: &str = "id, code, name, base_occupancy, max_occupancy, base_rate, hour_rate, \
     extra_adult_fee, extra_child_fee, description, created_at, created_by, updated_at, updated_by";

fn map_room_type(row: &Row<'_>) -> rusqlite::Result<RoomType> {
    Ok(RoomType {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        base_occupancy: row.get(3)?,
        max_occupancy: row.get(4)?,
        base_rate: row.get(5)?,
        hour_rate: row.get(6)?,
        extra_adult_fee: row.get(7)?,
        extra_child_fee: row.get(8)?,
        description: row.get(9)?,
        created_at: row.get(10)?,
        created_by: row.get(11)?,
        updated_at: row.get(12)?,
        updated_by: row.get(13)?,
    })
}

impl Db {
    pub fn list_room_types(&self) -> Result<Vec<RoomType>> {
        let conn = self.open()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM room_types ORDER BY code", COLUMNS))?;
        let room_types = stmt
            .query_map([], map_room_type)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(room_types)
    }

    pub fn get_room_type(&self, id: i64) -> Result<Option<RoomType>> {
        let conn = self.open()?;
        let room_type = conn
            .query_row(
                &format!("SELECT {} FROM room_types WHERE id = ?1", COLUMNS),
                params![id],
                map_room_type,
            )
            .optional()?;
        Ok(room_type)
    }

    pub fn get_room_type_by_code(&self, code: &str) -> Result<Option<RoomType>> {
        let conn = self.open()?;
        let room_type = conn
            .query_row(
                &format!("SELECT {} FROM room_types WHERE code = ?1", COLUMNS),
                params![code],
                map_room_type,
            )
            .optional()?;
        Ok(room_type)
    }

    pub fn create_room_type(&self, input: &RoomTypeInput, created_by: i64) -> Result<RoomType> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO room_types (code, name, base_occupancy, max_occupancy, base_rate,
                 hour_rate, extra_adult_fee, extra_child_fee, description, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                input.code,
                input.name,
                input.base_occupancy,
                input.max_occupancy,
                input.base_rate,
                input.hour_rate,
                input.extra_adult_fee,
                input.extra_child_fee,
                input.description,
                now_db(),
                created_by,
            ],
        )
        .context("Failed to insert room type")?;

        let id = conn.last_insert_rowid();
        self.get_room_type(id)?
            .context("Room type vanished immediately after insert")
    }

    pub fn update_room_type(
        &self,
        id: i64,
        input: &RoomTypeInput,
        updated_by: i64,
    ) -> Result<Option<RoomType>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE room_types SET code = ?1, name = ?2, base_occupancy = ?3,
                 max_occupancy = ?4, base_rate = ?5, hour_rate = ?6, extra_adult_fee = ?7,
                 extra_child_fee = ?8, description = ?9, updated_at = ?10, updated_by = ?11
             WHERE id = ?12",
            params![
                input.code,
                input.name,
                input.base_occupancy,
                input.max_occupancy,
                input.base_rate,
                input.hour_rate,
                input.extra_adult_fee,
                input.extra_child_fee,
                input.description,
                now_db(),
                updated_by,
                id,
            ],
        )
        .context("Failed to update room type")?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_room_type(id)
    }

    pub fn delete_room_type(&self, id: i64) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM room_types WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Number of rooms still referencing a type; deletion is refused while
    /// this is non-zero.
    pub fn count_rooms_of_type(&self, room_type_id: i64) -> Result<i64> {
        let conn = self.open()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM rooms WHERE room_type_id = ?1",
            params![room_type_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Bookings (historical included) still referencing a type.
    pub fn count_bookings_for_room_type(&self, room_type_id: i64) -> Result<i64> {
        let conn = self.open()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE room_type_id = ?1",
            params![room_type_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_db;
    use super::*;

    fn sample_input(code: &str) -> RoomTypeInput {
        RoomTypeInput {
            code: code.to_string(),
            name: format!("{} room", code),
            base_occupancy: 2,
            max_occupancy: 4,
            base_rate: 120.0,
            hour_rate: 25.0,
            extra_adult_fee: 30.0,
            extra_child_fee: 15.0,
            description: None,
        }
    }

    #[test]
    fn test_create_and_list() {
        let (db, _temp) = test_db();

        db.create_room_type(&sample_input("STD"), 1).unwrap();
        db.create_room_type(&sample_input("DLX"), 1).unwrap();

        let all = db.list_room_types().unwrap();
        assert_eq!(all.len(), 2);
        // Ordered by code
        assert_eq!(all[0].code, "DLX");
        assert_eq!(all[1].code, "STD");
    }

    #[test]
    fn test_code_unique() {
        let (db, _temp) = test_db();

        db.create_room_type(&sample_input("STD"), 1).unwrap();
        assert!(db.create_room_type(&sample_input("STD"), 1).is_err());
    }

    #[test]
    fn test_get_by_code() {
        let (db, _temp) = test_db();

        let created = db.create_room_type(&sample_input("STD"), 1).unwrap();
        let fetched = db.get_room_type_by_code("STD").unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert!(db.get_room_type_by_code("NOPE").unwrap().is_none());
    }

    #[test]
    fn test_update() {
        let (db, _temp) = test_db();

        let created = db.create_room_type(&sample_input("STD"), 1).unwrap();
        let mut input = sample_input("STD");
        input.base_rate = 150.0;

        let updated = db.update_room_type(created.id, &input, 2).unwrap().unwrap();
        assert_eq!(updated.base_rate, 150.0);
        assert_eq!(updated.updated_by, Some(2));

        assert!(db.update_room_type(9999, &input, 2).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let (db, _temp) = test_db();

        let created = db.create_room_type(&sample_input("STD"), 1).unwrap();
        assert!(db.delete_room_type(created.id).unwrap());
        assert!(!db.delete_room_type(created.id).unwrap());
        assert!(db.get_room_type(created.id).unwrap().is_none());
    }
}
