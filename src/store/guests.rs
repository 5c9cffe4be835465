//! Guest store.

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::{now_db, Db};
use crate::models::{Gender, Guest};

#[derive(Debug, Clone, Default)]
pub struct GuestInput {
    pub name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GuestFilters {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub nationality: Option<String>,
}

const COLUMNS: &str = "id, name, gender, date_of_birth, nationality, phone, email, address, \
     description, created_at, created_by, updated_at, updated_by";

fn map_guest(row: &Row<'_>) -> rusqlite::Result<Guest> {
    let gender_str: Option<String> = row.get(2)?;
    Ok(Guest {
        id: row.get(0)?,
        name: row.get(1)?,
        gender: gender_str.as_deref().and_then(Gender::from_str),
        date_of_birth: row.get(3)?,
        nationality: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        address: row.get(7)?,
        description: row.get(8)?,
        created_at: row.get(9)?,
        created_by: row.get(10)?,
        updated_at: row.get(11)?,
        updated_by: row.get(12)?,
    })
}

fn filter_clause(filters: &GuestFilters) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(name) = &filters.name {
        conditions.push("name LIKE ?");
        values.push(Box::new(format!("%{}%", name)));
    }
    if let Some(phone) = &filters.phone {
        conditions.push("phone LIKE ?");
        values.push(Box::new(format!("%{}%", phone)));
    }
    if let Some(nationality) = &filters.nationality {
        conditions.push("nationality = ?");
        values.push(Box::new(nationality.clone()));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    (clause, values)
}

impl Db {
    pub fn count_guests(&self, filters: &GuestFilters) -> Result<i64> {
        let conn = self.open()?;
        let (clause, values) = filter_clause(filters);
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM guests{}", clause),
            refs.as_slice(),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn list_guests(&self, filters: &GuestFilters, skip: i64, limit: i64) -> Result<Vec<Guest>> {
        let conn = self.open()?;
        let (clause, mut values) = filter_clause(filters);
        values.push(Box::new(limit));
        values.push(Box::new(skip));
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let sql = format!(
            "SELECT {} FROM guests{} ORDER BY name LIMIT ? OFFSET ?",
            COLUMNS, clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let guests = stmt
            .query_map(refs.as_slice(), map_guest)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(guests)
    }

    pub fn get_guest(&self, id: i64) -> Result<Option<Guest>> {
        let conn = self.open()?;
        let guest = conn
            .query_row(
                &format!("SELECT {} FROM guests WHERE id = ?1", COLUMNS),
                params![id],
                map_guest,
            )
            .optional()?;
        Ok(guest)
    }

    pub fn create_guest(&self, input: &GuestInput, created_by: i64) -> Result<Guest> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO guests (name, gender, date_of_birth, nationality, phone, email,
                 address, description, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                input.name,
                input.gender.map(|g| g.as_str().to_string()),
                input.date_of_birth,
                input.nationality,
                input.phone,
                input.email,
                input.address,
                input.description,
                now_db(),
                created_by,
            ],
        )
        .context("Failed to insert guest")?;

        let id = conn.last_insert_rowid();
        self.get_guest(id)?
            .context("Guest vanished immediately after insert")
    }

    pub fn update_guest(
        &self,
        id: i64,
        input: &GuestInput,
        updated_by: i64,
    ) -> Result<Option<Guest>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE guests SET name = ?1, gender = ?2, date_of_birth = ?3, nationality = ?4,
                 phone = ?5, email = ?6, address = ?7, description = ?8,
                 updated_at = ?9, updated_by = ?10
             WHERE id = ?11",
            params![
                input.name,
                input.gender.map(|g| g.as_str().to_string()),
                input.date_of_birth,
                input.nationality,
                input.phone,
                input.email,
                input.address,
                input.description,
                now_db(),
                updated_by,
                id,
            ],
        )
        .context("Failed to update guest")?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_guest(id)
    }

    pub fn search_guests_by_name(&self, name: &str) -> Result<Vec<Guest>> {
        let filters = GuestFilters {
            name: Some(name.to_string()),
            ..Default::default()
        };
        self.list_guests(&filters, 0, 100)
    }

    pub fn search_guests_by_phone(&self, phone: &str) -> Result<Vec<Guest>> {
        let filters = GuestFilters {
            phone: Some(phone.to_string()),
            ..Default::default()
        };
        self.list_guests(&filters, 0, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_db;
    use super::*;

    fn guest_input(name: &str, phone: &str) -> GuestInput {
        GuestInput {
            name: name.to_string(),
            gender: Some(Gender::Female),
            phone: Some(phone.to_string()),
            nationality: Some("Vietnam".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_and_get() {
        let (db, _temp) = test_db();

        let created = db.create_guest(&guest_input("Lan Pham", "0901"), 1).unwrap();
        let fetched = db.get_guest(created.id).unwrap().unwrap();

        assert_eq!(fetched.name, "Lan Pham");
        assert_eq!(fetched.gender, Some(Gender::Female));
        assert_eq!(fetched.phone.as_deref(), Some("0901"));
    }

    #[test]
    fn test_search_by_name_and_phone() {
        let (db, _temp) = test_db();

        db.create_guest(&guest_input("Lan Pham", "0901234"), 1).unwrap();
        db.create_guest(&guest_input("Minh Tran", "0909999"), 1).unwrap();

        let by_name = db.search_guests_by_name("Lan").unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Lan Pham");

        let by_phone = db.search_guests_by_phone("0909").unwrap();
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].name, "Minh Tran");
    }

    #[test]
    fn test_nationality_filter_and_count() {
        let (db, _temp) = test_db();

        db.create_guest(&guest_input("Lan Pham", "0901"), 1).unwrap();
        let mut foreign = guest_input("John Doe", "0777");
        foreign.nationality = Some("Australia".to_string());
        db.create_guest(&foreign, 1).unwrap();

        let filters = GuestFilters {
            nationality: Some("Vietnam".to_string()),
            ..Default::default()
        };
        assert_eq!(db.count_guests(&filters).unwrap(), 1);
        assert_eq!(db.count_guests(&GuestFilters::default()).unwrap(), 2);
    }

    #[test]
    fn test_update() {
        let (db, _temp) = test_db();

        let created = db.create_guest(&guest_input("Lan Pham", "0901"), 1).unwrap();
        let mut input = guest_input("Lan Pham", "0902");
        input.email = Some("lan@example.com".to_string());

        let updated = db.update_guest(created.id, &input, 2).unwrap().unwrap();
        assert_eq!(updated.phone.as_deref(), Some("0902"));
        assert_eq!(updated.email.as_deref(), Some("lan@example.com"));
        assert_eq!(updated.updated_by, Some(2));

        assert!(db.update_guest(9999, &input, 2).unwrap().is_none());
    }
}
