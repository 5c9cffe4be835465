//! Service catalog store: laundry, minibar, airport shuttle and friends.

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use super::{now_db, Db};
use crate::models::{Service, ServiceStatus};

#[derive(Debug, Clone)]
pub struct ServiceInput {
    pub name: String,
    pub unit: String,
    pub price: f64,
    pub description: Option<String>,
    pub status: ServiceStatus,
}

const COLUMNS: &str =
    "id, name, unit, price, description, status, created_at, created_by, updated_at, updated_by";

fn map_service(row: &Row<'_>) -> rusqlite::Result<Service> {
    let status_str: String = row.get(5)?;
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        unit: row.get(2)?,
        price: row.get(3)?,
        description: row.get(4)?,
        status: ServiceStatus::from_str(&status_str).unwrap_or(ServiceStatus::Inactive),
        created_at: row.get(6)?,
        created_by: row.get(7)?,
        updated_at: row.get(8)?,
        updated_by: row.get(9)?,
    })
}

impl Db {
    pub fn count_services(&self, status: Option<ServiceStatus>) -> Result<i64> {
        let conn = self.open()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM services WHERE (?1 IS NULL OR status = ?1)",
            params![status.map(|s| s.as_str().to_string())],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn list_services(
        &self,
        status: Option<ServiceStatus>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Service>> {
        let conn = self.open()?;
        let sql = format!(
            "SELECT {} FROM services WHERE (?1 IS NULL OR status = ?1)
             ORDER BY name LIMIT ?2 OFFSET ?3",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let services = stmt
            .query_map(
                params![status.map(|s| s.as_str().to_string()), limit, skip],
                map_service,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(services)
    }

    pub fn get_service(&self, id: i64) -> Result<Option<Service>> {
        let conn = self.open()?;
        let service = conn
            .query_row(
                &format!("SELECT {} FROM services WHERE id = ?1", COLUMNS),
                params![id],
                map_service,
            )
            .optional()?;
        Ok(service)
    }

    pub fn create_service(&self, input: &ServiceInput, created_by: i64) -> Result<Service> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO services (name, unit, price, description, status, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                input.name,
                input.unit,
                input.price,
                input.description,
                input.status.as_str(),
                now_db(),
                created_by,
            ],
        )
        .context("Failed to insert service")?;

        let id = conn.last_insert_rowid();
        self.get_service(id)?
            .context("Service vanished immediately after insert")
    }

    pub fn update_service(
        &self,
        id: i64,
        input: &ServiceInput,
        updated_by: i64,
    ) -> Result<Option<Service>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE services SET name = ?1, unit = ?2, price = ?3, description = ?4,
                 status = ?5, updated_at = ?6, updated_by = ?7
             WHERE id = ?8",
            params![
                input.name,
                input.unit,
                input.price,
                input.description,
                input.status.as_str(),
                now_db(),
                updated_by,
                id,
            ],
        )
        .context("Failed to update service")?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_service(id)
    }

    /// Re-price without touching the rest of the record.
    pub fn change_service_price(
        &self,
        id: i64,
        price: f64,
        updated_by: i64,
    ) -> Result<Option<Service>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE services SET price = ?1, updated_at = ?2, updated_by = ?3 WHERE id = ?4",
            params![price, now_db(), updated_by, id],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_service(id)
    }

    pub fn delete_service(&self, id: i64) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Folio lines referencing a service; deletion is refused while this
    /// is non-zero.
    pub fn count_details_for_service(&self, service_id: i64) -> Result<i64> {
        let conn = self.open()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM booking_details WHERE service_id = ?1",
            params![service_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
