//! SQLite-backed hotel data stores.
//!
//! One `Db` handle owns the database path; each entity module adds its
//! queries in an `impl Db` block. Connections are opened per call, the
//! schema is created idempotently at startup.

pub mod bookings;
pub mod guests;
pub mod reports;
pub mod room_types;
pub mod rooms;
pub mod services;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

#[derive(Clone)]
pub struct Db {
    db_path: String,
}

impl Db {
    /// Open the hotel database and create any missing tables.
    pub fn new(db_path: &str) -> Result<Self> {
        let db = Self {
            db_path: db_path.to_string(),
        };
        db.init_schema()?;
        Ok(db)
    }

    pub(crate) fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path).context("Failed to open hotel database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS room_types (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                base_occupancy INTEGER NOT NULL,
                max_occupancy INTEGER NOT NULL,
                base_rate REAL NOT NULL,
                hour_rate REAL NOT NULL,
                extra_adult_fee REAL NOT NULL DEFAULT 0,
                extra_child_fee REAL NOT NULL DEFAULT 0,
                description TEXT,
                created_at TEXT NOT NULL,
                created_by INTEGER,
                updated_at TEXT,
                updated_by INTEGER
            );
            CREATE INDEX IF NOT EXISTS ix_room_types_code ON room_types(code);
            CREATE INDEX IF NOT EXISTS ix_room_types_name ON room_types(name);

            CREATE TABLE IF NOT EXISTS rooms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                room_type_id INTEGER NOT NULL REFERENCES room_types(id),
                description TEXT,
                status TEXT NOT NULL DEFAULT 'Available',
                housekeeping_status TEXT NOT NULL DEFAULT 'Clean',
                created_at TEXT NOT NULL,
                created_by INTEGER,
                updated_at TEXT,
                updated_by INTEGER
            );
            CREATE INDEX IF NOT EXISTS ix_rooms_name ON rooms(name);
            CREATE INDEX IF NOT EXISTS ix_rooms_room_type_id ON rooms(room_type_id);
            CREATE INDEX IF NOT EXISTS ix_rooms_status ON rooms(status);
            CREATE INDEX IF NOT EXISTS ix_rooms_housekeeping_status ON rooms(housekeeping_status);

            CREATE TABLE IF NOT EXISTS guests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                gender TEXT,
                date_of_birth TEXT,
                nationality TEXT,
                phone TEXT,
                email TEXT,
                address TEXT,
                description TEXT,
                created_at TEXT NOT NULL,
                created_by INTEGER,
                updated_at TEXT,
                updated_by INTEGER
            );
            CREATE INDEX IF NOT EXISTS ix_guests_name ON guests(name);
            CREATE INDEX IF NOT EXISTS ix_guests_phone ON guests(phone);
            CREATE INDEX IF NOT EXISTS ix_guests_email ON guests(email);
            CREATE INDEX IF NOT EXISTS ix_guests_nationality ON guests(nationality);

            CREATE TABLE IF NOT EXISTS services (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                unit TEXT NOT NULL,
                price REAL NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'Active',
                created_at TEXT NOT NULL,
                created_by INTEGER,
                updated_at TEXT,
                updated_by INTEGER
            );
            CREATE INDEX IF NOT EXISTS ix_services_name ON services(name);
            CREATE INDEX IF NOT EXISTS ix_services_status ON services(status);

            CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                booking_no TEXT UNIQUE NOT NULL,
                charge_type TEXT NOT NULL,
                checkin TEXT NOT NULL,
                checkout TEXT,
                room_id INTEGER NOT NULL REFERENCES rooms(id),
                room_type_id INTEGER NOT NULL REFERENCES room_types(id),
                primary_guest_id INTEGER REFERENCES guests(id),
                num_adults INTEGER NOT NULL DEFAULT 1,
                num_children INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'Reserved',
                payment_status TEXT NOT NULL DEFAULT 'Unpaid',
                notes TEXT,
                created_at TEXT NOT NULL,
                created_by INTEGER,
                updated_at TEXT,
                updated_by INTEGER,
                CHECK (checkout IS NULL OR checkout >= checkin),
                CHECK (num_adults + num_children > 0)
            );
            CREATE INDEX IF NOT EXISTS ix_bookings_booking_no ON bookings(booking_no);
            CREATE INDEX IF NOT EXISTS ix_bookings_room_id ON bookings(room_id);
            CREATE INDEX IF NOT EXISTS ix_bookings_guest_id ON bookings(primary_guest_id);
            CREATE INDEX IF NOT EXISTS ix_bookings_checkin ON bookings(checkin);
            CREATE INDEX IF NOT EXISTS ix_bookings_status ON bookings(status);

            CREATE TABLE IF NOT EXISTS booking_details (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                booking_id INTEGER NOT NULL REFERENCES bookings(id) ON DELETE CASCADE,
                detail_type TEXT NOT NULL,
                service_id INTEGER REFERENCES services(id),
                issued_at TEXT NOT NULL,
                description TEXT,
                quantity REAL NOT NULL DEFAULT 1,
                unit_price REAL NOT NULL DEFAULT 0,
                discount_amount REAL NOT NULL DEFAULT 0,
                amount REAL NOT NULL,
                created_at TEXT NOT NULL,
                created_by INTEGER,
                CHECK (detail_type <> 'Service' OR service_id IS NOT NULL)
            );
            CREATE INDEX IF NOT EXISTS ix_booking_details_booking_id ON booking_details(booking_id);
            CREATE INDEX IF NOT EXISTS ix_booking_details_type ON booking_details(detail_type);
            CREATE INDEX IF NOT EXISTS ix_booking_details_service_id ON booking_details(service_id);

            CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                booking_id INTEGER NOT NULL REFERENCES bookings(id) ON DELETE CASCADE,
                paid_at TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                reference_no TEXT,
                amount REAL NOT NULL,
                payer_name TEXT,
                notes TEXT,
                created_at TEXT NOT NULL,
                created_by INTEGER
            );
            CREATE INDEX IF NOT EXISTS ix_payments_booking_id ON payments(booking_id);
            CREATE INDEX IF NOT EXISTS ix_payments_paid_at ON payments(paid_at);",
        )
        .context("Failed to initialize hotel schema")?;

        Ok(())
    }
}

/// Format a timestamp for storage. Fixed-width UTC so string comparison in
/// SQL matches chronological order.
pub(crate) fn to_db(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn now_db() -> String {
    to_db(&Utc::now())
}

pub(crate) fn parse_ts(raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn parse_opt_ts(raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(parse_ts).transpose()
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_schema_init_is_idempotent() {
        let (_db, temp) = test_support::test_db();
        // A second handle over the same file re-runs the DDL.
        let again = Db::new(temp.path().to_str().unwrap());
        assert!(again.is_ok());
    }

    #[test]
    fn test_timestamp_round_trip() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        let stored = to_db(&dt);
        assert_eq!(stored, "2025-03-14T15:09:26Z");

        let parsed = parse_ts(stored).unwrap();
        assert_eq!(parsed, dt);
    }

    #[test]
    fn test_timestamp_ordering_is_lexicographic() {
        let early = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 3, 14, 21, 0, 0).unwrap();
        assert!(to_db(&early) < to_db(&late));
    }
}
