//! Booking store: reservations, the stay lifecycle, folio details and
//! payments.
//!
//! Checkin/checkout mutate the room as a side effect (Occupied on checkin,
//! Available + Dirty on checkout), and checkout settles any open balance,
//! both inside one transaction.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use super::{now_db, parse_opt_ts, parse_ts, to_db, Db};
use crate::models::{
    Booking, BookingDetail, BookingHistoryEntry, BookingStatus, ChargeType, DetailType, Payment,
    PaymentMethod, PaymentStatus, TodayBooking,
};

#[derive(Debug, Clone)]
pub struct BookingInput {
    pub charge_type: ChargeType,
    pub checkin: DateTime<Utc>,
    pub checkout: Option<DateTime<Utc>>,
    pub room_id: i64,
    pub room_type_id: i64,
    pub primary_guest_id: i64,
    pub num_adults: i64,
    pub num_children: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DetailInput {
    pub detail_type: DetailType,
    pub service_id: Option<i64>,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub discount_amount: f64,
}

impl DetailInput {
    /// Line amount; negative adjustments are allowed, so no clamping.
    pub fn amount(&self) -> f64 {
        self.quantity * self.unit_price - self.discount_amount
    }
}

#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub payment_method: PaymentMethod,
    pub reference_no: Option<String>,
    pub amount: f64,
    pub payer_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilters {
    pub booking_no: Option<String>,
    pub guest_name: Option<String>,
    pub room_id: Option<i64>,
    pub status: Option<BookingStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

const BOOKING_COLUMNS: &str = "id, booking_no, charge_type, checkin, checkout, room_id, \
     room_type_id, primary_guest_id, num_adults, num_children, status, payment_status, notes, \
     created_at, created_by, updated_at, updated_by";

fn map_booking(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let charge_str: String = row.get(2)?;
    let checkin_raw: String = row.get(3)?;
    let checkout_raw: Option<String> = row.get(4)?;
    let status_str: String = row.get(10)?;
    let payment_str: String = row.get(11)?;

    Ok(Booking {
        id: row.get(0)?,
        booking_no: row.get(1)?,
        charge_type: ChargeType::from_str(&charge_str).unwrap_or(ChargeType::Night),
        checkin: parse_ts(checkin_raw)?,
        checkout: parse_opt_ts(checkout_raw)?,
        room_id: row.get(5)?,
        room_type_id: row.get(6)?,
        primary_guest_id: row.get(7)?,
        num_adults: row.get(8)?,
        num_children: row.get(9)?,
        status: BookingStatus::from_str(&status_str).unwrap_or(BookingStatus::Cancelled),
        payment_status: PaymentStatus::from_str(&payment_str).unwrap_or(PaymentStatus::Unpaid),
        notes: row.get(12)?,
        created_at: row.get(13)?,
        created_by: row.get(14)?,
        updated_at: row.get(15)?,
        updated_by: row.get(16)?,
    })
}

fn map_detail(row: &Row<'_>) -> rusqlite::Result<BookingDetail> {
    let type_str: String = row.get(2)?;
    let issued_raw: String = row.get(4)?;
    Ok(BookingDetail {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        detail_type: DetailType::from_str(&type_str).unwrap_or(DetailType::Fee),
        service_id: row.get(3)?,
        issued_at: parse_ts(issued_raw)?,
        description: row.get(5)?,
        quantity: row.get(6)?,
        unit_price: row.get(7)?,
        discount_amount: row.get(8)?,
        amount: row.get(9)?,
        created_at: row.get(10)?,
        created_by: row.get(11)?,
    })
}

fn map_payment(row: &Row<'_>) -> rusqlite::Result<Payment> {
    let method_str: String = row.get(3)?;
    let paid_raw: String = row.get(2)?;
    Ok(Payment {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        paid_at: parse_ts(paid_raw)?,
        payment_method: PaymentMethod::from_str(&method_str).unwrap_or(PaymentMethod::Other),
        reference_no: row.get(4)?,
        amount: row.get(5)?,
        payer_name: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        created_by: row.get(9)?,
    })
}

/// Daily sequence number: BKGyymmddNNN.
fn next_booking_no(conn: &Connection) -> Result<String> {
    let prefix = format!("BKG{}", Utc::now().format("%y%m%d"));

    let max_no: Option<String> = conn.query_row(
        "SELECT MAX(booking_no) FROM bookings WHERE booking_no LIKE ?1",
        params![format!("{}%", prefix)],
        |row| row.get(0),
    )?;

    let seq = match max_no {
        Some(no) => no
            .get(no.len().saturating_sub(3)..)
            .and_then(|tail| tail.parse::<u32>().ok())
            .map(|n| n + 1)
            .context("Unparseable booking number in store")?,
        None => 1,
    };

    Ok(format!("{}{:03}", prefix, seq))
}

/// Charged vs paid totals decide Unpaid/Partial/Paid.
fn recompute_payment_status(conn: &Connection, booking_id: i64) -> Result<PaymentStatus> {
    let charged: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM booking_details WHERE booking_id = ?1",
        params![booking_id],
        |row| row.get(0),
    )?;
    let paid: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE booking_id = ?1",
        params![booking_id],
        |row| row.get(0),
    )?;

    let status = if paid <= 0.0 {
        PaymentStatus::Unpaid
    } else if paid + 1e-9 >= charged {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    };

    conn.execute(
        "UPDATE bookings SET payment_status = ?1 WHERE id = ?2",
        params![status.as_str(), booking_id],
    )?;

    Ok(status)
}

impl Db {
    pub fn get_booking(&self, id: i64) -> Result<Option<Booking>> {
        let conn = self.open()?;
        let booking = conn
            .query_row(
                &format!("SELECT {} FROM bookings WHERE id = ?1", BOOKING_COLUMNS),
                params![id],
                map_booking,
            )
            .optional()?;
        Ok(booking)
    }

    pub fn get_booking_by_no(&self, booking_no: &str) -> Result<Option<Booking>> {
        let conn = self.open()?;
        let booking = conn
            .query_row(
                &format!(
                    "SELECT {} FROM bookings WHERE booking_no = ?1",
                    BOOKING_COLUMNS
                ),
                params![booking_no],
                map_booking,
            )
            .optional()?;
        Ok(booking)
    }

    /// Whether an open booking already holds the room for an overlapping
    /// window. `exclude` skips the booking being edited.
    pub fn is_room_booked(
        &self,
        room_id: i64,
        checkin: DateTime<Utc>,
        checkout: Option<DateTime<Utc>>,
        exclude: Option<i64>,
    ) -> Result<bool> {
        let conn = self.open()?;

        let count: i64 = match checkout {
            Some(checkout) => conn.query_row(
                "SELECT COUNT(*) FROM bookings
                 WHERE room_id = ?1
                   AND status IN ('Reserved', 'CheckedIn')
                   AND (?2 IS NULL OR id != ?2)
                   AND checkin < ?3
                   AND (checkout IS NULL OR checkout > ?4)",
                params![room_id, exclude, to_db(&checkout), to_db(&checkin)],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM bookings
                 WHERE room_id = ?1
                   AND status IN ('Reserved', 'CheckedIn')
                   AND (?2 IS NULL OR id != ?2)
                   AND (checkout IS NULL OR checkout > ?3)",
                params![room_id, exclude, to_db(&checkin)],
                |row| row.get(0),
            )?,
        };

        Ok(count > 0)
    }

    pub fn create_booking(&self, input: &BookingInput, created_by: i64) -> Result<Booking> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        let booking_no = next_booking_no(&tx)?;

        tx.execute(
            "INSERT INTO bookings (booking_no, charge_type, checkin, checkout, room_id,
                 room_type_id, primary_guest_id, num_adults, num_children, status,
                 payment_status, notes, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                booking_no,
                input.charge_type.as_str(),
                to_db(&input.checkin),
                input.checkout.map(|c| to_db(&c)),
                input.room_id,
                input.room_type_id,
                input.primary_guest_id,
                input.num_adults,
                input.num_children,
                BookingStatus::Reserved.as_str(),
                PaymentStatus::Unpaid.as_str(),
                input.notes,
                now_db(),
                created_by,
            ],
        )
        .context("Failed to insert booking")?;

        let id = tx.last_insert_rowid();
        tx.commit()?;

        self.get_booking(id)?
            .context("Booking vanished immediately after insert")
    }

    pub fn update_booking(
        &self,
        id: i64,
        input: &BookingInput,
        updated_by: i64,
    ) -> Result<Option<Booking>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE bookings SET charge_type = ?1, checkin = ?2, checkout = ?3, room_id = ?4,
                 room_type_id = ?5, primary_guest_id = ?6, num_adults = ?7, num_children = ?8,
                 notes = ?9, updated_at = ?10, updated_by = ?11
             WHERE id = ?12",
            params![
                input.charge_type.as_str(),
                to_db(&input.checkin),
                input.checkout.map(|c| to_db(&c)),
                input.room_id,
                input.room_type_id,
                input.primary_guest_id,
                input.num_adults,
                input.num_children,
                input.notes,
                now_db(),
                updated_by,
                id,
            ],
        )
        .context("Failed to update booking")?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_booking(id)
    }

    /// Cancel / no-show transitions.
    pub fn set_booking_status(
        &self,
        id: i64,
        status: BookingStatus,
        updated_by: i64,
    ) -> Result<Option<Booking>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE bookings SET status = ?1, updated_at = ?2, updated_by = ?3 WHERE id = ?4",
            params![status.as_str(), now_db(), updated_by, id],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_booking(id)
    }

    /// Check the guest in: stamps the actual arrival time and occupies the
    /// room. Idempotent for an already checked-in booking.
    pub fn checkin_booking(&self, id: i64, updated_by: i64) -> Result<Option<Booking>> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        let Some(booking) = tx
            .query_row(
                &format!("SELECT {} FROM bookings WHERE id = ?1", BOOKING_COLUMNS),
                params![id],
                map_booking,
            )
            .optional()?
        else {
            return Ok(None);
        };

        if booking.status == BookingStatus::CheckedIn {
            return Ok(Some(booking));
        }

        tx.execute(
            "UPDATE bookings SET status = ?1, checkin = ?2, updated_at = ?3, updated_by = ?4
             WHERE id = ?5",
            params![
                BookingStatus::CheckedIn.as_str(),
                now_db(),
                now_db(),
                updated_by,
                id,
            ],
        )?;

        tx.execute(
            "UPDATE rooms SET status = 'Occupied', updated_at = ?1, updated_by = ?2
             WHERE id = ?3",
            params![now_db(), updated_by, booking.room_id],
        )?;

        tx.commit()?;
        self.get_booking(id)
    }

    /// Check the guest out: settles any open balance with an auto payment,
    /// marks the folio paid, and releases the room for housekeeping.
    /// The caller has already confirmed the booking is CheckedIn.
    pub fn checkout_booking(&self, id: i64, updated_by: i64) -> Result<Option<Booking>> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        let Some(booking) = tx
            .query_row(
                &format!("SELECT {} FROM bookings WHERE id = ?1", BOOKING_COLUMNS),
                params![id],
                map_booking,
            )
            .optional()?
        else {
            return Ok(None);
        };

        let charged: f64 = tx.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM booking_details WHERE booking_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        let paid: f64 = tx.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE booking_id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        let remaining = charged - paid;
        if remaining > 0.0 {
            tx.execute(
                "INSERT INTO payments (booking_id, paid_at, payment_method, reference_no,
                     amount, payer_name, notes, created_at, created_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id,
                    now_db(),
                    PaymentMethod::Other.as_str(),
                    booking.booking_no,
                    remaining,
                    "System",
                    "Auto-generated payment on checkout",
                    now_db(),
                    updated_by,
                ],
            )?;
        }

        tx.execute(
            "UPDATE bookings SET status = ?1, checkout = ?2, payment_status = ?3,
                 updated_at = ?4, updated_by = ?5
             WHERE id = ?6",
            params![
                BookingStatus::CheckedOut.as_str(),
                now_db(),
                PaymentStatus::Paid.as_str(),
                now_db(),
                updated_by,
                id,
            ],
        )?;

        tx.execute(
            "UPDATE rooms SET status = 'Available', housekeeping_status = 'Dirty',
                 updated_at = ?1, updated_by = ?2
             WHERE id = ?3",
            params![now_db(), updated_by, booking.room_id],
        )?;

        tx.commit()?;
        self.get_booking(id)
    }

    pub fn delete_booking(&self, id: i64) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn count_payments_for_booking(&self, booking_id: i64) -> Result<i64> {
        let conn = self.open()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM payments WHERE booking_id = ?1",
            params![booking_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Bookings overlapping today that have not closed out, for the
    /// front-desk dashboard.
    pub fn today_bookings(&self, skip: i64, limit: i64) -> Result<Vec<TodayBooking>> {
        let conn = self.open()?;

        let sql = "SELECT b.id, b.booking_no, b.charge_type, b.checkin, b.checkout,
                    b.room_id, r.name, b.room_type_id, rt.name,
                    b.primary_guest_id, g.name, g.phone,
                    b.num_adults, b.num_children,
                    COALESCE((SELECT SUM(d.amount) FROM booking_details d
                              WHERE d.booking_id = b.id AND d.detail_type = 'Room'), 0),
                    COALESCE((SELECT SUM(d.amount) FROM booking_details d
                              WHERE d.booking_id = b.id AND d.detail_type != 'Room'), 0),
                    b.status, b.payment_status, b.notes
             FROM bookings b
             JOIN rooms r ON b.room_id = r.id
             JOIN room_types rt ON b.room_type_id = rt.id
             LEFT JOIN guests g ON b.primary_guest_id = g.id
             WHERE date(b.checkin) <= date('now')
               AND (b.checkout IS NULL OR date(b.checkout) >= date('now'))
               AND b.status IN ('Reserved', 'CheckedIn')
             ORDER BY b.checkin ASC
             LIMIT ?1 OFFSET ?2";

        let mut stmt = conn.prepare(sql)?;
        let bookings = stmt
            .query_map(params![limit, skip], |row| {
                let charge_str: String = row.get(2)?;
                let checkin_raw: String = row.get(3)?;
                let checkout_raw: Option<String> = row.get(4)?;
                let status_str: String = row.get(16)?;
                let payment_str: String = row.get(17)?;
                Ok(TodayBooking {
                    id: row.get(0)?,
                    booking_no: row.get(1)?,
                    charge_type: ChargeType::from_str(&charge_str).unwrap_or(ChargeType::Night),
                    checkin: parse_ts(checkin_raw)?,
                    checkout: parse_opt_ts(checkout_raw)?,
                    room_id: row.get(5)?,
                    room_name: row.get(6)?,
                    room_type_id: row.get(7)?,
                    room_type_name: row.get(8)?,
                    primary_guest_id: row.get(9)?,
                    primary_guest_name: row.get(10)?,
                    primary_guest_phone: row.get(11)?,
                    num_adults: row.get(12)?,
                    num_children: row.get(13)?,
                    total_room_charges: row.get(14)?,
                    total_service_charges: row.get(15)?,
                    status: BookingStatus::from_str(&status_str)
                        .unwrap_or(BookingStatus::Cancelled),
                    payment_status: PaymentStatus::from_str(&payment_str)
                        .unwrap_or(PaymentStatus::Unpaid),
                    notes: row.get(18)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    pub fn count_today_bookings(&self) -> Result<i64> {
        let conn = self.open()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM bookings b
             WHERE date(b.checkin) <= date('now')
               AND (b.checkout IS NULL OR date(b.checkout) >= date('now'))
               AND b.status IN ('Reserved', 'CheckedIn')",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn history_clause(filters: &HistoryFilters) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(booking_no) = &filters.booking_no {
            conditions.push("b.booking_no LIKE ?");
            values.push(Box::new(format!("%{}%", booking_no)));
        }
        if let Some(guest_name) = &filters.guest_name {
            conditions.push("g.name LIKE ?");
            values.push(Box::new(format!("%{}%", guest_name)));
        }
        if let Some(room_id) = filters.room_id {
            conditions.push("b.room_id = ?");
            values.push(Box::new(room_id));
        }
        if let Some(status) = filters.status {
            conditions.push("b.status = ?");
            values.push(Box::new(status.as_str().to_string()));
        }
        if let Some(from) = filters.from {
            conditions.push("b.checkin >= ?");
            values.push(Box::new(to_db(&from)));
        }
        if let Some(to) = filters.to {
            conditions.push("b.checkin <= ?");
            values.push(Box::new(to_db(&to)));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        (clause, values)
    }

    pub fn booking_histories(
        &self,
        filters: &HistoryFilters,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<BookingHistoryEntry>> {
        let conn = self.open()?;
        let (clause, mut values) = Self::history_clause(filters);
        values.push(Box::new(limit));
        values.push(Box::new(skip));
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let sql = format!(
            "SELECT b.id, b.booking_no, b.charge_type, b.checkin, b.checkout,
                    r.name, rt.name, g.name,
                    COALESCE((SELECT SUM(d.amount) FROM booking_details d
                              WHERE d.booking_id = b.id), 0),
                    COALESCE((SELECT SUM(p.amount) FROM payments p
                              WHERE p.booking_id = b.id), 0),
                    b.status, b.payment_status
             FROM bookings b
             JOIN rooms r ON b.room_id = r.id
             JOIN room_types rt ON b.room_type_id = rt.id
             LEFT JOIN guests g ON b.primary_guest_id = g.id{}
             ORDER BY b.checkin DESC
             LIMIT ? OFFSET ?",
            clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(refs.as_slice(), |row| {
                let charge_str: String = row.get(2)?;
                let checkin_raw: String = row.get(3)?;
                let checkout_raw: Option<String> = row.get(4)?;
                let status_str: String = row.get(10)?;
                let payment_str: String = row.get(11)?;
                Ok(BookingHistoryEntry {
                    id: row.get(0)?,
                    booking_no: row.get(1)?,
                    charge_type: ChargeType::from_str(&charge_str).unwrap_or(ChargeType::Night),
                    checkin: parse_ts(checkin_raw)?,
                    checkout: parse_opt_ts(checkout_raw)?,
                    room_name: row.get(5)?,
                    room_type_name: row.get(6)?,
                    primary_guest_name: row.get(7)?,
                    total_charges: row.get(8)?,
                    total_paid: row.get(9)?,
                    status: BookingStatus::from_str(&status_str)
                        .unwrap_or(BookingStatus::Cancelled),
                    payment_status: PaymentStatus::from_str(&payment_str)
                        .unwrap_or(PaymentStatus::Unpaid),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn count_booking_histories(&self, filters: &HistoryFilters) -> Result<i64> {
        let conn = self.open()?;
        let (clause, values) = Self::history_clause(filters);
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let sql = format!(
            "SELECT COUNT(*)
             FROM bookings b
             JOIN rooms r ON b.room_id = r.id
             JOIN room_types rt ON b.room_type_id = rt.id
             LEFT JOIN guests g ON b.primary_guest_id = g.id{}",
            clause
        );
        let count = conn.query_row(&sql, refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    pub fn list_booking_details(&self, booking_id: i64) -> Result<Vec<BookingDetail>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, booking_id, detail_type, service_id, issued_at, description,
                    quantity, unit_price, discount_amount, amount, created_at, created_by
             FROM booking_details WHERE booking_id = ?1 ORDER BY issued_at, id",
        )?;
        let details = stmt
            .query_map(params![booking_id], map_detail)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(details)
    }

    pub fn add_booking_detail(
        &self,
        booking_id: i64,
        input: &DetailInput,
        created_by: i64,
    ) -> Result<BookingDetail> {
        let conn = self.open()?;

        conn.execute(
            "INSERT INTO booking_details (booking_id, detail_type, service_id, issued_at,
                 description, quantity, unit_price, discount_amount, amount, created_at,
                 created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                booking_id,
                input.detail_type.as_str(),
                input.service_id,
                now_db(),
                input.description,
                input.quantity,
                input.unit_price,
                input.discount_amount,
                input.amount(),
                now_db(),
                created_by,
            ],
        )
        .context("Failed to insert booking detail")?;

        let id = conn.last_insert_rowid();
        recompute_payment_status(&conn, booking_id)?;

        let detail = conn.query_row(
            "SELECT id, booking_id, detail_type, service_id, issued_at, description,
                    quantity, unit_price, discount_amount, amount, created_at, created_by
             FROM booking_details WHERE id = ?1",
            params![id],
            map_detail,
        )?;
        Ok(detail)
    }

    pub fn delete_booking_detail(&self, booking_id: i64, detail_id: i64) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute(
            "DELETE FROM booking_details WHERE id = ?1 AND booking_id = ?2",
            params![detail_id, booking_id],
        )?;
        if rows > 0 {
            recompute_payment_status(&conn, booking_id)?;
        }
        Ok(rows > 0)
    }

    pub fn list_payments(&self, booking_id: i64) -> Result<Vec<Payment>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, booking_id, paid_at, payment_method, reference_no, amount,
                    payer_name, notes, created_at, created_by
             FROM payments WHERE booking_id = ?1 ORDER BY paid_at, id",
        )?;
        let payments = stmt
            .query_map(params![booking_id], map_payment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(payments)
    }

    /// Record a payment and refresh the booking's payment status.
    pub fn add_payment(
        &self,
        booking_id: i64,
        input: &PaymentInput,
        created_by: i64,
    ) -> Result<Payment> {
        let conn = self.open()?;

        conn.execute(
            "INSERT INTO payments (booking_id, paid_at, payment_method, reference_no, amount,
                 payer_name, notes, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                booking_id,
                now_db(),
                input.payment_method.as_str(),
                input.reference_no,
                input.amount,
                input.payer_name,
                input.notes,
                now_db(),
                created_by,
            ],
        )
        .context("Failed to insert payment")?;

        let id = conn.last_insert_rowid();
        recompute_payment_status(&conn, booking_id)?;

        let payment = conn.query_row(
            "SELECT id, booking_id, paid_at, payment_method, reference_no, amount,
                    payer_name, notes, created_at, created_by
             FROM payments WHERE id = ?1",
            params![id],
            map_payment,
        )?;
        Ok(payment)
    }

    pub fn delete_payment(&self, booking_id: i64, payment_id: i64) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute(
            "DELETE FROM payments WHERE id = ?1 AND booking_id = ?2",
            params![payment_id, booking_id],
        )?;
        if rows > 0 {
            recompute_payment_status(&conn, booking_id)?;
        }
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{seed_guest, seed_room, seed_room_type, test_db};
    use super::*;
    use crate::models::{HousekeepingStatus, RoomStatus};
    use chrono::Duration;

    fn booking_input(room_id: i64, room_type_id: i64, guest_id: i64) -> BookingInput {
        let checkin = Utc::now() + Duration::hours(2);
        BookingInput {
            charge_type: ChargeType::Night,
            checkin,
            checkout: Some(checkin + Duration::days(2)),
            room_id,
            room_type_id,
            primary_guest_id: guest_id,
            num_adults: 2,
            num_children: 0,
            notes: None,
        }
    }

    fn room_detail(amount: f64) -> DetailInput {
        DetailInput {
            detail_type: DetailType::Room,
            service_id: None,
            description: Some("Room night".to_string()),
            quantity: 1.0,
            unit_price: amount,
            discount_amount: 0.0,
        }
    }

    fn cash_payment(amount: f64) -> PaymentInput {
        PaymentInput {
            payment_method: PaymentMethod::Cash,
            reference_no: None,
            amount,
            payer_name: Some("Guest".to_string()),
            notes: None,
        }
    }

    fn seed_booking(db: &Db) -> Booking {
        let rt = seed_room_type(db, "STD");
        let room = seed_room(db, rt.id, "101");
        let guest = seed_guest(db, "Lan Pham");
        db.create_booking(&booking_input(room.id, rt.id, guest.id), 1)
            .unwrap()
    }

    #[test]
    fn test_booking_no_sequence() {
        let (db, _temp) = test_db();
        let rt = seed_room_type(&db, "STD");
        let room1 = seed_room(&db, rt.id, "101");
        let room2 = seed_room(&db, rt.id, "102");
        let guest = seed_guest(&db, "Lan Pham");

        let first = db
            .create_booking(&booking_input(room1.id, rt.id, guest.id), 1)
            .unwrap();
        let second = db
            .create_booking(&booking_input(room2.id, rt.id, guest.id), 1)
            .unwrap();

        let prefix = format!("BKG{}", Utc::now().format("%y%m%d"));
        assert_eq!(first.booking_no, format!("{}001", prefix));
        assert_eq!(second.booking_no, format!("{}002", prefix));
        assert_eq!(first.status, BookingStatus::Reserved);
        assert_eq!(first.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_overlap_detection() {
        let (db, _temp) = test_db();
        let rt = seed_room_type(&db, "STD");
        let room = seed_room(&db, rt.id, "101");
        let guest = seed_guest(&db, "Lan Pham");

        let input = booking_input(room.id, rt.id, guest.id);
        let booking = db.create_booking(&input, 1).unwrap();

        // Same window conflicts
        assert!(db
            .is_room_booked(room.id, input.checkin, input.checkout, None)
            .unwrap());

        // The booking does not conflict with itself
        assert!(!db
            .is_room_booked(room.id, input.checkin, input.checkout, Some(booking.id))
            .unwrap());

        // A window after checkout is free
        let later = input.checkin + Duration::days(5);
        assert!(!db
            .is_room_booked(room.id, later, Some(later + Duration::days(1)), None)
            .unwrap());

        // Open-ended request overlaps the reservation
        assert!(db.is_room_booked(room.id, input.checkin, None, None).unwrap());
    }

    #[test]
    fn test_checkin_marks_room_occupied_and_is_idempotent() {
        let (db, _temp) = test_db();
        let booking = seed_booking(&db);

        let checked_in = db.checkin_booking(booking.id, 1).unwrap().unwrap();
        assert_eq!(checked_in.status, BookingStatus::CheckedIn);

        let room = db.get_room(booking.room_id).unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Occupied);

        // A second checkin keeps the original arrival time
        let again = db.checkin_booking(booking.id, 1).unwrap().unwrap();
        assert_eq!(again.checkin, checked_in.checkin);
    }

    #[test]
    fn test_checkout_settles_balance_and_frees_room() {
        let (db, _temp) = test_db();
        let booking = seed_booking(&db);
        db.checkin_booking(booking.id, 1).unwrap();

        db.add_booking_detail(booking.id, &room_detail(200.0), 1).unwrap();
        db.add_payment(booking.id, &cash_payment(50.0), 1).unwrap();

        let done = db.checkout_booking(booking.id, 1).unwrap().unwrap();
        assert_eq!(done.status, BookingStatus::CheckedOut);
        assert_eq!(done.payment_status, PaymentStatus::Paid);
        assert!(done.checkout.is_some());

        // The balance was settled with an auto payment
        let payments = db.list_payments(booking.id).unwrap();
        assert_eq!(payments.len(), 2);
        let auto = &payments[1];
        assert_eq!(auto.amount, 150.0);
        assert_eq!(auto.payment_method, PaymentMethod::Other);
        assert_eq!(auto.reference_no.as_deref(), Some(booking.booking_no.as_str()));

        let room = db.get_room(booking.room_id).unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Available);
        assert_eq!(room.housekeeping_status, HousekeepingStatus::Dirty);
    }

    #[test]
    fn test_checkout_without_balance_adds_no_payment() {
        let (db, _temp) = test_db();
        let booking = seed_booking(&db);
        db.checkin_booking(booking.id, 1).unwrap();

        db.add_booking_detail(booking.id, &room_detail(100.0), 1).unwrap();
        db.add_payment(booking.id, &cash_payment(100.0), 1).unwrap();

        db.checkout_booking(booking.id, 1).unwrap().unwrap();
        assert_eq!(db.list_payments(booking.id).unwrap().len(), 1);
    }

    #[test]
    fn test_payment_status_recompute() {
        let (db, _temp) = test_db();
        let booking = seed_booking(&db);

        db.add_booking_detail(booking.id, &room_detail(200.0), 1).unwrap();
        assert_eq!(
            db.get_booking(booking.id).unwrap().unwrap().payment_status,
            PaymentStatus::Unpaid
        );

        db.add_payment(booking.id, &cash_payment(80.0), 1).unwrap();
        assert_eq!(
            db.get_booking(booking.id).unwrap().unwrap().payment_status,
            PaymentStatus::Partial
        );

        let second = db.add_payment(booking.id, &cash_payment(120.0), 1).unwrap();
        assert_eq!(
            db.get_booking(booking.id).unwrap().unwrap().payment_status,
            PaymentStatus::Paid
        );

        // Removing a payment drops the status back
        db.delete_payment(booking.id, second.id).unwrap();
        assert_eq!(
            db.get_booking(booking.id).unwrap().unwrap().payment_status,
            PaymentStatus::Partial
        );
    }

    #[test]
    fn test_detail_amount_computation() {
        let input = DetailInput {
            detail_type: DetailType::Service,
            service_id: Some(1),
            description: None,
            quantity: 3.0,
            unit_price: 10.0,
            discount_amount: 5.0,
        };
        assert_eq!(input.amount(), 25.0);
    }

    #[test]
    fn test_today_listing_and_history_filters() {
        let (db, _temp) = test_db();
        let rt = seed_room_type(&db, "STD");
        let room = seed_room(&db, rt.id, "101");
        let guest = seed_guest(&db, "Lan Pham");

        let mut input = booking_input(room.id, rt.id, guest.id);
        input.checkin = Utc::now() - chrono::Duration::minutes(5);
        let booking = db.create_booking(&input, 1).unwrap();

        let today = db.today_bookings(0, 50).unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].room_name, "101");
        assert_eq!(today[0].primary_guest_name.as_deref(), Some("Lan Pham"));
        assert_eq!(db.count_today_bookings().unwrap(), 1);

        let filters = HistoryFilters {
            guest_name: Some("Lan".to_string()),
            ..Default::default()
        };
        let history = db.booking_histories(&filters, 0, 50).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].booking_no, booking.booking_no);

        let none = HistoryFilters {
            guest_name: Some("Nobody".to_string()),
            ..Default::default()
        };
        assert_eq!(db.count_booking_histories(&none).unwrap(), 0);
    }

    #[test]
    fn test_cancel_and_delete_guards() {
        let (db, _temp) = test_db();
        let booking = seed_booking(&db);

        let cancelled = db
            .set_booking_status(booking.id, BookingStatus::Cancelled, 1)
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        // Cancelled bookings no longer hold the room
        assert!(!db
            .is_room_booked(booking.room_id, booking.checkin, booking.checkout, None)
            .unwrap());

        assert_eq!(db.count_payments_for_booking(booking.id).unwrap(), 0);
        assert!(db.delete_booking(booking.id).unwrap());
        assert!(db.get_booking(booking.id).unwrap().is_none());
    }
}
