//! Revenue and occupancy report queries.
//!
//! All ranges are inclusive calendar dates keyed on the booking's checkin;
//! cancelled and no-show bookings are excluded throughout.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::params;

use super::Db;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub room_revenue: f64,
    pub service_revenue: f64,
    pub total_guests: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueRow {
    pub name: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBookings {
    pub date: String,
    pub booking_count: i64,
}

const ACTIVE_STATES: &str = "('Reserved', 'CheckedIn', 'CheckedOut')";

impl Db {
    pub fn report_summary(&self, start: NaiveDate, end: NaiveDate) -> Result<ReportSummary> {
        let conn = self.open()?;
        let (start, end) = (start.to_string(), end.to_string());

        let room_revenue: f64 = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(d.amount), 0)
                 FROM booking_details d
                 JOIN bookings b ON d.booking_id = b.id
                 WHERE d.detail_type = 'Room'
                   AND b.status IN {}
                   AND date(b.checkin) BETWEEN ?1 AND ?2",
                ACTIVE_STATES
            ),
            params![start, end],
            |row| row.get(0),
        )?;

        let service_revenue: f64 = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(d.amount), 0)
                 FROM booking_details d
                 JOIN bookings b ON d.booking_id = b.id
                 WHERE d.detail_type != 'Room'
                   AND b.status IN {}
                   AND date(b.checkin) BETWEEN ?1 AND ?2",
                ACTIVE_STATES
            ),
            params![start, end],
            |row| row.get(0),
        )?;

        let total_guests: i64 = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(num_adults + num_children), 0)
                 FROM bookings
                 WHERE status IN {}
                   AND date(checkin) BETWEEN ?1 AND ?2",
                ACTIVE_STATES
            ),
            params![start, end],
            |row| row.get(0),
        )?;

        Ok(ReportSummary {
            room_revenue,
            service_revenue,
            total_guests,
        })
    }

    pub fn revenue_by_room_type(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenueRow>> {
        let conn = self.open()?;

        let sql = format!(
            "SELECT rt.name, COALESCE(SUM(d.amount), 0) AS revenue
             FROM booking_details d
             JOIN bookings b ON d.booking_id = b.id
             JOIN room_types rt ON b.room_type_id = rt.id
             WHERE d.detail_type = 'Room'
               AND b.status IN {}
               AND date(b.checkin) BETWEEN ?1 AND ?2
             GROUP BY rt.name
             ORDER BY revenue DESC",
            ACTIVE_STATES
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![start.to_string(), end.to_string()], |row| {
                Ok(RevenueRow {
                    name: row.get(0)?,
                    revenue: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn service_revenue(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenueRow>> {
        let conn = self.open()?;

        let sql = format!(
            "SELECT s.name, COALESCE(SUM(d.amount), 0) AS revenue
             FROM booking_details d
             JOIN bookings b ON d.booking_id = b.id
             JOIN services s ON d.service_id = s.id
             WHERE d.detail_type = 'Service'
               AND b.status IN {}
               AND date(b.checkin) BETWEEN ?1 AND ?2
             GROUP BY s.name
             ORDER BY revenue DESC",
            ACTIVE_STATES
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![start.to_string(), end.to_string()], |row| {
                Ok(RevenueRow {
                    name: row.get(0)?,
                    revenue: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn bookings_per_day(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyBookings>> {
        let conn = self.open()?;

        let sql = format!(
            "SELECT date(checkin) AS day, COUNT(*)
             FROM bookings
             WHERE status IN {}
               AND date(checkin) BETWEEN ?1 AND ?2
             GROUP BY day
             ORDER BY day",
            ACTIVE_STATES
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![start.to_string(), end.to_string()], |row| {
                Ok(DailyBookings {
                    date: row.get(0)?,
                    booking_count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
