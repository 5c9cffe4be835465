//! Revenue report endpoints (Manager, Accountant).

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{require, ApiError, AppState};
use crate::auth::{models::Claims, Permission};
use crate::store::reports::RevenueRow;

/// Largest report span accepted, to keep the aggregation queries bounded.
const MAX_RANGE_DAYS: i64 = 366;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_date: String,
    pub end_date: String,
}

/// Accept DD-MM-YYYY (the front office convention) or ISO YYYY-MM-DD.
fn parse_flexible_date(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%d-%m-%Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|_| ApiError::BadRequest(format!("Unparseable date: {}", value)))
}

fn parse_range(query: &RangeQuery) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let start = parse_flexible_date(&query.start_date)?;
    let end = parse_flexible_date(&query.end_date)?;

    if start > end {
        return Err(ApiError::BadRequest(
            "start_date must not be after end_date".to_string(),
        ));
    }
    if (end - start).num_days() > MAX_RANGE_DAYS {
        return Err(ApiError::BadRequest(format!(
            "Date range too large (> {} days)",
            MAX_RANGE_DAYS
        )));
    }

    Ok((start, end))
}

#[derive(Debug, Serialize)]
pub struct SummaryOut {
    pub total_revenue: f64,
    pub room_revenue: f64,
    pub service_revenue: f64,
    pub total_guests: i64,
    pub currency: &'static str,
}

/// GET /api/reports/summary
pub async fn summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<SummaryOut>, ApiError> {
    require(&claims, Permission::ReportView)?;
    let (start, end) = parse_range(&query)?;

    let report = state.db.report_summary(start, end)?;

    Ok(Json(SummaryOut {
        total_revenue: report.room_revenue + report.service_revenue,
        room_revenue: report.room_revenue,
        service_revenue: report.service_revenue,
        total_guests: report.total_guests,
        currency: "VND",
    }))
}

#[derive(Debug, Serialize)]
pub struct RevenueItem {
    pub name: String,
    pub revenue: f64,
    pub percent: f64,
}

#[derive(Debug, Serialize)]
pub struct RevenueBreakdownOut {
    pub total: f64,
    pub items: Vec<RevenueItem>,
}

fn breakdown(rows: Vec<RevenueRow>) -> RevenueBreakdownOut {
    let total: f64 = rows.iter().map(|r| r.revenue).sum();
    let items = rows
        .into_iter()
        .map(|row| {
            let percent = if total > 0.0 {
                (row.revenue / total * 10_000.0).round() / 100.0
            } else {
                0.0
            };
            RevenueItem {
                name: row.name,
                revenue: row.revenue,
                percent,
            }
        })
        .collect();

    RevenueBreakdownOut { total, items }
}

/// GET /api/reports/revenue-by-room-type
pub async fn revenue_by_room_type(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<RevenueBreakdownOut>, ApiError> {
    require(&claims, Permission::ReportView)?;
    let (start, end) = parse_range(&query)?;

    let rows = state.db.revenue_by_room_type(start, end)?;
    Ok(Json(breakdown(rows)))
}

/// GET /api/reports/service-revenue
pub async fn service_revenue(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<RevenueBreakdownOut>, ApiError> {
    require(&claims, Permission::ReportView)?;
    let (start, end) = parse_range(&query)?;

    let rows = state.db.service_revenue(start, end)?;
    Ok(Json(breakdown(rows)))
}

#[derive(Debug, Serialize)]
pub struct DailyBookingPoint {
    pub date: String,
    pub bookings: i64,
}

#[derive(Debug, Serialize)]
pub struct DailyBookingsOut {
    pub total: i64,
    pub points: Vec<DailyBookingPoint>,
}

/// GET /api/reports/bookings-per-day
pub async fn bookings_per_day(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<DailyBookingsOut>, ApiError> {
    require(&claims, Permission::ReportView)?;
    let (start, end) = parse_range(&query)?;

    let rows = state.db.bookings_per_day(start, end)?;
    let total = rows.iter().map(|r| r.booking_count).sum();
    let points = rows
        .into_iter()
        .map(|row| DailyBookingPoint {
            date: row.date,
            bookings: row.booking_count,
        })
        .collect();

    Ok(Json(DailyBookingsOut { total, points }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flexible_date() {
        let dmy = parse_flexible_date("14-03-2025").unwrap();
        let iso = parse_flexible_date("2025-03-14").unwrap();
        assert_eq!(dmy, iso);

        assert!(parse_flexible_date("03/14/2025").is_err());
        assert!(parse_flexible_date("not-a-date").is_err());
    }

    #[test]
    fn test_parse_range_validation() {
        let ok = RangeQuery {
            start_date: "01-01-2025".to_string(),
            end_date: "31-01-2025".to_string(),
        };
        assert!(parse_range(&ok).is_ok());

        let reversed = RangeQuery {
            start_date: "31-01-2025".to_string(),
            end_date: "01-01-2025".to_string(),
        };
        assert!(parse_range(&reversed).is_err());

        let too_wide = RangeQuery {
            start_date: "01-01-2020".to_string(),
            end_date: "01-01-2025".to_string(),
        };
        assert!(parse_range(&too_wide).is_err());
    }

    #[test]
    fn test_breakdown_percentages() {
        let rows = vec![
            RevenueRow {
                name: "Deluxe".to_string(),
                revenue: 300.0,
            },
            RevenueRow {
                name: "Standard".to_string(),
                revenue: 100.0,
            },
        ];

        let out = breakdown(rows);
        assert_eq!(out.total, 400.0);
        assert_eq!(out.items[0].percent, 75.0);
        assert_eq!(out.items[1].percent, 25.0);
    }

    #[test]
    fn test_breakdown_empty() {
        let out = breakdown(Vec::new());
        assert_eq!(out.total, 0.0);
        assert!(out.items.is_empty());
    }
}
