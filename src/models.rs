//! Hotel domain models shared by the stores and the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Room occupancy status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoomStatus {
    Available,
    Occupied,
    OutOfService,
}

impl RoomStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RoomStatus::Available => "Available",
            RoomStatus::Occupied => "Occupied",
            RoomStatus::OutOfService => "OutOfService",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Available" => Some(RoomStatus::Available),
            "Occupied" => Some(RoomStatus::Occupied),
            "OutOfService" => Some(RoomStatus::OutOfService),
            _ => None,
        }
    }
}

/// Housekeeping state of a room, maintained separately from occupancy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HousekeepingStatus {
    Clean,
    Dirty,
    Inspected,
    OutOfOrder,
}

impl HousekeepingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            HousekeepingStatus::Clean => "Clean",
            HousekeepingStatus::Dirty => "Dirty",
            HousekeepingStatus::Inspected => "Inspected",
            HousekeepingStatus::OutOfOrder => "OutOfOrder",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Clean" => Some(HousekeepingStatus::Clean),
            "Dirty" => Some(HousekeepingStatus::Dirty),
            "Inspected" => Some(HousekeepingStatus::Inspected),
            "OutOfOrder" => Some(HousekeepingStatus::OutOfOrder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Male" => Some(Gender::Male),
            "Female" => Some(Gender::Female),
            "Other" => Some(Gender::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceStatus {
    Active,
    Inactive,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceStatus::Active => "Active",
            ServiceStatus::Inactive => "Inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(ServiceStatus::Active),
            "Inactive" => Some(ServiceStatus::Inactive),
            _ => None,
        }
    }
}

/// How the stay is billed: by the hour or per night.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChargeType {
    Hour,
    Night,
}

impl ChargeType {
    pub fn as_str(&self) -> &str {
        match self {
            ChargeType::Hour => "Hour",
            ChargeType::Night => "Night",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Hour" => Some(ChargeType::Hour),
            "Night" => Some(ChargeType::Night),
            _ => None,
        }
    }
}

/// Booking lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Reserved,
    CheckedIn,
    CheckedOut,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Reserved => "Reserved",
            BookingStatus::CheckedIn => "CheckedIn",
            BookingStatus::CheckedOut => "CheckedOut",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::NoShow => "NoShow",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Reserved" => Some(BookingStatus::Reserved),
            "CheckedIn" => Some(BookingStatus::CheckedIn),
            "CheckedOut" => Some(BookingStatus::CheckedOut),
            "Cancelled" => Some(BookingStatus::Cancelled),
            "NoShow" => Some(BookingStatus::NoShow),
            _ => None,
        }
    }

    /// States a booking can still be edited in.
    pub fn is_open(&self) -> bool {
        matches!(self, BookingStatus::Reserved | BookingStatus::CheckedIn)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Paid => "Paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Unpaid" => Some(PaymentStatus::Unpaid),
            "Partial" => Some(PaymentStatus::Partial),
            "Paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

/// Line-item kind on a booking folio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DetailType {
    Room,
    Service,
    Fee,
    Adjustment,
}

impl DetailType {
    pub fn as_str(&self) -> &str {
        match self {
            DetailType::Room => "Room",
            DetailType::Service => "Service",
            DetailType::Fee => "Fee",
            DetailType::Adjustment => "Adjustment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Room" => Some(DetailType::Room),
            "Service" => Some(DetailType::Service),
            "Fee" => Some(DetailType::Fee),
            "Adjustment" => Some(DetailType::Adjustment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Card,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Cash" => Some(PaymentMethod::Cash),
            "Card" => Some(PaymentMethod::Card),
            "Other" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

/// A bookable room category with its rates and occupancy limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomType {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub base_occupancy: i64,
    pub max_occupancy: i64,
    pub base_rate: f64,
    pub hour_rate: f64,
    pub extra_adult_fee: f64,
    pub extra_child_fee: f64,
    pub description: Option<String>,
    pub created_at: String,
    pub created_by: Option<i64>,
    pub updated_at: Option<String>,
    pub updated_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub room_type_id: i64,
    pub description: Option<String>,
    pub status: RoomStatus,
    pub housekeeping_status: HousekeepingStatus,
    pub created_at: String,
    pub created_by: Option<i64>,
    pub updated_at: Option<String>,
    pub updated_by: Option<i64>,
}

/// A room joined with its type, as returned by the availability search.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableRoom {
    pub id: i64,
    pub name: String,
    pub room_type_id: i64,
    pub room_type_name: String,
    pub base_rate: f64,
    pub hour_rate: f64,
    pub base_occupancy: i64,
    pub max_occupancy: i64,
    pub housekeeping_status: HousekeepingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guest {
    pub id: i64,
    pub name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub created_by: Option<i64>,
    pub updated_at: Option<String>,
    pub updated_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub price: f64,
    pub description: Option<String>,
    pub status: ServiceStatus,
    pub created_at: String,
    pub created_by: Option<i64>,
    pub updated_at: Option<String>,
    pub updated_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub booking_no: String,
    pub charge_type: ChargeType,
    pub checkin: DateTime<Utc>,
    pub checkout: Option<DateTime<Utc>>,
    pub room_id: i64,
    pub room_type_id: i64,
    pub primary_guest_id: Option<i64>,
    pub num_adults: i64,
    pub num_children: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: String,
    pub created_by: Option<i64>,
    pub updated_at: Option<String>,
    pub updated_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetail {
    pub id: i64,
    pub booking_id: i64,
    pub detail_type: DetailType,
    pub service_id: Option<i64>,
    pub issued_at: DateTime<Utc>,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub discount_amount: f64,
    pub amount: f64,
    pub created_at: String,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub paid_at: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub reference_no: Option<String>,
    pub amount: f64,
    pub payer_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub created_by: Option<i64>,
}

/// Front-desk view of a booking active today, with names and charge totals.
#[derive(Debug, Clone, Serialize)]
pub struct TodayBooking {
    pub id: i64,
    pub booking_no: String,
    pub charge_type: ChargeType,
    pub checkin: DateTime<Utc>,
    pub checkout: Option<DateTime<Utc>>,
    pub room_id: i64,
    pub room_name: String,
    pub room_type_id: i64,
    pub room_type_name: String,
    pub primary_guest_id: Option<i64>,
    pub primary_guest_name: Option<String>,
    pub primary_guest_phone: Option<String>,
    pub num_adults: i64,
    pub num_children: i64,
    pub total_room_charges: f64,
    pub total_service_charges: f64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

/// A row in the booking history listing.
#[derive(Debug, Clone, Serialize)]
pub struct BookingHistoryEntry {
    pub id: i64,
    pub booking_no: String,
    pub charge_type: ChargeType,
    pub checkin: DateTime<Utc>,
    pub checkout: Option<DateTime<Utc>>,
    pub room_name: String,
    pub room_type_name: String,
    pub primary_guest_name: Option<String>,
    pub total_charges: f64,
    pub total_paid: f64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips() {
        for status in [
            BookingStatus::Reserved,
            BookingStatus::CheckedIn,
            BookingStatus::CheckedOut,
            BookingStatus::Cancelled,
            BookingStatus::NoShow,
        ] {
            assert_eq!(BookingStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::from_str("Unknown"), None);
    }

    #[test]
    fn test_open_states() {
        assert!(BookingStatus::Reserved.is_open());
        assert!(BookingStatus::CheckedIn.is_open());
        assert!(!BookingStatus::CheckedOut.is_open());
        assert!(!BookingStatus::Cancelled.is_open());
        assert!(!BookingStatus::NoShow.is_open());
    }

    #[test]
    fn test_enum_serialization_uses_plain_names() {
        let json = serde_json::to_string(&RoomStatus::OutOfService).unwrap();
        assert_eq!(json, r#""OutOfService""#);

        let parsed: PaymentStatus = serde_json::from_str(r#""Partial""#).unwrap();
        assert_eq!(parsed, PaymentStatus::Partial);
    }
}
