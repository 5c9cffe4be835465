//! Full stay lifecycle over a temp database: reserve, check in, charge,
//! pay, check out, and the report rollups afterwards.

use chrono::{Duration, Utc};
use innkeep_backend::models::{
    BookingStatus, ChargeType, DetailType, HousekeepingStatus, PaymentMethod, PaymentStatus,
    RoomStatus, ServiceStatus,
};
use innkeep_backend::store::{
    bookings::{BookingInput, DetailInput, PaymentInput},
    guests::GuestInput,
    room_types::RoomTypeInput,
    rooms::{AvailabilityQuery, RoomInput},
    services::ServiceInput,
    Db,
};
use tempfile::NamedTempFile;

struct Fixture {
    db: Db,
    _temp: NamedTempFile,
    room_id: i64,
    room_type_id: i64,
    guest_id: i64,
    service_id: i64,
}

fn fixture() -> Fixture {
    let temp = NamedTempFile::new().unwrap();
    let db = Db::new(temp.path().to_str().unwrap()).unwrap();

    let room_type = db
        .create_room_type(
            &RoomTypeInput {
                code: "DLX".to_string(),
                name: "Deluxe".to_string(),
                base_occupancy: 2,
                max_occupancy: 3,
                base_rate: 150.0,
                hour_rate: 30.0,
                extra_adult_fee: 40.0,
                extra_child_fee: 20.0,
                description: None,
            },
            1,
        )
        .unwrap();

    let room = db
        .create_room(
            &RoomInput {
                name: "301".to_string(),
                room_type_id: room_type.id,
                description: None,
            },
            1,
        )
        .unwrap();

    let guest = db
        .create_guest(
            &GuestInput {
                name: "Lan Pham".to_string(),
                phone: Some("0901000111".to_string()),
                ..Default::default()
            },
            1,
        )
        .unwrap();

    let service = db
        .create_service(
            &ServiceInput {
                name: "Laundry".to_string(),
                unit: "kg".to_string(),
                price: 8.0,
                description: None,
                status: ServiceStatus::Active,
            },
            1,
        )
        .unwrap();

    Fixture {
        db,
        _temp: temp,
        room_id: room.id,
        room_type_id: room_type.id,
        guest_id: guest.id,
        service_id: service.id,
    }
}

fn reservation(fx: &Fixture) -> BookingInput {
    let checkin = Utc::now() + Duration::hours(3);
    BookingInput {
        charge_type: ChargeType::Night,
        checkin,
        checkout: Some(checkin + Duration::days(2)),
        room_id: fx.room_id,
        room_type_id: fx.room_type_id,
        primary_guest_id: fx.guest_id,
        num_adults: 2,
        num_children: 1,
        notes: Some("Late arrival".to_string()),
    }
}

#[test]
fn full_stay_settles_folio_and_releases_the_room() {
    let fx = fixture();

    let booking = fx.db.create_booking(&reservation(&fx), 1).unwrap();
    assert_eq!(booking.status, BookingStatus::Reserved);
    assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
    assert!(booking.booking_no.starts_with("BKG"));

    // The room is held for the window now
    assert!(fx
        .db
        .is_room_booked(fx.room_id, booking.checkin, booking.checkout, None)
        .unwrap());
    let free = fx.db.available_rooms(&AvailabilityQuery::default()).unwrap();
    assert!(free.is_empty());

    // Guest arrives
    let checked_in = fx.db.checkin_booking(booking.id, 2).unwrap().unwrap();
    assert_eq!(checked_in.status, BookingStatus::CheckedIn);
    let room = fx.db.get_room(fx.room_id).unwrap().unwrap();
    assert_eq!(room.status, RoomStatus::Occupied);

    // Two room nights and a laundry run land on the folio
    fx.db
        .add_booking_detail(
            booking.id,
            &DetailInput {
                detail_type: DetailType::Room,
                service_id: None,
                description: Some("Deluxe nightly rate".to_string()),
                quantity: 2.0,
                unit_price: 150.0,
                discount_amount: 0.0,
            },
            2,
        )
        .unwrap();
    fx.db
        .add_booking_detail(
            booking.id,
            &DetailInput {
                detail_type: DetailType::Service,
                service_id: Some(fx.service_id),
                description: None,
                quantity: 3.0,
                unit_price: 8.0,
                discount_amount: 4.0,
            },
            2,
        )
        .unwrap();

    // A card deposit covers part of the 320 total
    fx.db
        .add_payment(
            booking.id,
            &PaymentInput {
                payment_method: PaymentMethod::Card,
                reference_no: Some("AUTH-7781".to_string()),
                amount: 200.0,
                payer_name: Some("Lan Pham".to_string()),
                notes: None,
            },
            2,
        )
        .unwrap();
    assert_eq!(
        fx.db.get_booking(booking.id).unwrap().unwrap().payment_status,
        PaymentStatus::Partial
    );

    // Checkout settles the remaining 120 automatically
    let done = fx.db.checkout_booking(booking.id, 2).unwrap().unwrap();
    assert_eq!(done.status, BookingStatus::CheckedOut);
    assert_eq!(done.payment_status, PaymentStatus::Paid);

    let payments = fx.db.list_payments(booking.id).unwrap();
    assert_eq!(payments.len(), 2);
    let settle = payments.last().unwrap();
    assert_eq!(settle.amount, 120.0);
    assert_eq!(settle.payment_method, PaymentMethod::Other);

    // Room released for housekeeping
    let room = fx.db.get_room(fx.room_id).unwrap().unwrap();
    assert_eq!(room.status, RoomStatus::Available);
    assert_eq!(room.housekeeping_status, HousekeepingStatus::Dirty);

    // And the room shows as bookable again
    let later = Utc::now() + Duration::days(10);
    assert!(!fx
        .db
        .is_room_booked(fx.room_id, later, Some(later + Duration::days(1)), None)
        .unwrap());
}

#[test]
fn double_booking_is_detected_until_the_first_is_cancelled() {
    let fx = fixture();

    let input = reservation(&fx);
    let first = fx.db.create_booking(&input, 1).unwrap();

    assert!(fx
        .db
        .is_room_booked(fx.room_id, input.checkin, input.checkout, None)
        .unwrap());

    fx.db
        .set_booking_status(first.id, BookingStatus::Cancelled, 1)
        .unwrap();

    assert!(!fx
        .db
        .is_room_booked(fx.room_id, input.checkin, input.checkout, None)
        .unwrap());

    // The window is free to rebook
    let second = fx.db.create_booking(&input, 1).unwrap();
    assert_ne!(second.booking_no, first.booking_no);
}

#[test]
fn reports_roll_up_the_settled_stay() {
    let fx = fixture();

    let booking = fx.db.create_booking(&reservation(&fx), 1).unwrap();
    fx.db.checkin_booking(booking.id, 1).unwrap();
    fx.db
        .add_booking_detail(
            booking.id,
            &DetailInput {
                detail_type: DetailType::Room,
                service_id: None,
                description: None,
                quantity: 2.0,
                unit_price: 150.0,
                discount_amount: 0.0,
            },
            1,
        )
        .unwrap();
    fx.db
        .add_booking_detail(
            booking.id,
            &DetailInput {
                detail_type: DetailType::Service,
                service_id: Some(fx.service_id),
                description: None,
                quantity: 5.0,
                unit_price: 8.0,
                discount_amount: 0.0,
            },
            1,
        )
        .unwrap();
    fx.db.checkout_booking(booking.id, 1).unwrap();

    let today = Utc::now().date_naive();
    let start = today - Duration::days(1);
    let end = today + Duration::days(7);

    let summary = fx.db.report_summary(start, end).unwrap();
    assert_eq!(summary.room_revenue, 300.0);
    assert_eq!(summary.service_revenue, 40.0);
    assert_eq!(summary.total_guests, 3);

    let by_type = fx.db.revenue_by_room_type(start, end).unwrap();
    assert_eq!(by_type.len(), 1);
    assert_eq!(by_type[0].name, "Deluxe");
    assert_eq!(by_type[0].revenue, 300.0);

    let by_service = fx.db.service_revenue(start, end).unwrap();
    assert_eq!(by_service.len(), 1);
    assert_eq!(by_service[0].name, "Laundry");
    assert_eq!(by_service[0].revenue, 40.0);

    let per_day = fx.db.bookings_per_day(start, end).unwrap();
    assert_eq!(per_day.iter().map(|d| d.booking_count).sum::<i64>(), 1);
}
