//! Role Authorization
//! Mission: Table-driven capability checks for the four hotel roles

use crate::auth::models::Role;

/// Capabilities gated by role. One variant per operation family, so the
/// table below stays the single audit point for who may do what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    RoomTypeRead,
    RoomTypeWrite,
    RoomRead,
    RoomWrite,
    RoomStatusUpdate,
    RoomHousekeepingUpdate,
    GuestRead,
    GuestWrite,
    ServiceRead,
    ServiceWrite,
    ServicePriceChange,
    ServiceDelete,
    BookingRead,
    BookingWrite,
    BookingDelete,
    PaymentDelete,
    ReportView,
    UserManage,
}

/// Rejection carrying no detail: the caller already knows who asked for what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forbidden;

/// The static capability table. Call sites never hardcode role lists.
pub fn allowed_roles(permission: Permission) -> &'static [Role] {
    use Permission::*;
    use Role::*;

    match permission {
        RoomTypeRead | GuestRead | ServiceRead | BookingRead => &[Manager, Receptionist],
        RoomRead | RoomHousekeepingUpdate => &[Manager, Receptionist, Housekeeping],
        RoomStatusUpdate | GuestWrite | ServiceWrite | BookingWrite => &[Manager, Receptionist],
        RoomTypeWrite | RoomWrite | ServicePriceChange | ServiceDelete | BookingDelete
        | PaymentDelete | UserManage => &[Manager],
        ReportView => &[Manager, Accountant],
    }
}

/// Check a role against an explicit capability set.
pub fn check_role(role: Role, required: &[Role]) -> bool {
    required.contains(&role)
}

/// Allow or reject a role for a permission, per the static table.
pub fn authorize(role: Role, permission: Permission) -> Result<(), Forbidden> {
    if check_role(role, allowed_roles(permission)) {
        Ok(())
    } else {
        Err(Forbidden)
    }
}
