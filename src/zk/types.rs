//! Domain value objects returned by the command surface.

use chrono::NaiveDateTime;

/// Device privilege levels (`User.privilege`).
pub mod privilege {
    pub const USER: u8 = 0;
    pub const ENROLLER: u8 = 2;
    pub const MANAGER: u8 = 6;
    pub const ADMIN: u8 = 14;
}

/// A device user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Device-assigned slot number.
    pub uid: u16,
    /// Caller-assigned identifier ("PIN2"), distinct from `uid`.
    pub user_id: String,
    pub name: String,
    pub privilege: u8,
    pub password: String,
    pub group_id: String,
    pub card: u32,
}

impl Default for User {
    fn default() -> Self {
        Self {
            uid: 0,
            user_id: String::new(),
            name: String::new(),
            privilege: privilege::USER,
            password: String::new(),
            group_id: String::new(),
            card: 0,
        }
    }
}

/// One attendance punch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendance {
    pub uid: u16,
    pub user_id: String,
    pub timestamp: NaiveDateTime,
    /// Device-defined verification mode; opaque (see design notes).
    pub status: u8,
    /// By convention 0 = check-in, 1 = check-out; other values pass through.
    pub punch: u8,
}

/// One enrolled fingerprint template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerTemplate {
    pub uid: u16,
    pub finger_id: u8,
    /// 1 = valid, 0 = duplicate/invalid.
    pub valid: u8,
    pub template_bytes: Vec<u8>,
}

/// Device storage counts and capacities, populated by `read_sizes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCounts {
    pub users: i32,
    pub fingers: i32,
    pub records: i32,
    pub cards: i32,
    pub faces: i32,
    pub fingers_cap: i32,
    pub users_cap: i32,
    pub records_cap: i32,
    pub faces_cap: i32,
    pub fingers_avail: i32,
    pub users_avail: i32,
    pub records_avail: i32,
}
