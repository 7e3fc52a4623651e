//! Bit-exact record layouts: users, attendance, free-size blocks.
//!
//! Firmware families disagree on record width. The selector is always
//! `total_bulk_size / declared_record_count` (see design notes) — never
//! hard-coded — so every bulk read first computes a record size and
//! dispatches on it here.

use chrono::NaiveDateTime;

use super::error::{Result, ZkError};
use super::timestamp;
use super::types::{Attendance, DeviceCounts, User};

/// Leading bytes of every bulk-read buffer before the records start.
const DATA_PREFIX_SIZE: usize = 4;

fn pack_fixed_str(s: &str, width: usize) -> Vec<u8> {
    let mut buf = vec![0u8; width];
    let bytes = s.as_bytes();
    let n = bytes.len().min(width.saturating_sub(1));
    buf[..n].copy_from_slice(&bytes[..n]);
    buf
}

fn unpack_fixed_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Which wire layout a User record uses, selected by its byte width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserLayout {
    /// 28-byte "ZK6" firmware layout; numeric `user_id`, numeric `group_id`.
    Zk6,
    /// 72-byte "ZK8" firmware layout; string `user_id` and `group_id`.
    Zk8,
}

impl UserLayout {
    pub const fn record_size(self) -> usize {
        match self {
            UserLayout::Zk6 => 28,
            UserLayout::Zk8 => 72,
        }
    }

    pub fn from_record_size(size: usize) -> Result<Self> {
        match size {
            28 => Ok(UserLayout::Zk6),
            72 => Ok(UserLayout::Zk8),
            other => Err(ZkError::Protocol(format!("unknown user record size {other}"))),
        }
    }
}

pub fn pack_user(user: &User, layout: UserLayout) -> Vec<u8> {
    match layout {
        UserLayout::Zk6 => {
            let mut buf = Vec::with_capacity(28);
            buf.extend_from_slice(&user.uid.to_le_bytes());
            buf.push(user.privilege);
            buf.extend_from_slice(&pack_fixed_str(&user.password, 5));
            buf.extend_from_slice(&pack_fixed_str(&user.name, 8));
            buf.extend_from_slice(&user.card.to_le_bytes());
            buf.push(0); // pad
            buf.push(user.group_id.parse::<u8>().unwrap_or(0));
            buf.extend_from_slice(&0i16.to_le_bytes()); // timezone, unused
            let user_id_num: u32 = user.user_id.parse().unwrap_or(0);
            buf.extend_from_slice(&user_id_num.to_le_bytes());
            buf
        }
        UserLayout::Zk8 => {
            let mut buf = Vec::with_capacity(72);
            buf.extend_from_slice(&user.uid.to_le_bytes());
            buf.push(user.privilege);
            buf.extend_from_slice(&pack_fixed_str(&user.password, 8));
            buf.extend_from_slice(&pack_fixed_str(&user.name, 24));
            buf.extend_from_slice(&user.card.to_le_bytes());
            buf.push(0); // pad
            buf.extend_from_slice(&pack_fixed_str(&user.group_id, 7));
            buf.push(0); // pad
            buf.extend_from_slice(&pack_fixed_str(&user.user_id, 24));
            buf
        }
    }
}

pub fn parse_user(record: &[u8], layout: UserLayout) -> Result<User> {
    if record.len() < layout.record_size() {
        return Err(ZkError::Protocol(format!(
            "short user record: expected {} bytes, got {}",
            layout.record_size(),
            record.len()
        )));
    }
    match layout {
        UserLayout::Zk6 => {
            let uid = u16::from_le_bytes([record[0], record[1]]);
            let privilege = record[2];
            let password = unpack_fixed_str(&record[3..8]);
            let name = unpack_fixed_str(&record[8..16]);
            let card = u32::from_le_bytes([record[16], record[17], record[18], record[19]]);
            let group_id = record[21].to_string();
            let user_id = u32::from_le_bytes([record[24], record[25], record[26], record[27]]);
            Ok(User {
                uid,
                user_id: user_id.to_string(),
                name,
                privilege,
                password,
                group_id,
                card,
            })
        }
        UserLayout::Zk8 => {
            let uid = u16::from_le_bytes([record[0], record[1]]);
            let privilege = record[2];
            let password = unpack_fixed_str(&record[3..11]);
            let name = unpack_fixed_str(&record[11..35]);
            let card = u32::from_le_bytes([record[35], record[36], record[37], record[38]]);
            let group_id = unpack_fixed_str(&record[40..47]);
            let user_id = unpack_fixed_str(&record[48..72]);
            Ok(User {
                uid,
                user_id,
                name,
                privilege,
                password,
                group_id,
                card,
            })
        }
    }
}

/// Parse a bulk-read buffer (leading 4-byte size prefix + N fixed-width
/// records) into users, dispatching the layout from the computed record
/// size.
pub fn parse_users(buf: &[u8], declared_count: i32) -> Result<Vec<User>> {
    if buf.len() <= DATA_PREFIX_SIZE || declared_count <= 0 {
        return Ok(Vec::new());
    }
    let body = &buf[DATA_PREFIX_SIZE..];
    let record_size = body.len() / declared_count as usize;
    let layout = UserLayout::from_record_size(record_size)?;
    body.chunks_exact(layout.record_size())
        .map(|chunk| parse_user(chunk, layout))
        .collect()
}

/// Which wire layout an Attendance record uses, selected by its byte width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceLayout {
    /// 8-byte layout: numeric uid only, no textual user_id.
    Narrow,
    /// 16-byte layout: numeric user_id (lossy leading-zero cast, see design notes).
    Medium,
    /// 40-byte layout: textual user_id.
    Wide,
}

impl AttendanceLayout {
    pub const fn record_size(self) -> usize {
        match self {
            AttendanceLayout::Narrow => 8,
            AttendanceLayout::Medium => 16,
            AttendanceLayout::Wide => 40,
        }
    }

    pub fn from_record_size(size: usize) -> Result<Self> {
        match size {
            8 => Ok(AttendanceLayout::Narrow),
            16 => Ok(AttendanceLayout::Medium),
            40 => Ok(AttendanceLayout::Wide),
            other => Err(ZkError::Protocol(format!("unknown attendance record size {other}"))),
        }
    }
}

fn decode_timestamp(encoded: u32) -> Result<NaiveDateTime> {
    timestamp::decode_compact(encoded)
}

pub fn parse_attendance_record(record: &[u8], layout: AttendanceLayout) -> Result<Attendance> {
    if record.len() < layout.record_size() {
        return Err(ZkError::Protocol(format!(
            "short attendance record: expected {} bytes, got {}",
            layout.record_size(),
            record.len()
        )));
    }
    match layout {
        AttendanceLayout::Narrow => {
            let uid = u16::from_le_bytes([record[0], record[1]]);
            let status = record[2];
            let timestamp = decode_timestamp(u32::from_le_bytes([record[3], record[4], record[5], record[6]]))?;
            let punch = record[7];
            Ok(Attendance {
                uid,
                user_id: uid.to_string(),
                timestamp,
                status,
                punch,
            })
        }
        AttendanceLayout::Medium => {
            // The numeric-to-string cast here is intentionally lossy
            // (leading zeros drop); preserve the numeric form and only
            // convert at display boundaries.
            let user_id_num = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
            let timestamp = decode_timestamp(u32::from_le_bytes([record[4], record[5], record[6], record[7]]))?;
            let status = record[8];
            let punch = record[9];
            Ok(Attendance {
                uid: (user_id_num & 0xFFFF) as u16,
                user_id: user_id_num.to_string(),
                timestamp,
                status,
                punch,
            })
        }
        AttendanceLayout::Wide => {
            let uid = u16::from_le_bytes([record[0], record[1]]);
            let user_id = unpack_fixed_str(&record[2..26]);
            let status = record[26];
            let timestamp = decode_timestamp(u32::from_le_bytes([record[27], record[28], record[29], record[30]]))?;
            let punch = record[31];
            let user_id = if user_id.is_empty() { uid.to_string() } else { user_id };
            Ok(Attendance {
                uid,
                user_id,
                timestamp,
                status,
                punch,
            })
        }
    }
}

/// Parse a bulk-read buffer (leading 4-byte size prefix + N fixed-width
/// records) into attendance punches.
pub fn parse_attendance(buf: &[u8], declared_count: i32) -> Result<Vec<Attendance>> {
    if buf.len() <= DATA_PREFIX_SIZE || declared_count <= 0 {
        return Ok(Vec::new());
    }
    let body = &buf[DATA_PREFIX_SIZE..];
    let record_size = body.len() / declared_count as usize;
    let layout = AttendanceLayout::from_record_size(record_size)?;
    body.chunks_exact(layout.record_size())
        .map(|chunk| parse_attendance_record(chunk, layout))
        .collect()
}

/// Parse the 80-byte (or 92-byte, with the optional face block) "free
/// sizes" reply into device counts.
pub fn parse_free_sizes(buf: &[u8]) -> Result<DeviceCounts> {
    if buf.len() < 80 {
        return Err(ZkError::Protocol(format!(
            "free sizes reply too short: expected >= 80 bytes, got {}",
            buf.len()
        )));
    }
    let field = |idx: usize| -> i32 {
        let offset = idx * 4;
        i32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
    };

    let mut counts = DeviceCounts {
        users: field(4),
        fingers: field(6),
        records: field(8),
        cards: field(12),
        fingers_cap: field(14),
        users_cap: field(15),
        records_cap: field(16),
        fingers_avail: field(17),
        users_avail: field(18),
        records_avail: field(19),
        faces: 0,
        faces_cap: 0,
    };

    if buf.len() >= 92 {
        counts.faces = i32::from_le_bytes([buf[80], buf[81], buf[82], buf[83]]);
        counts.faces_cap = i32::from_le_bytes([buf[88], buf[89], buf[90], buf[91]]);
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_user_72() -> User {
        User {
            uid: 7,
            user_id: "JD1".to_string(),
            name: "John Doe".to_string(),
            privilege: 14,
            password: "secret".to_string(),
            group_id: "g1".to_string(),
            card: 123456,
        }
    }

    fn sample_user_28() -> User {
        User {
            uid: 9,
            user_id: "4242".to_string(),
            name: "Jane".to_string(),
            privilege: 0,
            password: "pw".to_string(),
            group_id: "3".to_string(),
            card: 7,
        }
    }

    #[test]
    fn user_72_round_trips() {
        let user = sample_user_72();
        let packed = pack_user(&user, UserLayout::Zk8);
        assert_eq!(packed.len(), 72);
        let parsed = parse_user(&packed, UserLayout::Zk8).unwrap();
        assert_eq!(parsed, user);
    }

    #[test]
    fn user_28_round_trips() {
        let user = sample_user_28();
        let packed = pack_user(&user, UserLayout::Zk6);
        assert_eq!(packed.len(), 28);
        let parsed = parse_user(&packed, UserLayout::Zk6).unwrap();
        assert_eq!(parsed, user);
    }

    #[test]
    fn layout_dispatch_by_record_size() {
        assert_eq!(UserLayout::from_record_size(28).unwrap(), UserLayout::Zk6);
        assert_eq!(UserLayout::from_record_size(72).unwrap(), UserLayout::Zk8);
        assert!(UserLayout::from_record_size(50).is_err());
        assert_eq!(AttendanceLayout::from_record_size(8).unwrap(), AttendanceLayout::Narrow);
        assert_eq!(AttendanceLayout::from_record_size(16).unwrap(), AttendanceLayout::Medium);
        assert_eq!(AttendanceLayout::from_record_size(40).unwrap(), AttendanceLayout::Wide);
    }

    #[test]
    fn parse_users_dispatches_on_declared_count() {
        let u1 = sample_user_72();
        let mut u2 = sample_user_72();
        u2.uid = 8;
        u2.name = "Second".to_string();

        let mut buf = vec![0u8; DATA_PREFIX_SIZE];
        buf.extend_from_slice(&pack_user(&u1, UserLayout::Zk8));
        buf.extend_from_slice(&pack_user(&u2, UserLayout::Zk8));

        let users = parse_users(&buf, 2).unwrap();
        assert_eq!(users, vec![u1, u2]);
    }

    #[test]
    fn parse_attendance_wide_layout() {
        let ts = NaiveDate::from_ymd_opt(2025, 11, 10).unwrap().and_hms_opt(8, 52, 12).unwrap();
        let mut record = vec![0u8; 40];
        record[0..2].copy_from_slice(&7u16.to_le_bytes());
        record[2..5].copy_from_slice(b"123");
        record[27..31].copy_from_slice(&timestamp::encode_compact(&ts).to_le_bytes());
        record[31] = 0;

        let mut buf = vec![0u8; DATA_PREFIX_SIZE];
        buf.extend_from_slice(&record);

        let records = parse_attendance(&buf, 1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uid, 7);
        assert_eq!(records[0].user_id, "123");
        assert_eq!(records[0].timestamp, ts);
    }

    #[test]
    fn parse_attendance_medium_layout_is_lossy_by_design() {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut record = vec![0u8; 16];
        record[0..4].copy_from_slice(&7u32.to_le_bytes()); // would display as "007" elsewhere, preserved numeric here
        record[4..8].copy_from_slice(&timestamp::encode_compact(&ts).to_le_bytes());

        let mut buf = vec![0u8; DATA_PREFIX_SIZE];
        buf.extend_from_slice(&record);

        let records = parse_attendance(&buf, 1).unwrap();
        assert_eq!(records[0].user_id, "7");
    }

    #[test]
    fn parse_free_sizes_reads_documented_indices() {
        let mut buf = vec![0u8; 80];
        let set = |buf: &mut Vec<u8>, idx: usize, value: i32| {
            buf[idx * 4..idx * 4 + 4].copy_from_slice(&value.to_le_bytes());
        };
        set(&mut buf, 4, 10); // users
        set(&mut buf, 6, 20); // fingers
        set(&mut buf, 8, 30); // records
        set(&mut buf, 15, 100); // users_cap

        let counts = parse_free_sizes(&buf).unwrap();
        assert_eq!(counts.users, 10);
        assert_eq!(counts.fingers, 20);
        assert_eq!(counts.records, 30);
        assert_eq!(counts.users_cap, 100);
        assert_eq!(counts.faces, 0);
    }

    #[test]
    fn parse_free_sizes_rejects_short_buffer() {
        assert!(parse_free_sizes(&[0u8; 10]).is_err());
    }
}
