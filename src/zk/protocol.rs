//! ZK protocol command codes, inner packet header, and checksum.
//!
//! This module covers only the 8-byte inner packet (`command, checksum,
//! session_id, reply_id` + payload). The TCP outer frame (`0x5050 0x7D82
//! length`) lives in [`super::transport`].

use super::error::{Result, ZkError};

/// Inner packet header length in bytes.
pub const HEADER_LEN: usize = 8;

pub mod cmd {
    pub const CONNECT: u16 = 1000;
    pub const EXIT: u16 = 1001;
    pub const ENABLEDEVICE: u16 = 1002;
    pub const DISABLEDEVICE: u16 = 1003;
    pub const RESTART: u16 = 1004;
    pub const POWEROFF: u16 = 1005;
    pub const SLEEP: u16 = 1006;
    pub const RESUME: u16 = 1007;
    pub const TESTVOICE: u16 = 1017;
    pub const REFRESHDATA: u16 = 1013;
    pub const OPTIONS_RRQ: u16 = 11;
    pub const OPTIONS_WRQ: u16 = 12;
    pub const GET_TIME: u16 = 201;
    pub const SET_TIME: u16 = 202;
    pub const GET_VERSION: u16 = 1100;
    pub const GET_FREE_SIZES: u16 = 50;
    pub const ATTLOG_RRQ: u16 = 13;
    pub const CLEAR_ATTLOG: u16 = 15;
    pub const CLEAR_DATA: u16 = 14;
    pub const USER_WRQ: u16 = 8;
    pub const USERTEMP_RRQ: u16 = 9;
    pub const DELETE_USER: u16 = 18;
    pub const GET_USERTEMP: u16 = 88;
    pub const PREPARE_BUFFER: u16 = 1503;
    pub const READ_BUFFER: u16 = 1504;
    pub const FREE_DATA: u16 = 1502;
    pub const PREPARE_DATA: u16 = 1500;
    pub const DATA: u16 = 1501;
    pub const AUTH: u16 = 1102;
    pub const UNLOCK: u16 = 31;
    pub const DOORSTATE_RRQ: u16 = 35;
    pub const WRITE_LCD: u16 = 66;
    pub const CLEAR_LCD: u16 = 67;
    pub const ACK_OK: u16 = 2000;
    pub const ACK_ERROR: u16 = 2001;
    pub const ACK_DATA: u16 = 2002;
    pub const ACK_UNAUTH: u16 = 2005;
    pub const TCP_STILL_ALIVE: u16 = 2007;
}

pub mod fct {
    pub const USER: u32 = 5;
    pub const FINGERTMP: u32 = 7;
    pub const ATTLOG: u32 = 1;
}

pub mod privilege {
    pub const USER_DEFAULT: u8 = 0;
    pub const USER_ENROLLER: u8 = 2;
    pub const USER_MANAGER: u8 = 6;
    pub const USER_ADMIN: u8 = 14;
}

/// Parsed inner packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub command: u16,
    pub checksum: u16,
    pub session_id: u16,
    pub reply_id: u16,
}

impl Header {
    pub fn pack(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..2].copy_from_slice(&self.command.to_le_bytes());
        buf[2..4].copy_from_slice(&self.checksum.to_le_bytes());
        buf[4..6].copy_from_slice(&self.session_id.to_le_bytes());
        buf[6..8].copy_from_slice(&self.reply_id.to_le_bytes());
        buf
    }

    pub fn unpack(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(ZkError::Protocol(format!(
                "short packet header: expected {HEADER_LEN} bytes, got {}",
                buf.len()
            )));
        }
        Ok(Self {
            command: u16::from_le_bytes([buf[0], buf[1]]),
            checksum: u16::from_le_bytes([buf[2], buf[3]]),
            session_id: u16::from_le_bytes([buf[4], buf[5]]),
            reply_id: u16::from_le_bytes([buf[6], buf[7]]),
        })
    }
}

/// Compute the ZK ones-complement checksum over `data`.
///
/// `data` must already have any checksum field zeroed by the caller;
/// this function only implements the fold-and-complement arithmetic.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: i64 = 0;
    let mut chunks = data.chunks_exact(2);
    for word in &mut chunks {
        sum += i64::from(u16::from_le_bytes([word[0], word[1]]));
        if sum > 0xFFFF {
            sum -= 0xFFFF;
        }
    }
    if let [last] = *chunks.remainder() {
        sum += i64::from(last);
        if sum > 0xFFFF {
            sum -= 0xFFFF;
        }
    }
    while sum > 0xFFFF {
        sum -= 0xFFFF;
    }
    let mut result = !sum;
    while result < 0 {
        result += 0xFFFF;
    }
    (result & 0xFFFF) as u16
}

/// Build a complete inner packet: header (with checksum computed) + payload.
pub fn build_packet(command: u16, session_id: u16, reply_id: u16, payload: &[u8]) -> Vec<u8> {
    let mut for_checksum = Vec::with_capacity(HEADER_LEN + payload.len());
    for_checksum.extend_from_slice(&command.to_le_bytes());
    for_checksum.extend_from_slice(&[0, 0]); // checksum field zeroed
    for_checksum.extend_from_slice(&session_id.to_le_bytes());
    for_checksum.extend_from_slice(&reply_id.to_le_bytes());
    for_checksum.extend_from_slice(payload);

    let checksum = checksum(&for_checksum);

    let header = Header {
        command,
        checksum,
        session_id,
        reply_id,
    };

    let mut packet = Vec::with_capacity(HEADER_LEN + payload.len());
    packet.extend_from_slice(&header.pack());
    packet.extend_from_slice(payload);
    packet
}

/// Split a raw inner packet into its header and payload slice.
pub fn parse_packet(packet: &[u8]) -> Result<(Header, &[u8])> {
    let header = Header::unpack(packet)?;
    Ok((header, &packet[HEADER_LEN..]))
}

/// True if `code` counts as success per the protocol's relaxed ack contract
/// (see the ACK_DATA open question in the design notes): any of OK,
/// PREPARE_DATA, or DATA is treated as success; ACK_DATA (2002) is reserved
/// but not distinguished.
pub fn is_ok_code(code: u16) -> bool {
    matches!(code, cmd::ACK_OK | cmd::PREPARE_DATA | cmd::DATA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_golden_read_buffer() {
        let packet = build_packet(cmd::READ_BUFFER, 13838, 3, &[0x00, 0x00, 0x00, 0x00, 0x54, 0x07, 0x00, 0x00]);
        // command=1504, session=13838, reply=3: words sum to 17221, no fold
        // needed, !17221 + 0xFFFF = 0xBCB9.
        assert_eq!(
            packet,
            vec![0xE0, 0x05, 0xB9, 0xBC, 0x0E, 0x36, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x54, 0x07, 0x00, 0x00]
        );
    }

    #[test]
    fn checksum_golden_connect() {
        let packet = build_packet(cmd::CONNECT, 0, 0xFFFE, &[]);
        // command=1000, session=0, reply=0xFFFE: words sum to 66534, folds
        // to 999, !999 + 0xFFFF = 0xFC17.
        assert_eq!(packet, vec![0xE8, 0x03, 0x17, 0xFC, 0x00, 0x00, 0xFE, 0xFF]);
    }

    #[test]
    fn header_pack_unpack_round_trip() {
        let header = Header {
            command: cmd::CONNECT,
            checksum: 0xABCD,
            session_id: 0x1234,
            reply_id: 0x5678,
        };
        let packed = header.pack();
        let unpacked = Header::unpack(&packed).unwrap();
        assert_eq!(header, unpacked);
    }

    #[test]
    fn unpack_rejects_short_buffer() {
        assert!(Header::unpack(&[0, 1, 2]).is_err());
    }

    #[test]
    fn is_ok_code_accepts_the_three_success_codes() {
        assert!(is_ok_code(cmd::ACK_OK));
        assert!(is_ok_code(cmd::PREPARE_DATA));
        assert!(is_ok_code(cmd::DATA));
        assert!(!is_ok_code(cmd::ACK_ERROR));
        assert!(!is_ok_code(cmd::ACK_DATA));
    }
}
