//! `ZkTeco`: a single connection to a device, holding session state and
//! exposing the full command surface.

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use super::bulk;
use super::commkey;
use super::error::{Result, ZkError};
use super::protocol::{self, cmd, fct, privilege};
use super::records::{self, AttendanceLayout, UserLayout};
use super::timestamp;
use super::transport::{Mode, Transport};
use super::types::{Attendance, DeviceCounts, FingerTemplate, User};

/// Construction parameters for a connection, mirroring the CLI's config value object.
pub struct Options {
    pub ip: String,
    pub port: u16,
    pub timeout: Duration,
    pub password: u32,
    pub force_udp: bool,
    pub omit_ping: bool,
    pub verbose: bool,
    pub encoding: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 4370,
            timeout: Duration::from_secs(60),
            password: 0,
            force_udp: false,
            omit_ping: false,
            verbose: false,
            encoding: "UTF-8".to_string(),
        }
    }
}

/// A live (or formerly live) connection to a device.
///
/// Single-threaded by construction: replies are correlated by the
/// session/reply ids this struct itself advances, so one `ZkTeco` must
/// never be shared across threads mid-exchange.
pub struct ZkTeco {
    transport: Option<Transport>,
    options: Options,
    session_id: u16,
    reply_id: u16,
    connected: bool,
    device_counts: DeviceCounts,
    next_uid: u16,
    user_packet_size: usize,
}

impl ZkTeco {
    pub fn new(options: Options) -> Self {
        Self {
            transport: None,
            options,
            session_id: 0,
            reply_id: 0xFFFE,
            connected: false,
            device_counts: DeviceCounts::default(),
            next_uid: 1,
            user_packet_size: 72,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn device_counts(&self) -> DeviceCounts {
        self.device_counts
    }

    pub fn next_uid(&self) -> u16 {
        self.next_uid
    }

    /// Open the transport, perform `CMD_CONNECT`, and authenticate if the
    /// device demands it.
    pub fn connect(&mut self) -> Result<()> {
        let endpoint = format!("{}:{}", self.options.ip, self.options.port);
        let mode = if self.options.force_udp { Mode::Udp } else { Mode::Tcp };
        info!("connecting to {endpoint} ({mode:?})");

        let mut transport = Transport::connect(&endpoint, mode, self.options.timeout, self.options.omit_ping)?;

        self.session_id = 0;
        self.reply_id = 0xFFFE;

        let packet = protocol::build_packet(cmd::CONNECT, self.session_id, self.reply_id, &[]);
        transport.send(&packet)?;
        let reply = transport.recv()?;
        self.session_id = reply.header.session_id;
        self.reply_id = reply.header.reply_id;

        if reply.header.command == cmd::ACK_UNAUTH {
            debug!("device demands authentication, deriving commkey");
            let key = commkey::derive(self.options.password, self.session_id);
            self.transport = Some(transport);
            let auth_reply = self.exchange(cmd::AUTH, &key)?;
            if !protocol::is_ok_code(auth_reply.0) {
                self.connected = false;
                self.transport = None;
                return Err(ZkError::Auth("device rejected CMD_AUTH credentials".to_string()));
            }
        } else if !protocol::is_ok_code(reply.header.command) {
            return Err(ZkError::Protocol(format!(
                "CMD_CONNECT failed: device replied {}",
                reply.header.command
            )));
        } else {
            self.transport = Some(transport);
        }

        self.connected = true;
        info!("connected, session_id={:#06x}", self.session_id);

        if let Ok(counts) = self.read_sizes() {
            self.device_counts = counts;
        }
        Ok(())
    }

    /// Send `CMD_EXIT`, close the socket, and clear session state.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        let result = self.exchange(cmd::EXIT, &[]);
        self.transport = None;
        self.connected = false;
        result.map(|_| ())
    }

    fn require_connected(&self) -> Result<()> {
        if !self.connected {
            return Err(ZkError::State("not connected".to_string()));
        }
        Ok(())
    }

    /// Send one packet and read exactly one reply, advancing `reply_id`
    /// from the echoed header. On any transport-level failure the
    /// connection is torn down so subsequent calls fail fast with `state`.
    ///
    /// If the reply comes back as `CMD_PREPARE_DATA` (mode B: the device
    /// streamed its answer directly instead of waiting for a
    /// `CMD_PREPARE_BUFFER` negotiation), the streamed bytes are reassembled
    /// here so callers always see a single complete payload.
    fn exchange(&mut self, command: u16, payload: &[u8]) -> Result<(u16, Vec<u8>)> {
        let outgoing_reply_id = self.reply_id.wrapping_add(1) % 0xFFFF;
        let packet = protocol::build_packet(command, self.session_id, outgoing_reply_id, payload);
        let outcome = (|| -> Result<(u16, u16, Vec<u8>)> {
            let transport = self.transport.as_mut().ok_or_else(|| ZkError::State("not connected".to_string()))?;
            transport.send(&packet)?;
            let reply = transport.recv()?;
            if reply.header.command == cmd::PREPARE_DATA {
                let data = bulk::stream_until_ack(transport, &reply.payload)?;
                return Ok((reply.header.command, reply.header.reply_id, data));
            }
            Ok((reply.header.command, reply.header.reply_id, reply.payload))
        })();

        match outcome {
            Ok((code, echoed_reply_id, payload)) => {
                // Adopt the device's echoed reply_id as our next baseline,
                // rather than just trusting our own increment, so the
                // client stays in sync with the device's view.
                self.reply_id = echoed_reply_id;
                Ok((code, payload))
            }
            Err(e) => {
                warn!("exchange failed, closing connection: {e}");
                self.transport = None;
                self.connected = false;
                Err(e)
            }
        }
    }

    fn expect_ok(&mut self, command: u16, payload: &[u8]) -> Result<Vec<u8>> {
        self.expect_ok_or_conflict(command, payload, false)
    }

    /// Like `expect_ok`, but for commands where a `CMD_ACK_ERROR` reply
    /// plausibly means "that identifier is already taken" rather than a
    /// generic device rejection: callers that set `conflict` report that
    /// case as `ZkError::Exists` instead of `ZkError::Device`.
    fn expect_ok_or_conflict(&mut self, command: u16, payload: &[u8], conflict: bool) -> Result<Vec<u8>> {
        self.require_connected()?;
        let (code, payload) = self.exchange(command, payload)?;
        if protocol::is_ok_code(code) {
            return Ok(payload);
        }
        if conflict && code == cmd::ACK_ERROR {
            return Err(ZkError::Exists(format!("device rejected command {command}: identifier already in use")));
        }
        Err(ZkError::Device(format!("device replied {code} to command {command}")))
    }

    pub fn enable_device(&mut self) -> Result<()> {
        self.expect_ok(cmd::ENABLEDEVICE, &[])?;
        Ok(())
    }

    pub fn disable_device(&mut self) -> Result<()> {
        self.expect_ok(cmd::DISABLEDEVICE, &[])?;
        Ok(())
    }

    /// Run `body` with the device disabled, re-enabling it afterward even
    /// if `body` fails. A secondary failure while re-enabling is logged,
    /// not surfaced, so it never masks the primary error.
    pub fn with_device_disabled<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.disable_device()?;
        let result = body(self);
        if let Err(e) = self.enable_device() {
            warn!("failed to re-enable device after bulk operation: {e}");
        }
        result
    }

    pub fn get_time(&mut self) -> Result<NaiveDateTime> {
        let payload = self.expect_ok(cmd::GET_TIME, &[])?;
        if payload.len() < 4 {
            return Err(ZkError::Protocol("GET_TIME reply too short".to_string()));
        }
        let encoded = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        timestamp::decode_compact(encoded)
    }

    pub fn set_time(&mut self, when: &NaiveDateTime) -> Result<()> {
        let encoded = timestamp::encode_compact(when);
        self.expect_ok(cmd::SET_TIME, &encoded.to_le_bytes())?;
        Ok(())
    }

    pub fn restart(&mut self) -> Result<()> {
        let _ = self.exchange(cmd::RESTART, &[]);
        self.transport = None;
        self.connected = false;
        Ok(())
    }

    pub fn poweroff(&mut self) -> Result<()> {
        let _ = self.exchange(cmd::POWEROFF, &[]);
        self.transport = None;
        self.connected = false;
        Ok(())
    }

    pub fn test_voice(&mut self, index: u32) -> Result<()> {
        self.expect_ok(cmd::TESTVOICE, &index.to_le_bytes())?;
        Ok(())
    }

    pub fn refresh_data(&mut self) -> Result<()> {
        self.expect_ok(cmd::REFRESHDATA, &[])?;
        Ok(())
    }

    /// Unlock the door for `tenths_of_second` tenths of a second.
    pub fn unlock(&mut self, tenths_of_second: u32) -> Result<()> {
        self.expect_ok(cmd::UNLOCK, &tenths_of_second.to_le_bytes())?;
        Ok(())
    }

    pub fn door_state(&mut self) -> Result<bool> {
        let (code, _) = self.exchange(cmd::DOORSTATE_RRQ, &[])?;
        Ok(protocol::is_ok_code(code))
    }

    pub fn write_lcd(&mut self, line: u16, text: &str) -> Result<()> {
        let mut payload = Vec::with_capacity(3 + 1 + text.len());
        payload.extend_from_slice(&line.to_le_bytes());
        payload.push(0); // pad
        payload.push(b' ');
        payload.extend_from_slice(text.as_bytes());
        self.expect_ok(cmd::WRITE_LCD, &payload)?;
        Ok(())
    }

    pub fn clear_lcd(&mut self) -> Result<()> {
        self.expect_ok(cmd::CLEAR_LCD, &[])?;
        Ok(())
    }

    /// Read one `<key>=<value>` option, e.g. `~SerialNumber`, `MAC`,
    /// `~Platform`, `~ZKFPVersion`, `~DeviceName`, `FaceVersion`, `ExtendFmt`.
    pub fn get_option(&mut self, key: &str) -> Result<String> {
        let mut request = key.as_bytes().to_vec();
        request.push(0);
        let payload = self.expect_ok(cmd::GET_VERSION, &request)?;
        let text = String::from_utf8_lossy(&payload);
        let text = text.trim_end_matches('\0');
        Ok(text.split_once('=').map(|(_, v)| v.to_string()).unwrap_or_else(|| text.to_string()))
    }

    /// Read device storage counts/capacities (`CMD_GET_FREE_SIZES`).
    pub fn read_sizes(&mut self) -> Result<DeviceCounts> {
        let payload = self.expect_ok(cmd::GET_FREE_SIZES, &[])?;
        records::parse_free_sizes(&payload)
    }

    /// Run a bulk read and close the connection if it fails, per the
    /// failure-isolation property: a broken bulk transfer must not leave a
    /// half-open socket behind.
    fn bulk_read(&mut self, inner_cmd: u16, fct: u32) -> Result<Vec<u8>> {
        self.require_connected()?;
        let (session_id, reply_id) = (self.session_id, &mut self.reply_id);
        let outcome = match self.transport.as_mut() {
            Some(transport) => bulk::read_with_buffer(transport, session_id, reply_id, inner_cmd, fct, 0),
            None => Err(ZkError::State("not connected".to_string())),
        };
        if outcome.is_err() {
            self.transport = None;
            self.connected = false;
        }
        outcome
    }

    pub fn get_users(&mut self) -> Result<Vec<User>> {
        let buf = self.bulk_read(cmd::USERTEMP_RRQ, fct::USER)?;
        let users = records::parse_users(&buf, self.device_counts.users)?;
        if let Some(max_uid) = users.iter().map(|u| u.uid).max() {
            self.next_uid = max_uid + 1;
        } else {
            self.next_uid = 1;
        }
        self.user_packet_size = if users.is_empty() { 72 } else { estimate_layout(&buf, users.len()) };
        Ok(users)
    }

    pub fn get_attendance_logs(&mut self) -> Result<Vec<Attendance>> {
        self.require_connected()?;
        let known_users = self.get_users().unwrap_or_default();
        let buf = self.bulk_read(cmd::ATTLOG_RRQ, fct::ATTLOG)?;
        let mut records = records::parse_attendance(&buf, self.device_counts.records)?;

        for record in &mut records {
            if let Some(user) = known_users.iter().find(|u| u.uid == record.uid) {
                record.user_id = user.user_id.clone();
            }
        }
        Ok(records)
    }

    pub fn clear_attendance(&mut self) -> Result<()> {
        self.expect_ok(cmd::CLEAR_ATTLOG, &[])?;
        Ok(())
    }

    pub fn clear_all_data(&mut self) -> Result<()> {
        self.expect_ok(cmd::CLEAR_DATA, &[])?;
        Ok(())
    }

    /// Create or replace a user. Allocates `next_uid` when `user.uid == 0`.
    pub fn set_user(&mut self, mut user: User) -> Result<User> {
        if user.uid == 0 {
            user.uid = self.next_uid;
        }
        let layout = UserLayout::from_record_size(self.user_packet_size)?;
        let packed = records::pack_user(&user, layout);
        self.expect_ok_or_conflict(cmd::USER_WRQ, &packed, true)?;
        if user.uid >= self.next_uid {
            self.next_uid = user.uid + 1;
        }
        Ok(user)
    }

    pub fn delete_user(&mut self, uid: u16) -> Result<()> {
        self.expect_ok(cmd::DELETE_USER, &uid.to_le_bytes())?;
        Ok(())
    }

    pub fn get_templates(&mut self) -> Result<Vec<FingerTemplate>> {
        let buf = self.bulk_read(cmd::PREPARE_DATA, fct::FINGERTMP)?;
        parse_templates(&buf)
    }

    pub fn get_user_template(&mut self, uid: u16, finger_id: u8) -> Result<FingerTemplate> {
        let mut payload = Vec::with_capacity(4);
        payload.extend_from_slice(&uid.to_le_bytes());
        payload.push(finger_id);
        payload.push(0);
        let data = self.expect_ok(cmd::GET_USERTEMP, &payload)?;
        Ok(FingerTemplate {
            uid,
            finger_id,
            valid: if data.is_empty() { 0 } else { 1 },
            template_bytes: data,
        })
    }
}

impl Drop for ZkTeco {
    fn drop(&mut self) {
        if self.connected {
            if let Err(e) = self.disconnect() {
                warn!("failed to disconnect cleanly: {e}");
            }
        }
    }
}

/// Guess the user record layout from a bulk buffer whose declared count we
/// don't yet trust (used only to remember for the next `set_user`).
fn estimate_layout(buf: &[u8], count: usize) -> usize {
    if count == 0 {
        return 72;
    }
    let body_len = buf.len().saturating_sub(4);
    let per_record = body_len / count;
    if per_record == 28 { 28 } else { 72 }
}

fn parse_templates(buf: &[u8]) -> Result<Vec<FingerTemplate>> {
    // Template records are variable-length: u16 uid, u8 finger_id, u8 valid,
    // u16 len, then `len` bytes of template data, repeated.
    let body = if buf.len() >= 4 { &buf[4..] } else { &buf[..] };
    let mut templates = Vec::new();
    let mut offset = 0;
    while offset + 6 <= body.len() {
        let uid = u16::from_le_bytes([body[offset], body[offset + 1]]);
        let finger_id = body[offset + 2];
        let valid = body[offset + 3];
        let len = u16::from_le_bytes([body[offset + 4], body[offset + 5]]) as usize;
        offset += 6;
        if offset + len > body.len() {
            break;
        }
        templates.push(FingerTemplate {
            uid,
            finger_id,
            valid,
            template_bytes: body[offset..offset + len].to_vec(),
        });
        offset += len;
    }
    Ok(templates)
}

pub use privilege as user_privilege;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    fn write_inner_packet(stream: &mut TcpStream, command: u16, session_id: u16, reply_id: u16, payload: &[u8]) {
        let packet = protocol::build_packet(command, session_id, reply_id, payload);
        let mut frame = Vec::new();
        frame.extend_from_slice(&0x5050u16.to_le_bytes());
        frame.extend_from_slice(&0x7D82u16.to_le_bytes());
        frame.extend_from_slice(&(packet.len() as u32).to_le_bytes());
        frame.extend_from_slice(&packet);
        stream.write_all(&frame).unwrap();
    }

    fn read_inner_packet(stream: &mut TcpStream) -> (u16, u16, Vec<u8>) {
        let mut outer = [0u8; 8];
        stream.read_exact(&mut outer).unwrap();
        let len = u32::from_le_bytes([outer[4], outer[5], outer[6], outer[7]]) as usize;
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).unwrap();
        let (header, payload) = protocol::parse_packet(&body).unwrap();
        (header.command, header.reply_id, payload.to_vec())
    }

    fn options_for(addr: &std::net::SocketAddr) -> Options {
        Options {
            ip: addr.ip().to_string(),
            port: addr.port(),
            timeout: Duration::from_secs(2),
            password: 0,
            force_udp: false,
            omit_ping: true,
            verbose: false,
            encoding: "UTF-8".to_string(),
        }
    }

    #[test]
    fn connect_succeeds_without_auth() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::CONNECT);
            write_inner_packet(&mut stream, cmd::ACK_OK, 42, reply_id, &[]);

            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::GET_FREE_SIZES);
            let mut payload = vec![0u8; 80];
            payload[4 * 4..4 * 4 + 4].copy_from_slice(&0i32.to_le_bytes());
            write_inner_packet(&mut stream, cmd::ACK_OK, 42, reply_id, &payload);
        });

        let mut client = ZkTeco::new(options_for(&addr));
        client.connect().unwrap();
        assert!(client.is_connected());
        assert_eq!(client.session_id, 42);
        server.join().unwrap();
    }

    #[test]
    fn auth_flow_succeeds_after_unauth_challenge() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::CONNECT);
            write_inner_packet(&mut stream, cmd::ACK_UNAUTH, 7, reply_id, &[]);

            let (command, reply_id, payload) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::AUTH);
            assert_eq!(payload, commkey::derive(0, 7));
            write_inner_packet(&mut stream, cmd::ACK_OK, 7, reply_id, &[]);

            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::GET_FREE_SIZES);
            write_inner_packet(&mut stream, cmd::ACK_OK, 7, reply_id, &[0u8; 80]);
        });

        let mut client = ZkTeco::new(options_for(&addr));
        client.connect().unwrap();
        assert!(client.is_connected());
        server.join().unwrap();
    }

    #[test]
    fn auth_flow_fails_after_double_unauth() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::CONNECT);
            write_inner_packet(&mut stream, cmd::ACK_UNAUTH, 7, reply_id, &[]);

            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::AUTH);
            write_inner_packet(&mut stream, cmd::ACK_UNAUTH, 7, reply_id, &[]);
        });

        let mut client = ZkTeco::new(options_for(&addr));
        let result = client.connect();
        assert!(matches!(result, Err(ZkError::Auth(_))));
        assert!(!client.is_connected());
        server.join().unwrap();
    }

    #[test]
    fn bulk_read_failure_closes_the_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::CONNECT);
            write_inner_packet(&mut stream, cmd::ACK_OK, 1, reply_id, &[]);

            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::GET_FREE_SIZES);
            write_inner_packet(&mut stream, cmd::ACK_OK, 1, reply_id, &[0u8; 80]);

            // get_users -> PREPARE_BUFFER; drop the connection instead of replying.
            let _ = read_inner_packet(&mut stream);
            drop(stream);
        });

        let mut client = ZkTeco::new(options_for(&addr));
        client.connect().unwrap();
        let result = client.get_users();
        assert!(result.is_err());
        assert!(!client.is_connected());
        server.join().unwrap();
    }

    #[test]
    fn set_user_reports_conflict_as_exists() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::CONNECT);
            write_inner_packet(&mut stream, cmd::ACK_OK, 1, reply_id, &[]);

            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::GET_FREE_SIZES);
            write_inner_packet(&mut stream, cmd::ACK_OK, 1, reply_id, &[0u8; 80]);

            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::USER_WRQ);
            write_inner_packet(&mut stream, cmd::ACK_ERROR, 1, reply_id, &[]);
        });

        let mut client = ZkTeco::new(options_for(&addr));
        client.connect().unwrap();
        let user = User {
            uid: 5,
            user_id: "42".to_string(),
            name: "Taken".to_string(),
            ..Default::default()
        };
        let result = client.set_user(user);
        assert!(matches!(result, Err(ZkError::Exists(_))));
        server.join().unwrap();
    }

    #[test]
    fn exchange_reassembles_mode_b_streamed_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::CONNECT);
            write_inner_packet(&mut stream, cmd::ACK_OK, 1, reply_id, &[]);

            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::GET_FREE_SIZES);
            write_inner_packet(&mut stream, cmd::ACK_OK, 1, reply_id, &[0u8; 80]);

            // The device answers GET_VERSION directly with CMD_PREPARE_DATA
            // instead of negotiating through CMD_PREPARE_BUFFER (mode B),
            // with the full reply inlined after the 8-byte size prefix.
            let (command, reply_id, _) = read_inner_packet(&mut stream);
            assert_eq!(command, cmd::GET_VERSION);
            let data = b"~Platform=1.0";
            let mut prepare_payload = vec![0u8; protocol::HEADER_LEN];
            prepare_payload[1..5].copy_from_slice(&(data.len() as u32).to_le_bytes());
            prepare_payload.extend_from_slice(data);
            write_inner_packet(&mut stream, cmd::PREPARE_DATA, 1, reply_id, &prepare_payload);
            write_inner_packet(&mut stream, cmd::ACK_OK, 1, reply_id, &[]);
        });

        let mut client = ZkTeco::new(options_for(&addr));
        client.connect().unwrap();
        let value = client.get_option("~Platform").unwrap();
        assert_eq!(value, "1.0");
        server.join().unwrap();
    }
}
