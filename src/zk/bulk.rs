//! Bulk transfer engine: prepare-buffer/read-chunks (mode A) and
//! stream-until-ack (mode B), for replies too large for a single packet.

use tracing::debug;

use super::error::{Result, ZkError};
use super::protocol::{self, cmd};
use super::transport::{Mode, Transport};

/// TCP chunks top out just under 64 KiB; UDP stays inside one datagram.
const MAX_CHUNK_TCP: usize = 0xFFC0;
const MAX_CHUNK_UDP: usize = 16 * 1024;

const CHUNK_RETRIES: u32 = 3;

fn max_chunk(mode: Mode) -> usize {
    match mode {
        Mode::Tcp => MAX_CHUNK_TCP,
        Mode::Udp => MAX_CHUNK_UDP,
    }
}

fn next_reply_id(reply_id: &mut u16) -> u16 {
    let current = *reply_id;
    *reply_id = reply_id.wrapping_add(1) % 0xFFFF;
    current
}

fn send_and_recv(
    transport: &mut Transport,
    session_id: u16,
    reply_id: &mut u16,
    command: u16,
    payload: &[u8],
) -> Result<(protocol::Header, Vec<u8>, Option<u32>)> {
    let id = next_reply_id(reply_id);
    let packet = protocol::build_packet(command, session_id, id, payload);
    transport.send(&packet)?;
    let reply = transport.recv()?;
    Ok((reply.header, reply.payload, reply.tcp_frame_length))
}

/// Run the prepare-buffer/read-chunks sequence for `inner_cmd` (e.g.
/// `CMD_USERTEMP_RRQ` or `CMD_ATTLOG_RRQ`) and return the raw buffer,
/// prefixed by its own 4-byte `u32_le` total size so downstream record
/// parsing can treat every bulk read uniformly.
pub fn read_with_buffer(
    transport: &mut Transport,
    session_id: u16,
    reply_id: &mut u16,
    inner_cmd: u16,
    fct: u32,
    ext: u32,
) -> Result<Vec<u8>> {
    let mut cmd_data = Vec::with_capacity(11);
    cmd_data.push(1u8);
    cmd_data.extend_from_slice(&inner_cmd.to_le_bytes());
    cmd_data.extend_from_slice(&fct.to_le_bytes());
    cmd_data.extend_from_slice(&ext.to_le_bytes());

    debug!("PREPARE_BUFFER: inner_cmd={inner_cmd}, fct={fct}, ext={ext}");
    let (header, payload, tcp_len) = send_and_recv(transport, session_id, reply_id, cmd::PREPARE_BUFFER, &cmd_data)?;

    if header.command == cmd::DATA {
        let data = complete_data_reply(transport, &payload, tcp_len)?;
        return Ok(with_size_prefix(data));
    }
    if header.command != cmd::PREPARE_DATA {
        return Err(ZkError::Protocol(format!(
            "PREPARE_BUFFER: unexpected reply code {}",
            header.command
        )));
    }

    let total_size = read_total_size(&payload)?;
    debug!("PREPARE_DATA: total size = {total_size} bytes");
    if total_size == 0 {
        return Ok(with_size_prefix(Vec::new()));
    }

    let chunk_size = max_chunk(transport.mode());
    let packets = total_size / chunk_size;
    let remainder = total_size % chunk_size;

    let mut all_data = Vec::with_capacity(total_size);
    let mut start: u32 = 0;
    for i in 0..packets {
        debug!("reading chunk {}/{packets} at offset {start}", i + 1);
        let chunk = read_chunk(transport, session_id, reply_id, start, chunk_size as u32)?;
        all_data.extend_from_slice(&chunk);
        start += chunk_size as u32;
    }
    if remainder > 0 {
        let chunk = read_chunk(transport, session_id, reply_id, start, remainder as u32)?;
        all_data.extend_from_slice(&chunk);
    }

    let free_packet = protocol::build_packet(cmd::FREE_DATA, session_id, next_reply_id(reply_id), &[]);
    transport.send(&free_packet)?;
    let freed = transport.recv()?;
    if !protocol::is_ok_code(freed.header.command) {
        return Err(ZkError::Protocol(format!(
            "CMD_FREE_DATA failed: device replied {}",
            freed.header.command
        )));
    }

    Ok(with_size_prefix(all_data))
}

fn read_chunk(transport: &mut Transport, session_id: u16, reply_id: &mut u16, start: u32, size: u32) -> Result<Vec<u8>> {
    let mut cmd_data = Vec::with_capacity(8);
    cmd_data.extend_from_slice(&(start as i32).to_le_bytes());
    cmd_data.extend_from_slice(&(size as i32).to_le_bytes());

    let mut last_err = None;
    for retry in 0..CHUNK_RETRIES {
        if retry > 0 {
            debug!("retry {retry}/{CHUNK_RETRIES} for chunk at {start}");
        }
        let (header, payload, tcp_len) = match send_and_recv(transport, session_id, reply_id, cmd::READ_BUFFER, &cmd_data) {
            Ok(v) => v,
            Err(e) => {
                last_err = Some(e);
                continue;
            }
        };
        match reassemble_chunk(transport, header.command, &payload, tcp_len) {
            Ok(data) => return Ok(data),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| ZkError::Protocol(format!("failed to read chunk at offset {start} after {CHUNK_RETRIES} retries"))))
}

fn reassemble_chunk(transport: &mut Transport, code: u16, payload: &[u8], tcp_len: Option<u32>) -> Result<Vec<u8>> {
    match (code, transport.mode()) {
        (c, Mode::Tcp) if c == cmd::DATA => complete_data_reply(transport, payload, tcp_len),
        (c, Mode::Tcp) if c == cmd::PREPARE_DATA => {
            let size = read_total_size(payload)?;
            receive_tcp_streamed(transport, payload, size)
        }
        (_, Mode::Udp) => reassemble_udp(transport, code, payload),
        (other, Mode::Tcp) => Err(ZkError::Protocol(format!("unexpected chunk reply code {other}"))),
    }
}

fn complete_data_reply(transport: &mut Transport, payload: &[u8], tcp_len: Option<u32>) -> Result<Vec<u8>> {
    let mut data = payload.to_vec();
    if let Some(frame_len) = tcp_len {
        let expected = (frame_len as usize).saturating_sub(protocol::HEADER_LEN);
        if data.len() < expected {
            let more = transport.read_raw(expected - data.len())?;
            data.extend_from_slice(&more);
        }
    }
    Ok(data)
}

/// Mode B: a plain `exchange` directly returned `CMD_PREPARE_DATA` instead of
/// going through `CMD_PREPARE_BUFFER`; enter the same reassembly loop, with
/// the size taken from the size field of the current payload. Returns the
/// raw reassembled bytes, unprefixed, so `exchange` can hand them back to
/// callers as if they were an ordinary single-packet reply.
pub fn stream_until_ack(transport: &mut Transport, payload: &[u8]) -> Result<Vec<u8>> {
    let size = read_total_size(payload)?;
    receive_tcp_streamed(transport, payload, size)
}

fn receive_tcp_streamed(transport: &mut Transport, payload: &[u8], size: usize) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(size);
    if payload.len() > protocol::HEADER_LEN {
        data.extend_from_slice(&payload[protocol::HEADER_LEN..]);
    }
    if data.len() < size {
        let need = size - data.len();
        let more = transport.read_raw(need)?;
        data.extend_from_slice(&more);
    }

    let reply = transport.recv()?;
    if !protocol::is_ok_code(reply.header.command) {
        return Err(ZkError::Protocol(format!(
            "expected CMD_ACK_OK terminator after streamed data, got {}",
            reply.header.command
        )));
    }
    Ok(data)
}

fn reassemble_udp(transport: &mut Transport, first_code: u16, first_payload: &[u8]) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut code = first_code;
    let mut payload = first_payload.to_vec();
    loop {
        if code == cmd::DATA {
            data.extend_from_slice(&payload);
        } else if protocol::is_ok_code(code) {
            break;
        } else {
            return Err(ZkError::Protocol(format!("UDP chunk framing error: code {code}")));
        }
        let reply = transport.recv()?;
        code = reply.header.command;
        payload = reply.payload;
    }
    Ok(data)
}

fn read_total_size(payload: &[u8]) -> Result<usize> {
    if payload.len() < 5 {
        return Err(ZkError::Protocol(format!(
            "PREPARE_DATA payload too small to hold a size: {} bytes",
            payload.len()
        )));
    }
    Ok(u32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]) as usize)
}

fn with_size_prefix(data: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&data);
    out
}
