//! Socket-level framing: the TCP outer frame and UDP datagram modes.
//!
//! This module owns the raw socket and turns it into a send/receive pair
//! of inner packets. It does not know about sessions, checksums, or
//! commands beyond recognizing the TCP keep-alive frame.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::error::{Result, ZkError};
use super::protocol::{self, Header};

/// Magic bytes that precede every TCP inner packet.
const MAGIC1: u16 = 0x5050;
const MAGIC2: u16 = 0x7D82;
const OUTER_FRAME_LEN: usize = 8;

/// Which socket family carries the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Tcp,
    Udp,
}

/// One fully-received reply: its inner header, payload, and (for TCP) the
/// outer frame's declared length, used by the bulk transfer engine to
/// figure out how many more raw bytes remain to be read.
#[derive(Debug)]
pub struct Reply {
    pub header: Header,
    pub payload: Vec<u8>,
    pub tcp_frame_length: Option<u32>,
}

enum Socket {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

/// An open socket to a device, framing inner packets per `mode`.
pub struct Transport {
    socket: Socket,
    mode: Mode,
}

impl Transport {
    /// Open a transport to `endpoint`. For TCP, optionally probes the
    /// endpoint first (`omit_ping = false`) so connection failures are
    /// reported quickly and distinctly from a later protocol timeout.
    pub fn connect(endpoint: &str, mode: Mode, timeout: Duration, omit_ping: bool) -> Result<Self> {
        let addr = resolve(endpoint)?;

        if mode == Mode::Tcp && !omit_ping {
            debug!("probing {endpoint} before connecting");
            TcpStream::connect_timeout(&addr, Duration::from_secs(5))
                .map_err(|e| ZkError::Network(format!("device unreachable at {endpoint}: {e}")))?;
        }

        let socket = match mode {
            Mode::Tcp => {
                let stream = TcpStream::connect_timeout(&addr, timeout)?;
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                stream.set_nodelay(true)?;
                Socket::Tcp(stream)
            }
            Mode::Udp => {
                let socket = UdpSocket::bind("0.0.0.0:0")?;
                socket.set_read_timeout(Some(timeout))?;
                socket.set_write_timeout(Some(timeout))?;
                socket.connect(addr)?;
                Socket::Udp(socket)
            }
        };

        Ok(Self { socket, mode })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Send one inner packet, framing it per the transport mode.
    pub fn send(&mut self, packet: &[u8]) -> Result<()> {
        match (&mut self.socket, self.mode) {
            (Socket::Tcp(stream), Mode::Tcp) => {
                let mut framed = Vec::with_capacity(OUTER_FRAME_LEN + packet.len());
                framed.extend_from_slice(&MAGIC1.to_le_bytes());
                framed.extend_from_slice(&MAGIC2.to_le_bytes());
                framed.extend_from_slice(&(packet.len() as u32).to_le_bytes());
                framed.extend_from_slice(packet);
                stream.write_all(&framed)?;
                Ok(())
            }
            (Socket::Udp(socket), Mode::Udp) => {
                socket.send(packet)?;
                Ok(())
            }
            _ => unreachable!("transport mode and socket variant must match"),
        }
    }

    /// Receive exactly one inner packet.
    pub fn recv(&mut self) -> Result<Reply> {
        match (&mut self.socket, self.mode) {
            (Socket::Tcp(stream), Mode::Tcp) => recv_tcp(stream),
            (Socket::Udp(socket), Mode::Udp) => recv_udp(socket),
            _ => unreachable!("transport mode and socket variant must match"),
        }
    }

    /// Read exactly `n` additional raw bytes (used by the bulk transfer
    /// engine when a chunk's declared length exceeds what arrived with
    /// the triggering reply).
    pub fn read_raw(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        match &mut self.socket {
            Socket::Tcp(stream) => stream.read_exact(&mut buf)?,
            Socket::Udp(socket) => {
                let mut received = 0;
                while received < n {
                    received += socket.recv(&mut buf[received..])?;
                }
            }
        }
        Ok(buf)
    }
}

fn resolve(endpoint: &str) -> Result<SocketAddr> {
    endpoint
        .to_socket_addrs()
        .map_err(|e| ZkError::Network(format!("cannot resolve {endpoint}: {e}")))?
        .next()
        .ok_or_else(|| ZkError::Network(format!("no address for {endpoint}")))
}

fn recv_tcp(stream: &mut TcpStream) -> Result<Reply> {
    let mut outer = [0u8; OUTER_FRAME_LEN];
    stream.read_exact(&mut outer)?;

    let magic1 = u16::from_le_bytes([outer[0], outer[1]]);
    let magic2 = u16::from_le_bytes([outer[2], outer[3]]);
    if magic1 != MAGIC1 || magic2 != MAGIC2 {
        return Err(ZkError::Protocol(format!(
            "bad outer frame magic: {magic1:#06x} {magic2:#06x}"
        )));
    }
    let length = u32::from_le_bytes([outer[4], outer[5], outer[6], outer[7]]);

    if length as usize <= protocol::HEADER_LEN {
        if length > 0 {
            let mut discard = vec![0u8; length as usize];
            stream.read_exact(&mut discard)?;
        }
        trace!("received TCP keep-alive frame (length={length})");
        return Ok(Reply {
            header: Header {
                command: protocol::cmd::TCP_STILL_ALIVE,
                checksum: 0,
                session_id: 0,
                reply_id: 0,
            },
            payload: Vec::new(),
            tcp_frame_length: Some(length),
        });
    }

    let mut body = vec![0u8; length as usize];
    stream.read_exact(&mut body)?;

    let (header, payload) = protocol::parse_packet(&body)?;
    Ok(Reply {
        header,
        payload: payload.to_vec(),
        tcp_frame_length: Some(length),
    })
}

fn recv_udp(socket: &mut UdpSocket) -> Result<Reply> {
    let mut buf = [0u8; 65536];
    let n = socket.recv(&mut buf)?;
    if n < protocol::HEADER_LEN {
        warn!("short UDP datagram: {n} bytes");
        return Err(ZkError::Protocol(format!("short UDP datagram: {n} bytes")));
    }
    let (header, payload) = protocol::parse_packet(&buf[..n])?;
    Ok(Reply {
        header,
        payload: payload.to_vec(),
        tcp_frame_length: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn recv_tcp_parses_a_normal_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let packet = protocol::build_packet(protocol::cmd::ACK_OK, 7, 1, &[]);
            let mut frame = Vec::new();
            frame.extend_from_slice(&MAGIC1.to_le_bytes());
            frame.extend_from_slice(&MAGIC2.to_le_bytes());
            frame.extend_from_slice(&(packet.len() as u32).to_le_bytes());
            frame.extend_from_slice(&packet);
            stream.write_all(&frame).unwrap();
        });

        let mut transport = Transport::connect(&addr.to_string(), Mode::Tcp, Duration::from_secs(2), true).unwrap();
        let reply = transport.recv().unwrap();
        assert_eq!(reply.header.command, protocol::cmd::ACK_OK);
        assert_eq!(reply.header.session_id, 7);
        server.join().unwrap();
    }

    #[test]
    fn recv_tcp_reports_keep_alive_as_still_alive() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut frame = Vec::new();
            frame.extend_from_slice(&MAGIC1.to_le_bytes());
            frame.extend_from_slice(&MAGIC2.to_le_bytes());
            frame.extend_from_slice(&0u32.to_le_bytes());
            stream.write_all(&frame).unwrap();
        });

        let mut transport = Transport::connect(&addr.to_string(), Mode::Tcp, Duration::from_secs(2), true).unwrap();
        let reply = transport.recv().unwrap();
        assert_eq!(reply.header.command, protocol::cmd::TCP_STILL_ALIVE);
        assert!(reply.payload.is_empty());
        server.join().unwrap();
    }

    #[test]
    fn connect_fails_fast_when_unreachable() {
        // Port 1 is reserved and nothing should be listening there.
        let result = Transport::connect("127.0.0.1:1", Mode::Tcp, Duration::from_millis(200), false);
        assert!(result.is_err());
    }
}
