use crate::mac::{self, HardwareAddress, MacError};
use log::{debug, info};
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use thiserror::Error;

const SYNCHRONIZATION_SCHEME: [u8; 6] = [0xff; 6];

pub const DEFAULT_PORT: u16 = 60000;
pub const DEFAULT_REPEAT_COUNT: usize = 16;

#[derive(Error, Debug)]
pub enum WolError {
    #[error("not sending magic packet: {0}")]
    InvalidAddress(#[from] MacError),
    #[error("could not open broadcast socket: {0}")]
    Socket(#[source] io::Error),
    #[error("could not send magic packet to {destination}: {source}")]
    Send {
        destination: SocketAddrV4,
        source: io::Error,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct WolConfig {
    pub broadcast_address: Ipv4Addr,
    pub port: u16,
    /// How many times the hardware address follows the sync bytes.
    pub repeat_count: usize,
}

impl Default for WolConfig {
    fn default() -> Self {
        WolConfig {
            broadcast_address: Ipv4Addr::BROADCAST,
            port: DEFAULT_PORT,
            repeat_count: DEFAULT_REPEAT_COUNT,
        }
    }
}

impl WolConfig {
    pub fn destination(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.broadcast_address, self.port)
    }
}

/// Six 0xff bytes followed by the target's hardware address, repeated.
#[derive(Clone, Debug, PartialEq)]
pub struct MagicPacket(Vec<u8>);

impl MagicPacket {
    pub fn new(mac_address: HardwareAddress, repeat_count: usize) -> Self {
        let mut data: Vec<u8> = SYNCHRONIZATION_SCHEME.to_vec();
        for _ in 0..repeat_count {
            data.extend(&mac_address.octets());
        }
        MagicPacket(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HardwareAddress> for MagicPacket {
    fn from(mac_address: HardwareAddress) -> Self {
        Self::new(mac_address, DEFAULT_REPEAT_COUNT)
    }
}

/// Broadcasts a magic packet for `mac` to 255.255.255.255:60000.
pub fn send(mac: &str) -> Result<(), WolError> {
    send_with(&WolConfig::default(), mac)
}

/// Validates `mac` before any socket is opened.
pub fn send_with(config: &WolConfig, mac: &str) -> Result<(), WolError> {
    let mac_address = mac::decode(mac)?;
    wake_with(config, mac_address)
}

pub fn wake(mac_address: HardwareAddress) -> Result<(), WolError> {
    wake_with(&WolConfig::default(), mac_address)
}

pub fn wake_with(config: &WolConfig, mac_address: HardwareAddress) -> Result<(), WolError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(WolError::Socket)?;
    socket.set_broadcast(true).map_err(WolError::Socket)?;

    let packet = MagicPacket::new(mac_address, config.repeat_count);
    let destination = config.destination();
    debug!(
        "sending {} byte magic packet for {} to {}",
        packet.len(),
        mac_address,
        destination
    );
    let sent = socket
        .send_to(packet.as_bytes(), destination)
        .map_err(|source| WolError::Send {
            destination,
            source,
        })?;
    if sent != packet.len() {
        return Err(WolError::Send {
            destination,
            source: io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", sent, packet.len()),
            ),
        });
    }
    info!("woke {} via {}", mac_address, destination);
    Ok(())
}
