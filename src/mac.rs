use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MAC_OCTETS: usize = 6;
const CANONICAL_LEN: usize = 17;
const SEPARATOR: char = ':';

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MacError {
    #[error("invalid hardware address {0:?}, expected xx:xx:xx:xx:xx:xx")]
    InvalidFormat(String),
}

/// The six raw bytes of a MAC address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HardwareAddress([u8; MAC_OCTETS]);

impl HardwareAddress {
    pub const fn new(octets: [u8; MAC_OCTETS]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; MAC_OCTETS] {
        self.0
    }
}

impl From<[u8; MAC_OCTETS]> for HardwareAddress {
    fn from(octets: [u8; MAC_OCTETS]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for HardwareAddress {
    type Err = MacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl Serialize for HardwareAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// MAC address text with every octet padded to two digits.
///
/// Case is kept as the source printed it, and the hex digits themselves are
/// not checked; use [`MacAddress::hardware_address`] for that.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn from_raw(raw: &str) -> Self {
        Self(normalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn hardware_address(&self) -> Result<HardwareAddress, MacError> {
        decode(&self.0)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pads single-digit octets with a leading zero, e.g. `a:1b:2:3c:4:5` becomes
/// `0a:1b:02:3c:04:05`. Empty octets are dropped.
pub fn normalize(raw: &str) -> String {
    raw.split(SEPARATOR)
        .filter(|octet| !octet.is_empty())
        .map(|octet| {
            if octet.len() == 1 {
                format!("0{octet}")
            } else {
                octet.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(":")
}

fn hex_value(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

/// Parses `xx:xx:xx:xx:xx:xx` into its six bytes.
///
/// Octets are read one or two hex digits at a time, but the whole input must
/// be exactly the 17 characters of the two-digit form.
pub fn decode(text: &str) -> Result<HardwareAddress, MacError> {
    let invalid = || MacError::InvalidFormat(text.to_string());
    let bytes = text.as_bytes();
    let mut octets = [0u8; MAC_OCTETS];
    let mut pos = 0;
    let mut count = 0;

    while pos < bytes.len() && count < MAC_OCTETS {
        let high = hex_value(bytes[pos]).ok_or_else(invalid)?;
        pos += 1;
        let value = match bytes.get(pos) {
            None => high,
            Some(b':') => {
                pos += 1;
                high
            }
            Some(&c) => {
                let low = hex_value(c).ok_or_else(invalid)?;
                pos += 1;
                (high << 4) | low
            }
        };
        octets[count] = value;
        count += 1;

        if count != MAC_OCTETS && bytes.get(pos) == Some(&b':') && bytes[pos - 1] != b':' {
            pos += 1;
        }
    }

    // A single-digit last octet followed by ':' also spans 17 characters.
    if pos != CANONICAL_LEN || bytes.len() != CANONICAL_LEN || bytes[CANONICAL_LEN - 1] == b':' {
        return Err(invalid());
    }
    Ok(HardwareAddress(octets))
}
