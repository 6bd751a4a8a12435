pub mod arp;
pub mod command;
pub mod devinfo;
pub mod host;
pub mod mac;
pub mod ping;
pub mod wol;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Command(#[from] command::CommandError),
    #[error(transparent)]
    Mac(#[from] mac::MacError),
    #[error(transparent)]
    DeviceInfo(#[from] devinfo::DeviceInfoError),
    #[error(transparent)]
    Wol(#[from] wol::WolError),
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        source: std::io::Error,
    },
    #[error("{0} has no IPv4 address")]
    NoIpv4Address(String),
}

pub type Result<T> = std::result::Result<T, Error>;
