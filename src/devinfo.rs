// Device model lookup through the `_device-info._tcp` mDNS service, which
// many Apple devices (and some NAS boxes) answer with a TXT record such as
// "model=AirPort4,88".

use crate::command::{CommandError, Lookup, TextCommandSource};
use log::{debug, info};
use std::fmt;
use thiserror::Error;

const DIG: &str = "dig";
const MODEL_KEY: &str = "model";

pub const MDNS_MULTICAST_ADDRESS: &str = "224.0.0.251";
pub const MDNS_PORT: u16 = 5353;
pub const DEVICE_INFO_SERVICE: &str = "_device-info._tcp";
pub const LOCAL_DOMAIN: &str = "local";
pub const TXT_QUERY: &str = "TXT";

/// Printed in place of a model when the device did not advertise one.
pub const MODEL_NOT_FOUND: &str = "model not found";

#[derive(Error, Debug)]
pub enum DeviceInfoError {
    #[error("device info query failed: {0}")]
    Query(#[from] CommandError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DigQuery {
    /// Server to ask. `None` asks the mDNS multicast group.
    pub server: Option<String>,
    pub host_name: String,
    pub port: u16,
    pub service_type: String,
    pub domain: String,
    pub query_type: String,
}

impl DigQuery {
    pub fn new(
        server: &str,
        host_name: &str,
        port: u16,
        service_type: &str,
        domain: &str,
        query_type: &str,
    ) -> Self {
        DigQuery {
            server: if server.is_empty() {
                None
            } else {
                Some(server.to_string())
            },
            host_name: host_name.to_string(),
            port,
            service_type: service_type.to_string(),
            domain: domain.to_string(),
            query_type: query_type.to_string(),
        }
    }

    /// TXT query for `host_name._device-info._tcp.local` on the mDNS port.
    pub fn device_info(host_name: &str, server: &str) -> Self {
        Self::new(
            server,
            host_name,
            MDNS_PORT,
            DEVICE_INFO_SERVICE,
            LOCAL_DOMAIN,
            TXT_QUERY,
        )
    }

    pub fn server(&self) -> &str {
        self.server.as_deref().unwrap_or(MDNS_MULTICAST_ADDRESS)
    }

    pub fn record_name(&self) -> String {
        format!("{}.{}.{}", self.host_name, self.service_type, self.domain)
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            format!("@{}", self.server()),
            format!("-p{}", self.port),
            self.record_name(),
            self.query_type.clone(),
        ]
    }
}

impl fmt::Display for DigQuery {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", DIG, self.args().join(" "))
    }
}

fn txt_tokens(blob: &str) -> impl Iterator<Item = &str> {
    blob.split(|c: char| c == '"' || c == '=')
        .filter(|token| !token.is_empty())
}

#[derive(Debug, PartialEq)]
enum ModelScan<'a> {
    Scanning,
    KeyMatched,
    Done(&'a str),
}

impl<'a> ModelScan<'a> {
    fn step(self, token: &'a str) -> Self {
        match self {
            Self::Scanning | Self::KeyMatched if token == MODEL_KEY => Self::KeyMatched,
            Self::Scanning => Self::Scanning,
            Self::KeyMatched => Self::Done(token),
            done => done,
        }
    }
}

/// Pulls the value of the `model` key out of TXT record text such as
/// `"model=AirPort4,88"`.
pub fn extract_model(blob: &str) -> Option<String> {
    let mut state = ModelScan::Scanning;
    for token in txt_tokens(blob) {
        state = state.step(token);
        if let ModelScan::Done(model) = state {
            return Some(model.to_string());
        }
    }
    None
}

/// First whitespace-separated token containing `=` in the dig output.
pub fn find_txt_record<S: AsRef<str>>(lines: &[S]) -> Option<&str> {
    lines
        .iter()
        .find_map(|line| line.as_ref().split_whitespace().find(|token| token.contains('=')))
}

/// Asks `host` for its device model. An empty `ip` sends the query to the
/// multicast group instead of the host itself.
pub fn resolve(
    source: &dyn TextCommandSource,
    host: &str,
    ip: &str,
) -> Result<Lookup<String>, DeviceInfoError> {
    let query = DigQuery::device_info(host, ip);
    debug!("querying {}", query);
    let lines = source.run(DIG, &query.args())?;
    let model = find_txt_record(&lines).and_then(extract_model);
    match &model {
        Some(model) => info!("{} is a {}", host, model),
        None => debug!("{} did not advertise a model", host),
    }
    Ok(model.into())
}

pub fn describe(lookup: &Lookup<String>) -> &str {
    match lookup {
        Lookup::Found(model) => model.as_str(),
        Lookup::NotFound => MODEL_NOT_FOUND,
    }
}
