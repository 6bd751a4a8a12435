use crate::command::{Lookup, TextCommandSource};
use crate::mac::MacAddress;
use crate::{arp, devinfo, ping, Error, Result};
use log::debug;
use serde::Serialize;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

/// Each step's outcome, or the reason it could not run.
pub type StepResult<T> = std::result::Result<T, String>;

#[derive(Debug, Serialize)]
pub struct HostReport {
    pub host: String,
    pub ip: Ipv4Addr,
    pub reachable: StepResult<bool>,
    pub mac: StepResult<Lookup<MacAddress>>,
    /// Only present when device info was requested.
    pub model: Option<StepResult<Lookup<String>>>,
}

/// Dotted quads are returned as-is; anything else goes through the system
/// resolver and the first IPv4 answer wins.
pub fn resolve_ipv4(host: &str) -> Result<Ipv4Addr> {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(ip);
    }
    let addrs = (host, 0).to_socket_addrs().map_err(|source| Error::Resolve {
        host: host.to_string(),
        source,
    })?;
    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| Error::NoIpv4Address(host.to_string()))
}

/// The mDNS instance name for `host`: `studio.local.` becomes `studio`.
fn instance_name(host: &str) -> &str {
    let host = host.trim_end_matches('.');
    host.strip_suffix(".local").unwrap_or(host)
}

/// Pings `host`, looks up its MAC address and, if asked, its device model.
///
/// Only failing to resolve `host` to an address aborts the survey. Every
/// other step records its own error in the report.
pub fn survey(
    source: &dyn TextCommandSource,
    host: &str,
    device_info: bool,
) -> Result<HostReport> {
    let ip = resolve_ipv4(host)?;
    let ip_text = ip.to_string();
    debug!("surveying {} at {}", host, ip_text);

    let reachable = ping::is_reachable(source, &ip_text).map_err(|e| e.to_string());
    let mac = arp::resolve(source, &ip_text).map_err(|e| e.to_string());
    let model = if device_info {
        let name = instance_name(host);
        Some(devinfo::resolve(source, name, &ip_text).map_err(|e| e.to_string()))
    } else {
        None
    };

    Ok(HostReport {
        host: host.to_string(),
        ip,
        reachable,
        mac,
        model,
    })
}

impl fmt::Display for HostReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "host:      {} ({})", self.host, self.ip)?;
        match &self.reachable {
            Ok(true) => writeln!(f, "reachable: yes")?,
            Ok(false) => writeln!(f, "reachable: no")?,
            Err(e) => writeln!(f, "reachable: error: {}", e)?,
        }
        match &self.mac {
            Ok(mac) => writeln!(f, "mac:       {}", arp::describe(mac))?,
            Err(e) => writeln!(f, "mac:       error: {}", e)?,
        }
        match &self.model {
            Some(Ok(model)) => writeln!(f, "model:     {}", devinfo::describe(model))?,
            Some(Err(e)) => writeln!(f, "model:     error: {}", e)?,
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::command::canned::CannedSource;
    use crate::host::*;

    #[test]
    fn test_resolve_ipv4_literal() {
        assert_eq!(
            resolve_ipv4("192.168.1.5").unwrap(),
            Ipv4Addr::new(192, 168, 1, 5)
        );
    }

    #[test]
    fn test_resolve_ipv4_localhost() {
        assert_eq!(resolve_ipv4("localhost").unwrap(), Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn test_instance_name() {
        assert_eq!(instance_name("studio.local."), "studio");
        assert_eq!(instance_name("studio.local"), "studio");
        assert_eq!(instance_name("studio"), "studio");
    }

    #[test]
    fn test_survey_runs_each_tool_once() {
        let source = CannedSource::new(["192.168.1.5 ether a:1b:2:3c:4:5 C eth0"]);
        let report = survey(&source, "192.168.1.5", false).unwrap();
        assert_eq!(report.reachable, Ok(true));
        assert_eq!(
            report.mac,
            Ok(Lookup::Found(MacAddress::from_raw("0a:1b:02:3c:04:05")))
        );
        assert!(report.model.is_none());
        assert_eq!(
            source.calls(),
            vec!["ping -c 1 192.168.1.5", "arp 192.168.1.5"]
        );
    }

    #[test]
    fn test_survey_keeps_going_after_failures() {
        let source = CannedSource::unlaunchable();
        let report = survey(&source, "127.0.0.1", true).unwrap();
        assert!(report.reachable.is_err());
        assert!(report.mac.is_err());
        assert!(matches!(report.model, Some(Err(_))));
        assert_eq!(
            source.calls(),
            vec![
                "ping -c 1 127.0.0.1",
                "arp 127.0.0.1",
                "dig @127.0.0.1 -p5353 127.0.0.1._device-info._tcp.local TXT",
            ]
        );
    }

    #[test]
    fn test_survey_ip_literal_reports_model() {
        let source = CannedSource::new(["x 10 IN TXT \"model=AirPort4,88\""]);
        let report = survey(&source, "192.168.1.1", true).unwrap();
        assert_eq!(
            report.model,
            Some(Ok(Lookup::Found("AirPort4,88".to_string())))
        );
        assert_eq!(source.calls().len(), 3);
    }

    #[test]
    fn test_survey_queries_instance_name() {
        let source = CannedSource::empty();
        let report = survey(&source, "localhost", true).unwrap();
        assert_eq!(report.model, Some(Ok(Lookup::NotFound)));
        assert_eq!(
            source.calls()[2],
            "dig @127.0.0.1 -p5353 localhost._device-info._tcp.local TXT"
        );
    }

    #[test]
    fn test_report_display() {
        let report = HostReport {
            host: "base-station".to_string(),
            ip: Ipv4Addr::new(192, 168, 1, 1),
            reachable: Ok(false),
            mac: Ok(Lookup::NotFound),
            model: Some(Ok(Lookup::Found("AirPort4,88".to_string()))),
        };
        assert_eq!(
            report.to_string(),
            "host:      base-station (192.168.1.1)\n\
             reachable: no\n\
             mac:       no MAC found\n\
             model:     AirPort4,88\n"
        );
    }

    #[test]
    fn test_report_json() {
        let report = HostReport {
            host: "10.0.0.2".to_string(),
            ip: Ipv4Addr::new(10, 0, 0, 2),
            reachable: Ok(true),
            mac: Ok(Lookup::Found(MacAddress::from_raw("0:1b:63:84:45:e6"))),
            model: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ip"], "10.0.0.2");
        assert_eq!(json["reachable"]["Ok"], true);
        assert_eq!(json["mac"]["Ok"]["value"], "00:1b:63:84:45:e6");
        assert!(json["model"].is_null());
    }
}
