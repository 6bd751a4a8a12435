use crate::command::{CommandError, Lookup, TextCommandSource};
use crate::mac::MacAddress;
use log::{debug, info};

const ARP: &str = "arp";

/// Printed in place of a MAC address when the neighbor table has none.
pub const NO_MAC_FOUND: &str = "no MAC found";

/// Looks `ip` up in the system neighbor table.
///
/// `arp` prints octets without leading zeros on some systems, so whatever it
/// reports is normalized to two digits per octet before being returned.
pub fn resolve(
    source: &dyn TextCommandSource,
    ip: &str,
) -> Result<Lookup<MacAddress>, CommandError> {
    let lines = source.run(ARP, &[ip.to_string()])?;
    match find_mac(&lines) {
        Some(raw) => {
            let mac = MacAddress::from_raw(raw);
            info!("{} is at {}", ip, mac);
            Ok(Lookup::Found(mac))
        }
        None => {
            debug!("arp has no entry for {}", ip);
            Ok(Lookup::NotFound)
        }
    }
}

/// Returns the first whitespace-separated token containing a colon, taken
/// from the first line that has one.
pub fn find_mac<S: AsRef<str>>(lines: &[S]) -> Option<&str> {
    lines
        .iter()
        .find_map(|line| line.as_ref().split_whitespace().find(|token| token.contains(':')))
}

pub fn describe(lookup: &Lookup<MacAddress>) -> &str {
    match lookup {
        Lookup::Found(mac) => mac.as_str(),
        Lookup::NotFound => NO_MAC_FOUND,
    }
}

#[cfg(test)]
mod tests {
    use crate::arp::*;
    use crate::command::canned::CannedSource;

    macro_rules! test_find_mac {
        ($name:ident, $lines:expr, $o:expr) => {
            #[test]
            fn $name() {
                let lines: &[&str] = $lines;
                assert_eq!(find_mac(lines), $o);
            }
        };
    }

    test_find_mac! {linux_net_tools, &[
        "Address                  HWtype  HWaddress           Flags Mask            Iface",
        "192.168.1.5              ether   a:1b:2:3c:4:5       C                     eth0",
    ], Some("a:1b:2:3c:4:5")}
    test_find_mac! {bsd_style, &[
        "? (192.168.1.5) at 0:1b:63:84:45:e6 on en0 ifscope [ethernet]",
    ], Some("0:1b:63:84:45:e6")}
    test_find_mac! {no_entry, &[
        "192.168.1.9 (192.168.1.9) -- no entry",
    ], None}
    test_find_mac! {first_line_wins, &[
        "10.0.0.1 ether aa:bb:cc:dd:ee:ff C eth0",
        "10.0.0.1 ether 11:22:33:44:55:66 C eth1",
    ], Some("aa:bb:cc:dd:ee:ff")}
    test_find_mac! {tabs_separate_tokens, &["10.0.0.2\tether\t1:2:3:4:5:6\tC"], Some("1:2:3:4:5:6")}
    test_find_mac! {empty_output, &[], None}

    #[test]
    fn test_resolve_normalizes() {
        let source = CannedSource::new(["192.168.1.5 ether a:1b:2:3c:4:5 C eth0"]);
        let mac = resolve(&source, "192.168.1.5").unwrap();
        assert_eq!(mac, Lookup::Found(MacAddress::from_raw("0a:1b:02:3c:04:05")));
        assert_eq!(describe(&mac), "0a:1b:02:3c:04:05");
        assert_eq!(source.calls(), vec!["arp 192.168.1.5"]);
    }

    #[test]
    fn test_resolve_keeps_case() {
        let source = CannedSource::new(["192.168.1.5 ether A:1B:2:3C:4:5 C eth0"]);
        let mac = resolve(&source, "192.168.1.5").unwrap().found().unwrap();
        assert_eq!(mac.as_str(), "0A:1B:02:3C:04:05");
    }

    #[test]
    fn test_resolve_not_found() {
        let source = CannedSource::new(["192.168.1.9 (192.168.1.9) -- no entry"]);
        let mac = resolve(&source, "192.168.1.9").unwrap();
        assert_eq!(mac, Lookup::NotFound);
        assert_eq!(describe(&mac), NO_MAC_FOUND);
    }

    #[test]
    fn test_resolve_launch_failure() {
        let source = CannedSource::unlaunchable();
        assert!(matches!(
            resolve(&source, "192.168.1.5"),
            Err(CommandError::Launch { .. })
        ));
    }
}
