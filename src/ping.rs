use crate::command::{CommandError, TextCommandSource};
use log::debug;

const PING: &str = "ping";

// BSD ping prints the first form, iputils the second.
const NO_REPLY: [&str; 2] = [
    "1 packets transmitted, 0 packets received",
    "1 packets transmitted, 0 received",
];

pub fn ping_args(ip: &str) -> Vec<String> {
    vec!["-c".to_string(), "1".to_string(), ip.to_string()]
}

/// Sends a single echo request to `ip`. There is no retry: one lost packet
/// means unreachable.
pub fn is_reachable(source: &dyn TextCommandSource, ip: &str) -> Result<bool, CommandError> {
    let lines = source.run(PING, &ping_args(ip))?;
    let reachable = parse_reply(&lines);
    debug!("{} reachable: {}", ip, reachable);
    Ok(reachable)
}

/// True unless a line reports that the single request went unanswered.
pub fn parse_reply<S: AsRef<str>>(lines: &[S]) -> bool {
    !lines.iter().any(|line| {
        let line = line.as_ref();
        NO_REPLY.iter().any(|phrase| line.starts_with(phrase))
    })
}
