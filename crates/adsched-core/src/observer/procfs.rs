//! Linux counter source: `/proc/net/dev`, `/proc/net/wireless` and `/sys/class/net`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::samples::LinkType;

use super::counters::{CounterError, CounterSource, InterfaceCounters};

/// Maximum "link quality" value reported by most wireless drivers.
const WIRELESS_QUALITY_MAX: f64 = 70.0;

/// Interface name prefixes that never carry user traffic to the outside world.
const VIRTUAL_PREFIXES: &[&str] = &["lo", "veth", "docker", "br-", "virbr", "tun", "tap"];

/// Reads counters from procfs/sysfs under `root` (normally `/`).
#[derive(Debug, Clone)]
pub struct ProcNetDev {
    root: PathBuf,
}

impl Default for ProcNetDev {
    fn default() -> Self {
        Self::new("/")
    }
}

impl ProcNetDev {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, rel: &str) -> Result<String, CounterError> {
        let path = self.root.join(rel);
        fs::read_to_string(&path).map_err(|source| CounterError::Io { path, source })
    }

    fn class_dir(&self, iface: &str) -> PathBuf {
        self.root.join("sys/class/net").join(iface)
    }

    fn is_down(&self, iface: &str) -> bool {
        fs::read_to_string(self.class_dir(iface).join("operstate"))
            .map(|s| s.trim() == "down")
            .unwrap_or(false)
    }

    fn link_type(&self, iface: &str) -> LinkType {
        classify_link(iface, &self.class_dir(iface))
    }
}

impl CounterSource for ProcNetDev {
    fn read_counters(&self) -> Result<Vec<InterfaceCounters>, CounterError> {
        let text = self.read("proc/net/dev")?;
        let mut out = Vec::new();
        for (name, rx_bytes) in parse_net_dev(&text)? {
            if is_virtual(&name) || self.is_down(&name) {
                continue;
            }
            let link = self.link_type(&name);
            out.push(InterfaceCounters {
                name,
                rx_bytes,
                link,
            });
        }
        Ok(out)
    }

    fn signal_quality(&self) -> Option<u8> {
        let text = self.read("proc/net/wireless").ok()?;
        parse_wireless_quality(&text)
    }
}

fn is_virtual(name: &str) -> bool {
    VIRTUAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn classify_link(name: &str, class_dir: &Path) -> LinkType {
    if class_dir.join("wireless").exists() || name.starts_with("wl") {
        LinkType::Wifi
    } else if ["wwan", "ppp", "rmnet", "usb"]
        .iter()
        .any(|p| name.starts_with(p))
    {
        LinkType::Mobile
    } else {
        LinkType::Ethernet
    }
}

/// Parse `/proc/net/dev` into `(interface, rx_bytes)` pairs.
pub(crate) fn parse_net_dev(text: &str) -> Result<Vec<(String, u64)>, CounterError> {
    let mut out = Vec::new();
    // Two header lines precede the per-interface rows.
    for line in text.lines().skip(2) {
        if line.trim().is_empty() {
            continue;
        }
        let (name, rest) = line
            .split_once(':')
            .ok_or_else(|| CounterError::Malformed(line.to_string()))?;
        let rx_bytes = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| CounterError::Malformed(line.to_string()))?;
        out.push((name.trim().to_string(), rx_bytes));
    }
    Ok(out)
}

/// Link quality (percent) of the first interface listed in `/proc/net/wireless`.
pub(crate) fn parse_wireless_quality(text: &str) -> Option<u8> {
    let line = text.lines().skip(2).find(|l| !l.trim().is_empty())?;
    let (_, rest) = line.split_once(':')?;
    // Fields: status, link quality, level, noise, ...
    let raw = rest.split_whitespace().nth(1)?;
    let link: f64 = raw.trim_end_matches('.').parse().ok()?;
    let pct = (link / WIRELESS_QUALITY_MAX * 100.0).round().clamp(0.0, 100.0);
    Some(pct as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  123456     100    0    0    0     0          0         0   123456     100    0    0    0     0       0          0
  eth0: 9876543   12000    0    0    0     0          0        10  5555555    8000    0    0    0     0       0          0
wlan0:     4242      10    0    0    0     0          0         0     1000       5    0    0    0     0       0          0
";

    const WIRELESS: &str = "\
Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
 face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
 wlan0: 0000   56.  -54.  -256        0      0      0      0     19        0
";

    #[test]
    fn parses_net_dev_rows() {
        let rows = parse_net_dev(NET_DEV).unwrap();
        assert_eq!(
            rows,
            vec![
                ("lo".to_string(), 123456),
                ("eth0".to_string(), 9876543),
                ("wlan0".to_string(), 4242),
            ]
        );
    }

    #[test]
    fn malformed_net_dev_row_is_an_error() {
        let text = "h1\nh2\n  eth0 12 34\n";
        assert!(matches!(
            parse_net_dev(text),
            Err(CounterError::Malformed(_))
        ));
    }

    #[test]
    fn parses_wireless_quality_as_percent() {
        assert_eq!(parse_wireless_quality(WIRELESS), Some(80));
        assert_eq!(parse_wireless_quality("h1\nh2\n"), None);
    }

    #[test]
    fn reads_counters_from_fake_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("proc/net")).unwrap();
        fs::write(root.join("proc/net/dev"), NET_DEV).unwrap();
        fs::write(root.join("proc/net/wireless"), WIRELESS).unwrap();
        fs::create_dir_all(root.join("sys/class/net/wlan0/wireless")).unwrap();
        fs::create_dir_all(root.join("sys/class/net/eth0")).unwrap();
        fs::write(root.join("sys/class/net/eth0/operstate"), "up\n").unwrap();

        let source = ProcNetDev::new(root);
        let counters = source.read_counters().unwrap();
        assert_eq!(counters.len(), 2, "loopback is skipped");
        assert_eq!(counters[0].name, "eth0");
        assert_eq!(counters[0].link, LinkType::Ethernet);
        assert_eq!(counters[1].link, LinkType::Wifi);
        assert_eq!(source.signal_quality(), Some(80));
    }

    #[test]
    fn missing_proc_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ProcNetDev::new(dir.path());
        assert!(matches!(
            source.read_counters(),
            Err(CounterError::Io { .. })
        ));
        assert_eq!(source.signal_quality(), None);
    }
}
