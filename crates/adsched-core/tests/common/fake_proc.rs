//! A fake `/proc` + `/sys` tree for driving `ProcNetDev` from tests.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

const HEADER: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
";

pub struct FakeProc {
    dir: TempDir,
}

impl FakeProc {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("proc/net")).unwrap();
        fs::create_dir_all(dir.path().join("sys/class/net")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Rewrite `/proc/net/dev` with the given `(interface, rx_bytes)` rows.
    pub fn set_counters(&self, rows: &[(&str, u64)]) {
        let mut text = HEADER.to_string();
        for (name, rx) in rows {
            text.push_str(&format!(
                "{name:>6}: {rx} 100 0 0 0 0 0 0 1000 10 0 0 0 0 0 0\n"
            ));
        }
        fs::write(self.root().join("proc/net/dev"), text).unwrap();
    }

    /// Mark `iface` as a wireless interface reporting `link` quality (out of 70).
    pub fn set_wireless(&self, iface: &str, link: u32) {
        let wireless = self.root().join("sys/class/net").join(iface).join("wireless");
        fs::create_dir_all(wireless).unwrap();
        let text = format!(
            "Inter-| sta-|   Quality        |\n face | tus | link level noise |\n{iface}: 0000   {link}.  -40.  -256\n"
        );
        fs::write(self.root().join("proc/net/wireless"), text).unwrap();
    }
}
