// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix the kernel appends to the `exe` link once the binary is unlinked.
const DELETED_SUFFIX: &str = " (deleted)";

pub fn root_path() -> PathBuf {
    match env::var("HOST_PROC") {
        Ok(v) if !v.is_empty() => v.into(),
        _ => "/proc".into(),
    }
}

/// Numeric entries of the proc root, i.e. the pids alive at the time of the
/// directory read. Order follows the directory listing.
pub fn pids(root: &Path) -> Result<Vec<i32>, std::io::Error> {
    let mut pids = Vec::new();
    for entry in fs::read_dir(root)? {
        let Ok(entry) = entry else {
            continue;
        };
        if let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse().ok()) {
            pids.push(pid);
        }
    }
    Ok(pids)
}

#[derive(Debug)]
pub struct Cmdline {
    cmdline: String,
    separator: char,
}

impl Cmdline {
    pub fn new(mut cmdline: String) -> Self {
        // Processes that rewrite their argv leave trailing NULs behind.
        let trim_len = cmdline.trim_end_matches('\0').len();
        cmdline.truncate(trim_len);

        // A rewritten command line may also be packed into one string with
        // spaces; split it so `-gid=` lookups still see separate arguments.
        let mut args = cmdline.split_terminator('\0');
        let separator = if let (Some(first), None) = (args.next(), args.next())
            && first.contains(' ')
        {
            ' '
        } else {
            '\0'
        };

        Cmdline { cmdline, separator }
    }

    pub fn read(root: &Path, pid: i32) -> Result<Self, std::io::Error> {
        let path = root.join(pid.to_string()).join("cmdline");
        Ok(Self::new(fs::read_to_string(path)?))
    }

    pub fn args(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.cmdline.split_terminator(self.separator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exe(pub PathBuf);

impl Exe {
    pub fn read(root: &Path, pid: i32) -> Result<Self, std::io::Error> {
        let path = root.join(pid.to_string()).join("exe");
        Ok(Exe::from_link(fs::read_link(path)?))
    }

    fn from_link(target: PathBuf) -> Self {
        match target.to_str().and_then(|s| s.strip_suffix(DELETED_SUFFIX)) {
            Some(stripped) => Exe(PathBuf::from(stripped)),
            None => Exe(target),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn test_cmdline_normalization() {
        let normal = Cmdline::new("gate\0-gid=1\0-log\0info".to_string());
        let args: Vec<&str> = normal.args().collect();
        assert_eq!(args, vec!["gate", "-gid=1", "-log", "info"]);

        let packed = Cmdline::new("test_game -gid=2 -log debug".to_string());
        let args: Vec<&str> = packed.args().collect();
        assert_eq!(args, vec!["test_game", "-gid=2", "-log", "debug"]);

        let trailing = Cmdline::new("dispatcher\0\0\0".to_string());
        let args: Vec<&str> = trailing.args().collect();
        assert_eq!(args, vec!["dispatcher"]);

        let empty = Cmdline::new(String::new());
        assert_eq!(empty.args().count(), 0);
    }

    #[test]
    fn test_exe_strips_deleted_marker() {
        let exe = Exe::from_link(PathBuf::from("/srv/goworld/components/gate/gate (deleted)"));
        assert_eq!(exe.0, PathBuf::from("/srv/goworld/components/gate/gate"));
        assert_eq!(exe.0.file_name().unwrap(), "gate");
    }

    #[test]
    fn test_read_from_fake_root() {
        let dir = tempfile::tempdir().unwrap();
        let pid_dir = dir.path().join("42");
        fs::create_dir(&pid_dir).unwrap();
        symlink("/srv/goworld/components/dispatcher/dispatcher", pid_dir.join("exe")).unwrap();
        fs::write(pid_dir.join("cmdline"), "dispatcher\0").unwrap();
        fs::create_dir(dir.path().join("self")).unwrap();
        fs::write(dir.path().join("uptime"), "1.0 1.0").unwrap();

        assert_eq!(pids(dir.path()).unwrap(), vec![42]);

        let exe = Exe::read(dir.path(), 42).unwrap();
        assert_eq!(exe.0.file_name().unwrap(), "dispatcher");
        let cmdline = Cmdline::read(dir.path(), 42).unwrap();
        assert_eq!(cmdline.args().collect::<Vec<_>>(), vec!["dispatcher"]);
    }

    #[test]
    fn test_read_missing_pid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Exe::read(dir.path(), 7).is_err());
        assert!(Cmdline::read(dir.path(), 7).is_err());
    }
}
