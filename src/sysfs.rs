use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Root under which DMI files and the acpi_call control file are resolved.
/// `/` on a real machine, a temp directory in tests.
#[derive(Debug, Clone)]
pub struct SysfsRoot {
    root: PathBuf,
}

impl SysfsRoot {
    pub fn system() -> Self {
        Self::new("/")
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Leading slashes are ignored so absolute paths from config still land
    /// under a test root.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        let relative = relative.as_ref();
        let relative = relative.strip_prefix("/").unwrap_or(relative);
        self.root.join(relative)
    }

    /// Read a single-value attribute file, trimmed.
    pub fn read(&self, relative: impl AsRef<Path>) -> Result<String> {
        let path = self.path(relative);
        std::fs::read_to_string(&path)
            .map(|s| s.trim().to_string())
            .map_err(|source| Error::SysfsRead { path, source })
    }

    /// Write `command` to a control file and read its reply back, the way
    /// `/proc/acpi/call` is driven. The reply is returned untrimmed.
    pub fn exchange(&self, relative: impl AsRef<Path>, command: &str) -> Result<String> {
        let path = self.path(relative);
        OpenOptions::new()
            .write(true)
            .open(&path)
            .and_then(|mut file| file.write_all(command.as_bytes()))
            .map_err(|source| Error::SysfsWrite {
                path: path.clone(),
                source,
            })?;
        std::fs::read_to_string(&path).map_err(|source| Error::SysfsRead { path, source })
    }

    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.path(relative).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_trims() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        fs::create_dir_all(tmp.path().join("sys/class/dmi/id")).unwrap();
        fs::write(tmp.path().join("sys/class/dmi/id/sys_vendor"), "Acer\n").unwrap();

        assert_eq!(sysfs.read("sys/class/dmi/id/sys_vendor").unwrap(), "Acer");
    }

    #[test]
    fn test_absolute_paths_stay_under_root() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());

        assert_eq!(
            sysfs.path("/proc/acpi/call"),
            tmp.path().join("proc/acpi/call")
        );
    }

    #[test]
    fn test_exchange_on_plain_file_echoes_command() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        fs::create_dir_all(tmp.path().join("proc/acpi")).unwrap();
        fs::write(tmp.path().join("proc/acpi/call"), "").unwrap();

        assert_eq!(
            sysfs.exchange("proc/acpi/call", "\\_SB.X 0x0 0x17 b0b").unwrap(),
            "\\_SB.X 0x0 0x17 b0b"
        );
    }

    #[test]
    fn test_missing_files_are_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());

        assert!(!sysfs.exists("proc/acpi/call"));
        assert!(matches!(
            sysfs.read("sys/class/dmi/id/board_name"),
            Err(Error::SysfsRead { .. })
        ));
        assert!(matches!(
            sysfs.exchange("proc/acpi/call", "x"),
            Err(Error::SysfsWrite { .. })
        ));
    }
}
