//! Operating system, architecture and distribution detection.

use super::command::CommandService;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum OsType {
    Linux,
    Mac,
    Windows,
    Android,
}

impl OsType {
    pub fn current() -> Option<Self> {
        Self::from_os_name(env::consts::OS)
    }

    pub fn from_os_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "android" => Some(Self::Android),
            "windows" => Some(Self::Windows),
            "macos" | "darwin" => Some(Self::Mac),
            _ => None,
        }
    }

    pub fn is_current(self) -> bool {
        Self::current() == Some(self)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Architecture {
    Amd64,
    Arm32,
    Arm64,
}

impl Architecture {
    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm32 => "arm",
            Self::Arm64 => "aarch64",
        }
    }

    pub fn from_canonical_name(name: &str) -> Option<Self> {
        [Self::Amd64, Self::Arm32, Self::Arm64]
            .into_iter()
            .find(|arch| arch.canonical_name().eq_ignore_ascii_case(name))
    }

    pub fn from_arch_name(name: &str) -> Option<Self> {
        Self::from_canonical_name(name).or_else(|| match name.to_ascii_lowercase().as_str() {
            "x86_64" | "i64" => Some(Self::Amd64),
            _ => None,
        })
    }

    pub fn current() -> Option<Self> {
        Self::from_arch_name(env::consts::ARCH)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Distribution {
    WindowsMs,
    LinuxRedhat,
    LinuxSuse,
    LinuxRpi,
    LinuxDebian,
    LinuxUbuntu,
    GenericLinux,
    MacApple,
    Unknown,
}

impl Distribution {
    pub fn label(self) -> &'static str {
        match self {
            Self::WindowsMs => "Windows",
            Self::LinuxRedhat => "Linux/RedHat",
            Self::LinuxSuse => "Linux/OpenSuse",
            Self::LinuxRpi => "Linux/Raspberry PI",
            Self::LinuxDebian => "Linux/Debian",
            Self::LinuxUbuntu => "Linux/Ubuntu",
            Self::GenericLinux => "Linux",
            Self::MacApple => "Apple",
            Self::Unknown => "Unknown",
        }
    }

    /// Maps a distributor id (`lsb_release -is`, os-release `ID=`) to a variant.
    pub fn classify(description: &str) -> Self {
        let desc = description.to_ascii_lowercase();
        if desc.contains("suse") {
            Self::LinuxSuse
        } else if desc.contains("raspian") {
            Self::LinuxRpi
        } else if desc.contains("red") && desc.contains("hat") {
            Self::LinuxRedhat
        } else if desc.contains("debian") {
            Self::LinuxDebian
        } else if desc.contains("ubuntu") {
            Self::LinuxUbuntu
        } else {
            Self::GenericLinux
        }
    }

    pub fn detect(commands: &CommandService) -> Self {
        match OsType::current() {
            Some(OsType::Windows) => Self::WindowsMs,
            Some(OsType::Mac) => Self::MacApple,
            Some(OsType::Linux) => from_lsb_release(commands)
                .or_else(|| from_release_file(Path::new("/etc")))
                .unwrap_or(Self::GenericLinux),
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn from_lsb_release(commands: &CommandService) -> Option<Distribution> {
    let mut command = commands
        .command("lsb_release")
        .or_else(|| commands.command("lsb-release"))?;
    let output = command.arg("-is").stderr(Stdio::null()).output().ok()?;
    if !output.status.success() {
        tracing::debug!("lsb_release exited with {}", output.status);
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let text = text.trim();
    (!text.is_empty()).then(|| Distribution::classify(text))
}

fn find_release_file(etc: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(etc)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.len() > "-release".len() && name.ends_with("-release"))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().find(|path| fs::File::open(path).is_ok())
}

fn from_release_file(etc: &Path) -> Option<Distribution> {
    let content = fs::read_to_string(find_release_file(etc)?).ok()?;
    content
        .lines()
        .find_map(|line| line.strip_prefix("ID="))
        .filter(|id| !id.is_empty())
        .map(Distribution::classify)
}

/// Host name from `HOSTNAME`, the `hostname` command, or `/etc/hostname`.
pub fn host_name(commands: &CommandService) -> Option<String> {
    let non_empty = |value: String| {
        let value = value.trim().to_string();
        (!value.is_empty()).then_some(value)
    };

    env::var("HOSTNAME")
        .ok()
        .and_then(non_empty)
        .or_else(|| {
            let output = commands.command("hostname")?.output().ok()?;
            output
                .status
                .success()
                .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
                .and_then(non_empty)
        })
        .or_else(|| fs::read_to_string("/etc/hostname").ok().and_then(non_empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn os_names_map_to_variants() {
        assert_eq!(OsType::from_os_name("linux"), Some(OsType::Linux));
        assert_eq!(OsType::from_os_name("macos"), Some(OsType::Mac));
        assert_eq!(OsType::from_os_name("freebsd"), None);
    }

    #[test]
    fn architecture_accepts_aliases() {
        assert_eq!(Architecture::from_canonical_name("AARCH64"), Some(Architecture::Arm64));
        assert_eq!(Architecture::from_arch_name("x86_64"), Some(Architecture::Amd64));
        assert_eq!(Architecture::from_arch_name("riscv64"), None);
    }

    #[test]
    fn classify_distributor_ids() {
        assert_eq!(Distribution::classify("openSUSE"), Distribution::LinuxSuse);
        assert_eq!(Distribution::classify("RedHatEnterprise"), Distribution::LinuxRedhat);
        assert_eq!(Distribution::classify("\"debian\""), Distribution::LinuxDebian);
        assert_eq!(Distribution::classify("Ubuntu"), Distribution::LinuxUbuntu);
        assert_eq!(Distribution::classify("arch"), Distribution::GenericLinux);
    }

    #[test]
    fn release_file_id_is_used() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("os-release"), "NAME=\"Ubuntu\"\nID=ubuntu\n").unwrap();
        fs::write(tmp.path().join("hosts"), "127.0.0.1 localhost\n").unwrap();

        assert_eq!(from_release_file(tmp.path()), Some(Distribution::LinuxUbuntu));
    }

    #[test]
    fn missing_release_file_yields_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(from_release_file(tmp.path()), None);
    }
}
