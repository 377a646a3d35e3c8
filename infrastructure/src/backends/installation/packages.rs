//! Package manager detection and command construction

use std::fmt;

use super::super::host::{CommandLocator, CommandSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Yum,
    Dnf,
    Pacman,
    Brew,
    Snap,
}

/// Probe order for `manager = "auto"`
pub const DETECTION_ORDER: [PackageManager; 6] = [
    PackageManager::Apt,
    PackageManager::Yum,
    PackageManager::Dnf,
    PackageManager::Pacman,
    PackageManager::Brew,
    PackageManager::Snap,
];

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Pacman => "pacman",
            PackageManager::Brew => "brew",
            PackageManager::Snap => "snap",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        DETECTION_ORDER
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    /// First manager found on PATH
    pub fn detect(locator: &dyn CommandLocator) -> Option<Self> {
        DETECTION_ORDER
            .into_iter()
            .find(|m| locator.exists(m.as_str()))
    }

    /// Homebrew refuses to run as root
    pub fn needs_root(&self) -> bool {
        !matches!(self, PackageManager::Brew)
    }

    /// Whether the manager installs RPM packages
    pub fn is_rpm(&self) -> bool {
        matches!(self, PackageManager::Dnf | PackageManager::Yum)
    }

    /// Whether `version` is honored by [`install`](Self::install)
    pub fn pins_versions(&self) -> bool {
        !matches!(self, PackageManager::Pacman | PackageManager::Snap)
    }

    pub fn install(&self, package: &str, version: Option<&str>, options: &[String]) -> CommandSpec {
        let target = match (self, version) {
            (PackageManager::Apt, Some(v)) => format!("{}={}", package, v),
            (PackageManager::Dnf | PackageManager::Yum, Some(v)) => format!("{}-{}", package, v),
            (PackageManager::Brew, Some(v)) => format!("{}@{}", package, v),
            _ => package.to_string(),
        };
        let mut args: Vec<String> = match self {
            PackageManager::Apt => vec!["install".into(), "-y".into()],
            PackageManager::Dnf | PackageManager::Yum => vec!["install".into(), "-y".into()],
            PackageManager::Pacman => vec!["-S".into(), "--noconfirm".into()],
            PackageManager::Brew | PackageManager::Snap => vec!["install".into()],
        };
        args.push(target);
        args.extend(options.iter().cloned());
        CommandSpec::new(self.as_str(), args)
    }

    /// Install several packages in one transaction
    pub fn install_all(&self, first: &str, rest: &[&str]) -> CommandSpec {
        let mut spec = self.install(first, None, &[]);
        spec.args.extend(rest.iter().map(|p| p.to_string()));
        spec
    }

    pub fn remove(&self, package: &str, purge: bool) -> CommandSpec {
        let args: Vec<&str> = match (self, purge) {
            (PackageManager::Apt, false) => vec!["remove", "-y", package],
            (PackageManager::Apt, true) => vec!["purge", "-y", package],
            (PackageManager::Dnf | PackageManager::Yum, _) => vec!["remove", "-y", package],
            (PackageManager::Pacman, false) => vec!["-R", "--noconfirm", package],
            (PackageManager::Pacman, true) => vec!["-Rns", "--noconfirm", package],
            (PackageManager::Brew, false) => vec!["uninstall", package],
            (PackageManager::Brew, true) => vec!["uninstall", "--zap", package],
            (PackageManager::Snap, false) => vec!["remove", package],
            (PackageManager::Snap, true) => vec!["remove", "--purge", package],
        };
        CommandSpec::new(self.as_str(), args)
    }

    /// Distribution name of the Apache HTTP Server package
    pub fn apache_package(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apache2",
            _ => "httpd",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject package names that a package manager would read as an option
pub fn validate_package_name(name: &str) -> Result<(), String> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-' | '@' | ':' | '/'));
    if valid {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid package name", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct OnPath(HashSet<&'static str>);

    impl CommandLocator for OnPath {
        fn exists(&self, program: &str) -> bool {
            self.0.contains(program)
        }
    }

    #[test]
    fn test_detection_order() {
        let both = OnPath(["dnf", "yum"].into_iter().collect());
        assert_eq!(PackageManager::detect(&both), Some(PackageManager::Yum));

        let fedora = OnPath(["dnf", "snap"].into_iter().collect());
        assert_eq!(PackageManager::detect(&fedora), Some(PackageManager::Dnf));

        let debian = OnPath(["snap", "apt", "brew"].into_iter().collect());
        assert_eq!(PackageManager::detect(&debian), Some(PackageManager::Apt));

        let none = OnPath(HashSet::new());
        assert_eq!(PackageManager::detect(&none), None);
    }

    #[test]
    fn test_install_commands_pin_versions() {
        assert_eq!(
            PackageManager::Apt.install("nginx", Some("1.24"), &[]).to_string(),
            "apt install -y nginx=1.24"
        );
        assert_eq!(
            PackageManager::Dnf.install("nginx", Some("1.24"), &[]).to_string(),
            "dnf install -y nginx-1.24"
        );
        assert_eq!(
            PackageManager::Brew.install("python", Some("3.12"), &[]).to_string(),
            "brew install python@3.12"
        );
        assert_eq!(
            PackageManager::Pacman
                .install("nginx", Some("1.24"), &["--needed".to_string()])
                .to_string(),
            "pacman -S --noconfirm nginx --needed"
        );
    }

    #[test]
    fn test_remove_commands() {
        assert_eq!(PackageManager::Apt.remove("nginx", true).to_string(), "apt purge -y nginx");
        assert_eq!(
            PackageManager::Pacman.remove("nginx", true).to_string(),
            "pacman -Rns --noconfirm nginx"
        );
        assert_eq!(PackageManager::Snap.remove("code", false).to_string(), "snap remove code");
    }

    #[test]
    fn test_package_name_validation() {
        assert!(validate_package_name("libssl-dev").is_ok());
        assert!(validate_package_name("g++").is_ok());
        assert!(validate_package_name("--allow-downgrades").is_err());
        assert!(validate_package_name("nginx; rm -rf /").is_err());
        assert!(validate_package_name("").is_err());
    }
}
