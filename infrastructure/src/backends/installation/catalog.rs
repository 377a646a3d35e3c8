//! Tool descriptors served by the installation backend

use steward_domain::tool::InvalidToolName;
use steward_domain::{ExtractionHint, ParamKind, RiskLevel, ToolDescriptor, ToolName, ToolParameter};

pub const INSTALL_PACKAGE: &str = "install_package";
pub const REMOVE_PACKAGE: &str = "remove_package";
pub const INSTALL_ORACLE_DATABASE: &str = "install_oracle_database";
pub const SETUP_WEB_SERVER: &str = "setup_web_server";
pub const CHECK_SYSTEM_REQUIREMENTS: &str = "check_system_requirements";
pub const MANAGE_SERVICE: &str = "manage_service";

pub const MANAGERS: [&str; 7] = ["auto", "apt", "dnf", "yum", "pacman", "brew", "snap"];
pub const ORACLE_VERSIONS: [&str; 3] = ["21c", "19c", "23c"];
pub const SERVER_TYPES: [&str; 3] = ["nginx", "apache", "both"];
pub const SERVICE_ACTIONS: [&str; 7] = [
    "start", "stop", "restart", "reload", "enable", "disable", "status",
];

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn manager_param() -> ToolParameter {
    ToolParameter::new("manager", "Package manager (auto-detected by default)", false)
        .with_allowed(MANAGERS)
        .with_default("auto")
        .with_hint(ExtractionHint::Choice)
}

fn auto_start_param(what: &str) -> ToolParameter {
    ToolParameter::new("auto_start", format!("Start {} on boot", what), false)
        .with_kind(ParamKind::Boolean)
        .with_default(true)
        .with_hint(ExtractionHint::Flag {
            on: words(&["auto start", "autostart", "start on boot"]),
            off: words(&["no auto start", "no autostart", "manual start"]),
        })
}

pub fn descriptors() -> Result<Vec<ToolDescriptor>, InvalidToolName> {
    Ok(vec![
        ToolDescriptor::new(
            ToolName::new(INSTALL_PACKAGE)?,
            "Install a software package with the host's package manager",
            RiskLevel::Moderate,
        )
        .with_dry_run()
        .with_keywords(["install", "add package"])
        .with_parameter(
            ToolParameter::new("package", "Package name to install", true).with_hint(
                ExtractionHint::AfterKeyword {
                    words: words(&["install", "add", "get"]),
                },
            ),
        )
        .with_parameter(
            ToolParameter::new("version", "Specific version", false)
                .with_hint(ExtractionHint::Version),
        )
        .with_parameter(
            ToolParameter::new("options", "Additional package manager options", false)
                .with_kind(ParamKind::StringList),
        )
        .with_parameter(manager_param()),
        ToolDescriptor::new(
            ToolName::new(INSTALL_ORACLE_DATABASE)?,
            "Install and configure Oracle Database",
            RiskLevel::Destructive,
        )
        .with_dry_run()
        .with_keywords(["oracle", "oracle database", "install oracle", "oracle db"])
        .with_parameter(
            ToolParameter::new("version", "Oracle Database version", false)
                .with_allowed(ORACLE_VERSIONS)
                .with_default("21c")
                .with_hint(ExtractionHint::Choice),
        )
        .with_parameter(
            ToolParameter::new("memory_gb", "Memory allocation in GB", false)
                .with_kind(ParamKind::Integer)
                .with_default(8)
                .with_hint(ExtractionHint::Quantity {
                    unit: "gb".into(),
                    context: words(&["memory", "ram", "mem"]),
                }),
        )
        .with_parameter(
            ToolParameter::new("storage_gb", "Storage allocation in GB", false)
                .with_kind(ParamKind::Integer)
                .with_default(50)
                .with_hint(ExtractionHint::Quantity {
                    unit: "gb".into(),
                    context: words(&["storage", "disk", "space"]),
                }),
        )
        .with_parameter(auto_start_param("the database"))
        .with_parameter(
            ToolParameter::new("install_path", "Installation directory", false)
                .with_default("/opt/oracle")
                .with_hint(ExtractionHint::Path),
        ),
        ToolDescriptor::new(
            ToolName::new(SETUP_WEB_SERVER)?,
            "Install and configure a web server",
            RiskLevel::Moderate,
        )
        .with_dry_run()
        .with_keywords([
            "web server",
            "webserver",
            "setup nginx",
            "set up nginx",
            "configure nginx",
            "setup apache",
            "set up apache",
            "configure apache",
        ])
        .with_parameter(
            ToolParameter::new("server_type", "Web server to install", true)
                .with_allowed(SERVER_TYPES)
                .with_hint(ExtractionHint::Choice),
        )
        .with_parameter(
            ToolParameter::new("ssl_enabled", "Configure TLS with Let's Encrypt", false)
                .with_kind(ParamKind::Boolean)
                .with_default(true)
                .with_hint(ExtractionHint::Flag {
                    on: words(&["ssl", "https", "tls"]),
                    off: words(&["without ssl", "no ssl", "without https", "no https"]),
                }),
        )
        .with_parameter(
            ToolParameter::new("domain", "Domain for the certificate", false)
                .with_hint(ExtractionHint::Domain),
        )
        .with_parameter(auto_start_param("the web server")),
        ToolDescriptor::new(
            ToolName::new(CHECK_SYSTEM_REQUIREMENTS)?,
            "Check whether this host meets the requirements for some software",
            RiskLevel::Safe,
        )
        .with_dry_run()
        .with_keywords([
            "requirements",
            "check requirements",
            "system requirements",
            "check system",
            "prerequisites",
        ])
        .with_parameter(
            ToolParameter::new("software", "Software to check requirements for", true).with_hint(
                ExtractionHint::AfterKeyword {
                    words: words(&["for", "run"]),
                },
            ),
        )
        .with_parameter(
            ToolParameter::new("detailed", "Include detailed host information", false)
                .with_kind(ParamKind::Boolean)
                .with_default(false)
                .with_hint(ExtractionHint::Flag {
                    on: words(&["detailed", "details", "verbose", "full"]),
                    off: Vec::new(),
                }),
        ),
        ToolDescriptor::new(
            ToolName::new(REMOVE_PACKAGE)?,
            "Remove a software package",
            RiskLevel::Destructive,
        )
        .with_dry_run()
        .with_keywords(["remove", "uninstall", "purge", "remove package"])
        .with_parameter(
            ToolParameter::new("package", "Package name to remove", true).with_hint(
                ExtractionHint::AfterKeyword {
                    words: words(&["remove", "uninstall", "purge", "delete"]),
                },
            ),
        )
        .with_parameter(
            ToolParameter::new("purge", "Also remove configuration files", false)
                .with_kind(ParamKind::Boolean)
                .with_default(false)
                .with_hint(ExtractionHint::Flag {
                    on: words(&["purge", "with config", "completely"]),
                    off: Vec::new(),
                }),
        )
        .with_parameter(manager_param()),
        ToolDescriptor::new(
            ToolName::new(MANAGE_SERVICE)?,
            "Start, stop, restart, enable or disable a systemd service",
            RiskLevel::Moderate,
        )
        .with_dry_run()
        .with_keywords(["start", "stop", "restart", "reload", "enable", "disable", "service"])
        .with_parameter(
            ToolParameter::new("service", "Service unit name", true).with_hint(
                ExtractionHint::AfterKeyword {
                    words: words(&SERVICE_ACTIONS),
                },
            ),
        )
        .with_parameter(
            ToolParameter::new("action", "What to do with the service", true)
                .with_allowed(SERVICE_ACTIONS)
                .with_hint(ExtractionHint::Choice),
        ),
    ])
}
