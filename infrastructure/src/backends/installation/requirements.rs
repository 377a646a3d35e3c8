//! Requirement reports for `check_system_requirements`

use super::super::host::SystemFacts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Pass,
    Warn,
    Fail,
}

impl Mark {
    fn symbol(&self) -> &'static str {
        match self {
            Mark::Pass => "✓",
            Mark::Warn => "!",
            Mark::Fail => "✗",
        }
    }
}

struct Check {
    mark: Mark,
    line: String,
}

fn check(ok: bool, fail: Mark, line: String) -> Check {
    Check {
        mark: if ok { Mark::Pass } else { fail },
        line,
    }
}

/// Requirement report; `meets` is false if any hard requirement failed
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub text: String,
    pub meets: bool,
}

fn memory_check(facts: &SystemFacts, min_gb: f64) -> Check {
    check(
        facts.total_memory_gb >= min_gb,
        Mark::Fail,
        format!(
            "Memory: {:.1} GB (min {} required)",
            facts.total_memory_gb,
            format_gb(min_gb)
        ),
    )
}

fn format_gb(gb: f64) -> String {
    if gb < 1.0 {
        format!("{} MB", (gb * 1024.0).round())
    } else {
        format!("{} GB", gb)
    }
}

fn platform_check(facts: &SystemFacts, fail: Mark) -> Check {
    check(
        facts.is_linux(),
        fail,
        format!("Linux platform (current: {})", facts.os),
    )
}

fn arch_check(facts: &SystemFacts) -> Check {
    check(
        facts.is_64_bit(),
        Mark::Fail,
        format!("64-bit architecture (current: {})", facts.arch),
    )
}

pub fn report(
    software: &str,
    facts: &SystemFacts,
    detailed: bool,
    package_manager: Option<&str>,
) -> Report {
    let key = software.to_ascii_lowercase();
    let (title, checks) = match key.as_str() {
        "oracle" | "oracle-database" | "oracledb" => (
            "Oracle Database requirements".to_string(),
            vec![
                memory_check(facts, 2.0),
                check(facts.cpus >= 1, Mark::Fail, format!("CPUs: {} (min 1 required)", facts.cpus)),
                check(
                    facts.total_memory_gb >= 8.0,
                    Mark::Warn,
                    "Recommended: 8 GB+ RAM".to_string(),
                ),
                platform_check(facts, Mark::Fail),
                arch_check(facts),
            ],
        ),
        "docker" => (
            "Docker requirements".to_string(),
            vec![
                platform_check(facts, Mark::Fail),
                memory_check(facts, 1.0),
                arch_check(facts),
            ],
        ),
        "nginx" | "apache" | "apache2" | "httpd" => (
            format!("{} web server requirements", software.to_uppercase()),
            vec![
                memory_check(facts, 0.125),
                check(facts.cpus >= 1, Mark::Fail, format!("CPUs: {} (min 1 required)", facts.cpus)),
                platform_check(facts, Mark::Warn),
            ],
        ),
        _ => (format!("General system information for {}", software), Vec::new()),
    };

    let mut text = format!("System requirements check for {}\n\n{}:\n", software, title);
    if checks.is_empty() {
        text.push_str(&format!(
            "- OS: {}\n- Architecture: {}\n- Memory: {:.1} GB\n- CPUs: {}",
            facts.os, facts.arch, facts.total_memory_gb, facts.cpus
        ));
    } else {
        let lines: Vec<String> = checks
            .iter()
            .map(|c| format!("{} {}", c.mark.symbol(), c.line))
            .collect();
        text.push_str(&lines.join("\n"));
    }

    if detailed {
        text.push_str("\n\nDetailed system information:\n");
        text.push_str(&format!("- Hostname: {}\n", facts.hostname));
        text.push_str(&format!("- Uptime: {} hours\n", facts.uptime_hours));
        text.push_str(&format!(
            "- Free memory: {:.1} GB\n",
            facts.available_memory_gb
        ));
        for (mount, total, available) in &facts.disks {
            text.push_str(&format!(
                "- Disk {}: {:.0} GB total, {:.0} GB available\n",
                mount, total, available
            ));
        }
        text.push_str(&format!(
            "- Package manager: {}",
            package_manager.unwrap_or("none detected")
        ));
    }

    Report {
        text,
        meets: checks.iter().all(|c| c.mark != Mark::Fail),
    }
}
