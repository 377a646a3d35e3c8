//! String utilities for the domain layer.

/// Truncate a string to a maximum byte length with ellipsis (UTF-8 safe)
///
/// Truncation always lands on a character boundary.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// First line of a possibly multi-line string, without trailing whitespace
pub fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("").trim_end()
}

/// Keep the head and tail of long multi-line output
pub fn elide_lines(s: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = s.lines().collect();
    if lines.len() <= max_lines || max_lines < 2 {
        return s.to_string();
    }
    let head = max_lines / 2;
    let tail = max_lines - head;
    let mut out: Vec<String> = lines[..head].iter().map(|l| l.to_string()).collect();
    out.push(format!("... [{} lines elided] ...", lines.len() - max_lines));
    out.extend(lines[lines.len() - tail..].iter().map(|l| l.to_string()));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "é" is two bytes; a cut inside it must back off to the boundary
        assert_eq!(truncate("ééééé", 6), "é...");
        assert_eq!(truncate("ééééé", 20), "ééééé");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("Would execute: apt  \nmore"), "Would execute: apt");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_elide_lines() {
        let text = (1..=10).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let elided = elide_lines(&text, 4);
        assert_eq!(elided, "1\n2\n... [6 lines elided] ...\n9\n10");
        assert_eq!(elide_lines("a\nb", 4), "a\nb");
    }
}
