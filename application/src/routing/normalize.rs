//! Utterance normalization, clause splitting and tokenization

/// Words dropped from the front of an utterance
const DIRECTIVE_WORDS: &[&str] = &["steward", "aios", "please", "hey", "ok", "okay"];

/// Sigils some front ends prepend to commands
const DIRECTIVE_SIGILS: &[char] = &['/', '!', '>', '$', ':'];

/// One word of a clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// As typed, minus surrounding punctuation
    pub text: String,
    /// Lowercased, for matching
    pub norm: String,
}

impl Token {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            norm: text.to_lowercase(),
        }
    }
}

/// Strip control characters, directive prefixes and trailing punctuation,
/// and collapse whitespace. Case is preserved here so paths survive; matching
/// and extraction use each [`Token`]'s lowercased form.
pub fn normalize(utterance: &str) -> String {
    let cleaned: String = utterance
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches(DIRECTIVE_SIGILS);

    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    while let Some(first) = words.first() {
        let bare = first.trim_end_matches([',', ':']).to_lowercase();
        if DIRECTIVE_WORDS.contains(&bare.as_str()) {
            words.remove(0);
        } else {
            break;
        }
    }

    words
        .join(" ")
        .trim_end_matches(['?', '!', '.'])
        .trim_end()
        .to_string()
}

/// Split a normalized utterance into sequential clauses.
///
/// Separators are `;` and the word `then` (with an optional leading `and`
/// or trailing comma on the previous clause).
pub fn split_clauses(normalized: &str) -> Vec<String> {
    let mut clauses = Vec::new();

    for part in normalized.split(';') {
        let mut current: Vec<&str> = Vec::new();
        for word in part.split_whitespace() {
            let bare = word.trim_end_matches(',').to_lowercase();
            if bare == "then" {
                push_clause(&mut clauses, &mut current);
            } else {
                current.push(word);
            }
        }
        push_clause(&mut clauses, &mut current);
    }

    clauses
}

fn push_clause(clauses: &mut Vec<String>, current: &mut Vec<&str>) {
    while let Some(last) = current.last() {
        let bare = last.trim_end_matches(',').to_lowercase();
        if bare == "and" || bare.is_empty() {
            current.pop();
        } else {
            break;
        }
    }
    if !current.is_empty() {
        let clause = current.join(" ");
        clauses.push(clause.trim_end_matches(',').to_string());
    }
    current.clear();
}

pub fn tokenize(clause: &str) -> Vec<Token> {
    clause
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| matches!(c, ',' | '"' | '\'' | '(' | ')' | '?' | '!' | '`'))
                .trim_end_matches(['.', ':'])
        })
        .filter(|w| !w.is_empty())
        .map(Token::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_noise() {
        assert_eq!(normalize("  Install   nginx\t"), "Install nginx");
        assert_eq!(normalize("/steward install nginx"), "install nginx");
        assert_eq!(normalize("Please, install nginx?"), "install nginx");
        assert_eq!(normalize("check\u{7}  requirements for docker."), "check requirements for docker");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_split_clauses() {
        assert_eq!(
            split_clauses("install nginx then enable nginx on boot"),
            vec!["install nginx", "enable nginx on boot"]
        );
        assert_eq!(
            split_clauses("install nginx, and then restart nginx; check requirements for docker"),
            vec!["install nginx", "restart nginx", "check requirements for docker"]
        );
        assert_eq!(split_clauses("install nginx"), vec!["install nginx"]);
        assert!(split_clauses("then ;").is_empty());
    }

    #[test]
    fn test_tokenize_keeps_case_in_text() {
        let tokens = tokenize("Install Oracle to /opt/Oracle, please.");
        let norms: Vec<_> = tokens.iter().map(|t| t.norm.as_str()).collect();
        assert_eq!(norms, vec!["install", "oracle", "to", "/opt/oracle", "please"]);
        assert_eq!(tokens[3].text, "/opt/Oracle");
    }
}
