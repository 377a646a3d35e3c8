//! Keyword-rule intent resolver.
//!
//! Each clause of the utterance is scored against every catalog entry:
//!
//! - a descriptor's keywords, plus its name with `_` read as spaces, are
//!   matched as whole-word phrases
//! - the primary score is the number of matched phrases, the secondary
//!   score the longest matched phrase in words
//! - equal scores go to the tool declared first, and the tie costs
//!   confidence
//!
//! Confidence per clause starts at 0.6, gains 0.1 per extra phrase and per
//! extra word in the longest phrase, gains 0.15 when every required
//! parameter was extracted, and loses 0.2 on a tie. A multi-clause
//! utterance is as confident as its weakest clause.

use async_trait::async_trait;
use steward_domain::{ToolCatalog, ToolDescriptor, ToolId};

use super::extract::{extract_params, phrase_span};
use super::normalize::{Token, split_clauses, tokenize};
use crate::ports::intent::{IntentResolver, Resolution, ResolveError, ToolSelection};

const BASE_CONFIDENCE: f32 = 0.6;
const PHRASE_BONUS: f32 = 0.1;
const COMPLETE_BONUS: f32 = 0.15;
const TIE_PENALTY: f32 = 0.2;
const MAX_CONFIDENCE: f32 = 0.95;
const MAX_SUGGESTIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Score {
    phrases: usize,
    longest: usize,
}

/// Deterministic keyword resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedResolver;

impl RuleBasedResolver {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core, shared with the hybrid resolver
    pub fn resolve_now(
        &self,
        utterance: &str,
        catalog: &ToolCatalog,
    ) -> Result<Resolution, ResolveError> {
        let clauses = split_clauses(utterance);
        if clauses.is_empty() {
            return Err(no_match(catalog));
        }

        let mut selections = Vec::with_capacity(clauses.len());
        let mut confidence = 1.0_f32;

        for clause in &clauses {
            let tokens = tokenize(clause);
            let (descriptor, score, tied) =
                best_match(&tokens, catalog).ok_or_else(|| no_match(catalog))?;

            let params = extract_params(descriptor, &tokens);
            let complete = descriptor.required_parameters().count() > 0
                && descriptor
                    .required_parameters()
                    .all(|p| params.contains_key(&p.name));

            let clause_confidence = clause_confidence(score, complete, tied);
            tracing::debug!(
                clause = %clause,
                tool = %descriptor.name,
                phrases = score.phrases,
                longest = score.longest,
                tied,
                confidence = clause_confidence,
                "Matched clause"
            );

            confidence = confidence.min(clause_confidence);
            selections.push(ToolSelection::new(descriptor.name.clone(), params));
        }

        Ok(Resolution {
            selections,
            confidence,
            strategy: "rules",
        })
    }
}

#[async_trait]
impl IntentResolver for RuleBasedResolver {
    fn name(&self) -> &str {
        "rules"
    }

    async fn resolve(
        &self,
        utterance: &str,
        catalog: &ToolCatalog,
    ) -> Result<Resolution, ResolveError> {
        self.resolve_now(utterance, catalog)
    }
}

fn score(descriptor: &ToolDescriptor, tokens: &[Token]) -> Option<Score> {
    let name_phrase = descriptor.name.as_str().replace('_', " ");
    let spans: Vec<usize> = std::iter::once(name_phrase.as_str())
        .chain(descriptor.keywords.iter().map(String::as_str))
        .filter_map(|phrase| phrase_span(tokens, phrase))
        .collect();

    let longest = spans.iter().copied().max()?;
    Some(Score {
        phrases: spans.len(),
        longest,
    })
}

/// Best-scoring descriptor, its score, and whether another tool tied it
fn best_match<'a>(
    tokens: &[Token],
    catalog: &'a ToolCatalog,
) -> Option<(&'a ToolDescriptor, Score, bool)> {
    let scored: Vec<(ToolId, &ToolDescriptor, Score)> = catalog
        .iter()
        .filter_map(|(id, d)| score(d, tokens).map(|s| (id, d, s)))
        .collect();

    let mut best: Option<&(ToolId, &ToolDescriptor, Score)> = None;
    for candidate in &scored {
        // strictly greater keeps the earliest declaration on ties
        if best.is_none_or(|b| candidate.2 > b.2) {
            best = Some(candidate);
        }
    }

    let (best_id, descriptor, best_score) = *best?;
    let tied = scored
        .iter()
        .any(|(id, _, s)| *id != best_id && *s == best_score);
    Some((descriptor, best_score, tied))
}

fn clause_confidence(score: Score, complete: bool, tied: bool) -> f32 {
    let mut confidence = BASE_CONFIDENCE
        + PHRASE_BONUS * score.phrases.saturating_sub(1) as f32
        + PHRASE_BONUS * score.longest.saturating_sub(1) as f32;
    if complete {
        confidence += COMPLETE_BONUS;
    }
    if tied {
        confidence -= TIE_PENALTY;
    }
    confidence.clamp(0.0, MAX_CONFIDENCE)
}

fn no_match(catalog: &ToolCatalog) -> ResolveError {
    ResolveError::NoMatch {
        suggestions: suggestions(catalog),
    }
}

/// Example phrasings, one per tool
pub fn suggestions(catalog: &ToolCatalog) -> Vec<String> {
    catalog
        .iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, d)| {
            let phrase = d
                .keywords
                .first()
                .cloned()
                .unwrap_or_else(|| d.name.as_str().replace('_', " "));
            format!("{} ({})", phrase, d.name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_domain::{ExtractionHint, RiskLevel, ToolName, ToolParameter};

    fn catalog() -> ToolCatalog {
        ToolCatalog::new()
            .with(
                ToolDescriptor::new(
                    ToolName::new("install_package").unwrap(),
                    "Install a package",
                    RiskLevel::Moderate,
                )
                .with_keywords(["install", "add package"])
                .with_parameter(
                    ToolParameter::new("package", "Package", true).with_hint(
                        ExtractionHint::AfterKeyword {
                            words: vec!["install".into(), "add".into()],
                        },
                    ),
                ),
            )
            .with(
                ToolDescriptor::new(
                    ToolName::new("install_oracle_database").unwrap(),
                    "Install Oracle Database",
                    RiskLevel::Destructive,
                )
                .with_keywords(["oracle", "install oracle", "oracle database"]),
            )
            .with(
                ToolDescriptor::new(
                    ToolName::new("manage_service").unwrap(),
                    "Manage a service",
                    RiskLevel::Moderate,
                )
                .with_keywords(["enable", "restart", "start", "stop"])
                .with_parameter(
                    ToolParameter::new("service", "Service", true).with_hint(
                        ExtractionHint::AfterKeyword {
                            words: vec!["enable".into(), "restart".into()],
                        },
                    ),
                ),
            )
            .with(
                ToolDescriptor::new(
                    ToolName::new("restart_host").unwrap(),
                    "Restart the host",
                    RiskLevel::Destructive,
                )
                .with_keywords(["restart"]),
            )
    }

    #[test]
    fn test_single_clause_with_extraction() {
        let resolution = RuleBasedResolver.resolve_now("install nginx", &catalog()).unwrap();
        assert_eq!(resolution.selections.len(), 1);
        assert_eq!(resolution.selections[0].tool.as_str(), "install_package");
        assert_eq!(resolution.selections[0].params["package"], "nginx");
        assert!((resolution.confidence - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_more_phrases_beat_declaration_order() {
        let resolution = RuleBasedResolver
            .resolve_now("install oracle with 8GB memory", &catalog())
            .unwrap();
        assert_eq!(
            resolution.selections[0].tool.as_str(),
            "install_oracle_database"
        );
        assert!(resolution.confidence >= 0.75);
    }

    #[test]
    fn test_compound_utterance_keeps_order() {
        let resolution = RuleBasedResolver
            .resolve_now("install nginx then enable nginx", &catalog())
            .unwrap();
        let tools: Vec<_> = resolution
            .selections
            .iter()
            .map(|s| s.tool.as_str())
            .collect();
        assert_eq!(tools, vec!["install_package", "manage_service"]);
        assert_eq!(resolution.selections[1].params["service"], "nginx");
    }

    #[test]
    fn test_tie_goes_to_first_declared_with_penalty() {
        let resolution = RuleBasedResolver.resolve_now("restart nginx", &catalog()).unwrap();
        assert_eq!(resolution.selections[0].tool.as_str(), "manage_service");
        // 0.6 + 0.15 (service extracted) - 0.2 (tie with restart_host)
        assert!((resolution.confidence - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_tool_name_is_a_phrase() {
        let resolution = RuleBasedResolver
            .resolve_now("manage service sshd", &catalog())
            .unwrap();
        assert_eq!(resolution.selections[0].tool.as_str(), "manage_service");
    }

    #[test]
    fn test_no_match_offers_suggestions() {
        let err = RuleBasedResolver
            .resolve_now("make me a sandwich", &catalog())
            .unwrap_err();
        match err {
            ResolveError::NoMatch { suggestions } => {
                assert_eq!(suggestions.len(), 4);
                assert_eq!(suggestions[0], "install (install_package)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_one_unmatched_clause_fails_the_utterance() {
        let err = RuleBasedResolver
            .resolve_now("install nginx then make coffee", &catalog())
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoMatch { .. }));
    }

    #[test]
    fn test_deterministic() {
        let a = RuleBasedResolver.resolve_now("install nginx", &catalog()).unwrap();
        let b = RuleBasedResolver.resolve_now("install nginx", &catalog()).unwrap();
        assert_eq!(a, b);
    }
}
