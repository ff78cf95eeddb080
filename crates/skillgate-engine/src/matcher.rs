//! Trigger matcher
//!
//! Evaluates an artifact against every descriptor's trigger set. A skill
//! matches when any path, lexical or annotation trigger fires.

use skillgate_types::{Artifact, SkillId, TriggerCategory};
use std::collections::HashSet;
use tracing::debug;

use crate::descriptor::SkillDescriptor;
use crate::trigger::{Token, TokenSpec};

/// Score contributed by a path match
pub const PATH_WEIGHT: u32 = 2;
/// Maximum score contributed by distinct lexical/annotation tokens
pub const TOKEN_SCORE_CAP: u32 = 5;

/// One trigger rule that fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTrigger {
    /// Category of the rule
    pub category: TriggerCategory,
    /// The rule as written (glob or token)
    pub pattern: String,
    /// Matched path or content substring
    pub matched: String,
}

/// Result of matching one descriptor against one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Matched skill
    pub skill: SkillId,
    /// Position of the descriptor in the evaluated sequence
    pub index: usize,
    /// Every rule that fired
    pub fired: Vec<FiredTrigger>,
    /// Relevance score
    pub score: u32,
}

impl MatchResult {
    /// Whether any path trigger fired
    pub fn path_matched(&self) -> bool {
        self.fired
            .iter()
            .any(|f| f.category == TriggerCategory::Path)
    }
}

/// Match an artifact against descriptors.
///
/// Returns one result per descriptor with at least one fired trigger,
/// sorted by score descending; ties keep descriptor order.
pub fn match_skills<'a, I>(artifact: &Artifact, descriptors: I) -> Vec<MatchResult>
where
    I: IntoIterator<Item = &'a SkillDescriptor>,
{
    let mut results: Vec<MatchResult> = descriptors
        .into_iter()
        .enumerate()
        .filter_map(|(index, descriptor)| match_descriptor(artifact, descriptor, index))
        .collect();

    // sort_by is stable
    results.sort_by(|a, b| b.score.cmp(&a.score));

    debug!(
        "Artifact {} matched {} skill(s)",
        artifact.path(),
        results.len()
    );
    results
}

fn match_descriptor(
    artifact: &Artifact,
    descriptor: &SkillDescriptor,
    index: usize,
) -> Option<MatchResult> {
    let mut fired = Vec::new();

    for path in &descriptor.triggers.paths {
        if path.matches(artifact.path()) {
            fired.push(FiredTrigger {
                category: TriggerCategory::Path,
                pattern: path.as_str().to_string(),
                matched: artifact.path().to_string(),
            });
        }
    }
    let path_matched = !fired.is_empty();

    let mut distinct: HashSet<&TokenSpec> = HashSet::new();
    let categories = [
        (TriggerCategory::Lexical, &descriptor.triggers.lexical),
        (TriggerCategory::Annotation, &descriptor.triggers.annotations),
    ];
    for (category, tokens) in categories {
        for token in tokens {
            if let Some(matched) = token.find(artifact.content()) {
                distinct.insert(token.spec());
                fired.push(FiredTrigger {
                    category,
                    pattern: token.spec().to_string(),
                    matched: matched.to_string(),
                });
            }
        }
    }

    if fired.is_empty() {
        return None;
    }

    let token_score = u32::try_from(distinct.len())
        .unwrap_or(u32::MAX)
        .min(TOKEN_SCORE_CAP);
    let score = (if path_matched { PATH_WEIGHT } else { 0 }) + token_score;

    debug!(
        "Skill {} fired {} trigger(s), score {}",
        descriptor.id,
        fired.len(),
        score
    );

    Some(MatchResult {
        skill: descriptor.id.clone(),
        index,
        fired,
        score,
    })
}

/// Number of distinct tokens found in `content`
pub(crate) fn count_token_hits(tokens: &[Token], content: &str) -> usize {
    let mut distinct: HashSet<&TokenSpec> = HashSet::new();
    for token in tokens {
        if token.find(content).is_some() {
            distinct.insert(token.spec());
        }
    }
    distinct.len()
}
