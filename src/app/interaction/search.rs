use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::Node;

const SUGGESTION_LIMIT: usize = 8;

/// First node in snapshot order whose display name contains `query`,
/// ignoring case.
pub(in crate::app) fn find_first_match(nodes: &[Node], query: &str) -> Option<usize> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    nodes
        .iter()
        .position(|node| node.display_name().to_lowercase().contains(&query))
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct Suggestion {
    pub(in crate::app) index: usize,
    pub(in crate::app) name: String,
    pub(in crate::app) score: i64,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Best fuzzy matches for the search box, highest score first.
pub(in crate::app) fn suggestions(nodes: &[Node], query: &str) -> Vec<Suggestion> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut ranked = nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let name = node.display_name();
            fuzzy_match_score(&matcher, name, query).map(|score| Suggestion {
                index,
                name: name.to_owned(),
                score,
            })
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
    ranked.truncate(SUGGESTION_LIMIT);
    ranked
}
