use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::GraphNode;

const MAX_SEARCH_HITS: usize = 50;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Node indices whose display name or id matches `query`, best first.
pub(super) fn search_nodes(nodes: &[GraphNode], query: &str) -> Vec<usize> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let by_name = fuzzy_match_score(&matcher, &node.display_name(), query);
            let by_id = fuzzy_match_score(&matcher, &node.id, query);
            by_name.max(by_id).map(|score| (index, score))
        })
        .collect::<Vec<_>>();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(MAX_SEARCH_HITS);
    scored.into_iter().map(|(index, _)| index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    fn nodes() -> Vec<GraphNode> {
        vec![
            GraphNode::new("e1", NodeKind::Entity).with_meta("canonical_name", "Rapamycin"),
            GraphNode::new("e2", NodeKind::Entity).with_meta("canonical_name", "mTOR"),
            GraphNode::new("p1", NodeKind::Paper).with_meta("year", 2019),
        ]
    }

    #[test]
    fn blank_query_matches_nothing() {
        assert!(search_nodes(&nodes(), "   ").is_empty());
    }

    #[test]
    fn matches_names_case_insensitively() {
        assert_eq!(search_nodes(&nodes(), "rapa"), vec![0]);
        assert_eq!(search_nodes(&nodes(), "MTOR").first(), Some(&1));
    }

    #[test]
    fn matches_ids_and_paper_years() {
        assert!(search_nodes(&nodes(), "p1").contains(&2));
        assert!(search_nodes(&nodes(), "2019").contains(&2));
    }
}
