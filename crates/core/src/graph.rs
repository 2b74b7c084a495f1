//! PatternLab dependency-graph transform
//!
//! Turns the `dependencyGraph.json` PatternLab writes next to its build
//! output into a flat `pattern name -> dependencies` map. Standalone
//! utility, not part of the generation pipeline.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PATTERN_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^/]*)/.*/([^.]*)\.[^.]*$").expect("static regex")
});
static META_FOOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"_[0-9]*-foot").expect("static regex"));
static META_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"_[0-9]*-head").expect("static regex"));

#[derive(Debug, Clone, Deserialize)]
pub struct DependencyGraph {
    pub graph: GraphBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphBody {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphNode {
    pub v: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphEdge {
    pub v: String,
    pub w: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatternDependencies {
    pub failed: bool,
    pub dependent_on: Vec<String>,
}

/// Flatten a dependency graph into `name -> {failed, dependentOn}`.
/// Template variants, styleguide head/foot meta patterns, and data files
/// are skipped.
pub fn transform(graph: &DependencyGraph) -> IndexMap<String, PatternDependencies> {
    let mut tree: IndexMap<String, PatternDependencies> = IndexMap::new();

    for node in &graph.graph.nodes {
        if excluded(&node.v) {
            continue;
        }
        if let Some(name) = pattern_name(&node.v) {
            tree.insert(name, PatternDependencies::default());
        }
    }

    for edge in &graph.graph.edges {
        if excluded(&edge.v) {
            continue;
        }
        let (Some(name), Some(dependent_on)) = (pattern_name(&edge.v), pattern_name(&edge.w))
        else {
            continue;
        };
        tree.entry(name).or_default().dependent_on.push(dependent_on);
    }

    tree
}

fn excluded(path: &str) -> bool {
    path.contains('~')
        || META_FOOT.is_match(path)
        || META_HEAD.is_match(path)
        || path.ends_with(".json")
}

/// `atoms/form/button.hbs` -> `atoms-button`
fn pattern_name(path: &str) -> Option<String> {
    let captures = PATTERN_NAME.captures(path)?;
    Some(format!("{}-{}", &captures[1], &captures[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph(value: serde_json::Value) -> DependencyGraph {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn transforms_node_paths_into_names() {
        let tree = transform(&graph(json!({
            "graph": {
                "nodes": [
                    { "v": "atoms/form/button.hbs" },
                    { "v": "molecules/nav/menu.hbs" }
                ],
                "edges": []
            }
        })));
        assert!(tree.contains_key("atoms-button"));
        assert!(tree.contains_key("molecules-menu"));
        assert!(!tree["atoms-button"].failed);
    }

    #[test]
    fn edges_fill_the_dependent_on_list() {
        let tree = transform(&graph(json!({
            "graph": {
                "nodes": [
                    { "v": "atoms/form/button.hbs" },
                    { "v": "molecules/nav/menu.hbs" }
                ],
                "edges": [
                    { "v": "molecules/nav/menu.hbs", "w": "atoms/form/button.hbs" }
                ]
            }
        })));
        assert_eq!(tree["molecules-menu"].dependent_on, vec!["atoms-button"]);
        assert!(tree["atoms-button"].dependent_on.is_empty());
    }

    #[test]
    fn json_nodes_and_edges_are_skipped() {
        let tree = transform(&graph(json!({
            "graph": {
                "nodes": [
                    { "v": "atoms/form/button.hbs" },
                    { "v": "atoms/form/button.json" }
                ],
                "edges": [
                    { "v": "atoms/form/button.json", "w": "atoms/form/button.hbs" }
                ]
            }
        })));
        assert_eq!(tree.len(), 1);
        assert!(tree["atoms-button"].dependent_on.is_empty());
    }

    #[test]
    fn pattern_variants_and_meta_patterns_are_skipped() {
        let tree = transform(&graph(json!({
            "graph": {
                "nodes": [
                    { "v": "atoms/form/button~primary.hbs" },
                    { "v": "meta/partials/_00-head.hbs" },
                    { "v": "meta/partials/_01-foot.hbs" },
                    { "v": "atoms/form/input.hbs" }
                ],
                "edges": []
            }
        })));
        assert_eq!(tree.len(), 1);
        assert!(tree.contains_key("atoms-input"));
    }
}
