//! Lineage graph model and validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::layout::{self, Canvas, Position};

/// Role of a node in the graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// The unknown file being checked.
    Query,
    /// The canonical best match.
    Anchor,
    /// Same content as the anchor.
    Duplicate,
    /// Explicitly asserted ancestor.
    Declared,
    Match,
    Neighbor,
    Default,
}

impl NodeKind {
    /// Maps a caller-supplied type string; anything unknown is `Default`.
    pub fn from_type(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("query") => NodeKind::Query,
            Some("anchor") => NodeKind::Anchor,
            Some("duplicate") => NodeKind::Duplicate,
            Some("declared") => NodeKind::Declared,
            Some("match") => NodeKind::Match,
            Some("neighbor") => NodeKind::Neighbor,
            _ => NodeKind::Default,
        }
    }
}

/// Edge vocabulary. Relationships outside it are dropped.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    QueryMatch,
    QueryNeighbor,
    Similarity,
    SameContent,
    DeclaredLineage,
}

impl Relationship {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "query_match" => Some(Relationship::QueryMatch),
            "query_neighbor" => Some(Relationship::QueryNeighbor),
            "similarity" => Some(Relationship::Similarity),
            "same_content" => Some(Relationship::SameContent),
            "declared_lineage" => Some(Relationship::DeclaredLineage),
            _ => None,
        }
    }
}

/// Untrusted node input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sha256_hash: Option<String>,
    #[serde(default)]
    pub perceptual_hash: Option<String>,
    #[serde(default)]
    pub signer_address: Option<String>,
    /// Fraction (`<= 1`) or percentage.
    #[serde(default)]
    pub similarity: Option<f64>,
}

/// Untrusted edge input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub relationship: String,
    /// Fraction (`<= 1`) or percentage; used only for labels.
    #[serde(default)]
    pub similarity: Option<f64>,
}

/// Input to [`build`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageRecords {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub suspect_id: Option<String>,
    #[serde(default)]
    pub anchor_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineageNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    pub sha256_hash: Option<String>,
    pub perceptual_hash: Option<String>,
    pub signer_address: Option<String>,
    /// Integer percentage.
    pub similarity: Option<u8>,
    pub position: Position,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub source: String,
    pub target: String,
    pub relationship: Relationship,
    pub similarity: Option<u8>,
}

/// Validated, positioned lineage graph.
///
/// Every edge endpoint names a node in `nodes`, and every node has a
/// position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineageGraph {
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<LineageEdge>,
    pub query_id: String,
    pub anchor_id: String,
}

impl LineageGraph {
    pub fn node(&self, id: &str) -> Option<&LineageNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.node(id).map(|n| n.position)
    }
}

/// Normalizes a fraction or percentage to an integer percentage.
pub fn similarity_pct(v: f64) -> Option<u8> {
    if !v.is_finite() || v < 0.0 {
        return None;
    }
    let pct = if v <= 1.0 { v * 100.0 } else { v };
    Some(pct.min(100.0).round() as u8)
}

/// Builds a graph on the default canvas. See [`build_on`].
pub fn build(records: LineageRecords) -> Option<LineageGraph> {
    build_on(records, Canvas::default())
}

/// Validates `records` and lays them out on `canvas`.
///
/// Returns `None` when fewer than two distinct nodes remain. Nodes with an
/// empty or repeated id are ignored; edges with an unknown relationship,
/// a missing endpoint, identical endpoints, or that repeat an earlier edge
/// are dropped. The query is `suspect_id`, else the first `query` node,
/// else the first node; the anchor is `anchor_id`, else the first `anchor`
/// node, else the first other node. Only those two nodes keep the `query`
/// and `anchor` kinds: other `anchor` nodes become `match`, other `query`
/// nodes become `default`.
pub fn build_on(records: LineageRecords, canvas: Canvas) -> Option<LineageGraph> {
    let mut seen = HashSet::new();
    let mut nodes: Vec<NodeRecord> = Vec::with_capacity(records.nodes.len());
    for node in records.nodes {
        if node.id.is_empty() || !seen.insert(node.id.clone()) {
            tracing::debug!(id = %node.id, "ignoring node with empty or repeated id");
            continue;
        }
        nodes.push(node);
    }
    if nodes.len() < 2 {
        return None;
    }

    let mut kinds: Vec<NodeKind> = nodes
        .iter()
        .map(|n| NodeKind::from_type(n.kind.as_deref()))
        .collect();
    let index_of = |id: &str| nodes.iter().position(|n| n.id == id);

    let query = records
        .suspect_id
        .as_deref()
        .and_then(index_of)
        .or_else(|| kinds.iter().position(|k| *k == NodeKind::Query))
        .unwrap_or(0);
    let anchor = records
        .anchor_id
        .as_deref()
        .and_then(index_of)
        .filter(|&i| i != query)
        .or_else(|| (0..nodes.len()).find(|&i| i != query && kinds[i] == NodeKind::Anchor))
        .or_else(|| (0..nodes.len()).find(|&i| i != query))?;

    for (i, kind) in kinds.iter_mut().enumerate() {
        *kind = match (*kind, i) {
            (_, i) if i == query => NodeKind::Query,
            (_, i) if i == anchor => NodeKind::Anchor,
            (NodeKind::Anchor, _) => NodeKind::Match,
            (NodeKind::Query, _) => NodeKind::Default,
            (k, _) => k,
        };
    }

    let mut edge_keys = HashSet::new();
    let mut edges = Vec::with_capacity(records.edges.len());
    for edge in records.edges {
        let Some(relationship) = Relationship::parse(&edge.relationship) else {
            tracing::warn!(relationship = %edge.relationship, "dropping edge with unknown relationship");
            continue;
        };
        if edge.source == edge.target {
            tracing::warn!(node = %edge.source, "dropping self-loop");
            continue;
        }
        if !seen.contains(&edge.source) || !seen.contains(&edge.target) {
            tracing::warn!(source = %edge.source, target = %edge.target, "dropping edge with missing endpoint");
            continue;
        }
        if !edge_keys.insert((edge.source.clone(), edge.target.clone(), relationship)) {
            tracing::warn!(source = %edge.source, target = %edge.target, "dropping duplicate edge");
            continue;
        }
        edges.push(LineageEdge {
            source: edge.source,
            target: edge.target,
            relationship,
            similarity: edge.similarity.and_then(similarity_pct),
        });
    }

    let positions = layout::assign(&kinds, query, anchor, canvas);
    let query_id = nodes[query].id.clone();
    let anchor_id = nodes[anchor].id.clone();

    let nodes = nodes
        .into_iter()
        .zip(kinds)
        .zip(positions)
        .map(|((n, kind), position)| LineageNode {
            label: n.label.filter(|l| !l.is_empty()).unwrap_or_else(|| n.id.clone()),
            id: n.id,
            kind,
            sha256_hash: n.sha256_hash,
            perceptual_hash: n.perceptual_hash,
            signer_address: n.signer_address,
            similarity: n.similarity.and_then(similarity_pct),
            position,
        })
        .collect();

    Some(LineageGraph {
        nodes,
        edges,
        query_id,
        anchor_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: &str) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            kind: Some(kind.to_string()),
            ..Default::default()
        }
    }

    fn edge(source: &str, target: &str, relationship: &str) -> EdgeRecord {
        EdgeRecord {
            source: source.to_string(),
            target: target.to_string(),
            relationship: relationship.to_string(),
            similarity: None,
        }
    }

    #[test]
    fn single_node_yields_no_graph() {
        let records = LineageRecords {
            nodes: vec![node("q", "query")],
            ..Default::default()
        };
        assert!(build(records).is_none());

        // A repeated id does not count as a second node.
        let records = LineageRecords {
            nodes: vec![node("q", "query"), node("q", "anchor")],
            ..Default::default()
        };
        assert!(build(records).is_none());
    }

    #[test]
    fn query_anchor_and_duplicates_resolve_to_positions() {
        let records = LineageRecords {
            nodes: vec![
                node("q", "query"),
                node("a", "anchor"),
                node("d1", "duplicate"),
                node("d2", "duplicate"),
            ],
            edges: vec![edge("q", "a", "query_match"), edge("a", "d1", "same_content")],
            ..Default::default()
        };
        let graph = build(records).expect("graph");

        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.query_id, "q");
        assert_eq!(graph.anchor_id, "a");
        for e in &graph.edges {
            assert!(graph.position(&e.source).is_some());
            assert!(graph.position(&e.target).is_some());
        }
    }

    #[test]
    fn invalid_edges_are_dropped() {
        let records = LineageRecords {
            nodes: vec![node("q", "query"), node("a", "anchor")],
            edges: vec![
                edge("q", "a", "query_match"),
                edge("q", "a", "query_match"),
                edge("q", "a", "inspired_by"),
                edge("a", "a", "similarity"),
                edge("q", "ghost", "similarity"),
            ],
            ..Default::default()
        };
        let graph = build(records).expect("graph");
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].relationship, Relationship::QueryMatch);
    }

    #[test]
    fn unknown_types_default_and_extra_anchors_are_demoted() {
        let records = LineageRecords {
            nodes: vec![
                node("x", "mystery"),
                node("q", "query"),
                node("a1", "anchor"),
                node("a2", "anchor"),
            ],
            ..Default::default()
        };
        let graph = build(records).expect("graph");

        assert_eq!(graph.query_id, "q");
        assert_eq!(graph.anchor_id, "a1");
        assert_eq!(graph.node("x").unwrap().kind, NodeKind::Default);
        assert_eq!(graph.node("a2").unwrap().kind, NodeKind::Match);
    }

    #[test]
    fn explicit_ids_take_precedence() {
        let records = LineageRecords {
            nodes: vec![node("q", "query"), node("a", "anchor"), node("s", "match")],
            suspect_id: Some("s".into()),
            anchor_id: Some("q".into()),
            ..Default::default()
        };
        let graph = build(records).expect("graph");
        assert_eq!(graph.query_id, "s");
        assert_eq!(graph.anchor_id, "q");
        assert_eq!(graph.node("s").unwrap().kind, NodeKind::Query);
        assert_eq!(graph.node("a").unwrap().kind, NodeKind::Match);
    }

    #[test]
    fn untyped_graph_falls_back_to_first_nodes() {
        let records = LineageRecords {
            nodes: vec![
                NodeRecord { id: "n1".into(), ..Default::default() },
                NodeRecord { id: "n2".into(), ..Default::default() },
            ],
            ..Default::default()
        };
        let graph = build(records).expect("graph");
        assert_eq!(graph.query_id, "n1");
        assert_eq!(graph.anchor_id, "n2");
        assert_eq!(graph.node("n1").unwrap().label, "n1");
    }

    #[test]
    fn similarity_accepts_fractions_and_percentages() {
        assert_eq!(similarity_pct(0.953), Some(95));
        assert_eq!(similarity_pct(95.3), Some(95));
        assert_eq!(similarity_pct(1.0), Some(100));
        assert_eq!(similarity_pct(250.0), Some(100));
        assert_eq!(similarity_pct(-0.5), None);
        assert_eq!(similarity_pct(f64::NAN), None);
    }

    #[test]
    fn records_parse_from_json() {
        let json = r#"{
            "nodes": [
                {"id": "suspect", "type": "query"},
                {"id": "rk1", "type": "anchor", "similarity": 0.97}
            ],
            "edges": [{"source": "suspect", "target": "rk1", "relationship": "query_match", "similarity": 0.97}],
            "suspect_id": "suspect"
        }"#;
        let records: LineageRecords = serde_json::from_str(json).unwrap();
        let graph = build(records).expect("graph");
        assert_eq!(graph.edges[0].similarity, Some(97));

        let out = serde_json::to_value(&graph).unwrap();
        assert_eq!(out["nodes"][0]["type"], "query");
        assert_eq!(out["edges"][0]["relationship"], "query_match");
    }
}
