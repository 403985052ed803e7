//! Lineage records derived from a classification.

use std::collections::HashSet;

use super::graph::{EdgeRecord, LineageGraph, LineageRecords, NodeRecord, build};
use crate::types::{MediaFingerprint, RegisteredMedia};
use crate::verification::{VerificationResult, similarity_percent};

/// Node id used for the file being verified.
pub const QUERY_NODE_ID: &str = "query";

/// Builds the lineage graph for one verification.
///
/// The matched record becomes the anchor (linked by `query_match`); other
/// records with the anchor's content hash become `duplicate` nodes
/// (`same_content`); the `top_k` most similar remaining records become
/// `neighbor` nodes (`query_neighbor`). Returns `None` when nothing but the
/// query would be drawn.
pub fn from_verification(
    query: &MediaFingerprint,
    result: &VerificationResult,
    registry: &[RegisteredMedia],
    top_k: usize,
) -> Option<LineageGraph> {
    let mut ids = HashSet::from([QUERY_NODE_ID.to_string()]);
    let mut records = LineageRecords {
        nodes: vec![NodeRecord {
            id: QUERY_NODE_ID.to_string(),
            kind: Some("query".to_string()),
            label: Some("Query".to_string()),
            sha256_hash: Some(query.sha256_hash.to_hex()),
            perceptual_hash: query.perceptual_hash.as_ref().map(ToString::to_string),
            ..Default::default()
        }],
        suspect_id: Some(QUERY_NODE_ID.to_string()),
        ..Default::default()
    };
    let mut used = vec![false; registry.len()];

    if let Some(idx) = result.matched_index.filter(|&i| i < registry.len()) {
        used[idx] = true;
        let anchor = &registry[idx];
        let anchor_id = unique_id(&mut ids, anchor, idx);
        let similarity = result.phash_similarity.map(f64::from);

        records.nodes.push(node(anchor, &anchor_id, "anchor", similarity));
        records.edges.push(edge(QUERY_NODE_ID, &anchor_id, "query_match", similarity));
        records.anchor_id = Some(anchor_id.clone());

        if let Some(content) = anchor.content_hash() {
            for (i, rec) in registry.iter().enumerate() {
                if used[i] || rec.content_hash() != Some(content) {
                    continue;
                }
                used[i] = true;
                let id = unique_id(&mut ids, rec, i);
                records.nodes.push(node(rec, &id, "duplicate", None));
                records.edges.push(edge(&anchor_id, &id, "same_content", None));
            }
        }
    }

    if let Some(q) = &query.perceptual_hash {
        let mut neighbours: Vec<(usize, u8)> = registry
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .filter_map(|(i, rec)| rec.perceptual().map(|p| (i, similarity_percent(q, &p))))
            .collect();
        // Stable: equal similarities keep registry order.
        neighbours.sort_by(|a, b| b.1.cmp(&a.1));

        for (i, sim) in neighbours.into_iter().take(top_k) {
            let rec = &registry[i];
            let id = unique_id(&mut ids, rec, i);
            let sim = Some(f64::from(sim));
            records.nodes.push(node(rec, &id, "neighbor", sim));
            records.edges.push(edge(QUERY_NODE_ID, &id, "query_neighbor", sim));
        }
    }

    build(records)
}

fn unique_id(ids: &mut HashSet<String>, rec: &RegisteredMedia, idx: usize) -> String {
    let base = rec
        .display_id()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("record-{idx}"));
    let mut id = base.clone();
    let mut suffix = idx;
    while ids.contains(&id) {
        id = format!("{base}#{suffix}");
        suffix += 1;
    }
    ids.insert(id.clone());
    id
}

fn node(rec: &RegisteredMedia, id: &str, kind: &str, similarity: Option<f64>) -> NodeRecord {
    NodeRecord {
        id: id.to_string(),
        kind: Some(kind.to_string()),
        label: rec.ai_model.clone().or_else(|| rec.signer_address.clone()),
        sha256_hash: rec.sha256_hash.clone(),
        perceptual_hash: rec.perceptual_hash.clone(),
        signer_address: rec.signer_address.clone(),
        similarity,
    }
}

fn edge(source: &str, target: &str, relationship: &str, similarity: Option<f64>) -> EdgeRecord {
    EdgeRecord {
        source: source.to_string(),
        target: target.to_string(),
        relationship: relationship.to_string(),
        similarity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::{NodeKind, Relationship};
    use crate::types::{ContentHash, PerceptualHash};
    use crate::verification::{Classifier, VerificationStatus};

    const BASE: u64 = 0x1234_5678_9abc_def0;

    fn rec(key: &str, content: &[u8], phash: u64) -> RegisteredMedia {
        RegisteredMedia {
            unique_reg_key: Some(key.to_string()),
            sha256_hash: Some(ContentHash::compute(content).to_hex()),
            perceptual_hash: Some(PerceptualHash::from_u64(phash).to_string()),
            ..Default::default()
        }
    }

    fn query(content: &[u8], phash: u64) -> MediaFingerprint {
        MediaFingerprint {
            sha256_hash: ContentHash::compute(content),
            perceptual_hash: Some(PerceptualHash::from_u64(phash)),
        }
    }

    #[test]
    fn similar_match_gets_anchor_duplicates_and_neighbours() {
        let registry = vec![
            rec("far", b"far", !BASE),
            rec("orig", b"orig", BASE ^ 0b1),
            rec("orig-copy", b"orig", BASE ^ 0b1),
            rec("near", b"near", BASE ^ 0xff),
        ];
        let q = query(b"edited", BASE);
        let result = Classifier::default().classify(&q, &registry, None);
        assert_eq!(result.status, VerificationStatus::Similar);

        let graph = from_verification(&q, &result, &registry, 8).expect("graph");
        assert_eq!(graph.query_id, QUERY_NODE_ID);
        assert_eq!(graph.anchor_id, "orig");
        assert_eq!(graph.node("orig-copy").unwrap().kind, NodeKind::Duplicate);
        assert_eq!(graph.node("near").unwrap().kind, NodeKind::Neighbor);
        assert_eq!(graph.nodes.len(), 5);

        let rels: Vec<_> = graph.edges.iter().map(|e| e.relationship).collect();
        assert_eq!(rels[0], Relationship::QueryMatch);
        assert!(rels.contains(&Relationship::SameContent));
        // Neighbours are ordered by similarity: "near" (88%) before "far" (0%).
        assert_eq!(graph.edges[2].target, "near");
    }

    #[test]
    fn unique_id_skips_ids_already_taken() {
        let mut ids = HashSet::from(["x".to_string(), "x#3".to_string()]);
        let r = RegisteredMedia {
            unique_reg_key: Some("x".into()),
            ..Default::default()
        };

        assert_eq!(unique_id(&mut ids, &r, 3), "x#4");
        assert_eq!(unique_id(&mut ids, &r, 3), "x#5");
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn top_k_limits_neighbours() {
        let registry: Vec<_> = (0..5u64)
            .map(|i| rec(&format!("n{i}"), format!("c{i}").as_bytes(), BASE ^ (0xffff << (i * 4))))
            .collect();
        let q = query(b"q", BASE);
        let result = Classifier::default().classify(&q, &registry, None);
        assert_eq!(result.status, VerificationStatus::NotFound);

        let graph = from_verification(&q, &result, &registry, 2).expect("graph");
        assert_eq!(graph.nodes.len(), 3);
    }

    #[test]
    fn nothing_to_draw_yields_none() {
        let q = MediaFingerprint {
            sha256_hash: ContentHash::compute(b"lonely"),
            perceptual_hash: None,
        };
        let result = Classifier::default().classify(&q, &[], None);
        assert!(from_verification(&q, &result, &[], 8).is_none());
    }

    #[test]
    fn records_without_ids_get_unique_fallbacks() {
        let mut a = rec("", b"x", BASE);
        a.unique_reg_key = None;
        a.sha256_hash = None;
        let mut b = a.clone();
        b.perceptual_hash = Some(PerceptualHash::from_u64(BASE ^ 1).to_string());

        let q = query(b"q", BASE);
        let registry = vec![a, b];
        let result = Classifier::default().classify(&q, &registry, None);
        let graph = from_verification(&q, &result, &registry, 8).expect("graph");
        assert_eq!(graph.nodes.len(), 3);
        assert!(graph.node("record-0").is_some());
        assert!(graph.node("record-1").is_some());
    }
}
