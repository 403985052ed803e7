//! Deterministic node placement for lineage graphs.
//!
//! The query sits on the left and the anchor in the middle. Duplicates and
//! declared ancestors fan out around the anchor on half circles, and the
//! remaining nodes stack in a column on the right. Anything that still
//! has no position goes on a fallback circle, so no node is ever dropped.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::graph::NodeKind;

/// Drawing area the coordinates refer to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 360.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

const DUPLICATE_RADIUS: f64 = 80.0;
const DECLARED_RADIUS: f64 = 110.0;
const FALLBACK_RADIUS: f64 = 100.0;
/// Column slots on the right; overflow goes to the fallback circle.
pub const MAX_COLUMN_NODES: usize = 8;

/// Computes one position per entry of `kinds`.
///
/// `query` and `anchor` are indices into `kinds` and must differ.
pub fn assign(kinds: &[NodeKind], query: usize, anchor: usize, canvas: Canvas) -> Vec<Position> {
    let (w, h) = (canvas.width, canvas.height);
    let mut placed: Vec<Option<Position>> = vec![None; kinds.len()];

    placed[query] = Some(Position { x: w * 0.18, y: h / 2.0 });
    let anchor_pos = Position { x: w * 0.48, y: h / 2.0 };
    placed[anchor] = Some(anchor_pos);

    let len = kinds.len();
    let others = move || (0..len).filter(move |&i| i != query && i != anchor);
    let duplicates: Vec<usize> = others().filter(|&i| kinds[i] == NodeKind::Duplicate).collect();
    let declared: Vec<usize> = others().filter(|&i| kinds[i] == NodeKind::Declared).collect();
    let remaining: Vec<usize> = others()
        .filter(|&i| !matches!(kinds[i], NodeKind::Duplicate | NodeKind::Declared))
        .collect();

    half_circle(&mut placed, &duplicates, anchor_pos, DUPLICATE_RADIUS, PI * 0.25);
    half_circle(&mut placed, &declared, anchor_pos, DECLARED_RADIUS, -PI * 0.75);

    let column = &remaining[..remaining.len().min(MAX_COLUMN_NODES)];
    let gap = h / (column.len() + 1) as f64;
    for (row, &i) in column.iter().enumerate() {
        placed[i] = Some(Position {
            x: w * 0.78,
            y: gap * (row + 1) as f64,
        });
    }

    let n = kinds.len() as f64;
    placed
        .into_iter()
        .enumerate()
        .map(|(i, pos)| {
            pos.unwrap_or_else(|| {
                let angle = i as f64 / n * 2.0 * PI;
                Position {
                    x: w * 0.6 + FALLBACK_RADIUS * angle.cos(),
                    y: h * 0.5 + FALLBACK_RADIUS * angle.sin(),
                }
            })
        })
        .collect()
}

fn half_circle(
    placed: &mut [Option<Position>],
    nodes: &[usize],
    center: Position,
    radius: f64,
    start_angle: f64,
) {
    let count = nodes.len().max(1) as f64;
    for (k, &i) in nodes.iter().enumerate() {
        let angle = start_angle + k as f64 / count * PI;
        placed[i] = Some(Position {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Position, x: f64, y: f64) -> bool {
        (a.x - x).abs() < 1e-9 && (a.y - y).abs() < 1e-9
    }

    #[test]
    fn query_and_anchor_have_fixed_slots() {
        let kinds = [NodeKind::Query, NodeKind::Anchor];
        let pos = assign(&kinds, 0, 1, Canvas::default());
        assert!(close(pos[0], 640.0 * 0.18, 180.0));
        assert!(close(pos[1], 640.0 * 0.48, 180.0));
    }

    #[test]
    fn duplicates_orbit_the_anchor() {
        let kinds = [NodeKind::Query, NodeKind::Anchor, NodeKind::Duplicate, NodeKind::Duplicate];
        let pos = assign(&kinds, 0, 1, Canvas::default());
        for p in &pos[2..] {
            let d = ((p.x - pos[1].x).powi(2) + (p.y - pos[1].y).powi(2)).sqrt();
            assert!((d - DUPLICATE_RADIUS).abs() < 1e-9);
        }
        assert_ne!(pos[2], pos[3]);
    }

    #[test]
    fn column_overflow_uses_the_fallback_circle() {
        let mut kinds = vec![NodeKind::Query, NodeKind::Anchor];
        kinds.extend(std::iter::repeat_n(NodeKind::Neighbor, MAX_COLUMN_NODES + 2));
        let canvas = Canvas::default();
        let pos = assign(&kinds, 0, 1, canvas);

        assert_eq!(pos.len(), kinds.len());
        assert!(pos[2..2 + MAX_COLUMN_NODES].iter().all(|p| (p.x - 640.0 * 0.78).abs() < 1e-9));
        for p in &pos[2 + MAX_COLUMN_NODES..] {
            let d = ((p.x - 384.0).powi(2) + (p.y - 180.0).powi(2)).sqrt();
            assert!((d - FALLBACK_RADIUS).abs() < 1e-9);
        }
        // Deterministic.
        assert_eq!(pos, assign(&kinds, 0, 1, canvas));
    }
}
