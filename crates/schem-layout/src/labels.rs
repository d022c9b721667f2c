//! C10 — Label Placer (`spec.md` §4.9).
//!
//! For each cluster (identified by `originalHyperedgeId`, falling back to
//! `net_id` when absent — the net-with-symbol path's edges carry no
//! hyperedge id), finds the longest routed segment across all of the
//! cluster's edges and places one net-name label at its midpoint, offset
//! 10px perpendicular to the segment. Clusters whose longest segment is
//! 50px or shorter get no label (too crowded to read).

use std::collections::BTreeMap;

use schem_core::model::{Label, LabelPurpose, TextAlign};
use schem_core::text::TextMeasurer;

use crate::connectivity::BinaryEdge;
use crate::router::RoutedEdge;

const MIN_LABEL_SEGMENT_LENGTH: f64 = 50.0;
const LABEL_OFFSET: f64 = 10.0;
const LABEL_FONT_SIZE: f64 = 12.0;

/// A net-name label placed on a wire, not owned by any node. `edge_index`
/// is the index (into the caller's `edges`/`routed` slices) of the binary
/// edge whose segment the label sits on — that's the `Edge` the driver
/// attaches `label` to.
#[derive(Debug, Clone, PartialEq)]
pub struct NetLabel {
    pub group_key: String,
    pub edge_index: usize,
    pub label: Label,
}

/// Groups `edges`/`routed` by `originalHyperedgeId` (falling back to
/// `net_id`) and emits one label per group whose longest segment clears
/// the threshold.
pub fn place_labels(
    edges: &[BinaryEdge],
    routed: &[Option<RoutedEdge>],
    measurer: &dyn TextMeasurer,
) -> Vec<NetLabel> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, edge) in edges.iter().enumerate() {
        if routed[index].is_none() {
            continue;
        }
        let key = edge
            .context
            .original_hyperedge_id
            .clone()
            .unwrap_or_else(|| edge.context.net_id.clone());
        groups.entry(key).or_default().push(index);
    }

    let mut labels = Vec::new();
    for (group_key, indices) in groups {
        let mut best: Option<(f64, (f64, f64), bool, usize)> = None;
        for &index in &indices {
            let Some(routed_edge) = &routed[index] else {
                continue;
            };
            for window in routed_edge.polyline.windows(2) {
                let (a, b) = (window[0], window[1]);
                let length = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
                let horizontal = (a.1 - b.1).abs() < 1e-9;
                let midpoint = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
                let better = best.map(|(best_len, ..)| length > best_len).unwrap_or(true);
                if better {
                    best = Some((length, midpoint, horizontal, index));
                }
            }
        }

        let Some((length, midpoint, horizontal, edge_index)) = best else {
            continue;
        };
        if length <= MIN_LABEL_SEGMENT_LENGTH {
            continue;
        }

        let net_name = indices
            .iter()
            .find_map(|&i| edges[i].context.net_name.clone())
            .unwrap_or_else(|| edges[indices[0]].context.net_id.clone());

        let metrics = measurer.measure(&net_name, LABEL_FONT_SIZE);
        let (x, y) = if horizontal {
            (midpoint.0 - metrics.width / 2.0, midpoint.1 - LABEL_OFFSET - metrics.height)
        } else {
            (midpoint.0 + LABEL_OFFSET, midpoint.1 - metrics.height / 2.0)
        };

        labels.push(NetLabel {
            group_key,
            edge_index,
            label: Label {
                text: net_name,
                x: Some(x),
                y: Some(y),
                width: metrics.width,
                height: metrics.height,
                align: TextAlign::Center,
                purpose: LabelPurpose::NetNameOnWire,
            },
        });
    }
    labels
}
