use crate::boxes::BoundingBox;

/// A scored box prior to suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// The decoded box in normalized corner form.
    pub bbox: BoundingBox,
    /// Normalized confidence of the candidate, in `[0, 1]`.
    pub score: f32,
    /// Index of the candidate's class in the model's class table.
    pub class_index: usize,
    /// Index of the anchor the candidate was decoded from. Ties on equal
    /// scores are broken by this index so the output order is deterministic.
    pub anchor_index: usize,
}

/// Greedy non-max suppression over the candidates of a single class.
///
/// Candidates are ordered by score descending, then the best remaining one is
/// kept and every remaining candidate whose IoU with it exceeds
/// `iou_threshold` is dropped. An empty input yields an empty output; a
/// single candidate always survives.
///
/// # Arguments
///
/// * `candidates` - Unordered candidates of one class.
/// * `iou_threshold` - Overlap above which the lower-scoring box is dropped.
///
/// # Returns
///
/// The surviving candidates, score descending.
pub fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    sort_by_score(&mut candidates);

    let mut keep = Vec::new();
    let mut suppressed = vec![false; candidates.len()];

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        let best = candidates[i];
        keep.push(best);

        for j in (i + 1)..candidates.len() {
            if !suppressed[j] && best.bbox.iou(&candidates[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Orders candidates by score descending, anchor index ascending on ties.
pub(crate) fn sort_by_score(candidates: &mut [Candidate]) {
    candidates.sort_unstable_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.anchor_index.cmp(&b.anchor_index))
    });
}
