use super::{post_process, push_or_extend, ArrayPair, EditGroup, Subsequencer};

/// Minimal edit script from the longest common subsequence of the two arrays,
/// using deep equality as the match predicate.
///
/// Quadratic in time and space: the `(m+1) x (n+1)` length table is kept whole
/// for the backtrack.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lcs;

impl Subsequencer for Lcs {
    fn subsequences(&self, pair: &ArrayPair<'_>) -> Vec<EditGroup> {
        let (m, n) = (pair.items_a().len(), pair.items_b().len());
        if m == 0 && n == 0 {
            return Vec::new();
        }

        let width = n + 1;
        let at = |i: usize, j: usize| i * width + j;
        let mut lengths = vec![0usize; (m + 1) * width];
        let mut matches = vec![false; m * n];
        for i in 1..=m {
            for j in 1..=n {
                let same = pair.items_equal(i - 1, j - 1);
                matches[(i - 1) * n + (j - 1)] = same;
                lengths[at(i, j)] = if same {
                    lengths[at(i - 1, j - 1)] + 1
                } else {
                    lengths[at(i, j - 1)].max(lengths[at(i - 1, j)])
                };
            }
        }

        // Walk back from (m, n); operations come out last-first.
        let mut ops = Vec::with_capacity(m + n);
        let (mut i, mut j) = (m, n);
        while i > 0 || j > 0 {
            if i > 0 && j > 0 && matches[(i - 1) * n + (j - 1)] {
                ops.push(EditGroup::equal(i - 1, j - 1));
                i -= 1;
                j -= 1;
            } else if j > 0 && (i == 0 || lengths[at(i, j - 1)] >= lengths[at(i - 1, j)]) {
                ops.push(EditGroup::insert(j - 1));
                j -= 1;
            } else {
                ops.push(EditGroup::delete(i - 1));
                i -= 1;
            }
        }

        let mut groups = Vec::new();
        for op in ops.into_iter().rev() {
            push_or_extend(&mut groups, op);
        }
        post_process(groups)
    }
}
