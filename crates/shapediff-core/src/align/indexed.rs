use super::{post_process, push_mismatch, push_or_extend, ArrayPair, EditGroup, Span, Subsequencer};

/// Compares items at the same position.
///
/// Arrays of different lengths are not aligned item by item: the whole of the
/// first array is deleted and the whole of the second inserted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Indexed;

impl Subsequencer for Indexed {
    fn subsequences(&self, pair: &ArrayPair<'_>) -> Vec<EditGroup> {
        let (len_a, len_b) = (pair.items_a().len(), pair.items_b().len());
        let mut groups = Vec::new();

        if len_a != len_b {
            if len_a > 0 {
                groups.push(EditGroup::Delete {
                    a: Span::new(0, len_a - 1),
                });
            }
            if len_b > 0 {
                groups.push(EditGroup::Insert {
                    b: Span::new(0, len_b - 1),
                });
            }
            return post_process(groups);
        }

        for i in 0..len_a {
            if pair.items_equal(i, i) || pair.within_tolerance(i, i) {
                push_or_extend(&mut groups, EditGroup::equal(i, i));
            } else {
                push_mismatch(&mut groups, i, i);
            }
        }
        post_process(groups)
    }
}
