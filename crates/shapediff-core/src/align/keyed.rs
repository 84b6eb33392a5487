use super::{post_process, push_mismatch, push_or_extend, ArrayPair, EditGroup, Lcs, Subsequencer};
use crate::tree::{NodeId, Tree};
use indexmap::IndexMap;

/// Joins object items on the text of a key property.
///
/// Rows are visited in the first array's order, followed by the keys found
/// only in the second array in that array's order. Items that share a key but
/// differ become a `Delete`+`Insert` pair, which post-processing may turn into
/// a `Replace`.
///
/// Arrays that cannot be keyed (an item is not an object, lacks the key, has a
/// non-scalar key, or repeats a key) are aligned with [`Lcs`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyed {
    key: String,
}

impl Keyed {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key text to item index, in array order.
    fn index(&self, tree: &Tree, items: &[NodeId]) -> Result<IndexMap<String, usize>, &'static str> {
        let mut keys = IndexMap::with_capacity(items.len());
        for (i, &item) in items.iter().enumerate() {
            let value = tree.get(item, &self.key).ok_or("item is not an object with the key property")?;
            let scalar = tree.scalar(value).ok_or("key value is not a scalar")?;
            if keys.insert(scalar.to_string(), i).is_some() {
                return Err("duplicate key");
            }
        }
        Ok(keys)
    }
}

impl Subsequencer for Keyed {
    fn subsequences(&self, pair: &ArrayPair<'_>) -> Vec<EditGroup> {
        let keyed = self
            .index(pair.tree_a(), pair.items_a())
            .and_then(|a| Ok((a, self.index(pair.tree_b(), pair.items_b())?)));
        let (keys_a, keys_b) = match keyed {
            Ok(keys) => keys,
            Err(reason) => {
                tracing::warn!(key = %self.key, reason, "cannot align array by key, using longest common subsequence");
                return Lcs.subsequences(pair);
            }
        };

        let mut groups = Vec::new();
        for (key, &i) in &keys_a {
            match keys_b.get(key) {
                None => push_or_extend(&mut groups, EditGroup::delete(i)),
                Some(&j) if pair.items_equal(i, j) => push_or_extend(&mut groups, EditGroup::equal(i, j)),
                Some(&j) => push_mismatch(&mut groups, i, j),
            }
        }
        for (key, &j) in &keys_b {
            if keys_a.contains_key(key) {
                continue;
            }
            // The insert half of a changed row must keep the length of its delete.
            let after_pair = matches!(
                groups.as_slice(),
                [.., EditGroup::Delete { .. }, EditGroup::Insert { .. }]
            );
            if after_pair {
                groups.push(EditGroup::insert(j));
            } else {
                push_or_extend(&mut groups, EditGroup::insert(j));
            }
        }
        post_process(groups)
    }
}
