//! Sorted sets of compact package identifiers.

/// Dense handle of an import path within one [`Index`](super::Index).
pub(crate) type Identifier = u32;

/// A sorted, duplicate-free list of identifiers.
///
/// Postings are kept sorted so that query terms intersect with a linear merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct IdentifierSet(Vec<Identifier>);

impl IdentifierSet {
    pub(crate) fn add(&mut self, id: Identifier) {
        match self.0.last() {
            None => self.0.push(id),
            Some(&last) if id > last => self.0.push(id),
            _ => {
                if let Err(pos) = self.0.binary_search(&id) {
                    self.0.insert(pos, id);
                }
            }
        }
    }

    pub(crate) fn remove(&mut self, id: Identifier) {
        if let Ok(pos) = self.0.binary_search(&id) {
            self.0.remove(pos);
        }
    }

    /// Identifiers present in both sets, in order.
    pub(crate) fn intersect(&self, other: &Self) -> Self {
        let (left, right) = (&self.0, &other.0);
        let mut out = Vec::with_capacity(left.len().min(right.len()));
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            match left[i].cmp(&right[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.push(left[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        Self(out)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Identifier> for IdentifierSet {
    fn from_iter<I: IntoIterator<Item = Identifier>>(iter: I) -> Self {
        let mut ids: Vec<Identifier> = iter.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }
}
