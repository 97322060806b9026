use crate::marker::MarkerId;

const WORD_BITS: u32 = u64::BITS;

/// Set of markers from one registry, one bit per `MarkerId::index()`.
///
/// Visible sets, partition halves and layer membership all use this type.
/// Iteration is in ascending index order, which is registry insertion order.
/// Two sets are equal when they hold the same markers, whatever their capacity.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    bits: Vec<u64>,
    len: usize,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty set sized for a registry of `markers` entries.
    pub fn with_capacity(markers: usize) -> Self {
        Self {
            bits: vec![0; markers.div_ceil(WORD_BITS as usize)],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.bits.clear();
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, marker: MarkerId) -> bool {
        let (word, mask) = slot(marker);
        self.bits.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Returns `false` if `marker` was already present.
    pub fn insert(&mut self, marker: MarkerId) -> bool {
        let (word, mask) = slot(marker);
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        if self.bits[word] & mask != 0 {
            return false;
        }
        self.bits[word] |= mask;
        self.len += 1;
        true
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.union_in_place(other);
        out
    }

    pub fn union_in_place(&mut self, other: &Self) {
        if other.bits.len() > self.bits.len() {
            self.bits.resize(other.bits.len(), 0);
        }
        for (mine, theirs) in self.bits.iter_mut().zip(&other.bits) {
            *mine |= theirs;
        }
        self.len = self.bits.iter().map(|w| w.count_ones() as usize).sum();
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.bits.iter().zip(&other.bits).all(|(a, b)| a & b == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.bits.iter().enumerate().flat_map(|(word, &bits)| {
            let base = word as u32 * WORD_BITS;
            let mut rest = bits;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros();
                rest &= rest - 1;
                Some(MarkerId::from_index(base + bit))
            })
        })
    }

    /// Words up to the last non-zero one.
    fn occupied(&self) -> &[u64] {
        let end = self
            .bits
            .iter()
            .rposition(|w| *w != 0)
            .map_or(0, |last| last + 1);
        &self.bits[..end]
    }
}

impl PartialEq for MarkerSet {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.occupied() == other.occupied()
    }
}

impl Eq for MarkerSet {}

impl FromIterator<MarkerId> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = MarkerId>>(iter: I) -> Self {
        let mut out = MarkerSet::new();
        for id in iter {
            out.insert(id);
        }
        out
    }
}

fn slot(marker: MarkerId) -> (usize, u64) {
    let index = marker.index();
    ((index / WORD_BITS) as usize, 1u64 << (index % WORD_BITS))
}

#[cfg(test)]
mod tests {
    use super::MarkerSet;
    use crate::marker::MarkerId;
    use pretty_assertions::assert_eq;

    fn set(indices: &[u32]) -> MarkerSet {
        indices.iter().map(|&i| MarkerId::from_index(i)).collect()
    }

    fn indices(s: &MarkerSet) -> Vec<u32> {
        s.iter().map(|id| id.index()).collect()
    }

    #[test]
    fn insert_is_idempotent() {
        let mut s = MarkerSet::new();
        assert!(s.insert(MarkerId::from_index(3)));
        assert!(!s.insert(MarkerId::from_index(3)));
        assert_eq!(s.len(), 1);
        assert!(s.contains(MarkerId::from_index(3)));
        assert!(!s.contains(MarkerId::from_index(300)));
    }

    #[test]
    fn iterates_in_registry_order_across_words() {
        assert_eq!(indices(&set(&[65, 2, 10, 128, 63])), vec![2, 10, 63, 65, 128]);
    }

    #[test]
    fn equality_ignores_capacity() {
        let mut sized = MarkerSet::with_capacity(200);
        sized.insert(MarkerId::from_index(1));
        assert_eq!(sized, set(&[1]));
        assert_eq!(MarkerSet::with_capacity(500), MarkerSet::new());
        assert_ne!(sized, set(&[1, 130]));
    }

    #[test]
    fn union_and_disjointness() {
        let solo = set(&[0, 4, 70]);
        let cluster = set(&[1, 2, 3]);
        assert!(solo.is_disjoint(&cluster));
        assert!(!solo.is_disjoint(&set(&[70])));

        let all = solo.union(&cluster);
        assert_eq!(indices(&all), vec![0, 1, 2, 3, 4, 70]);
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn clear_empties() {
        let mut s = set(&[5, 99]);
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s, MarkerSet::new());
    }
}
