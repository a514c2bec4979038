use crate::model::Region;
use crate::names::fold_name;
use indexmap::IndexMap;

/// Authoritative per-document region table, addressed by parse index.
///
/// The table never grows or shrinks after construction; only per-region fields
/// change. Operations on an out-of-range index are no-ops.
#[derive(Clone, Debug, Default)]
pub struct RegionStore {
    regions: Vec<Region>,
}

impl RegionStore {
    pub fn new(regions: Vec<Region>) -> RegionStore {
        debug_assert!(regions.iter().enumerate().all(|(i, r)| r.index == i));
        RegionStore { regions }
    }

    pub fn len(&self) -> usize { self.regions.len() }

    pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    pub fn get(&self, index: usize) -> Option<&Region> { self.regions.get(index) }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> { self.regions.iter() }

    pub fn set_label(&mut self, index: usize, value: &str) -> bool {
        match self.regions.get_mut(index) {
            Some(r) => {
                r.label.clear();
                r.label.push_str(value);
                true
            }
            None => {
                tracing::warn!(index, "label edit for unknown region ignored");
                false
            }
        }
    }

    /// Flips exclusion and returns the new state. The label is left alone, so
    /// re-including a region brings back whatever was typed before.
    pub fn toggle_excluded(&mut self, index: usize) -> Option<bool> {
        let r = self.regions.get_mut(index)?;
        r.excluded = !r.excluded;
        tracing::debug!(index, excluded = r.excluded, "toggled exclusion");
        Some(r.excluded)
    }

    /// Sets exclusion outright; false for an unknown index.
    pub fn set_excluded(&mut self, index: usize, excluded: bool) -> bool {
        match self.regions.get_mut(index) {
            Some(r) => {
                r.excluded = excluded;
                true
            }
            None => false,
        }
    }

    /// `original id -> exported id` for every included region that had an id.
    /// A repeated original id keeps its first position and its last label.
    pub fn snapshot_for_export(&self) -> IndexMap<String, String> {
        let mut mapping = IndexMap::new();
        for r in &self.regions {
            if r.excluded || r.original_id.is_empty() {
                continue;
            }
            mapping.insert(r.original_id.clone(), r.exported_id().to_string());
        }
        mapping
    }

    /// First region whose label or original id matches `query`, ignoring case
    /// and Polish diacritics.
    pub fn find(&self, query: &str) -> Option<usize> {
        let wanted = fold_name(query.trim());
        if wanted.is_empty() {
            return None;
        }
        self.regions
            .iter()
            .find(|r| fold_name(&r.label) == wanted || fold_name(&r.original_id) == wanted)
            .map(|r| r.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaintStyle;

    fn store(ids: &[&str]) -> RegionStore {
        RegionStore::new(
            ids.iter()
                .enumerate()
                .map(|(i, id)| Region::new(i, id.to_string(), PaintStyle::default()))
                .collect(),
        )
    }

    #[test]
    fn set_excluded_does_not_flip_back() {
        let mut s = store(&["a", "b"]);
        assert!(s.set_excluded(1, true));
        assert!(s.set_excluded(1, true));
        assert!(s.get(1).unwrap().excluded);
        assert_eq!(s.snapshot_for_export().keys().collect::<Vec<_>>(), ["a"]);
        assert!(!s.set_excluded(2, true));
    }

    #[test]
    fn out_of_range_is_a_noop() {
        let mut s = store(&["a"]);
        assert!(!s.set_label(3, "x"));
        assert_eq!(s.toggle_excluded(3), None);
        assert_eq!(s.get(0).unwrap().label, "a");
    }

    #[test]
    fn toggle_twice_restores_label_and_state() {
        let mut s = store(&["a", "b"]);
        s.set_label(1, "Bravo");
        assert_eq!(s.toggle_excluded(1), Some(true));
        assert_eq!(s.get(1).unwrap().label, "Bravo");
        assert_eq!(s.toggle_excluded(1), Some(false));
        let r = s.get(1).unwrap();
        assert_eq!((r.label.as_str(), r.excluded), ("Bravo", false));
    }

    #[test]
    fn snapshot_skips_excluded_and_anonymous() {
        let mut s = store(&["a", "", "c", "d"]);
        s.set_label(0, "");
        s.set_label(1, "named later");
        s.set_label(3, "Delta");
        s.toggle_excluded(2);
        let m = s.snapshot_for_export();
        let pairs: Vec<_> = m.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(pairs, vec![("a", "a"), ("d", "Delta")]);
    }

    #[test]
    fn duplicate_ids_keep_last_label() {
        let mut s = store(&["x", "y", "x"]);
        s.set_label(0, "first");
        s.set_label(2, "second");
        let m = s.snapshot_for_export();
        assert_eq!(m.get_index(0), Some((&"x".to_string(), &"second".to_string())));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn find_folds_case_and_diacritics() {
        let mut s = store(&["Łódzkie", "slaskie", "opolskie"]);
        s.set_label(1, "Śląskie");
        assert_eq!(s.find("lodzkie"), Some(0));
        assert_eq!(s.find("  ŚLĄSKIE "), Some(1));
        assert_eq!(s.find("slaskie"), Some(1));
        assert_eq!(s.find(""), None);
        assert_eq!(s.find("mazowieckie"), None);
    }
}
