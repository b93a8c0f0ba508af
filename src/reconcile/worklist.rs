use std::collections::{BTreeMap, HashSet};

/// Addresses awaiting classification.
///
/// Extraction order is unspecified. Once an address has been popped it is
/// never accepted again, which also bounds redirect cycles.
#[derive(Debug, Default)]
pub struct Worklist {
    /// address -> redirect hops taken to reach it
    pending: BTreeMap<String, usize>,
    seen: HashSet<String>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `address` reached after `hops` redirects. Returns false when it
    /// is already pending or was already evaluated.
    pub fn push(&mut self, address: String, hops: usize) -> bool {
        if self.seen.contains(&address) || self.pending.contains_key(&address) {
            return false;
        }
        self.pending.insert(address, hops);
        true
    }

    /// Remove and return any pending address with its hop count.
    pub fn pop_any(&mut self) -> Option<(String, usize)> {
        let (address, hops) = self.pending.pop_first()?;
        self.seen.insert(address.clone());
        Some((address, hops))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl FromIterator<String> for Worklist {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut worklist = Self::new();
        for address in iter {
            worklist.push(address, 0);
        }
        worklist
    }
}
