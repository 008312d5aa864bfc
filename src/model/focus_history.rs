use std::collections::VecDeque;

/// Most-recently-focused-first list of keys.
///
/// Entries are not owned; the `alive` predicate passed to [`front`] decides
/// whether a key still resolves, and dead entries are dropped lazily.
///
/// [`front`]: FocusHistory::front
#[derive(Debug, Clone)]
pub struct FocusHistory<K> {
    entries: VecDeque<K>,
}

impl<K> Default for FocusHistory<K> {
    fn default() -> Self { FocusHistory { entries: VecDeque::new() } }
}

impl<K: Copy + PartialEq> FocusHistory<K> {
    pub fn new() -> Self { Self::default() }

    pub fn move_front(&mut self, item: K) {
        self.remove(item);
        self.entries.push_front(item);
    }

    pub fn remove(&mut self, item: K) { self.entries.retain(|e| *e != item); }

    /// First live entry, pruning every dead entry met on the way.
    pub fn front(&mut self, mut alive: impl FnMut(K) -> bool) -> Option<K> {
        while let Some(&first) = self.entries.front() {
            if alive(first) {
                return Some(first);
            }
            self.entries.pop_front();
        }
        None
    }

    pub fn prune(&mut self, mut alive: impl FnMut(K) -> bool) { self.entries.retain(|e| alive(*e)); }

    pub fn contains(&self, item: K) -> bool { self.entries.contains(&item) }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ { self.entries.iter().copied() }
}
