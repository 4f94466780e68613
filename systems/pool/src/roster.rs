/// Values that remember their own position inside a [`Roster`].
pub trait Indexed {
    /// Current position of the value inside its roster.
    fn save_index(&self) -> usize;

    /// Records the value's new position.
    fn set_save_index(&mut self, index: usize);
}

/// Dense collection of live instances with constant-time removal.
///
/// Every member's `save_index` equals its position. Removal swaps the tail
/// into the vacated slot and updates the moved member. Removals requested
/// while iterating are queued with [`Roster::mark_for_removal`] and applied by
/// [`Roster::commit`].
#[derive(Debug)]
pub struct Roster<T> {
    items: Vec<T>,
    pending: Vec<usize>,
}

impl<T> Default for Roster<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pending: Vec::new(),
        }
    }
}

impl<T: Indexed> Roster<T> {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the roster has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends a member and returns its index.
    pub fn push(&mut self, mut item: T) -> usize {
        let index = self.items.len();
        item.set_save_index(index);
        self.items.push(item);
        index
    }

    /// Member stored at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Mutable member stored at `index`.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// Iterator over the members in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Mutable iterator over the members in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    /// Removes the member at `index` immediately, moving the tail into its slot.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.swap_remove(index);
        if let Some(moved) = self.items.get_mut(index) {
            moved.set_save_index(index);
        }
        Some(removed)
    }

    /// Queues the member at `index` for removal on the next commit.
    pub fn mark_for_removal(&mut self, index: usize) {
        if index < self.items.len() && !self.pending.contains(&index) {
            self.pending.push(index);
        }
    }

    /// Applies every queued removal and returns the removed members.
    ///
    /// Indices are processed from the highest down so that a tail member moved
    /// by one removal is never itself pending.
    pub fn commit(&mut self) -> Vec<T> {
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_unstable_by(|a, b| b.cmp(a));
        pending
            .into_iter()
            .filter_map(|index| self.remove(index))
            .collect()
    }
}
