//! Unordered list in contiguous memory.
//!
//! Designed for bulk-insert-once, read/remove-many workloads: O(1) read and
//! removal, amortized O(1) insertion. Removal moves the last live element into
//! the vacated slot, so element order changes after every removal.

use std::ops::{Index, IndexMut};

use super::capacity::{VacuumPolicy, ceil_power_of_two, grown_capacity};

/// Contiguous list with O(1) swap-remove.
///
/// Live elements always occupy `[0, len)`. An index is only meaningful until
/// the next removal.
#[derive(Debug)]
pub struct SwapRemoveList<T> {
    slots: Box<[Option<T>]>,
    len: usize,
    policy: VacuumPolicy,
    high_water: bool,
}

impl<T> SwapRemoveList<T> {
    /// Creates a list that starts at `base_capacity` (rounded up to a power
    /// of two) and never vacuums.
    pub fn new(base_capacity: usize) -> Self {
        Self::with_policy(VacuumPolicy::fixed(base_capacity))
    }

    pub fn with_policy(policy: VacuumPolicy) -> Self {
        let capacity = ceil_power_of_two(policy.base_capacity());
        Self {
            slots: vacant(capacity),
            len: 0,
            policy,
            high_water: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn base_capacity(&self) -> usize {
        self.policy.base_capacity()
    }

    #[inline]
    pub fn policy(&self) -> &VacuumPolicy {
        &self.policy
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[index].as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        self.slots[index].as_mut()
    }

    /// Appends one item.
    pub fn push(&mut self, item: T) {
        self.reserve(self.len + 1);
        self.slots[self.len] = Some(item);
        self.len += 1;
    }

    /// Appends every item, growing once up front.
    pub fn insert_many<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        self.reserve(self.len + items.len());

        for item in items {
            self.slots[self.len] = Some(item);
            self.len += 1;
        }
    }

    /// Removes the item at `index`, moving the last live item into its slot.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn remove_at(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "remove_at({index}) out of range for list of length {}",
            self.len
        );

        self.len -= 1;
        let removed = if index == self.len {
            self.slots[index].take()
        } else {
            let last = self.slots[self.len].take();
            std::mem::replace(&mut self.slots[index], last)
        };

        match removed {
            Some(item) => item,
            None => unreachable!("swap-remove list slot inside the live range is vacant"),
        }
    }

    /// Index of the first live element matching `pred`.
    pub fn position(&self, pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.iter().position(pred)
    }

    /// Drops exactly the live range. Capacity is kept.
    pub fn clear(&mut self) {
        for slot in &mut self.slots[..self.len] {
            *slot = None;
        }
        self.len = 0;
    }

    /// Removes every live item, keeping the storage.
    pub fn drain(&mut self) -> Vec<T> {
        let items = self.slots[..self.len]
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        self.len = 0;
        items
    }

    /// Halves the capacity if the vacuum policy allows it.
    ///
    /// Returns `true` if the storage shrank.
    pub fn vacuum(&mut self) -> bool {
        if !self
            .policy
            .should_shrink(self.high_water, self.capacity(), self.len)
        {
            return false;
        }

        self.resize(self.capacity() / 2);
        true
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.slots[..self.len].iter().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + '_ {
        self.slots[..self.len].iter_mut().filter_map(Option::as_mut)
    }

    fn reserve(&mut self, required: usize) {
        let capacity = grown_capacity(self.capacity(), required);
        if capacity > self.capacity() {
            self.resize(capacity);
        }
    }

    fn resize(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.len);

        let mut slots = vacant(capacity);
        for (to, from) in slots.iter_mut().zip(self.slots[..self.len].iter_mut()) {
            *to = from.take();
        }
        self.slots = slots;

        if capacity >= self.policy.threshold() && capacity > self.policy.base_capacity() {
            self.high_water = true;
        } else if capacity <= self.policy.base_capacity() {
            self.high_water = false;
        }
    }
}

impl<T> Default for SwapRemoveList<T> {
    fn default() -> Self {
        Self::with_policy(VacuumPolicy::default())
    }
}

impl<T> Index<usize> for SwapRemoveList<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(item) => item,
            None => panic!(
                "index {index} out of range for list of length {}",
                self.len
            ),
        }
    }
}

impl<T> IndexMut<usize> for SwapRemoveList<T> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("index {index} out of range for list of length {len}"),
        }
    }
}

fn vacant<T>(capacity: usize) -> Box<[Option<T>]> {
    std::iter::repeat_with(|| None).take(capacity).collect()
}
