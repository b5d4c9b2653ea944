//! Input-restricted circular deque.
//!
//! Items enter only at the back and leave from either end. Capacity is always
//! a power of two so that logical index `i` maps to the physical slot
//! `(start + i) & (capacity - 1)` without a division.

use std::ops::Index;

use super::capacity::{VacuumPolicy, ceil_power_of_two};

/// Circular buffer with O(1) `push_back`, `pop_front` and `pop_back`.
///
/// Growth doubles the backing storage and re-linearizes it so that the front
/// lands at physical index 0. Shrinking only happens through [`vacuum`],
/// which the owner calls at points where nothing is iterating the buffer.
///
/// [`vacuum`]: RingBuffer::vacuum
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    start: usize,
    end: usize,
    len: usize,
    policy: VacuumPolicy,
    high_water: bool,
}

impl<T> RingBuffer<T> {
    /// Creates a buffer that starts at `base_capacity` (rounded up to a power
    /// of two) and never vacuums.
    pub fn new(base_capacity: usize) -> Self {
        Self::with_policy(VacuumPolicy::fixed(base_capacity))
    }

    /// Creates a buffer governed by the given growth/shrink policy.
    pub fn with_policy(policy: VacuumPolicy) -> Self {
        let capacity = ceil_power_of_two(policy.base_capacity());
        Self {
            slots: vacant(capacity),
            start: 0,
            end: 0,
            len: 0,
            policy,
            high_water: capacity >= policy.threshold() && capacity > policy.base_capacity(),
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

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    fn physical(&self, logical: usize) -> usize {
        (self.start + logical) & self.mask()
    }

    #[inline]
    fn back_index(&self) -> usize {
        (self.end + self.capacity() - 1) & self.mask()
    }

    /// Appends an item, doubling the capacity first if the buffer is full.
    ///
    /// Returns a reference to the stored item so callers can keep configuring it.
    pub fn push_back(&mut self, item: T) -> &mut T {
        if self.len == self.capacity() {
            self.resize(self.capacity() * 2);
        }

        let index = self.end;
        self.end = (self.end + 1) & self.mask();
        self.len += 1;

        self.slots[index].insert(item)
    }

    /// Removes and returns the front item.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty.
    #[track_caller]
    pub fn pop_front(&mut self) -> T {
        assert!(self.len > 0, "pop_front() called on an empty ring buffer");

        let item = take_occupied(&mut self.slots[self.start]);
        self.start = (self.start + 1) & self.mask();
        self.len -= 1;

        item
    }

    /// Removes and returns the back item.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty.
    #[track_caller]
    pub fn pop_back(&mut self) -> T {
        assert!(self.len > 0, "pop_back() called on an empty ring buffer");

        self.end = self.back_index();
        self.len -= 1;

        take_occupied(&mut self.slots[self.end])
    }

    /// # Panics
    ///
    /// Panics if the buffer is empty.
    #[track_caller]
    pub fn front(&self) -> &T {
        assert!(self.len > 0, "front() called on an empty ring buffer");
        occupied(&self.slots[self.start])
    }

    /// # Panics
    ///
    /// Panics if the buffer is empty.
    #[track_caller]
    pub fn front_mut(&mut self) -> &mut T {
        assert!(self.len > 0, "front_mut() called on an empty ring buffer");
        occupied_mut(&mut self.slots[self.start])
    }

    /// Peeks the element right behind the front.
    ///
    /// # Panics
    ///
    /// Panics if the buffer holds fewer than two items.
    #[track_caller]
    pub fn front_next(&self) -> &T {
        assert!(self.len > 1, "front_next() needs at least two items");
        occupied(&self.slots[self.physical(1)])
    }

    /// # Panics
    ///
    /// Panics if the buffer is empty.
    #[track_caller]
    pub fn back(&self) -> &T {
        assert!(self.len > 0, "back() called on an empty ring buffer");
        occupied(&self.slots[self.back_index()])
    }

    /// Front item, or `None` when empty.
    #[inline]
    pub fn front_or_none(&self) -> Option<&T> {
        if self.len == 0 {
            None
        } else {
            self.slots[self.start].as_ref()
        }
    }

    /// Item at logical index `index` (0 is the front).
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[self.physical(index)].as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let physical = self.physical(index);
        self.slots[physical].as_mut()
    }

    /// Pops the back item if `matches` accepts it.
    pub fn try_remove_back_if(&mut self, matches: impl FnOnce(&T) -> bool) -> Option<T> {
        if self.len > 0 && matches(self.back()) {
            Some(self.pop_back())
        } else {
            None
        }
    }

    /// Removes a trailing run of items identified by `keys`.
    ///
    /// `keys` is given in push order (front to back). Matching walks `keys`
    /// from the last one while popping from the tail, so a run that really
    /// was the last `keys.len()` pushes is removed entirely and the buffer is
    /// left exactly as it was before those pushes. A key that does not match
    /// the current back removes nothing and matching continues with the
    /// previous key. The removed items are returned in push order.
    pub fn take_back_run<K>(
        &mut self,
        keys: &[K],
        mut matches: impl FnMut(&T, &K) -> bool,
    ) -> Vec<T> {
        let mut taken = Vec::with_capacity(keys.len());

        for key in keys.iter().rev() {
            if let Some(item) = self.try_remove_back_if(|back| matches(back, key)) {
                taken.push(item);
            }
        }

        taken.reverse();
        taken
    }

    /// Removes the first item matching `pred`, shifting later items forward.
    ///
    /// O(n); order of the remaining items is preserved.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.iter().position(|item| pred(item))?;

        let item = take_occupied(&mut self.slots[self.physical(index)]);
        for logical in index..self.len - 1 {
            let from = self.physical(logical + 1);
            let to = self.physical(logical);
            self.slots[to] = self.slots[from].take();
        }

        self.end = self.back_index();
        self.len -= 1;

        Some(item)
    }

    /// Drops every live item. The backing storage is kept.
    pub fn clear(&mut self) {
        for logical in 0..self.len {
            let physical = self.physical(logical);
            self.slots[physical] = None;
        }

        self.start = 0;
        self.end = 0;
        self.len = 0;
    }

    /// Removes every live item front to back, keeping the storage.
    pub fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.len);
        while self.len > 0 {
            items.push(self.pop_front());
        }
        self.start = 0;
        self.end = 0;
        items
    }

    /// Halves the capacity if the vacuum policy allows it.
    ///
    /// Must only be called while nothing is iterating or ticking the buffer.
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

    /// Iterates front to back.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let (first, second) = self.live_spans();
        self.slots[first.0..first.1]
            .iter()
            .chain(self.slots[second.0..second.1].iter())
            .filter_map(Option::as_ref)
    }

    /// Iterates front to back, mutably.
    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + '_ {
        let (first, second) = self.live_spans();
        let (head, tail) = self.slots.split_at_mut(first.0);
        tail[..first.1 - first.0]
            .iter_mut()
            .chain(head[second.0..second.1].iter_mut())
            .filter_map(Option::as_mut)
    }

    /// Physical `[begin, end)` spans holding the live range: the part from
    /// `start` to the physical end, then the wrapped part from 0.
    fn live_spans(&self) -> ((usize, usize), (usize, usize)) {
        let first_len = self.len.min(self.capacity() - self.start);
        (
            (self.start, self.start + first_len),
            (0, self.len - first_len),
        )
    }

    fn resize(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.len);
        debug_assert!(capacity.is_power_of_two());

        let mut slots = vacant(capacity);
        let (first, second) = self.live_spans();

        // One contiguous move when the live range does not wrap, two otherwise.
        for (to, from) in (first.0..first.1).chain(second.0..second.1).enumerate() {
            slots[to] = self.slots[from].take();
        }

        self.slots = slots;
        self.start = 0;
        self.end = self.len & (capacity - 1);

        if capacity >= self.policy.threshold() && capacity > self.policy.base_capacity() {
            self.high_water = true;
        } else if capacity <= self.policy.base_capacity() {
            self.high_water = false;
        }
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::with_policy(VacuumPolicy::default())
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(item) => item,
            None => panic!(
                "index {index} out of range for ring buffer of length {}",
                self.len
            ),
        }
    }
}

fn vacant<T>(capacity: usize) -> Box<[Option<T>]> {
    std::iter::repeat_with(|| None).take(capacity).collect()
}

#[track_caller]
fn occupied<T>(slot: &Option<T>) -> &T {
    match slot {
        Some(item) => item,
        None => unreachable!("ring buffer slot inside the live range is vacant"),
    }
}

#[track_caller]
fn occupied_mut<T>(slot: &mut Option<T>) -> &mut T {
    match slot {
        Some(item) => item,
        None => unreachable!("ring buffer slot inside the live range is vacant"),
    }
}

#[track_caller]
fn take_occupied<T>(slot: &mut Option<T>) -> T {
    match slot.take() {
        Some(item) => item,
        None => unreachable!("ring buffer slot inside the live range is vacant"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(buffer: &RingBuffer<u32>) -> Vec<u32> {
        buffer.iter().copied().collect()
    }

    #[test]
    fn capacity_rounds_up_and_is_never_zero() {
        assert_eq!(RingBuffer::<u32>::new(0).capacity(), 1);
        assert_eq!(RingBuffer::<u32>::new(5).capacity(), 8);
        assert_eq!(RingBuffer::<u32>::new(8).capacity(), 8);
    }

    #[test]
    fn pushes_then_pops_keep_the_tail_in_order() {
        for total in 0..20u32 {
            for popped in 0..=total {
                let mut buffer = RingBuffer::new(4);
                for value in 0..total {
                    buffer.push_back(value);
                }
                for _ in 0..popped {
                    buffer.pop_front();
                }
                let expected: Vec<u32> = (popped..total).collect();
                assert_eq!(collect(&buffer), expected, "total={total} popped={popped}");
            }
        }
    }

    #[test]
    fn growth_relinearizes_a_wrapped_range() {
        let mut buffer = RingBuffer::new(4);
        for value in 0..4 {
            buffer.push_back(value);
        }
        buffer.pop_front();
        buffer.pop_front();
        buffer.push_back(4);
        buffer.push_back(5);
        // Live range now wraps: physical [4, 5, 2, 3].
        buffer.push_back(6);

        assert_eq!(buffer.capacity(), 8);
        assert_eq!(collect(&buffer), vec![2, 3, 4, 5, 6]);
        assert_eq!(*buffer.front(), 2);
        assert_eq!(*buffer.back(), 6);
    }

    #[test]
    fn peeks() {
        let mut buffer = RingBuffer::new(2);
        assert!(buffer.front_or_none().is_none());

        buffer.push_back(10);
        buffer.push_back(20);
        buffer.push_back(30);

        assert_eq!(*buffer.front(), 10);
        assert_eq!(*buffer.front_next(), 20);
        assert_eq!(*buffer.back(), 30);
        assert_eq!(buffer.front_or_none(), Some(&10));
        assert_eq!(buffer[2], 30);
        assert_eq!(buffer.get(3), None);
    }

    #[test]
    fn pop_back_undoes_push_back() {
        let mut buffer = RingBuffer::new(2);
        buffer.push_back(1);
        buffer.push_back(2);
        assert_eq!(buffer.pop_back(), 2);
        assert_eq!(buffer.pop_back(), 1);
        assert!(buffer.is_empty());
        buffer.push_back(3);
        assert_eq!(collect(&buffer), vec![3]);
    }

    #[test]
    #[should_panic(expected = "empty ring buffer")]
    fn front_of_empty_buffer_panics() {
        let buffer = RingBuffer::<u32>::new(4);
        let _ = buffer.front();
    }

    #[test]
    #[should_panic(expected = "empty ring buffer")]
    fn pop_front_of_empty_buffer_panics() {
        let mut buffer = RingBuffer::<u32>::new(4);
        buffer.pop_front();
    }

    #[test]
    fn try_remove_back_if_only_pops_a_match() {
        let mut buffer = RingBuffer::new(4);
        buffer.push_back(1);
        buffer.push_back(2);

        assert_eq!(buffer.try_remove_back_if(|&back| back == 1), None);
        assert_eq!(buffer.try_remove_back_if(|&back| back == 2), Some(2));
        assert_eq!(collect(&buffer), vec![1]);
    }

    #[test]
    fn take_back_run_restores_the_state_before_the_pushes() {
        let mut buffer = RingBuffer::new(4);
        buffer.push_back(7);
        buffer.push_back(8);
        let before = collect(&buffer);

        buffer.push_back(1);
        buffer.push_back(2);
        buffer.push_back(3);

        let taken = buffer.take_back_run(&[1, 2, 3], |item, key| item == key);

        assert_eq!(taken, vec![1, 2, 3]);
        assert_eq!(collect(&buffer), before);
    }

    #[test]
    fn take_back_run_skips_keys_that_are_not_at_the_tail() {
        let mut buffer = RingBuffer::new(8);
        for value in [1, 2, 3, 4] {
            buffer.push_back(value);
        }

        // 4 is the tail and goes; 9 was never pushed; 2 is not at the tail
        // once 4 is gone (3 is), so it stays.
        let taken = buffer.take_back_run(&[2, 9, 4], |item, key| item == key);

        assert_eq!(taken, vec![4]);
        assert_eq!(collect(&buffer), vec![1, 2, 3]);
    }

    #[test]
    fn take_back_run_in_wrong_order_removes_only_the_tail() {
        let mut buffer = RingBuffer::new(8);
        for value in [1, 2, 3] {
            buffer.push_back(value);
        }

        // Keys are matched last-first: 2 misses the tail (3), then 3 hits it.
        // 2 is left behind because it was supplied after 3.
        let taken = buffer.take_back_run(&[3, 2], |item, key| item == key);

        assert_eq!(taken, vec![3]);
        assert_eq!(collect(&buffer), vec![1, 2]);
    }

    #[test]
    fn remove_where_preserves_order() {
        let mut buffer = RingBuffer::new(4);
        for value in 0..4 {
            buffer.push_back(value);
        }
        buffer.pop_front();
        buffer.push_back(4);

        assert_eq!(buffer.remove_where(|&v| v == 2), Some(2));
        assert_eq!(collect(&buffer), vec![1, 3, 4]);
        assert_eq!(*buffer.back(), 4);
        buffer.push_back(5);
        assert_eq!(collect(&buffer), vec![1, 3, 4, 5]);
        assert_eq!(buffer.remove_where(|&v| v == 42), None);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buffer = RingBuffer::new(2);
        for value in 0..9 {
            buffer.push_back(value);
        }
        let capacity = buffer.capacity();
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), capacity);
        buffer.push_back(1);
        assert_eq!(collect(&buffer), vec![1]);
    }

    #[test]
    fn vacuum_respects_high_water_base_and_len() {
        let policy = VacuumPolicy::new(4, true, 16, 2);
        let mut buffer = RingBuffer::with_policy(policy);

        for value in 0..9 {
            buffer.push_back(value);
        }
        // Capacity 16 reached the high-water mark.
        assert_eq!(buffer.capacity(), 16);
        assert!(!buffer.vacuum(), "9 items exceed capacity / factor");

        for _ in 0..7 {
            buffer.pop_front();
        }
        assert!(buffer.vacuum());
        assert_eq!(buffer.capacity(), 8);
        assert!(buffer.vacuum());
        assert_eq!(buffer.capacity(), 4);
        assert!(!buffer.vacuum(), "never below base capacity");

        assert_eq!(collect(&buffer), vec![7, 8]);
        assert!(buffer.capacity() >= buffer.len());
    }

    #[test]
    fn vacuum_without_high_water_is_a_no_op() {
        let policy = VacuumPolicy::new(4, true, 64, 2);
        let mut buffer = RingBuffer::with_policy(policy);
        for value in 0..9 {
            buffer.push_back(value);
        }
        buffer.clear();

        assert_eq!(buffer.capacity(), 16);
        assert!(!buffer.vacuum());
    }

    #[test]
    fn iter_mut_visits_wrapped_items_in_order() {
        let mut buffer = RingBuffer::new(4);
        for value in 0..4 {
            buffer.push_back(value);
        }
        buffer.pop_front();
        buffer.push_back(4);

        for item in buffer.iter_mut() {
            *item *= 10;
        }
        assert_eq!(collect(&buffer), vec![10, 20, 30, 40]);
    }
}
