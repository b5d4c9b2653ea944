//! Allocation-conscious containers backing the scheduler.
//!
//! - [`RingBuffer`]: input-restricted deque (push back, pop either end)
//! - [`SwapRemoveList`]: unordered list with O(1) swap-remove
//!
//! Both keep a power-of-two capacity, grow by doubling and only shrink when
//! their owner calls `vacuum()` under a [`VacuumPolicy`].

pub mod capacity;
mod ring_buffer;
mod swap_list;

pub use capacity::{MAX_CAPACITY, VacuumPolicy, ceil_power_of_two, is_power_of_two};
pub use ring_buffer::RingBuffer;
pub use swap_list::SwapRemoveList;
