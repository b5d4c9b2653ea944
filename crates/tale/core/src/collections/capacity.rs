//! Power-of-two capacity arithmetic and the shared shrink ("vacuum") policy.

/// Returns `true` if `value` is a non-zero power of two.
#[inline]
pub const fn is_power_of_two(value: usize) -> bool {
    value != 0 && value & (value - 1) == 0
}

/// Largest capacity any container will allocate.
pub const MAX_CAPACITY: usize = 1 << 30;

/// Rounds `value` up to the next power of two. Zero rounds up to one, so the
/// result is always usable as a bitmask base. Saturates at [`MAX_CAPACITY`].
#[inline]
pub const fn ceil_power_of_two(value: usize) -> usize {
    if value <= 1 {
        1
    } else if value >= MAX_CAPACITY {
        MAX_CAPACITY
    } else {
        value.next_power_of_two()
    }
}

/// Growth and shrink parameters for one container.
///
/// Both container types grow by doubling whenever a push would exceed the
/// current capacity. Shrinking is never automatic: the owner calls `vacuum()`
/// at safe points (between scenes), and the policy decides whether the
/// backing storage may be halved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VacuumPolicy {
    base_capacity: usize,
    enabled: bool,
    threshold: usize,
    factor: usize,
}

impl VacuumPolicy {
    /// Creates a policy, rounding every parameter to its nearest legal value.
    ///
    /// Callers that want to report corrections validate first (see
    /// [`crate::config::ContainerConfig::sanitized`]).
    pub fn new(base_capacity: usize, enabled: bool, threshold: usize, factor: usize) -> Self {
        let base_capacity = ceil_power_of_two(base_capacity);
        Self {
            base_capacity,
            enabled,
            threshold: ceil_power_of_two(threshold).max(base_capacity),
            factor: factor.max(2),
        }
    }

    /// A policy that never shrinks below `base_capacity` and never vacuums.
    pub fn fixed(base_capacity: usize) -> Self {
        Self::new(base_capacity, false, base_capacity, 2)
    }

    #[inline]
    pub const fn base_capacity(&self) -> usize {
        self.base_capacity
    }

    #[inline]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Capacity at which a container records its high-water mark.
    #[inline]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    #[inline]
    pub const fn factor(&self) -> usize {
        self.factor
    }

    /// Decides whether a container may halve its storage right now.
    ///
    /// Halving requires the high-water mark to have been reached, capacity
    /// above base, and occupancy at most `capacity / factor`. Since the
    /// factor is at least two, the halved capacity always fits `len`.
    pub(crate) fn should_shrink(&self, high_water: bool, capacity: usize, len: usize) -> bool {
        self.enabled
            && high_water
            && capacity > self.base_capacity
            && len <= capacity / self.factor
    }
}

impl Default for VacuumPolicy {
    fn default() -> Self {
        Self::new(64, true, 8192, 4)
    }
}

/// Smallest capacity, starting from `current` and doubling, that fits `required`.
#[inline]
pub(crate) fn grown_capacity(current: usize, required: usize) -> usize {
    let mut capacity = current.max(1);
    while capacity < required {
        capacity *= 2;
    }
    capacity
}
