use serde::{Deserialize, Serialize};

/// A 256-bit word split into two 128-bit halves. Stored as `[lo, hi]`.
#[derive(Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, Hash)]
pub struct HiLo<T>([T; 2]);

impl<T> HiLo<T> {
    /// Create a new [HiLo] from a `[lo, hi]` array.
    pub fn from_lo_hi([lo, hi]: [T; 2]) -> Self {
        Self([lo, hi])
    }
    /// Create a new [HiLo] from a `[hi, lo]` array.
    pub fn from_hi_lo([hi, lo]: [T; 2]) -> Self {
        Self([lo, hi])
    }
    pub fn hi(&self) -> T
    where
        T: Copy,
    {
        self.0[1]
    }
    pub fn lo(&self) -> T
    where
        T: Copy,
    {
        self.0[0]
    }
    pub fn hi_lo(&self) -> [T; 2]
    where
        T: Copy,
    {
        [self.hi(), self.lo()]
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for HiLo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HiLo").field(&self.0[1]).field(&self.0[0]).finish()
    }
}
