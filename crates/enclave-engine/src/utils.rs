//! Utils

use core::iter::Iterator;

/// An iterator for a bitmap indexes.
pub struct BitmapIterator {
    bitmap: u64,
}

impl BitmapIterator {
    pub fn new(bitmap: u64) -> Self {
        Self { bitmap }
    }
}

impl Iterator for BitmapIterator {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.bitmap.trailing_zeros();

        if idx == 64 {
            // There is only zeroes in the bitmap
            return None;
        }

        // Reset the bit
        self.bitmap ^= 1 << idx;
        Some(idx as usize)
    }
}

/// Returns true if `[a_base, a_base + a_size)` and `[b_base, b_base + b_size)` share a byte.
pub fn ranges_intersect(a_base: usize, a_size: usize, b_base: usize, b_size: usize) -> bool {
    let (a_base, a_end) = (a_base as u128, a_base as u128 + a_size as u128);
    let (b_base, b_end) = (b_base as u128, b_base as u128 + b_size as u128);
    a_base < b_end && b_base < a_end
}

// ————————————————————————————————— Tests —————————————————————————————————— //
