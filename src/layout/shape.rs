use super::storage::StorageLayout;

/// Shape of a strided batch of vectors.
///
/// ```text
/// block, n = 3, inc = 1, stride = 4, batch_count = 3
///
///   offset   0  1  2  3  4  5  6  7  8  9 10 11
///           a0 a1 a2 .. b0 b1 b2 .. c0 c1 c2 ..
///
/// interleave, n = 3, inc = 3, stride = 1, batch_count = 3
///
///   offset   0  1  2  3  4  5  6  7  8
///           a0 b0 c0 a1 b1 c1 a2 b2 c2
/// ```
///
/// A negative stride re-anchors the batch so that the last vector sits at the lowest
/// address. A negative increment re-anchors a vector so that its last element sits at
/// the lowest address of the vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BatchShape {
    n: i64,
    inc: i64,
    stride: i64,
    batch_count: i64,
    layout: StorageLayout,
}

impl BatchShape {
    pub fn new(n: i64, inc: i64, stride: i64, batch_count: i64, layout: StorageLayout) -> Self {
        Self {
            n,
            inc,
            stride,
            batch_count,
            layout,
        }
    }

    pub fn block(n: i64, inc: i64, stride: i64, batch_count: i64) -> Self {
        Self::new(n, inc, stride, batch_count, StorageLayout::Block)
    }

    pub fn interleave(n: i64, inc: i64, stride: i64, batch_count: i64) -> Self {
        Self::new(n, inc, stride, batch_count, StorageLayout::Interleave)
    }

    pub fn n(&self) -> i64 {
        self.n
    }

    pub fn inc(&self) -> i64 {
        self.inc
    }

    pub fn stride(&self) -> i64 {
        self.stride
    }

    pub fn batch_count(&self) -> i64 {
        self.batch_count
    }

    pub fn layout(&self) -> StorageLayout {
        self.layout
    }

    /// Number of `T` slots a buffer for this shape holds.
    ///
    /// Block buffers depend only on stride and batch count, interleaved ones only on
    /// length and increment. Returns 0 when the factor that counts is negative or the
    /// product overflows.
    pub fn element_total(&self) -> usize {
        let total = match self.layout {
            StorageLayout::Block => u64::try_from(self.batch_count)
                .ok()
                .and_then(|batch_count| self.stride.unsigned_abs().checked_mul(batch_count)),
            StorageLayout::Interleave => u64::try_from(self.n)
                .ok()
                .and_then(|n| n.checked_mul(self.inc.unsigned_abs())),
        };

        total
            .and_then(|t| usize::try_from(t).ok())
            .unwrap_or(0)
    }

    /// Whether a buffer may be allocated for this shape without the vectors overlapping.
    pub fn is_valid(&self) -> bool {
        if self.element_total() == 0 {
            return false;
        }

        let abs_inc = self.inc.unsigned_abs() as i128;
        let abs_stride = self.stride.unsigned_abs() as i128;

        match self.layout {
            StorageLayout::Block => abs_stride >= self.n as i128 * abs_inc,
            StorageLayout::Interleave => abs_inc >= abs_stride * self.batch_count as i128,
        }
    }

    /// Number of addressable elements per vector; negative lengths address none.
    pub fn vector_len(&self) -> usize {
        usize::try_from(self.n).unwrap_or(0)
    }

    /// Number of addressable vectors; negative batch counts address none.
    pub fn batches(&self) -> usize {
        usize::try_from(self.batch_count).unwrap_or(0)
    }

    /// Offset of the first element of vector `batch_index`. Not range checked.
    pub fn batch_offset(&self, batch_index: i64) -> i64 {
        if self.stride >= 0 {
            self.stride.wrapping_mul(batch_index)
        } else {
            batch_index
                .wrapping_add(1)
                .wrapping_sub(self.batch_count)
                .wrapping_mul(self.stride)
        }
    }

    /// Offset of element `index` relative to the first element of its vector.
    /// Not range checked.
    pub fn element_offset(&self, index: i64) -> i64 {
        if self.inc >= 0 {
            self.inc.wrapping_mul(index)
        } else {
            self.n
                .wrapping_sub(1)
                .wrapping_sub(index)
                .wrapping_mul(self.inc.wrapping_neg())
        }
    }

    /// Offset of element `index` of vector `batch_index`. Not range checked.
    pub fn offset(&self, batch_index: i64, index: i64) -> i64 {
        self.batch_offset(batch_index)
            .wrapping_add(self.element_offset(index))
    }

    /// Range-checked variant of [`BatchShape::offset`].
    ///
    /// Returns `None` for invalid shapes and for indices outside `[0, batch_count)` and
    /// `[0, n)`.
    pub fn checked_offset(&self, batch_index: usize, index: usize) -> Option<usize> {
        if !self.is_valid() {
            return None;
        }

        let batch_index = i64::try_from(batch_index).ok()?;
        let index = i64::try_from(index).ok()?;
        if batch_index >= self.batch_count || index >= self.n {
            return None;
        }

        let offset = usize::try_from(self.offset(batch_index, index)).ok()?;
        debug_assert!(offset < self.element_total());
        Some(offset)
    }

    /// Whether `other` has the same length, increment, stride and batch count.
    pub fn same_geometry(&self, other: &Self) -> bool {
        self.n == other.n
            && self.inc == other.inc
            && self.stride == other.stride
            && self.batch_count == other.batch_count
    }
}
