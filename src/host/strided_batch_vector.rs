use bytemuck::Pod;

use crate::device::{DeviceMemory, DeviceStatus, DeviceStridedBatchVector, Memcpy, memcpy};
use crate::layout::{BatchShape, StorageLayout};

use super::buffer::HostBuffer;
use super::view::{BatchView, BatchViewMut};

/// A batch of `batch_count` vectors of length `n` living in one host allocation.
///
/// The buffer is allocated at construction when the shape is valid for its layout and
/// released on drop. A container built from an invalid shape stays unallocated for its
/// whole life; check [`HostStridedBatchVector::is_valid`] before using it.
///
/// The type is deliberately not `Clone`: duplicating data goes through
/// [`HostStridedBatchVector::copy_from`].
pub struct HostStridedBatchVector<T: Pod> {
    shape: BatchShape,
    element_total: usize,
    buffer: Option<HostBuffer<T>>,
}

impl<T: Pod> HostStridedBatchVector<T> {
    pub fn new(n: i64, inc: i64, stride: i64, batch_count: i64, layout: StorageLayout) -> Self {
        Self::with_shape(BatchShape::new(n, inc, stride, batch_count, layout))
    }

    /// Build a block-layout container.
    pub fn block(n: i64, inc: i64, stride: i64, batch_count: i64) -> Self {
        Self::with_shape(BatchShape::block(n, inc, stride, batch_count))
    }

    pub fn interleave(n: i64, inc: i64, stride: i64, batch_count: i64) -> Self {
        Self::with_shape(BatchShape::interleave(n, inc, stride, batch_count))
    }

    pub fn with_shape(shape: BatchShape) -> Self {
        let element_total = shape.element_total();
        let buffer = if shape.is_valid() {
            HostBuffer::try_new(element_total)
        } else {
            tracing::debug!("host batch vector left unallocated for invalid shape {shape:?}");
            None
        };

        Self {
            shape,
            element_total,
            buffer,
        }
    }

    /// Build from a textual layout tag. Unrecognized tags give an unallocated container
    /// with an element total of zero.
    pub fn from_layout_tag(n: i64, inc: i64, stride: i64, batch_count: i64, tag: &str) -> Self {
        match tag.parse::<StorageLayout>() {
            Ok(layout) => Self::new(n, inc, stride, batch_count, layout),
            Err(e) => {
                tracing::debug!("{e}");
                Self {
                    shape: BatchShape::new(n, inc, stride, batch_count, StorageLayout::default()),
                    element_total: 0,
                    buffer: None,
                }
            }
        }
    }

    pub fn shape(&self) -> &BatchShape {
        &self.shape
    }

    pub fn n(&self) -> i64 {
        self.shape.n()
    }

    pub fn inc(&self) -> i64 {
        self.shape.inc()
    }

    pub fn stride(&self) -> i64 {
        self.shape.stride()
    }

    pub fn batch_count(&self) -> i64 {
        self.shape.batch_count()
    }

    pub fn layout(&self) -> StorageLayout {
        self.shape.layout()
    }

    pub fn element_total(&self) -> usize {
        self.element_total
    }

    /// Whether the container owns a buffer.
    pub fn is_valid(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn memcheck(&self) -> DeviceStatus {
        if self.is_valid() {
            DeviceStatus::Success
        } else {
            DeviceStatus::OutOfMemory
        }
    }

    pub fn data(&self) -> Option<&[T]> {
        self.buffer.as_ref().map(|b| b.as_slice())
    }

    pub fn data_mut(&mut self) -> Option<&mut [T]> {
        self.buffer.as_mut().map(|b| b.as_mut_slice())
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.buffer.as_ref().map(|b| b.as_bytes())
    }

    pub fn as_bytes_mut(&mut self) -> Option<&mut [u8]> {
        self.buffer.as_mut().map(|b| b.as_bytes_mut())
    }

    /// Base pointer of the buffer, null when unallocated.
    pub fn as_ptr(&self) -> *const T {
        self.data().map_or(std::ptr::null(), |d| d.as_ptr())
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data_mut()
            .map_or(std::ptr::null_mut(), |d| d.as_mut_ptr())
    }

    /// Pointer to the first element of vector `batch_index`.
    ///
    /// `batch_index` is not range checked: the pointer is computed with wrapping
    /// arithmetic and is only dereferenceable for indices in `[0, batch_count)`.
    /// Returns null when unallocated.
    pub fn batch_ptr(&self, batch_index: i64) -> *const T {
        let base = self.as_ptr();
        if base.is_null() {
            return base;
        }
        base.wrapping_offset(self.shape.batch_offset(batch_index) as isize)
    }

    pub fn batch_ptr_mut(&mut self, batch_index: i64) -> *mut T {
        let offset = self.shape.batch_offset(batch_index) as isize;
        let base = self.as_mut_ptr();
        if base.is_null() {
            return base;
        }
        base.wrapping_offset(offset)
    }

    /// Pointer to the first vector of the batch.
    pub fn first_ptr(&self) -> *const T {
        self.batch_ptr(0)
    }

    pub fn first_ptr_mut(&mut self) -> *mut T {
        self.batch_ptr_mut(0)
    }

    fn batch_in_range(&self, batch_index: usize) -> bool {
        i64::try_from(batch_index).is_ok_and(|b| b < self.shape.batch_count())
    }

    /// Checked view of vector `batch_index`.
    pub fn batch(&self, batch_index: usize) -> Option<BatchView<'_, T>> {
        if !self.batch_in_range(batch_index) {
            return None;
        }
        let shape = self.shape;
        self.data()
            .map(|data| BatchView::new(data, shape, batch_index))
    }

    pub fn batch_mut(&mut self, batch_index: usize) -> Option<BatchViewMut<'_, T>> {
        if !self.batch_in_range(batch_index) {
            return None;
        }
        let shape = self.shape;
        self.data_mut()
            .map(|data| BatchViewMut::new(data, shape, batch_index))
    }

    /// Element `index` of vector `batch_index`.
    pub fn get(&self, batch_index: usize, index: usize) -> Option<&T> {
        let offset = self.shape.checked_offset(batch_index, index)?;
        self.data()?.get(offset)
    }

    pub fn get_mut(&mut self, batch_index: usize, index: usize) -> Option<&mut T> {
        let offset = self.shape.checked_offset(batch_index, index)?;
        self.data_mut()?.get_mut(offset)
    }

    /// Write `f(batch_index, index)` into every logical element. Slots outside the
    /// logical vectors keep their contents. Returns false when unallocated.
    pub fn fill_with<F>(&mut self, mut f: F) -> bool
    where
        F: FnMut(usize, usize) -> T,
    {
        let shape = self.shape;
        let Some(data) = self.data_mut() else {
            return false;
        };

        for b in 0..shape.batches() {
            for j in 0..shape.vector_len() {
                if let Some(offset) = shape.checked_offset(b, j) {
                    data[offset] = f(b, j);
                }
            }
        }
        true
    }

    /// Copy the whole buffer of `that` into this container.
    ///
    /// Both containers must be allocated and agree on length, increment, stride, batch
    /// count and element total; otherwise nothing is copied and false is returned.
    pub fn copy_from(&mut self, that: &HostStridedBatchVector<T>) -> bool {
        if !self.shape.same_geometry(&that.shape) || self.element_total != that.element_total {
            return false;
        }

        match (self.data_mut(), that.data()) {
            (Some(dst), Some(src)) => {
                dst.copy_from_slice(src);
                true
            }
            _ => false,
        }
    }

    /// Download `element_total * size_of::<T>()` bytes from a device vector.
    pub fn transfer_from<M: DeviceMemory>(
        &mut self,
        that: &DeviceStridedBatchVector<T, M>,
    ) -> DeviceStatus {
        let (Some(dst), Some(src)) = (
            self.buffer.as_mut().map(|b| b.as_bytes_mut()),
            that.memory(),
        ) else {
            return DeviceStatus::OutOfMemory;
        };

        let byte_count = dst.len();
        memcpy(Memcpy::DeviceToHost { dst, src }, byte_count)
    }

    /// Upload this buffer into a device vector.
    pub fn transfer_to<M: DeviceMemory>(
        &self,
        that: &mut DeviceStridedBatchVector<T, M>,
    ) -> DeviceStatus {
        that.transfer_from(self)
    }
}

impl<T: Pod> std::fmt::Debug for HostStridedBatchVector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostStridedBatchVector")
            .field("shape", &self.shape)
            .field("element_total", &self.element_total)
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_example_is_valid() {
        let hvec = HostStridedBatchVector::<f32>::block(4, 1, 4, 3);
        assert!(hvec.is_valid());
        assert_eq!(hvec.element_total(), 12);
        assert_eq!(hvec.data().unwrap().len(), 12);
        assert_eq!(hvec.memcheck(), DeviceStatus::Success);

        let base = hvec.as_ptr();
        assert_eq!(hvec.batch_ptr(0), base);
        assert_eq!(hvec.batch_ptr(1), base.wrapping_add(4));
        assert_eq!(hvec.batch_ptr(2), base.wrapping_add(8));
        assert_eq!(hvec.first_ptr(), base);
    }

    #[test]
    fn interleave_example_is_valid() {
        let hvec = HostStridedBatchVector::<f64>::interleave(4, 3, 1, 3);
        assert!(hvec.is_valid());
        assert_eq!(hvec.element_total(), 12);
    }

    #[test]
    fn block_with_negative_length_allocates_stride_slots() {
        let mut hvec = HostStridedBatchVector::<f32>::block(-1, 1, 4, 3);
        assert!(hvec.is_valid());
        assert_eq!(hvec.element_total(), 12);
        assert_eq!(hvec.data().map(<[f32]>::len), Some(12));
        assert_eq!(hvec.batch(0).map(|view| view.len()), Some(0));
        assert!(hvec.fill_with(|_, _| 1.0));
        assert!(hvec.data().unwrap().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn overlapping_block_is_null() {
        let mut hvec = HostStridedBatchVector::<f32>::block(4, 1, 2, 3);
        assert!(!hvec.is_valid());
        assert!(hvec.data().is_none());
        assert!(hvec.as_ptr().is_null());
        assert!(hvec.as_mut_ptr().is_null());
        assert!(hvec.first_ptr().is_null());
        assert_eq!(hvec.memcheck(), DeviceStatus::OutOfMemory);
        assert!(hvec.batch(0).is_none());
        assert!(!hvec.fill_with(|_, _| 1.0));

        // shape accessors still report the requested values
        assert_eq!(hvec.n(), 4);
        assert_eq!(hvec.inc(), 1);
        assert_eq!(hvec.stride(), 2);
        assert_eq!(hvec.batch_count(), 3);
        assert_eq!(hvec.layout(), StorageLayout::Block);
    }

    #[test]
    fn unknown_layout_tag_is_null() {
        let hvec = HostStridedBatchVector::<u8>::from_layout_tag(4, 1, 4, 3, "diagonal");
        assert!(!hvec.is_valid());
        assert_eq!(hvec.element_total(), 0);

        let hvec = HostStridedBatchVector::<u8>::from_layout_tag(4, 3, 1, 3, "interleaved");
        assert!(hvec.is_valid());
        assert_eq!(hvec.layout(), StorageLayout::Interleave);
    }

    #[test]
    fn negative_stride_puts_last_batch_lowest() {
        let hvec = HostStridedBatchVector::<i32>::block(3, 1, -4, 3);
        assert!(hvec.is_valid());
        let base = hvec.as_ptr();
        assert_eq!(hvec.batch_ptr(2), base);
        assert_eq!(hvec.batch_ptr(1), base.wrapping_add(4));
        assert_eq!(hvec.batch_ptr(0), base.wrapping_add(8));
    }

    #[test]
    fn raw_pointers_and_views_agree() {
        let mut hvec = HostStridedBatchVector::<i32>::block(3, 1, 5, 2);
        assert!(hvec.fill_with(|b, j| (10 * b + j) as i32));

        let p = hvec.batch_ptr(1);
        // SAFETY: batch 1 is in range and its three elements are contiguous.
        let raw = unsafe { std::slice::from_raw_parts(p, 3) };
        assert_eq!(raw, &[10, 11, 12]);
        assert_eq!(hvec.batch(1).unwrap().to_vec(), vec![10, 11, 12]);
    }

    #[test]
    fn get_and_get_mut_are_range_checked() {
        let mut hvec = HostStridedBatchVector::<u16>::block(2, 1, 2, 2);
        *hvec.get_mut(1, 1).unwrap() = 7;
        assert_eq!(hvec.get(1, 1), Some(&7));
        assert_eq!(hvec.get(2, 0), None);
        assert_eq!(hvec.get(0, 2), None);
        assert!(hvec.batch_mut(2).is_none());
    }

    #[test]
    fn copy_from_requires_matching_shape() {
        let mut src = HostStridedBatchVector::<f32>::block(4, 1, 4, 3);
        src.fill_with(|b, j| (b * 4 + j) as f32);

        let mut dst = HostStridedBatchVector::<f32>::block(4, 1, 4, 3);
        assert!(dst.copy_from(&src));
        assert_eq!(dst.data(), src.data());

        let mut other = HostStridedBatchVector::<f32>::block(4, 1, 5, 3);
        assert!(!other.copy_from(&src));
        assert!(other.data().unwrap().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn copy_from_null_fails() {
        let null = HostStridedBatchVector::<f32>::block(4, 1, 2, 3);
        let mut also_null = HostStridedBatchVector::<f32>::block(4, 1, 2, 3);
        assert!(!also_null.copy_from(&null));
    }
}
