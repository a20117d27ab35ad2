use crate::layout::BatchShape;

/// Read-only view of one logical vector of a batch.
///
/// Element `j` of the view lives at `batch_offset + element_offset(j)` of the shared
/// buffer; nothing is copied.
pub struct BatchView<'a, T> {
    data: &'a [T],
    shape: BatchShape,
    batch_index: usize,
    base: i64,
}

/// Mutable view of one logical vector of a batch.
pub struct BatchViewMut<'a, T> {
    data: &'a mut [T],
    shape: BatchShape,
    batch_index: usize,
    base: i64,
}

// Shared by both views; callers have already checked the shape and batch index.
fn element_position(shape: &BatchShape, base: i64, index: usize) -> Option<usize> {
    let len = shape.vector_len();
    if index >= len {
        return None;
    }
    let offset = base.checked_add(shape.element_offset(index as i64))?;
    usize::try_from(offset).ok()
}

impl<'a, T> BatchView<'a, T> {
    pub(crate) fn new(data: &'a [T], shape: BatchShape, batch_index: usize) -> Self {
        let base = shape.batch_offset(batch_index as i64);
        Self {
            data,
            shape,
            batch_index,
            base,
        }
    }

    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    pub fn len(&self) -> usize {
        self.shape.vector_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of element `index` inside the shared buffer.
    pub fn offset_of(&self, index: usize) -> Option<usize> {
        element_position(&self.shape, self.base, index)
    }

    pub fn get(&self, index: usize) -> Option<&'a T> {
        let data = self.data;
        self.offset_of(index).and_then(|o| data.get(o))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        (0..self.len()).filter_map(move |j| self.get(j))
    }
}

impl<T: Copy> BatchView<'_, T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().copied().collect()
    }
}

impl<'a, T> BatchViewMut<'a, T> {
    pub(crate) fn new(data: &'a mut [T], shape: BatchShape, batch_index: usize) -> Self {
        let base = shape.batch_offset(batch_index as i64);
        Self {
            data,
            shape,
            batch_index,
            base,
        }
    }

    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    pub fn len(&self) -> usize {
        self.shape.vector_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offset_of(&self, index: usize) -> Option<usize> {
        element_position(&self.shape, self.base, index)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.offset_of(index).and_then(|o| self.data.get(o))
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.offset_of(index).and_then(|o| self.data.get_mut(o))
    }

    /// Write `value` at element `index`, returning false when out of range.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn as_view(&self) -> BatchView<'_, T> {
        BatchView::new(&*self.data, self.shape, self.batch_index)
    }
}

impl<T: Copy> BatchViewMut<'_, T> {
    pub fn fill(&mut self, value: T) {
        for j in 0..self.len() {
            self.set(j, value);
        }
    }

    /// Copy `src` into the vector element by element. `src` must hold exactly `len()`
    /// values, otherwise nothing is written.
    pub fn copy_from_slice(&mut self, src: &[T]) -> bool {
        if src.len() != self.len() {
            return false;
        }
        for (j, &value) in src.iter().enumerate() {
            self.set(j, value);
        }
        true
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.as_view().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_follows_negative_inc() {
        let shape = BatchShape::block(3, -1, 3, 2);
        let data: Vec<i32> = (0..6).collect();
        let view = BatchView::new(&data, shape, 1);
        assert_eq!(view.to_vec(), vec![5, 4, 3]);
        assert_eq!(view.offset_of(0), Some(5));
        assert_eq!(view.get(3), None);
    }

    #[test]
    fn interleaved_view_skips_neighbours() {
        let shape = BatchShape::interleave(2, 3, 1, 3);
        let data: Vec<i32> = (0..6).collect();
        let view = BatchView::new(&data, shape, 2);
        assert_eq!(view.to_vec(), vec![2, 5]);
    }

    #[test]
    fn mutable_view_writes_only_its_cells() {
        let shape = BatchShape::block(2, 2, 4, 2);
        let mut data = vec![0u8; 8];
        let mut view = BatchViewMut::new(&mut data, shape, 1);
        view.fill(9);
        assert!(!view.set(2, 1));
        assert_eq!(data, vec![0, 0, 0, 0, 9, 0, 9, 0]);
    }

    #[test]
    fn copy_from_slice_requires_exact_length() {
        let shape = BatchShape::block(3, 1, 3, 1);
        let mut data = vec![0u16; 3];
        let mut view = BatchViewMut::new(&mut data, shape, 0);
        assert!(!view.copy_from_slice(&[1, 2]));
        assert!(view.copy_from_slice(&[1, 2, 3]));
        assert_eq!(view.to_vec(), vec![1, 2, 3]);
    }
}
