use bytemuck::Pod;

/// Owned host allocation of `len` elements. No locks, no sharing.
pub struct HostBuffer<T: Pod> {
    data: Box<[T]>,
}

impl<T: Pod> HostBuffer<T> {
    /// Allocate `len` zeroed elements, returning `None` when the allocator refuses the
    /// request or the byte size overflows.
    pub fn try_new(len: usize) -> Option<Self> {
        let mut data = Vec::new();
        if let Err(e) = data.try_reserve_exact(len) {
            tracing::debug!("host allocation of {len} elements failed: {e}");
            return None;
        }
        data.resize(len, T::zeroed());

        Some(Self {
            data: data.into_boxed_slice(),
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn len_bytes(&self) -> usize {
        std::mem::size_of_val(&*self.data)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.data)
    }
}

impl<T: Pod> std::fmt::Debug for HostBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBuffer")
            .field("addr", &self.data.as_ptr())
            .field("len", &self.data.len())
            .finish()
    }
}
