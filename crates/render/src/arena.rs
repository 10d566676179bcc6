/// Fixed-capacity, index-based storage for one batch of records.
///
/// The backing buffer is allocated once; `len() <= capacity()` always holds.
/// Callers check [`fits`](Self::fits) and flush before pushing.
#[derive(Debug, Clone)]
pub struct VertexArena<T> {
    data: Vec<T>,
    capacity: usize,
}

impl<T: Copy> VertexArena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `count` more records fit without exceeding capacity.
    pub fn fits(&self, count: usize) -> bool {
        self.data.len() + count <= self.capacity
    }

    /// Append all of `records`, or nothing if they would not fit.
    pub fn extend(&mut self, records: &[T]) -> bool {
        if !self.fits(records.len()) {
            return false;
        }
        self.data.extend_from_slice(records);
        true
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_respects_capacity() {
        let mut arena = VertexArena::with_capacity(5);
        assert!(arena.extend(&[1, 2, 3, 4]));
        assert!(!arena.fits(2));
        assert!(!arena.extend(&[5, 6]));
        assert_eq!(arena.len(), 4);
        assert!(arena.extend(&[5]));
        assert_eq!(arena.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut arena = VertexArena::with_capacity(2);
        arena.extend(&[1u32, 2]);
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.capacity(), 2);
        assert!(arena.fits(2));
    }
}
