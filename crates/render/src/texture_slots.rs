use tessera_common::{Texture, TextureId};

/// Per-batch table of bound textures.
///
/// Slot 0 permanently holds the white texture. A texture already bound in
/// the current batch is found by identity and reuses its slot.
#[derive(Debug, Clone)]
pub struct TextureSlots {
    slots: Vec<Texture>,
    capacity: usize,
}

impl TextureSlots {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.push(Texture::WHITE);
        Self {
            slots,
            capacity: capacity.max(1),
        }
    }

    /// Slot already holding `id`. The white texture is always slot 0.
    pub fn find(&self, id: TextureId) -> Option<u32> {
        if id == TextureId::WHITE {
            return Some(0);
        }
        self.slots
            .iter()
            .skip(1)
            .position(|t| t.id == id)
            .map(|i| i as u32 + 1)
    }

    /// Bind `texture` to the next free slot. `None` when the table is full.
    pub fn push(&mut self, texture: Texture) -> Option<u32> {
        if self.is_full() {
            return None;
        }
        self.slots.push(texture);
        Some(self.slots.len() as u32 - 1)
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Number of occupied slots, including the white texture.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[Texture] {
        &self.slots
    }

    /// Drop everything except the white texture.
    pub fn reset(&mut self) {
        self.slots.truncate(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex(id: u64) -> Texture {
        Texture::new(TextureId(id), 16, 16)
    }

    #[test]
    fn white_is_slot_zero() {
        let slots = TextureSlots::new(4);
        assert_eq!(slots.find(TextureId::WHITE), Some(0));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn push_and_find() {
        let mut slots = TextureSlots::new(4);
        assert_eq!(slots.push(tex(10)), Some(1));
        assert_eq!(slots.push(tex(11)), Some(2));
        assert_eq!(slots.find(TextureId(11)), Some(2));
        assert_eq!(slots.find(TextureId(12)), None);
    }

    #[test]
    fn full_table_rejects_push() {
        let mut slots = TextureSlots::new(2);
        assert_eq!(slots.push(tex(1)), Some(1));
        assert!(slots.is_full());
        assert_eq!(slots.push(tex(2)), None);

        slots.reset();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots.push(tex(2)), Some(1));
    }
}
