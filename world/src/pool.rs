//! Free-list identifier pools backing leased simulation instances.
//!
//! Segments and obstacles are leased from per-kind pools rather than created
//! and destroyed by the simulation; released slots are recycled before new
//! identifiers are minted so long sessions keep a compact id space.

/// Allocates numeric identifier slots with lease/release semantics.
#[derive(Clone, Debug, Default)]
pub(crate) struct IdPool {
    next: u32,
    free: Vec<u32>,
}

impl IdPool {
    /// Creates an empty pool with no leased slots.
    pub(crate) const fn new() -> Self {
        Self {
            next: 0,
            free: Vec::new(),
        }
    }

    /// Leases a slot, recycling a released identifier when one is available.
    pub(crate) fn lease(&mut self) -> u32 {
        if let Some(recycled) = self.free.pop() {
            return recycled;
        }
        let minted = self.next;
        self.next = self.next.wrapping_add(1);
        minted
    }

    /// Returns a slot to the pool.
    ///
    /// Unknown or already-released identifiers are ignored; a double release
    /// is a benign duplicate notification, not corruption.
    pub(crate) fn release(&mut self, id: u32) {
        if id >= self.next || self.free.contains(&id) {
            return;
        }
        self.free.push(id);
    }

    /// Number of slots currently leased out.
    pub(crate) fn live_count(&self) -> usize {
        self.next as usize - self.free.len()
    }

    /// Forgets every lease and minted slot.
    pub(crate) fn clear(&mut self) {
        self.next = 0;
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::IdPool;

    #[test]
    fn released_slots_are_recycled_before_minting() {
        let mut pool = IdPool::new();
        let first = pool.lease();
        let second = pool.lease();
        assert_ne!(first, second);

        pool.release(first);
        assert_eq!(pool.lease(), first);
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn double_release_is_ignored() {
        let mut pool = IdPool::new();
        let id = pool.lease();
        pool.release(id);
        pool.release(id);
        assert_eq!(pool.live_count(), 0);

        assert_eq!(pool.lease(), id);
        assert_ne!(pool.lease(), id);
    }

    #[test]
    fn unknown_ids_cannot_be_released() {
        let mut pool = IdPool::new();
        pool.release(7);
        assert_eq!(pool.lease(), 0);
    }

    #[test]
    fn clear_resets_the_id_space() {
        let mut pool = IdPool::new();
        let _ = pool.lease();
        let _ = pool.lease();
        pool.clear();
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.lease(), 0);
    }
}
