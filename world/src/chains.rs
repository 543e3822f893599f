//! Chains of body segments and the ring buffer of head positions they trail.

use centipede_core::{
    HorizontalDir, Position, SegmentId, VerticalDir, PATH_HISTORY_CAPACITY,
};

/// Fixed-capacity ring buffer of historical head positions.
///
/// Pushing a new head moves the head index backward modulo the capacity, so
/// the follower `i` steps behind the head always reads `(head + i) % cap` in
/// O(1) regardless of chain length. The capacity must exceed any legal chain
/// length; configuration validation guarantees it and construction asserts.
#[derive(Clone, Debug)]
pub(crate) struct PathBuffer {
    history: [Position; PATH_HISTORY_CAPACITY],
    head: usize,
}

impl PathBuffer {
    /// Seeds a buffer with one entry per initial segment, head first.
    pub(crate) fn seeded(positions: &[Position]) -> Self {
        assert!(
            positions.len() <= PATH_HISTORY_CAPACITY,
            "chain length {} exceeds path history capacity {}",
            positions.len(),
            PATH_HISTORY_CAPACITY,
        );
        let mut history = [Position::default(); PATH_HISTORY_CAPACITY];
        history[..positions.len()].copy_from_slice(positions);
        Self { history, head: 0 }
    }

    /// Seeds a buffer from another buffer's entries at offsets
    /// `[start, start + count)`, preserving the exact historical positions.
    fn carved_from(source: &PathBuffer, start: usize, count: usize) -> Self {
        assert!(
            count <= PATH_HISTORY_CAPACITY,
            "split of {count} segments exceeds path history capacity",
        );
        let mut history = [Position::default(); PATH_HISTORY_CAPACITY];
        for (index, slot) in history.iter_mut().take(count).enumerate() {
            *slot = source.position_at(start + index);
        }
        Self { history, head: 0 }
    }

    /// Records a new head position, shifting every follower back one step.
    pub(crate) fn push_head(&mut self, position: Position) {
        self.head = (self.head + PATH_HISTORY_CAPACITY - 1) % PATH_HISTORY_CAPACITY;
        self.history[self.head] = position;
    }

    /// Reads the position `offset` steps behind the head.
    pub(crate) fn position_at(&self, offset: usize) -> Position {
        debug_assert!(offset < PATH_HISTORY_CAPACITY, "offset {offset} out of range");
        self.history[(self.head + offset) % PATH_HISTORY_CAPACITY]
    }

    /// Current head position.
    pub(crate) fn head_position(&self) -> Position {
        self.position_at(0)
    }
}

/// Ordered group of connected segments moving as one logical unit along a
/// shared path history.
#[derive(Clone, Debug)]
pub(crate) struct Chain {
    pub(crate) segments: Vec<SegmentId>,
    path: PathBuffer,
    pub(crate) horizontal: HorizontalDir,
    pub(crate) vertical: VerticalDir,
    pub(crate) diving: bool,
}

impl Chain {
    /// Creates a chain whose path history is seeded from each segment's
    /// spawn position, head first.
    pub(crate) fn new(
        segments: Vec<SegmentId>,
        positions: &[Position],
        horizontal: HorizontalDir,
    ) -> Self {
        debug_assert_eq!(segments.len(), positions.len());
        Self {
            segments,
            path: PathBuffer::seeded(positions),
            horizontal,
            vertical: VerticalDir::Down,
            diving: false,
        }
    }

    pub(crate) fn head_position(&self) -> Position {
        self.path.head_position()
    }

    /// Records the next head position decided for this fixed step.
    pub(crate) fn advance_path(&mut self, next_head: Position) {
        self.path.push_head(next_head);
    }

    /// Target position for the segment at the provided chain index.
    pub(crate) fn target_for(&self, index: usize) -> Position {
        self.path.position_at(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.segments.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Splits the chain, moving segments `[at_index, len)` into a new chain.
    ///
    /// The new chain's history is carved from this buffer's entries at
    /// offsets `[at_index, at_index + moved)`, so the trailing segments keep
    /// following the path they were already on. Its lateral direction is
    /// inverted, modeling momentum carry-through of the severed body, while
    /// the vertical direction and diving flag are copied. The source buffer
    /// and head index stay untouched. An out-of-range index is a silent
    /// no-op: it represents a benign double notification.
    pub(crate) fn split(&mut self, at_index: usize) -> Option<Chain> {
        if at_index == 0 || at_index >= self.segments.len() {
            return None;
        }

        let moved: Vec<SegmentId> = self.segments.split_off(at_index);
        let path = PathBuffer::carved_from(&self.path, at_index, moved.len());
        Some(Chain {
            segments: moved,
            path,
            horizontal: self.horizontal.reversed(),
            vertical: self.vertical,
            diving: self.diving,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Chain, PathBuffer};
    use centipede_core::{
        HorizontalDir, Position, SegmentId, VerticalDir, PATH_HISTORY_CAPACITY,
    };

    fn stacked_positions(count: usize) -> Vec<Position> {
        (0..count)
            .map(|index| Position::new(0.0, index as f32 * 0.4))
            .collect()
    }

    fn chain_of(count: usize) -> Chain {
        let segments = (0..count).map(|index| SegmentId::new(index as u32)).collect();
        Chain::new(segments, &stacked_positions(count), HorizontalDir::Right)
    }

    #[test]
    fn followers_read_the_path_one_step_behind_the_head() {
        let mut buffer = PathBuffer::seeded(&[Position::new(0.0, 0.0)]);
        buffer.push_head(Position::new(0.4, 0.0));
        buffer.push_head(Position::new(0.8, 0.0));

        assert!(buffer.head_position().approx_eq(Position::new(0.8, 0.0)));
        assert!(buffer.position_at(1).approx_eq(Position::new(0.4, 0.0)));
        assert!(buffer.position_at(2).approx_eq(Position::new(0.0, 0.0)));
    }

    #[test]
    fn pushed_value_wraps_back_after_one_full_cycle() {
        let mut buffer = PathBuffer::seeded(&[]);
        let marker = Position::new(7.7, -3.3);
        buffer.push_head(marker);
        for step in 0..PATH_HISTORY_CAPACITY - 1 {
            buffer.push_head(Position::new(step as f32, 0.0));
        }

        assert!(buffer.position_at(PATH_HISTORY_CAPACITY - 1).approx_eq(marker));
    }

    #[test]
    fn split_preserves_the_total_segment_count() {
        let mut chain = chain_of(10);
        let spawned = chain.split(4).expect("split");
        assert_eq!(chain.len() + spawned.len(), 10);
        assert_eq!(chain.len(), 4);
        assert_eq!(spawned.len(), 6);
    }

    #[test]
    fn split_keeps_trailing_segments_on_their_path() {
        let mut chain = chain_of(8);
        // March the chain a few steps so the history is no longer the seed.
        for step in 1..=5 {
            chain.advance_path(Position::new(step as f32 * 0.4, 0.0));
        }

        let at_index = 3;
        let before: Vec<Position> = (at_index..chain.len())
            .map(|index| chain.target_for(index))
            .collect();

        let spawned = chain.split(at_index).expect("split");
        for (index, expected) in before.iter().enumerate() {
            assert!(
                spawned.target_for(index).approx_eq(*expected),
                "segment {index} jumped across the split"
            );
        }
    }

    #[test]
    fn split_inverts_lateral_direction_and_copies_the_rest() {
        let mut chain = chain_of(6);
        chain.vertical = VerticalDir::Up;
        chain.diving = true;

        let spawned = chain.split(2).expect("split");
        assert_eq!(spawned.horizontal, HorizontalDir::Left);
        assert_eq!(spawned.vertical, VerticalDir::Up);
        assert!(spawned.diving);
        // The source keeps its own state and head untouched.
        assert_eq!(chain.horizontal, HorizontalDir::Right);
        assert!(chain.head_position().approx_eq(Position::new(0.0, 0.0)));
    }

    #[test]
    fn split_at_the_head_or_past_the_tail_is_a_no_op() {
        let mut chain = chain_of(4);
        assert!(chain.split(0).is_none());
        assert!(chain.split(4).is_none());
        assert!(chain.split(17).is_none());
        assert_eq!(chain.len(), 4);
    }
}
