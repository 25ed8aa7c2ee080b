//! Track queue with a playback cursor.
//!
//! [`TrackQueue`] is plain data: every method is a pure in-memory update. The engine
//! keeps it behind the same mutex as the transport state, so mutations, cursor updates,
//! and the pending-advance signal are always observed together.
//!
//! Cursor rules:
//! - `cursor < len()` whenever the queue is non-empty, `0` when empty.
//! - Removing the entry under the cursor leaves the cursor on the slot that now holds
//!   the following track and marks [`PendingAdvance::Removed`] so the render loop does
//!   not step past it.
//! - Removing an entry before the cursor shifts the cursor back by one.

use std::collections::TryReserveError;

use rand::Rng;

use crate::error::QueueError;
use crate::track::Track;

/// Why the track under the cursor should stop before its natural end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PendingAdvance {
    #[default]
    None,
    /// User pressed next: advance one position past the playing track.
    UserSkip,
    /// The slot under the cursor changed underneath the playing track: play what is
    /// there now without advancing.
    Removed,
}

#[derive(Debug, Default)]
pub struct TrackQueue {
    tracks: Vec<Track>,
    cursor: usize,
    pending: PendingAdvance,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Cursor position, `None` when empty.
    pub fn cursor(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            None
        } else {
            Some(self.cursor)
        }
    }

    pub fn pending(&self) -> PendingAdvance {
        self.pending
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn current(&self) -> Option<Track> {
        self.tracks.get(self.cursor).cloned()
    }

    /// Append tracks in order. All-or-nothing: on allocation failure nothing is added.
    pub fn extend<I>(&mut self, tracks: I) -> Result<usize, QueueError>
    where
        I: IntoIterator<Item = Track>,
    {
        let incoming: Vec<Track> = tracks.into_iter().collect();
        let requested = incoming.len();
        if requested == 0 {
            return Ok(0);
        }
        self.tracks
            .try_reserve(requested)
            .map_err(|_: TryReserveError| QueueError::ResourceExhausted { requested })?;

        let was_empty = self.tracks.is_empty();
        self.tracks.extend(incoming);
        if was_empty {
            self.cursor = 0;
        }
        Ok(requested)
    }

    #[cfg(test)]
    pub(crate) fn push(&mut self, track: Track) -> Result<(), QueueError> {
        self.extend(std::iter::once(track)).map(|_| ())
    }

    /// Remove the entry at `index`, keeping the cursor on the same logical track.
    pub fn remove_at(&mut self, index: usize) -> Result<Track, QueueError> {
        let len = self.tracks.len();
        if index >= len {
            return Err(QueueError::OutOfRange { index, len });
        }

        let removed = self.tracks.remove(index);
        if index < self.cursor {
            self.cursor -= 1;
        } else if index == self.cursor {
            self.pending = PendingAdvance::Removed;
            if self.cursor >= self.tracks.len() {
                self.cursor = 0;
            }
        }
        Ok(removed)
    }

    /// Fisher–Yates shuffle; playback restarts from the new head.
    ///
    /// No-op for queues of length 0 or 1.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let len = self.tracks.len();
        if len <= 1 {
            return false;
        }
        for i in (1..len).rev() {
            let j = rng.random_range(0..=i);
            self.tracks.swap(i, j);
        }
        self.cursor = 0;
        self.pending = PendingAdvance::Removed;
        true
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.cursor = 0;
        self.pending = PendingAdvance::Removed;
    }

    /// Request a skip of the playing track.
    ///
    /// A pending removal already moved the successor under the cursor, so it wins over
    /// the skip; otherwise the skip would step one track too far.
    pub fn request_skip(&mut self) {
        if self.pending != PendingAdvance::Removed {
            self.pending = PendingAdvance::UserSkip;
        }
    }

    /// Step the cursor one position before the track under it has started rendering.
    ///
    /// Once the render loop has begun a track, use [`request_skip`] instead: it is the
    /// loop's `advance` that moves the cursor for a rendering track.
    ///
    /// [`request_skip`]: TrackQueue::request_skip
    pub fn skip_unstarted(&mut self) {
        let len = self.tracks.len();
        if len > 0 {
            self.cursor = (self.cursor + 1) % len;
        }
    }

    /// Snapshot the track to render next and reset the pending signal for it.
    pub fn begin_track(&mut self) -> Option<(usize, Track)> {
        let track = self.current()?;
        self.pending = PendingAdvance::None;
        Some((self.cursor, track))
    }

    /// Move the cursor after a track stopped rendering, according to the pending signal.
    ///
    /// Returns the signal that was consumed.
    pub fn advance(&mut self) -> PendingAdvance {
        let pending = std::mem::take(&mut self.pending);
        let len = self.tracks.len();
        if len == 0 {
            self.cursor = 0;
            return pending;
        }
        match pending {
            PendingAdvance::Removed => {
                if self.cursor >= len {
                    self.cursor = 0;
                }
            }
            PendingAdvance::None | PendingAdvance::UserSkip => {
                self.cursor = (self.cursor + 1) % len;
            }
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn queue_of(names: &[&str]) -> TrackQueue {
        let mut q = TrackQueue::new();
        q.extend(names.iter().map(|n| Track::from(*n))).unwrap();
        q
    }

    fn names(q: &TrackQueue) -> Vec<String> {
        q.tracks().iter().map(Track::display_name).collect()
    }

    fn assert_cursor_valid(q: &TrackQueue) {
        match q.cursor() {
            Some(c) => assert!(c < q.len(), "cursor {c} out of bounds for {}", q.len()),
            None => assert!(q.is_empty()),
        }
    }

    /// Put the cursor on `index` the way the render loop would.
    fn play_at(q: &mut TrackQueue, index: usize) {
        while q.cursor() != Some(index) {
            q.begin_track();
            q.advance();
        }
        q.begin_track();
    }

    #[test]
    fn first_add_sets_cursor_to_zero() {
        let mut q = TrackQueue::new();
        assert_eq!(q.cursor(), None);
        q.push(Track::from("x.mp3")).unwrap();
        assert_eq!(q.cursor(), Some(0));
        assert_eq!(q.current(), Some(Track::from("x.mp3")));
    }

    #[test]
    fn extend_with_nothing_is_noop() {
        let mut q = TrackQueue::new();
        assert_eq!(q.extend(Vec::new()).unwrap(), 0);
        assert!(q.is_empty());
    }

    #[test]
    fn remove_out_of_range_leaves_queue_untouched() {
        let mut q = queue_of(&["a", "b"]);
        let err = q.remove_at(2).unwrap_err();
        assert_eq!(err, QueueError::OutOfRange { index: 2, len: 2 });
        assert_eq!(names(&q), vec!["a", "b"]);
        assert_eq!(q.pending(), PendingAdvance::None);
    }

    #[test]
    fn removing_current_marks_removed_and_plays_successor() {
        let mut q = queue_of(&["A", "B", "C"]);
        play_at(&mut q, 1);

        q.remove_at(1).unwrap();
        assert_eq!(names(&q), vec!["A", "C"]);
        assert_eq!(q.pending(), PendingAdvance::Removed);

        q.advance();
        assert_eq!(q.cursor(), Some(1));
        assert_eq!(q.current(), Some(Track::from("C")));
    }

    #[test]
    fn removing_current_last_slot_wraps_to_head() {
        let mut q = queue_of(&["A", "B", "C"]);
        play_at(&mut q, 2);

        q.remove_at(2).unwrap();
        assert_cursor_valid(&q);
        q.advance();
        assert_eq!(q.current(), Some(Track::from("A")));
    }

    #[test]
    fn removing_before_cursor_keeps_same_track() {
        let mut q = queue_of(&["A", "B", "C", "D"]);
        play_at(&mut q, 2);

        q.remove_at(0).unwrap();
        assert_eq!(q.current(), Some(Track::from("C")));
        assert_eq!(q.pending(), PendingAdvance::None);

        q.advance();
        assert_eq!(q.current(), Some(Track::from("D")));
    }

    #[test]
    fn removing_after_cursor_leaves_cursor() {
        let mut q = queue_of(&["A", "B", "C"]);
        play_at(&mut q, 0);
        q.remove_at(2).unwrap();
        assert_eq!(q.cursor(), Some(0));
        q.advance();
        assert_eq!(q.current(), Some(Track::from("B")));
    }

    #[test]
    fn removing_only_track_empties_queue() {
        let mut q = queue_of(&["A"]);
        q.begin_track();
        q.remove_at(0).unwrap();
        assert_eq!(q.cursor(), None);
        q.advance();
        assert_eq!(q.cursor(), None);
        assert_eq!(q.pending(), PendingAdvance::None);
    }

    #[test]
    fn rapid_removals_around_cursor_keep_intended_successor() {
        let mut q = queue_of(&["A", "B", "C", "D", "E", "F"]);
        play_at(&mut q, 3); // D

        q.remove_at(0).unwrap(); // [B C D E F], still on D
        assert_eq!(q.current(), Some(Track::from("D")));
        q.remove_at(0).unwrap(); // [C D E F]
        assert_eq!(q.current(), Some(Track::from("D")));
        q.remove_at(1).unwrap(); // removes D itself -> E under cursor
        assert_eq!(q.current(), Some(Track::from("E")));
        q.remove_at(0).unwrap(); // [E F], cursor follows E
        assert_eq!(q.current(), Some(Track::from("E")));
        assert_cursor_valid(&q);

        q.advance();
        assert_eq!(q.current(), Some(Track::from("E")));
    }

    #[test]
    fn removing_everything_from_the_head_while_cursor_at_zero() {
        let mut q = queue_of(&["A", "B", "C"]);
        q.begin_track();
        for _ in 0..3 {
            q.remove_at(0).unwrap();
            assert_cursor_valid(&q);
        }
        assert!(q.is_empty());
    }

    #[test]
    fn cursor_invariant_holds_across_mixed_operations() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut q = TrackQueue::new();
        for round in 0..200usize {
            match round % 5 {
                0 | 1 => {
                    q.push(Track::from(format!("t{round}"))).unwrap();
                }
                2 => {
                    if !q.is_empty() {
                        let idx = rng.random_range(0..q.len());
                        q.remove_at(idx).unwrap();
                    }
                }
                3 => {
                    q.shuffle(&mut rng);
                }
                _ => {
                    q.begin_track();
                    q.advance();
                }
            }
            assert_cursor_valid(&q);
            if round % 37 == 0 {
                q.clear();
                assert_cursor_valid(&q);
            }
        }
    }

    #[test]
    fn skip_advances_exactly_one_and_wraps() {
        let mut q = queue_of(&["A", "B"]);
        q.begin_track();
        q.request_skip();
        assert_eq!(q.advance(), PendingAdvance::UserSkip);
        assert_eq!(q.current(), Some(Track::from("B")));
        assert_eq!(q.cursor(), Some(1));

        q.begin_track();
        assert_eq!(q.advance(), PendingAdvance::None);
        assert_eq!(q.current(), Some(Track::from("A")));
        assert_eq!(q.cursor(), Some(0));
    }

    #[test]
    fn skip_after_removal_does_not_double_advance() {
        let mut q = queue_of(&["A", "B", "C"]);
        play_at(&mut q, 0);
        q.remove_at(0).unwrap();
        q.request_skip();
        assert_eq!(q.pending(), PendingAdvance::Removed);
        q.advance();
        assert_eq!(q.current(), Some(Track::from("B")));
    }

    #[test]
    fn removal_after_skip_overrides_skip() {
        let mut q = queue_of(&["A", "B", "C"]);
        play_at(&mut q, 0);
        q.request_skip();
        q.remove_at(0).unwrap();
        q.advance();
        assert_eq!(q.current(), Some(Track::from("B")));
    }

    #[test]
    fn shuffle_is_a_permutation_and_resets_to_head() {
        let mut rng = StdRng::seed_from_u64(42);
        let original: Vec<String> = (0..16).map(|i| format!("t{i}")).collect();
        let mut q = TrackQueue::new();
        q.extend(original.iter().map(|n| Track::from(n.as_str()))).unwrap();
        play_at(&mut q, 5);

        assert!(q.shuffle(&mut rng));
        assert_eq!(q.cursor(), Some(0));
        assert_eq!(q.pending(), PendingAdvance::Removed);

        let mut shuffled = names(&q);
        shuffled.sort();
        let mut expected = original.clone();
        expected.sort();
        assert_eq!(shuffled, expected);

        let head = q.tracks()[0].clone();
        q.advance();
        assert_eq!(q.cursor(), Some(0));
        assert_eq!(q.current(), Some(head));
    }

    #[test]
    fn shuffle_of_short_queue_is_noop() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut q = queue_of(&["only"]);
        q.begin_track();
        assert!(!q.shuffle(&mut rng));
        assert_eq!(q.pending(), PendingAdvance::None);

        let mut empty = TrackQueue::new();
        assert!(!empty.shuffle(&mut rng));
    }

    #[test]
    fn shuffle_reaches_every_position() {
        // Each element should land in each slot at least once over many shuffles.
        let mut rng = StdRng::seed_from_u64(99);
        let mut seen = [[false; 4]; 4];
        for _ in 0..500 {
            let mut q = queue_of(&["0", "1", "2", "3"]);
            q.shuffle(&mut rng);
            for (slot, t) in q.tracks().iter().enumerate() {
                let id: usize = t.display_name().parse().unwrap();
                seen[id][slot] = true;
            }
        }
        assert!(seen.iter().all(|row| row.iter().all(|&s| s)));
    }

    #[test]
    fn clear_resets_cursor_and_marks_removed() {
        let mut q = queue_of(&["A", "B", "C"]);
        play_at(&mut q, 2);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.cursor(), None);
        assert_eq!(q.pending(), PendingAdvance::Removed);

        q.push(Track::from("D")).unwrap();
        assert_eq!(q.cursor(), Some(0));
        q.advance();
        assert_eq!(q.current(), Some(Track::from("D")));
    }

    #[test]
    fn skip_unstarted_moves_cursor_once_and_wraps() {
        let mut q = queue_of(&["A", "B"]);
        q.skip_unstarted();
        let (index, track) = q.begin_track().unwrap();
        assert_eq!(index, 1);
        assert_eq!(track, Track::from("B"));

        q.advance();
        assert_eq!(q.cursor(), Some(0));
        q.skip_unstarted();
        assert_eq!(q.cursor(), Some(1));

        let mut empty = TrackQueue::new();
        empty.skip_unstarted();
        assert_eq!(empty.cursor(), None);
    }

    #[test]
    fn begin_track_clears_stale_pending() {
        let mut q = queue_of(&["A", "B"]);
        q.request_skip();
        let (index, track) = q.begin_track().unwrap();
        assert_eq!(index, 0);
        assert_eq!(track, Track::from("A"));
        assert_eq!(q.pending(), PendingAdvance::None);
    }
}
