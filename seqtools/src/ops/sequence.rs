//! Whole-sequence helpers: equality, replay buffering, and splicing.

/// Element-wise sequence equality, including length.
pub fn sequence_eq<T, A, B>(a: A, b: B) -> bool
where
    T: PartialEq,
    A: IntoIterator<Item = T>,
    B: IntoIterator<Item = T>,
{
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) if x == y => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Replays a source `passes` times total, buffering it during the first pass.
///
/// The source is drained exactly once; later passes replay the buffer. Zero
/// passes yields nothing and never touches the source.
pub struct RepeatIter<I>
where
    I: Iterator,
{
    source: Option<I>,
    buf: Vec<I::Item>,
    replays_left: usize,
    replay_at: usize,
}

/// Creates a [`RepeatIter`] yielding `iter` `passes` times.
pub fn repeat_iter<I>(iter: I, passes: usize) -> RepeatIter<I>
where
    I: Iterator,
{
    RepeatIter {
        source: (passes > 0).then_some(iter),
        buf: Vec::new(),
        replays_left: passes.saturating_sub(1),
        replay_at: 0,
    }
}

impl<I> Iterator for RepeatIter<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(source) = &mut self.source {
            match source.next() {
                Some(item) => {
                    self.buf.push(item.clone());
                    return Some(item);
                }
                None => self.source = None,
            }
        }
        while self.replays_left > 0 {
            if self.replay_at < self.buf.len() {
                let item = self.buf[self.replay_at].clone();
                self.replay_at += 1;
                return Some(item);
            }
            self.replays_left -= 1;
            self.replay_at = 0;
        }
        None
    }
}

/// Inserts `items` at `index` (clamped to the sequence length).
pub fn splice_insert<T>(mut target: Vec<T>, index: usize, items: Vec<T>) -> Vec<T> {
    let index = index.min(target.len());
    target.splice(index..index, items);
    target
}

/// Removes `delete_count` elements beginning at `start`, both clamped to the
/// sequence length.
pub fn splice_remove<T>(mut target: Vec<T>, start: usize, delete_count: usize) -> Vec<T> {
    let start = start.min(target.len());
    let end = start.saturating_add(delete_count).min(target.len());
    target.drain(start..end);
    target
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn sequence_eq_checks_length_and_elements() {
        assert!(sequence_eq(vec![1, 2, 3], vec![1, 2, 3]));
        assert!(!sequence_eq(vec![1, 2, 3], vec![1, 2]));
        assert!(!sequence_eq(vec![1, 2, 3], vec![1, 2, 4]));
        assert!(sequence_eq(Vec::<i32>::new(), Vec::new()));
    }

    #[test]
    fn repeat_buffers_exactly_once() {
        let pulls = Cell::new(0);
        let counted = (0..3).inspect(|_| pulls.set(pulls.get() + 1));
        let out: Vec<_> = repeat_iter(counted, 3).collect();
        assert_eq!(vec![0, 1, 2, 0, 1, 2, 0, 1, 2], out);
        assert_eq!(3, pulls.get());
    }

    #[test]
    fn repeat_zero_is_empty() {
        let out: Vec<i32> = repeat_iter([1, 2].into_iter(), 0).collect();
        assert!(out.is_empty());
    }

    #[test]
    fn repeat_of_empty_is_empty() {
        let out: Vec<i32> = repeat_iter(std::iter::empty(), 5).collect();
        assert!(out.is_empty());
    }

    #[test]
    fn splice_insert_clamps() {
        assert_eq!(
            vec![1, 9, 9, 2],
            splice_insert(vec![1, 2], 1, vec![9, 9])
        );
        assert_eq!(vec![1, 2, 9], splice_insert(vec![1, 2], 42, vec![9]));
    }

    #[test]
    fn splice_remove_uses_delete_count() {
        // Removes `delete_count` elements starting at `start`.
        assert_eq!(vec![1, 5], splice_remove(vec![1, 2, 3, 4, 5], 1, 3));
        assert_eq!(vec![1, 2], splice_remove(vec![1, 2, 3], 2, 42));
        assert_eq!(vec![1, 2, 3], splice_remove(vec![1, 2, 3], 9, 1));
    }
}
