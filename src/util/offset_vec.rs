use std::fmt::{Debug, Error, Formatter};
use std::iter::{DoubleEndedIterator, Enumerate, Extend, FromIterator};
use std::slice::Iter;
use std::vec::IntoIter as VecIntoIter;

/// Elements with a width (eg. when used in an `OffsetVec`)
pub trait Width {
    fn width(&self) -> usize;
}

/// A vector of elements of different logical "widths", where offsets into the vector are given in
/// terms of the sum of the widths of the previous elements (as opposed to the number of preceding
/// elements).
///
/// This ends up being convenient in two places when analyzing JVM methods:
///
///   - the operand stack, where `long` and `double` values occupy two words
///   - the constant pool, where `Long` and `Double` constants occupy two indices
///
#[derive(Clone)]
pub struct OffsetVec<T: Sized> {
    /// Entries, along with their offset
    entries: Vec<(Offset, T)>,

    /// Offset of the next element to be added
    offset_len: Offset,

    /// Offset for the first element (usually 0, but 1 for the constant pool)
    initial_offset: Offset,
}

/// Offset into an `OffsetVec`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Offset(pub usize);

impl<T: Sized + Width> OffsetVec<T> {
    /// New empty offset vector
    pub fn new() -> OffsetVec<T> {
        OffsetVec::new_starting_at(Offset(0))
    }

    /// New empty offset vector, with a custom starting offset
    pub fn new_starting_at(initial_offset: Offset) -> OffsetVec<T> {
        OffsetVec {
            entries: vec![],
            offset_len: initial_offset,
            initial_offset,
        }
    }

    /// Length of the `OffsetVec` (aka. number of entries)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current offset size of the `OffsetVec` (aka. offset of the next element to be added)
    pub fn offset_len(&self) -> Offset {
        self.offset_len
    }

    /// Total width of all the elements
    pub fn total_width(&self) -> usize {
        self.offset_len.0 - self.initial_offset.0
    }

    /// Add an entry to the back
    pub fn push(&mut self, slot: T) -> Offset {
        let offset = self.offset_len;
        self.offset_len.0 += slot.width();
        self.entries.push((offset, slot));

        offset
    }

    /// Remove an entry from the back
    pub fn pop(&mut self) -> Option<(Offset, usize, T)> {
        self.entries.pop().map(|(off, elem)| {
            self.offset_len = off;
            (off, self.entries.len(), elem)
        })
    }

    /// Peek at the entry at the back
    pub fn last(&self) -> Option<&T> {
        self.entries.last().map(|(_, elem)| elem)
    }

    /// Empty the vector
    pub fn clear(&mut self) {
        self.entries.clear();
        self.offset_len = self.initial_offset;
    }

    /// Get an entry (and its index) by its offset in the vector
    ///
    /// Note: this uses binary search to find the offset
    pub fn get_offset(&self, offset: Offset) -> Option<(usize, &T)> {
        self.entries
            .binary_search_by_key(&offset, |(off, _)| *off)
            .ok()
            .map(|found_idx| (found_idx, &self.entries[found_idx].1))
    }

    pub fn iter<'a>(&'a self) -> OffsetVecIter<'a, T> {
        self.into_iter()
    }
}

impl<A: PartialEq> PartialEq for OffsetVec<A> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<A: Eq> Eq for OffsetVec<A> {}

impl<A: Width> Default for OffsetVec<A> {
    fn default() -> Self {
        OffsetVec::new()
    }
}

/// Iterator for owned `OffsetVec`
pub struct OffsetVecIntoIter<T>(Enumerate<VecIntoIter<(Offset, T)>>);

impl<T> Iterator for OffsetVecIntoIter<T> {
    type Item = (Offset, usize, T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(idx, (off, elem))| (off, idx, elem))
    }
}

impl<T> DoubleEndedIterator for OffsetVecIntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0
            .next_back()
            .map(|(idx, (off, elem))| (off, idx, elem))
    }
}

impl<T> IntoIterator for OffsetVec<T> {
    type Item = (Offset, usize, T);
    type IntoIter = OffsetVecIntoIter<T>;

    fn into_iter(self) -> OffsetVecIntoIter<T> {
        OffsetVecIntoIter(self.entries.into_iter().enumerate())
    }
}

/// Iterator for borrowed `OffsetVec`
pub struct OffsetVecIter<'a, T>(Enumerate<Iter<'a, (Offset, T)>>);

impl<'a, T> Iterator for OffsetVecIter<'a, T> {
    type Item = (Offset, usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(idx, (off, elem))| (*off, idx, elem))
    }
}

impl<'a, T> DoubleEndedIterator for OffsetVecIter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0
            .next_back()
            .map(|(idx, (off, elem))| (*off, idx, elem))
    }
}

impl<'a, T> IntoIterator for &'a OffsetVec<T> {
    type Item = (Offset, usize, &'a T);
    type IntoIter = OffsetVecIter<'a, T>;

    fn into_iter(self) -> OffsetVecIter<'a, T> {
        OffsetVecIter(self.entries.iter().enumerate())
    }
}

impl<T: Width> FromIterator<T> for OffsetVec<T> {
    fn from_iter<A: IntoIterator<Item = T>>(elems: A) -> Self {
        let mut offset_vec = OffsetVec::new();
        offset_vec.extend(elems);
        offset_vec
    }
}

impl<T: Width> Extend<T> for OffsetVec<T> {
    fn extend<U: IntoIterator<Item = T>>(&mut self, iter: U) {
        for elem in iter {
            self.push(elem);
        }
    }
}

impl<T: Debug> Debug for OffsetVec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut list = f.debug_list();
        for (off, elem) in &self.entries {
            list.entry(&format_args!("#{} = {:?}", off.0, elem));
        }
        list.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    enum Slot {
        OneWord(u8),
        TwoWords(u8),
    }

    impl Width for Slot {
        fn width(&self) -> usize {
            match self {
                Slot::OneWord(_) => 1,
                Slot::TwoWords(_) => 2,
            }
        }
    }

    #[test]
    fn offsets_follow_widths() {
        let slots: OffsetVec<Slot> = vec![Slot::OneWord(1), Slot::TwoWords(2), Slot::OneWord(3)]
            .into_iter()
            .collect();
        assert_eq!(
            slots.iter().map(|(off, idx, _)| (off, idx)).collect::<Vec<_>>(),
            vec![(Offset(0), 0), (Offset(1), 1), (Offset(3), 2)]
        );
        assert_eq!(slots.offset_len(), Offset(4));
        assert_eq!(slots.total_width(), 4);
        assert_eq!(slots.get_offset(Offset(1)), Some((1, &Slot::TwoWords(2))));
        assert_eq!(slots.get_offset(Offset(2)), None);
    }

    #[test]
    fn popping_rewinds_offset() {
        let mut slots: OffsetVec<Slot> = OffsetVec::new();
        slots.push(Slot::TwoWords(1));
        slots.push(Slot::OneWord(2));
        assert_eq!(slots.pop(), Some((Offset(2), 1, Slot::OneWord(2))));
        assert_eq!(slots.offset_len(), Offset(2));
        assert_eq!(slots.last(), Some(&Slot::TwoWords(1)));
        slots.clear();
        assert!(slots.is_empty());
        assert_eq!(slots.pop(), None);
    }

    #[test]
    fn custom_starting_offset() {
        let mut slots: OffsetVec<Slot> = OffsetVec::new_starting_at(Offset(1));
        assert_eq!(slots.push(Slot::TwoWords(1)), Offset(1));
        assert_eq!(slots.push(Slot::OneWord(2)), Offset(3));
        assert_eq!(slots.total_width(), 3);
    }
}
