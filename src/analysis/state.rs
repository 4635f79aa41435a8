use super::{StackEntry, ValueType};
use crate::util::OffsetVec;
use crate::StackError;
use std::collections::HashMap;
use std::fmt;

/// Contents of the operand stack at one point, bottom to top
///
/// Entries are kept in an `OffsetVec`, so the offset of the next entry is always the size of the
/// stack in words.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct StackState {
    entries: OffsetVec<StackEntry>,
}

impl StackState {
    pub fn new() -> StackState {
        StackState::default()
    }

    pub fn push(&mut self, entry: StackEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Result<StackEntry, StackError> {
        self.entries
            .pop()
            .map(|(_, _, entry)| entry)
            .ok_or(StackError::EmptyStack)
    }

    /// Top of the stack
    pub fn peek(&self) -> Option<&StackEntry> {
        self.entries.last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size in 4-byte words (`long` and `double` entries count twice)
    pub fn size_in_words(&self) -> usize {
        self.entries.total_width()
    }

    /// Entries, bottom to top
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &StackEntry> {
        self.entries.iter().map(|(_, _, entry)| entry)
    }

    /// Type layout, bottom to top
    pub fn types(&self) -> Vec<ValueType> {
        self.entries().map(|entry| entry.value_type).collect()
    }

    /// Canonical signature
    ///
    /// Two states are considered the same state exactly when their signatures are equal. The
    /// signature only depends on types and values, not on which instruction produced the entries.
    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl FromIterator<StackEntry> for StackState {
    fn from_iter<I: IntoIterator<Item = StackEntry>>(entries: I) -> Self {
        StackState {
            entries: entries.into_iter().collect(),
        }
    }
}

impl fmt::Display for StackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, entry) in self.entries().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", entry)?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for StackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StackState({})", self)
    }
}

/// Set of stack states, deduplicated by signature
///
/// Iteration follows insertion order. Inserting a state whose signature is already present
/// replaces the earlier state in place.
#[derive(Clone, Default, Debug)]
pub struct StateSet {
    states: Vec<StackState>,
    positions: HashMap<String, usize>,
}

impl StateSet {
    pub fn new() -> StateSet {
        StateSet::default()
    }

    /// Set with just the empty state
    pub fn single_empty() -> StateSet {
        let mut set = StateSet::new();
        set.insert(StackState::new());
        set
    }

    /// Add a state, returning `false` if it replaced an equivalent one
    pub fn insert(&mut self, state: StackState) -> bool {
        let signature = state.signature();
        if let Some(position) = self.positions.get(&signature) {
            self.states[*position] = state;
            false
        } else {
            self.positions.insert(signature, self.states.len());
            self.states.push(state);
            true
        }
    }

    pub fn contains(&self, state: &StackState) -> bool {
        self.positions.contains_key(&state.signature())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StackState> {
        self.states.iter()
    }

    /// Largest state, in words
    pub fn max_size_in_words(&self) -> usize {
        self.iter().map(StackState::size_in_words).max().unwrap_or(0)
    }

    /// Largest state, in entries
    pub fn max_entries(&self) -> usize {
        self.iter().map(StackState::len).max().unwrap_or(0)
    }

    /// Signatures, in iteration order
    pub fn signatures(&self) -> Vec<String> {
        self.iter().map(StackState::signature).collect()
    }
}

impl PartialEq for StateSet {
    fn eq(&self, other: &Self) -> bool {
        self.states == other.states
    }
}

impl Eq for StateSet {}

impl FromIterator<StackState> for StateSet {
    fn from_iter<I: IntoIterator<Item = StackState>>(states: I) -> Self {
        let mut set = StateSet::new();
        set.extend(states);
        set
    }
}

impl Extend<StackState> for StateSet {
    fn extend<I: IntoIterator<Item = StackState>>(&mut self, states: I) {
        for state in states {
            self.insert(state);
        }
    }
}

impl<'a> IntoIterator for &'a StateSet {
    type Item = &'a StackState;
    type IntoIter = std::slice::Iter<'a, StackState>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn int(value: &str) -> StackEntry {
        StackEntry::new(None, ValueType::Int, value)
    }

    #[test]
    fn word_accounting() {
        let three_ints: StackState = vec![int("a"), int("b"), int("c")].into_iter().collect();
        assert_eq!(three_ints.size_in_words(), 3);

        let mut long_and_int = StackState::new();
        long_and_int.push(StackEntry::new(None, ValueType::Long, "l"));
        long_and_int.push(int("i"));
        assert_eq!(long_and_int.size_in_words(), 3);
        assert_eq!(long_and_int.len(), 2);

        let mut double = StackState::new();
        double.push(StackEntry::new(None, ValueType::Double, "d"));
        assert_eq!(double.size_in_words(), 2);
        double.pop().unwrap();
        assert_eq!(double.size_in_words(), 0);
    }

    #[test]
    fn popping_empty_state() {
        let mut state = StackState::new();
        assert_eq!(state.pop(), Err(StackError::EmptyStack));
    }

    #[test]
    fn rendering() {
        let state: StackState = vec![int("1"), int("2")].into_iter().collect();
        assert_eq!(state.signature(), r#"[I:"1", I:"2"]"#);
        assert_eq!(StackState::new().signature(), "[]");
    }

    #[test]
    fn signatures_ignore_producers() {
        let first: StackState = vec![StackEntry::new(Some(1), ValueType::Int, "x")]
            .into_iter()
            .collect();
        let second: StackState = vec![StackEntry::new(Some(7), ValueType::Int, "x")]
            .into_iter()
            .collect();
        assert_eq!(first.signature(), second.signature());

        let mut set = StateSet::new();
        assert!(set.insert(first));
        assert!(!set.insert(second));
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().peek().unwrap().producer, Some(7));
    }

    #[test]
    fn signatures_are_injective() {
        // A single entry whose value looks like two entries must not collide with two entries
        let tricky: StackState = vec![int(r#"1", I:"2"#)].into_iter().collect();
        let honest: StackState = vec![int("1"), int("2")].into_iter().collect();
        assert_ne!(tricky.signature(), honest.signature());

        let typed: StackState = vec![StackEntry::new(None, ValueType::Float, "1")]
            .into_iter()
            .collect();
        let set: StateSet = vec![tricky, honest, typed].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn insertion_order() {
        let set: StateSet = ["3", "1", "2", "1"]
            .iter()
            .map(|v| vec![int(v)].into_iter().collect::<StackState>())
            .collect();
        assert_eq!(
            set.signatures(),
            vec![r#"[I:"3"]"#, r#"[I:"1"]"#, r#"[I:"2"]"#]
        );
    }
}
