use std::collections::BTreeMap;

/// Entry of a `LocalVariableTable` attribute
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LocalVariable {
    /// First offset at which the variable has a value
    pub start_pc: u32,

    /// Number of bytes of code, starting at `start_pc`, in which the variable is live
    pub length: u32,

    /// Local variable slot
    pub index: u16,

    pub name: String,

    /// Field descriptor of the variable's type
    pub descriptor: String,
}

impl LocalVariable {
    fn covers(&self, offset: u32) -> bool {
        self.start_pc <= offset && offset < self.start_pc.saturating_add(self.length)
    }
}

/// Longest store instruction (`wide astore <u16>`), in bytes
const MAX_STORE_LENGTH: u32 = 4;

/// Debug information mapping local variable slots to source names
#[derive(Clone, Default, Debug)]
pub struct LocalVariableTable {
    entries: Vec<LocalVariable>,
}

impl LocalVariableTable {
    pub fn new() -> LocalVariableTable {
        LocalVariableTable::default()
    }

    pub fn push(&mut self, entry: LocalVariable) {
        self.entries.push(entry);
    }

    /// Convenience for adding an entry
    pub fn add(&mut self, index: u16, start_pc: u32, length: u32, name: &str, descriptor: &str) {
        self.push(LocalVariable {
            start_pc,
            length,
            index,
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        });
    }

    pub fn entries(&self) -> &[LocalVariable] {
        &self.entries
    }

    /// Find the variable in a slot that is live at a given offset
    pub fn resolve(&self, index: u16, offset: u32) -> Option<&LocalVariable> {
        self.entries
            .iter()
            .find(|entry| entry.index == index && entry.covers(offset))
    }

    /// Find the variable written by a store at a given offset
    ///
    /// The live range of a variable only begins after the store that initializes it, so an entry
    /// starting right after the store instruction also counts.
    pub fn resolve_store(&self, index: u16, offset: u32) -> Option<&LocalVariable> {
        self.resolve(index, offset).or_else(|| {
            self.entries.iter().find(|entry| {
                entry.index == index
                    && entry.start_pc > offset
                    && entry.start_pc <= offset + MAX_STORE_LENGTH
            })
        })
    }
}

impl FromIterator<LocalVariable> for LocalVariableTable {
    fn from_iter<I: IntoIterator<Item = LocalVariable>>(entries: I) -> Self {
        LocalVariableTable {
            entries: entries.into_iter().collect(),
        }
    }
}

/// Local variable names visible to one analysis
///
/// Combines the method's (read-only) debug table with names the analysis registers itself for
/// slots that have no debug information, such as the exception stored at the start of a handler.
/// A registered name applies to the store at its offset and to loads of the same slot after it.
#[derive(Clone, Debug)]
pub struct LocalNames<'a> {
    table: &'a LocalVariableTable,
    synthetic: BTreeMap<(u16, u32), String>,
}

impl<'a> LocalNames<'a> {
    pub fn new(table: &'a LocalVariableTable) -> LocalNames<'a> {
        LocalNames {
            table,
            synthetic: BTreeMap::new(),
        }
    }

    /// Register a name for a slot at one specific offset
    pub fn register(&mut self, index: u16, offset: u32, name: impl Into<String>) {
        self.synthetic.insert((index, offset), name.into());
    }

    /// Name of the local read at an offset
    pub fn load_name(&self, index: u16, offset: u32) -> Option<&str> {
        self.table
            .resolve(index, offset)
            .map(|entry| entry.name.as_str())
            .or_else(|| {
                self.synthetic
                    .range((index, 0)..=(index, offset))
                    .next_back()
                    .map(|(_, name)| name.as_str())
            })
    }

    /// Name of the local written at an offset
    pub fn store_name(&self, index: u16, offset: u32) -> Option<&str> {
        self.table
            .resolve_store(index, offset)
            .map(|entry| entry.name.as_str())
            .or_else(|| self.synthetic.get(&(index, offset)).map(String::as_str))
    }

    /// Number of names registered by the analysis
    pub fn synthetic_count(&self) -> usize {
        self.synthetic.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn table() -> LocalVariableTable {
        let mut table = LocalVariableTable::new();
        table.add(0, 0, 20, "this", "LFoo;");
        table.add(1, 3, 10, "count", "I");
        table.add(1, 14, 6, "name", "Ljava/lang/String;");
        table
    }

    #[test]
    fn slots_reused_across_ranges() {
        let table = table();
        assert_eq!(table.resolve(1, 5).map(|v| v.name.as_str()), Some("count"));
        assert_eq!(table.resolve(1, 15).map(|v| v.name.as_str()), Some("name"));
        assert_eq!(table.resolve(1, 13), None);
        assert_eq!(table.resolve(2, 5), None);
    }

    #[test]
    fn store_before_live_range() {
        let table = table();
        assert_eq!(table.resolve(1, 2), None);
        assert_eq!(
            table.resolve_store(1, 2).map(|v| v.name.as_str()),
            Some("count")
        );
    }

    #[test]
    fn synthetic_names_only_fill_gaps() {
        let table = table();
        let mut names = LocalNames::new(&table);
        names.register(5, 30, "<any exception>");
        names.register(0, 2, "shadowed");
        assert_eq!(names.store_name(5, 30), Some("<any exception>"));
        assert_eq!(names.store_name(5, 31), None);
        assert_eq!(names.load_name(5, 29), None);
        assert_eq!(names.load_name(5, 31), Some("<any exception>"));
        assert_eq!(names.load_name(0, 2), Some("this"));
        assert_eq!(names.synthetic_count(), 2);
    }
}
