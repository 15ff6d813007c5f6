use std::collections::HashMap;
use std::hash::Hash;

/// Occurrence counts of each distinct symbol in an input.
///
/// Symbols are kept in order of first occurrence, which the tree builder
/// uses to break ties between equal counts. Equality compares counts only,
/// not that order.
#[derive(Debug, Clone)]
pub struct FrequencyTable<Symbol> {
    index: HashMap<Symbol, usize>,
    counts: Vec<(Symbol, u64)>,
}

impl<Symbol> FrequencyTable<Symbol>
where
    Symbol: Hash + Eq + Clone,
{
    /// Count every symbol yielded by `stream`. An empty stream gives an
    /// empty table.
    pub fn count(stream: impl IntoIterator<Item = Symbol>) -> Self {
        let mut index: HashMap<Symbol, usize> = HashMap::new();
        let mut counts: Vec<(Symbol, u64)> = Vec::new();

        for s in stream {
            match index.get(&s) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(s.clone(), counts.len());
                    counts.push((s, 1));
                }
            }
        }

        Self { index, counts }
    }

    pub fn get(&self, symbol: &Symbol) -> Option<u64> {
        self.index.get(symbol).map(|&i| self.counts[i].1)
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the length of the counted input.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    /// Entries in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, u64)> {
        self.counts.iter().map(|(s, c)| (s, *c))
    }

    pub(crate) fn into_entries(self) -> Vec<(Symbol, u64)> {
        self.counts
    }
}

impl<Symbol> PartialEq for FrequencyTable<Symbol>
where
    Symbol: Hash + Eq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(s, c)| other.get(s) == Some(c))
    }
}

impl<Symbol> Eq for FrequencyTable<Symbol> where Symbol: Hash + Eq + Clone {}

impl<Symbol> FromIterator<Symbol> for FrequencyTable<Symbol>
where
    Symbol: Hash + Eq + Clone,
{
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self::count(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_symbol() {
        let freq = FrequencyTable::count("aaabbc".chars());

        assert_eq!(freq.len(), 3);
        assert_eq!(freq.get(&'a'), Some(3));
        assert_eq!(freq.get(&'b'), Some(2));
        assert_eq!(freq.get(&'c'), Some(1));
        assert_eq!(freq.get(&'d'), None);
        assert_eq!(freq.total(), 6);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let freq: FrequencyTable<u8> = FrequencyTable::count(Vec::new());

        assert!(freq.is_empty());
        assert_eq!(freq.total(), 0);
    }

    #[test]
    fn keeps_first_occurrence_order() {
        let freq: FrequencyTable<u8> = b"cabcab".iter().copied().collect();
        let order: Vec<_> = freq.iter().map(|(s, _)| *s).collect();

        assert_eq!(order, vec![b'c', b'a', b'b']);
    }

    #[test]
    fn equality_ignores_occurrence_order() {
        let first = FrequencyTable::count("abca".chars());
        let second = FrequencyTable::count("cbaa".chars());
        let third = FrequencyTable::count("abcc".chars());

        assert_eq!(first, second);
        assert_ne!(first, third);
        assert_ne!(first, FrequencyTable::count("abc".chars()));
    }
}
