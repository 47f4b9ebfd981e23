// String pair labels and the dense label table shared by trie and encoder

use std::fmt;

use hashbrown::HashMap;

/// Placeholder symbol that is always part of the input alphabet.
pub const NULL_SYMBOL: &str = "null";

/// An aligned (input symbol, output symbol) pair.
///
/// The output side may be empty when the input symbol was aligned to
/// nothing. Equality and hashing are by value, so a label can be used
/// directly as a map key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StringPairLabel {
    input: String,
    output: String,
}

impl StringPairLabel {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_empty()
    }
}

impl fmt::Display for StringPairLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.input, self.output)
    }
}

/// Dense label id, assigned in first-seen order.
pub type LabelId = u32;

/// Bidirectional mapping between labels and dense ids.
///
/// Ids start at 0 and are never reused or reassigned. The table only grows.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: Vec<StringPairLabel>,
    ids: HashMap<StringPairLabel, LabelId>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `label`, assigning the next free id on first sight.
    pub fn intern(&mut self, label: &StringPairLabel) -> LabelId {
        if let Some(&id) = self.ids.get(label) {
            return id;
        }
        let id = self.labels.len() as LabelId;
        self.labels.push(label.clone());
        self.ids.insert(label.clone(), id);
        id
    }

    pub fn id_of(&self, label: &StringPairLabel) -> Option<LabelId> {
        self.ids.get(label).copied()
    }

    pub fn get(&self, id: LabelId) -> Option<&StringPairLabel> {
        self.labels.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in id order.
    pub fn iter(&self) -> impl Iterator<Item = &StringPairLabel> {
        self.labels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_compare_by_value() {
        let a = StringPairLabel::new("c", "k");
        let b = StringPairLabel::new(String::from("c"), String::from("k"));
        assert_eq!(a, b);
        assert_ne!(a, StringPairLabel::new("c", ""));
        assert_ne!(a, StringPairLabel::new("k", "c"));
    }

    #[test]
    fn empty_label() {
        assert!(StringPairLabel::default().is_empty());
        assert!(!StringPairLabel::new("e", "").is_empty());
    }

    #[test]
    fn display_uses_colon() {
        assert_eq!(StringPairLabel::new("t", " t").to_string(), "t: t");
    }

    #[test]
    fn table_assigns_ids_in_first_seen_order() {
        let mut table = LabelTable::new();
        let c = StringPairLabel::new("c", "k");
        let a = StringPairLabel::new("a", " ae");
        assert_eq!(table.intern(&c), 0);
        assert_eq!(table.intern(&a), 1);
        assert_eq!(table.intern(&c), 0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1), Some(&a));
        assert_eq!(table.id_of(&a), Some(1));
        assert_eq!(table.id_of(&StringPairLabel::new("x", "y")), None);
        let order: Vec<_> = table.iter().cloned().collect();
        assert_eq!(order, vec![c, a]);
    }
}
