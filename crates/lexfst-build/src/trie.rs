// Symbol trie over label sequences and its minimization into an implicit DAG

use std::collections::VecDeque;

use hashbrown::HashMap;
use lexfst_core::{LabelId, LabelTable, StringPairLabel};

use crate::BuildError;

/// Index of a node in the trie arena.
pub type NodeId = usize;

/// Index of an equivalence class of a minimized trie.
pub type ClassId = usize;

/// The root node; it exists from construction on.
pub const ROOT: NodeId = 0;

#[derive(Debug, Clone, Default)]
struct TrieNode {
    /// Outgoing arcs, sorted by label id, at most one per label.
    arcs: Vec<(LabelId, NodeId)>,
    is_final: bool,
    parent: Option<NodeId>,
}

/// Trie over sequences of [`StringPairLabel`].
///
/// Nodes live in an arena and point back to their unique parent, which is all
/// the bottom-up minimization needs. Labels are interned into a shared
/// [`LabelTable`] in first-seen order.
#[derive(Debug, Clone)]
pub struct SymbolTrie {
    nodes: Vec<TrieNode>,
    labels: LabelTable,
    /// End nodes of inserted sequences, in insertion order (may repeat).
    finals: Vec<NodeId>,
}

impl Default for SymbolTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            labels: LabelTable::new(),
            finals: Vec::new(),
        }
    }

    /// Insert a label sequence, creating missing nodes; returns the node that
    /// ends it, now marked final.
    pub fn insert(&mut self, labels: &[StringPairLabel]) -> NodeId {
        let mut node = ROOT;
        for label in labels {
            let id = self.labels.intern(label);
            node = match self.nodes[node].arcs.binary_search_by_key(&id, |&(l, _)| l) {
                Ok(pos) => self.nodes[node].arcs[pos].1,
                Err(pos) => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode {
                        parent: Some(node),
                        ..TrieNode::default()
                    });
                    self.nodes[node].arcs.insert(pos, (id, child));
                    child
                }
            };
        }
        self.nodes[node].is_final = true;
        self.finals.push(node);
        node
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of inserted sequences, duplicates included.
    pub fn sequence_count(&self) -> usize {
        self.finals.len()
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn is_final(&self, node: NodeId) -> bool {
        self.nodes[node].is_final
    }

    /// Outgoing `(label, child)` arcs of `node`, sorted by label id.
    pub fn arcs(&self, node: NodeId) -> &[(LabelId, NodeId)] {
        &self.nodes[node].arcs
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    /// Node reached from the root by `labels`, if any.
    pub fn find(&self, labels: &[StringPairLabel]) -> Option<NodeId> {
        labels.iter().try_fold(ROOT, |node, label| {
            let id = self.labels.id_of(label)?;
            let arcs = &self.nodes[node].arcs;
            let pos = arcs.binary_search_by_key(&id, |&(l, _)| l).ok()?;
            Some(arcs[pos].1)
        })
    }

    /// Group nodes with identical right languages into equivalence classes.
    ///
    /// Works bottom-up from the final leaves: a node is classified once all
    /// its children are, by looking its signature (finality plus the
    /// `(label, child class)` arcs) up among the classes created so far. The
    /// parent is queued as soon as its last child is classified.
    pub fn minimize(&self) -> Result<MinimizedTrie<'_>, BuildError> {
        if self.finals.is_empty() {
            return Err(BuildError::EmptyTrie);
        }

        let mut class_of: Vec<Option<ClassId>> = vec![None; self.nodes.len()];
        let mut representatives: Vec<NodeId> = Vec::new();
        let mut classes: HashMap<Signature, ClassId> = HashMap::new();

        let mut queue: VecDeque<NodeId> = self
            .finals
            .iter()
            .copied()
            .filter(|&node| self.nodes[node].arcs.is_empty())
            .collect();

        while let Some(node) = queue.pop_front() {
            // The same leaf may be queued once per duplicate insertion
            if class_of[node].is_some() {
                continue;
            }

            let signature = self.signature(node, &class_of);
            let next_class = representatives.len();
            let class = *classes.entry(signature).or_insert_with(|| {
                representatives.push(node);
                next_class
            });
            class_of[node] = Some(class);

            if let Some(parent) = self.parent(node) {
                if class_of[parent].is_none() && self.right_identified(parent, &class_of) {
                    queue.push_back(parent);
                }
            }
        }

        let class_of = class_of
            .into_iter()
            .enumerate()
            .map(|(node, class)| class.ok_or(BuildError::Unminimized { node }))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            nodes = self.nodes.len(),
            classes = representatives.len(),
            labels = self.labels.len(),
            "minimized trie"
        );

        Ok(MinimizedTrie {
            trie: self,
            class_of,
            representatives,
        })
    }

    fn signature(&self, node: NodeId, class_of: &[Option<ClassId>]) -> Signature {
        let n = &self.nodes[node];
        Signature {
            is_final: n.is_final,
            arcs: n
                .arcs
                .iter()
                .map(|&(label, child)| (label, class_of[child]))
                .collect(),
        }
    }

    fn right_identified(&self, node: NodeId, class_of: &[Option<ClassId>]) -> bool {
        self.nodes[node]
            .arcs
            .iter()
            .all(|&(_, child)| class_of[child].is_some())
    }
}

/// Minimization key of a node. Children are always classified when it is
/// computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Signature {
    is_final: bool,
    arcs: Vec<(LabelId, Option<ClassId>)>,
}

/// A trie together with its node-to-class mapping.
///
/// The trie itself is left untouched; the classes turn it into a DAG whose
/// states are the classes and whose arcs are the arcs of each class's
/// representative node.
#[derive(Debug)]
pub struct MinimizedTrie<'a> {
    trie: &'a SymbolTrie,
    class_of: Vec<ClassId>,
    /// First node classified into each class.
    representatives: Vec<NodeId>,
}

impl<'a> MinimizedTrie<'a> {
    pub fn trie(&self) -> &'a SymbolTrie {
        self.trie
    }

    pub fn class_of(&self, node: NodeId) -> ClassId {
        self.class_of[node]
    }

    pub fn class_count(&self) -> usize {
        self.representatives.len()
    }

    pub fn representative(&self, class: ClassId) -> NodeId {
        self.representatives[class]
    }

    pub fn root_class(&self) -> ClassId {
        self.class_of[ROOT]
    }

    pub fn is_final(&self, class: ClassId) -> bool {
        self.trie.is_final(self.representatives[class])
    }

    /// Arcs of a class as `(label, target class)`, sorted by label id.
    pub fn class_arcs(&self, class: ClassId) -> impl Iterator<Item = (LabelId, ClassId)> + '_ {
        self.trie
            .arcs(self.representatives[class])
            .iter()
            .map(|&(label, child)| (label, self.class_of[child]))
    }

    /// Number of outgoing arcs of a class.
    pub fn arc_count(&self, class: ClassId) -> usize {
        self.trie.arcs(self.representatives[class]).len()
    }
}
