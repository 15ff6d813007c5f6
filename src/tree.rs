use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::hash::Hash;

use bitvec::prelude::*;
use derivative::Derivative;
use log::{debug, trace};

use crate::codec::{CodeTable, Decoder};
use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;

/// Index of a node inside its [`HuffmanTree`].
pub type NodeId = usize;

/// A node of a Huffman tree. Every internal node has exactly two children.
///
/// Children are indices into the owning tree, so building, walking and
/// dropping a tree never recurses, however deep it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<Symbol> {
    Leaf {
        symbol: Symbol,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: NodeId,
        right: NodeId,
    },
}

impl<Symbol> Node<Symbol> {
    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } => *weight,
            Node::Internal { weight, .. } => *weight,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// Priority queue entry. Ordered by weight, then by the order in which
/// entries were pushed, so equal weights always pop in the same order.
#[derive(Derivative)]
#[derivative(PartialEq, Eq, PartialOrd, Ord)]
struct Queued {
    weight: u64,
    seq: usize,

    #[derivative(PartialEq = "ignore")]
    #[derivative(PartialOrd = "ignore")]
    #[derivative(Ord = "ignore")]
    node: NodeId,
}

/// A Huffman tree, owned by the encode or decode pass that built it.
#[derive(Debug, Clone)]
pub struct HuffmanTree<Symbol> {
    nodes: Vec<Node<Symbol>>,
    root: NodeId,
}

impl<Symbol> HuffmanTree<Symbol>
where
    Symbol: Hash + Eq + Clone,
{
    /// Build the tree by repeatedly merging the two lightest nodes.
    ///
    /// The first node popped becomes the left child. Ties are broken by
    /// first occurrence for leaves and by creation order for merged nodes.
    /// A table with a single symbol yields a bare leaf.
    pub fn from_frequencies(freq: FrequencyTable<Symbol>) -> Result<Self> {
        let mut nodes = Vec::with_capacity(2 * freq.len());
        let mut enqueue = |pq: &mut BinaryHeap<Reverse<Queued>>, node: Node<Symbol>| {
            let id = nodes.len();
            pq.push(Reverse(Queued {
                weight: node.weight(),
                seq: id,
                node: id,
            }));
            nodes.push(node);
        };

        let mut pq = BinaryHeap::with_capacity(freq.len());
        for (symbol, weight) in freq.into_entries() {
            enqueue(&mut pq, Node::Leaf { symbol, weight });
        }
        debug!("building huffman tree over {} symbols", pq.len());

        let root = loop {
            let Reverse(first) = pq.pop().ok_or(Error::EmptyInput)?;
            match pq.pop() {
                None => break first.node,
                Some(Reverse(second)) => {
                    trace!("merging weights {} + {}", first.weight, second.weight);
                    let merged = Node::Internal {
                        weight: first.weight + second.weight,
                        left: first.node,
                        right: second.node,
                    };
                    enqueue(&mut pq, merged);
                }
            }
        };

        Ok(Self { nodes, root })
    }

    /// Count `symbols` and build the tree over them.
    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Result<Self> {
        Self::from_frequencies(FrequencyTable::count(symbols))
    }

    /// Rebuild a decoding tree from a code table.
    ///
    /// The table must describe a complete prefix code: every internal
    /// position ends up with two children. A single entry must carry a
    /// one-bit code and gives a bare leaf. Rebuilt nodes have weight 0.
    pub fn from_code_table(table: &CodeTable<Symbol>) -> Result<Self> {
        let max_len = match table.len() {
            0 => return Err(Error::CorruptTable("table has no entries")),
            1 => {
                let (symbol, code) = table
                    .iter()
                    .next()
                    .ok_or(Error::CorruptTable("table has no entries"))?;
                if code.len() != 1 {
                    return Err(Error::CorruptTable("single-entry table needs a one-bit code"));
                }
                return Ok(Self {
                    nodes: vec![Node::Leaf {
                        symbol: symbol.clone(),
                        weight: 0,
                    }],
                    root: 0,
                });
            }
            // a complete prefix code over n symbols is at most n - 1 bits deep
            n => n - 1,
        };

        let mut trie = Trie::new();
        for (symbol, code) in table.iter() {
            if code.is_empty() {
                return Err(Error::CorruptTable("empty code"));
            }
            if code.len() > max_len {
                return Err(Error::CorruptTable("code longer than the table allows"));
            }
            trie.insert(code, symbol.clone())?;
        }

        Ok(Self {
            nodes: trie.into_nodes()?,
            root: 0,
        })
    }

    /// Derive the code table and a tree-walking decoder.
    pub fn into_table_decoder_pair(self) -> (CodeTable<Symbol>, Decoder<Symbol>) {
        let table = CodeTable::from_tree(&self);
        (table, Decoder::new(self))
    }
}

impl<Symbol> HuffmanTree<Symbol> {
    pub fn root(&self) -> &Node<Symbol> {
        &self.nodes[self.root]
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// The node at `id`. Ids come from this tree's own `Internal` nodes.
    pub fn node(&self, id: NodeId) -> &Node<Symbol> {
        &self.nodes[id]
    }

    /// Total weight, the length of the input the tree was built from.
    pub fn weight(&self) -> u64 {
        self.root().weight()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Length of the longest root-to-leaf path. A bare leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 0)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Node::Internal { left, right, .. } = self.nodes[id] {
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
        }
        deepest
    }
}

enum Slot<Symbol> {
    Empty,
    Leaf(Symbol),
    Branch(NodeId, NodeId),
}

/// Binary trie used while rebuilding a tree from codes. Slot 0 is the root.
struct Trie<Symbol> {
    slots: Vec<Slot<Symbol>>,
}

impl<Symbol> Trie<Symbol> {
    fn new() -> Self {
        Self {
            slots: vec![Slot::Empty],
        }
    }

    fn insert(&mut self, code: &BitSlice<u8, Msb0>, symbol: Symbol) -> Result<()> {
        let mut at = 0;
        for bit in code.iter().by_vals() {
            let next = match &self.slots[at] {
                Slot::Branch(left, right) => Some(if bit { *right } else { *left }),
                Slot::Leaf(_) => {
                    return Err(Error::CorruptTable("a code is a prefix of another code"))
                }
                Slot::Empty => None,
            };
            at = match next {
                Some(child) => child,
                None => {
                    let left = self.slots.len();
                    self.slots.push(Slot::Empty);
                    self.slots.push(Slot::Empty);
                    self.slots[at] = Slot::Branch(left, left + 1);
                    if bit {
                        left + 1
                    } else {
                        left
                    }
                }
            };
        }

        match &self.slots[at] {
            Slot::Empty => {}
            Slot::Leaf(_) => return Err(Error::CorruptTable("two symbols share a code")),
            Slot::Branch(..) => {
                return Err(Error::CorruptTable("a code is a prefix of another code"))
            }
        }
        self.slots[at] = Slot::Leaf(symbol);
        Ok(())
    }

    fn into_nodes(self) -> Result<Vec<Node<Symbol>>> {
        self.slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Empty => Err(Error::CorruptTable("code table is incomplete")),
                Slot::Leaf(symbol) => Ok(Node::Leaf { symbol, weight: 0 }),
                Slot::Branch(left, right) => Ok(Node::Internal {
                    weight: 0,
                    left,
                    right,
                }),
            })
            .collect()
    }
}
