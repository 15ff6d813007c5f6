use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use bitvec::prelude::*;
use derivative::Derivative;
use log::debug;

use crate::error::{Error, Result};
use crate::tree::{HuffmanTree, Node};

/// A growable packed bit string, most significant bit first in each byte.
pub type Bits = BitVec<u8, Msb0>;

/// The code of a single symbol.
pub type Code = BitBox<u8, Msb0>;

/// Prefix-free mapping between symbols and their codes, in both directions.
#[derive(Debug, Clone, Derivative)]
#[derivative(
    PartialEq(bound = "Symbol: Hash + Eq"),
    Eq(bound = "Symbol: Hash + Eq")
)]
pub struct CodeTable<Symbol> {
    encode_table: HashMap<Symbol, Code>,
    decode_table: HashMap<Code, Symbol>,
}

impl<Symbol> CodeTable<Symbol>
where
    Symbol: Hash + Eq + Clone,
{
    /// Walk the tree, appending `0` on each left branch and `1` on each
    /// right branch. A bare leaf root is given the one-bit code `0`.
    pub fn from_tree(tree: &HuffmanTree<Symbol>) -> Self {
        let mut encode_table = HashMap::new();
        let mut decode_table = HashMap::new();
        let mut insert = |symbol: &Symbol, code: Code| {
            decode_table.insert(code.clone(), symbol.clone());
            encode_table.insert(symbol.clone(), code);
        };

        if let Node::Leaf { symbol, .. } = tree.root() {
            insert(symbol, bitbox![u8, Msb0; 0]);
        } else {
            let mut stack = vec![(tree.root_id(), Bits::new())];
            while let Some((id, mut code)) = stack.pop() {
                match tree.node(id) {
                    Node::Leaf { symbol, .. } => insert(symbol, code.into_boxed_bitslice()),
                    Node::Internal { left, right, .. } => {
                        let mut right_code = code.clone();
                        right_code.push(true);
                        code.push(false);

                        stack.push((*right, right_code));
                        stack.push((*left, code));
                    }
                }
            }
        }

        debug!("derived {} codes", encode_table.len());
        Self {
            encode_table,
            decode_table,
        }
    }

    /// Build a table from externally supplied entries, e.g. a persisted one.
    ///
    /// Rejects empty tables, empty codes, and repeated symbols or codes.
    /// Prefix-freeness is checked when a decoding tree is rebuilt.
    pub fn from_entries(entries: impl IntoIterator<Item = (Symbol, Code)>) -> Result<Self> {
        let mut encode_table = HashMap::new();
        let mut decode_table = HashMap::new();

        for (symbol, code) in entries {
            if code.is_empty() {
                return Err(Error::CorruptTable("empty code"));
            }
            if decode_table.insert(code.clone(), symbol.clone()).is_some() {
                return Err(Error::CorruptTable("two symbols share a code"));
            }
            if encode_table.insert(symbol, code).is_some() {
                return Err(Error::CorruptTable("symbol listed twice"));
            }
        }

        if encode_table.is_empty() {
            return Err(Error::CorruptTable("table has no entries"));
        }

        Ok(Self {
            encode_table,
            decode_table,
        })
    }

    pub fn code(&self, symbol: &Symbol) -> Option<&BitSlice<u8, Msb0>> {
        self.encode_table.get(symbol).map(|c| c.as_bitslice())
    }

    /// Concatenate the code of every symbol in `stream`, in order.
    pub fn encode<S>(&self, stream: impl IntoIterator<Item = S>) -> Result<Bits>
    where
        S: Borrow<Symbol>,
    {
        let mut out = Bits::new();
        let mut count = 0;
        for (position, s) in stream.into_iter().enumerate() {
            let code = self
                .encode_table
                .get(s.borrow())
                .ok_or(Error::MissingSymbol { position })?;
            out.extend_from_bitslice(code);
            count += 1;
        }

        if count == 0 {
            return Err(Error::EmptyInput);
        }

        debug!("encoded {} symbols into {} bits", count, out.len());
        Ok(out)
    }
}

impl<Symbol> CodeTable<Symbol> {
    /// Look up the symbol whose code is exactly `code`.
    pub fn symbol(&self, code: &BitSlice<u8, Msb0>) -> Option<&Symbol> {
        self.decode_table.get(code)
    }

    /// Number of symbols with a code.
    pub fn len(&self) -> usize {
        self.encode_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encode_table.is_empty()
    }

    /// Entries ordered by code length, then by code bits.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &BitSlice<u8, Msb0>)> {
        let mut entries: Vec<_> = self
            .decode_table
            .iter()
            .map(|(code, symbol)| (symbol, code.as_bitslice()))
            .collect();
        entries.sort_by(|(_, a), (_, b)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        entries.into_iter()
    }

    /// True if no code is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let mut codes: Vec<_> = self.decode_table.keys().map(|c| c.as_bitslice()).collect();
        // lexicographic order puts every prefix directly before an extension of it
        codes.sort();
        codes.windows(2).all(|w| !w[1].starts_with(w[0]))
    }
}

/// Decodes bit strings by walking a Huffman tree.
#[derive(Debug, Clone)]
pub struct Decoder<Symbol> {
    tree: HuffmanTree<Symbol>,
}

impl<Symbol> Decoder<Symbol>
where
    Symbol: Clone,
{
    pub fn new(tree: HuffmanTree<Symbol>) -> Self {
        Self { tree }
    }

    /// Decode `input` completely.
    ///
    /// A bare leaf tree yields its symbol once per input bit. Otherwise
    /// each `0` descends left and each `1` right, emitting a symbol on every
    /// leaf. The input must end exactly on a leaf.
    pub fn decode(&self, input: &BitSlice<u8, Msb0>) -> Result<Vec<Symbol>> {
        if input.is_empty() {
            return Err(Error::EmptyInput);
        }

        let tree = &self.tree;
        if let Node::Leaf { symbol, .. } = tree.root() {
            return Ok(vec![symbol.clone(); input.len()]);
        }

        let root = tree.root_id();
        let mut out = Vec::new();
        let mut cursor = root;
        let mut code_start = 0;
        for (offset, bit) in input.iter().by_vals().enumerate() {
            if let Node::Internal { left, right, .. } = tree.node(cursor) {
                cursor = if bit { *right } else { *left };
            }
            if let Node::Leaf { symbol, .. } = tree.node(cursor) {
                out.push(symbol.clone());
                cursor = root;
                code_start = offset + 1;
            }
        }

        if code_start != input.len() {
            return Err(Error::CorruptPayload {
                offset: code_start,
                reason: "payload ends inside a code",
            });
        }

        debug!("decoded {} bits into {} symbols", input.len(), out.len());
        Ok(out)
    }
}
