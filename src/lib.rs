//! # Huffman coding
//!
//! Lossless entropy coding that gives shorter bit strings to more frequent
//! symbols.
//!
//! ```text
//! symbols -> FrequencyTable -> HuffmanTree -> CodeTable -> bits
//! bits + CodeTable -> HuffmanTree -> symbols
//! ```
//!
//! Every call owns its own frequency table, tree and code table; nothing is
//! shared between calls except what the caller passes along, so independent
//! inputs can be coded concurrently.
//!
//! ```
//! let input = b"aaabbc";
//! let (bits, table) = huffman_codec::encode(input)?;
//! assert_eq!(huffman_codec::decode(&bits, &table)?, input);
//! # Ok::<(), huffman_codec::Error>(())
//! ```

use std::hash::Hash;

use bitvec::prelude::*;

pub mod codec;
pub mod error;
pub mod frequency;
pub mod persist;
pub mod tree;

pub use codec::{Bits, Code, CodeTable, Decoder};
pub use error::{Error, Result};
pub use frequency::FrequencyTable;
pub use persist::EncodedPayload;
pub use tree::{HuffmanTree, Node, NodeId};

/// Encode `input`, returning the packed bits and the table needed to
/// decode them.
pub fn encode<Symbol>(input: &[Symbol]) -> Result<(Bits, CodeTable<Symbol>)>
where
    Symbol: Hash + Eq + Clone,
{
    let tree = HuffmanTree::from_symbols(input.iter().cloned())?;
    let table = CodeTable::from_tree(&tree);
    let bits = table.encode(input)?;
    Ok((bits, table))
}

/// Decode `payload` with `table`.
///
/// The table is validated and turned back into a tree before any bit is
/// read.
pub fn decode<Symbol>(payload: &BitSlice<u8, Msb0>, table: &CodeTable<Symbol>) -> Result<Vec<Symbol>>
where
    Symbol: Hash + Eq + Clone,
{
    if payload.is_empty() {
        return Err(Error::EmptyInput);
    }
    let tree = HuffmanTree::from_code_table(table)?;
    Decoder::new(tree).decode(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_scenario() {
        let input: Vec<char> = "aaabbc".chars().collect();
        let (bits, table) = encode(&input).unwrap();

        let len = |c| table.code(&c).unwrap().len();
        assert!(len('a') < len('b'));
        assert!(len('c') >= len('b'));
        assert_eq!(bits.len(), 3 + 2 * 2 + 2);

        assert_eq!(decode(&bits, &table).unwrap(), input);
    }

    #[test]
    fn encode_empty_input() {
        let err = encode::<u8>(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn decode_empty_payload() {
        let (_, table) = encode(b"ab").unwrap();

        let err = decode(BitSlice::empty(), &table).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn decode_checks_table_first() {
        let table = CodeTable::from_entries(vec![
            (b'a', bitbox![u8, Msb0; 0]),
            (b'b', bitbox![u8, Msb0; 0, 1]),
        ])
        .unwrap();

        let err = decode(bits![u8, Msb0; 0], &table).unwrap_err();
        assert!(matches!(err, Error::CorruptTable(_)));
    }
}
