//! MessagePack persistence for code tables and encoded payloads.
//!
//! Bit strings are stored as a bit length plus the packed bytes, most
//! significant bit first. Unused trailing bits of the last byte are zero.

use std::hash::Hash;
use std::io::{Read, Write};

use bitvec::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec::{Bits, Code, CodeTable};
use crate::error::{Error, Result};

fn pack(bits: &BitSlice<u8, Msb0>) -> (usize, Box<[u8]>) {
    let mut bv = Bits::from_bitslice(bits);
    bv.set_uninitialized(false);
    (bv.len(), bv.into_vec().into_boxed_slice())
}

fn unpack(len: usize, bytes: Box<[u8]>) -> Option<Bits> {
    if bytes.len() != len.div_ceil(8) {
        return None;
    }
    let mut bv = Bits::from_vec(bytes.into_vec());
    bv.truncate(len);
    Some(bv)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SerializableCodeTable<Symbol> {
    entries: Vec<(Symbol, (usize, Box<[u8]>))>,
}

impl<'a, Symbol> From<&'a CodeTable<Symbol>> for SerializableCodeTable<Symbol>
where
    Symbol: Clone,
{
    fn from(other: &'a CodeTable<Symbol>) -> Self {
        Self {
            entries: other
                .iter()
                .map(|(symbol, code)| (symbol.clone(), pack(code)))
                .collect(),
        }
    }
}

impl<Symbol> TryFrom<SerializableCodeTable<Symbol>> for CodeTable<Symbol>
where
    Symbol: Hash + Eq + Clone,
{
    type Error = Error;

    fn try_from(other: SerializableCodeTable<Symbol>) -> Result<Self> {
        let entries = other
            .entries
            .into_iter()
            .map(|(symbol, (len, bytes))| {
                let code: Code = unpack(len, bytes)
                    .ok_or(Error::CorruptTable("code length does not match its bytes"))?
                    .into_boxed_bitslice();
                Ok((symbol, code))
            })
            .collect::<Result<Vec<_>>>()?;

        CodeTable::from_entries(entries)
    }
}

impl<Symbol> CodeTable<Symbol>
where
    Symbol: Hash + Eq + Clone + Serialize + DeserializeOwned,
{
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(&SerializableCodeTable::from(self))?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let packed: SerializableCodeTable<Symbol> = rmp_serde::from_slice(data)?;
        packed.try_into()
    }

    /// Write the table to `writer` and flush it.
    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        rmp_serde::encode::write(&mut writer, &SerializableCodeTable::from(self))?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from(reader: impl Read) -> Result<Self> {
        let packed: SerializableCodeTable<Symbol> = rmp_serde::decode::from_read(reader)?;
        packed.try_into()
    }
}

/// An encoded bit string with its exact length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPayload {
    bit_len: usize,
    data: Box<[u8]>,
}

impl EncodedPayload {
    pub fn new(bits: &BitSlice<u8, Msb0>) -> Self {
        let (bit_len, data) = pack(bits);
        Self { bit_len, data }
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn into_bits(self) -> Result<Bits> {
        let Self { bit_len, data } = self;
        unpack(bit_len, data).ok_or(Error::CorruptPayload {
            offset: 0,
            reason: "bit length does not match the packed bytes",
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(data)?)
    }

    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        rmp_serde::encode::write(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from(reader: impl Read) -> Result<Self> {
        Ok(rmp_serde::decode::from_read(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::HuffmanTree;

    #[test]
    fn pack_clears_trailing_bits() {
        let mut bits = bitvec![u8, Msb0; 1, 0, 1];
        bits.push(true);
        bits.truncate(3);

        let (len, bytes) = pack(&bits);
        assert_eq!(len, 3);
        assert_eq!(&*bytes, &[0b1010_0000]);
    }

    #[test]
    fn unpack_checks_byte_count() {
        assert!(unpack(9, vec![0xff].into_boxed_slice()).is_none());
        assert!(unpack(8, vec![0xff, 0x00].into_boxed_slice()).is_none());
        assert_eq!(unpack(0, Box::new([])), Some(Bits::new()));
    }

    #[test]
    fn code_table_survives_persistence() {
        let tree = HuffmanTree::from_symbols(b"mississippi river".iter().copied()).unwrap();
        let table = CodeTable::from_tree(&tree);

        let bytes = table.to_bytes().unwrap();
        let restored = CodeTable::<u8>::from_bytes(&bytes).unwrap();

        assert_eq!(restored, table);
    }

    #[test]
    fn single_symbol_table_survives_persistence() {
        let table = CodeTable::from_tree(&HuffmanTree::from_symbols("zzz".chars()).unwrap());

        let mut buf = Vec::new();
        table.write_to(&mut buf).unwrap();
        let restored = CodeTable::<char>::read_from(buf.as_slice()).unwrap();

        assert_eq!(restored.code(&'z'), Some(bits![u8, Msb0; 0]));
    }

    #[test]
    fn table_with_mismatched_code_length_is_corrupt() {
        let packed = SerializableCodeTable {
            entries: vec![('a', (12, vec![0u8].into_boxed_slice()))],
        };
        let bytes = rmp_serde::to_vec(&packed).unwrap();

        let err = CodeTable::<char>::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::CorruptTable(_)));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = CodeTable::<u8>::from_bytes(&[0xc1, 0x00]).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn payload_keeps_exact_bit_length() {
        let bits = bitvec![u8, Msb0; 1, 1, 0, 1, 0, 0, 1, 0, 1, 1];
        let payload = EncodedPayload::new(&bits);

        let restored = EncodedPayload::from_bytes(&payload.to_bytes().unwrap()).unwrap();

        assert_eq!(restored.bit_len(), 10);
        assert_eq!(restored.into_bits().unwrap(), bits);
    }

    #[test]
    fn payload_with_missing_bytes_is_corrupt() {
        let payload = EncodedPayload {
            bit_len: 17,
            data: vec![0u8; 2].into_boxed_slice(),
        };

        assert!(matches!(payload.into_bits(), Err(Error::CorruptPayload { .. })));
    }
}
