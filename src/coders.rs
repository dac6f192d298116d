// Bitcoin segregated witness stacks and their consensus encoding.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2020-2024 by
//     Dr Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// Copyright (C) 2020-2024 LNP/BP Standards Association. All rights reserved.
// Copyright (C) 2020-2024 Dr Maxim Orlovsky. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io::{self, Cursor, Read, Write};

use amplify::IoError;
use bc::{ConsensusDataError, ConsensusDecode, ConsensusDecodeError, ConsensusEncode, VarInt};

use crate::{IncompleteWitness, WitnessStack};

/// Maximum number of bytes a single witness decoding may allocate; matches the
/// maximum block weight.
pub const MAX_WITNESS_ALLOCATION: usize = 4_000_000;

#[derive(Clone, PartialEq, Eq, Debug, Display, Error, From)]
#[display(inner)]
pub enum EncodeError {
    #[from]
    #[from(io::Error)]
    Io(IoError),

    #[from]
    Incomplete(IncompleteWitness),
}

#[derive(Clone, PartialEq, Eq, Debug, Display, Error, From)]
#[display(inner)]
pub enum DecodeError {
    #[from]
    #[from(io::Error)]
    Io(IoError),

    #[from]
    #[from(ConsensusDataError)]
    Data(WitnessDataError),
}

impl From<ConsensusDecodeError> for DecodeError {
    fn from(e: ConsensusDecodeError) -> Self {
        match e {
            ConsensusDecodeError::Io(e) => DecodeError::Io(e),
            ConsensusDecodeError::Data(data) => data.into(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum WitnessDataError {
    #[from]
    #[display(inner)]
    Consensus(ConsensusDataError),

    /// witness data require allocation of {0} bytes exceeding the 4000000 bytes limit.
    OversizedAllocation(u64),

    /// witness data are followed by some excessive bytes.
    DataNotConsumed,
}

pub trait Encode {
    /// Writes consensus encoding into the `writer`, returning the number of
    /// bytes written.
    fn encode(&self, writer: &mut impl Write) -> Result<usize, EncodeError>;
}

pub trait Decode
where Self: Sized
{
    fn decode(reader: &mut impl Read) -> Result<Self, DecodeError>;

    /// Decodes the value from a byte slice, requiring all of the bytes to be
    /// consumed.
    fn deserialize(bytes: impl AsRef<[u8]>) -> Result<Self, DecodeError> {
        let bytes = bytes.as_ref();
        let mut cursor = Cursor::new(bytes);
        let me = Self::decode(&mut cursor)?;
        if cursor.position() != bytes.len() as u64 {
            return Err(WitnessDataError::DataNotConsumed.into());
        }
        Ok(me)
    }
}

/// Encodes as `VARINT(push_count)` followed by `VARINT(len) || bytes` for each
/// push in slot order. Nothing is written if any of the slots is unset.
impl Encode for WitnessStack {
    fn encode(&self, writer: &mut impl Write) -> Result<usize, EncodeError> {
        self.check_complete()?;

        let mut counter = VarInt::with(self.push_count()).consensus_encode(writer)?;
        for push in self.iter().flatten() {
            counter += VarInt::with(push.len()).consensus_encode(writer)?;
            writer.write_all(push)?;
            counter += push.len();
        }

        Ok(counter)
    }
}

impl Decode for WitnessStack {
    fn decode(reader: &mut impl Read) -> Result<Self, DecodeError> {
        let count = VarInt::consensus_decode(reader)?.to_u64();
        // each push takes at least one byte of its length prefix
        let mut allocated = check_allocation(0, count)?;

        let pushes = (0..count)
            .map(|_| -> Result<Vec<u8>, DecodeError> {
                let len = VarInt::consensus_decode(reader)?.to_u64();
                allocated = check_allocation(allocated, len)?;
                let mut push = vec![0u8; len as usize];
                reader.read_exact(&mut push)?;
                Ok(push)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(WitnessStack::from_pushes(pushes))
    }
}

fn check_allocation(allocated: u64, add: u64) -> Result<u64, WitnessDataError> {
    match allocated.checked_add(add) {
        Some(total) if total <= MAX_WITNESS_ALLOCATION as u64 => Ok(total),
        Some(total) => Err(WitnessDataError::OversizedAllocation(total)),
        None => Err(WitnessDataError::OversizedAllocation(u64::MAX)),
    }
}

impl WitnessStack {
    /// Length of the consensus encoding of the stack.
    pub fn serialized_len(&self) -> Result<usize, IncompleteWitness> {
        self.check_complete()?;
        let pushes_len = self
            .iter()
            .flatten()
            .map(|push| VarInt::with(push.len()).len() + push.len())
            .sum::<usize>();
        Ok(VarInt::with(self.push_count()).len() + pushes_len)
    }

    /// Produces consensus encoding of the stack, used both in the network
    /// transaction serialization and in the witness transaction id.
    pub fn serialize(&self) -> Result<Vec<u8>, IncompleteWitness> {
        // `serialized_len` has already checked that all slots are set
        let mut buf = Vec::with_capacity(self.serialized_len()?);
        self.encode(&mut buf).expect("in-memory writing can't fail");
        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink is closed"))
        }

        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    fn roundtrip(stack: &WitnessStack) {
        let data = stack.serialize().unwrap();
        assert_eq!(data.len(), stack.serialized_len().unwrap());
        assert_eq!(&WitnessStack::deserialize(&data).unwrap(), stack);
    }

    #[test]
    fn empty_witness() {
        assert_eq!(WitnessStack::EMPTY.serialize().unwrap(), vec![0x00]);
        assert_eq!(WitnessStack::new(0).serialize().unwrap(), vec![0x00]);
        assert_eq!(WitnessStack::deserialize([0x00u8]).unwrap(), WitnessStack::EMPTY);
    }

    #[test]
    fn encoding_layout() {
        let stack = WitnessStack::from_pushes([vec![0xAAu8, 0xBB], vec![], vec![0xCCu8]]);
        assert_eq!(stack.serialize().unwrap(), vec![
            0x03, 0x02, 0xAA, 0xBB, 0x00, 0x01, 0xCC
        ]);

        let mut buf = Vec::<u8>::new();
        assert_eq!(stack.encode(&mut buf).unwrap(), 7);
        assert_eq!(buf, stack.serialize().unwrap());
    }

    #[test]
    fn long_push_prefix() {
        let stack = WitnessStack::from_pushes([vec![0x5Au8; 253]]);
        let data = stack.serialize().unwrap();
        assert_eq!(&data[..4], &[0x01, 0xFD, 0xFD, 0x00]);
        assert_eq!(data.len(), 4 + 253);
        roundtrip(&stack);
    }

    #[test]
    fn roundtrips() {
        roundtrip(&WitnessStack::EMPTY);
        roundtrip(&WitnessStack::from_pushes([Vec::<u8>::new()]));
        roundtrip(&WitnessStack::from_pushes([vec![], vec![0x01u8], vec![]]));
        roundtrip(&WitnessStack::from_pushes([vec![0x30u8; 72], vec![0x02u8; 33]]));
        roundtrip(&WitnessStack::from_pushes((0..300u16).map(|n| vec![n as u8; n as usize % 7])));
        roundtrip(&WitnessStack::from_pushes([vec![0xFFu8; 70_000]]));
    }

    #[test]
    fn order_changes_encoding() {
        let a = WitnessStack::from_pushes([vec![0x01u8], vec![0x02u8, 0x03]]);
        let b = WitnessStack::from_pushes([vec![0x02u8, 0x03], vec![0x01u8]]);
        assert_ne!(a.serialize().unwrap(), b.serialize().unwrap());
    }

    #[test]
    fn incomplete_witness() {
        let mut stack = WitnessStack::new(2);
        stack.set_push(0, vec![0x01u8]).unwrap();

        assert_eq!(stack.serialize(), Err(IncompleteWitness(1)));
        assert_eq!(stack.serialized_len(), Err(IncompleteWitness(1)));

        let mut buf = Vec::<u8>::new();
        assert_eq!(stack.encode(&mut buf), Err(EncodeError::Incomplete(IncompleteWitness(1))));
        assert!(buf.is_empty());

        // even a closed sink reports the missing push first
        assert_eq!(
            stack.encode(&mut ClosedSink),
            Err(EncodeError::Incomplete(IncompleteWitness(1)))
        );
    }

    #[test]
    fn sink_failure() {
        let stack = WitnessStack::from_pushes([vec![0x01u8]]);
        assert!(matches!(stack.encode(&mut ClosedSink), Err(EncodeError::Io(_))));
    }

    #[test]
    fn excessive_data() {
        assert_eq!(
            WitnessStack::deserialize([0x01u8, 0x01, 0xAA, 0x00]),
            Err(DecodeError::Data(WitnessDataError::DataNotConsumed))
        );
    }

    #[test]
    fn truncated_data() {
        assert!(matches!(WitnessStack::deserialize([0u8; 0]), Err(DecodeError::Io(_))));
        assert!(matches!(WitnessStack::deserialize([0x02u8, 0x01, 0xAA]), Err(DecodeError::Io(_))));
        assert!(matches!(
            WitnessStack::deserialize([0x01u8, 0x03, 0xAA, 0xBB]),
            Err(DecodeError::Io(_))
        ));
    }

    #[test]
    fn non_minimal_varint() {
        let err = DecodeError::Data(WitnessDataError::Consensus(ConsensusDataError::NonMinimalVarInt));
        // push count of 1 written with a three-byte prefix
        assert_eq!(
            WitnessStack::deserialize([0xFDu8, 0x01, 0x00]),
            Err(err.clone())
        );
        // push length of 5 written with a three-byte prefix
        assert_eq!(
            WitnessStack::deserialize([0x01u8, 0xFD, 0x05, 0x00, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE]),
            Err(err)
        );
    }

    #[test]
    fn oversized_allocation() {
        assert_eq!(
            WitnessStack::deserialize([0xFEu8, 0xFF, 0xFF, 0xFF, 0xFF]),
            Err(DecodeError::Data(WitnessDataError::OversizedAllocation(0xFFFF_FFFF)))
        );
        // one push of 0x00500000 bytes
        assert_eq!(
            WitnessStack::deserialize([0x01u8, 0xFE, 0x00, 0x00, 0x50, 0x00]),
            Err(DecodeError::Data(WitnessDataError::OversizedAllocation(0x0050_0001)))
        );
    }

    #[test]
    fn consensus_witness() {
        let stack = WitnessStack::from_pushes([vec![0x30u8, 0x01], vec![0x02u8]]);
        let witness = bc::Witness::try_from(stack).unwrap();
        assert_eq!(
            witness,
            bc::Witness::from_consensus_stack(vec![vec![0x30u8, 0x01], vec![0x02u8]])
        );

        assert_eq!(bc::Witness::try_from(WitnessStack::new(1)), Err(IncompleteWitness(0)));
    }
}
