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

use std::fmt::{self, Display, Formatter};
use std::iter::FusedIterator;
use std::slice;
use std::str::FromStr;

use amplify::hex::{self, FromHex, ToHex};

/// Token used by the string representation for a push which was never set.
const UNSET_TOKEN: &str = "NULL";

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("witness push index {index} lies outside of the stack with {count} pushes")]
pub struct IndexError {
    pub index: usize,
    pub count: usize,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("witness push #{0} is not set and the witness can't be consensus-encoded")]
pub struct IncompleteWitness(pub usize);

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum WitnessParseError {
    /// invalid hex encoding of witness push #{0} - {1}
    Hex(usize, hex::Error),
}

/// Witness data for a single transaction input.
///
/// The stack has a fixed number of push slots defined at construction time.
/// Each slot either holds a byte string (which may be zero-length) or is unset;
/// these two states are distinct and compare as unequal. Equality and hashing
/// are structural and sensitive to the order of the pushes.
///
/// A stack with unset slots can be inspected and displayed, but it can't be
/// consensus-encoded until every slot is set.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct WitnessStack {
    pushes: Vec<Option<Vec<u8>>>,
}

impl WitnessStack {
    /// Witness with zero pushes, used by inputs which do not spend segwit
    /// outputs.
    pub const EMPTY: Self = WitnessStack { pushes: Vec::new() };

    /// Constructs witness stack with `push_count` slots, none of which is set.
    pub fn new(push_count: usize) -> Self {
        WitnessStack {
            pushes: vec![None; push_count],
        }
    }

    /// Constructs fully-set witness stack out of the provided pushes, keeping
    /// their order.
    pub fn from_pushes<I>(pushes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Vec<u8>>,
    {
        WitnessStack {
            pushes: pushes.into_iter().map(|push| Some(push.into())).collect(),
        }
    }

    /// Constructs witness stack out of slots, where `None` marks an unset
    /// slot.
    pub fn from_slots(slots: impl IntoIterator<Item = Option<Vec<u8>>>) -> Self {
        WitnessStack {
            pushes: slots.into_iter().collect(),
        }
    }

    #[inline]
    pub fn push_count(&self) -> usize { self.pushes.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.pushes.is_empty() }

    /// Returns the push at `index`, or `None` if the slot was never set.
    ///
    /// # Errors
    ///
    /// If `index` is not less than [`Self::push_count`].
    pub fn push_at(&self, index: usize) -> Result<Option<&[u8]>, IndexError> {
        self.pushes
            .get(index)
            .map(Option::as_deref)
            .ok_or(IndexError {
                index,
                count: self.push_count(),
            })
    }

    /// Overwrites the push at `index`. Zero-length values are allowed and are
    /// different from an unset slot.
    ///
    /// # Errors
    ///
    /// If `index` is not less than [`Self::push_count`]; the stack is left
    /// unmodified.
    pub fn set_push(&mut self, index: usize, value: impl Into<Vec<u8>>) -> Result<(), IndexError> {
        let count = self.push_count();
        let slot = self.pushes.get_mut(index).ok_or(IndexError { index, count })?;
        *slot = Some(value.into());
        Ok(())
    }

    /// Index of the first slot which was never set, if any.
    pub fn first_unset(&self) -> Option<usize> { self.pushes.iter().position(Option::is_none) }

    /// Detects whether all slots of the stack are set.
    #[inline]
    pub fn is_complete(&self) -> bool { self.first_unset().is_none() }

    /// Checks that the stack is ready for the consensus encoding.
    pub fn check_complete(&self) -> Result<(), IncompleteWitness> {
        match self.first_unset() {
            Some(index) => Err(IncompleteWitness(index)),
            None => Ok(()),
        }
    }

    /// Converts the stack into the list of its pushes.
    pub fn into_pushes(self) -> Result<Vec<Vec<u8>>, IncompleteWitness> {
        self.pushes
            .into_iter()
            .enumerate()
            .map(|(index, push)| push.ok_or(IncompleteWitness(index)))
            .collect()
    }

    pub fn iter(&self) -> Iter<'_> { Iter(self.pushes.iter()) }
}

/// Iterator over witness stack slots in their consensus order.
#[derive(Clone, Debug)]
pub struct Iter<'a>(slice::Iter<'a, Option<Vec<u8>>>);

impl<'a> Iterator for Iter<'a> {
    type Item = Option<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> { self.0.next().map(Option::as_deref) }

    fn size_hint(&self) -> (usize, Option<usize>) { self.0.size_hint() }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> { self.0.next_back().map(Option::as_deref) }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a WitnessStack {
    type Item = Option<&'a [u8]>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl TryFrom<WitnessStack> for bc::Witness {
    type Error = IncompleteWitness;

    fn try_from(stack: WitnessStack) -> Result<Self, Self::Error> {
        stack.into_pushes().map(|pushes| bc::Witness::from_consensus_stack(pushes))
    }
}

/// Debug representation: hex of each push separated by a single space, with
/// `NULL` standing for an unset slot. A zero-length push produces an empty
/// token.
impl Display for WitnessStack {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, push) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            match push {
                Some(data) => f.write_str(&data.to_hex())?,
                None => f.write_str(UNSET_TOKEN)?,
            }
        }
        Ok(())
    }
}

/// Parses the [`Display`] representation back. An empty string is parsed as
/// [`WitnessStack::EMPTY`], thus a stack made of a single zero-length push
/// does not survive the round trip.
impl FromStr for WitnessStack {
    type Err = WitnessParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(WitnessStack::EMPTY);
        }
        s.split(' ')
            .enumerate()
            .map(|(index, token)| match token {
                UNSET_TOKEN => Ok(None),
                _ => Vec::<u8>::from_hex(token)
                    .map(Some)
                    .map_err(|err| WitnessParseError::Hex(index, err)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(WitnessStack::from_slots)
    }
}
