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

//! Witness stacks attached to segregated witness transaction inputs.
//!
//! A witness is an ordered, fixed-size stack of opaque byte strings (pushes)
//! consumed by the script interpreter instead of being embedded into the
//! legacy `scriptSig`. This crate provides the stack data type, its canonical
//! consensus encoding and construction of the standard P2WPKH witness.

#[macro_use]
extern crate amplify;
#[cfg(feature = "serde")]
extern crate serde_crate as serde;

mod stack;
mod coders;
mod redeem;
#[cfg(feature = "serde")]
mod serde_utils;

pub use coders::{
    Decode, DecodeError, Encode, EncodeError, WitnessDataError, MAX_WITNESS_ALLOCATION,
};
pub use redeem::{p2wpkh_witness, PubkeySource, SigEncode, UncompressedKey};
pub use stack::{IncompleteWitness, IndexError, Iter, WitnessParseError, WitnessStack};
pub use bc::{
    secp256k1, CompressedPk, LegacyPk, LegacySig, SigError, SighashFlag, SighashType,
    UncompressedPk,
};
