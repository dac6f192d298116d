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

//! Construction of witnesses for standard output templates.

use bc::secp256k1::PublicKey;
use bc::{CompressedPk, LegacyPk, LegacySig, UncompressedPk};

use crate::WitnessStack;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("P2WPKH witness can't be constructed for an uncompressed public key")]
pub struct UncompressedKey;

/// Signature which can be put into a witness push.
pub trait SigEncode {
    /// Canonical byte encoding of the signature, including sighash type byte
    /// when the signature type carries one.
    fn to_sig_bytes(&self) -> Vec<u8>;
}

impl SigEncode for LegacySig {
    fn to_sig_bytes(&self) -> Vec<u8> { self.to_vec() }
}

/// Already-encoded signature.
impl SigEncode for [u8] {
    fn to_sig_bytes(&self) -> Vec<u8> { self.to_vec() }
}

impl SigEncode for Vec<u8> {
    fn to_sig_bytes(&self) -> Vec<u8> { self.clone() }
}

/// Public key which can be put into a witness push.
pub trait PubkeySource {
    fn is_compressed(&self) -> bool;

    /// Raw key serialization in the form reported by
    /// [`PubkeySource::is_compressed`].
    fn to_pubkey_vec(&self) -> Vec<u8>;
}

impl PubkeySource for PublicKey {
    fn is_compressed(&self) -> bool { true }
    fn to_pubkey_vec(&self) -> Vec<u8> { self.serialize().to_vec() }
}

impl PubkeySource for CompressedPk {
    fn is_compressed(&self) -> bool { true }
    fn to_pubkey_vec(&self) -> Vec<u8> { self.to_byte_array().to_vec() }
}

impl PubkeySource for UncompressedPk {
    fn is_compressed(&self) -> bool { false }
    fn to_pubkey_vec(&self) -> Vec<u8> { self.to_byte_array().to_vec() }
}

impl PubkeySource for LegacyPk {
    fn is_compressed(&self) -> bool { self.compressed }
    fn to_pubkey_vec(&self) -> Vec<u8> { self.to_vec() }
}

/// Creates the witness redeeming a P2WPKH output: signature push followed by
/// the compressed public key push.
///
/// If no signature is given, a zero-length push is used in its place, giving
/// the witness of the final shape for fee estimation before signing.
///
/// # Errors
///
/// If the public key is not compressed; P2WPKH is defined only for compressed
/// keys.
pub fn p2wpkh_witness<S, P>(sig: Option<&S>, pk: &P) -> Result<WitnessStack, UncompressedKey>
where
    S: SigEncode + ?Sized,
    P: PubkeySource + ?Sized,
{
    if !pk.is_compressed() {
        return Err(UncompressedKey);
    }
    let sig = sig.map(S::to_sig_bytes).unwrap_or_default();
    Ok(WitnessStack::from_pushes([sig, pk.to_pubkey_vec()]))
}

impl WitnessStack {
    /// See [`p2wpkh_witness`].
    #[inline]
    pub fn redeem_p2wpkh<S, P>(sig: Option<&S>, pk: &P) -> Result<WitnessStack, UncompressedKey>
    where
        S: SigEncode + ?Sized,
        P: PubkeySource + ?Sized,
    {
        p2wpkh_witness(sig, pk)
    }

    /// P2WPKH witness with an empty placeholder instead of the signature.
    pub fn p2wpkh_placeholder<P>(pk: &P) -> Result<WitnessStack, UncompressedKey>
    where P: PubkeySource + ?Sized {
        p2wpkh_witness(None::<&[u8]>, pk)
    }
}
