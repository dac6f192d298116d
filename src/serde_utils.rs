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

//! Serde representation of witness stacks.
//!
//! Human-readable formats get a list of hex strings with `null` for unset
//! pushes; binary formats get a list of optional byte sequences.

use amplify::hex::{FromHex, ToHex};
use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::WitnessStack;

pub(crate) struct SerializeBytesAsHex<'a>(pub(crate) &'a [u8]);

impl Serialize for SerializeBytesAsHex<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        serializer.collect_str(&format_args!("{}", self.0.to_hex()))
    }
}

impl Serialize for WitnessStack {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        let human_readable = serializer.is_human_readable();
        let mut seq = serializer.serialize_seq(Some(self.push_count()))?;
        for push in self {
            if human_readable {
                seq.serialize_element(&push.map(SerializeBytesAsHex))?;
            } else {
                seq.serialize_element(&push)?;
            }
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for WitnessStack {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        if !deserializer.is_human_readable() {
            return Vec::<Option<Vec<u8>>>::deserialize(deserializer).map(WitnessStack::from_slots);
        }
        Vec::<Option<String>>::deserialize(deserializer)?
            .into_iter()
            .map(|slot| slot.map(|s| Vec::<u8>::from_hex(&s)).transpose())
            .collect::<Result<Vec<_>, _>>()
            .map(WitnessStack::from_slots)
            .map_err(|err| D::Error::custom(format!("invalid witness push hex encoding; {err}")))
    }
}

#[cfg(all(test, feature = "serde"))]
mod test {
    use super::*;

    fn stack() -> WitnessStack {
        WitnessStack::from_slots([Some(vec![0xDEu8, 0xAD]), None, Some(vec![])])
    }

    #[test]
    fn human_readable() {
        let json = serde_json::to_string(&stack()).unwrap();
        assert_eq!(json, r#"["dead",null,""]"#);
        assert_eq!(serde_json::from_str::<WitnessStack>(&json).unwrap(), stack());

        assert_eq!(serde_json::to_string(&WitnessStack::EMPTY).unwrap(), "[]");
        assert_eq!(serde_json::from_str::<WitnessStack>("[]").unwrap(), WitnessStack::EMPTY);
    }

    #[test]
    fn binary() {
        let data = bincode::serialize(&stack()).unwrap();
        assert_eq!(bincode::deserialize::<WitnessStack>(&data).unwrap(), stack());

        let data = bincode::serialize(&WitnessStack::EMPTY).unwrap();
        assert_eq!(bincode::deserialize::<WitnessStack>(&data).unwrap(), WitnessStack::EMPTY);
    }

    #[test]
    fn unset_differs_from_empty() {
        let unset = WitnessStack::new(1);
        let empty = WitnessStack::from_slots([Some(vec![])]);
        assert_eq!(serde_json::to_string(&unset).unwrap(), "[null]");
        assert_eq!(serde_json::to_string(&empty).unwrap(), r#"[""]"#);
        assert_ne!(bincode::serialize(&unset).unwrap(), bincode::serialize(&empty).unwrap());
    }

    #[test]
    fn invalid_hex() {
        let err = serde_json::from_str::<WitnessStack>(r#"["dead","xyz"]"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid witness push hex encoding; "));
    }
}
