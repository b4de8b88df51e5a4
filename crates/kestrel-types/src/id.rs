//! Base58-encoded 32-byte identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of every identifier digest.
pub const ID_LEN: usize = 32;

/// Errors from parsing an identifier string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
  #[error("empty {kind} id")]
  Empty { kind: &'static str },

  #[error("invalid {kind} id '{value}': {message}")]
  Malformed {
    kind: &'static str,
    value: String,
    message: String,
  },
}

fn decode(kind: &'static str, value: &str) -> Result<[u8; ID_LEN], IdError> {
  if value.is_empty() {
    return Err(IdError::Empty { kind });
  }
  let bytes = bs58::decode(value)
    .into_vec()
    .map_err(|e| IdError::Malformed {
      kind,
      value: value.to_string(),
      message: e.to_string(),
    })?;
  bytes.try_into().map_err(|bytes: Vec<u8>| IdError::Malformed {
    kind,
    value: value.to_string(),
    message: format!("expected {} bytes, got {}", ID_LEN, bytes.len()),
  })
}

macro_rules! digest_id {
  ($name:ident, $kind:literal) => {
    #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct $name([u8; ID_LEN]);

    impl $name {
      pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
      }

      pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
      }
    }

    impl FromStr for $name {
      type Err = IdError;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode($kind, s).map(Self)
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
      }
    }

    impl fmt::Debug for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", stringify!($name), self)
      }
    }

    impl Serialize for $name {
      fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
      }
    }

    impl<'de> Deserialize<'de> for $name {
      fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
      }
    }
  };
}

digest_id!(ContainerId, "container");
digest_id!(ObjectId, "object");
digest_id!(OwnerId, "owner");

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_display_round_trip() {
    let id = ObjectId::from_bytes([7u8; ID_LEN]);
    let parsed: ObjectId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);
  }

  #[test]
  fn test_rejects_malformed_ids() {
    assert_eq!(
      "".parse::<ContainerId>(),
      Err(IdError::Empty { kind: "container" })
    );
    // '0' is not in the base58 alphabet
    assert!(matches!(
      "0OIl".parse::<ContainerId>(),
      Err(IdError::Malformed { .. })
    ));
    // valid base58, wrong length
    assert!(matches!(
      "abc".parse::<ObjectId>(),
      Err(IdError::Malformed { kind: "object", .. })
    ));
  }

  #[test]
  fn test_serde_as_string() {
    let id = ContainerId::from_bytes([1u8; ID_LEN]);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", id));
    let back: ContainerId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
  }
}
