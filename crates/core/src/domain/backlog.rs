use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

/// Width of an encoded entry key.
pub const KEY_LEN: usize = 8;

/// Store-assigned identifier of a backlog entry.
///
/// Ids are minted from a per-bucket sequence and never reused. On disk they are
/// stored as big-endian bytes so that byte order and numeric order agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u64);

impl EntryId {
    pub fn to_key_bytes(self) -> [u8; KEY_LEN] {
        self.0.to_be_bytes()
    }

    pub fn from_key_bytes(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(u64::from_be_bytes(raw)))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // `u64::from_str` tolerates a leading `+`; ids are plain digits.
        if value.starts_with('+') {
            return Err(DomainError::InvalidArgument(format!(
                "`{value}` is not a valid entry id (unexpected sign)"
            )));
        }

        value.parse::<u64>().map(Self).map_err(|error| {
            DomainError::InvalidArgument(format!("`{value}` is not a valid entry id ({error})"))
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacklogEntry {
    pub id: EntryId,
    pub name: String,
}

impl BacklogEntry {
    pub fn new(id: EntryId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::{EntryId, KEY_LEN};
    use crate::errors::DomainError;

    #[test]
    fn key_bytes_are_big_endian() {
        assert_eq!(EntryId(1).to_key_bytes(), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(EntryId(256).to_key_bytes(), [0, 0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn key_byte_order_matches_numeric_order() {
        let ids = [0_u64, 1, 2, 255, 256, 257, 65_535, 65_536, u32::MAX as u64, u64::MAX];
        for pair in ids.windows(2) {
            let lower = EntryId(pair[0]).to_key_bytes();
            let upper = EntryId(pair[1]).to_key_bytes();
            assert!(lower < upper, "{} should sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn from_key_bytes_rejects_wrong_width() {
        assert_eq!(EntryId::from_key_bytes(&EntryId(42).to_key_bytes()), Some(EntryId(42)));
        assert_eq!(EntryId::from_key_bytes(&[0; KEY_LEN - 1]), None);
        assert_eq!(EntryId::from_key_bytes(&[0; KEY_LEN + 1]), None);
    }

    #[test]
    fn parses_unsigned_ids_only() {
        assert_eq!("17".parse::<EntryId>(), Ok(EntryId(17)));
        assert!(matches!("abc".parse::<EntryId>(), Err(DomainError::InvalidArgument(_))));
        assert!(matches!("-1".parse::<EntryId>(), Err(DomainError::InvalidArgument(_))));
        assert!(matches!(" 1".parse::<EntryId>(), Err(DomainError::InvalidArgument(_))));
        assert!(matches!("".parse::<EntryId>(), Err(DomainError::InvalidArgument(_))));
        assert!(matches!("+5".parse::<EntryId>(), Err(DomainError::InvalidArgument(_))));
    }
}
