use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// Number of leading characters that make up the short form of a container id.
pub const SHORT_ID_LEN: usize = 12;

/// A validated container identifier as reported by the stats source.
///
/// # Examples
///
/// ```
/// # use docker_librato::container::ContainerID;
/// let raw_id = "abcdef012345abcdef012345abcdef012345abcdef012345abcdef012345abcd";
/// let container_id = ContainerID::new(raw_id).unwrap();
/// assert_eq!(container_id.short(), "abcdef012345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyContainerID`] for an empty id and
    /// [`Error::InvalidContainerID`] if the length of the input exceeds
    /// [`CONTAINER_ID_MAX_LEN`] or it contains characters that would break
    /// the dotted metric path (`.`, `/`, whitespace).
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() {
            return Err(Error::EmptyContainerID);
        }
        if src.len() > CONTAINER_ID_MAX_LEN
            || src
                .chars()
                .any(|c| c == '.' || c == '/' || c.is_whitespace())
        {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    /// Returns the first [`SHORT_ID_LEN`] characters of the id, or the whole id
    /// if it is shorter.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_ID_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_truncates_to_twelve_chars() {
        let id = ContainerID::new(
            "abcdef012345abcdef012345abcdef012345abcdef012345abcdef012345abcd",
        )
        .unwrap();
        assert_eq!(id.short(), "abcdef012345");
    }

    #[test]
    fn test_short_id_keeps_short_input() {
        let id = ContainerID::new("abc").unwrap();
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn test_rejects_empty_id() {
        assert!(matches!(ContainerID::new(""), Err(Error::EmptyContainerID)));
    }

    #[test]
    fn test_rejects_path_separators() {
        assert!(matches!(
            ContainerID::new("abc.def"),
            Err(Error::InvalidContainerID(_))
        ));
        assert!(matches!(
            ContainerID::new("abc/def"),
            Err(Error::InvalidContainerID(_))
        ));
    }

    #[test]
    fn test_rejects_overlong_id() {
        let raw = "a".repeat(CONTAINER_ID_MAX_LEN + 1);
        assert!(matches!(
            ContainerID::new(raw),
            Err(Error::InvalidContainerID(_))
        ));
    }
}
