use std::{fmt, str::FromStr};

use thiserror::Error;

/// Physical arrangement of the vectors of a batch inside the shared buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StorageLayout {
    /// Each vector owns a stride-sized slot; slots are laid out end to end.
    #[default]
    Block,
    /// Element `j` of every vector is grouped together; vectors are spaced by the stride
    /// and consecutive elements of one vector by the increment.
    Interleave,
}

impl StorageLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageLayout::Block => "block",
            StorageLayout::Interleave => "interleave",
        }
    }
}

impl fmt::Display for StorageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized storage layout tag {tag:?} (expected \"block\" or \"interleave\")")]
pub struct ParseLayoutError {
    tag: String,
}

impl ParseLayoutError {
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl FromStr for StorageLayout {
    type Err = ParseLayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(StorageLayout::Block),
            "interleave" | "interleaved" => Ok(StorageLayout::Interleave),
            _ => Err(ParseLayoutError { tag: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_block() {
        assert_eq!(StorageLayout::default(), StorageLayout::Block);
    }

    #[test]
    fn parses_known_tags() {
        assert_eq!("block".parse(), Ok(StorageLayout::Block));
        assert_eq!(" Interleave ".parse(), Ok(StorageLayout::Interleave));
        assert_eq!("interleaved".parse(), Ok(StorageLayout::Interleave));
    }

    #[test]
    fn rejects_unknown_tags() {
        let err = "column".parse::<StorageLayout>().unwrap_err();
        assert_eq!(err.tag(), "column");
        assert!(err.to_string().contains("column"));
    }

    #[test]
    fn display_matches_parse() {
        for layout in [StorageLayout::Block, StorageLayout::Interleave] {
            assert_eq!(layout.to_string().parse::<StorageLayout>(), Ok(layout));
        }
    }
}
