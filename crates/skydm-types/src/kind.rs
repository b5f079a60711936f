//! File kinds and product datatypes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The structural kinds of file that can be opened and diffed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A FITS file: an ordered list of header/data units.
    Fits,
    /// A row/column catalog (CSV).
    Catalog,
}

impl FileKind {
    /// The lowercase label used in product definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fits => "fits",
            Self::Catalog => "catalog",
        }
    }

    /// Human-readable name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Fits => "FITS",
            Self::Catalog => "catalog",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for FileKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fits" => Ok(Self::Fits),
            "catalog" | "csv" => Ok(Self::Catalog),
            other => Err(TypeError::UnknownFileKind(other.to_string())),
        }
    }
}

/// The datatype declared by a product definition.
///
/// `fits` and `catalog` products are backed by real files; anything else is
/// kept verbatim and expands to placeholder objects.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Datatype {
    Fits,
    Catalog,
    Other(String),
}

impl Datatype {
    /// The file kind backing this datatype, if any.
    pub fn file_kind(&self) -> Option<FileKind> {
        match self {
            Self::Fits => Some(FileKind::Fits),
            Self::Catalog => Some(FileKind::Catalog),
            Self::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Fits => "fits",
            Self::Catalog => "catalog",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Datatype {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "fits" => Self::Fits,
            "catalog" => Self::Catalog,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Datatype {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Datatype> for String {
    fn from(value: Datatype) -> Self {
        value.as_str().to_string()
    }
}

impl From<FileKind> for Datatype {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::Fits => Self::Fits,
            FileKind::Catalog => Self::Catalog,
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_parses_case_insensitively() {
        assert_eq!("FITS".parse::<FileKind>().unwrap(), FileKind::Fits);
        assert_eq!(" catalog ".parse::<FileKind>().unwrap(), FileKind::Catalog);
        assert!("image".parse::<FileKind>().is_err());
    }

    #[test]
    fn datatype_maps_to_file_kind() {
        assert_eq!(Datatype::from("fits").file_kind(), Some(FileKind::Fits));
        assert_eq!(Datatype::from("Catalog").file_kind(), Some(FileKind::Catalog));
        assert_eq!(Datatype::from("image").file_kind(), None);
    }

    #[test]
    fn datatype_keeps_unknown_label() {
        let dt = Datatype::from("spectrum");
        assert_eq!(dt, Datatype::Other("spectrum".into()));
        assert_eq!(dt.to_string(), "spectrum");
    }

    #[test]
    fn datatype_serde_roundtrip() {
        let dt: Datatype = serde_json::from_str("\"fits\"").unwrap();
        assert_eq!(dt, Datatype::Fits);
        assert_eq!(serde_json::to_string(&Datatype::Catalog).unwrap(), "\"catalog\"");
    }
}
