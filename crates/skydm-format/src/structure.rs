//! The structure of a file: what a diff compares.

use skydm_types::FileKind;

use crate::header::Header;

/// Kind of a header/data unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SectionKind {
    Primary,
    Image,
    BinTable,
    AsciiTable,
    /// Any other `XTENSION` value.
    Other(String),
}

impl SectionKind {
    pub(crate) fn from_xtension(xtension: &str) -> Self {
        match xtension.trim() {
            "IMAGE" => Self::Image,
            "BINTABLE" => Self::BinTable,
            "TABLE" => Self::AsciiTable,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Primary => "PrimaryHDU",
            Self::Image => "ImageHDU",
            Self::BinTable => "BinTableHDU",
            Self::AsciiTable => "TableHDU",
            Self::Other(x) => x,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Self::BinTable | Self::AsciiTable)
    }
}

/// One header/data unit of a FITS file.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    /// `PRIMARY` for the first unit, otherwise `EXTNAME` or `HDU<n>`.
    pub name: String,
    pub kind: SectionKind,
    pub header: Header,
    /// `NAXISn` values, in axis order.
    pub dimensions: Vec<u64>,
    /// `TTYPEn` values for table units.
    pub columns: Vec<String>,
}

impl Section {
    /// Build a section, deriving dimensions and column names from `header`.
    pub fn from_header(name: impl Into<String>, kind: SectionKind, header: Header) -> Self {
        let naxis = header.get_int("NAXIS").unwrap_or(0).max(0);
        let dimensions = (1..=naxis)
            .map(|i| header.get_int(&format!("NAXIS{i}")).unwrap_or(0).max(0) as u64)
            .collect();
        let columns = if kind.is_table() {
            let tfields = header.get_int("TFIELDS").unwrap_or(0).max(0);
            (1..=tfields)
                .map(|i| {
                    header
                        .get_str(&format!("TTYPE{i}"))
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("col{i}"))
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            name: name.into(),
            kind,
            header,
            dimensions,
            columns,
        }
    }

    /// Number of rows for table units.
    pub fn rows(&self) -> Option<u64> {
        self.kind.is_table().then(|| self.dimensions.get(1).copied().unwrap_or(0))
    }
}

/// The header/data unit layout of a FITS file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FitsStructure {
    pub sections: Vec<Section>,
}

impl FitsStructure {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Section names in file order.
    pub fn names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    /// Section by name, case-insensitive.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn primary(&self) -> Option<&Section> {
        self.sections.first()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// First binary or ASCII table unit, if any.
    pub fn first_table(&self) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind.is_table())
    }
}

/// The column layout and size of a catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogStructure {
    pub columns: Vec<String>,
    pub rows: usize,
}

impl CatalogStructure {
    pub fn new(columns: Vec<String>, rows: usize) -> Self {
        Self { columns, rows }
    }
}

/// The structure of an opened file.
#[derive(Clone, Debug, PartialEq)]
pub enum FileStructure {
    Fits(FitsStructure),
    Catalog(CatalogStructure),
}

impl FileStructure {
    pub fn kind(&self) -> FileKind {
        match self {
            Self::Fits(_) => FileKind::Fits,
            Self::Catalog(_) => FileKind::Catalog,
        }
    }

    pub fn as_fits(&self) -> Option<&FitsStructure> {
        match self {
            Self::Fits(f) => Some(f),
            Self::Catalog(_) => None,
        }
    }

    pub fn as_catalog(&self) -> Option<&CatalogStructure> {
        match self {
            Self::Catalog(c) => Some(c),
            Self::Fits(_) => None,
        }
    }

    /// A line-oriented listing of the structure, suitable for a text diff.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Fits(fits) => {
                for (index, section) in fits.sections.iter().enumerate() {
                    let dims = section
                        .dimensions
                        .iter()
                        .map(u64::to_string)
                        .collect::<Vec<_>>()
                        .join(" x ");
                    out.push_str(&format!(
                        "HDU {index}: {} ({}) [{dims}]\n",
                        section.name,
                        section.kind.as_str()
                    ));
                    for card in section.header.cards() {
                        out.push_str(&format!("    {}\n", card.to_string().trim_end()));
                    }
                }
            }
            Self::Catalog(catalog) => {
                out.push_str(&format!("rows: {}\n", catalog.rows));
                for column in &catalog.columns {
                    out.push_str(&format!("column: {column}\n"));
                }
            }
        }
        out
    }
}
