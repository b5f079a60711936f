//! FITS structure reading and minimal FITS writing.
//!
//! Only headers are decoded. Data units are skipped by computing their size
//! from the mandatory keywords:
//!
//! ```text
//! bytes = |BITPIX| / 8 * GCOUNT * (PCOUNT + NAXIS1 * ... * NAXISn)
//! ```
//!
//! padded up to a whole number of 2880-byte blocks.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use skydm_types::FileKind;
use tracing::debug;

use crate::error::{FormatError, FormatResult};
use crate::header::{Card, Header, HeaderValue, CARD_LEN};
use crate::structure::{FitsStructure, Section, SectionKind};

/// Size of a FITS logical record.
pub const BLOCK_LEN: usize = 2880;

/// Name given to the first header/data unit.
pub const PRIMARY_NAME: &str = "PRIMARY";

/// Open a FITS file on disk and read its structure.
pub fn read_fits_file(path: &Path) -> FormatResult<FitsStructure> {
    let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
    read_fits(BufReader::new(file), path)
}

/// Read the structure of a FITS stream. `path` is used for error reporting.
pub fn read_fits<R: Read + Seek>(mut reader: R, path: &Path) -> FormatResult<FitsStructure> {
    let invalid = |reason: String| FormatError::invalid(path, FileKind::Fits, reason);
    let io_err = |e: io::Error| FormatError::io(path, e);

    let total = reader.seek(SeekFrom::End(0)).map_err(io_err)?;
    reader.seek(SeekFrom::Start(0)).map_err(io_err)?;
    if total == 0 {
        return Err(invalid("file is empty".into()));
    }

    let mut sections = Vec::new();
    let mut offset = 0u64;
    while offset < total {
        let index = sections.len();
        let mut block = vec![0u8; BLOCK_LEN];
        if let Err(e) = reader.read_exact(&mut block) {
            if index == 0 || e.kind() != io::ErrorKind::UnexpectedEof {
                return Err(invalid(format!("cannot read header {index}: {e}")));
            }
            debug!(path = %path.display(), offset, "ignoring trailing partial block");
            break;
        }

        let lead = if index == 0 { "SIMPLE  " } else { "XTENSION" };
        if !block.starts_with(lead.as_bytes()) {
            if index == 0 {
                return Err(invalid("first card is not SIMPLE".into()));
            }
            debug!(path = %path.display(), offset, "ignoring trailing bytes after last HDU");
            break;
        }

        let (header, blocks) = read_header(&mut reader, block).map_err(invalid)?;
        let data = data_len(&header).map_err(|reason| invalid(format!("HDU {index}: {reason}")))?;
        offset = padded(data)
            .and_then(|d| d.checked_add((blocks * BLOCK_LEN) as u64))
            .and_then(|n| n.checked_add(offset))
            .ok_or_else(|| invalid(format!("HDU {index}: data size overflows")))?;
        if offset > total {
            return Err(invalid(format!("HDU {index} data extends past the end of the file")));
        }
        reader.seek(SeekFrom::Start(offset)).map_err(io_err)?;

        let (name, kind) = if index == 0 {
            (PRIMARY_NAME.to_string(), SectionKind::Primary)
        } else {
            let name = header
                .get_str("EXTNAME")
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("HDU{index}"));
            let kind = SectionKind::from_xtension(header.get_str("XTENSION").unwrap_or_default());
            (name, kind)
        };
        sections.push(Section::from_header(name, kind, header));
    }

    debug!(path = %path.display(), hdus = sections.len(), "read FITS structure");
    Ok(FitsStructure::new(sections))
}

/// Parse header cards starting with `first` until the END card. Returns the
/// header and the number of blocks it occupied.
fn read_header<R: Read>(reader: &mut R, first: Vec<u8>) -> Result<(Header, usize), String> {
    let mut header = Header::new();
    let mut block = first;
    let mut blocks = 1;
    loop {
        for raw in block.chunks(CARD_LEN) {
            let raw = std::str::from_utf8(raw)
                .map_err(|_| "header contains non-ASCII characters".to_string())?;
            if raw.trim_end() == "END" {
                return Ok((header, blocks));
            }
            header.push(Card::parse(raw)?);
        }
        block = vec![0u8; BLOCK_LEN];
        reader
            .read_exact(&mut block)
            .map_err(|_| "header is missing its END card".to_string())?;
        blocks += 1;
    }
}

fn required_int(header: &Header, keyword: &str) -> Result<i64, String> {
    header
        .get_int(keyword)
        .ok_or_else(|| format!("missing or non-integer {keyword}"))
}

/// Unpadded data size in bytes.
fn data_len(header: &Header) -> Result<u64, String> {
    let bitpix = required_int(header, "BITPIX")?;
    if ![8, 16, 32, 64, -32, -64].contains(&bitpix) {
        return Err(format!("invalid BITPIX {bitpix}"));
    }
    let naxis = required_int(header, "NAXIS")?;
    if !(0..=999).contains(&naxis) {
        return Err(format!("invalid NAXIS {naxis}"));
    }
    if naxis == 0 {
        return Ok(0);
    }

    let mut elements: u64 = 1;
    for i in 1..=naxis {
        let keyword = format!("NAXIS{i}");
        let len = required_int(header, &keyword)?;
        let len = u64::try_from(len).map_err(|_| format!("negative {keyword}"))?;
        elements = elements
            .checked_mul(len)
            .ok_or_else(|| "data size overflows".to_string())?;
    }

    let pcount = header.get_int("PCOUNT").unwrap_or(0);
    let gcount = header.get_int("GCOUNT").unwrap_or(1);
    let pcount = u64::try_from(pcount).map_err(|_| "negative PCOUNT".to_string())?;
    let gcount = u64::try_from(gcount).map_err(|_| "negative GCOUNT".to_string())?;

    (bitpix.unsigned_abs() / 8)
        .checked_mul(gcount)
        .and_then(|n| pcount.checked_add(elements).and_then(|e| n.checked_mul(e)))
        .ok_or_else(|| "data size overflows".to_string())
}

fn padded(len: u64) -> Option<u64> {
    len.div_ceil(BLOCK_LEN as u64).checked_mul(BLOCK_LEN as u64)
}

fn block_aligned(len: usize) -> usize {
    len.div_ceil(BLOCK_LEN) * BLOCK_LEN
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct UnitSpec {
    mandatory: Vec<Card>,
    cards: Vec<Card>,
    data_len: u64,
}

/// Builder for small FITS files with a controlled structure.
///
/// Data units are zero-filled; only the layout is meaningful.
///
/// ```no_run
/// use skydm_format::{FitsBuilder, HeaderValue};
///
/// FitsBuilder::new()
///     .card("TELESCOP", HeaderValue::Str("SDSS 2.5-M".into()))
///     .image("FLUX", &[34, 34, 4563])
///     .bintable("SUMMARY", &["PLATEIFU", "Z"], 10)
///     .write("cube.fits")
///     .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct FitsBuilder {
    units: Vec<UnitSpec>,
}

impl Default for FitsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FitsBuilder {
    /// Start a file with an empty primary unit.
    pub fn new() -> Self {
        let mandatory = vec![
            Card::new("SIMPLE", HeaderValue::Bool(true)).with_comment("conforms to FITS standard"),
            Card::new("BITPIX", HeaderValue::Int(8)),
            Card::new("NAXIS", HeaderValue::Int(0)),
            Card::new("EXTEND", HeaderValue::Bool(true)),
        ];
        Self {
            units: vec![UnitSpec {
                mandatory,
                cards: Vec::new(),
                data_len: 0,
            }],
        }
    }

    /// Add a value card to the most recently added unit.
    pub fn card(mut self, keyword: &str, value: HeaderValue) -> Self {
        if let Some(unit) = self.units.last_mut() {
            unit.cards.push(Card::new(keyword, value));
        }
        self
    }

    /// Add a commentary card to the most recently added unit.
    pub fn comment(mut self, keyword: &str, text: &str) -> Self {
        if let Some(unit) = self.units.last_mut() {
            unit.cards.push(Card::commentary(keyword, text));
        }
        self
    }

    /// Append an 8-bit image extension with the given axis lengths.
    pub fn image(mut self, name: &str, axes: &[u64]) -> Self {
        let mut mandatory = vec![
            Card::new("XTENSION", HeaderValue::Str("IMAGE".into())).with_comment("image extension"),
            Card::new("BITPIX", HeaderValue::Int(8)),
            Card::new("NAXIS", HeaderValue::Int(axes.len() as i64)),
        ];
        for (i, len) in axes.iter().enumerate() {
            mandatory.push(Card::new(format!("NAXIS{}", i + 1), HeaderValue::Int(*len as i64)));
        }
        mandatory.push(Card::new("PCOUNT", HeaderValue::Int(0)));
        mandatory.push(Card::new("GCOUNT", HeaderValue::Int(1)));
        mandatory.push(Card::new("EXTNAME", HeaderValue::Str(name.to_string())));

        let data_len = if axes.is_empty() { 0 } else { axes.iter().product() };
        self.units.push(UnitSpec {
            mandatory,
            cards: Vec::new(),
            data_len,
        });
        self
    }

    /// Append a binary table extension of single-precision columns.
    pub fn bintable(mut self, name: &str, columns: &[&str], rows: u64) -> Self {
        let row_len = 4 * columns.len() as u64;
        let mut mandatory = vec![
            Card::new("XTENSION", HeaderValue::Str("BINTABLE".into()))
                .with_comment("binary table extension"),
            Card::new("BITPIX", HeaderValue::Int(8)),
            Card::new("NAXIS", HeaderValue::Int(2)),
            Card::new("NAXIS1", HeaderValue::Int(row_len as i64)),
            Card::new("NAXIS2", HeaderValue::Int(rows as i64)),
            Card::new("PCOUNT", HeaderValue::Int(0)),
            Card::new("GCOUNT", HeaderValue::Int(1)),
            Card::new("TFIELDS", HeaderValue::Int(columns.len() as i64)),
        ];
        for (i, column) in columns.iter().enumerate() {
            mandatory.push(Card::new(format!("TTYPE{}", i + 1), HeaderValue::Str(column.to_string())));
            mandatory.push(Card::new(format!("TFORM{}", i + 1), HeaderValue::Str("E".into())));
        }
        mandatory.push(Card::new("EXTNAME", HeaderValue::Str(name.to_string())));

        self.units.push(UnitSpec {
            mandatory,
            cards: Vec::new(),
            data_len: row_len * rows,
        });
        self
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for unit in &self.units {
            let start = out.len();
            for card in unit.mandatory.iter().chain(&unit.cards) {
                out.extend_from_slice(card.to_padded().as_bytes());
            }
            out.extend_from_slice(format!("{:<CARD_LEN$}", "END").as_bytes());
            let header_len = out.len() - start;
            out.resize(start + block_aligned(header_len), b' ');
            out.resize(out.len() + block_aligned(unit.data_len as usize), 0);
        }
        out
    }

    /// Write the file to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> FormatResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| FormatError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&self.to_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| FormatError::io(path, e))
    }
}
