/// Level codes: `;`-separated text snapshots of a grid.
///
/// The first field is a format tag looked up in the registry. Built-in formats:
/// - **V1**: plain decimal fields
/// - **V3**: base-74 sizes and run-length cell values
/// - **J1**: auto-detects the text and binary variants on import, writes binary
/// - **J1T**: the text variant of J1 (writes `J1;` codes)
///
/// Importers fill a fresh grid and report a `ParseError`; the dispatcher wraps
/// any failure as `LevelCodeError::Unknown` so callers get one error type.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::game::cells::core::LEGACY_CELLS;
use crate::game::coord::Position;
use crate::game::grid::CellGrid;
use crate::game::registry::{CellTypeKey, Registry};

pub mod numeral;
mod j1;
mod j1_binary;
mod v1;
mod v3;


pub use numeral::{NumeralCodec, NumeralError};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("field {0} is missing")]
    MissingField(usize),
    #[error("'{0}' is not an integer")]
    BadInteger(String),
    #[error("cell data ended unexpectedly")]
    UnexpectedEnd,
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),
    #[error(transparent)]
    Numeral(#[from] NumeralError),
    #[error("no legacy cell type with index {0}")]
    UnknownCellIndex(u64),
    #[error("cell type '{0}' is not registered")]
    UnknownCellType(String),
    #[error("cell data could not be inflated: {0}")]
    Inflate(#[from] std::io::Error),
    #[error("cell data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unexpected tag byte 0x{0:02x}")]
    BadTag(u8),
    #[error("cell data inflates past {limit} bytes")]
    TooLarge { limit: usize },
}

#[derive(Debug, Error)]
pub enum LevelCodeError {
    #[error("no level code format named '{0}'")]
    UnknownFormat(String),
    #[error("level code could not be read: {0}")]
    Unknown(#[from] ParseError),
    #[error("{format} cannot encode this grid: {reason}")]
    ExportUnsupported { format: String, reason: String },
    #[error("format '{0}' has no exporter")]
    NotExportable(String),
}

// ============================================================================
// Formats
// ============================================================================

/// Fills `grid` from the already split fields of a code (field 0 is the tag).
pub type ImportFn = fn(&[&str], &mut CellGrid) -> Result<(), ParseError>;
pub type ExportFn = fn(&CellGrid) -> Result<String, LevelCodeError>;

#[derive(Clone, Debug)]
pub struct LevelCodeFormat {
    pub id: String,
    pub import: Option<ImportFn>,
    pub export: Option<ExportFn>,
}

impl LevelCodeFormat {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), import: None, export: None }
    }

    pub fn importer(mut self, import: ImportFn) -> Self {
        self.import = Some(import);
        self
    }

    pub fn exporter(mut self, export: ExportFn) -> Self {
        self.export = Some(export);
        self
    }
}

pub fn register_builtin_formats(registry: &mut Registry) {
    registry.register_level_code(LevelCodeFormat::new("V1").importer(v1::import).exporter(v1::export));
    registry.register_level_code(LevelCodeFormat::new("V3").importer(v3::import).exporter(v3::export));
    registry.register_level_code(LevelCodeFormat::new("J1").importer(import_j1).exporter(j1_binary::export));
    registry.register_level_code(LevelCodeFormat::new("J1T").importer(j1::import).exporter(j1::export));
}

/// Both J1 variants share a tag; the binary one has exactly four fields.
fn import_j1(parts: &[&str], grid: &mut CellGrid) -> Result<(), ParseError> {
    if parts.len() == 4 {
        j1_binary::import(parts, grid)
    } else {
        j1::import(parts, grid)
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Decode `code` into a new grid. Surrounding whitespace is ignored.
pub fn import(registry: &Arc<Registry>, code: &str) -> Result<CellGrid, LevelCodeError> {
    let parts: Vec<&str> = code.trim().split(';').collect();
    let tag = parts[0];
    let Some(import) = registry.level_code(tag).and_then(|f| f.import) else {
        return Err(LevelCodeError::UnknownFormat(tag.to_string()));
    };

    let mut grid = CellGrid::new(Arc::clone(registry), 0, 0);
    if let Err(err) = import(&parts, &mut grid) {
        warn!("Failed to import {} level code: {}", tag, err);
        return Err(err.into());
    }
    debug!(
        "Imported {} level code: {}x{}, {} cells",
        tag,
        grid.size.width,
        grid.size.height,
        grid.cell_count()
    );
    Ok(grid)
}

/// Encode `grid` with the format registered as `format`.
pub fn export(grid: &CellGrid, format: &str) -> Result<String, LevelCodeError> {
    let Some(export) = grid.registry().level_code(format).and_then(|f| f.export) else {
        return Err(LevelCodeError::NotExportable(format.to_string()));
    };
    export(grid)
}

// ============================================================================
// Shared helpers
// ============================================================================

pub(crate) fn field<'a>(parts: &[&'a str], index: usize) -> Result<&'a str, ParseError> {
    parts.get(index).copied().ok_or(ParseError::MissingField(index))
}

/// Trimmed optional trailing field, empty when absent.
pub(crate) fn text_field(parts: &[&str], index: usize) -> String {
    parts.get(index).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Description and name are `;`-separated fields, so `;` is written as `:`.
pub(crate) fn escape_text(text: &str) -> String {
    text.trim().replace(';', ":")
}

/// Leading-integer parse: optional sign then digits, trailing garbage ignored.
pub(crate) fn parse_int(text: &str) -> Result<i64, ParseError> {
    let trimmed = text.trim_start();
    let sign_len = usize::from(trimmed.starts_with(|c: char| c == '-' || c == '+'));
    let digits_len = trimmed[sign_len..].chars().take_while(|c| c.is_ascii_digit()).count();
    trimmed[..sign_len + digits_len]
        .parse::<i64>()
        .map_err(|_| ParseError::BadInteger(text.to_string()))
}

pub(crate) fn to_dimension(value: u64, text: &str) -> Result<i32, ParseError> {
    i32::try_from(value).map_err(|_| ParseError::BadInteger(text.to_string()))
}

/// Keys of the legacy V1/V3 type list, in format order.
pub(crate) fn legacy_keys(registry: &Registry) -> Result<Vec<CellTypeKey>, ParseError> {
    LEGACY_CELLS
        .iter()
        .map(|id| registry.key_of(id).ok_or_else(|| ParseError::UnknownCellType(id.to_string())))
        .collect()
}

/// Registered type for `id`, or the `?` placeholder.
pub(crate) fn key_or_unknown(registry: &Registry, id: &str) -> Result<CellTypeKey, ParseError> {
    registry.key_or_unknown(id).ok_or_else(|| ParseError::UnknownCellType(id.to_string()))
}
