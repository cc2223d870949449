//! STL format detection and the ASCII / binary codecs.
//!
//! # Binary layout
//!
//! ```text
//! UINT8[80]    – Header (opaque, preserved)
//! UINT32       – Number of facets N
//! foreach facet
//!     REAL32[3] – Normal
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count
//! end
//! ```
//!
//! # ASCII grammar
//!
//! ```text
//! solid name
//!   facet normal ni nj nk
//!     outer loop
//!       vertex v1x v1y v1z
//!       vertex v2x v2y v2z
//!       vertex v3x v3y v3z
//!     endloop
//!   endfacet
//! endsolid name
//! ```

use std::cmp::Ordering;

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take},
    character::complete::{multispace0, multispace1},
    combinator::{eof, peek},
    number::complete::le_u32,
    sequence::{preceded, terminated},
    IResult,
};

pub mod ascii;
pub mod binary;

use crate::config::CleanerConfig;
use crate::diagnostics::Diagnostic;
use crate::error::{StlError, StlResult};
use crate::model::{Encoding, Model, HEADER_SIZE};

/// Header plus facet count.
pub const PREAMBLE_SIZE: usize = HEADER_SIZE + 4;

/// Size of one binary facet record.
pub const RECORD_SIZE: usize = 50;

/// Exact file length of a binary STL declaring `facet_count` facets.
pub fn expected_binary_len(facet_count: u32) -> u64 {
    PREAMBLE_SIZE as u64 + RECORD_SIZE as u64 * u64::from(facet_count)
}

/// Facet count stored after the binary header, if the input is long enough.
pub fn declared_facet_count(data: &[u8]) -> Option<u32> {
    let result: IResult<&[u8], u32> = preceded(take(HEADER_SIZE), le_u32)(data);
    result.ok().map(|(_, count)| count)
}

/// Whether the input opens with the `solid` keyword after optional whitespace.
fn starts_with_solid(data: &[u8]) -> bool {
    let result: IResult<&[u8], &[u8]> = preceded(
        multispace0,
        terminated(tag_no_case("solid"), peek(alt((multispace1, eof)))),
    )(data);
    result.is_ok()
}

/// Classify the input as ASCII or binary STL.
///
/// Binary headers may begin with `solid` too, so a leading keyword only wins
/// when the binary size invariant (`84 + 50 * N` bytes) does not hold. Input
/// without the keyword must at least carry a complete binary preamble; a
/// short body is reported by the binary decoder.
pub fn sniff(data: &[u8]) -> StlResult<Encoding> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(StlError::format("input is empty"));
    }

    let fit = declared_facet_count(data)
        .map(|count| (data.len() as u64).cmp(&expected_binary_len(count)));

    if starts_with_solid(data) {
        return Ok(match fit {
            Some(Ordering::Equal) => Encoding::Binary,
            // Text with trailing garbage stays ASCII; only non-text can be a
            // binary file carrying trailing data.
            Some(Ordering::Greater) if std::str::from_utf8(data).is_err() => Encoding::Binary,
            _ => Encoding::Ascii,
        });
    }

    match fit {
        Some(_) => Ok(Encoding::Binary),
        None => Err(StlError::format(format!(
            "{} bytes without a 'solid' keyword is too short for a binary preamble of {} bytes",
            data.len(),
            PREAMBLE_SIZE
        ))),
    }
}

/// Decoder settings derived from the run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Capture the label after `endsolid`.
    pub read_endsolid_names: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            read_endsolid_names: true,
        }
    }
}

impl From<&CleanerConfig> for DecodeOptions {
    fn from(config: &CleanerConfig) -> Self {
        Self {
            read_endsolid_names: !config.ignore_endsolid_name,
        }
    }
}

/// A decoded model and the non-fatal findings of decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub model: Model,
    pub diagnostics: Vec<Diagnostic>,
}

/// Detect the encoding and decode.
pub fn decode(data: &[u8], options: &DecodeOptions) -> StlResult<Decoded> {
    match sniff(data)? {
        Encoding::Ascii => ascii::decode(data, options),
        Encoding::Binary => binary::decode(data),
    }
}

/// Serialize `model` in the requested encoding.
pub fn encode(model: &Model, encoding: Encoding, indent: usize) -> StlResult<Vec<u8>> {
    match encoding {
        Encoding::Ascii => Ok(ascii::encode(model, indent).into_bytes()),
        Encoding::Binary => binary::encode(model),
    }
}
