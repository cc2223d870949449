/// Binary STL decoder and encoder
use nom::{
    bytes::complete::take,
    number::complete::{le_f32, le_u16, le_u32},
    sequence::tuple,
    IResult,
};
use tracing::debug;

use super::{expected_binary_len, Decoded, PREAMBLE_SIZE, RECORD_SIZE};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Locator};
use crate::error::{StlError, StlResult};
use crate::geometry::{Facet, Vec3};
use crate::model::{Encoding, Model, Solid, HEADER_SIZE};

/// One 50-byte facet record as stored on disk.
struct Record {
    normal: Vec3,
    vertices: [Vec3; 3],
    attribute: u16,
}

fn preamble(input: &[u8]) -> IResult<&[u8], (&[u8], u32)> {
    tuple((take(HEADER_SIZE), le_u32))(input)
}

fn vector(input: &[u8]) -> IResult<&[u8], Vec3> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Vec3::new(f64::from(x), f64::from(y), f64::from(z))))
}

fn record(input: &[u8]) -> IResult<&[u8], Record> {
    let (input, normal) = vector(input)?;
    let (input, v0) = vector(input)?;
    let (input, v1) = vector(input)?;
    let (input, v2) = vector(input)?;
    let (input, attribute) = le_u16(input)?;
    Ok((
        input,
        Record {
            normal,
            vertices: [v0, v1, v2],
            attribute,
        },
    ))
}

/// Decode a binary STL into a single unnamed solid.
///
/// Bytes beyond the declared facet records are ignored and reported as a
/// warning.
pub fn decode(data: &[u8]) -> StlResult<Decoded> {
    let actual = data.len() as u64;
    let (mut input, (header, facet_count)) =
        preamble(data).map_err(|_| StlError::TruncatedFile {
            expected: PREAMBLE_SIZE as u64,
            actual,
        })?;

    let expected = expected_binary_len(facet_count);
    if actual < expected {
        return Err(StlError::TruncatedFile { expected, actual });
    }

    let mut facets = Vec::with_capacity(facet_count as usize);
    for index in 0..facet_count as usize {
        let (rest, record) =
            record(input).map_err(|_| StlError::TruncatedFile { expected, actual })?;
        let offset = (PREAMBLE_SIZE + index * RECORD_SIZE) as u64;
        let facet = Facet::new(record.normal, record.vertices)
            .map_err(|source| StlError::InvalidValue { offset, source })?
            .with_attribute(record.attribute);
        facets.push(facet);
        input = rest;
    }

    let mut diagnostics = Vec::new();
    if actual > expected {
        diagnostics.push(Diagnostic::warning(
            DiagnosticKind::TrailingData,
            Locator::Offset(expected),
            format!(
                "{} bytes of trailing data after the last facet were ignored",
                actual - expected
            ),
        ));
    }

    let mut header_bytes = [0u8; HEADER_SIZE];
    header_bytes.copy_from_slice(header);

    debug!(facets = facet_count, trailing = actual - expected, "decoded binary STL");

    Ok(Decoded {
        model: Model {
            solids: vec![Solid::new("").with_facets(facets)],
            encoding: Encoding::Binary,
            header: Some(header_bytes),
        },
        diagnostics,
    })
}

fn push_vector(buf: &mut Vec<u8>, v: &Vec3) {
    for c in v.iter() {
        buf.extend_from_slice(&(*c as f32).to_le_bytes());
    }
}

/// Serialize every facet of every solid into one binary STL.
///
/// The source header is written back when there is one; ASCII-originated
/// models get a zero-filled header.
pub fn encode(model: &Model) -> StlResult<Vec<u8>> {
    let total = model.facet_count();
    let count = u32::try_from(total).map_err(|_| StlError::TooManyFacets { count: total })?;

    let mut buf = Vec::with_capacity(PREAMBLE_SIZE + total * RECORD_SIZE);
    buf.extend_from_slice(&model.header.unwrap_or([0u8; HEADER_SIZE]));
    buf.extend_from_slice(&count.to_le_bytes());

    for facet in model.facets() {
        push_vector(&mut buf, facet.normal());
        for vertex in facet.vertices() {
            push_vector(&mut buf, vertex);
        }
        buf.extend_from_slice(&facet.attribute().to_le_bytes());
    }

    Ok(buf)
}
