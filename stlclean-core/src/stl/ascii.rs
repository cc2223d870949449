/// ASCII STL decoder and encoder
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_till, take_till1},
    character::complete::{multispace0, multispace1, space0},
    combinator::{all_consuming, eof, peek},
    number::complete::double,
    sequence::{preceded, terminated},
    IResult,
};
use tracing::debug;

use super::{DecodeOptions, Decoded};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Locator};
use crate::error::{StlError, StlResult};
use crate::geometry::{Facet, Vec3};
use crate::model::{Encoding, Model, Solid};

/// Decode an ASCII STL. Keywords are case-insensitive; every `solid` block
/// becomes one [`Solid`].
pub fn decode(data: &[u8], options: &DecodeOptions) -> StlResult<Decoded> {
    let text = std::str::from_utf8(data).map_err(|e| {
        StlError::format(format!(
            "ASCII STL is not valid UTF-8 after byte {}",
            e.valid_up_to()
        ))
    })?;
    let model = parse_ascii_stl(text, options)?;

    let diagnostics = model
        .solids
        .iter()
        .enumerate()
        .filter(|(_, solid)| solid.name.is_empty())
        .map(|(index, _)| {
            Diagnostic::warning(
                DiagnosticKind::UnnamedSolid,
                Locator::Solid { solid: index },
                "expected 'solid <name>', the solid has no name",
            )
        })
        .collect();

    debug!(
        solids = model.solids.len(),
        facets = model.facet_count(),
        "decoded ASCII STL"
    );

    Ok(Decoded { model, diagnostics })
}

pub fn parse_ascii_stl(text: &str, options: &DecodeOptions) -> StlResult<Model> {
    let mut reader = Reader::new(text);
    if reader.at_end() {
        return Err(StlError::format("input contains no solid"));
    }

    let mut model = Model::new(Encoding::Ascii);
    while !reader.at_end() {
        let solid = reader.solid(options)?;
        model.solids.push(solid);
    }
    Ok(model)
}

/// Next whitespace-delimited token.
fn word(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

/// Next token on the current line.
fn component(input: &str) -> IResult<&str, &str> {
    preceded(space0, take_till1(char::is_whitespace))(input)
}

fn keyword<'a>(expected: &'static str, input: &'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(expected), peek(alt((multispace1, eof))))(input)
}

/// Parse a whole token as a float that survives conversion to `f32`.
fn number(token: &str) -> Option<f64> {
    let result: IResult<&str, f64> = all_consuming(double)(token);
    result
        .ok()
        .map(|(_, value)| value)
        .filter(|value| (*value as f32).is_finite())
}

struct Reader<'a> {
    source: &'a str,
    rest: &'a str,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            rest: source,
        }
    }

    /// 1-based line number of a position inside `source`.
    fn line_at(&self, at: &str) -> usize {
        let offset = self.source.len() - at.len();
        self.source[..offset].matches('\n').count() + 1
    }

    fn line(&self) -> usize {
        self.line_at(self.rest)
    }

    fn skip_whitespace(&mut self) {
        let result: IResult<&'a str, &'a str> = multispace0(self.rest);
        if let Ok((rest, _)) = result {
            self.rest = rest;
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.rest.is_empty()
    }

    fn peek_word(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        word(self.rest).ok().map(|(_, w)| w)
    }

    fn next_is(&mut self, expected: &str) -> bool {
        self.peek_word()
            .map_or(false, |w| w.eq_ignore_ascii_case(expected))
    }

    fn expect(&mut self, expected: &'static str) -> StlResult<()> {
        self.skip_whitespace();
        match keyword(expected, self.rest) {
            Ok((rest, _)) => {
                self.rest = rest;
                Ok(())
            }
            Err(_) => {
                let message = match word(self.rest) {
                    Ok((_, found)) => format!("expected '{expected}' but got '{found}'"),
                    Err(_) => format!("expected '{expected}' but reached end of file"),
                };
                Err(StlError::structure(self.line(), message))
            }
        }
    }

    /// Remainder of the current line, trimmed.
    fn rest_of_line(&mut self) -> &'a str {
        let result: IResult<&'a str, &'a str> = take_till(|c| c == '\n')(self.rest);
        match result {
            Ok((rest, text)) => {
                self.rest = rest;
                text.trim()
            }
            Err(_) => "",
        }
    }

    /// Exactly three numeric components on the current line.
    fn vector(&mut self, what: &str) -> StlResult<Vec3> {
        let mut coords = [0.0f64; 3];
        for (axis, coord) in coords.iter_mut().enumerate() {
            let (rest, token) = component(self.rest).map_err(|_| {
                StlError::parse(
                    self.line(),
                    format!("{what} has {axis} numeric components, expected 3"),
                )
            })?;
            *coord = number(token).ok_or_else(|| {
                StlError::parse(
                    self.line(),
                    format!("'{token}' is not a valid {what} coordinate"),
                )
            })?;
            self.rest = rest;
        }

        if let Ok((_, token)) = component(self.rest) {
            if number(token).is_some() {
                return Err(StlError::parse(
                    self.line(),
                    format!("{what} has more than 3 numeric components"),
                ));
            }
        }

        Ok(Vec3::from(coords))
    }

    fn facet(&mut self) -> StlResult<Facet> {
        self.skip_whitespace();
        let start = self.rest;

        self.expect("facet")?;
        self.expect("normal")?;
        let normal = self.vector("normal")?;
        self.expect("outer")?;
        self.expect("loop")?;

        let mut vertices = Vec::with_capacity(3);
        while self.next_is("vertex") {
            self.expect("vertex")?;
            vertices.push(self.vector("vertex")?);
        }
        let vertices: [Vec3; 3] = vertices.try_into().map_err(|found: Vec<Vec3>| {
            StlError::structure(
                self.line_at(start),
                format!("facet has {} vertices, expected 3", found.len()),
            )
        })?;

        self.expect("endloop")?;
        self.expect("endfacet")?;

        Facet::new(normal, vertices)
            .map_err(|e| StlError::parse(self.line_at(start), e.to_string()))
    }

    fn solid(&mut self, options: &DecodeOptions) -> StlResult<Solid> {
        self.expect("solid")?;
        let mut solid = Solid::new(self.rest_of_line());

        loop {
            match self.peek_word() {
                Some(w) if w.eq_ignore_ascii_case("facet") => {
                    let facet = self.facet()?;
                    solid.facets.push(facet);
                }
                Some(w) if w.eq_ignore_ascii_case("endsolid") => break,
                Some(found) => {
                    return Err(StlError::structure(
                        self.line(),
                        format!("expected 'facet' or 'endsolid' but got '{found}'"),
                    ))
                }
                None => {
                    return Err(StlError::structure(
                        self.line(),
                        format!("solid '{}' is missing 'endsolid'", solid.name),
                    ))
                }
            }
        }

        self.expect("endsolid")?;
        if options.read_endsolid_names {
            solid.end_name = Some(self.rest_of_line().to_string());
        } else {
            self.skip_line();
        }
        Ok(solid)
    }

    fn skip_line(&mut self) {
        let result: IResult<&'a str, &'a str> = take_till(|c| c == '\n')(self.rest);
        if let Ok((rest, _)) = result {
            self.rest = rest;
        }
    }
}

/// Render a coordinate as the shortest scientific literal that round-trips
/// its `f32` value, with a signed two-digit exponent (`1e-02`, `-2.5e+00`).
pub fn format_coordinate(value: f64) -> String {
    let text = format!("{:e}", value as f32);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

fn format_vector(v: &Vec3) -> String {
    format!(
        "{} {} {}",
        format_coordinate(v.x),
        format_coordinate(v.y),
        format_coordinate(v.z)
    )
}

fn push_label(out: &mut String, keyword: &str, name: &str) {
    out.push_str(keyword);
    if !name.is_empty() {
        out.push(' ');
        out.push_str(name);
    }
    out.push('\n');
}

/// Serialize `model` as ASCII STL with `indent` spaces per nesting level.
pub fn encode(model: &Model, indent: usize) -> String {
    let one = " ".repeat(indent);
    let two = one.repeat(2);
    let three = one.repeat(3);

    let mut out = String::with_capacity(model.facet_count() * 256 + 64);
    for solid in &model.solids {
        push_label(&mut out, "solid", &solid.name);
        for facet in &solid.facets {
            out.push_str(&format!("{one}facet normal {}\n", format_vector(facet.normal())));
            out.push_str(&format!("{two}outer loop\n"));
            for vertex in facet.vertices() {
                out.push_str(&format!("{three}vertex {}\n", format_vector(vertex)));
            }
            out.push_str(&format!("{two}endloop\n"));
            out.push_str(&format!("{one}endfacet\n"));
        }
        push_label(&mut out, "endsolid", solid.closing_name());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "solid tri
 facet normal 0 0 1
  outer loop
   vertex 0 0 0
   vertex 1 0 0
   vertex 0 1 0
  endloop
 endfacet
endsolid tri
";

    fn parse(text: &str) -> StlResult<Model> {
        parse_ascii_stl(text, &DecodeOptions::default())
    }

    #[test]
    fn test_parse_single_facet() {
        let model = parse(TRIANGLE).unwrap();
        assert_eq!(model.encoding, Encoding::Ascii);
        assert_eq!(model.solids.len(), 1);
        let solid = &model.solids[0];
        assert_eq!(solid.name, "tri");
        assert_eq!(solid.end_name.as_deref(), Some("tri"));
        assert_eq!(solid.facets.len(), 1);
        assert_eq!(*solid.facets[0].normal(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(solid.facets[0].vertices()[1], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(solid.facets[0].attribute(), 0);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let text = "SOLID Part\nFacet Normal 0 0 0\nOUTER LOOP\nVertex 0 0 0\nVERTEX 1e0 0 0\n\
                    vertex 0 1.0E+00 0\nEndLoop\nENDFACET\nEndSolid Part\n";
        let model = parse(text).unwrap();
        assert_eq!(model.solids[0].facets.len(), 1);
        assert_eq!(model.solids[0].facets[0].vertices()[2], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_multiple_solids_and_empty_names() {
        let text = format!("{TRIANGLE}solid\nendsolid\n");
        let model = parse(&text).unwrap();
        assert_eq!(model.solids.len(), 2);
        assert_eq!(model.solids[1].name, "");
        assert!(model.solids[1].facets.is_empty());
    }

    #[test]
    fn test_unnamed_solid_is_reported() {
        let text = format!("{TRIANGLE}solid   \nendsolid\n");
        let decoded = decode(text.as_bytes(), &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.diagnostics.len(), 1);
        assert_eq!(decoded.diagnostics[0].kind, DiagnosticKind::UnnamedSolid);
        assert_eq!(decoded.diagnostics[0].locator, Locator::Solid { solid: 1 });

        let decoded = decode(TRIANGLE.as_bytes(), &DecodeOptions::default()).unwrap();
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn test_values_beyond_f32_range_are_rejected() {
        let text = TRIANGLE.replace("vertex 1 0 0", "vertex 1e39 0 0");
        assert!(matches!(parse(&text).unwrap_err(), StlError::Parse { line: 5, .. }));

        // representable after rounding, even if below the smallest normal f32
        let text = TRIANGLE.replace("vertex 1 0 0", "vertex 1 1e-300 0");
        assert_eq!(parse(&text).unwrap().solids[0].facets[0].vertices()[1].y, 0.0);
    }

    #[test]
    fn test_zero_normal_is_accepted() {
        let text = TRIANGLE.replace("normal 0 0 1", "normal 0 0 0");
        let model = parse(&text).unwrap();
        assert_eq!(*model.solids[0].facets[0].normal(), Vec3::zeros());
    }

    #[test]
    fn test_malformed_number_reports_line() {
        let text = TRIANGLE.replace("vertex 1 0 0", "vertex 1 0x 0");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, StlError::Parse { line: 5, .. }), "{err}");

        let text = TRIANGLE.replace("normal 0 0 1", "normal 0 nan 1");
        assert!(matches!(parse(&text).unwrap_err(), StlError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_component_count_is_checked() {
        let text = TRIANGLE.replace("vertex 0 1 0", "vertex 0 1");
        assert!(matches!(parse(&text).unwrap_err(), StlError::Parse { line: 6, .. }));

        let text = TRIANGLE.replace("normal 0 0 1", "normal 0 0 1 0");
        assert!(matches!(parse(&text).unwrap_err(), StlError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_wrong_vertex_count_is_structure_error() {
        let text = TRIANGLE.replace("   vertex 0 1 0\n", "");
        assert!(matches!(parse(&text).unwrap_err(), StlError::Structure { line: 2, .. }));

        let text = TRIANGLE.replace("   vertex 0 1 0\n", "   vertex 0 1 0\n   vertex 1 1 0\n");
        assert!(matches!(parse(&text).unwrap_err(), StlError::Structure { line: 2, .. }));
    }

    #[test]
    fn test_missing_endsolid() {
        let text = TRIANGLE.replace("endsolid tri\n", "");
        assert!(matches!(parse(&text).unwrap_err(), StlError::Structure { .. }));
    }

    #[test]
    fn test_endsolid_name_not_read_when_disabled() {
        let text = TRIANGLE.replace("endsolid tri", "endsolid other");
        let options = DecodeOptions {
            read_endsolid_names: false,
        };
        let model = parse_ascii_stl(&text, &options).unwrap();
        assert_eq!(model.solids[0].end_name, None);
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(format_coordinate(0.0), "0e+00");
        assert_eq!(format_coordinate(1.0), "1e+00");
        assert_eq!(format_coordinate(0.01), "1e-02");
        assert_eq!(format_coordinate(-2.5), "-2.5e+00");
        assert_eq!(format_coordinate(123456.0), "1.23456e+05");
    }

    #[test]
    fn test_encode_layout_and_indent() {
        let model = parse(TRIANGLE).unwrap();
        let text = encode(&model, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "solid tri");
        assert_eq!(lines[1], "  facet normal 0e+00 0e+00 1e+00");
        assert_eq!(lines[2], "    outer loop");
        assert_eq!(lines[3], "      vertex 0e+00 0e+00 0e+00");
        assert_eq!(lines[6], "    endloop");
        assert_eq!(lines[7], "  endfacet");
        assert_eq!(lines[8], "endsolid tri");
    }

    #[test]
    fn test_encode_is_stable_through_reparse() {
        let text = TRIANGLE.replace("vertex 1 0 0", "vertex 0.1 0.2 0.30000001");
        let first = encode(&parse(&text).unwrap(), 1);
        let second = encode(&parse(&first).unwrap(), 1);
        assert_eq!(first, second);
    }
}
