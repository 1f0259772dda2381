//! File formats understood by the engine.
//!
//! # Reading
//! - Binary STL: 80-byte label, little-endian facet count, then 50-byte
//!   records. A file is treated as binary when its length is exactly
//!   `84 + 50 * count`.
//! - ASCII STL: `solid` header line followed by `facet normal` / `outer loop`
//!   / `vertex` x3 / `endloop` / `endfacet` blocks.
//!
//! # Writing
//! ASCII and binary STL, Wavefront OBJ, OFF, DXF (3DFACE entities) and
//! VRML 2.0. OBJ, OFF and VRML are indexed formats and need the shared
//! vertex table.

use super::layout::{LABEL_SIZE, SIZEOF_STL_FACET, StlFacet, StlVIndices, StlVertex};
use bytes::{Buf, BufMut, BytesMut};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

const BINARY_PREAMBLE: usize = LABEL_SIZE + 4;

/// Which STL encoding a file used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Encoding {
    Binary,
    Ascii,
}

/// Facets read from a file, with the header text and detected encoding.
#[derive(Debug)]
pub(crate) struct ParsedStl {
    pub encoding: Encoding,
    pub header: Vec<u8>,
    pub facets: Vec<StlFacet>,
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

pub(crate) fn read_stl(path: &Path) -> io::Result<ParsedStl> {
    let data = fs::read(path)?;
    if let Some(count) = binary_facet_count(&data) {
        return parse_binary(&data, count);
    }
    let text = std::str::from_utf8(&data).map_err(|_| invalid("not a valid STL file"))?;
    parse_ascii(text)
}

fn binary_facet_count(data: &[u8]) -> Option<usize> {
    if data.len() < BINARY_PREAMBLE {
        return None;
    }
    let mut count = &data[LABEL_SIZE..BINARY_PREAMBLE];
    let count = count.get_u32_le() as usize;
    let expected = count.checked_mul(SIZEOF_STL_FACET)?.checked_add(BINARY_PREAMBLE)?;
    (expected == data.len()).then_some(count)
}

fn read_vertex(buf: &mut &[u8]) -> StlVertex {
    StlVertex::new(buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le())
}

fn parse_binary(data: &[u8], count: usize) -> io::Result<ParsedStl> {
    let label = &data[..LABEL_SIZE];
    let end = label.iter().position(|&b| b == 0).unwrap_or(LABEL_SIZE);
    let mut buf = &data[BINARY_PREAMBLE..];
    let mut facets = Vec::with_capacity(count);
    for _ in 0..count {
        let normal = read_vertex(&mut buf);
        let vertex = [
            read_vertex(&mut buf),
            read_vertex(&mut buf),
            read_vertex(&mut buf),
        ];
        let extra = [buf.get_u8(), buf.get_u8()];
        facets.push(StlFacet {
            normal,
            vertex,
            extra,
            _align: [0; 2],
        });
    }
    Ok(ParsedStl {
        encoding: Encoding::Binary,
        header: label[..end].to_vec(),
        facets,
    })
}

fn parse_triple<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
) -> io::Result<StlVertex> {
    let mut next = || -> io::Result<f32> {
        let raw = tokens
            .next()
            .ok_or_else(|| invalid(format!("line {line_no}: missing coordinate")))?;
        raw.parse::<f32>()
            .map_err(|_| invalid(format!("line {line_no}: invalid coordinate `{raw}`")))
    };
    Ok(StlVertex::new(next()?, next()?, next()?))
}

fn parse_ascii(text: &str) -> io::Result<ParsedStl> {
    let mut lines = text.lines().enumerate();
    let (_, first) = lines.next().ok_or_else(|| invalid("empty file"))?;
    if !first.trim_start().starts_with("solid") {
        return Err(invalid("missing `solid` header"));
    }
    let header = first.trim_end().as_bytes();
    let header = header[..header.len().min(LABEL_SIZE)].to_vec();

    let mut facets = Vec::new();
    let mut current: Option<(StlFacet, usize)> = None;
    for (idx, line) in lines {
        let line_no = idx + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            None => {}
            Some("facet") => {
                if current.is_some() {
                    return Err(invalid(format!("line {line_no}: nested facet")));
                }
                if tokens.next() != Some("normal") {
                    return Err(invalid(format!("line {line_no}: expected `facet normal`")));
                }
                let normal = parse_triple(&mut tokens, line_no)?;
                current = Some((
                    StlFacet {
                        normal,
                        ..Default::default()
                    },
                    0,
                ));
            }
            Some("vertex") => {
                let Some((facet, seen)) = current.as_mut() else {
                    return Err(invalid(format!("line {line_no}: vertex outside facet")));
                };
                if *seen == 3 {
                    return Err(invalid(format!("line {line_no}: more than 3 vertices")));
                }
                facet.vertex[*seen] = parse_triple(&mut tokens, line_no)?;
                *seen += 1;
            }
            Some("endfacet") => match current.take() {
                Some((facet, 3)) => facets.push(facet),
                _ => return Err(invalid(format!("line {line_no}: incomplete facet"))),
            },
            Some("outer") | Some("endloop") => {}
            Some("endsolid") => break,
            Some(other) => {
                return Err(invalid(format!("line {line_no}: unexpected `{other}`")));
            }
        }
    }
    if current.is_some() {
        return Err(invalid("unterminated facet"));
    }
    Ok(ParsedStl {
        encoding: Encoding::Ascii,
        header,
        facets,
    })
}

fn fmt_vertex(v: &StlVertex) -> String {
    format!("{:e} {:e} {:e}", v.x, v.y, v.z)
}

pub(crate) fn write_ascii(path: &Path, label: &str, facets: &[StlFacet]) -> io::Result<()> {
    let mut out = String::with_capacity(64 + facets.len() * 256);
    let _ = writeln!(out, "solid  {label}");
    for f in facets {
        let _ = writeln!(out, "  facet normal {}", fmt_vertex(&f.normal));
        out.push_str("    outer loop\n");
        for v in &f.vertex {
            let _ = writeln!(out, "      vertex {}", fmt_vertex(v));
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    let _ = writeln!(out, "endsolid  {label}");
    fs::write(path, out)
}

pub(crate) fn write_binary(path: &Path, label: &str, facets: &[StlFacet]) -> io::Result<()> {
    let count = u32::try_from(facets.len()).map_err(|_| invalid("too many facets"))?;
    let mut out = BytesMut::with_capacity(BINARY_PREAMBLE + facets.len() * SIZEOF_STL_FACET);
    let label = label.as_bytes();
    let label = &label[..label.len().min(LABEL_SIZE)];
    out.put_slice(label);
    out.put_bytes(0, LABEL_SIZE - label.len());
    out.put_u32_le(count);
    for f in facets {
        for v in std::iter::once(&f.normal).chain(f.vertex.iter()) {
            out.put_f32_le(v.x);
            out.put_f32_le(v.y);
            out.put_f32_le(v.z);
        }
        out.put_slice(&f.extra);
    }
    fs::write(path, out.freeze())
}

pub(crate) fn write_obj(
    path: &Path,
    shared: &[StlVertex],
    indices: &[StlVIndices],
) -> io::Result<()> {
    let mut out = String::new();
    out.push_str("# Wavefront OBJ written by stl-handle\n");
    for v in shared {
        let _ = writeln!(out, "v {} {} {}", v.x, v.y, v.z);
    }
    for f in indices {
        let [a, b, c] = f.vertex;
        let _ = writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1);
    }
    fs::write(path, out)
}

pub(crate) fn write_off(
    path: &Path,
    shared: &[StlVertex],
    indices: &[StlVIndices],
) -> io::Result<()> {
    let mut out = String::new();
    out.push_str("OFF\n");
    let _ = writeln!(out, "{} {} 0", shared.len(), indices.len());
    for v in shared {
        let _ = writeln!(out, "\t{} {} {}", v.x, v.y, v.z);
    }
    for f in indices {
        let [a, b, c] = f.vertex;
        let _ = writeln!(out, "\t3 {a} {b} {c}");
    }
    fs::write(path, out)
}

pub(crate) fn write_dxf(path: &Path, label: &str, facets: &[StlFacet]) -> io::Result<()> {
    let mut out = String::new();
    let _ = writeln!(out, "999\n{label}");
    out.push_str("0\nSECTION\n2\nHEADER\n0\nENDSEC\n");
    out.push_str("0\nSECTION\n2\nTABLES\n0\nTABLE\n2\nLAYER\n70\n1\n");
    out.push_str("0\nLAYER\n2\n0\n70\n0\n62\n7\n6\nCONTINUOUS\n0\nENDTAB\n0\nENDSEC\n");
    out.push_str("0\nSECTION\n2\nBLOCKS\n0\nENDSEC\n");
    out.push_str("0\nSECTION\n2\nENTITIES\n");
    for f in facets {
        out.push_str("0\n3DFACE\n8\n0\n");
        // 3DFACE wants four corners; triangles repeat the last one.
        let corners = [f.vertex[0], f.vertex[1], f.vertex[2], f.vertex[2]];
        for (i, v) in corners.iter().enumerate() {
            let _ = writeln!(out, "1{i}\n{}\n2{i}\n{}\n3{i}\n{}", v.x, v.y, v.z);
        }
    }
    out.push_str("0\nENDSEC\n0\nEOF\n");
    fs::write(path, out)
}

pub(crate) fn write_vrml(
    path: &Path,
    shared: &[StlVertex],
    indices: &[StlVIndices],
) -> io::Result<()> {
    let mut out = String::new();
    out.push_str("#VRML V2.0 utf8\n# written by stl-handle\n");
    out.push_str("Transform {\n  children [\n    Shape {\n");
    out.push_str("      geometry IndexedFaceSet {\n");
    out.push_str("        coord Coordinate {\n          point [\n");
    for v in shared {
        let _ = writeln!(out, "            {} {} {},", v.x, v.y, v.z);
    }
    out.push_str("          ]\n        }\n        coordIndex [\n");
    for f in indices {
        let [a, b, c] = f.vertex;
        let _ = writeln!(out, "          {a}, {b}, {c}, -1,");
    }
    out.push_str("        ]\n      }\n    }\n  ]\n}\n");
    fs::write(path, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "solid  tri
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid  tri
";

    #[test]
    fn ascii_header_and_vertices_are_parsed() {
        let parsed = parse_ascii(TRIANGLE).expect("parse");
        assert_eq!(parsed.encoding, Encoding::Ascii);
        assert_eq!(parsed.header, b"solid  tri");
        assert_eq!(parsed.facets.len(), 1);
        assert_eq!(parsed.facets[0].vertex[1], StlVertex::new(1.0, 0.0, 0.0));
        assert_eq!(parsed.facets[0].normal, StlVertex::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn truncated_ascii_is_rejected() {
        let broken =
            "solid x\n facet normal 0 0 1\n outer loop\n vertex 0 0 0\n endloop\n endfacet\n";
        assert!(parse_ascii(broken).is_err());
        assert!(parse_ascii("not an stl").is_err());
    }

    #[test]
    fn binary_detection_requires_exact_length() {
        let mut data = vec![0u8; BINARY_PREAMBLE + SIZEOF_STL_FACET];
        data[LABEL_SIZE] = 1;
        assert_eq!(binary_facet_count(&data), Some(1));
        data.push(0);
        assert_eq!(binary_facet_count(&data), None);
    }

    #[test]
    fn binary_records_keep_attribute_bytes() {
        let mut data = vec![0u8; BINARY_PREAMBLE];
        data[..6].copy_from_slice(b"admesh");
        data[LABEL_SIZE] = 1;
        for value in [0.0f32, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&[7, 9]);
        let parsed = parse_binary(&data, 1).expect("parse");
        assert_eq!(parsed.header, b"admesh");
        assert_eq!(parsed.facets[0].extra, [7, 9]);
        assert_eq!(parsed.facets[0].vertex[2], StlVertex::new(0.0, 1.0, 0.0));
    }
}
