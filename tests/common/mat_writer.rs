//! Minimal Level 5 MAT writer for building test inputs.
#![allow(dead_code)]

use std::io::Write;

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;

const MI_INT8: u32 = 1;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

const MX_CELL: u32 = 1;
const MX_STRUCT: u32 = 2;
const MX_CHAR: u32 = 4;
const MX_DOUBLE: u32 = 6;
const MX_INT32: u32 = 12;

/// Array to encode
#[derive(Debug, Clone)]
pub enum Value {
    /// Column-major doubles
    Double(Vec<usize>, Vec<f64>),
    /// Column-major int32 values
    Int32(Vec<usize>, Vec<i32>),
    /// 1xN char array
    Char(String),
    /// Column-major cells
    Cell(Vec<usize>, Vec<Value>),
    /// Field names and column-major elements
    Struct(Vec<usize>, Vec<String>, Vec<Vec<Value>>),
    /// Zero-byte matrix element
    Empty,
}

impl Value {
    pub fn scalar(value: f64) -> Self {
        Value::Double(vec![1, 1], vec![value])
    }

    pub fn cell_1x1(value: Value) -> Self {
        Value::Cell(vec![1, 1], vec![value])
    }

    /// 1x1 struct with the given fields
    pub fn record(fields: Vec<(&str, Value)>) -> Self {
        let (names, values): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .unzip();
        Value::Struct(vec![1, 1], names, vec![values])
    }
}

/// Options for [`mat_file`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub compress: bool,
    pub big_endian: bool,
}

/// Encode variables as a complete MAT file
pub fn mat_file(variables: &[(&str, Value)], options: WriteOptions) -> Vec<u8> {
    if options.big_endian {
        encode::<BigEndian>(variables, options.compress, *b"MI")
    } else {
        encode::<LittleEndian>(variables, options.compress, *b"IM")
    }
}

/// A 128-byte header with an arbitrary version word
pub fn header_with_version(version: u16) -> Vec<u8> {
    let mut out = header_text();
    out.write_u16::<LittleEndian>(version).unwrap();
    out.extend_from_slice(b"IM");
    out
}

fn header_text() -> Vec<u8> {
    let mut text = b"MATLAB 5.0 MAT-file, Platform: GLNXA64, Created on: test".to_vec();
    text.resize(116, b' ');
    text.extend_from_slice(&[0u8; 8]);
    text
}

fn encode<B: ByteOrder>(variables: &[(&str, Value)], compress: bool, indicator: [u8; 2]) -> Vec<u8> {
    let mut out = header_text();
    out.write_u16::<B>(0x0100).unwrap();
    out.extend_from_slice(&indicator);

    for (name, value) in variables {
        let matrix = element::<B>(MI_MATRIX, &matrix::<B>(name, value));
        if compress {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&matrix).unwrap();
            let compressed = encoder.finish().unwrap();
            out.write_u32::<B>(MI_COMPRESSED).unwrap();
            out.write_u32::<B>(compressed.len() as u32).unwrap();
            out.extend_from_slice(&compressed);
        } else {
            out.extend_from_slice(&matrix);
        }
    }
    out
}

fn element<B: ByteOrder>(data_type: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 16);
    out.write_u32::<B>(data_type).unwrap();
    out.write_u32::<B>(payload.len() as u32).unwrap();
    out.extend_from_slice(payload);
    while out.len() % 8 != 0 {
        out.push(0);
    }
    out
}

fn small_element<B: ByteOrder>(data_type: u32, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= 4);
    let mut out = Vec::with_capacity(8);
    out.write_u32::<B>(((payload.len() as u32) << 16) | data_type)
        .unwrap();
    out.extend_from_slice(payload);
    out.resize(8, 0);
    out
}

fn dims_element<B: ByteOrder>(dims: &[usize]) -> Vec<u8> {
    let mut payload = Vec::new();
    for &d in dims {
        payload.write_i32::<B>(d as i32).unwrap();
    }
    element::<B>(MI_INT32, &payload)
}

fn header_elements<B: ByteOrder>(class: u32, dims: &[usize], name: &str) -> Vec<u8> {
    let mut flags = Vec::new();
    flags.write_u32::<B>(class).unwrap();
    flags.write_u32::<B>(0).unwrap();

    let mut out = element::<B>(MI_UINT32, &flags);
    out.extend(dims_element::<B>(dims));
    out.extend(element::<B>(MI_INT8, name.as_bytes()));
    out
}

fn matrix<B: ByteOrder>(name: &str, value: &Value) -> Vec<u8> {
    match value {
        Value::Empty => Vec::new(),
        Value::Double(dims, data) => {
            let mut out = header_elements::<B>(MX_DOUBLE, dims, name);
            let mut payload = Vec::new();
            for &v in data {
                payload.write_f64::<B>(v).unwrap();
            }
            out.extend(element::<B>(MI_DOUBLE, &payload));
            out
        }
        Value::Int32(dims, data) => {
            let mut out = header_elements::<B>(MX_INT32, dims, name);
            let mut payload = Vec::new();
            for &v in data {
                payload.write_i32::<B>(v).unwrap();
            }
            out.extend(element::<B>(MI_INT32, &payload));
            out
        }
        Value::Char(text) => {
            let units: Vec<u16> = text.encode_utf16().collect();
            let mut out = header_elements::<B>(MX_CHAR, &[1, units.len()], name);
            let mut payload = Vec::new();
            for unit in units {
                payload.write_u16::<B>(unit).unwrap();
            }
            out.extend(element::<B>(MI_UINT16, &payload));
            out
        }
        Value::Cell(dims, cells) => {
            let mut out = header_elements::<B>(MX_CELL, dims, name);
            for cell in cells {
                out.extend(element::<B>(MI_MATRIX, &matrix::<B>("", cell)));
            }
            out
        }
        Value::Struct(dims, field_names, elements) => {
            let mut out = header_elements::<B>(MX_STRUCT, dims, name);
            let name_len = field_names.iter().map(String::len).max().unwrap_or(0) + 1;
            let mut len_bytes = Vec::new();
            len_bytes.write_i32::<B>(name_len as i32).unwrap();
            out.extend(small_element::<B>(MI_INT32, &len_bytes));

            let mut names = Vec::new();
            for field in field_names {
                let mut padded = field.as_bytes().to_vec();
                padded.resize(name_len, 0);
                names.extend(padded);
            }
            out.extend(element::<B>(MI_INT8, &names));

            for fields in elements {
                for field in fields {
                    out.extend(element::<B>(MI_MATRIX, &matrix::<B>("", field)));
                }
            }
            out
        }
    }
}
