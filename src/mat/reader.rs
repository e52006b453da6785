//! Level 5 data element decoding
//!
//! Every variable in a Level 5 file is a tagged data element. A tag is eight
//! bytes (data type, byte count) unless the upper half of the first word is
//! set, in which case tag and up to four bytes of data share those eight bytes.
//! Uncompressed payloads are padded to a multiple of eight bytes.

use std::io::Read;
use std::marker::PhantomData;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;
use log::{debug, warn};

use super::{MatArray, MatClass, MatError};

/// Size of the file header
pub const HEADER_LEN: usize = 128;
const HEADER_TEXT_LEN: usize = 116;
const VERSION_OFFSET: usize = 124;
const ENDIAN_OFFSET: usize = 126;

/// Version word of Level 5 files
pub const VERSION_5: u16 = 0x0100;
/// Version word of HDF5-based v7.3 files
pub const VERSION_73: u16 = 0x0200;

pub(crate) const MI_INT8: u32 = 1;
pub(crate) const MI_UINT8: u32 = 2;
pub(crate) const MI_INT16: u32 = 3;
pub(crate) const MI_UINT16: u32 = 4;
pub(crate) const MI_INT32: u32 = 5;
pub(crate) const MI_UINT32: u32 = 6;
pub(crate) const MI_SINGLE: u32 = 7;
pub(crate) const MI_DOUBLE: u32 = 9;
pub(crate) const MI_INT64: u32 = 12;
pub(crate) const MI_UINT64: u32 = 13;
pub(crate) const MI_MATRIX: u32 = 14;
pub(crate) const MI_COMPRESSED: u32 = 15;
pub(crate) const MI_UTF8: u32 = 16;
pub(crate) const MI_UTF16: u32 = 17;
pub(crate) const MI_UTF32: u32 = 18;

const MX_CELL: u32 = 1;
const MX_STRUCT: u32 = 2;
const MX_OBJECT: u32 = 3;
const MX_CHAR: u32 = 4;
const MX_SPARSE: u32 = 5;

const FLAG_COMPLEX: u32 = 0x0800;

/// Size of a full data element tag
const TAG_LEN: usize = 8;

/// Byte order declared by the header's endian indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// `IM`
    Little,
    /// `MI`
    Big,
}

/// Decoded file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatHeader {
    /// Descriptive text, trailing padding removed
    pub text: String,
    /// Version word
    pub version: u16,
    /// Byte order of everything after the header
    pub endianness: Endianness,
}

/// Parse and validate the 128-byte header
pub fn parse_header(bytes: &[u8]) -> Result<MatHeader, MatError> {
    if bytes.len() < HEADER_LEN {
        return Err(MatError::InvalidHeader(format!(
            "file is {} bytes, shorter than the {}-byte header",
            bytes.len(),
            HEADER_LEN
        )));
    }

    let mut version_bytes = &bytes[VERSION_OFFSET..ENDIAN_OFFSET];
    let (endianness, version) = match &bytes[ENDIAN_OFFSET..HEADER_LEN] {
        b"IM" => (Endianness::Little, version_bytes.read_u16::<LittleEndian>()?),
        b"MI" => (Endianness::Big, version_bytes.read_u16::<BigEndian>()?),
        other => {
            return Err(MatError::InvalidHeader(format!(
                "unknown endian indicator {:?}; not a Level 5 MAT file",
                String::from_utf8_lossy(other)
            )))
        }
    };

    match version {
        VERSION_5 => {}
        VERSION_73 => {
            return Err(MatError::Unsupported(
                "MAT v7.3 (HDF5-based) files".to_string(),
            ))
        }
        other => {
            return Err(MatError::InvalidHeader(format!(
                "unknown version 0x{:04x}",
                other
            )))
        }
    }

    let text = String::from_utf8_lossy(&bytes[..HEADER_TEXT_LEN])
        .trim_end_matches(|c: char| c == ' ' || c == '\0')
        .to_string();

    Ok(MatHeader {
        text,
        version,
        endianness,
    })
}

/// Decode the header and every top-level variable
pub fn read_mat(bytes: &[u8]) -> Result<(MatHeader, Vec<(String, MatArray)>), MatError> {
    let header = parse_header(bytes)?;
    let body = &bytes[HEADER_LEN..];
    let variables = match header.endianness {
        Endianness::Little => read_variables::<LittleEndian>(body)?,
        Endianness::Big => read_variables::<BigEndian>(body)?,
    };
    Ok((header, variables))
}

fn read_variables<B: ByteOrder>(body: &[u8]) -> Result<Vec<(String, MatArray)>, MatError> {
    let mut reader = ElementReader::<B>::new(body);
    let mut variables = Vec::new();

    while reader.remaining() >= 8 {
        let (data_type, data) = reader.read_tag()?;
        let variable = match data_type {
            MI_MATRIX => read_matrix::<B>(data)?,
            MI_COMPRESSED => {
                let inflated = inflate(data)?;
                let mut inner = ElementReader::<B>::new(&inflated);
                let (_, matrix) = inner.expect(&[MI_MATRIX], "compressed variable")?;
                read_matrix::<B>(matrix)?
            }
            other => {
                debug!("Skipping top-level element of data type {}", other);
                continue;
            }
        };
        debug!("Read variable '{}' ({})", variable.0, variable.1.kind());
        variables.push(variable);
    }

    if reader.remaining() > 0 {
        warn!("Ignoring {} trailing byte(s)", reader.remaining());
    }
    Ok(variables)
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, MatError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated)?;
    Ok(inflated)
}

/// Cursor over a sequence of tagged elements
struct ElementReader<'a, B> {
    data: &'a [u8],
    pos: usize,
    order: PhantomData<B>,
}

impl<'a, B: ByteOrder> ElementReader<'a, B> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            order: PhantomData,
        }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], MatError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                MatError::InvalidFormat(format!(
                    "element of {} bytes overruns its container ({} bytes left)",
                    len,
                    self.remaining()
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Next element as `(data type, payload)`
    fn read_tag(&mut self) -> Result<(u32, &'a [u8]), MatError> {
        let mut tag = self.take(TAG_LEN)?;
        let first = tag.read_u32::<B>()?;

        let small_len = (first >> 16) as usize;
        if small_len != 0 {
            if small_len > 4 {
                return Err(MatError::InvalidFormat(format!(
                    "small element claims {} bytes",
                    small_len
                )));
            }
            return Ok((first & 0xffff, &tag[..small_len]));
        }

        let nbytes = tag.read_u32::<B>()? as usize;
        let data = self.take(nbytes)?;
        if first != MI_COMPRESSED {
            let padding = (8 - nbytes % 8) % 8;
            self.pos += padding.min(self.remaining());
        }
        Ok((first, data))
    }

    fn expect(&mut self, allowed: &[u32], what: &str) -> Result<(u32, &'a [u8]), MatError> {
        let (data_type, data) = self.read_tag()?;
        if !allowed.contains(&data_type) {
            return Err(MatError::InvalidFormat(format!(
                "{}: unexpected data type {}",
                what, data_type
            )));
        }
        Ok((data_type, data))
    }

    fn read_nested(&mut self) -> Result<MatArray, MatError> {
        let (_, data) = self.expect(&[MI_MATRIX], "nested array")?;
        read_matrix::<B>(data).map(|(_, array)| array)
    }
}

/// Decode one `miMATRIX` payload into its name and array
fn read_matrix<B: ByteOrder>(data: &[u8]) -> Result<(String, MatArray), MatError> {
    if data.is_empty() {
        return Ok((String::new(), MatArray::Empty));
    }

    let mut reader = ElementReader::<B>::new(data);
    let (_, mut flags) = reader.expect(&[MI_UINT32], "array flags")?;
    let flags = flags.read_u32::<B>()?;
    let class_code = flags & 0xff;

    let (dims_type, dims) = reader.expect(&[MI_INT32], "dimensions")?;
    let dims: Vec<usize> = decode_numeric::<B>(dims_type, dims)?
        .into_iter()
        .map(|d| d.max(0.0) as usize)
        .collect();
    let count = element_count(&dims)?;

    let (_, name) = reader.expect(&[MI_INT8, MI_UINT8, MI_UTF8], "array name")?;
    let name = String::from_utf8_lossy(name).into_owned();

    let array = match class_code {
        MX_CELL => {
            ensure_room(&reader, count, TAG_LEN, "cell array")?;
            let cells = (0..count)
                .map(|_| reader.read_nested())
                .collect::<Result<Vec<_>, _>>()?;
            MatArray::Cell { dims, cells }
        }
        MX_STRUCT => read_struct(&mut reader, dims, count)?,
        MX_CHAR => {
            let (data_type, data) = reader.read_tag()?;
            MatArray::Char {
                dims,
                text: decode_text::<B>(data_type, data)?,
            }
        }
        MX_OBJECT => return Err(MatError::Unsupported("object arrays".to_string())),
        MX_SPARSE => return Err(MatError::Unsupported("sparse arrays".to_string())),
        code => {
            let class = MatClass::from_code(code)
                .ok_or_else(|| MatError::Unsupported(format!("array class {}", code)))?;
            let (data_type, real) = reader.read_tag()?;
            let data = decode_numeric::<B>(data_type, real)?;
            if data.len() != count {
                return Err(MatError::InvalidFormat(format!(
                    "'{}' has {} value(s) for dimensions {:?}",
                    name,
                    data.len(),
                    dims
                )));
            }
            if flags & FLAG_COMPLEX != 0 {
                warn!("Dropping imaginary part of '{}'", name);
            }
            MatArray::Numeric { class, dims, data }
        }
    };
    Ok((name, array))
}

/// Product of `dims`, rejecting products that do not fit in `usize`
fn element_count(dims: &[usize]) -> Result<usize, MatError> {
    dims.iter()
        .try_fold(1usize, |count, &d| count.checked_mul(d))
        .ok_or_else(|| MatError::InvalidFormat(format!("dimensions {:?} overflow", dims)))
}

/// Fail unless `count` nested elements of at least `min_bytes` each can fit
fn ensure_room<B: ByteOrder>(
    reader: &ElementReader<'_, B>,
    count: usize,
    min_bytes: usize,
    what: &str,
) -> Result<(), MatError> {
    match count.checked_mul(min_bytes) {
        Some(needed) if needed <= reader.remaining() => Ok(()),
        _ => Err(MatError::InvalidFormat(format!(
            "{} of {} element(s) overruns its container ({} bytes left)",
            what,
            count,
            reader.remaining()
        ))),
    }
}

fn read_struct<B: ByteOrder>(
    reader: &mut ElementReader<'_, B>,
    dims: Vec<usize>,
    count: usize,
) -> Result<MatArray, MatError> {
    let (len_type, name_len) = reader.expect(&[MI_INT32], "field name length")?;
    let name_len = decode_numeric::<B>(len_type, name_len)?
        .first()
        .copied()
        .unwrap_or(0.0) as usize;

    let (_, names) = reader.expect(&[MI_INT8, MI_UINT8], "field names")?;
    let field_names: Vec<String> = if name_len == 0 {
        Vec::new()
    } else {
        names
            .chunks(name_len)
            .map(|chunk| {
                let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
                String::from_utf8_lossy(&chunk[..end]).into_owned()
            })
            .collect()
    };

    // A struct without fields stores nothing per element.
    let count = if field_names.is_empty() { 0 } else { count };
    ensure_room(reader, count, field_names.len() * TAG_LEN, "struct array")?;
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        let fields = field_names
            .iter()
            .map(|_| reader.read_nested())
            .collect::<Result<Vec<_>, _>>()?;
        elements.push(fields);
    }

    Ok(MatArray::Struct {
        dims,
        field_names,
        elements,
    })
}

/// Widen a numeric payload to `f64`
fn decode_numeric<B: ByteOrder>(data_type: u32, mut bytes: &[u8]) -> Result<Vec<f64>, MatError> {
    let width = match data_type {
        MI_INT8 | MI_UINT8 | MI_UTF8 => 1,
        MI_INT16 | MI_UINT16 => 2,
        MI_INT32 | MI_UINT32 | MI_SINGLE => 4,
        MI_DOUBLE | MI_INT64 | MI_UINT64 => 8,
        other => {
            return Err(MatError::Unsupported(format!(
                "numeric data type {}",
                other
            )))
        }
    };
    if bytes.len() % width != 0 {
        return Err(MatError::InvalidFormat(format!(
            "{} bytes is not a whole number of {}-byte values",
            bytes.len(),
            width
        )));
    }

    let count = bytes.len() / width;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let value = match data_type {
            MI_INT8 => bytes.read_i8()? as f64,
            MI_UINT8 | MI_UTF8 => bytes.read_u8()? as f64,
            MI_INT16 => bytes.read_i16::<B>()? as f64,
            MI_UINT16 => bytes.read_u16::<B>()? as f64,
            MI_INT32 => bytes.read_i32::<B>()? as f64,
            MI_UINT32 => bytes.read_u32::<B>()? as f64,
            MI_SINGLE => bytes.read_f32::<B>()? as f64,
            MI_INT64 => bytes.read_i64::<B>()? as f64,
            MI_UINT64 => bytes.read_u64::<B>()? as f64,
            _ => bytes.read_f64::<B>()?,
        };
        values.push(value);
    }
    Ok(values)
}

fn decode_text<B: ByteOrder>(data_type: u32, mut bytes: &[u8]) -> Result<String, MatError> {
    match data_type {
        MI_INT8 | MI_UINT8 | MI_UTF8 => Ok(String::from_utf8_lossy(bytes).into_owned()),
        MI_UINT16 | MI_UTF16 => {
            let mut units = Vec::with_capacity(bytes.len() / 2);
            while bytes.len() >= 2 {
                units.push(bytes.read_u16::<B>()?);
            }
            Ok(String::from_utf16_lossy(&units))
        }
        MI_UTF32 => {
            let mut text = String::with_capacity(bytes.len() / 4);
            while bytes.len() >= 4 {
                let code = bytes.read_u32::<B>()?;
                text.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Ok(text)
        }
        other => Err(MatError::Unsupported(format!(
            "character data type {}",
            other
        ))),
    }
}
