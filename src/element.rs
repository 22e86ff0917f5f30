use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::leb128;
use crate::tag::{Tag, TypeCode};
use crate::value::Value;
use crate::MAX_TAG_NAME_LEN;

/// Pick the wire type for a value: array flag plus type code.
///
/// Scalar integers (and booleans, which ride along as 0/1) use the 4-byte
/// Int32 body when they fit a signed 32-bit value, and LEB128 otherwise.
/// Integer array elements are always LEB128.
fn wire_type(value: &Value) -> Result<(bool, TypeCode)> {
    Ok(match value {
        Value::Null => (false, TypeCode::Null),
        Value::Bool(_) => (false, TypeCode::Int32),
        Value::Int(v) => {
            if i32::try_from(*v).is_ok() {
                (false, TypeCode::Int32)
            } else {
                (false, TypeCode::Leb128)
            }
        }
        Value::F64(_) => (false, TypeCode::F64),
        Value::Str(_) => (false, TypeCode::Str),
        Value::Bin(_) => (false, TypeCode::Bin),
        Value::Array(elems) => (true, array_type(elems)?),
    })
}

/// Wire element type of one array member, after boolean normalization.
/// `None` for values with no array form (null, nested sequences).
fn element_type(value: &Value) -> Option<TypeCode> {
    match value {
        Value::Bool(_) | Value::Int(_) => Some(TypeCode::Leb128),
        Value::F64(_) => Some(TypeCode::F64),
        Value::Str(_) => Some(TypeCode::Str),
        Value::Bin(_) => Some(TypeCode::Bin),
        Value::Null | Value::Array(_) => None,
    }
}

fn class_name(code: TypeCode) -> &'static str {
    match code {
        TypeCode::F64 => "double",
        TypeCode::Str => "string",
        TypeCode::Bin => "binary",
        _ => "int",
    }
}

/// Element type shared by a whole sequence. Empty sequences have no element
/// to speak for them and fall back to LEB128; the choice is invisible after
/// decode, since every empty wire array decodes to the same empty sequence.
fn array_type(elems: &[Value]) -> Result<TypeCode> {
    let mut code = TypeCode::Leb128;
    for (index, elem) in elems.iter().enumerate() {
        let elem_code = element_type(elem).ok_or(Error::HeterogeneousArray {
            expected: "a scalar element",
            found: elem.type_name(),
        })?;
        if index == 0 {
            code = elem_code;
        } else if elem_code != code {
            return Err(Error::HeterogeneousArray {
                expected: class_name(code),
                found: class_name(elem_code),
            });
        }
    }
    Ok(code)
}

/// Serialize one (name, value) record onto a byte vector: tag byte, extended
/// name length when the hint can't carry it, name bytes, value payload.
pub(crate) fn write_record(buf: &mut Vec<u8>, name: &[u8], value: &Value) -> Result<()> {
    if name.len() > MAX_TAG_NAME_LEN {
        return Err(Error::KeyTooLong { actual: name.len() });
    }
    let (array, code) = wire_type(value)?;
    let tag = Tag::new(array, code, name.len());
    buf.push(tag.into());
    if tag.name_hint == 0 {
        leb128::write_u64(buf, name.len() as u64);
    }
    buf.extend_from_slice(name);
    match value {
        Value::Null => {}
        Value::Bool(v) => buf.extend_from_slice(&i32::from(*v).to_le_bytes()),
        Value::Int(v) => match code {
            TypeCode::Int32 => buf.extend_from_slice(&(*v as i32).to_le_bytes()),
            _ => leb128::write_i64(buf, *v),
        },
        Value::F64(v) => buf.extend_from_slice(&v.to_bits().to_le_bytes()),
        Value::Str(v) => {
            leb128::write_u64(buf, v.len() as u64);
            buf.extend_from_slice(v.as_bytes());
        }
        Value::Bin(v) => {
            leb128::write_u64(buf, v.len() as u64);
            buf.extend_from_slice(v);
        }
        Value::Array(elems) => {
            leb128::write_u64(buf, elems.len() as u64);
            for elem in elems {
                match elem {
                    Value::Bool(v) => leb128::write_i64(buf, i64::from(*v)),
                    Value::Int(v) => leb128::write_i64(buf, *v),
                    Value::F64(v) => buf.extend_from_slice(&v.to_bits().to_le_bytes()),
                    Value::Str(v) => {
                        leb128::write_u64(buf, v.len() as u64);
                        buf.extend_from_slice(v.as_bytes());
                    }
                    Value::Bin(v) => {
                        leb128::write_u64(buf, v.len() as u64);
                        buf.extend_from_slice(v);
                    }
                    // array_type already rejected these
                    Value::Null | Value::Array(_) => unreachable!(),
                }
            }
        }
    }
    Ok(())
}

/// One decoded record: the tag name, borrowed from the input, and an owned
/// value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Record<'a> {
    pub name: &'a [u8],
    pub value: Value,
}

/// Iterator over the records of a BFlat byte stream. Yields one record per
/// `next()` until the input runs out, and fuses after the first error.
#[derive(Clone, Debug)]
pub(crate) struct Records<'a> {
    data: &'a [u8],
    errored: bool,
}

impl<'a> Records<'a> {
    pub fn new(data: &'a [u8]) -> Records<'a> {
        Records {
            data,
            errored: false,
        }
    }

    fn take(&mut self, len: u64, step: &'static str) -> Result<&'a [u8]> {
        if len > self.data.len() as u64 {
            return Err(Error::Truncated {
                step,
                actual: self.data.len(),
                expected: len as usize,
            });
        }
        let (bytes, rest) = self.data.split_at(len as usize);
        self.data = rest;
        Ok(bytes)
    }

    // Given the already-read tag byte, parse out the rest of the record.
    // This function *does not* set the errored flag; that's up to the caller.
    fn parse_record(&mut self, tag: Tag) -> Result<Record<'a>> {
        let name_len = if tag.name_hint != 0 {
            tag.name_hint as u64
        } else {
            leb128::read_u64(&mut self.data, "decode tag name length")?
        };
        let name = self.take(name_len, "get tag name")?;
        let value = if tag.array {
            self.parse_array(tag.code)?
        } else {
            self.parse_scalar(tag.code)?
        };
        Ok(Record { name, value })
    }

    fn parse_scalar(&mut self, code: TypeCode) -> Result<Value> {
        Ok(match code {
            TypeCode::Null => Value::Null,
            TypeCode::Int8 => {
                let v = self.data.read_i8().map_err(|_| Error::Truncated {
                    step: "decode Int8",
                    actual: 0,
                    expected: 1,
                })?;
                Value::Int(v.into())
            }
            TypeCode::Int16 => {
                let v = self.data.read_i16::<LittleEndian>().map_err(|_| {
                    Error::Truncated {
                        step: "decode Int16",
                        actual: self.data.len(),
                        expected: 2,
                    }
                })?;
                Value::Int(v.into())
            }
            TypeCode::Int32 => {
                let v = self.data.read_i32::<LittleEndian>().map_err(|_| {
                    Error::Truncated {
                        step: "decode Int32",
                        actual: self.data.len(),
                        expected: 4,
                    }
                })?;
                Value::Int(v.into())
            }
            TypeCode::Int64 => {
                let v = self.data.read_i64::<LittleEndian>().map_err(|_| {
                    Error::Truncated {
                        step: "decode Int64",
                        actual: self.data.len(),
                        expected: 8,
                    }
                })?;
                Value::Int(v)
            }
            TypeCode::Leb128 => Value::Int(leb128::read_i64(&mut self.data, "decode Leb128")?),
            TypeCode::F64 => {
                let v = self.data.read_f64::<LittleEndian>().map_err(|_| {
                    Error::Truncated {
                        step: "decode F64",
                        actual: self.data.len(),
                        expected: 8,
                    }
                })?;
                Value::F64(v)
            }
            TypeCode::Str => {
                let len = leb128::read_u64(&mut self.data, "decode Str length")?;
                let bytes = self.take(len, "get Str content")?;
                Value::Str(String::from_utf8(bytes.to_vec())?)
            }
            TypeCode::Bin => {
                let len = leb128::read_u64(&mut self.data, "decode Bin length")?;
                let bytes = self.take(len, "get Bin content")?;
                bin_value(bytes)?
            }
        })
    }

    fn parse_array(&mut self, code: TypeCode) -> Result<Value> {
        let count = leb128::read_u64(&mut self.data, "decode array count")?;
        // Every element takes at least its fixed width (or one length byte),
        // so counts the buffer can't hold fail before any allocation.
        let min_elem: u64 = match code {
            TypeCode::Int16 => 2,
            TypeCode::Int32 => 4,
            TypeCode::Int64 | TypeCode::F64 => 8,
            _ => 1,
        };
        let need = count.checked_mul(min_elem).unwrap_or(u64::MAX);
        if need > self.data.len() as u64 {
            return Err(Error::Truncated {
                step: "get array elements",
                actual: self.data.len(),
                expected: need as usize,
            });
        }
        let mut elems = Vec::with_capacity(count as usize);
        for _ in 0..count {
            elems.push(match code {
                TypeCode::Leb128 => {
                    Value::Int(leb128::read_i64(&mut self.data, "decode Leb128 element")?)
                }
                TypeCode::F64 => {
                    let v = self.data.read_f64::<LittleEndian>().map_err(|_| {
                        Error::Truncated {
                            step: "decode F64 element",
                            actual: self.data.len(),
                            expected: 8,
                        }
                    })?;
                    Value::F64(v)
                }
                TypeCode::Int8 => {
                    let v = self.data.read_i8().map_err(|_| Error::Truncated {
                        step: "decode Int8 element",
                        actual: 0,
                        expected: 1,
                    })?;
                    Value::Int(v.into())
                }
                TypeCode::Int16 => {
                    let v = self.data.read_i16::<LittleEndian>().map_err(|_| {
                        Error::Truncated {
                            step: "decode Int16 element",
                            actual: self.data.len(),
                            expected: 2,
                        }
                    })?;
                    Value::Int(v.into())
                }
                TypeCode::Int32 => {
                    let v = self.data.read_i32::<LittleEndian>().map_err(|_| {
                        Error::Truncated {
                            step: "decode Int32 element",
                            actual: self.data.len(),
                            expected: 4,
                        }
                    })?;
                    Value::Int(v.into())
                }
                TypeCode::Int64 => {
                    let v = self.data.read_i64::<LittleEndian>().map_err(|_| {
                        Error::Truncated {
                            step: "decode Int64 element",
                            actual: self.data.len(),
                            expected: 8,
                        }
                    })?;
                    Value::Int(v)
                }
                TypeCode::Str => {
                    let len = leb128::read_u64(&mut self.data, "decode Str element length")?;
                    let bytes = self.take(len, "get Str element")?;
                    Value::Str(String::from_utf8(bytes.to_vec())?)
                }
                TypeCode::Bin => {
                    let len = leb128::read_u64(&mut self.data, "decode Bin element length")?;
                    let bytes = self.take(len, "get Bin element")?;
                    bin_value(bytes)?
                }
                // rejected when the tag byte was read
                TypeCode::Null => unreachable!(),
            });
        }
        Ok(Value::Array(elems))
    }
}

#[cfg(not(feature = "bytes-as-string"))]
fn bin_value(bytes: &[u8]) -> Result<Value> {
    Ok(Value::Bin(bytes.to_vec()))
}

#[cfg(feature = "bytes-as-string")]
fn bin_value(bytes: &[u8]) -> Result<Value> {
    Ok(Value::Str(String::from_utf8(bytes.to_vec())?))
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }
        let (&raw, rest) = self.data.split_first()?;
        self.data = rest;
        let result = Tag::from_u8(raw).and_then(|tag| self.parse_record(tag));
        if result.is_err() {
            self.errored = true;
        }
        Some(result)
    }
}
