//! Little-endian binary helpers for state serialization.

use std::io::{self, Read, Write};

#[inline]
pub(crate) fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

#[inline]
pub(crate) fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

#[inline]
pub(crate) fn write_bool<W: Write>(writer: &mut W, value: bool) -> io::Result<()> {
    write_u8(writer, value as u8)
}

#[inline]
pub(crate) fn read_bool<R: Read>(reader: &mut R) -> io::Result<bool> {
    Ok(read_u8(reader)? != 0)
}

#[inline]
pub(crate) fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

#[inline]
pub(crate) fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

#[inline]
pub(crate) fn write_usize<W: Write>(writer: &mut W, value: usize) -> io::Result<()> {
    writer.write_all(&(value as u64).to_le_bytes())
}

#[inline]
pub(crate) fn read_usize<R: Read>(reader: &mut R) -> io::Result<usize> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf) as usize)
}

#[inline]
pub(crate) fn write_f32<W: Write>(writer: &mut W, value: f32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

#[inline]
pub(crate) fn read_f32<R: Read>(reader: &mut R) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

#[inline]
pub(crate) fn write_f64<W: Write>(writer: &mut W, value: f64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

#[inline]
pub(crate) fn read_f64<R: Read>(reader: &mut R) -> io::Result<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Write a float slice without a length prefix; the reader knows the count.
pub(crate) fn write_f32_all<W: Write>(writer: &mut W, data: &[f32]) -> io::Result<()> {
    for &value in data {
        write_f32(writer, value)?;
    }
    Ok(())
}

/// Read exactly `len` floats.
pub(crate) fn read_f32_exact<R: Read>(reader: &mut R, len: usize) -> io::Result<Vec<f32>> {
    let mut data = Vec::with_capacity(len);
    for _ in 0..len {
        data.push(read_f32(reader)?);
    }
    Ok(data)
}

/// Presence flag followed by a length-prefixed float vector.
pub(crate) fn write_optional_f32_vec<W: Write>(
    writer: &mut W,
    data: Option<&[f32]>,
) -> io::Result<()> {
    match data {
        Some(values) => {
            write_bool(writer, true)?;
            write_usize(writer, values.len())?;
            write_f32_all(writer, values)
        }
        None => write_bool(writer, false),
    }
}

pub(crate) fn read_optional_f32_vec<R: Read>(reader: &mut R) -> io::Result<Option<Vec<f32>>> {
    if !read_bool(reader)? {
        return Ok(None);
    }
    let len = read_usize(reader)?;
    Ok(Some(read_f32_exact(reader, len)?))
}

pub(crate) fn write_optional_f64<W: Write>(writer: &mut W, value: Option<f64>) -> io::Result<()> {
    match value {
        Some(v) => {
            write_bool(writer, true)?;
            write_f64(writer, v)
        }
        None => write_bool(writer, false),
    }
}

pub(crate) fn read_optional_f64<R: Read>(reader: &mut R) -> io::Result<Option<f64>> {
    if !read_bool(reader)? {
        return Ok(None);
    }
    Ok(Some(read_f64(reader)?))
}

/// Presence flag followed by a square row-major float matrix.
///
/// Only the row count is serialized; the reader recovers row lengths from
/// it, so a non-square matrix must be rejected here or the stream
/// desynchronizes.
pub(crate) fn write_optional_matrix<W: Write>(
    writer: &mut W,
    matrix: Option<&[Vec<f32>]>,
) -> io::Result<()> {
    match matrix {
        Some(rows) => {
            if let Some(row) = rows.iter().find(|row| row.len() != rows.len()) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "rotation matrix must be square: {} rows, found a row of length {}",
                        rows.len(),
                        row.len()
                    ),
                ));
            }
            write_bool(writer, true)?;
            write_usize(writer, rows.len())?;
            for row in rows {
                write_f32_all(writer, row)?;
            }
            Ok(())
        }
        None => write_bool(writer, false),
    }
}

pub(crate) fn read_optional_matrix<R: Read>(reader: &mut R) -> io::Result<Option<Vec<Vec<f32>>>> {
    if !read_bool(reader)? {
        return Ok(None);
    }
    let rows = read_usize(reader)?;
    let mut matrix = Vec::with_capacity(rows);
    for _ in 0..rows {
        matrix.push(read_f32_exact(reader, rows)?);
    }
    Ok(Some(matrix))
}
