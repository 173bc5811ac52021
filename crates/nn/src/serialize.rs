//! Little-endian primitives for the model checkpoint format.

use std::io::{Read, Write};

pub fn write_u32<W: Write>(out: &mut W, v: u32) -> std::io::Result<()> {
    out.write_all(&v.to_le_bytes())
}

pub fn write_u64<W: Write>(out: &mut W, v: u64) -> std::io::Result<()> {
    out.write_all(&v.to_le_bytes())
}

pub fn write_f32<W: Write>(out: &mut W, v: f32) -> std::io::Result<()> {
    out.write_all(&v.to_le_bytes())
}

/// Length-prefixed f32 slice.
pub fn write_vec_f32<W: Write>(out: &mut W, v: &[f32]) -> std::io::Result<()> {
    write_u64(out, v.len() as u64)?;
    for &x in v {
        write_f32(out, x)?;
    }
    Ok(())
}

pub fn read_u32<R: Read>(input: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_u64<R: Read>(input: &mut R) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn read_f32<R: Read>(input: &mut R) -> std::io::Result<f32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

pub fn read_vec_f32<R: Read>(input: &mut R) -> std::io::Result<Vec<f32>> {
    let n = read_u64(input)? as usize;
    if n > (1 << 28) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "parameter block length out of range",
        ));
    }
    let mut buf = vec![0u8; n * 4];
    input.read_exact(&mut buf)?;
    Ok(buf
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
