pub use ed::*;

use std::convert::TryInto;

/// Encodes a string as a big-endian `u16` byte length followed by its UTF-8
/// bytes.
pub fn encode_str<W: std::io::Write>(value: &str, dest: &mut W) -> ed::Result<()> {
    let len: u16 = value
        .len()
        .try_into()
        .map_err(|_| ed::Error::UnexpectedByte(0))?;
    len.encode_into(dest)?;
    dest.write_all(value.as_bytes())?;
    Ok(())
}

pub fn str_encoding_length(value: &str) -> usize {
    2 + value.len()
}

/// Decodes a string written by [`encode_str`].
pub fn decode_str<R: std::io::Read>(mut source: R) -> ed::Result<String> {
    let len = u16::decode(&mut source)?;
    let mut bytes = vec![0u8; len as usize];
    source.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| ed::Error::UnexpectedByte(0))
}

/// Encodes a list of terminated values as a big-endian `u16` count followed
/// by the values.
pub fn encode_list<T: Encode, W: std::io::Write>(values: &[T], dest: &mut W) -> ed::Result<()> {
    let len: u16 = values
        .len()
        .try_into()
        .map_err(|_| ed::Error::UnexpectedByte(0))?;
    len.encode_into(dest)?;
    for value in values {
        value.encode_into(dest)?;
    }
    Ok(())
}

pub fn list_encoding_length<T: Encode>(values: &[T]) -> ed::Result<usize> {
    values
        .iter()
        .try_fold(2, |len, value| Ok(len + value.encoding_length()?))
}

/// Decodes a list written by [`encode_list`].
pub fn decode_list<T: Decode + Terminated, R: std::io::Read>(mut source: R) -> ed::Result<Vec<T>> {
    let len = u16::decode(&mut source)?;
    (0..len).map(|_| T::decode(&mut source)).collect()
}
