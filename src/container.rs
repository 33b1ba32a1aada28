// Container (component H, §4.8): magic + header + tile table + bit-packed
// payload. The tile table lives in a fixed 512-byte region right after
// the header, per spec.md §9 Open Question 2 -- not duplicated inline in
// the payload the way the original Python source did it.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::config::{BitVConfig, TILE_TABLE_LEN};
use crate::error::{BitVError, FormatError};
use crate::tileset::TileTable;

pub const MAGIC: [u8; 6] = *b"BitV\0\0";
pub const TILE_TABLE_BYTES: usize = TILE_TABLE_LEN * 2;

pub fn write_container<W: Write>(
  w: &mut W,
  config: &BitVConfig,
  table: &TileTable,
  payload: &[u8],
) -> std::io::Result<()> {
  w.write_all(&MAGIC)?;
  w.write_u16::<LittleEndian>(config.width as u16)?;
  w.write_u16::<LittleEndian>(config.height as u16)?;
  w.write_u16::<LittleEndian>(config.framerate)?;
  for &pattern in table.entries() {
    w.write_u16::<LittleEndian>(pattern)?;
  }
  w.write_all(payload)?;
  Ok(())
}

pub struct ContainerFile {
  pub config: BitVConfig,
  pub table: TileTable,
  pub payload: Vec<u8>,
}

pub fn read_container<R: Read>(r: &mut R) -> Result<ContainerFile, BitVError> {
  let mut magic = [0u8; 6];
  read_exact_or(r, &mut magic, FormatError::TruncatedHeader)?;
  if magic != MAGIC {
    return Err(FormatError::BadMagic.into());
  }

  let width = read_u16_or(r, FormatError::TruncatedHeader)? as usize;
  let height = read_u16_or(r, FormatError::TruncatedHeader)? as usize;
  let framerate = read_u16_or(r, FormatError::TruncatedHeader)?;

  let config = BitVConfig::new(width, height, framerate, true)
    .map_err(|_| FormatError::InvalidExtent { w: width, h: height })?;

  let mut entries = [0u16; TILE_TABLE_LEN];
  for entry in entries.iter_mut() {
    *entry = read_u16_or(r, FormatError::TruncatedTileTable)?;
  }
  let table = TileTable::from_entries(entries);

  let mut payload = Vec::new();
  r.read_to_end(&mut payload)?;

  Ok(ContainerFile { config, table, payload })
}

fn read_exact_or<R: Read>(r: &mut R, buf: &mut [u8], err: FormatError) -> Result<(), BitVError> {
  match r.read_exact(buf) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(err.into()),
    Err(e) => Err(e.into()),
  }
}

fn read_u16_or<R: Read>(r: &mut R, err: FormatError) -> Result<u16, BitVError> {
  match r.read_u16::<LittleEndian>() {
    Ok(v) => Ok(v),
    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(err.into()),
    Err(e) => Err(e.into()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_header_and_table() {
    let config = BitVConfig::new(32, 16, 30, true).unwrap();
    let mut entries = [0u16; TILE_TABLE_LEN];
    entries[0] = 0x00FF;
    entries[1] = 0x0F0F;
    let table = TileTable::from_entries(entries);

    let mut bytes = Vec::new();
    write_container(&mut bytes, &config, &table, &[0xDE, 0xAD]).unwrap();

    let file = read_container(&mut bytes.as_slice()).unwrap();
    assert_eq!(file.config.width, 32);
    assert_eq!(file.config.height, 16);
    assert_eq!(file.config.framerate, 30);
    assert_eq!(file.table.entries(), table.entries());
    assert_eq!(file.payload, vec![0xDE, 0xAD]);
  }

  #[test]
  fn rejects_bad_magic() {
    let bytes = b"NOPE\0\0\x10\x00\x10\x00\x1e\x00".to_vec();
    let err = read_container(&mut bytes.as_slice()).unwrap_err();
    assert!(matches!(err, BitVError::Format(FormatError::BadMagic)));
  }

  #[test]
  fn rejects_truncated_header() {
    let bytes = b"BitV\0\0\x10".to_vec();
    let err = read_container(&mut bytes.as_slice()).unwrap_err();
    assert!(matches!(err, BitVError::Format(FormatError::TruncatedHeader)));
  }
}
