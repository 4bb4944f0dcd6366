//! Unpacking of packed archives
//!
//! A packed archive is a gzip stream wrapping an encoded archive. The gzip
//! layer is always removed by the installer; the [`Unpacker`] then turns the
//! decompressed bytes into the archive the registry installs.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;

/// Rebuilds an archive from its decompressed transport encoding
pub trait Unpacker: Send + Sync {
    /// Write the archive for `input` to `output`, returning bytes written
    fn unpack(&self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<u64>;
}

/// Unpacker for archives whose transport encoding is the archive itself
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainUnpacker;

impl Unpacker for PlainUnpacker {
    fn unpack(&self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<u64> {
        io::copy(input, output)
    }
}

/// Decompress a packed stream through `unpacker` into `output`
pub fn unpack_packed(
    packed: impl Read,
    unpacker: &dyn Unpacker,
    output: &mut dyn Write,
) -> io::Result<u64> {
    let mut decoder = GzDecoder::new(packed);
    let written = unpacker.unpack(&mut decoder, output)?;
    output.flush()?;
    Ok(written)
}
