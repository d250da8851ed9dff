//! Line-oriented finding output

use pkgcruft_errors::Error;
use pkgcruft_guard::Finding;
use std::io::{self, Write};

/// Writes one finding per line
pub struct FindingWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> FindingWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// # Errors
    ///
    /// Returns an error if the line cannot be written, including when the
    /// reader has gone away.
    pub fn write(&mut self, finding: &Finding) -> Result<(), Error> {
        writeln!(self.out, "{finding}")?;
        self.written += 1;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if buffered output cannot be flushed.
    pub fn finish(mut self) -> Result<usize, Error> {
        self.out.flush()?;
        Ok(self.written)
    }
}

/// Write clap's usage or help text; a reader that went away is not an error
///
/// # Errors
///
/// Returns any write failure other than a broken pipe.
pub fn write_text<W: Write>(mut out: W, text: &str) -> io::Result<()> {
    match out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
