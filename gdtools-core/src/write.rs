//! Writing the Genome Diff text format.
use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::Result;
use crate::genome_diff::GenomeDiff;

impl GenomeDiff {
    ///
    /// Write the header then every record in sorted order. Commented-out
    /// records are written with a leading `#`.
    ///
    /// Fails when two records describe the same thing.
    ///
    pub fn write_to<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        for line in self.metadata.header_lines() {
            writeln!(writer, "{}", line)?;
        }

        self.sort_and_check_for_duplicates(None)?;

        for record in self.entries.iter() {
            if record.is_commented_out() {
                write!(writer, "#")?;
            }
            writeln!(writer, "{}", record.to_line()?)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
    }

    /// The whole document as text.
    pub fn to_text(&mut self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
