//! Input/Output file handling with [`InputFile`] and [`OutputFile`].
//!
//! These types abstract over reading/writing both plaintext and
//! gzip-compressed input/output.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::io::{self, BufWriter};
use std::io::{BufReader, Read};
use std::path::PathBuf;

/// Check if a file is gzipped by looking for the magic numbers
fn is_gzipped_file(file_path: impl Into<PathBuf>) -> io::Result<bool> {
    let mut file = File::open(file_path.into())?;
    let mut buffer = [0; 2];
    let n = file.read(&mut buffer)?;

    Ok(n == 2 && buffer == [0x1f, 0x8b])
}

/// Represents an input file.
///
/// This struct is used to handle operations on an input file, such as reading
/// from the file. This abstracts how data is read in, allowing both plaintext
/// and gzip-compressed input to be read through a common interface.
#[derive(Clone, Debug)]
pub struct InputFile {
    pub filepath: PathBuf,
}

impl InputFile {
    /// Constructs a new `InputFile`.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
        }
    }

    /// Opens the file and returns a buffered reader.
    ///
    /// Gzip-compressed input (detected from the magic bytes, not the file
    /// extension) is decompressed transparently.
    pub fn reader(&self) -> io::Result<BufReader<Box<dyn Read>>> {
        let file = File::open(self.filepath.clone())?;
        let is_gzipped = is_gzipped_file(&self.filepath)?;
        let reader: Box<dyn Read> = if is_gzipped {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(BufReader::new(reader))
    }
}

/// Represents an output file.
///
/// This struct is used to handle operations on an output file, such as
/// writing to the file. This abstracts writing both plaintext and
/// gzip-compressed files.
pub struct OutputFile {
    pub filepath: PathBuf,
}

impl OutputFile {
    /// Constructs a new `OutputFile`.
    ///
    /// If the file path ends with `.gz`, output is gzip-compressed.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
        }
    }

    /// Opens the file and returns a writer.
    pub fn writer(&self) -> io::Result<Box<dyn Write>> {
        let is_gzip = self
            .filepath
            .extension()
            .is_some_and(|ext| ext == "gz");
        let writer: Box<dyn Write> = if is_gzip {
            Box::new(BufWriter::new(GzEncoder::new(
                File::create(&self.filepath)?,
                Compression::default(),
            )))
        } else {
            Box::new(BufWriter::new(File::create(&self.filepath)?))
        };
        Ok(writer)
    }
}
