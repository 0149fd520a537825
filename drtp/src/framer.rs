//! Splits a file into fixed-size chunks for the sender and reassembles
//! the chunks the receiver collects back into a file.
//!
//! Grounded on the original program's `pack_file`: the first chunk is
//! prefixed with the NUL-padded file name, every other chunk is raw file
//! bytes, and a trailing empty chunk marks end-of-file. That empty-chunk
//! sentinel is deliberately kept (see the design notes) even though the
//! FIN flag already signals the end of the transfer, because the
//! original framing ties "no more data" to an empty payload rather than
//! to a flag.

use std::fs;
use std::path::Path;

use crate::config::{CHUNK_SIZE, MAX_FILENAME_LENGTH};
use crate::error::{Error, Result};

/// Splits `path`'s contents into wire-ready chunks.
///
/// The returned `Vec` always ends with an empty `Vec<u8>` marking
/// end-of-file, matching the original program's sentinel chunk.
pub fn frame_file(path: &Path) -> Result<Vec<Vec<u8>>> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(Error::FilenameTooLong)?;

    let encoded_name = filename.as_bytes();
    if encoded_name.len() > MAX_FILENAME_LENGTH {
        return Err(Error::FilenameTooLong);
    }
    let mut name_field = [0u8; MAX_FILENAME_LENGTH];
    name_field[..encoded_name.len()].copy_from_slice(encoded_name);

    let content = fs::read(path)?;
    let mut chunks = Vec::new();

    let first_payload_cap = CHUNK_SIZE - MAX_FILENAME_LENGTH;
    let mut offset = 0;

    let first_len = first_payload_cap.min(content.len());
    let mut first = Vec::with_capacity(MAX_FILENAME_LENGTH + first_len);
    first.extend_from_slice(&name_field);
    first.extend_from_slice(&content[..first_len]);
    chunks.push(first);
    offset += first_len;

    while offset < content.len() {
        let end = (offset + CHUNK_SIZE).min(content.len());
        chunks.push(content[offset..end].to_vec());
        offset = end;
    }

    chunks.push(Vec::new());
    Ok(chunks)
}

/// Reassembled output of a completed transfer.
pub struct ReceivedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Incrementally reassembles chunks as the receiver accepts them in
/// order. The first chunk must carry the file name prefix; every later
/// chunk is appended verbatim.
#[derive(Debug, Default)]
pub struct Reassembler {
    filename: Option<String>,
    content: Vec<u8>,
    chunk_count: u32,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one in-order data chunk. Returns `Err` if the very first
    /// chunk does not carry a valid NUL-padded file name.
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        if self.chunk_count == 0 {
            if chunk.len() < MAX_FILENAME_LENGTH {
                return Err(Error::MalformedHeader);
            }
            let name_bytes = &chunk[..MAX_FILENAME_LENGTH];
            let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(MAX_FILENAME_LENGTH);
            let filename = String::from_utf8_lossy(&name_bytes[..end]).into_owned();
            self.filename = Some(filename);
            self.content.extend_from_slice(&chunk[MAX_FILENAME_LENGTH..]);
        } else {
            self.content.extend_from_slice(chunk);
        }
        self.chunk_count += 1;
        Ok(())
    }

    /// Finalizes the transfer once the sentinel empty chunk (or FIN) has
    /// been observed.
    pub fn finish(self) -> Result<ReceivedFile> {
        let filename = self.filename.ok_or(Error::MalformedHeader)?;
        Ok(ReceivedFile { filename, content: self.content })
    }
}

/// Writes a received file's content into `dir/filename`, creating `dir`
/// if it does not already exist.
pub fn write_output(dir: &Path, filename: &str, content: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let out_path = dir.join(filename);
    fs::write(out_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp_file(name: &str, content: &[u8]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("drtp-framer-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[test]
    fn frames_small_file_into_one_chunk_plus_sentinel() {
        let path = write_temp_file("small.txt", b"hello world");
        let chunks = frame_file(&path).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.last().unwrap().is_empty());
        assert_eq!(&chunks[0][..MAX_FILENAME_LENGTH][..9], b"small.txt");
    }

    #[test]
    fn frames_large_file_into_multiple_chunks() {
        let content = vec![7u8; CHUNK_SIZE * 3];
        let path = write_temp_file("big.bin", &content);
        let chunks = frame_file(&path).unwrap();
        assert!(chunks.len() > 3);
        assert!(chunks.last().unwrap().is_empty());
    }

    #[test]
    fn rejects_filename_longer_than_header_field() {
        let long_name = "x".repeat(MAX_FILENAME_LENGTH + 1);
        let path = write_temp_file(&long_name, b"data");
        assert!(matches!(frame_file(&path), Err(Error::FilenameTooLong)));
    }

    #[test]
    fn reassembles_framed_chunks_back_to_original_content() {
        let content = b"the quick brown fox jumps over the lazy dog".to_vec();
        let path = write_temp_file("fox.txt", &content);
        let chunks = frame_file(&path).unwrap();

        let mut reassembler = Reassembler::new();
        for chunk in &chunks {
            if chunk.is_empty() {
                break;
            }
            reassembler.push(chunk).unwrap();
        }
        let received = reassembler.finish().unwrap();
        assert_eq!(received.filename, "fox.txt");
        assert_eq!(received.content, content);
    }
}
