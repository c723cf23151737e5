//! Seekable output sinks.
//!
//! The writer's back-patching step overwrites offset slots that were emitted earlier, so an
//! output must support random-access overwrites in addition to appending. An append-only
//! stream cannot be used as a [`crate::file::sink::Sink`].
//!
//! - [`Vec<u8>`] is the in-memory sink used by [`crate::Document::to_bytes`].
//! - [`crate::file::sink::StreamSink`] adapts any [`std::io::Write`] + [`std::io::Seek`]
//!   handle, such as a buffered [`std::fs::File`].
//! - [`crate::file::sink::FileSink`] writes a file atomically: bytes go to a sibling path that
//!   only replaces the target once the stream is complete.

use std::{
    ffi::OsString,
    fs,
    io::{BufWriter, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use crate::Result;

/// Output that can append bytes and overwrite bytes it has already received.
pub trait Sink {
    /// Number of bytes appended so far (the end-of-stream cursor)
    fn position(&self) -> u64;

    /// Appends `bytes` at the end of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the underlying handle fails.
    fn append(&mut self, bytes: &[u8]) -> Result<()>;

    /// Overwrites already written bytes starting at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if the range extends past the end of the
    /// stream, or [`crate::Error::FileError`] if the underlying handle fails.
    fn overwrite(&mut self, position: u64, bytes: &[u8]) -> Result<()>;
}

fn check_range(position: u64, len: usize, end: u64) -> Result<()> {
    match position.checked_add(len as u64) {
        Some(range_end) if range_end <= end => Ok(()),
        _ => Err(truncated_error!(
            position,
            len,
            end.saturating_sub(position)
        )),
    }
}

impl Sink for Vec<u8> {
    fn position(&self) -> u64 {
        self.len() as u64
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn overwrite(&mut self, position: u64, bytes: &[u8]) -> Result<()> {
        check_range(position, bytes.len(), self.position())?;

        #[allow(clippy::cast_possible_truncation)]
        let start = position as usize;
        self[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// [`Sink`] over a seekable writer.
///
/// Appends go to the end of the stream; overwrites seek back, write and return to the end.
/// The stream is expected to start empty.
pub struct StreamSink<W: Write + Seek> {
    inner: W,
    end: u64,
}

impl<W: Write + Seek> StreamSink<W> {
    /// Wraps an empty seekable writer.
    pub fn new(inner: W) -> Self {
        StreamSink { inner, end: 0 }
    }

    /// Flushes and returns the wrapped writer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if flushing fails.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write + Seek> Sink for StreamSink<W> {
    fn position(&self) -> u64 {
        self.end
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.end += bytes.len() as u64;
        Ok(())
    }

    fn overwrite(&mut self, position: u64, bytes: &[u8]) -> Result<()> {
        check_range(position, bytes.len(), self.end)?;

        self.inner.seek(SeekFrom::Start(position))?;
        self.inner.write_all(bytes)?;
        self.inner.seek(SeekFrom::Start(self.end))?;
        Ok(())
    }
}

/// [`Sink`] producing a file at a target path, all or nothing.
///
/// The stream is written to `<target>.partial` in the same directory. [`FileSink::finalize`]
/// flushes it and renames it over the target. A sink dropped without being finalized removes
/// the partial file and leaves any existing file at the target untouched.
pub struct FileSink {
    inner: Option<StreamSink<BufWriter<fs::File>>>,
    partial_path: PathBuf,
    target_path: PathBuf,
    finalized: bool,
}

impl FileSink {
    /// Creates the partial file next to `target_path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the partial file cannot be created.
    pub fn create(target_path: &Path) -> Result<Self> {
        let mut partial: OsString = target_path.as_os_str().to_owned();
        partial.push(".partial");
        let partial_path = PathBuf::from(partial);

        let file = fs::File::create(&partial_path)?;
        Ok(FileSink {
            inner: Some(StreamSink::new(BufWriter::new(file))),
            partial_path,
            target_path: target_path.to_path_buf(),
            finalized: false,
        })
    }

    /// Path the file will have once finalized
    #[must_use]
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    fn stream(&mut self) -> Result<&mut StreamSink<BufWriter<fs::File>>> {
        self.inner
            .as_mut()
            .ok_or_else(|| malformed_error!("File sink for {} was already finalized", self.target_path.display()))
    }

    /// Flushes the stream and moves it to the target path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if flushing or renaming fails. The partial file is
    /// removed in that case.
    pub fn finalize(mut self) -> Result<()> {
        let stream = self
            .inner
            .take()
            .ok_or_else(|| malformed_error!("File sink for {} was already finalized", self.target_path.display()))?;
        let writer = stream.into_inner()?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        fs::rename(&self.partial_path, &self.target_path)?;
        self.finalized = true;
        Ok(())
    }
}

impl Sink for FileSink {
    fn position(&self) -> u64 {
        self.inner.as_ref().map_or(0, |stream| stream.position())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream()?.append(bytes)
    }

    fn overwrite(&mut self, position: u64, bytes: &[u8]) -> Result<()> {
        self.stream()?.overwrite(position, bytes)
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if !self.finalized {
            // Close the handle before removing the incomplete file
            drop(self.inner.take());
            let _ = fs::remove_file(&self.partial_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Cursor;

    #[test]
    fn vec_sink_overwrite() {
        let mut sink: Vec<u8> = Vec::new();
        Sink::append(&mut sink, &[0, 0, 0, 0, 9]).unwrap();
        sink.overwrite(1, &[7, 8]).unwrap();
        assert_eq!(sink, vec![0, 7, 8, 0, 9]);
        assert_eq!(Sink::position(&sink), 5);

        assert!(matches!(
            sink.overwrite(4, &[1, 2]),
            Err(Error::TruncatedStream { .. })
        ));
    }

    #[test]
    fn stream_sink_overwrite() {
        let mut sink = StreamSink::new(Cursor::new(Vec::new()));
        sink.append(&[1, 2, 3]).unwrap();
        sink.overwrite(0, &[9]).unwrap();
        sink.append(&[4]).unwrap();
        assert_eq!(sink.position(), 4);

        let cursor = sink.into_inner().unwrap();
        assert_eq!(cursor.into_inner(), vec![9, 2, 3, 4]);
    }

    #[test]
    fn file_sink_replaces_target_on_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.bin");
        fs::write(&target, [0xEE]).unwrap();

        let mut sink = FileSink::create(&target).unwrap();
        assert_eq!(sink.target_path(), target.as_path());
        sink.append(&[0, 0, 3]).unwrap();
        assert_eq!(sink.position(), 3);
        sink.overwrite(0, &[1, 2]).unwrap();
        assert_eq!(fs::read(&target).unwrap(), vec![0xEE]);

        sink.finalize().unwrap();
        assert_eq!(fs::read(&target).unwrap(), vec![1, 2, 3]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn file_sink_dropped_leaves_target_intact() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.bin");
        fs::write(&target, [0xEE]).unwrap();

        let mut sink = FileSink::create(&target).unwrap();
        sink.append(&[1, 2, 3]).unwrap();
        drop(sink);

        assert_eq!(fs::read(&target).unwrap(), vec![0xEE]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
