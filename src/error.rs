use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::MalformedContainer {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedContainer {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! truncated_error {
    ($position:expr, $needed:expr, $available:expr) => {
        crate::Error::TruncatedStream {
            position: $position as u64,
            needed: $needed as u64,
            available: $available as u64,
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every decode or encode either fully succeeds or reports one of these variants; nothing is
/// silently defaulted to a best-guess value.
///
/// # Error Categories
///
/// ## Stream Errors
/// - [`Error::TruncatedStream`] - A fixed-size field needed more bytes than remain
/// - [`Error::InvalidPointer`] - An offset resolved outside of the stream
/// - [`Error::MalformedContainer`] - A recognized header has an impossible shape
/// - [`Error::OffsetOverflow`] - An offset does not fit into the configured field width
///
/// ## Graph Errors
/// - [`Error::UnresolvedPatch`] - A writer was finalized with patches still pending
/// - [`Error::CyclicWithoutIdentity`] - An object was scheduled for writing twice
/// - [`Error::DanglingHandle`] - A handle refers to a slot the graph does not hold
///
/// ## I/O Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Empty`] - Empty input provided
///
/// # Examples
///
/// ```rust
/// use needlework::{Error, FormatConfig, Reader, formats::mirage::LightIndexMeshGroup};
///
/// let data = [0x00, 0x00, 0x00];
/// let mut reader = Reader::new(&data, FormatConfig::mirage());
/// match reader.read_object::<LightIndexMeshGroup>() {
///     Err(Error::TruncatedStream { position, needed, .. }) => {
///         eprintln!("needed {needed} bytes at {position}");
///     }
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Not enough bytes remained for a declared fixed-size field.
    ///
    /// Always fatal to the current read; no partial value is returned.
    #[error("Truncated stream - needed {needed} bytes at {position}, {available} available")]
    TruncatedStream {
        /// Cursor position where the read was attempted
        position: u64,
        /// Number of bytes the field required
        needed: u64,
        /// Number of bytes that were left
        available: u64,
    },

    /// A pointer field resolved to a target outside of the stream.
    #[error("Invalid pointer at {slot} - target {target} is outside of the {length} byte stream")]
    InvalidPointer {
        /// Position of the offset field itself
        slot: u64,
        /// Absolute position the offset resolved to
        target: u64,
        /// Length of the stream
        length: u64,
    },

    /// A container header was recognized but is structurally impossible.
    ///
    /// The error includes the source location where the malformation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    MalformedContainer {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The writer was asked to produce output while patches were still pending.
    ///
    /// This is an internal invariant violation, not a data error.
    #[error("{0} offset patches are still unresolved")]
    UnresolvedPatch(usize),

    /// An object was scheduled for serialization after it had already been written.
    ///
    /// Identity-based deduplication makes this unreachable; it is reported rather than
    /// looping forever.
    #[error("Object {type_name} would be written twice (already placed at {position})")]
    CyclicWithoutIdentity {
        /// Type of the offending object
        type_name: &'static str,
        /// Position the object was first written to
        position: u64,
    },

    /// A handle refers to an arena slot that is missing or was never filled.
    #[error("Dangling handle {type_name}#{index}")]
    DanglingHandle {
        /// Type of the arena
        type_name: &'static str,
        /// Slot index of the handle
        index: u32,
    },

    /// An offset value does not fit into the configured offset field width.
    #[error("Offset {0} does not fit the configured offset width")]
    OffsetOverflow(u64),

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
