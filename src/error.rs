use std::io;
use thiserror::Error;

/// Errors raised while locating, decoding or copying the master file table
#[derive(Error, Debug)]
pub enum MftError {
    #[error("Format mismatch: {0}")]
    FormatMismatch(String),

    #[error("Malformed attribute list: {0}")]
    MalformedAttributeList(String),

    #[error("Malformed run-list: {0}")]
    MalformedRunList(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },
}

impl MftError {
    /// Process exit code for this kind of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            MftError::FormatMismatch(_) => 2,
            MftError::MalformedAttributeList(_) => 3,
            MftError::MalformedRunList(_) => 4,
            MftError::Io(_) => 5,
            MftError::ShortRead { .. } => 6,
        }
    }
}

pub type Result<T> = std::result::Result<T, MftError>;

/// Pipeline step an acquisition failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    OpenVolume,
    BootSector,
    SelfRecord,
    Planning,
    Extraction,
    Output,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::OpenVolume => "opening volume",
            Phase::BootSector => "decoding boot sector",
            Phase::SelfRecord => "parsing $MFT self-record",
            Phase::Planning => "planning extents",
            Phase::Extraction => "extracting $MFT",
            Phase::Output => "finalizing output file",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
#[error("{phase} failed: {source}")]
pub struct AcquireError {
    pub phase: Phase,
    #[source]
    pub source: MftError,
}

impl AcquireError {
    pub fn exit_code(&self) -> i32 {
        self.source.exit_code()
    }
}

/// Tags a phase result with the phase it came from.
pub(crate) trait PhaseExt<T> {
    fn phase(self, phase: Phase) -> std::result::Result<T, AcquireError>;
}

impl<T> PhaseExt<T> for Result<T> {
    fn phase(self, phase: Phase) -> std::result::Result<T, AcquireError> {
        self.map_err(|source| AcquireError { phase, source })
    }
}
