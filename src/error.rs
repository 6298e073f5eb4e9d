use std::io;
use std::path::PathBuf;

/// Host-level failures surfaced to an embedder. Guest-visible conditions
/// (execution faults, device-absent reads, arithmetic edge cases) are not
/// represented here; they are total, silent, local recoveries per the
/// error handling design, not failures a caller needs to decide about.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to open disk image {path:?}: {source}")]
    DiskOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
