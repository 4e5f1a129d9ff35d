//! Access modes passed alongside every get and put.

use std::fmt;

/// Why a chunk is being written.
///
/// Stores use the mode to decide indexing, pinning and garbage collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ModePut {
    /// Produced by a local upload
    #[default]
    Upload,
    /// Produced by a local upload and pinned
    UploadPin,
    /// Retrieved from the network on request
    Request,
    /// Retrieved from the network on request and pinned
    RequestPin,
    /// Retrieved from the network but only eligible for the cache
    RequestCache,
    /// Received through synchronisation
    Sync,
}

impl ModePut {
    /// Whether chunks written in this mode are pinned.
    pub const fn is_pin(self) -> bool {
        matches!(self, Self::UploadPin | Self::RequestPin)
    }
}

/// Why a chunk is being read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ModeGet {
    /// Requested by a client
    #[default]
    Request,
    /// Requested by a client that wants the chunk pinned
    RequestPin,
    /// Read for synchronisation
    Sync,
    /// Read without side effects on access statistics
    Lookup,
}

impl fmt::Display for ModePut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upload => "upload",
            Self::UploadPin => "upload-pin",
            Self::Request => "request",
            Self::RequestPin => "request-pin",
            Self::RequestCache => "request-cache",
            Self::Sync => "sync",
        })
    }
}

impl fmt::Display for ModeGet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Request => "request",
            Self::RequestPin => "request-pin",
            Self::Sync => "sync",
            Self::Lookup => "lookup",
        })
    }
}
