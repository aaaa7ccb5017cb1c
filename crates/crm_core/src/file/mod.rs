//! File storage and image upload.
//!
//! # Responsibility
//! - Name the storage folders files are grouped under.
//! - Store uploaded bytes behind a storage trait and return their paths.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod storage;
pub mod upload;

pub use storage::{FileStorage, LocalFileStorage};
pub use upload::{FileUploadService, ImageType, UploadedFile};

/// Top-level folder an uploaded file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFolder {
    ProfilePicture,
    WorkspaceLogo,
    Attachment,
    PersonPicture,
    ServerlessFunction,
}

impl FileFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProfilePicture => "profile-picture",
            Self::WorkspaceLogo => "workspace-logo",
            Self::Attachment => "attachment",
            Self::PersonPicture => "person-picture",
            Self::ServerlessFunction => "serverless-function",
        }
    }

    /// Image folders only accept payloads with a recognised image signature.
    pub fn is_image_folder(self) -> bool {
        matches!(
            self,
            Self::ProfilePicture | Self::WorkspaceLogo | Self::PersonPicture
        )
    }
}

pub type FileResult<T> = Result<T, FileError>;

/// Upload and storage failures.
#[derive(Debug)]
pub enum FileError {
    Io { path: PathBuf, source: std::io::Error },
    EmptyPayload,
    /// Payload signature is not png, jpeg, gif or webp.
    UnsupportedImageType,
    /// Path escapes the storage root or has no file name.
    InvalidPath(String),
    /// Folder does not accept this kind of upload.
    InvalidFolder(FileFolder),
    /// Storage backend failure outside the local filesystem.
    Storage(String),
}

impl Display for FileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "file storage I/O error at `{}`: {source}", path.display())
            }
            Self::EmptyPayload => write!(f, "uploaded file is empty"),
            Self::UnsupportedImageType => write!(f, "uploaded file is not a supported image"),
            Self::InvalidPath(path) => write!(f, "invalid storage path `{path}`"),
            Self::InvalidFolder(folder) => {
                write!(f, "folder `{}` does not accept this upload", folder.as_str())
            }
            Self::Storage(message) => write!(f, "file storage error: {message}"),
        }
    }
}

impl Error for FileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
