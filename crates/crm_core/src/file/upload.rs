//! Upload service: type sniffing, naming and storage.

use crate::file::storage::FileStorage;
use crate::file::{FileError, FileFolder, FileResult};
use log::info;
use uuid::Uuid;

/// Image formats accepted by image folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageType {
    /// Detects the format from the payload's leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }
}

/// Stored paths of one upload, relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub paths: Vec<String>,
    pub mime_type: String,
}

pub struct FileUploadService<S> {
    storage: S,
}

impl<S: FileStorage> FileUploadService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Stores an image as `<folder>/<uuid>.<ext>`.
    pub fn upload_image(&self, bytes: &[u8], folder: FileFolder) -> FileResult<UploadedFile> {
        if bytes.is_empty() {
            return Err(FileError::EmptyPayload);
        }
        if !folder.is_image_folder() {
            return Err(FileError::InvalidFolder(folder));
        }
        let image_type = ImageType::sniff(bytes).ok_or(FileError::UnsupportedImageType)?;
        let path = format!(
            "{}/{}.{}",
            folder.as_str(),
            Uuid::new_v4(),
            image_type.extension()
        );
        self.storage.write(&path, bytes)?;
        info!(
            "event=file_upload module=file status=ok folder={} kind=image mime={}",
            folder.as_str(),
            image_type.mime_type()
        );
        Ok(UploadedFile {
            paths: vec![path],
            mime_type: image_type.mime_type().to_string(),
        })
    }

    /// Stores any payload as `<folder>/<uuid>.<ext>`, keeping the client's extension.
    pub fn upload_file(
        &self,
        bytes: &[u8],
        filename: &str,
        mime_type: &str,
        folder: FileFolder,
    ) -> FileResult<UploadedFile> {
        if bytes.is_empty() {
            return Err(FileError::EmptyPayload);
        }
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase);
        let path = match extension {
            Some(ext) => format!("{}/{}.{ext}", folder.as_str(), Uuid::new_v4()),
            None => format!("{}/{}", folder.as_str(), Uuid::new_v4()),
        };
        self.storage.write(&path, bytes)?;
        info!(
            "event=file_upload module=file status=ok folder={} kind=file",
            folder.as_str()
        );
        Ok(UploadedFile {
            paths: vec![path],
            mime_type: mime_type.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FileUploadService, ImageType};
    use crate::file::{FileError, FileFolder, FileStorage, LocalFileStorage};

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn sniff_recognises_common_image_headers() {
        assert_eq!(ImageType::sniff(&PNG_HEADER), Some(ImageType::Png));
        assert_eq!(ImageType::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageType::Jpeg));
        assert_eq!(ImageType::sniff(b"GIF89a...."), Some(ImageType::Gif));
        assert_eq!(ImageType::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageType::Webp));
        assert_eq!(ImageType::sniff(b"%PDF-1.7"), None);
    }

    #[test]
    fn image_upload_stores_under_folder_with_sniffed_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = FileUploadService::new(LocalFileStorage::new(dir.path()));

        let uploaded = service
            .upload_image(&PNG_HEADER, FileFolder::PersonPicture)
            .expect("upload");

        assert_eq!(uploaded.paths.len(), 1);
        let path = &uploaded.paths[0];
        assert!(path.starts_with("person-picture/"));
        assert!(path.ends_with(".png"));
        assert_eq!(uploaded.mime_type, "image/png");
        assert_eq!(service.storage().read(path).expect("read"), PNG_HEADER.to_vec());
    }

    #[test]
    fn non_image_payload_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = FileUploadService::new(LocalFileStorage::new(dir.path()));
        assert!(matches!(
            service.upload_image(b"%PDF-1.7", FileFolder::ProfilePicture),
            Err(FileError::UnsupportedImageType)
        ));
        assert!(matches!(
            service.upload_image(&[], FileFolder::ProfilePicture),
            Err(FileError::EmptyPayload)
        ));
    }

    #[test]
    fn attachment_upload_keeps_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = FileUploadService::new(LocalFileStorage::new(dir.path()));
        let uploaded = service
            .upload_file(b"hello", "Notes.TXT", "text/plain", FileFolder::Attachment)
            .expect("upload");
        assert!(uploaded.paths[0].starts_with("attachment/"));
        assert!(uploaded.paths[0].ends_with(".txt"));
    }
}
