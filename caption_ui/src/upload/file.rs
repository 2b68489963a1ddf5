use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A file handed to the page by either the drop zone or the file picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub size: usize,
    #[serde(skip)]
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image() {
        let png = ImageFile::new("dog.png", "image/png", Bytes::from_static(b"png"));
        let text = ImageFile::new("notes.txt", "text/plain", Bytes::from_static(b"txt"));
        let blank = ImageFile::new("unknown", "", Bytes::new());
        let prefix_only = ImageFile::new("odd", "application/image/png", Bytes::new());

        assert!(png.is_image());
        assert!(!text.is_image());
        assert!(!blank.is_image());
        assert!(!prefix_only.is_image());
    }

    #[test]
    fn test_serialization_skips_bytes() {
        let file = ImageFile::new("dog.png", "image/png", Bytes::from_static(b"abcd"));
        let json = serde_json::to_value(&file).unwrap();

        assert_eq!(json["name"], "dog.png");
        assert_eq!(json["size"], 4);
        assert!(json.get("bytes").is_none());
    }
}
