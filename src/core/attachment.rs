//! # Attachment Validation
//!
//! A file only becomes an [`AttachmentDescriptor`] after passing [`validate`].
//! The descriptor's `extension` is a [`DocumentFormat`], so an invalid
//! extension can't be represented and nothing downstream re-checks it.
//!
//! The extension is the authoritative signal. A declared content type is
//! accepted as a fallback because browsers and file pickers report it
//! inconsistently.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The three document formats the analysis service accepts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Txt,
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 3] = [DocumentFormat::Txt, DocumentFormat::Pdf, DocumentFormat::Docx];

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Txt => "txt",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    /// Canonical MIME string for the format.
    pub fn mime(self) -> &'static str {
        match self {
            DocumentFormat::Txt => "text/plain",
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Case-insensitive lookup by extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(ext))
    }

    /// Lookup by content type. Parameters such as `; charset=utf-8` are ignored.
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or("").trim();
        Self::ALL
            .into_iter()
            .find(|format| format.mime().eq_ignore_ascii_case(essence))
    }
}

/// A file the user picked, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    pub name: String,
    pub size_bytes: u64,
    /// Content type as reported by the source, if any.
    pub content_type: Option<String>,
    /// Where the bytes can be read from at upload time.
    pub path: Option<PathBuf>,
}

impl CandidateFile {
    /// Builds a candidate from filesystem metadata. Contents are not read.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            size_bytes: metadata.len(),
            content_type: None,
            path: Some(path.to_path_buf()),
        })
    }
}

/// A validated attachment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDescriptor {
    pub name: String,
    pub size_bytes: u64,
    pub mime_hint: String,
    pub extension: DocumentFormat,
    /// Upload source. Not persisted: a reload keeps the message but loses the file handle.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// The picked file is not one of the accepted document formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFormat {
    pub name: String,
}

impl fmt::Display for RejectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unsupported format ({}). Please upload .txt, .docx or .pdf.",
            self.name
        )
    }
}

impl std::error::Error for RejectedFormat {}

/// Accepts `.txt`, `.pdf` and `.docx` files (extension case-insensitive), or
/// any file whose declared content type is one of the three canonical MIME
/// strings. Pure: no I/O, no state.
pub fn validate(candidate: &CandidateFile) -> Result<AttachmentDescriptor, RejectedFormat> {
    let by_extension = Path::new(&candidate.name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(DocumentFormat::from_extension);

    let format = by_extension
        .or_else(|| {
            candidate
                .content_type
                .as_deref()
                .and_then(DocumentFormat::from_mime)
        })
        .ok_or_else(|| RejectedFormat {
            name: candidate.name.clone(),
        })?;

    let mime_hint = match &candidate.content_type {
        Some(ct) if DocumentFormat::from_mime(ct) == Some(format) => ct.clone(),
        _ => format.mime().to_string(),
    };

    Ok(AttachmentDescriptor {
        name: candidate.name.clone(),
        size_bytes: candidate.size_bytes,
        mime_hint,
        extension: format,
        source: candidate.path.clone(),
    })
}

/// Human-readable size ("512 B", "1.5 KB", "2.0 MB").
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, content_type: Option<&str>) -> CandidateFile {
        CandidateFile {
            name: name.to_string(),
            size_bytes: 1234,
            content_type: content_type.map(str::to_string),
            path: None,
        }
    }

    macro_rules! test_accepts {
        ( $($name:ident: $file:expr => $format:expr,)+ ) => {
            $(
                #[test]
                fn $name() {
                    let descriptor = validate(&candidate($file, None)).unwrap();
                    assert_eq!(descriptor.extension, $format);
                    assert_eq!(descriptor.name, $file);
                    assert_eq!(descriptor.size_bytes, 1234);
                }
            )+
        };
    }

    test_accepts! {
        test_accepts_txt_lower: "notes.txt" => DocumentFormat::Txt,
        test_accepts_txt_upper: "NOTES.TXT" => DocumentFormat::Txt,
        test_accepts_pdf_mixed: "Report.Pdf" => DocumentFormat::Pdf,
        test_accepts_docx_lower: "report.docx" => DocumentFormat::Docx,
        test_accepts_docx_mixed: "report.DocX" => DocumentFormat::Docx,
        test_accepts_multiple_dots: "q3.final.v2.pdf" => DocumentFormat::Pdf,
    }

    #[test]
    fn test_rejects_other_extensions() {
        for name in ["image.jpg", "setup.exe", "archive.zip", "report.doc", "noext"] {
            let err = validate(&candidate(name, None)).unwrap_err();
            assert_eq!(err.name, name);
            assert!(err.to_string().contains("Unsupported format"));
        }
    }

    #[test]
    fn test_mime_fallback_accepts_unknown_extension() {
        let descriptor = validate(&candidate("download", Some("application/pdf"))).unwrap();
        assert_eq!(descriptor.extension, DocumentFormat::Pdf);
        assert_eq!(descriptor.mime_hint, "application/pdf");
    }

    #[test]
    fn test_mime_with_parameters() {
        let descriptor =
            validate(&candidate("blob", Some("text/plain; charset=utf-8"))).unwrap();
        assert_eq!(descriptor.extension, DocumentFormat::Txt);
    }

    #[test]
    fn test_extension_wins_over_mime() {
        // A mislabeled content type doesn't override a valid extension.
        let descriptor = validate(&candidate("notes.txt", Some("image/png"))).unwrap();
        assert_eq!(descriptor.extension, DocumentFormat::Txt);
        assert_eq!(descriptor.mime_hint, "text/plain");
    }

    #[test]
    fn test_rejects_when_mime_unrelated() {
        assert!(validate(&candidate("photo.jpg", Some("image/jpeg"))).is_err());
    }

    #[test]
    fn test_source_path_not_serialized() {
        let mut c = candidate("a.txt", None);
        c.path = Some(PathBuf::from("/tmp/a.txt"));
        let descriptor = validate(&c).unwrap();
        assert!(descriptor.source.is_some());

        let json = serde_json::to_string(&descriptor).unwrap();
        assert!(!json.contains("/tmp/a.txt"));
        let back: AttachmentDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.source, None);
        assert_eq!(back.extension, DocumentFormat::Txt);
    }

    #[test]
    fn test_candidate_from_path_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.txt");
        fs::write(&path, "hello").unwrap();
        let c = CandidateFile::from_path(&path).unwrap();
        assert_eq!(c.name, "memo.txt");
        assert_eq!(c.size_bytes, 5);
        assert_eq!(c.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_candidate_from_missing_path_errors() {
        assert!(CandidateFile::from_path(Path::new("/definitely/not/here.pdf")).is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MB");
    }
}
