// file: src/validator/signature.rs
// description: lightweight magic-byte validator used by the terminal front-end
// reference: extension and content-type checks as in upload validators

use super::FileValidator;
use crate::config::FileKind;
use crate::models::{IntakeFile, ValidationResult};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    // "/Type /Page" but not "/Type /Pages"
    static ref PDF_PAGE: Regex = Regex::new(r"/Type\s*/Page(?-u:\b)").unwrap();
}

const SVG_SNIFF_LEN: usize = 1024;

/// Checks emptiness, extension and leading magic bytes. PDFs additionally get
/// a page count from their page objects; other kinds count as one page.
pub struct SignatureValidator {
    kind: FileKind,
}

impl SignatureValidator {
    pub fn new(kind: FileKind) -> Self {
        Self { kind }
    }

    fn inspect(&self, file: &IntakeFile) -> ValidationResult {
        let label = self.kind.label();
        let data = file.data().as_ref();

        if data.is_empty() {
            return ValidationResult::invalid("File is empty");
        }

        let extension = match file.extension() {
            Some(ext) if self.kind.accepts_extension(&ext) => ext,
            _ => {
                return ValidationResult::invalid(format!(
                    "Unsupported {} format",
                    label.to_lowercase()
                ));
            }
        };

        if !matches_signature(&extension, data) {
            return ValidationResult::invalid(format!("{} is corrupted or invalid", label));
        }

        match self.kind {
            FileKind::Pdf => {
                let pages = PDF_PAGE.find_iter(data).count().max(1);
                ValidationResult::valid(pages as u32)
            }
            FileKind::Image | FileKind::Video => ValidationResult::valid(1),
        }
    }
}

#[async_trait]
impl FileValidator for SignatureValidator {
    fn type_label(&self) -> &str {
        self.kind.label()
    }

    async fn validate(&self, file: &IntakeFile) -> anyhow::Result<ValidationResult> {
        let validator = SignatureValidator::new(self.kind);
        let file = file.clone();
        let result = tokio::task::spawn_blocking(move || validator.inspect(&file)).await?;
        Ok(result)
    }
}

fn matches_signature(extension: &str, data: &[u8]) -> bool {
    match extension {
        "pdf" => data.starts_with(b"%PDF-"),
        "png" => data.starts_with(b"\x89PNG\r\n\x1a\n"),
        "jpg" | "jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        "gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
        "webp" => riff_form(data, b"WEBP"),
        "svg" => {
            let head = &data[..data.len().min(SVG_SNIFF_LEN)];
            head.windows(4).any(|w| w == b"<svg")
        }
        "mp4" | "mov" => {
            data.len() >= 8
                && matches!(&data[4..8], b"ftyp" | b"moov" | b"mdat" | b"wide" | b"free")
        }
        "avi" => riff_form(data, b"AVI "),
        "wmv" => data.starts_with(&[0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11]),
        "flv" => data.starts_with(b"FLV"),
        "mkv" => data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]),
        _ => false,
    }
}

fn riff_form(data: &[u8], form: &[u8; 4]) -> bool {
    data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == form
}
