//! Upload extraction: turns an uploaded `.txt` or `.pdf` into email text.

use std::borrow::Cow;

use crate::error::UploadError;

/// Accepted upload extensions (lowercase, sorted).
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

/// Maximum accepted request body, uploads included.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Extract email text from an uploaded file, dispatching on its extension.
///
/// PDF extraction is CPU-bound; async callers should run this on a
/// blocking thread.
pub fn extract_email_text(filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err(UploadError::NoSelectedFile);
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or(UploadError::UnsupportedFileType)?;

    match extension.as_str() {
        "pdf" => extract_pdf_text(bytes),
        "txt" => decode_text(bytes),
        _ => Err(UploadError::UnsupportedFileType),
    }
}

/// Extract the text of every PDF page.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, UploadError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| UploadError::Pdf(e.to_string()))?
        .trim()
        .to_string();
    if text.is_empty() {
        return Err(UploadError::Pdf("PDF contains no extractable text".to_string()));
    }
    Ok(text)
}

/// Decode a text upload: strict UTF-8, then ISO-8859-1, then Windows-1252.
///
/// The first decoding that yields non-blank text wins. A leading UTF-8 BOM
/// is dropped.
pub fn decode_text(bytes: &[u8]) -> Result<String, UploadError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let attempts: [fn(&[u8]) -> Option<Cow<'_, str>>; 3] = [
        |b| encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(b),
        |b| Some(encoding_rs::mem::decode_latin1(b)),
        |b| encoding_rs::WINDOWS_1252.decode_without_bom_handling_and_without_replacement(b),
    ];

    attempts
        .iter()
        .filter_map(|decode| decode(bytes))
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
        .ok_or(UploadError::UndecodableText)
}

/// Trim a submitted email body, rejecting blank input.
pub fn require_email_text(raw: &str) -> Result<String, UploadError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(UploadError::MissingEmailText);
    }
    Ok(text.to_string())
}
