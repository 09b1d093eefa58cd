//! Stream compression post-pass built on top of `lopdf`.
//!
//! The PDF backend writes image and content streams uncompressed. Photo-heavy
//! reports shrink considerably once every stream is deflated.

use lopdf::Document;
use log::debug;

use crate::error::ReportError;

/// Re-saves `pdf_bytes` with every stream compressed.
pub fn compress_pdf(pdf_bytes: Vec<u8>) -> Result<Vec<u8>, ReportError> {
    let mut document = Document::load_mem(&pdf_bytes)?;
    document.compress();

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    debug!(
        "Compressed PDF streams: {} -> {} bytes",
        pdf_bytes.len(),
        buffer.len()
    );
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::compress_pdf;
    use crate::error::ReportError;

    #[test]
    fn garbage_input_is_rejected() {
        let err = compress_pdf(b"not a pdf".to_vec()).unwrap_err();
        assert!(matches!(err, ReportError::Compress(_)));
    }
}
