use crate::error::ExtractError;

/// The answer of a face extractor for one image.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Encoding of the first face found in the image.
    Encoding(Vec<f64>),
    /// The image contains no detectable face.
    NoFace,
}

/// FaceExtractor turns an encoded image into a face encoding.
///
/// Every encoding an extractor returns has the same length for the
/// lifetime of the process.
///
/// Implementations must be safe for concurrent use (Send + Sync).
#[async_trait::async_trait]
pub trait FaceExtractor: Send + Sync {
    /// Extract the encoding of the first face in `image`.
    ///
    /// Dropping the returned future cancels the extraction.
    async fn extract(&self, image: &[u8]) -> Result<Extraction, ExtractError>;
}
