//! Image validation and decoding
//!
//! Decoding is CPU-bound, so each image is decoded on the blocking pool.
//! Validation is fail-fast: the first invalid image in input order aborts
//! the batch.

use image::DynamicImage;

use super::types::ImageInput;
use crate::error::{PipelineError, Result};

/// Decode one image as its declared format
///
/// `index` is the image's position in the batch and is only used for error
/// reporting.
pub fn decode_image(input: &ImageInput, index: usize) -> Result<DynamicImage> {
    let format = input
        .format()
        .ok_or_else(|| PipelineError::UnsupportedFormat {
            index,
            name: input.display_name.clone(),
            format: input.declared_format.clone(),
        })?;

    if input.data.is_empty() {
        return Err(PipelineError::CorruptImage {
            index,
            name: input.display_name.clone(),
            reason: "empty payload".to_string(),
        });
    }

    let raster = image::load_from_memory_with_format(&input.data, format.to_image_format())
        .map_err(|e| PipelineError::CorruptImage {
            index,
            name: input.display_name.clone(),
            reason: e.to_string(),
        })?;

    if raster.width() == 0 || raster.height() == 0 {
        return Err(PipelineError::CorruptImage {
            index,
            name: input.display_name.clone(),
            reason: "image has zero width or height".to_string(),
        });
    }

    Ok(raster)
}

/// Decode one image on the blocking pool, handing ownership back afterwards
pub async fn decode_owned(
    input: ImageInput,
    index: usize,
) -> (ImageInput, Result<DynamicImage>) {
    let name = input.display_name.clone();
    let task = tokio::task::spawn_blocking(move || {
        let decoded = decode_image(&input, index);
        (input, decoded)
    })
    .await;

    match task {
        Ok(pair) => pair,
        Err(e) => {
            // The input moved into the panicked task; keep the name for reporting
            let placeholder = ImageInput::new(name.clone(), Vec::new(), String::new());
            let err = PipelineError::CorruptImage {
                index,
                name,
                reason: format!("Task join error: {}", e),
            };
            (placeholder, Err(err))
        }
    }
}

/// Decode a whole batch in input order, stopping at the first invalid image
///
/// Declared formats are checked for every image before any decoding starts,
/// so an unsupported upload late in the batch is reported without paying for
/// the decodes before it.
pub async fn decode_batch(
    images: Vec<ImageInput>,
) -> Result<Vec<(ImageInput, DynamicImage)>> {
    for (index, input) in images.iter().enumerate() {
        if input.format().is_none() {
            return Err(PipelineError::UnsupportedFormat {
                index,
                name: input.display_name.clone(),
                format: input.declared_format.clone(),
            });
        }
    }

    let mut decoded = Vec::with_capacity(images.len());
    for (index, input) in images.into_iter().enumerate() {
        let (input, raster) = decode_owned(input, index).await;
        let raster = raster?;
        tracing::debug!(
            "Decoded image {} ({}): {}x{}",
            index,
            input.display_name,
            raster.width(),
            raster.height()
        );
        decoded.push((input, raster));
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::test_images::encoded;
    use crate::input::ImageFormat;

    #[test]
    fn test_decode_each_supported_format() {
        for format in ImageFormat::ALL {
            let input = ImageInput::new(
                format!("img.{}", format.extension()),
                encoded(format, 8, 6),
                format.extension(),
            );
            let raster = decode_image(&input, 0).unwrap();
            assert_eq!((raster.width(), raster.height()), (8, 6));
        }
    }

    #[test]
    fn test_decode_unsupported_format() {
        let input = ImageInput::new("anim.gif", b"GIF89a".to_vec(), "image/gif");
        let err = decode_image(&input, 3).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnsupportedFormat { index: 3, ref format, .. } if format == "image/gif"
        ));
    }

    #[test]
    fn test_decode_empty_payload() {
        let input = ImageInput::new("blank.png", Vec::new(), "png");
        let err = decode_image(&input, 0).unwrap_err();
        assert!(matches!(err, PipelineError::CorruptImage { ref reason, .. } if reason == "empty payload"));
    }

    #[test]
    fn test_decode_mismatched_declaration() {
        // PNG bytes declared as BMP are rejected rather than sniffed
        let input = ImageInput::new("x.bmp", encoded(ImageFormat::Png, 4, 4), "bmp");
        let err = decode_image(&input, 1).unwrap_err();
        assert!(matches!(err, PipelineError::CorruptImage { index: 1, .. }));
    }

    #[tokio::test]
    async fn test_decode_batch_keeps_order() {
        let images = vec![
            ImageInput::new("a.png", encoded(ImageFormat::Png, 2, 2), "png"),
            ImageInput::new("b.jpg", encoded(ImageFormat::Jpeg, 3, 3), "image/jpeg"),
            ImageInput::new("c.bmp", encoded(ImageFormat::Bmp, 4, 4), "bmp"),
        ];

        let decoded = decode_batch(images).await.unwrap();
        let names: Vec<_> = decoded.iter().map(|(i, _)| i.display_name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "c.bmp"]);
        assert_eq!(decoded[2].1.width(), 4);
    }

    #[tokio::test]
    async fn test_decode_batch_reports_first_bad_image() {
        let images = vec![
            ImageInput::new("a.png", encoded(ImageFormat::Png, 2, 2), "png"),
            ImageInput::new("broken.png", b"not an image".to_vec(), "png"),
            ImageInput::new("c.png", b"also broken".to_vec(), "png"),
        ];

        let err = decode_batch(images).await.unwrap_err();
        assert_eq!(err.image_index(), Some(1));
        assert_eq!(err.image_name(), Some("broken.png"));
    }

    #[tokio::test]
    async fn test_decode_batch_checks_formats_first() {
        let images = vec![
            ImageInput::new("broken.png", b"garbage".to_vec(), "png"),
            ImageInput::new("doc.pdf", b"%PDF".to_vec(), "application/pdf"),
        ];

        let err = decode_batch(images).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { index: 1, .. }));
    }
}
