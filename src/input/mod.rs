//! Image input module
//!
//! Uploaded images arrive as raw bytes with a display name and a declared
//! format. Only JPEG, PNG and BMP are accepted, and every image must decode
//! before any OCR work starts.

mod decode;
mod types;

pub use decode::{decode_batch, decode_image, decode_owned};
pub use types::{ImageFormat, ImageInput};
