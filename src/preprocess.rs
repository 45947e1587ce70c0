use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, DynamicImage, ImageOutputFormat};

use crate::error::Result;

/// A single image laid out as `[1, size, size, 3]` (NHWC), values in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    pub size: u32,
    pub data: Vec<f32>,
}

impl ImageTensor {
    pub fn dims(&self) -> [u64; 4] {
        [1, self.size as u64, self.size as u64, 3]
    }
}

pub fn decode(image_data: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(image_data)?;
    // greyscale and alpha images are fed to the model as plain RGB
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

pub fn to_tensor(image: &DynamicImage, size: u32) -> ImageTensor {
    let resized = image.resize_exact(size, size, FilterType::CatmullRom).to_rgb8();

    let mut data = Vec::with_capacity(size as usize * size as usize * 3);
    for pixel in resized.pixels() {
        data.push(pixel[0] as f32 / 255.0);
        data.push(pixel[1] as f32 / 255.0);
        data.push(pixel[2] as f32 / 255.0);
    }

    ImageTensor { size, data }
}

/// PNG-encodes the image for echoing back into the chat transcript.
pub fn to_base64_png(image: &DynamicImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageOutputFormat::Png)?;
    Ok(STANDARD.encode(buffer.into_inner()))
}
