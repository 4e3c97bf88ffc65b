//! DCTDecode (JPEG) implementation.
//!
//! Decoding parses the JPEG header to establish the color model and
//! dimensions, then emits raw row-major samples with component order
//! matching the declared PDF colorspace: L8/L16 for grayscale, RGB for RGB
//! and YCbCr sources, and CMYK with inverted bytes to compensate for the
//! Adobe APP14 convention. Encoding produces a baseline JPEG at the
//! configured quality.

use image::codecs::jpeg::JpegEncoder;
use jpeg_decoder::PixelFormat;

use crate::error::{Error, Result};

/// Default JPEG quality for encoding (0-100; lossy even at 100).
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// DCT filter parameters, inferred from the JPEG header when a codec is
/// built from a stream and used to describe the raw samples when encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DctParams {
    /// Color components per sample: 1 (gray), 3 (RGB), 4 (CMYK)
    pub color_components: usize,
    /// Bits per component: 8 or 16
    pub bits_per_component: usize,
    /// Image width in samples
    pub width: usize,
    /// Image height in samples
    pub height: usize,
    /// Encoding quality (0-100)
    pub quality: u8,
}

impl Default for DctParams {
    fn default() -> Self {
        Self {
            color_components: 3,
            bits_per_component: 8,
            width: 0,
            height: 0,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl DctParams {
    /// Infer parameters from a JPEG header without decoding the image.
    pub fn from_jpeg_header(encoded: &[u8]) -> Result<Self> {
        let mut decoder = jpeg_decoder::Decoder::new(encoded);
        decoder
            .read_info()
            .map_err(|e| Error::decode("DCTDecode", e.to_string()))?;
        let info = decoder
            .info()
            .ok_or_else(|| Error::decode("DCTDecode", "missing image info"))?;

        let (color_components, bits_per_component) = match info.pixel_format {
            PixelFormat::L8 => (1, 8),
            PixelFormat::L16 => (1, 16),
            // YCbCr sources decode to RGB; alpha does not occur in JPEG.
            PixelFormat::RGB24 => (3, 8),
            PixelFormat::CMYK32 => (4, 8),
        };

        Ok(Self {
            color_components,
            bits_per_component,
            width: info.width as usize,
            height: info.height as usize,
            quality: DEFAULT_JPEG_QUALITY,
        })
    }
}

pub(crate) fn decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = jpeg_decoder::Decoder::new(input);
    let pixels = decoder
        .decode()
        .map_err(|e| Error::decode("DCTDecode", e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| Error::decode("DCTDecode", "missing image info"))?;

    match info.pixel_format {
        // PDF DeviceCMYK expects the components inverted relative to the
        // APP14 Adobe transform the decoder reports.
        PixelFormat::CMYK32 => Ok(pixels.iter().map(|&b| 255 - b).collect()),
        _ => Ok(pixels),
    }
}

pub(crate) fn encode(data: &[u8], params: &DctParams) -> Result<Vec<u8>> {
    let color = match (params.color_components, params.bits_per_component) {
        (1, 8) => image::ColorType::L8,
        (3, 8) => image::ColorType::Rgb8,
        (components, bits) => {
            return Err(Error::UnsupportedEncodingParameters(format!(
                "DCT encoding of {} components at {} bits",
                components, bits
            )));
        }
    };

    let expected = params.width * params.height * params.color_components;
    if data.len() < expected {
        return Err(Error::MalformedLength {
            what: "image data",
            len: data.len(),
        });
    }

    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, params.quality);
    encoder
        .encode(
            &data[..expected],
            params.width as u32,
            params.height as u32,
            color,
        )
        .map_err(|e| Error::decode("DCTDecode", e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_params(width: usize, height: usize) -> DctParams {
        DctParams {
            color_components: 1,
            bits_per_component: 8,
            width,
            height,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    #[test]
    fn test_encode_then_sniff_gray() {
        let params = gray_params(8, 4);
        let data = vec![200u8; 8 * 4];
        let jpeg = encode(&data, &params).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]); // SOI marker

        let sniffed = DctParams::from_jpeg_header(&jpeg).unwrap();
        assert_eq!(sniffed.color_components, 1);
        assert_eq!(sniffed.bits_per_component, 8);
        assert_eq!(sniffed.width, 8);
        assert_eq!(sniffed.height, 4);
    }

    #[test]
    fn test_encode_decode_dimensions_rgb() {
        let params = DctParams {
            color_components: 3,
            width: 4,
            height: 2,
            ..Default::default()
        };
        let data = vec![128u8; 4 * 2 * 3];
        let jpeg = encode(&data, &params).unwrap();

        let decoded = decode(&jpeg).unwrap();
        // DCT is lossy; only shape is guaranteed.
        assert_eq!(decoded.len(), data.len());
    }

    #[test]
    fn test_decode_flat_gray_is_close() {
        let params = gray_params(16, 16);
        let data = vec![99u8; 16 * 16];
        let jpeg = encode(&data, &params).unwrap();
        let decoded = decode(&jpeg).unwrap();
        assert_eq!(decoded.len(), data.len());
        // A constant image survives the transform within a small tolerance.
        for &b in &decoded {
            assert!((b as i16 - 99).abs() <= 4, "sample {} too far from 99", b);
        }
    }

    #[test]
    fn test_encode_rejects_cmyk_and_16bit() {
        let cmyk = DctParams {
            color_components: 4,
            width: 2,
            height: 2,
            ..Default::default()
        };
        assert!(matches!(
            encode(&[0u8; 16], &cmyk),
            Err(Error::UnsupportedEncodingParameters(_))
        ));

        let gray16 = DctParams {
            color_components: 1,
            bits_per_component: 16,
            width: 2,
            height: 2,
            ..Default::default()
        };
        assert!(encode(&[0u8; 8], &gray16).is_err());
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let params = gray_params(8, 8);
        assert!(matches!(
            encode(&[0u8; 10], &params),
            Err(Error::MalformedLength { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"not a jpeg at all").is_err());
        assert!(DctParams::from_jpeg_header(b"").is_err());
    }
}
