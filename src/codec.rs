use crate::constants::{AVIF_QUALITY, AVIF_SPEED, JPEG_QUALITY, LIBDEFLATER_LEVEL, OXIPNG_PRESET};
use crate::error::CodecError;
use crate::formats::{Encoding, ImageFormat};
use crate::svg;
use image::codecs::avif::AvifEncoder;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::{WebPDecoder, WebPEncoder};
use image::{AnimationDecoder, DynamicImage};
use oxipng::{Deflaters, Options};
use std::io::Cursor;

/// A single re-encode: read `source` bytes, write `target` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecRequest {
    pub source: ImageFormat,
    pub target: ImageFormat,
    pub encoding: Encoding,
}

/// Capability provider for the actual bit-level work.
///
/// Implementations must be pure: same request and input, same output. The
/// pipeline decides what to do with the bytes.
pub trait ImageCodec: Send + Sync {
    fn encode(&self, request: &CodecRequest, input: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Codec backed by the `image` crate, `oxipng` and the built-in SVG
/// minifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCodec;

impl ImageCodec for NativeCodec {
    fn encode(&self, request: &CodecRequest, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        match (request.target, request.encoding) {
            (ImageFormat::Svg, Encoding::Minify { max_passes }) => {
                let text = std::str::from_utf8(input).map_err(|_| CodecError::InvalidSvg)?;
                Ok(svg::minify(text, max_passes).into_bytes())
            }
            (ImageFormat::Svg, _) | (_, Encoding::Minify { .. }) => Err(CodecError::Unsupported(
                format!("{} to {} with {:?}", request.source, request.target, request.encoding),
            )),
            (ImageFormat::Png, _) if request.source == ImageFormat::Png => optimize_png(input),
            (ImageFormat::Png, _) => {
                let img = decode(input, request.source)?;
                let mut out = Vec::new();
                img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)?;
                optimize_png(&out)
            }
            (ImageFormat::Jpeg, Encoding::Lossy { progressive: true, .. }) => {
                Err(CodecError::Unsupported("progressive JPEG output".to_string()))
            }
            (ImageFormat::Jpeg, encoding) => {
                let quality = match encoding {
                    Encoding::Lossy { quality, .. } => quality,
                    _ => JPEG_QUALITY,
                };
                encode_jpeg(&decode(input, request.source)?, quality)
            }
            (ImageFormat::WebP, _) => {
                reject_animation(input, request.source)?;
                encode_webp(&decode(input, request.source)?)
            }
            (ImageFormat::Avif, encoding) => {
                let quality = match encoding {
                    Encoding::Lossy { quality, .. } => quality,
                    _ => AVIF_QUALITY,
                };
                encode_avif(&decode(input, request.source)?, quality)
            }
            (ImageFormat::Gif, _) if request.source == ImageFormat::Gif => reencode_gif(input),
            (ImageFormat::Gif, _) => Err(CodecError::Unsupported(format!(
                "{} to GIF",
                request.source
            ))),
        }
    }
}

fn decode(input: &[u8], source: ImageFormat) -> Result<DynamicImage, CodecError> {
    let format = match source {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::WebP => image::ImageFormat::WebP,
        ImageFormat::Gif => image::ImageFormat::Gif,
        ImageFormat::Avif => {
            return Err(CodecError::Unsupported("AVIF decoding".to_string()));
        }
        ImageFormat::Svg => {
            return Err(CodecError::Unsupported("rasterizing SVG".to_string()));
        }
    };
    Ok(image::load_from_memory_with_format(input, format)?)
}

/// Still-image encoders would silently keep only the first frame.
fn reject_animation(input: &[u8], source: ImageFormat) -> Result<(), CodecError> {
    let animated = match source {
        ImageFormat::WebP => WebPDecoder::new(Cursor::new(input))?.has_animation(),
        ImageFormat::Gif => {
            GifDecoder::new(Cursor::new(input))?
                .into_frames()
                .take(2)
                .count()
                > 1
        }
        _ => false,
    };
    if animated {
        return Err(CodecError::Unsupported("animated WebP output".to_string()));
    }
    Ok(())
}

fn optimize_png(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut options = Options::from_preset(OXIPNG_PRESET);
    options.deflate = Deflaters::Libdeflater {
        compression: LIBDEFLATER_LEVEL,
    };
    oxipng::optimize_from_memory(input, &options)
        .map_err(|e| CodecError::PngOptimization(e.to_string()))
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;
    Ok(out)
}

// Lossless is the closest the `image` WebP encoder gets to near-lossless.
fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(img.to_rgba8()).write_with_encoder(WebPEncoder::new_lossless(&mut out))?;
    Ok(out)
}

fn encode_avif(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(img.to_rgba8()).write_with_encoder(
        AvifEncoder::new_with_speed_quality(&mut out, AVIF_SPEED, quality),
    )?;
    Ok(out)
}

fn reencode_gif(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let frames = GifDecoder::new(Cursor::new(input))?
        .into_frames()
        .collect_frames()?;

    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(frames)?;
    }
    Ok(out)
}
