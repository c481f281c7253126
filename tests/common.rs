#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use img_sweep::codec::{CodecRequest, ImageCodec};
use img_sweep::error::CodecError;
use img_sweep::formats::ImageFormat;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

pub const INKSCAPE_SVG: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- Created with Inkscape -->
<svg
   xmlns="http://www.w3.org/2000/svg"
   xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
   xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd"
   width="48"   height="48"
   viewBox="0 0 48 48">
  <metadata id="metadata1"><rdf:RDF></rdf:RDF></metadata>
  <sodipodi:namedview id="base" pagecolor="#ffffff" />
  <g   id="layer1"   inkscape:label="Layer 1" >
    <circle cx="24" cy="24" r="20" />
  </g>
</svg>
"##;

pub fn write_file(root: &Path, name: &str, contents: &[u8]) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

pub fn file_size(root: &Path, name: &str) -> u64 {
    std::fs::metadata(root.join(name)).unwrap().len()
}

pub fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A real PNG, written without any optimization.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// Returns a fixed output size per target format; unscripted targets fail.
#[derive(Default)]
pub struct ScriptedCodec {
    sizes: HashMap<ImageFormat, usize>,
    pub calls: Mutex<Vec<CodecRequest>>,
}

impl ScriptedCodec {
    pub fn with(sizes: &[(ImageFormat, usize)]) -> Self {
        Self {
            sizes: sizes.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ImageCodec for ScriptedCodec {
    fn encode(&self, request: &CodecRequest, _input: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.calls.lock().unwrap().push(*request);
        match self.sizes.get(&request.target) {
            Some(size) => Ok(vec![0u8; *size]),
            None => Err(CodecError::Unsupported(format!("{}", request.target))),
        }
    }
}
