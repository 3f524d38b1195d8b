//! PNG export with embedded view metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::raster::Raster;

/// Metadata to embed in an exported PNG as tEXt chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportMetadata {
    /// Shareable `x=…&y=…&scale=…` query for the exported view.
    pub query: String,
    pub max_iterations: u32,
}

/// Write `raster` as an RGBA PNG with the view's query string embedded.
///
/// Uses the `png` crate directly so the metadata survives as plain tEXt
/// chunks readable by exiftool and most image viewers.
pub fn export_png(raster: &Raster, path: &Path, metadata: &ExportMetadata) -> crate::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, raster.width, raster.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), "Mandelband".to_string())?;
    for (key, value) in metadata_pairs(raster, metadata) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&raster.pixels)?;
    png_writer.finish()?;

    debug!(
        width = raster.width,
        height = raster.height,
        "Exported PNG to {}",
        path.display()
    );
    Ok(())
}

fn metadata_pairs(raster: &Raster, meta: &ExportMetadata) -> Vec<(String, String)> {
    vec![
        ("Mandelband.View".into(), meta.query.clone()),
        (
            "Mandelband.MaxIterations".into(),
            meta.max_iterations.to_string(),
        ),
        (
            "Mandelband.Resolution".into(),
            format!("{}x{}", raster.width, raster.height),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn meta() -> ExportMetadata {
        ExportMetadata {
            query: "x=-2.75&y=-1.5&scale=200".into(),
            max_iterations: 1000,
        }
    }

    #[test]
    fn export_creates_valid_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        export_png(&Raster::new(4, 3), &path, &meta()).unwrap();

        let mut file = std::fs::File::open(&path).unwrap();
        let mut header = [0u8; 8];
        file.read_exact(&mut header).unwrap();
        assert_eq!(&header, b"\x89PNG\r\n\x1a\n", "valid PNG signature");
    }

    #[test]
    fn export_embeds_text_chunks_and_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.png");
        let mut raster = Raster::new(2, 2);
        raster.pixels[0..4].copy_from_slice(&[10, 20, 30, 255]);
        export_png(&raster, &path, &meta()).unwrap();

        let decoder = png::Decoder::new(std::fs::File::open(&path).unwrap());
        let mut reader = decoder.read_info().unwrap();
        {
            let texts = &reader.info().uncompressed_latin1_text;
            assert!(texts
                .iter()
                .any(|t| t.keyword == "Software" && t.text == "Mandelband"));
            assert!(texts
                .iter()
                .any(|t| t.keyword == "Mandelband.View" && t.text == "x=-2.75&y=-1.5&scale=200"));
            assert!(texts
                .iter()
                .any(|t| t.keyword == "Mandelband.MaxIterations" && t.text == "1000"));
        }

        let mut buf = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buf).unwrap();
        assert_eq!((frame.width, frame.height), (2, 2));
        assert_eq!(&buf[..frame.buffer_size()], raster.pixels.as_slice());
    }

    #[test]
    fn export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("frame.png");
        assert!(matches!(
            export_png(&Raster::new(1, 1), &path, &meta()),
            Err(crate::RenderError::Io(_))
        ));
    }
}
