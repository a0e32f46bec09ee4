//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP, GIF) | `image::ImageReader` with content sniffing |
//! | Grayscale | ITU-R 601-2 luma over `to_rgb8` (luma inputs pass through) |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode | `image::DynamicImage::write_to`, format from the output extension |
//! | Atomic write | `tempfile::NamedTempFile` in the output directory + `persist` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::NormalizeParams;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, Luma};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Extensions whose encoders are compiled in and accept 8-bit grayscale.
///
/// GIF is deliberately absent: its encoder works on palettized RGBA frames,
/// so a luma buffer is not guaranteed to round-trip through it.
const GRAYSCALE_ENCODERS: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("bmp", ImageFormat::Bmp),
    ("webp", ImageFormat::WebP),
];

/// Prefix of the temporary files created next to each output during encode.
pub const TEMP_PREFIX: &str = ".dataset-prep-";

/// Whether a file with this name can be written as single-channel output.
///
/// Used by strict mode to reject files up front instead of failing at encode.
pub fn grayscale_encodable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            GRAYSCALE_ENCODERS
                .iter()
                .any(|(candidate, fmt)| ext.eq_ignore_ascii_case(candidate) && fmt.writing_enabled())
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Open an image, trusting its magic bytes over its extension.
fn open_reader(
    path: &Path,
) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Load and decode an image from disk. The file handle is released on return.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open_reader(path)?
        .decode()
        .map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// ITU-R 601-2 luma in 16.16 fixed point: `L = R*299/1000 + G*587/1000 + B*114/1000`.
fn rec601_luma(r: u8, g: u8, b: u8) -> u8 {
    let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
    l as u8
}

/// Collapse to one 8-bit luminance channel. Alpha is dropped, not composited.
fn to_grayscale(img: DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageLuma8(gray) => gray,
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => img.to_luma8(),
        other => {
            let rgb = other.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([rec601_luma(r, g, b)])
            })
        }
    }
}

/// Pick the encoder from the output file name.
fn output_format(path: &Path) -> Result<ImageFormat, BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ImageFormat::from_extension(&ext) {
        Some(fmt) if fmt.writing_enabled() => Ok(fmt),
        _ => Err(BackendError::UnsupportedOutput(if ext.is_empty() {
            "(no extension)".to_string()
        } else {
            ext
        })),
    }
}

/// Encode into a temp file beside `output`, then rename it over `output`.
///
/// On any error the temp file is dropped (and deleted), so `output` is
/// either the complete new image or untouched.
fn save_atomic(img: &DynamicImage, output: &Path, format: ImageFormat) -> Result<(), BackendError> {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        img.write_to(&mut writer, format)
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        writer.flush()?;
    }

    tmp.persist(output).map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) =
            open_reader(path)?
                .into_dimensions()
                .map_err(|e| BackendError::Decode {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
        Ok(Dimensions { width, height })
    }

    fn normalize(&self, params: &NormalizeParams) -> Result<(), BackendError> {
        let format = output_format(&params.output)?;
        let img = load_image(&params.source)?;

        let gray = to_grayscale(img);
        let resized = image::imageops::resize(
            &gray,
            params.size.width(),
            params.size.height(),
            FilterType::Lanczos3,
        );

        save_atomic(&DynamicImage::ImageLuma8(resized), &params.output, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::TargetSize;
    use crate::test_helpers::{create_test_jpeg, create_test_png, leftover_temp_files};
    use image::ColorType;

    fn params(source: &Path, output: &Path, w: u32, h: u32) -> NormalizeParams {
        NormalizeParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            size: TargetSize::new(w, h).unwrap(),
        }
    }

    #[test]
    fn grayscale_encodable_by_extension() {
        assert!(grayscale_encodable(Path::new("a.png")));
        assert!(grayscale_encodable(Path::new("a.JPG")));
        assert!(grayscale_encodable(Path::new("a.tiff")));
        assert!(!grayscale_encodable(Path::new("a.gif")));
        assert!(!grayscale_encodable(Path::new("a.txt")));
        assert!(!grayscale_encodable(Path::new("noext")));
    }

    #[test]
    fn luma_uses_rec601_weights() {
        let cases = [
            ([255, 0, 0], 76),
            ([0, 255, 0], 150),
            ([0, 0, 255], 29),
            ([255, 255, 255], 255),
            ([0, 0, 0], 0),
        ];
        for (rgb, expected) in cases {
            let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(2, 2, image::Rgb(rgb)));
            let gray = to_grayscale(img);
            assert!(gray.pixels().all(|p| p.0[0] == expected), "{rgb:?}");
        }
    }

    #[test]
    fn luma_input_passes_through_unchanged() {
        let src = GrayImage::from_fn(3, 3, |x, y| Luma([(x * 40 + y * 7) as u8]));
        let gray = to_grayscale(DynamicImage::ImageLuma8(src.clone()));
        assert_eq!(gray, src);
    }

    #[test]
    fn normalize_pure_red_png_gives_luma_76() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("red.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([255, 0, 0]))
            .save(&source)
            .unwrap();
        let output = tmp.path().join("red-out.png");

        RustBackend::new()
            .normalize(&params(&source, &output, 4, 4))
            .unwrap();

        let img = image::open(&output).unwrap().into_luma8();
        assert!(img.pixels().all(|p| p.0[0] == 76));
    }

    #[test]
    fn identify_synthetic_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 200,
                height: 150
            }
        );
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn normalize_png_to_exact_grayscale_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        create_test_png(&source, 300, 200);
        let output = tmp.path().join("out.png");

        RustBackend::new()
            .normalize(&params(&source, &output, 64, 48))
            .unwrap();

        let img = image::open(&output).unwrap();
        assert_eq!(img.color(), ColorType::L8);
        assert_eq!((img.width(), img.height()), (64, 48));
    }

    #[test]
    fn normalize_upscales_small_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("small.jpg");
        create_test_jpeg(&source, 20, 10);
        let output = tmp.path().join("small-out.jpg");

        RustBackend::new()
            .normalize(&params(&source, &output, 128, 128))
            .unwrap();

        let img = image::open(&output).unwrap();
        assert_eq!(img.color(), ColorType::L8);
        assert_eq!((img.width(), img.height()), (128, 128));
    }

    #[test]
    fn normalize_sniffs_content_over_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        // PNG bytes behind a .jpg name still decode.
        let source = tmp.path().join("mislabeled.jpg");
        create_test_png(&source, 40, 40);
        let output = tmp.path().join("mislabeled.png");

        RustBackend::new()
            .normalize(&params(&source, &output, 16, 16))
            .unwrap();
        assert!(output.exists());
    }

    #[test]
    fn corrupt_source_leaves_no_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("broken.png");
        std::fs::write(&source, b"definitely not a png").unwrap();
        let out_dir = tmp.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        let output = out_dir.join("broken.png");

        let result = RustBackend::new().normalize(&params(&source, &output, 16, 16));

        assert!(matches!(result, Err(BackendError::Decode { .. })));
        assert!(!output.exists());
        assert!(leftover_temp_files(&out_dir).is_empty());
    }

    #[test]
    fn unknown_output_extension_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("data.xyz");
        create_test_png(&source, 10, 10);
        let output = tmp.path().join("out.xyz");

        let result = RustBackend::new().normalize(&params(&source, &output, 8, 8));

        assert!(matches!(result, Err(BackendError::UnsupportedOutput(ext)) if ext == "xyz"));
        assert!(!output.exists());
    }

    #[test]
    fn existing_output_is_overwritten() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        create_test_png(&source, 50, 50);
        let output = tmp.path().join("a-out.png");
        std::fs::write(&output, b"stale").unwrap();

        RustBackend::new()
            .normalize(&params(&source, &output, 10, 20))
            .unwrap();

        let img = image::open(&output).unwrap();
        assert_eq!((img.width(), img.height()), (10, 20));
        assert!(leftover_temp_files(tmp.path()).is_empty());
    }
}
