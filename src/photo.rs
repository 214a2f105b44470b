//! Photo ingestion.
//!
//! Uploaded photos are decoded, turned upright according to their EXIF
//! orientation tag and re-encoded without metadata, so a viewer that honours
//! the tag does not rotate them a second time. The transform is best effort:
//! whatever goes wrong, the original bytes are written instead and the caller
//! gets a warning.

use chrono::NaiveDate;
use exif::{In, Tag};
use image::DynamicImage;
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils::format_date;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Failed to write photo {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reasons the upright transform was skipped
#[derive(Debug, Error)]
enum TransformError {
    #[error("unreadable metadata: {0}")]
    Metadata(#[from] exif::Error),
    #[error("{0}")]
    Image(#[from] image::ImageError),
}

/// An uploaded image blob and the name it was uploaded under
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a local file as an upload
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }
}

/// Counterclockwise rotation applied to turn a photo upright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Ccw90,
    Ccw180,
    Ccw270,
}

impl Rotation {
    /// Map an EXIF orientation value (tag 0x0112) to the correcting rotation.
    /// Mirrored orientations are left alone.
    pub fn from_orientation(orientation: Option<u32>) -> Self {
        match orientation {
            Some(3) => Rotation::Ccw180,
            Some(6) => Rotation::Ccw270,
            Some(8) => Rotation::Ccw90,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Ccw90 => 90,
            Rotation::Ccw180 => 180,
            Rotation::Ccw270 => 270,
        }
    }

    fn apply(self, image: DynamicImage) -> DynamicImage {
        // image's rotate helpers turn clockwise
        match self {
            Rotation::None => image,
            Rotation::Ccw90 => image.rotate270(),
            Rotation::Ccw180 => image.rotate180(),
            Rotation::Ccw270 => image.rotate90(),
        }
    }
}

/// Result of storing an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    pub path: PathBuf,
    pub rotation: Rotation,
    /// Set when the upright transform failed and the original bytes were kept
    pub warning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    /// Open the photo directory, creating it if missing
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PhotoError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| PhotoError::FileSystem {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where an upload with this name and date is stored.
    ///
    /// Two uploads sharing a date and file name map to the same path; the later
    /// one replaces the earlier.
    pub fn destination(&self, file_name: &str, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_{}", format_date(date), sanitize_file_name(file_name)))
    }

    /// Store an upload for a record dated `date`.
    ///
    /// Returns `Ok(None)` when there is nothing to store. Fails only when the
    /// destination cannot be written at all.
    pub fn ingest(
        &self,
        upload: Option<&PhotoUpload>,
        date: NaiveDate,
    ) -> Result<Option<StoredPhoto>, PhotoError> {
        let Some(upload) = upload else {
            return Ok(None);
        };

        let path = self.destination(&upload.file_name, date);
        let write_error = |source| PhotoError::FileSystem {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(write_error)?;

        match write_upright(&upload.bytes, &path) {
            Ok(rotation) => {
                tracing::info!(path = %path.display(), degrees = rotation.degrees(), "stored photo");
                Ok(Some(StoredPhoto {
                    path,
                    rotation,
                    warning: None,
                }))
            }
            Err(reason) => {
                tracing::warn!(path = %path.display(), error = %reason, "photo orientation fix failed, keeping original bytes");
                fs::write(&path, &upload.bytes).map_err(write_error)?;
                Ok(Some(StoredPhoto {
                    path,
                    rotation: Rotation::None,
                    warning: Some(format!(
                        "Could not fix photo orientation ({}); the original file was saved",
                        reason
                    )),
                }))
            }
        }
    }
}

/// Decode, rotate upright and encode to `path` (format from its extension)
fn write_upright(bytes: &[u8], path: &Path) -> Result<Rotation, TransformError> {
    let image = image::load_from_memory(bytes)?;
    let rotation = Rotation::from_orientation(read_orientation(bytes)?);
    rotation.apply(image).save(path)?;
    Ok(rotation)
}

/// Orientation tag of the primary image, `None` when the file has no EXIF
/// block or is a format that cannot carry one (GIF, BMP)
fn read_orientation(bytes: &[u8]) -> Result<Option<u32>, exif::Error> {
    match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => Ok(exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))),
        Err(exif::Error::NotFound(_) | exif::Error::InvalidFormat(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Keep only the last path component and replace spaces
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        return "photo".to_string();
    }
    base.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use rstest::rstest;
    use tempfile::TempDir;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    /// 32x16 JPEG, left half red and right half blue, with an optional
    /// orientation tag in an APP1 segment right after SOI
    fn tagged_jpeg(orientation: Option<u16>) -> Vec<u8> {
        let image = RgbImage::from_fn(32, 16, |x, _| if x < 16 { RED } else { BLUE });
        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut encoded, ImageFormat::Jpeg)
            .unwrap();
        let jpeg = encoded.into_inner();

        let Some(orientation) = orientation else {
            return jpeg;
        };

        let mut app1 = b"Exif\x00\x00".to_vec();
        app1.extend_from_slice(b"MM\x00\x2a\x00\x00\x00\x08"); // big endian, IFD0 at 8
        app1.extend_from_slice(&1u16.to_be_bytes()); // entry count
        app1.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
        app1.extend_from_slice(&3u16.to_be_bytes()); // SHORT
        app1.extend_from_slice(&1u32.to_be_bytes());
        app1.extend_from_slice(&orientation.to_be_bytes());
        app1.extend_from_slice(&[0, 0]);
        app1.extend_from_slice(&0u32.to_be_bytes()); // no next IFD

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn is_red(image: &RgbImage, x: u32, y: u32) -> bool {
        let p = image.get_pixel(x, y);
        p[0] > p[2]
    }

    #[rstest]
    #[case(Some(3), Rotation::Ccw180, 180)]
    #[case(Some(6), Rotation::Ccw270, 270)]
    #[case(Some(8), Rotation::Ccw90, 90)]
    #[case(Some(1), Rotation::None, 0)]
    #[case(Some(2), Rotation::None, 0)]
    #[case(None, Rotation::None, 0)]
    fn orientation_maps_to_rotation(
        #[case] orientation: Option<u32>,
        #[case] expected: Rotation,
        #[case] degrees: u16,
    ) {
        let rotation = Rotation::from_orientation(orientation);
        assert_eq!(rotation, expected);
        assert_eq!(rotation.degrees(), degrees);
    }

    #[rstest]
    #[case(Some(6), Rotation::Ccw270, (16, 32), (8, 8), (8, 24))]
    #[case(Some(3), Rotation::Ccw180, (32, 16), (24, 8), (8, 8))]
    #[case(Some(8), Rotation::Ccw90, (16, 32), (8, 24), (8, 8))]
    #[case(Some(1), Rotation::None, (32, 16), (8, 8), (24, 8))]
    #[case(None, Rotation::None, (32, 16), (8, 8), (24, 8))]
    fn ingest_turns_photo_upright(
        #[case] orientation: Option<u16>,
        #[case] rotation: Rotation,
        #[case] dimensions: (u32, u32),
        #[case] red_at: (u32, u32),
        #[case] blue_at: (u32, u32),
    ) {
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::open(dir.path().join("photos")).unwrap();
        let upload = PhotoUpload::new("gamu.jpg", tagged_jpeg(orientation));

        let stored = store.ingest(Some(&upload), date()).unwrap().unwrap();

        assert!(stored.path.exists());
        assert_eq!(stored.rotation, rotation);
        assert_eq!(stored.warning, None);

        let saved = fs::read(&stored.path).unwrap();
        let image = image::load_from_memory(&saved).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), dimensions);
        assert!(is_red(&image, red_at.0, red_at.1));
        assert!(!is_red(&image, blue_at.0, blue_at.1));

        // Metadata is gone so nothing rotates it again
        assert_eq!(read_orientation(&saved).unwrap(), None);
    }

    #[rstest]
    #[case("gamu.gif", ImageFormat::Gif)]
    #[case("gamu.bmp", ImageFormat::Bmp)]
    fn formats_without_exif_are_reencoded_without_warning(#[case] name: &str, #[case] format: ImageFormat) {
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::open(dir.path().join("photos")).unwrap();
        let image = RgbImage::from_fn(4, 4, |x, _| if x < 2 { RED } else { BLUE });
        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(DynamicImage::ImageRgb8(image).to_rgba8())
            .write_to(&mut encoded, format)
            .unwrap();
        let upload = PhotoUpload::new(name, encoded.into_inner());

        let stored = store.ingest(Some(&upload), date()).unwrap().unwrap();

        assert_eq!(stored.warning, None);
        assert_eq!(stored.rotation, Rotation::None);
        let saved = image::load_from_memory(&fs::read(&stored.path).unwrap()).unwrap().to_rgb8();
        assert_eq!(saved.dimensions(), (4, 4));
        assert!(is_red(&saved, 0, 0));
        assert!(!is_red(&saved, 3, 0));
    }

    #[test]
    fn no_upload_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        assert_eq!(store.ingest(None, date()).unwrap(), None);
    }

    #[test]
    fn undecodable_upload_is_written_raw_with_warning() {
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        let upload = PhotoUpload::new("broken.jpg", b"definitely not a jpeg".to_vec());

        let stored = store.ingest(Some(&upload), date()).unwrap().unwrap();

        assert!(stored.warning.is_some());
        assert_eq!(stored.rotation, Rotation::None);
        assert_eq!(fs::read(&stored.path).unwrap(), b"definitely not a jpeg");
    }

    #[test]
    fn destination_uses_date_and_sanitized_name() {
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();

        assert_eq!(
            store.destination("my hamster pic.png", date()),
            dir.path().join("2024-01-10_my_hamster_pic.png")
        );
        assert_eq!(
            store.destination("../../etc/cage.jpg", date()),
            dir.path().join("2024-01-10_cage.jpg")
        );
        assert_eq!(
            store.destination("C:\\Users\\me\\wheel.jpg", date()),
            dir.path().join("2024-01-10_wheel.jpg")
        );
    }

    #[test]
    fn same_date_and_name_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();

        let first = store
            .ingest(Some(&PhotoUpload::new("a.jpg", b"one".to_vec())), date())
            .unwrap()
            .unwrap();
        let second = store
            .ingest(Some(&PhotoUpload::new("a.jpg", b"two".to_vec())), date())
            .unwrap()
            .unwrap();

        assert_eq!(first.path, second.path);
        assert_eq!(fs::read(&second.path).unwrap(), b"two");
    }
}
