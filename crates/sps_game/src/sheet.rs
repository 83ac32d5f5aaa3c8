//! Background sprite-sheet loading.
//!
//! Decoding a large PNG takes long enough to drop frames, so the file is read
//! and decoded on a worker thread. The main loop polls once per tick; until a
//! result arrives everything that needs the sheet draws its fallback.

use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{bounded, Receiver, TryRecvError};

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone)]
pub struct SheetImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug)]
pub enum SheetEvent {
    Loaded(SheetImage),
    Failed(String),
}

pub fn decode_sheet(path: &Path) -> Result<SheetImage, String> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to decode sprite sheet {}: {e}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(format!("Sprite sheet {} is empty", path.display()));
    }
    Ok(SheetImage {
        path: path.to_path_buf(),
        width,
        height,
        rgba: image.into_raw(),
    })
}

/// Native file picker restricted to images. `None` when cancelled.
pub fn pick_sheet_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Load sprite sheet")
        .add_filter("PNG images", &["png"])
        .pick_file()
}

/// At most one load is in flight; a new request replaces the previous one and
/// its result is dropped when it arrives.
#[derive(Default)]
pub struct SheetLoader {
    pending: Option<(PathBuf, Receiver<SheetEvent>)>,
}

impl SheetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, path: PathBuf) {
        let (tx, rx) = bounded(1);
        let worker_path = path.clone();
        let spawned = thread::Builder::new()
            .name("sheet-loader".to_string())
            .spawn(move || {
                let event = match decode_sheet(&worker_path) {
                    Ok(image) => SheetEvent::Loaded(image),
                    Err(err) => SheetEvent::Failed(err),
                };
                // Receiver gone means the request was superseded.
                let _ = tx.send(event);
            });
        match spawned {
            Ok(_) => {
                log::info!("Loading sprite sheet '{}'", path.display());
                self.pending = Some((path, rx));
            }
            Err(err) => {
                log::error!("Failed to spawn sprite sheet loader: {err}");
                self.pending = None;
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_path(&self) -> Option<&Path> {
        self.pending.as_ref().map(|(path, _)| path.as_path())
    }

    /// Non-blocking; returns the completed load at most once.
    pub fn poll(&mut self) -> Option<SheetEvent> {
        let (path, rx) = self.pending.as_ref()?;
        let event = match rx.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => SheetEvent::Failed(format!(
                "Sprite sheet loader for {} exited without a result",
                path.display()
            )),
        };
        self.pending = None;
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str, ext: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "sps_sheet_test_{}_{}_{}.{}",
            name_hint,
            std::process::id(),
            nanos,
            ext
        ))
    }

    fn write_test_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 128, 255]));
        img.save(path).expect("write test png");
    }

    fn wait_for(loader: &mut SheetLoader) -> SheetEvent {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(event) = loader.poll() {
                return event;
            }
            assert!(Instant::now() < deadline, "loader timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn decode_reads_dimensions_and_pixels() {
        let path = temp_file_path("decode", "png");
        write_test_png(&path, 3, 2);
        let sheet = decode_sheet(&path).expect("png should decode");
        assert_eq!((sheet.width, sheet.height), (3, 2));
        assert_eq!(sheet.rgba.len(), 3 * 2 * 4);
        assert_eq!(&sheet.rgba[0..4], &[255, 0, 128, 255]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn loader_delivers_loaded_once() {
        let path = temp_file_path("async", "png");
        write_test_png(&path, 4, 4);

        let mut loader = SheetLoader::new();
        assert!(loader.poll().is_none());
        loader.request(path.clone());
        assert!(loader.is_loading());
        assert_eq!(loader.pending_path(), Some(path.as_path()));

        match wait_for(&mut loader) {
            SheetEvent::Loaded(sheet) => assert_eq!(sheet.width, 4),
            SheetEvent::Failed(err) => panic!("unexpected failure: {err}"),
        }
        assert!(!loader.is_loading());
        assert!(loader.poll().is_none());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn loader_reports_missing_file() {
        let mut loader = SheetLoader::new();
        loader.request(temp_file_path("missing", "png"));
        match wait_for(&mut loader) {
            SheetEvent::Failed(err) => assert!(err.contains("Failed to decode sprite sheet")),
            SheetEvent::Loaded(_) => panic!("missing file should fail"),
        }
    }

    #[test]
    fn newer_request_replaces_pending_one() {
        let first = temp_file_path("first", "png");
        let second = temp_file_path("second", "png");
        write_test_png(&first, 2, 2);
        write_test_png(&second, 5, 1);

        let mut loader = SheetLoader::new();
        loader.request(first.clone());
        loader.request(second.clone());
        match wait_for(&mut loader) {
            SheetEvent::Loaded(sheet) => assert_eq!(sheet.path, second),
            SheetEvent::Failed(err) => panic!("unexpected failure: {err}"),
        }
        let _ = std::fs::remove_file(first);
        let _ = std::fs::remove_file(second);
    }
}
