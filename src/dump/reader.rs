//! In-memory flash dump
//!
//! [`FlashDump`] holds a complete image of the device flash, typically saved to disk
//! by whatever tool pulled it off the device, and serves cursor windows out of it.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ridelog::{DeviceModel, FlashDump, read_history};
//!
//! fn list_rides() -> ridelog::Result<()> {
//!     let dump = FlashDump::open("rider20.bin")?;
//!     for track in read_history(&dump, DeviceModel::Rider20.layout())? {
//!         println!("{} ({} laps)", track.name, track.lap_count);
//!     }
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::cursor::{ByteSource, Cursor};
use crate::{DecodeError, Result};

/// Complete flash image loaded into memory.
#[derive(Debug, Clone)]
pub struct FlashDump {
    data: Vec<u8>,
    path: PathBuf,
}

impl FlashDump {
    /// Load a flash image from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(&path)
            .map_err(|e| DecodeError::file_error(path.as_ref().to_path_buf(), e))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| DecodeError::file_error(path.as_ref().to_path_buf(), e))?;

        debug!(path = %path.as_ref().display(), bytes = data.len(), "Loaded flash dump");
        Ok(Self { data, path: path.as_ref().to_path_buf() })
    }

    /// Wrap an image that is already in memory.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into(), path: PathBuf::from("<memory>") }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl ByteSource for FlashDump {
    fn read_from_offset(&self, offset: u32) -> Result<Cursor<'_>> {
        let window = self
            .data
            .get(offset as usize..)
            .ok_or_else(|| DecodeError::out_of_range(u64::from(offset), 0, self.data.len()))?;
        Ok(Cursor::new(window, offset))
    }
}
