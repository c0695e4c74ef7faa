// Pack aggregation: measurement files keyed by source identifier

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::Result;
use crate::core::format::{LicelFile, LicelProfile};

/// In-memory collection of measurement files keyed by source path or
/// archive entry name. Keys iterate in sorted order, so cross-file
/// selection results are deterministic.
///
/// Not internally synchronized: build on one thread, read afterward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicelPack {
    pub name: Option<String>,
    /// Start timestamp of the first successfully loaded file; `None`
    /// while the pack is empty.
    pub start_time: Option<NaiveDateTime>,
    pub files: BTreeMap<String, LicelFile>,
}

/// Archive entries are kept when the name starts with `b` and has at
/// least one character after a dot, the instrument's naming scheme for
/// raw measurement files (`b2021019.223500`).
fn is_measurement_entry(name: &str) -> bool {
    name.starts_with('b') && name.find('.').is_some_and(|dot| dot + 1 < name.len())
}

impl LicelPack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Loads every file matching the glob mask, keyed by path.
    ///
    /// Files that fail to open or parse are logged and skipped; only a
    /// malformed mask fails the load itself.
    pub fn from_glob(mask: &str) -> Result<Self> {
        let mut pack = Self::new();
        for entry in glob::glob(mask)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(mask, error = %e, "skipping unreadable path");
                    continue;
                }
            };
            let key = path.to_string_lossy().into_owned();
            match LicelFile::open(&path) {
                Ok(file) => pack.insert(key, file),
                Err(e) => warn!(file = %key, error = %e, "skipping measurement file"),
            }
        }
        Ok(pack)
    }

    /// Loads measurement entries from a zip archive, keyed by the
    /// `/`-rooted entry name.
    ///
    /// Entries that fail to open, read or parse are logged and skipped;
    /// only an unopenable archive fails the load itself.
    pub fn from_zip<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut pack = Self::new();
        let mut archive = zip::ZipArchive::new(File::open(path.as_ref())?)?;

        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(index, error = %e, "skipping unreadable archive entry");
                    continue;
                }
            };
            let name = entry.name().to_string();
            if !is_measurement_entry(&name) {
                continue;
            }
            debug!(file = %name, "loading archive entry");

            let mut raw = Vec::new();
            if let Err(e) = entry.read_to_end(&mut raw) {
                warn!(file = %name, error = %e, "skipping unreadable archive entry");
                continue;
            }

            let key = format!("/{}", name.trim_start_matches('/'));
            match LicelFile::from_bytes(&raw) {
                Ok(file) => pack.insert(key, file),
                Err(e) => warn!(file = %name, error = %e, "skipping archive entry"),
            }
        }
        Ok(pack)
    }

    /// Adds a file under `key`; the first file's start time becomes the
    /// pack's.
    pub fn insert(&mut self, key: String, file: LicelFile) {
        if self.start_time.is_none() {
            self.start_time = Some(file.start_time);
        }
        self.files.insert(key, file);
    }

    /// Matching channels from every file, in sorted key order.
    pub fn select_channels(&self, photon: bool, wavelength: f64) -> Vec<&LicelProfile> {
        self.files
            .values()
            .flat_map(|file| file.select_channels(photon, wavelength))
            .collect()
    }

    /// Writes every file back to the path it is keyed by.
    ///
    /// The first write failure aborts the iteration; files written
    /// before it remain on disk.
    pub fn save(&self) -> Result<()> {
        for (key, file) in &self.files {
            file.save(key)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reader::tests::{sample_file, sample_profile};
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn file_with_channel(photon: bool, wavelength: f64) -> LicelFile {
        let mut file = sample_file();
        file.profiles = vec![sample_profile(photon, wavelength, vec![1.0, 2.0])];
        file.n_datasets = 1;
        file
    }

    #[test]
    fn test_entry_name_filter() {
        assert!(is_measurement_entry("b2021019.223500"));
        assert!(is_measurement_entry("b.x"));
        assert!(!is_measurement_entry("a2021019.223500"));
        assert!(!is_measurement_entry("b"));
        assert!(!is_measurement_entry("b."));
        assert!(!is_measurement_entry("ba."));
    }

    #[test]
    fn test_from_glob_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        sample_file().save(dir.path().join("b0001.100")).unwrap();
        sample_file().save(dir.path().join("b0002.100")).unwrap();
        std::fs::write(dir.path().join("b0003.100"), b"not a measurement").unwrap();

        let mask = dir.path().join("b*.*");
        let pack = LicelPack::from_glob(&mask.to_string_lossy()).unwrap();

        assert_eq!(pack.len(), 2);
        assert_eq!(pack.start_time, Some(sample_file().start_time));
        assert!(pack.files.keys().all(|k| k.contains("b000")));
    }

    #[test]
    fn test_from_glob_with_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        let mask = dir.path().join("b*.*");
        let pack = LicelPack::from_glob(&mask.to_string_lossy()).unwrap();
        assert!(pack.is_empty());
        assert_eq!(pack.start_time, None);
    }

    #[test]
    fn test_from_zip_filters_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("night.zip");

        let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        let options = SimpleFileOptions::default();
        writer.start_file("b2021019.223500", options).unwrap();
        writer.write_all(&sample_file().to_bytes("b2021019.223500")).unwrap();
        writer.start_file("notes.txt", options).unwrap();
        writer.write_all(b"operator notes").unwrap();
        writer.start_file("b2021019.broken", options).unwrap();
        writer.write_all(b"garbage").unwrap();
        writer.finish().unwrap();

        let pack = LicelPack::from_zip(&zip_path).unwrap();

        assert_eq!(pack.len(), 1);
        assert!(pack.files.contains_key("/b2021019.223500"));
        assert_eq!(pack.start_time, Some(sample_file().start_time));
        assert_eq!(pack.files["/b2021019.223500"].site, "Vladivos");
    }

    #[test]
    fn test_from_zip_missing_archive_is_an_error() {
        assert!(LicelPack::from_zip("/nonexistent/night.zip").is_err());
    }

    #[test]
    fn test_cross_file_selection() {
        let mut pack = LicelPack::new().with_name("night");
        pack.insert("a".to_string(), file_with_channel(true, 400.0));
        pack.insert("b".to_string(), file_with_channel(false, 500.0));

        let hits = pack.select_channels(true, 400.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0], &pack.files["a"].profiles[0]);

        assert!(pack.select_channels(false, 400.0).is_empty());
        assert!(pack.select_channels(true, 500.0).is_empty());
    }

    #[test]
    fn test_selection_never_returns_zero_wavelength() {
        let mut pack = LicelPack::new();
        pack.insert("a".to_string(), file_with_channel(true, 0.0));
        assert!(pack.select_channels(true, 0.0).is_empty());
    }

    #[test]
    fn test_start_time_comes_from_first_insert() {
        let mut pack = LicelPack::new();
        let mut late = file_with_channel(true, 355.0);
        late.start_time = late.start_time + chrono::Duration::hours(1);

        pack.insert("first".to_string(), file_with_channel(true, 355.0));
        pack.insert("second".to_string(), late);
        assert_eq!(pack.start_time, Some(sample_file().start_time));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("b0001.100").to_string_lossy().into_owned();

        let mut pack = LicelPack::new();
        pack.insert(key.clone(), file_with_channel(true, 355.0));
        pack.save().unwrap();

        let reloaded = LicelFile::open(&key).unwrap();
        assert_eq!(reloaded.profiles, pack.files[&key].profiles);
    }
}
