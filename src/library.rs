//! File-backed gesture library.
//!
//! The whole library lives in one JSON object, `{"name": [[pose, "ref.jpg"], ...]}`,
//! and is rewritten in full after every save. Reference images are stored next
//! to the library file.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::LibraryError;
use crate::normalize::NormalizedPose;

/// One captured example of a gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(NormalizedPose, String)",
    into = "(NormalizedPose, String)"
)]
pub struct GestureExample {
    pub pose: NormalizedPose,
    pub image_reference: String,
}

impl From<(NormalizedPose, String)> for GestureExample {
    fn from((pose, image_reference): (NormalizedPose, String)) -> Self {
        Self {
            pose,
            image_reference,
        }
    }
}

impl From<GestureExample> for (NormalizedPose, String) {
    fn from(e: GestureExample) -> Self {
        (e.pose, e.image_reference)
    }
}

type Gestures = BTreeMap<String, Vec<GestureExample>>;

#[derive(Debug)]
pub struct GestureLibrary {
    path: PathBuf,
    gestures: Gestures,
}

impl GestureLibrary {
    /// Reads the library at `path`. A missing or blank file is an empty library.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let path = path.into();
        let gestures = read_gestures(&path)?;
        info!(
            "Loaded gesture library {:?}: {} names, {} examples",
            path,
            gestures.len(),
            gestures.values().map(Vec::len).sum::<usize>()
        );
        Ok(Self { path, gestures })
    }

    /// Re-reads the file, discarding in-memory state. On error the current
    /// state is kept.
    pub fn reload(&mut self) -> Result<(), LibraryError> {
        self.gestures = read_gestures(&self.path)?;
        info!("Reloaded gesture library: {} examples", self.len());
        Ok(())
    }

    /// Appends `pose` under `name`, writes `image` (if any) under a fresh
    /// reference and rewrites the library file. Returns the image reference.
    pub fn save(
        &mut self,
        name: &str,
        pose: NormalizedPose,
        image: Option<&RgbImage>,
    ) -> Result<String, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::EmptyName);
        }
        if name.contains(|c: char| c == '/' || c == '\\') {
            return Err(LibraryError::InvalidName(name.to_string()));
        }

        let reference = self.next_image_reference(name);
        let written = match image {
            Some(img) => {
                let image_path = self.image_path(&reference);
                img.save(&image_path).map_err(|source| LibraryError::Image {
                    path: image_path.clone(),
                    source,
                })?;
                debug!("Wrote reference image {:?}", image_path);
                Some(image_path)
            }
            None => None,
        };

        self.gestures
            .entry(name.to_string())
            .or_default()
            .push(GestureExample {
                pose,
                image_reference: reference.clone(),
            });

        if let Err(e) = self.persist() {
            // keep memory and the image directory in step with what is on disk
            if let Some(examples) = self.gestures.get_mut(name) {
                examples.pop();
                if examples.is_empty() {
                    self.gestures.remove(name);
                }
            }
            if let Some(image_path) = written {
                if let Err(remove) = fs::remove_file(&image_path) {
                    warn!("Failed to remove orphaned image {:?}: {}", image_path, remove);
                }
            }
            return Err(e);
        }

        info!("Saved gesture '{}' as {}", name, reference);
        Ok(reference)
    }

    /// The reference `save` would assign for `name`: `name.jpg`, then
    /// `name-2.jpg`, `name-3.jpg`, ... The `-` is left out when `name`
    /// already ends with `-` or a digit. Images share one directory, so a
    /// reference held by any gesture is skipped.
    pub fn next_image_reference(&self, name: &str) -> String {
        let taken: HashSet<&str> = self
            .iter()
            .map(|(_, e)| e.image_reference.as_str())
            .collect();

        let mut reference = format!("{name}.jpg");
        let separator = match name.chars().last() {
            Some(c) if c == '-' || c.is_ascii_digit() => "",
            _ => "-",
        };
        let mut i = 1;
        while taken.contains(&reference.as_str()) {
            i += 1;
            reference = format!("{name}{separator}{i}.jpg");
        }
        reference
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of a reference image on disk.
    pub fn image_path(&self, reference: &str) -> PathBuf {
        match self.path.parent() {
            Some(dir) => dir.join(reference),
            None => PathBuf::from(reference),
        }
    }

    /// Total number of stored examples.
    pub fn len(&self) -> usize {
        self.gestures.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.gestures.keys().map(String::as_str)
    }

    pub fn examples(&self, name: &str) -> &[GestureExample] {
        self.gestures.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every `(name, example)` pair, grouped by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GestureExample)> {
        self.gestures
            .iter()
            .flat_map(|(name, examples)| examples.iter().map(move |e| (name.as_str(), e)))
    }

    pub fn find_by_reference(&self, reference: &str) -> Option<(&str, &GestureExample)> {
        self.iter().find(|(_, e)| e.image_reference == reference)
    }

    fn persist(&self) -> Result<(), LibraryError> {
        let content = serde_json::to_string(&self.gestures)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, content).map_err(|source| LibraryError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| LibraryError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn read_gestures(path: &Path) -> Result<Gestures, LibraryError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No gesture library at {:?}, starting empty", path);
            return Ok(Gestures::new());
        }
        Err(source) => {
            return Err(LibraryError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(Gestures::new());
    }

    serde_json::from_str(&content).map_err(|source| LibraryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::normalize::normalize;

    fn temp_library() -> (tempfile::TempDir, GestureLibrary) {
        let dir = tempfile::tempdir().unwrap();
        let lib = GestureLibrary::load(dir.path().join("stored.json")).unwrap();
        (dir, lib)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, lib) = temp_library();
        assert!(lib.is_empty());
        assert_eq!(lib.names().count(), 0);
    }

    #[test]
    fn test_blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stored.json");
        fs::write(&path, "  \n").unwrap();
        assert!(GestureLibrary::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stored.json");
        fs::write(&path, "{\"fist\": [[").unwrap();
        assert!(matches!(
            GestureLibrary::load(&path),
            Err(LibraryError::Parse { .. })
        ));
    }

    #[test]
    fn test_unnormalized_pose_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stored.json");
        let raw = serde_json::to_string(&fixtures::open_hand()).unwrap();
        fs::write(&path, format!("{{\"open\": [[{raw}, \"open.jpg\"]]}}")).unwrap();

        let err = GestureLibrary::load(&path).unwrap_err();
        assert!(err.to_string().contains("not normalized"));
    }

    #[test]
    fn test_same_name_gets_distinct_references() {
        let (_dir, mut lib) = temp_library();
        let pose = normalize(&fixtures::fist()).unwrap();

        assert_eq!(lib.save("fist", pose.clone(), None).unwrap(), "fist.jpg");
        assert_eq!(lib.save("fist", pose.clone(), None).unwrap(), "fist-2.jpg");
        assert_eq!(lib.save("fist", pose, None).unwrap(), "fist-3.jpg");
        assert_eq!(lib.examples("fist").len(), 3);
    }

    #[test]
    fn test_reference_separator_rules() {
        let (_dir, mut lib) = temp_library();
        let pose = normalize(&fixtures::fist()).unwrap();

        lib.save("a1", pose.clone(), None).unwrap();
        assert_eq!(lib.next_image_reference("a1"), "a12.jpg");

        lib.save("b-", pose.clone(), None).unwrap();
        assert_eq!(lib.next_image_reference("b-"), "b-2.jpg");

        // other names do not reserve references
        assert_eq!(lib.next_image_reference("c"), "c.jpg");
    }

    #[test]
    fn test_blank_name_rejected() {
        let (_dir, mut lib) = temp_library();
        let pose = normalize(&fixtures::fist()).unwrap();
        assert!(matches!(lib.save("  ", pose, None), Err(LibraryError::EmptyName)));
        assert!(lib.is_empty());
    }

    #[test]
    fn test_save_round_trips_exactly() {
        let (dir, mut lib) = temp_library();
        let fist = normalize(&fixtures::shifted(&fixtures::fist(), 0.1, 0.2, 0.3)).unwrap();
        let open = normalize(&fixtures::open_hand()).unwrap();
        lib.save("fist", fist.clone(), None).unwrap();
        lib.save("open", open.clone(), None).unwrap();

        let back = GestureLibrary::load(dir.path().join("stored.json")).unwrap();
        assert_eq!(back.examples("fist")[0].pose, fist);
        assert_eq!(back.examples("open")[0].pose, open);
        assert_eq!(back.examples("open")[0].image_reference, "open.jpg");
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn test_save_writes_reference_image() {
        let (dir, mut lib) = temp_library();
        let pose = normalize(&fixtures::fist()).unwrap();
        let frame = RgbImage::from_pixel(8, 6, image::Rgb([10, 200, 30]));

        let reference = lib.save("fist", pose, Some(&frame)).unwrap();
        let on_disk = image::open(dir.path().join(&reference)).unwrap();
        assert_eq!((on_disk.width(), on_disk.height()), (8, 6));
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let (dir, mut lib) = temp_library();
        // a directory where the temp file should go makes the write fail
        fs::create_dir(dir.path().join("stored.json.tmp")).unwrap();
        let pose = normalize(&fixtures::fist()).unwrap();

        assert!(matches!(lib.save("fist", pose, None), Err(LibraryError::Write { .. })));
        assert!(lib.is_empty());
    }

    #[test]
    fn test_failed_persist_removes_written_image() {
        let (dir, mut lib) = temp_library();
        fs::create_dir(dir.path().join("stored.json.tmp")).unwrap();
        let pose = normalize(&fixtures::fist()).unwrap();
        let frame = RgbImage::from_pixel(8, 6, image::Rgb([10, 200, 30]));

        assert!(lib.save("fist", pose, Some(&frame)).is_err());
        assert!(!dir.path().join("fist.jpg").exists());
        assert!(lib.is_empty());
    }

    #[test]
    fn test_references_are_unique_across_names() {
        let (_dir, mut lib) = temp_library();
        let pose = normalize(&fixtures::fist()).unwrap();

        assert_eq!(lib.save("a1", pose.clone(), None).unwrap(), "a1.jpg");
        assert_eq!(lib.save("a1", pose.clone(), None).unwrap(), "a12.jpg");
        assert_eq!(lib.save("a12", pose, None).unwrap(), "a122.jpg");

        let (name, _) = lib.find_by_reference("a12.jpg").unwrap();
        assert_eq!(name, "a1");
    }

    #[test]
    fn test_names_with_path_separators_rejected() {
        let (dir, mut lib) = temp_library();
        let pose = normalize(&fixtures::fist()).unwrap();
        let frame = RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0]));

        for name in ["../x", "/abs/x", "thumbs/up", "a\\b"] {
            assert!(matches!(
                lib.save(name, pose.clone(), Some(&frame)),
                Err(LibraryError::InvalidName(_))
            ));
        }
        assert!(lib.is_empty());
        assert!(!dir.path().join("stored.json").exists());
    }

    #[test]
    fn test_reload_picks_up_external_edits() {
        let (dir, mut lib) = temp_library();
        let path = dir.path().join("stored.json");

        let mut other = GestureLibrary::load(&path).unwrap();
        other
            .save("open", normalize(&fixtures::open_hand()).unwrap(), None)
            .unwrap();

        assert!(lib.is_empty());
        lib.reload().unwrap();
        assert_eq!(lib.names().collect::<Vec<_>>(), vec!["open"]);
    }

    #[test]
    fn test_failed_reload_keeps_state() {
        let (dir, mut lib) = temp_library();
        lib.save("fist", normalize(&fixtures::fist()).unwrap(), None)
            .unwrap();
        fs::write(dir.path().join("stored.json"), "not json").unwrap();

        assert!(lib.reload().is_err());
        assert_eq!(lib.len(), 1);
    }

    #[test]
    fn test_find_by_reference() {
        let (_dir, mut lib) = temp_library();
        let pose = normalize(&fixtures::fist()).unwrap();
        lib.save("fist", pose.clone(), None).unwrap();
        lib.save("fist", pose, None).unwrap();

        let (name, example) = lib.find_by_reference("fist-2.jpg").unwrap();
        assert_eq!(name, "fist");
        assert_eq!(example.image_reference, "fist-2.jpg");
        assert!(lib.find_by_reference("nope.jpg").is_none());
    }
}
