//! Output session layout
//!
//! `<base>/<YYYYMMDD_HHMMSS>/{KeyFrameTrajectory.txt, images.txt, points3D.txt}`

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{error, info, instrument};

use crate::error::{PrepareStep, Result, SessionError};
use crate::paths::{create_directory, create_directory_with_parents, create_empty_file, file_exists};

/// Default base directory for output sessions
pub const DEFAULT_OUTPUT_ROOT: &str = "./dataset";

pub const TRAJECTORY_FILE: &str = "KeyFrameTrajectory.txt";
pub const IMAGES_FILE: &str = "images.txt";
pub const POINTS_FILE: &str = "points3D.txt";

/// Session directory name for `now`, at one-second resolution
pub fn session_dir_name(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// One timestamped output directory under a base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSession {
    pub base: PathBuf,
    pub name: String,
    pub dir: PathBuf,
}

impl OutputSession {
    pub fn new(base: impl Into<PathBuf>, now: &DateTime<Local>) -> Self {
        let base = base.into();
        let name = session_dir_name(now);
        let dir = base.join(&name);
        Self { base, name, dir }
    }

    /// Artifact paths inside this session directory
    pub fn files(&self) -> OutputFileSet {
        OutputFileSet {
            trajectory: self.dir.join(TRAJECTORY_FILE),
            images: self.dir.join(IMAGES_FILE),
            points: self.dir.join(POINTS_FILE),
        }
    }
}

/// The three artifacts the engine exports into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFileSet {
    /// Keyframe trajectory
    pub trajectory: PathBuf,
    /// Keypoints and map points (image index)
    pub images: PathBuf,
    /// Point cloud
    pub points: PathBuf,
}

impl OutputFileSet {
    /// Artifacts in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [&self.trajectory, &self.images, &self.points]
            .into_iter()
            .map(PathBuf::as_path)
    }
}

/// Create the session directory and its three empty artifacts
///
/// Runs strictly in order and aborts at the first failure:
/// the base directory with parents, the timestamped session directory,
/// then each artifact that does not already exist. An existing session
/// directory from the same second is reused.
#[instrument(name = "output_prepare", skip(now), fields(base = %base.display()))]
pub fn prepare(base: &Path, now: &DateTime<Local>) -> Result<OutputFileSet> {
    let session = OutputSession::new(base, now);

    create_directory_with_parents(&session.base)
        .map_err(|e| SessionError::prepare(PrepareStep::BaseDirectory, e))
        .inspect_err(|e| error!("{e}"))?;

    create_directory(&session.dir)
        .map_err(|e| SessionError::prepare(PrepareStep::SessionDirectory, e))
        .inspect_err(|e| error!("{e}"))?;

    let files = session.files();
    for path in files.iter() {
        if !file_exists(path) {
            create_empty_file(path)
                .map_err(|e| SessionError::prepare(PrepareStep::OutputFile, e))
                .inspect_err(|e| error!("{e}"))?;
        }
    }

    info!(dir = %session.dir.display(), "output session prepared");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathError;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 7, h, m, s).unwrap()
    }

    #[test]
    fn test_session_dir_name_format() {
        assert_eq!(session_dir_name(&at(9, 5, 2)), "20240307_090502");
    }

    #[test]
    fn test_names_one_second_apart_differ() {
        let a = session_dir_name(&at(23, 59, 58));
        let b = session_dir_name(&at(23, 59, 59));
        assert_ne!(a, b);
    }

    #[test]
    fn test_prepare_missing_base() {
        let root = tempdir().unwrap();
        let base = root.path().join("dataset");

        let files = prepare(&base, &at(12, 0, 0)).unwrap();

        let dir = base.join("20240307_120000");
        assert!(dir.is_dir());
        assert_eq!(files.trajectory, dir.join(TRAJECTORY_FILE));
        for path in files.iter() {
            assert!(file_exists(path));
            assert_eq!(fs::metadata(path).unwrap().len(), 0);
        }
    }

    #[test]
    fn test_prepare_base_is_file() {
        let root = tempdir().unwrap();
        let base = root.path().join("dataset");
        fs::write(&base, "not a directory").unwrap();

        let err = prepare(&base, &at(12, 0, 0)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::PrepareOutput {
                step: PrepareStep::BaseDirectory,
                source: PathError::NotADirectory { .. },
            }
        ));
        assert_eq!(fs::read_to_string(&base).unwrap(), "not a directory");
    }

    #[test]
    fn test_prepare_same_second_reuses_directory() {
        let root = tempdir().unwrap();
        let base = root.path().join("dataset");

        let first = prepare(&base, &at(8, 30, 0)).unwrap();
        fs::write(&first.trajectory, "1.0 0 0 0 0 0 0 1\n").unwrap();

        let second = prepare(&base, &at(8, 30, 0)).unwrap();
        assert_eq!(first, second);
        // existing artifacts are not truncated
        assert!(fs::metadata(&second.trajectory).unwrap().len() > 0);
    }

    #[test]
    fn test_prepare_keeps_existing_artifacts() {
        let root = tempdir().unwrap();
        let base = root.path().join("dataset");
        let dir = base.join("20240307_120000");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(TRAJECTORY_FILE), "trajectory").unwrap();
        fs::write(dir.join(POINTS_FILE), "points").unwrap();

        let files = prepare(&base, &at(12, 0, 0)).unwrap();

        assert_eq!(fs::read_to_string(&files.trajectory).unwrap(), "trajectory");
        assert_eq!(fs::read_to_string(&files.points).unwrap(), "points");
        assert_eq!(fs::metadata(&files.images).unwrap().len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_prepare_read_only_session_dir() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempdir().unwrap();
        let base = root.path().join("dataset");
        let dir = base.join("20240307_120000");
        fs::create_dir_all(&dir).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        // root ignores permission bits
        let scratch = dir.join(".scratch");
        if fs::write(&scratch, "").is_ok() {
            fs::remove_file(&scratch).unwrap();
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let err = prepare(&base, &at(12, 0, 0)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::PrepareOutput {
                step: PrepareStep::OutputFile,
                ..
            }
        ));
        assert!(err.to_string().starts_with("Failed to create file "));
        assert!(!dir.join(TRAJECTORY_FILE).exists());

        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
