// Storage Layout - where each job's files live
//
// <scratch_root>/<job_id>.py               generated source (processing marker)
// <scratch_root>/<job_id>.failure.json     failure record (optional)
// <media_root>/videos/<job_id>/<quality_tag>/<scene_name>.<ext>   canonical artifact

use crate::domain::JobId;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCENE_NAME: &str = "ManimScene";

/// Output folder the renderer uses for its low-quality preset
pub const DEFAULT_QUALITY_TAG: &str = "480p15";

pub const SOURCE_EXTENSION: &str = "py";
pub const ARTIFACT_EXTENSION: &str = "mp4";
pub const ARTIFACT_MEDIA_TYPE: &str = "video/mp4";

/// Renderer scratch folder holding per-segment clips; never a final artifact
pub const PARTIAL_OUTPUT_DIR: &str = "partial_movie_files";

const VIDEOS_DIR: &str = "videos";
const FAILURE_SUFFIX: &str = ".failure.json";
const STAGING_SUFFIX: &str = ".partial";

/// Filesystem layout shared by the job store, the locator and the renderer.
///
/// Every path here is a pure function of the job id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub scratch_root: PathBuf,
    pub media_root: PathBuf,
    pub quality_tag: String,
    pub scene_name: String,
    pub artifact_extension: String,
}

impl StorageLayout {
    pub fn new(scratch_root: impl Into<PathBuf>, media_root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            media_root: media_root.into(),
            quality_tag: DEFAULT_QUALITY_TAG.to_string(),
            scene_name: DEFAULT_SCENE_NAME.to_string(),
            artifact_extension: ARTIFACT_EXTENSION.to_string(),
        }
    }

    pub fn source_path(&self, job_id: &JobId) -> PathBuf {
        self.scratch_root
            .join(format!("{}.{}", job_id, SOURCE_EXTENSION))
    }

    /// Hidden temp file the source is written to before being linked in place
    pub fn staging_path(&self, job_id: &JobId) -> PathBuf {
        self.scratch_root
            .join(format!(".{}.{}{}", job_id, SOURCE_EXTENSION, STAGING_SUFFIX))
    }

    pub fn failure_path(&self, job_id: &JobId) -> PathBuf {
        self.scratch_root
            .join(format!("{}{}", job_id, FAILURE_SUFFIX))
    }

    /// Root of the renderer output for one job (fallback search root)
    pub fn job_media_root(&self, job_id: &JobId) -> PathBuf {
        self.media_root.join(VIDEOS_DIR).join(job_id.as_str())
    }

    pub fn canonical_artifact_path(&self, job_id: &JobId) -> PathBuf {
        self.job_media_root(job_id)
            .join(&self.quality_tag)
            .join(format!("{}.{}", self.scene_name, self.artifact_extension))
    }

    /// Job id encoded in a scratch-root file name, if it is a source file
    pub fn job_id_from_source_file(&self, path: &Path) -> Option<JobId> {
        if path.extension()? != SOURCE_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        JobId::parse(stem).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn layout() -> StorageLayout {
        StorageLayout::new("/srv/scratch", "/srv/media")
    }

    #[test]
    fn test_canonical_path_convention() {
        let id = JobId::parse("abc-123").unwrap();
        assert_eq!(
            layout().canonical_artifact_path(&id),
            PathBuf::from("/srv/media/videos/abc-123/480p15/ManimScene.mp4")
        );
        assert_eq!(
            layout().source_path(&id),
            PathBuf::from("/srv/scratch/abc-123.py")
        );
    }

    #[test]
    fn test_canonical_path_is_pure() {
        let id = JobId::parse("same-id").unwrap();
        let l = layout();
        assert_eq!(l.canonical_artifact_path(&id), l.canonical_artifact_path(&id));
        assert_eq!(
            l.canonical_artifact_path(&id),
            layout().canonical_artifact_path(&JobId::parse("same-id").unwrap())
        );
    }

    #[test]
    fn test_canonical_paths_never_collide() {
        let l = layout();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let id = JobId::parse(uuid::Uuid::new_v4().to_string()).unwrap();
            assert!(seen.insert(l.canonical_artifact_path(&id)));
        }
    }

    #[test]
    fn test_artifact_stays_under_media_root() {
        let id = JobId::parse("x").unwrap();
        assert!(layout()
            .canonical_artifact_path(&id)
            .starts_with(layout().job_media_root(&id)));
    }

    #[test]
    fn test_job_id_from_source_file() {
        let l = layout();
        assert_eq!(
            l.job_id_from_source_file(Path::new("/srv/scratch/abc.py")),
            Some(JobId::parse("abc").unwrap())
        );
        assert_eq!(l.job_id_from_source_file(Path::new("/srv/scratch/abc.failure.json")), None);
        assert_eq!(l.job_id_from_source_file(Path::new("/srv/scratch/.abc.py.partial")), None);
    }
}
