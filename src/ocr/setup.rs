use std::path::{Path, PathBuf};
use std::process::Command;

use super::OcrError;

#[cfg(windows)]
const EXE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXE_NAME: &str = "tesseract";

const COMMON_INSTALL_PATHS: [&str; 2] = [
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];

/// Returns the per-user directory for a bundled Tesseract copy.
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flame-reroll")
        .join("tesseract")
}

/// Finds the Tesseract executable.
///
/// Search order: the configured path, a portable copy next to the
/// executable, the per-user directory, the common Windows install locations,
/// then `tesseract` on PATH.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf, OcrError> {
    let mut searched = Vec::new();

    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!("Configured Tesseract path {} does not exist", path.display());
        searched.push(path.display().to_string());
    }

    for dir in [crate::paths::get_tesseract_dir(), get_tesseract_dir()] {
        let local_exe = dir.join(EXE_NAME);
        if local_exe.is_file() {
            return Ok(local_exe);
        }
        searched.push(local_exe.display().to_string());
    }

    for dir in COMMON_INSTALL_PATHS {
        let p = Path::new(dir).join(EXE_NAME);
        if p.is_file() {
            return Ok(p);
        }
        searched.push(p.display().to_string());
    }

    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }
    searched.push("PATH".to_string());

    Err(OcrError::EngineMissing {
        searched: searched.join(", "),
    })
}

/// Finds a tessdata directory holding `eng.traineddata`, if one is known.
///
/// `None` lets Tesseract use its built-in default.
pub fn find_tessdata_dir(executable: &Path) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(parent) = executable.parent() {
        candidates.push(parent.join("tessdata"));
    }
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }

    candidates
        .into_iter()
        .find(|dir| dir.join("eng.traineddata").is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join(EXE_NAME);
        std::fs::write(&exe, b"").unwrap();

        let found = find_tesseract_executable(Some(&exe)).unwrap();
        assert_eq!(found, exe);
    }

    #[test]
    fn test_tessdata_next_to_executable() {
        let dir = tempfile::tempdir().unwrap();
        let tessdata = dir.path().join("tessdata");
        std::fs::create_dir_all(&tessdata).unwrap();
        std::fs::write(tessdata.join("eng.traineddata"), b"").unwrap();

        let found = find_tessdata_dir(&dir.path().join(EXE_NAME));
        assert_eq!(found, Some(tessdata));
    }

    #[test]
    fn test_tesseract_dir_is_per_app() {
        let dir = get_tesseract_dir();
        assert!(dir.ends_with(Path::new("flame-reroll").join("tesseract")));
    }
}
