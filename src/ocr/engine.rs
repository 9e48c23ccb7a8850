use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

use super::preprocess::upscale_nearest;
use super::setup::{find_tessdata_dir, find_tesseract_executable};
use super::{OcrEngine, OcrError, OcrText};

/// Tesseract invoked as a subprocess, reading text from stdout.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    upscale: u32,
}

impl TesseractOcr {
    /// Locates the Tesseract install; fails if none is found.
    pub fn locate(configured: Option<&Path>, upscale: u32) -> Result<Self, OcrError> {
        let executable = find_tesseract_executable(configured)?;
        let tessdata = find_tessdata_dir(&executable);
        tracing::info!(
            "Using Tesseract at {} (tessdata: {})",
            executable.display(),
            tessdata
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "default".to_string())
        );
        Ok(Self {
            executable,
            tessdata,
            upscale,
        })
    }

    /// Tuned invocation: LSTM engine, single uniform block, and a DPI hint
    /// matching the upscaled input.
    fn run_tuned(&self, input: &Path) -> Result<String, OcrError> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input)
            .arg("stdout")
            .args(["--oem", "3", "--psm", "6", "--dpi", "300"]);
        if let Some(tessdata) = &self.tessdata {
            cmd.arg("--tessdata-dir").arg(tessdata).args(["-l", "eng"]);
        }
        self.run(cmd)
    }

    /// Plain invocation used when the tuned one fails.
    fn run_basic(&self, input: &Path) -> Result<String, OcrError> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input).arg("stdout");
        self.run(cmd)
    }

    fn run(&self, mut cmd: Command) -> Result<String, OcrError> {
        let output = cmd.output().map_err(|source| OcrError::Spawn {
            program: self.executable.clone(),
            source,
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::EngineFailed(stderr.trim().to_string()));
        }
        Ok(clean_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &RgbaImage) -> Result<OcrText, OcrError> {
        let original = save_temp_png(image)?;
        let enhanced = save_temp_png(&upscale_nearest(image, self.upscale))?;

        match self.run_tuned(enhanced.path()) {
            Ok(text) => Ok(OcrText::ocr(text)),
            Err(e) => {
                tracing::warn!("Tuned Tesseract run failed ({}), trying basic invocation", e);
                self.run_basic(original.path()).map(OcrText::ocr)
            }
        }
    }
}

fn save_temp_png(image: &RgbaImage) -> Result<NamedTempFile, OcrError> {
    let file = NamedTempFile::with_suffix(".png").map_err(|e| OcrError::Input(e.to_string()))?;
    image
        .save(file.path())
        .map_err(|e| OcrError::Input(e.to_string()))?;
    Ok(file)
}

/// Drops the trailing form feed Tesseract emits and unifies line endings.
fn clean_output(stdout: &str) -> String {
    stdout.replace("\r\n", "\n").replace('\x0c', "").trim_end().to_string()
}
