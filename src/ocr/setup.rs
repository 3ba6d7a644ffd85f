use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

#[cfg(windows)]
const TESSERACT_EXE: &str = "tesseract.exe";
#[cfg(not(windows))]
const TESSERACT_EXE: &str = "tesseract";

/// Common installation directories checked after the local directory and PATH.
#[cfg(windows)]
const SYSTEM_INSTALL_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];
#[cfg(not(windows))]
const SYSTEM_INSTALL_DIRS: &[&str] = &["/usr/bin", "/usr/local/bin", "/opt/homebrew/bin"];

#[cfg(windows)]
const SYSTEM_TESSDATA_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];
#[cfg(not(windows))]
const SYSTEM_TESSDATA_DIRS: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

/// Returns the directory for storing Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tooltip-inventory")
        .join("tesseract")
}

/// Splits a combined language code ("eng+spa") into its traineddata names.
fn language_parts(language: &str) -> Vec<&str> {
    language
        .split('+')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// True when `dir` holds a traineddata file for every part of `language`.
fn has_traineddata(dir: &Path, language: &str) -> bool {
    let parts = language_parts(language);
    !parts.is_empty()
        && parts
            .iter()
            .all(|l| dir.join(format!("{}.traineddata", l)).exists())
}

/// Ensures Tesseract and the configured language data are available.
///
/// The executable must already be installed; missing traineddata files are
/// copied from a system install or downloaded into the local tessdata dir.
pub fn ensure_tesseract(language: &str) -> Result<()> {
    let executable = find_tesseract_executable()?;

    if let Ok(tessdata) = find_tessdata_dir(language) {
        log(&format!(
            "Tesseract found at: {} (tessdata: {})",
            executable.display(),
            tessdata.display()
        ));
        return Ok(());
    }

    log(&format!(
        "Language data for '{}' not found locally, fetching...",
        language
    ));

    let tessdata_dir = get_tesseract_dir().join("tessdata");
    fs::create_dir_all(&tessdata_dir)?;

    for part in language_parts(language) {
        let target = tessdata_dir.join(format!("{}.traineddata", part));
        if !target.exists() {
            download_tessdata(&tessdata_dir, part)?;
        }
    }

    log(&format!(
        "Tesseract ready at: {} (tessdata: {})",
        executable.display(),
        tessdata_dir.display()
    ));
    Ok(())
}

/// Copies one traineddata file from a system install, or downloads it.
fn download_tessdata(tessdata_dir: &Path, language: &str) -> Result<()> {
    let file_name = format!("{}.traineddata", language);
    let target = tessdata_dir.join(&file_name);

    for dir in SYSTEM_TESSDATA_DIRS {
        let source = PathBuf::from(dir).join(&file_name);
        if source.exists() {
            log(&format!("Copying {} from: {}", file_name, source.display()));
            fs::copy(&source, &target)?;
            return Ok(());
        }
    }

    let url = format!("{}/{}", TESSDATA_REPO, file_name);
    log(&format!("Downloading {}...", url));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "tooltip-inventory")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            file_name,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&target)?;
    file.write_all(&bytes)?;

    log(&format!("Downloaded {} ({} bytes)", file_name, bytes.len()));

    Ok(())
}

/// Finds the Tesseract executable, checking our local dir first, then PATH, then common paths
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let local_exe = get_tesseract_dir().join(TESSERACT_EXE);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in SYSTEM_INSTALL_DIRS {
        let p = PathBuf::from(dir).join(TESSERACT_EXE);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Please install Tesseract-OCR (https://github.com/tesseract-ocr/tesseract) \
         or copy it to: {}",
        get_tesseract_dir().display()
    ))
}

/// Finds a tessdata directory holding traineddata for `language`
pub fn find_tessdata_dir(language: &str) -> Result<PathBuf> {
    let local_tessdata = get_tesseract_dir().join("tessdata");
    if has_traineddata(&local_tessdata, language) {
        return Ok(local_tessdata);
    }

    for dir in SYSTEM_TESSDATA_DIRS {
        let p = PathBuf::from(dir);
        if has_traineddata(&p, language) {
            return Ok(p);
        }
    }

    // Check TESSDATA_PREFIX environment variable
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if has_traineddata(&p, language) {
            return Ok(p);
        }
        let p = p.join("tessdata");
        if has_traineddata(&p, language) {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "tessdata directory not found. Please ensure {}.traineddata is available.",
        language
    ))
}
