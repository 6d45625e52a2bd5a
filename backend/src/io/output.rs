//! Writing `gaps.json`.
//!
//! The report is written to a sibling temp file first and renamed over the
//! target, so readers never see a half-written file and the previous report
//! is replaced in full.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{GapError, GapResult};
use crate::services::Report;

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "gaps.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn write_report(report: &Report, path: &Path) -> GapResult<()> {
    let json = report.to_json_pretty()?;
    let output_err = |source: std::io::Error| GapError::Output {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(output_err)?;
    }

    let tmp = temp_path_for(path);
    fs::write(&tmp, format!("{}\n", json)).map_err(output_err)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(output_err(e));
    }

    info!("Wrote report to {} (fingerprint {})", path.display(), report.fingerprint);
    Ok(())
}
