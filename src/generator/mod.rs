//! Report output

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use log::{error, info};

use crate::errors::ScanResult;
use crate::models::report::Report;

/// Save the report JSON to a file, creating parent directories as needed
pub fn save_report(report: &Report, path: &Path) -> ScanResult<()> {
    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    info!("Saving report to: {}", absolute_path.display());

    if let Some(parent) = absolute_path.parent() {
        if !parent.exists() {
            info!("Creating directory: {}", parent.display());
            fs::create_dir_all(parent)?;
        }
    }

    let json = report.to_json()?;

    let mut file = match File::create(&absolute_path) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to create file: {} - Error: {}", absolute_path.display(), e);
            return Err(e.into());
        }
    };

    if let Err(e) = file.write_all(json.as_bytes()) {
        error!("Failed to write to file: {} - Error: {}", absolute_path.display(), e);
        return Err(e.into());
    }

    info!(
        "Report with {} issues saved to: {} ({} bytes)",
        report.summary().total,
        absolute_path.display(),
        json.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::Completeness;

    #[test]
    fn test_save_report_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("nested").join("report.json");
        let report = Report::new(Vec::new(), Vec::new(), Vec::new(), Completeness::Complete);

        save_report(&report, &path).unwrap();

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report.to_json_value().unwrap());
        assert_eq!(written["summary"]["total"], 0);
    }

    #[test]
    fn test_save_report_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let report = Report::new(Vec::new(), Vec::new(), Vec::new(), Completeness::Complete);
        assert!(save_report(&report, &blocker.join("report.json")).is_err());
    }
}
