//! `tripc --link <a.tripc> <b.tripc> ...`: load object files, link them, and
//! print the resulting SKI expression to standard output.

use std::path::{Path, PathBuf};

use log::debug;
use trip_common::LinkConfig;
use trip_object::TripCObject;

pub fn run(paths: &[PathBuf]) -> Result<(), String> {
    if paths.is_empty() {
        return Err("--link requires at least one .tripc file".to_string());
    }

    let mut objects = Vec::with_capacity(paths.len());
    for path in paths {
        validate_tripc(path)?;
        let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {e}", path.display()))?;
        let object = TripCObject::from_canonical_string(&text).map_err(|e| format!("{}: {e}", path.display()))?;
        objects.push(object);
    }

    debug!("linking {} object(s)", objects.len());
    let ski = trip_link::link(objects, &LinkConfig::default()).map_err(|e| e.to_string())?;
    println!("{ski}");
    Ok(())
}

fn validate_tripc(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("'{}' does not exist", path.display()));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("tripc") => Ok(()),
        _ => Err(format!("'{}' must have a .tripc extension", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_an_empty_object_list() {
        let err = run(&[]).unwrap_err();
        assert!(err.contains("at least one"));
    }

    #[test]
    fn rejects_a_missing_file() {
        let err = run(&[PathBuf::from("/nonexistent/path/a.tripc")]).unwrap_err();
        assert!(err.contains("does not exist"));
    }

    #[test]
    fn rejects_a_non_tripc_extension() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("obj");
        std::fs::write(&path, "").unwrap();
        let err = run(&[path.clone()]).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.contains(".tripc"));
    }
}
