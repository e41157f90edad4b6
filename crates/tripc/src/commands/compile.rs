//! `tripc <src.trip> <out.tripc>`: parse source, assemble a `TripCObject`,
//! write its canonical text encoding to disk.

use std::path::{Path, PathBuf};

use log::debug;
use trip_common::ModuleName;
use trip_object::TripCObject;
use trip_parser::parse_source;

pub fn run(paths: &[PathBuf]) -> Result<(), String> {
    let [src, out] = paths else {
        return Err(format!(
            "compile mode takes exactly 2 arguments (<src.trip> <out.tripc>), got {}",
            paths.len()
        ));
    };
    validate_extension(src, "trip")?;
    validate_extension(out, "tripc")?;
    if !src.exists() {
        return Err(format!("'{}' does not exist", src.display()));
    }

    let source = std::fs::read_to_string(src).map_err(|e| format!("failed to read '{}': {e}", src.display()))?;
    let defs = parse_source(&source).map_err(|e| format!("{}: {e}", src.display()))?;

    let object = TripCObject::from_definitions(module_name_from_path(src), defs).map_err(|e| e.to_string())?;

    std::fs::write(out, object.to_canonical_string()).map_err(|e| format!("failed to write '{}': {e}", out.display()))?;
    debug!("compiled {} -> {}", src.display(), out.display());
    Ok(())
}

fn validate_extension(path: &Path, expected: &str) -> Result<(), String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == expected => Ok(()),
        _ => Err(format!("'{}' must have a .{expected} extension", path.display())),
    }
}

/// Fallback module name when the source has no `module` declaration of its
/// own: the file stem, PascalCased.
fn module_name_from_path(path: &Path) -> ModuleName {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Main");
    ModuleName::new(to_pascal_case(stem))
}

fn to_pascal_case(s: &str) -> String {
    s.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_cases_snake_and_kebab_stems() {
        assert_eq!(to_pascal_case("prelude"), "Prelude");
        assert_eq!(to_pascal_case("church_numerals"), "ChurchNumerals");
        assert_eq!(to_pascal_case("church-numerals"), "ChurchNumerals");
    }

    #[test]
    fn rejects_a_source_path_missing_the_trip_extension() {
        let err = run(&[PathBuf::from("a.txt"), PathBuf::from("a.tripc")]).unwrap_err();
        assert!(err.contains(".trip"));
    }

    #[test]
    fn rejects_an_output_path_missing_the_tripc_extension() {
        let err = run(&[PathBuf::from("a.trip"), PathBuf::from("a.out")]).unwrap_err();
        assert!(err.contains(".tripc"));
    }

    #[test]
    fn rejects_the_wrong_argument_count() {
        let err = run(&[PathBuf::from("a.trip")]).unwrap_err();
        assert!(err.contains("exactly 2 arguments"));
    }
}
