//! This module provides the `ProgramLoader` struct, responsible for loading programs from
//! files, directories and strings. Files ending in `.json` are decoded with serde; everything
//! else goes through the `.dtm` parser.

use crate::parser::parse;
use crate::types::{MachineError, Program, MAX_PROGRAM_SIZE};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions picked up by [`ProgramLoader::load_programs`].
const PROGRAM_EXTENSIONS: [&str; 2] = ["dtm", "json"];

/// `ProgramLoader` is a utility struct for loading programs.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single program from the specified file path.
    ///
    /// # Arguments
    ///
    /// * `path` - The `.dtm` or `.json` file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and decoded.
    /// * `Err(MachineError::FileError)` if the file cannot be read or is too large.
    /// * `Err(MachineError::ParseError)` / `Err(MachineError::ValidationError)` if the text is
    ///   not a valid program.
    /// * `Err(MachineError::JsonError)` if a `.json` file is not a valid program.
    pub fn load_program(path: &Path) -> Result<Program, MachineError> {
        let metadata = fs::metadata(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if metadata.len() > MAX_PROGRAM_SIZE as u64 {
            return Err(MachineError::FileError(format!(
                "File {} is larger than {} bytes",
                path.display(),
                MAX_PROGRAM_SIZE
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        debug!("Loading program from {}", path.display());

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::load_program_from_json(&content)
        } else {
            parse(&content)
        }
    }

    /// Loads a single program from `.dtm` text.
    ///
    /// This is useful for parsing programs that are not stored in files, e.g., from user input.
    pub fn load_program_from_string(content: &str) -> Result<Program, MachineError> {
        parse(content)
    }

    /// Loads a single program from its JSON form.
    ///
    /// The decoded program gets the same checks as one parsed from `.dtm` text.
    pub fn load_program_from_json(content: &str) -> Result<Program, MachineError> {
        let program: Program = serde_json::from_str(content)?;
        program.validate()?;
        Ok(program)
    }

    /// Loads every `.dtm` and `.json` program in a directory.
    ///
    /// Directories and files with other extensions are skipped. Each element of the result
    /// carries either the loaded program and its path, or the error for that file.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), MachineError>> {
        if !directory.exists() {
            return vec![Err(MachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(MachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(MachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                if path.is_dir()
                    || !path
                        .extension()
                        .is_some_and(|ext| PROGRAM_EXTENSIONS.iter().any(|e| ext == *e))
                {
                    return None;
                }

                Some(Self::load_program(&path).map(|program| (path, program)))
            })
            .collect();

        // Directory order is platform dependent.
        results.sort_by_key(|result| match result {
            Ok((path, _)) => Some(path.clone()),
            Err(_) => None,
        });

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const VALID: &str = "name: Test Program\nhalt: stop\nrules:\n  start:\n    a -> b, R, stop\n";

    fn write_file(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_valid_program() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.dtm");
        write_file(&file_path, VALID);

        let program = ProgramLoader::load_program(&file_path).unwrap();
        assert_eq!(program.name, "Test Program");
        assert_eq!(program.initial_state, "start");
        assert_eq!(program.table.len(), 1);
    }

    #[test]
    fn test_load_json_program() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.json");

        let program = ProgramLoader::load_program_from_string(VALID).unwrap();
        write_file(&file_path, &serde_json::to_string_pretty(&program).unwrap());

        let loaded = ProgramLoader::load_program(&file_path).unwrap();
        assert_eq!(loaded, program);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "name": "Minimal",
            "initial_state": "S0",
            "halting_states": ["S1"],
            "table": [
                {"state": "S0", "read": "B", "write": "X", "direction": "Right", "next": "S1"}
            ]
        }"#;

        let program = ProgramLoader::load_program_from_json(json).unwrap();
        assert_eq!(program.blank, "[]");
        assert_eq!(program.separator, "_");
        assert!(program.inputs.is_empty());
    }

    #[test]
    fn test_json_rejects_empty_separator() {
        let json = r#"{
            "name": "No separator",
            "separator": "",
            "initial_state": "S0",
            "halting_states": ["S1"],
            "table": []
        }"#;

        assert_eq!(
            ProgramLoader::load_program_from_json(json),
            Err(MachineError::ValidationError(
                "Separator must not be empty".to_string()
            ))
        );

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("no-separator.json");
        write_file(&file_path, json);
        assert!(matches!(
            ProgramLoader::load_program(&file_path),
            Err(MachineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_invalid_program() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.dtm");
        write_file(&file_path, "This is not a valid program");

        assert!(ProgramLoader::load_program(&file_path).is_err());

        let json_path = dir.path().join("invalid.json");
        write_file(&json_path, "{\"name\": 1}");
        assert!(matches!(
            ProgramLoader::load_program(&json_path),
            Err(MachineError::JsonError(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = ProgramLoader::load_program(&dir.path().join("missing.dtm"));

        assert!(matches!(result, Err(MachineError::FileError(_))));
    }

    #[test]
    fn test_load_oversized_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("big.dtm");
        let padding = "#".repeat(MAX_PROGRAM_SIZE);
        write_file(&file_path, &format!("{}\n{}", padding, VALID));

        let error = ProgramLoader::load_program(&file_path).unwrap_err();
        assert!(error.to_string().contains("larger than"));
    }

    #[test]
    fn test_load_programs_from_directory() {
        let dir = tempdir().unwrap();

        write_file(&dir.path().join("valid.dtm"), VALID);
        write_file(&dir.path().join("invalid.dtm"), "This is not a valid program");
        write_file(&dir.path().join("ignored.txt"), "This file should be ignored");
        fs::create_dir(dir.path().join("nested.dtm")).unwrap();

        let results = ProgramLoader::load_programs(dir.path());

        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[test]
    fn test_load_programs_missing_directory() {
        let dir = tempdir().unwrap();
        let results = ProgramLoader::load_programs(&dir.path().join("nope"));

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
