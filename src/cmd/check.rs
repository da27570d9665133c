// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Write;
use std::path::Path;
use std::path::PathBuf;

use notedown_core::assemble::assemble;
use notedown_core::config::Config;
use notedown_core::error::Fallible;
use notedown_core::error::fail;
use notedown_core::parser::parse_file;
use walkdir::WalkDir;

/// Check every note file under `path` and describe what was found.
pub fn check_notes(path: &str, config: &Config) -> Fallible<String> {
    let files = note_files(Path::new(path))?;
    let mut report = String::new();
    let mut total = 0;
    for file in &files {
        let parsed = parse_file(file)?;
        let fieldless = parsed.fieldless.clone();
        let assembled = assemble(parsed, config)?;
        for note in &assembled.notes {
            writeln!(
                report,
                "{}: {} [{}] {} fields",
                file.display(),
                note.title,
                note.model,
                note.fields.len()
            )?;
        }
        for warning in &assembled.warnings {
            writeln!(report, "{}: warning: {warning}", file.display())?;
        }
        for title in &fieldless {
            writeln!(
                report,
                "{}: warning: note '{title}' has no fields and was ignored",
                file.display()
            )?;
        }
        total += assembled.notes.len();
    }
    writeln!(report, "{total} notes in {} files.", files.len())?;
    Ok(report)
}

/// A single file, or every `.md` file below a directory, in path order.
fn note_files(path: &Path) -> Fallible<Vec<PathBuf>> {
    if !path.exists() {
        return fail(format!("No such file or directory: {}", path.display()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs::create_dir;
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_check_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.md");
        write(&path, "# One\n## Front\na\n## Back\nb\n# Two\n## Question\nc\n## Back\nd\n")?;
        let report = check_notes(&path.display().to_string(), &Config::default())?;
        assert!(report.contains("One [Basic] 2 fields"));
        assert!(report.contains("warning:"));
        assert!(report.ends_with("2 notes in 1 files.\n"));
        Ok(())
    }

    #[test]
    fn test_check_reports_fieldless_note() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.md");
        write(&path, "# One\n## Front\na\n## Back\nb\n# Lost\nsome text\n")?;
        let report = check_notes(&path.display().to_string(), &Config::default())?;
        assert!(report.contains("warning: note 'Lost' has no fields"));
        assert!(report.ends_with("1 notes in 1 files.\n"));
        Ok(())
    }

    #[test]
    fn test_check_directory() -> Fallible<()> {
        let dir = tempdir()?;
        create_dir(dir.path().join("sub"))?;
        write(dir.path().join("a.md"), "# A\n## Front\na\n## Back\nb\n")?;
        write(dir.path().join("sub").join("b.md"), "# B\n## Front\na\n## Back\nb\n")?;
        write(dir.path().join("ignored.txt"), "not a note")?;
        let report = check_notes(&dir.path().display().to_string(), &Config::default())?;
        assert!(report.ends_with("2 notes in 2 files.\n"));
        Ok(())
    }

    #[test]
    fn test_check_invalid_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.md");
        write(&path, "# One\n## Front\na\n")?;
        assert!(check_notes(&path.display().to_string(), &Config::default()).is_err());
        Ok(())
    }

    #[test]
    fn test_check_missing_path() {
        assert!(check_notes("/nonexistent/notes.md", &Config::default()).is_err());
    }
}
