//! Executable discovery and the version self-test.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::{env, process};

use tracing::{debug, error, info};

use crate::error::{CmakeError, Result};
use crate::instance::CMake;

const EXECUTABLE: &str = "cmake";

/// Resolves the cmake executable and wraps it in a [`CMake`] instance.
///
/// With `user_dir` set, only that directory is searched; otherwise the
/// system `PATH` is, never the current directory. The candidate is then
/// validated by running it with `--version`; a non-zero exit or output
/// with no recognizable version is fatal.
pub fn locate(user_dir: Option<&Path>) -> Result<CMake> {
    debug!("searching for the {EXECUTABLE} executable");
    let executable = search_executable(user_dir)?;
    debug!(
        "the search was successful, candidate executable at {}",
        executable.display()
    );

    let version = probe_version(&executable)?;
    info!("cmake {version} at {}", executable.display());
    Ok(CMake::new(executable, version))
}

fn search_executable(user_dir: Option<&Path>) -> Result<PathBuf> {
    let found = match user_dir {
        Some(dir) => {
            debug!("using user specified directory to search: {}", dir.display());
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            which::which_in(EXECUTABLE, Some(dir), cwd)
        }
        None => which::which(EXECUTABLE),
    };

    found.map_err(|source| {
        error!("the search failed: {source}");
        let path_dump = env::var("PATH")
            .map(|path| {
                env::split_paths(&path)
                    .map(|entry| format!("   {}", entry.display()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        CmakeError::ExecutableNotFound { source, path_dump }
    })
}

/// Runs the candidate with `--version` and extracts the version from the
/// first output line.
fn probe_version(executable: &Path) -> Result<String> {
    debug!("testing candidate {}", executable.display());
    let output = process::Command::new(executable)
        .arg("--version")
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(CmakeError::VersionProbe {
            path: executable.to_path_buf(),
            reason: format!("the executable exited with {}", output.status),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().unwrap_or("");
    parse_version(first).ok_or_else(|| CmakeError::VersionProbe {
        path: executable.to_path_buf(),
        reason: format!("expected a version number in {first:?}"),
    })
}

/// The first numeral-leading run of digits and dots, e.g. `3.28.1` out of
/// `cmake version 3.28.1`.
fn parse_version(line: &str) -> Option<String> {
    let start = line.find(|c: char| c.is_ascii_digit())?;
    Some(
        line[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_extracted_from_the_first_digit_on() {
        assert_eq!(
            parse_version("cmake version 3.28.1").as_deref(),
            Some("3.28.1")
        );
        assert_eq!(parse_version("cmake version 3.30").as_deref(), Some("3.30"));
        assert_eq!(
            parse_version("cmake version 3.28.1-dirty").as_deref(),
            Some("3.28.1")
        );
    }

    #[test]
    fn lines_without_digits_have_no_version() {
        assert_eq!(parse_version("cmake suite maintained by Kitware"), None);
        assert_eq!(parse_version(""), None);
    }

    #[cfg(unix)]
    mod with_subprocess {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        fn stub_cmake(dir: &Path, script: &str) -> PathBuf {
            let path = dir.join(EXECUTABLE);
            fs::write(&path, script).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn locate_accepts_a_working_stub_in_a_user_directory() {
            let dir = tempfile::tempdir().unwrap();
            stub_cmake(dir.path(), "#!/bin/sh\necho 'cmake version 3.99.1'\n");

            let cmake = locate(Some(dir.path())).unwrap();
            assert_eq!(cmake.version(), "3.99.1");
            assert_eq!(cmake.executable(), dir.path().join(EXECUTABLE));
        }

        #[test]
        fn a_failing_version_probe_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            stub_cmake(dir.path(), "#!/bin/sh\nexit 3\n");

            assert!(matches!(
                locate(Some(dir.path())),
                Err(CmakeError::VersionProbe { .. })
            ));
        }

        #[test]
        fn version_less_output_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            stub_cmake(dir.path(), "#!/bin/sh\necho 'no numbers here'\n");

            assert!(matches!(
                locate(Some(dir.path())),
                Err(CmakeError::VersionProbe { .. })
            ));
        }

        #[test]
        fn an_empty_directory_yields_resolution_failure() {
            let dir = tempfile::tempdir().unwrap();
            let result = locate(Some(dir.path()));
            assert!(matches!(
                result,
                Err(CmakeError::ExecutableNotFound { .. })
            ));
        }
    }
}
