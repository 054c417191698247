use std::path::{Component, Path, PathBuf};

use anyhow::{Result, anyhow, bail};

pub const DEFAULT_DATASET_FILE: &str = "chinook.db";

/// Resolves which SQLite file to read.
///
/// Without `--db` the dataset is `chinook.db` in `cwd`. An override that is
/// already absolute is used as given; `~/...` expands against `home_dir`,
/// which is only consulted in that case, and other relative overrides
/// resolve against `cwd`.
pub fn resolve_dataset_path(
    dataset_override: Option<&Path>,
    cwd: &Path,
    home_dir: Option<&Path>,
) -> Result<PathBuf> {
    let resolved = match dataset_override {
        None => absolute_cwd(cwd)?.join(DEFAULT_DATASET_FILE),
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => match strip_home_prefix(path)? {
            Some(rest) => {
                let home_dir = home_dir
                    .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir to expand `~`"))?;
                if !home_dir.is_absolute() {
                    bail!("home_dir must be absolute: {}", home_dir.display());
                }
                home_dir.join(rest)
            }
            None => absolute_cwd(cwd)?.join(path),
        },
    };

    Ok(normalize_lexical(&resolved))
}

fn absolute_cwd(cwd: &Path) -> Result<&Path> {
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }
    Ok(cwd)
}

/// `Some(rest)` for `~` and `~/rest`; `~user` forms are rejected.
fn strip_home_prefix(path: &Path) -> Result<Option<PathBuf>> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => Ok(Some(components.collect())),
        Some(Component::Normal(first))
            if first
                .to_str()
                .is_some_and(|segment| segment.starts_with('~')) =>
        {
            bail!(
                "unsupported home expansion in dataset path (use `~/...`): {}",
                path.display()
            )
        }
        _ => Ok(None),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::resolve_dataset_path;

    #[test]
    fn default_dataset_sits_in_cwd() {
        let path = resolve_dataset_path(None, Path::new("/srv/store"), None)
            .expect("default dataset should resolve");

        assert_eq!(path, Path::new("/srv/store/chinook.db"));
    }

    #[test]
    fn absolute_override_needs_neither_home_nor_cwd() {
        let path = resolve_dataset_path(
            Some(Path::new("/data/../data/chinook.sqlite")),
            Path::new("not/absolute"),
            None,
        )
        .expect("absolute --db should resolve without HOME");

        assert_eq!(path, Path::new("/data/chinook.sqlite"));
    }

    #[test]
    fn tilde_override_requires_a_home_dir() {
        let err = resolve_dataset_path(Some(Path::new("~/chinook.db")), Path::new("/srv"), None)
            .expect_err("`~` without a home dir must fail");
        assert!(err.to_string().contains("HOME is not set"), "unexpected error: {err}");

        let path = resolve_dataset_path(
            Some(Path::new("~/datasets/chinook.db")),
            Path::new("/srv"),
            Some(Path::new("/home/analyst")),
        )
        .expect("`~` should expand against the home dir");
        assert_eq!(path, Path::new("/home/analyst/datasets/chinook.db"));
    }

    #[test]
    fn relative_override_joins_cwd() {
        let path = resolve_dataset_path(
            Some(Path::new("./snapshots/../chinook.db")),
            Path::new("/srv/store"),
            None,
        )
        .expect("relative --db should resolve");

        assert_eq!(path, Path::new("/srv/store/chinook.db"));
    }

    #[test]
    fn rejects_relative_home_and_cwd_when_they_are_used() {
        let err = resolve_dataset_path(None, Path::new("srv"), None)
            .expect_err("relative cwd must fail for the default dataset");
        assert!(err.to_string().contains("cwd must be absolute"), "unexpected error: {err}");

        let err = resolve_dataset_path(
            Some(Path::new("~")),
            Path::new("/srv"),
            Some(Path::new("home")),
        )
        .expect_err("relative home dir must fail for `~`");
        assert!(err.to_string().contains("home_dir must be absolute"), "unexpected error: {err}");
    }

    #[test]
    fn rejects_tilde_user_syntax() {
        let err = resolve_dataset_path(Some(Path::new("~analyst/chinook.db")), Path::new("/srv"), None)
            .expect_err("`~user` must fail");

        assert!(
            err.to_string().contains("unsupported home expansion"),
            "unexpected error: {err}"
        );
    }
}
