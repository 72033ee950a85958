// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = path.to_path_buf();
    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Where the config file should be read from: an explicit cli path (relative to `cwd`), then the
/// nearest file named `default_filename` in `cwd` or its parents, then the default config folder.
pub fn resolve_config_path(
    find_in_parent: FindInParent,
    cwd: impl Into<PathBuf>,
    default_config_dir: impl Into<PathBuf>,
    default_filename: &str,
    cli_file: Option<PathBuf>,
) -> PathBuf {
    let cwd = cwd.into();

    if let Some(cli_file) = cli_file {
        if cli_file.is_absolute() {
            return cli_file;
        }
        return clean(cwd.join(cli_file));
    }

    if let Some(found) = find_in_parent(&cwd, default_filename) {
        return found;
    }

    clean(default_config_dir.into().join(default_filename))
}
