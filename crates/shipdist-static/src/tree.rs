//! Recursive directory copy.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::builder::BuildError;

/// Recreate `src` under `dest`, copying every file byte-for-byte.
///
/// Directories are created as needed and existing ones are reused, so the
/// copy can target a directory that already holds other content. Empty
/// directories are recreated too. Returns the number of files copied.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize, BuildError> {
    if !src.is_dir() {
        return Err(BuildError::SourceMissing {
            path: src.to_path_buf(),
        });
    }

    fs::create_dir_all(dest).map_err(BuildError::io("create directory", dest))?;

    let mut copied = 0;

    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| BuildError::walk(src, e))?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(BuildError::io("create directory", &target))?;
        } else {
            fs::copy(entry.path(), &target).map_err(BuildError::io("copy", entry.path()))?;
            copied += 1;
        }
    }

    tracing::debug!(
        "Copied {} files from {} to {}",
        copied,
        src.display(),
        dest.display()
    );

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copies_nested_tree() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dist");

        fs::create_dir_all(src.join("css/vendor")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("index.html"), "<p>hi</p>").unwrap();
        fs::write(src.join("css/vendor/reset.css"), "* { margin: 0; }").unwrap();
        fs::write(src.join("logo.png"), [0x89u8, 0x50, 0x4e, 0x47, 0x00, 0xff]).unwrap();

        let copied = copy_tree(&src, &dest).unwrap();

        assert_eq!(copied, 3);
        assert_eq!(fs::read(dest.join("index.html")).unwrap(), b"<p>hi</p>");
        assert_eq!(
            fs::read(dest.join("css/vendor/reset.css")).unwrap(),
            b"* { margin: 0; }"
        );
        assert_eq!(
            fs::read(dest.join("logo.png")).unwrap(),
            [0x89u8, 0x50, 0x4e, 0x47, 0x00, 0xff]
        );
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn copies_into_existing_directory() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("shared");
        let dest = temp.path().join("dist");

        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(dest.join("b.txt"), "b").unwrap();

        copy_tree(&src, &dest).unwrap();

        assert!(dest.join("a.txt").exists());
        assert!(dest.join("b.txt").exists());
    }

    #[test]
    fn leaves_source_untouched() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.css"), "a { }").unwrap();

        copy_tree(&src, &temp.path().join("dist")).unwrap();

        assert_eq!(fs::read_to_string(src.join("a.css")).unwrap(), "a { }");
    }

    #[test]
    fn errors_on_missing_source() {
        let temp = tempdir().unwrap();

        let result = copy_tree(&temp.path().join("nope"), &temp.path().join("dist"));

        assert!(matches!(result, Err(BuildError::SourceMissing { .. })));
        assert!(!temp.path().join("dist").exists());
    }

    #[test]
    fn errors_when_source_is_a_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("src");
        fs::write(&file, "not a dir").unwrap();

        let result = copy_tree(&file, &temp.path().join("dist"));

        assert!(matches!(result, Err(BuildError::SourceMissing { .. })));
    }
}
