use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes through a sibling `.tmp` file and renames it over `path`.
pub(crate) fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text.as_bytes())?;
    replace_file(&tmp_path, path)
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    // rename does not replace an existing file on every platform
    match fs::remove_file(final_path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(tmp_path);
            return Err(error);
        }
    }

    fs::rename(tmp_path, final_path).inspect_err(|_| {
        let _ = fs::remove_file(tmp_path);
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "settings".into());
    tmp_name.push(".tmp");
    path.with_file_name(tmp_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_new_file_and_creates_parent_dirs() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("nested").join("settings.json");

        write_text_atomic(&path, "{}").expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "{}");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn replaces_existing_contents() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("settings.json");
        fs::write(&path, "old contents that are longer").expect("seed");

        write_text_atomic(&path, "new").expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "new");
    }

    #[test]
    fn temp_path_is_a_sibling() {
        let path = Path::new("root").join("settings.json");
        assert_eq!(
            temp_path_for(&path),
            Path::new("root").join("settings.json.tmp")
        );
    }
}
