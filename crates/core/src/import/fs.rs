use super::types::ImportError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "ts"];

/// Moves `source` to `dest`, preferring an atomic rename. Falls back
/// to copy-and-delete when the paths sit on different filesystems.
pub fn try_atomic_move(source: &Path, dest: &Path) -> Result<(), ImportError> {
    if dest.exists() {
        return Err(ImportError::DestinationExists(dest.display().to_string()));
    }
    ensure_parent_dirs(dest)?;

    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) => {
            fs::copy(source, dest)?;
            fs::remove_file(source)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn ensure_parent_dirs(path: &Path) -> Result<(), ImportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Locates the payload video file. A file path is taken as-is when it
/// has a video extension; a directory is searched recursively for the
/// largest video file (season packs and samples make "any video file"
/// the wrong answer).
pub fn find_video_file(path: &Path) -> Result<std::path::PathBuf, ImportError> {
    if path.is_file() {
        if has_video_extension(path) {
            return Ok(path.to_path_buf());
        }
        return Err(ImportError::NoVideoFile(path.display().to_string()));
    }

    let mut best: Option<(u64, std::path::PathBuf)> = None;
    let mut stack = vec![path.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let entry_path = entry.path();
            if entry_path.is_dir() {
                stack.push(entry_path);
            } else if has_video_extension(&entry_path) {
                let size = entry.metadata()?.len();
                if best.as_ref().is_none_or(|(s, _)| size > *s) {
                    best = Some((size, entry_path));
                }
            }
        }
    }
    best.map(|(_, p)| p)
        .ok_or_else(|| ImportError::NoVideoFile(path.display().to_string()))
}

fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(path: &Path, bytes: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(path).unwrap();
        f.write_all(&vec![0u8; bytes]).unwrap();
    }

    #[test]
    fn test_move_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.mkv");
        write_file(&source, 10);
        let dest = dir.path().join("Show/Season 01/ep.mkv");

        try_atomic_move(&source, &dest).unwrap();
        assert!(dest.exists());
        assert!(!source.exists());
    }

    #[test]
    fn test_move_refuses_existing_dest() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.mkv");
        write_file(&source, 10);
        let dest = dir.path().join("dest.mkv");
        write_file(&dest, 5);

        let err = try_atomic_move(&source, &dest).unwrap_err();
        assert!(matches!(err, ImportError::DestinationExists(_)));
        assert!(source.exists());
    }

    #[test]
    fn test_find_video_file_picks_largest() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("sample/sample.mkv"), 100);
        write_file(&dir.path().join("episode.mkv"), 10_000);
        write_file(&dir.path().join("info.nfo"), 50_000);

        let found = find_video_file(dir.path()).unwrap();
        assert!(found.ends_with("episode.mkv"));
    }

    #[test]
    fn test_find_video_file_direct_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("movie.mp4");
        write_file(&file, 10);
        assert_eq!(find_video_file(&file).unwrap(), file);

        let nfo = dir.path().join("movie.nfo");
        write_file(&nfo, 10);
        assert!(matches!(
            find_video_file(&nfo),
            Err(ImportError::NoVideoFile(_))
        ));
    }

    #[test]
    fn test_find_video_file_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_video_file(dir.path()),
            Err(ImportError::NoVideoFile(_))
        ));
    }
}
