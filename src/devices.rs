use std::path::{Path, PathBuf};

/// Recognises a bare drive letter: `C`, `c:`, `C:\` or `C:/`.
pub fn drive_letter(volume: &str) -> Option<char> {
    let trimmed = volume.trim_end_matches(['\\', '/']);
    let trimmed = trimmed.strip_suffix(':').unwrap_or(trimmed);
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => Some(letter.to_ascii_uppercase()),
        _ => None,
    }
}

/// Raw volume namespace path for a drive letter.
pub fn windows_volume_path(letter: char) -> String {
    format!(r"\\.\{}:", letter.to_ascii_uppercase())
}

/// Turns a user-supplied volume identifier into a path that can be opened.
///
/// Drive letters map to the raw volume namespace on Windows; every other
/// identifier (a device node, an image file) is taken as a path.
pub fn resolve_volume_path(volume: &str) -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Some(letter) = drive_letter(volume) {
        return PathBuf::from(windows_volume_path(letter));
    }

    PathBuf::from(volume)
}

/// Short name for a volume, used in output file names.
pub fn volume_label(volume: &str) -> String {
    if let Some(letter) = drive_letter(volume) {
        return letter.to_string();
    }

    Path::new(volume)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "volume".to_string())
}
