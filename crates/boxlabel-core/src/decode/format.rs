//! Source image allow-list and derived file naming.

use std::path::Path;

/// Extension given to every derived (preprocessed or processed) image.
pub const DERIVED_EXTENSION: &str = "jpg";

/// Source formats accepted into a folder pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// `.jpg` or `.jpeg`
    Jpeg,
    Png,
    /// First frame only.
    Gif,
    Webp,
}

impl SourceFormat {
    /// Classify a file by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            "png" => Some(SourceFormat::Png),
            "gif" => Some(SourceFormat::Gif),
            "webp" => Some(SourceFormat::Webp),
            _ => None,
        }
    }
}

/// Whether a file name is on the source allow-list.
pub fn is_source_image(path: &Path) -> bool {
    SourceFormat::from_path(path).is_some()
}

/// Name of the derived file for a source image: `photo.PNG` -> `photo.jpg`.
///
/// Sources that share a stem (`a.png`, `a.jpg`) map to the same derived name.
pub fn derived_file_name(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(source_name);
    format!("{stem}.{DERIVED_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_case_insensitive() {
        assert_eq!(SourceFormat::from_path(Path::new("a.JPG")), Some(SourceFormat::Jpeg));
        assert_eq!(SourceFormat::from_path(Path::new("a.jpeg")), Some(SourceFormat::Jpeg));
        assert_eq!(SourceFormat::from_path(Path::new("a.Png")), Some(SourceFormat::Png));
        assert_eq!(SourceFormat::from_path(Path::new("a.gif")), Some(SourceFormat::Gif));
        assert_eq!(SourceFormat::from_path(Path::new("a.WEBP")), Some(SourceFormat::Webp));
    }

    #[test]
    fn rejects_other_files() {
        assert!(!is_source_image(Path::new("fields.json")));
        assert!(!is_source_image(Path::new("raw.nef")));
        assert!(!is_source_image(Path::new("no_extension")));
    }

    #[test]
    fn derived_name_normalizes_extension() {
        assert_eq!(derived_file_name("photo.PNG"), "photo.jpg");
        assert_eq!(derived_file_name("a.b.webp"), "a.b.jpg");
        assert_eq!(derived_file_name("plain"), "plain.jpg");
    }
}
