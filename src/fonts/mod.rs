//! Font discovery for the report renderer.
//!
//! A bundled Roboto family is preferred. It is searched in
//! `PHOTO_REPORT_FONTS_DIR`, then in `assets/fonts` next to the executable, then
//! in `assets/fonts` below the crate manifest. When none of these hold the four
//! Roboto files, a system family is used instead (Arial on Windows, DejaVu Sans
//! or Liberation Sans on Linux).

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// File names of a family in regular, bold, italic and bold italic order.
type FaceFiles = [&'static str; 4];

const BUNDLED_FACES: FaceFiles = [
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

const FACE_NAMES: [&str; 4] = ["regular", "bold", "italic", "bold italic"];

struct SystemFamily {
    name: &'static str,
    faces: FaceFiles,
    search_dirs: fn() -> Vec<PathBuf>,
}

static SYSTEM_FAMILIES: [SystemFamily; 3] = [
    SystemFamily {
        name: "Arial",
        faces: ["arial.ttf", "arialbd.ttf", "ariali.ttf", "arialbi.ttf"],
        search_dirs: windows_dirs,
    },
    SystemFamily {
        name: "DejaVu Sans",
        faces: [
            "DejaVuSans.ttf",
            "DejaVuSans-Bold.ttf",
            "DejaVuSans-Oblique.ttf",
            "DejaVuSans-BoldOblique.ttf",
        ],
        search_dirs: || {
            linux_dirs(&[
                "truetype/dejavu",
                "TTF",
                "dejavu",
                "dejavu-sans-fonts",
            ])
        },
    },
    SystemFamily {
        name: "Liberation Sans",
        faces: [
            "LiberationSans-Regular.ttf",
            "LiberationSans-Bold.ttf",
            "LiberationSans-Italic.ttf",
            "LiberationSans-BoldItalic.ttf",
        ],
        search_dirs: || {
            linux_dirs(&[
                "truetype/liberation",
                "truetype/liberation2",
                "liberation-sans",
                "TTF",
            ])
        },
    },
];

/// Where a usable font family was found.
enum FontSource {
    Bundled(PathBuf),
    System(&'static SystemFamily, PathBuf),
}

/// Directory holding the bundled fonts inside the source tree.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn non_empty_env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn windows_dirs() -> Vec<PathBuf> {
    match non_empty_env_path("PHOTO_REPORT_WINDOWS_FONTS_DIR") {
        Some(dir) => vec![dir],
        None => ["WINDIR", "SystemRoot"]
            .into_iter()
            .filter_map(non_empty_env_path)
            .map(|root| root.join("Fonts"))
            .collect(),
    }
}

fn linux_dirs(subdirs: &[&str]) -> Vec<PathBuf> {
    let root = Path::new("/usr/share/fonts");
    subdirs.iter().map(|subdir| root.join(subdir)).collect()
}

/// Bundled font directories in lookup order, without duplicates.
fn bundled_dirs() -> Vec<PathBuf> {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("assets/fonts")));

    let mut dirs: Vec<PathBuf> = Vec::new();
    let ordered = non_empty_env_path("PHOTO_REPORT_FONTS_DIR")
        .into_iter()
        .chain(exe_dir)
        .chain(std::iter::once(bundled_fonts_source_dir()));
    for dir in ordered {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

fn holds_all(dir: &Path, faces: &FaceFiles) -> bool {
    faces.iter().all(|face| dir.join(face).is_file())
}

fn locate_font_source() -> Option<FontSource> {
    for dir in bundled_dirs() {
        if holds_all(&dir, &BUNDLED_FACES) {
            return Some(FontSource::Bundled(dir));
        }
        debug!("No complete Roboto family in {}", dir.display());
    }

    SYSTEM_FAMILIES.iter().find_map(|family| {
        (family.search_dirs)()
            .into_iter()
            .find(|dir| holds_all(dir, &family.faces))
            .map(|dir| FontSource::System(family, dir))
    })
}

fn load_face(dir: &Path, file: &str, face: &str) -> Result<FontData, Error> {
    let path = dir.join(file);
    FontData::load(&path, None).map_err(|err| {
        Error::new(
            format!("Failed to load {} face {}: {}", face, path.display(), err),
            io::Error::new(io::ErrorKind::InvalidData, err.to_string()),
        )
    })
}

fn load_system_family(family: &SystemFamily, dir: &Path) -> Result<FontFamily<FontData>, Error> {
    let [regular, bold, italic, bold_italic] = family.faces;
    let [regular_name, bold_name, italic_name, bold_italic_name] = FACE_NAMES;
    Ok(FontFamily {
        regular: load_face(dir, regular, regular_name)?,
        bold: load_face(dir, bold, bold_name)?,
        italic: load_face(dir, italic, italic_name)?,
        bold_italic: load_face(dir, bold_italic, bold_italic_name)?,
    })
}

/// Loads the Roboto family, or the first installed system family when the
/// bundled files cannot be found.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    match locate_font_source() {
        Some(FontSource::Bundled(dir)) => {
            debug!("Loading {} from {}", DEFAULT_FONT_FAMILY_NAME, dir.display());
            fonts::from_files(&dir, DEFAULT_FONT_FAMILY_NAME, None)
        }
        Some(FontSource::System(family, dir)) => {
            warn!(
                "{} fonts not found; using system '{}' family from {}",
                DEFAULT_FONT_FAMILY_NAME,
                family.name,
                dir.display()
            );
            load_system_family(family, &dir)
        }
        None => Err(Error::new(
            format!(
                "No font family found. Checked {} and the Arial, DejaVu Sans and Liberation Sans system locations. See assets/fonts/README.md or set PHOTO_REPORT_FONTS_DIR.",
                bundled_dirs()
                    .iter()
                    .map(|dir| dir.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            io::Error::new(io::ErrorKind::NotFound, "no usable fonts"),
        )),
    }
}

/// Indicates whether a font family can be loaded, bundled or from the system.
pub fn default_fonts_available() -> bool {
    locate_font_source().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_directories_are_not_usable() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(BUNDLED_FACES[0]), b"not a font").expect("write");
        assert!(!holds_all(dir.path(), &BUNDLED_FACES));
        assert!(!holds_all(Path::new("/__photo_report_missing_fonts__"), &BUNDLED_FACES));
    }

    #[test]
    fn bundled_directory_is_always_a_candidate() {
        let dirs = bundled_dirs();
        assert!(dirs.contains(&bundled_fonts_source_dir()));
        let unique: std::collections::HashSet<_> = dirs.iter().collect();
        assert_eq!(unique.len(), dirs.len());
    }
}
