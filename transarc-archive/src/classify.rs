//! Asset type classification from archive-relative paths.
//!
//! Rules are checked in order and the first whose folder name occurs in the
//! path wins. The matched folder segment (`name/` or `name\`) is removed
//! from the path, and that trimmed path is what gets stored in the header.

use transarc_core::AssetType;

/// Default extension (without the dot) marking compiled shader bytecode.
pub const SHADER_BYTECODE_EXTENSION: &str = "sb";

const RULES: [(&str, AssetType); 7] = [
    ("textures", AssetType::Texture),
    ("meshes", AssetType::Mesh),
    ("materials", AssetType::Material),
    ("shaders", AssetType::ShaderSource),
    ("fonts", AssetType::Font),
    ("sounds", AssetType::Sound),
    ("scripts", AssetType::Script),
];

/// Classify `path` and strip the matched folder segment.
///
/// Files under `shaders` are [`AssetType::ShaderBytecode`] when their
/// extension equals `bytecode_extension`, [`AssetType::ShaderSource`]
/// otherwise. Paths matching nothing are [`AssetType::Binary`] and are
/// returned unchanged.
///
/// ```rust
/// use transarc_archive::classify::{classify, SHADER_BYTECODE_EXTENSION};
/// use transarc_core::AssetType;
///
/// let (ty, trimmed) = classify("meshes/chair.obj", SHADER_BYTECODE_EXTENSION);
/// assert_eq!(ty, AssetType::Mesh);
/// assert_eq!(trimmed, "chair.obj");
/// ```
pub fn classify(path: &str, bytecode_extension: &str) -> (AssetType, String) {
    for (folder, ty) in RULES {
        if !path.contains(folder) {
            continue;
        }
        let ty = if ty == AssetType::ShaderSource && has_extension(path, bytecode_extension) {
            AssetType::ShaderBytecode
        } else {
            ty
        };
        return (ty, strip_folder(path, folder));
    }
    (AssetType::Binary, path.to_owned())
}

fn strip_folder(path: &str, folder: &str) -> String {
    path.replace(&format!("{folder}/"), "")
        .replace(&format!("{folder}\\"), "")
}

fn has_extension(path: &str, extension: &str) -> bool {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && ext == extension,
        None => false,
    }
}
