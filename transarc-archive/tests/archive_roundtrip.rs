use std::fs;
use std::io::Read;
use std::path::Path;
use transarc_archive::{AssetArchive, AssetSource, PackOptions, create_from, create_from_assets, generate_from};
use transarc_core::{ArchiveError, AssetType, Compression, CompressionLevel};

fn write(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A small game-like asset tree; returns (relative path, contents).
fn populate(root: &Path) -> Vec<(&'static str, Vec<u8>)> {
    let files: Vec<(&'static str, Vec<u8>)> = vec![
        ("textures/rock.png", b"\x89PNG rock pixels ".repeat(200)),
        ("meshes/chair.obj", b"v 0 0 0\nv 1 0 0\nf 1 2 3\n".repeat(40)),
        ("materials/wood.matlib", b"albedo=wood".to_vec()),
        ("shaders/forward.hlsl", b"float4 main() : SV_Target { return 1; }".to_vec()),
        ("shaders/forward.sb", vec![0xDE, 0xAD, 0xBE, 0xEF, 0, 1, 2, 3]),
        ("fonts/ui.ttf", (0..=255u8).collect()),
        ("sounds/step.wav", b"RIFF".repeat(64)),
        ("scripts/player.lua", b"print('hi')".to_vec()),
        ("data/level1.bin", Vec::new()),
    ];
    for (rel, data) in &files {
        write(&root.join(rel), data);
    }
    write(&root.join("old.assets"), b"stale archive");
    write(&root.join("plugin.dll"), b"MZ");
    files
}

#[test]
fn test_pack_open_extract_is_idempotent() {
    let src = tempfile::tempdir().unwrap();
    let files = populate(src.path());
    let out = tempfile::tempdir().unwrap();
    let archive_path = out.path().join("data.assets");

    let options = PackOptions::new(Compression::Deflate, CompressionLevel::Optimal);
    let header = create_from(src.path(), &archive_path, &options).unwrap();
    assert_eq!(header.entries.len(), files.len());

    let archive = AssetArchive::open(&archive_path).unwrap();
    assert_eq!(archive.compression(), Compression::Deflate);
    assert_eq!(archive.len(), files.len());

    let extracted = out.path().join("extracted");
    assert_eq!(archive.extract(&extracted).unwrap(), files.len());

    for (rel, data) in &files {
        let (_, trimmed) = transarc_archive::classify(rel, "sb");
        let asset = archive.find(&trimmed).unwrap();
        assert_eq!(asset.entry().actual_length, data.len() as u64, "{rel}");
        assert_eq!(&asset.data().unwrap(), data, "{rel}");
        assert_eq!(&fs::read(extracted.join(&trimmed)).unwrap(), data, "{rel}");
    }
    assert!(archive.get("old.assets").is_none());
    assert!(archive.get("plugin.dll").is_none());
}

#[test]
fn test_classification_is_stored_in_header() {
    let src = tempfile::tempdir().unwrap();
    populate(src.path());
    let out = tempfile::tempdir().unwrap();
    let archive_path = out.path().join("typed.assets");
    create_from(src.path(), &archive_path, &PackOptions::default()).unwrap();

    let archive = AssetArchive::open(&archive_path).unwrap();
    let expect = [
        ("rock.png", AssetType::Texture),
        ("chair.obj", AssetType::Mesh),
        ("wood.matlib", AssetType::Material),
        ("forward.hlsl", AssetType::ShaderSource),
        ("forward.sb", AssetType::ShaderBytecode),
        ("ui.ttf", AssetType::Font),
        ("step.wav", AssetType::Sound),
        ("player.lua", AssetType::Script),
        ("data/level1.bin", AssetType::Binary),
    ];
    for (path, ty) in expect {
        assert_eq!(archive.find(path).unwrap().entry().asset_type, ty, "{path}");
    }
}

#[test]
fn test_every_kind_roundtrips() {
    let src = tempfile::tempdir().unwrap();
    let files = populate(src.path());
    let out = tempfile::tempdir().unwrap();

    for (kind, level) in [
        (Compression::None, CompressionLevel::NoCompression),
        (Compression::Deflate, CompressionLevel::Fastest),
        (Compression::Deflate, CompressionLevel::SmallestSize),
        (Compression::FastBlock, CompressionLevel::Default),
        (Compression::FastBlock, CompressionLevel::Optimal),
        (Compression::FastBlock, CompressionLevel::SmallestSize),
    ] {
        let archive_path = out.path().join(format!("{kind}-{level}.assets"));
        create_from(src.path(), &archive_path, &PackOptions::new(kind, level)).unwrap();
        let archive = AssetArchive::open(&archive_path).unwrap();

        let total: usize = archive
            .assets()
            .iter()
            .map(|a| a.data().unwrap().len())
            .sum();
        assert_eq!(total, files.iter().map(|(_, d)| d.len()).sum::<usize>());

        if kind.is_stored() {
            for asset in archive.assets() {
                assert_eq!(asset.entry().length, asset.entry().actual_length);
            }
        }
    }
}

#[test]
fn test_no_compression_level_is_rejected_before_writing() {
    let src = tempfile::tempdir().unwrap();
    populate(src.path());
    let out = tempfile::tempdir().unwrap();
    let archive_path = out.path().join("never.assets");

    let options = PackOptions::new(Compression::Deflate, CompressionLevel::NoCompression);
    let err = create_from(src.path(), &archive_path, &options).unwrap_err();
    assert!(matches!(err, ArchiveError::UnsupportedLevel { .. }));
    assert!(err.is_unsupported());
    assert!(!archive_path.exists());
}

#[test]
fn test_explicit_assets_keep_path_and_type() {
    let src = tempfile::tempdir().unwrap();
    let on_disk = src.path().join("raw.bin");
    fs::write(&on_disk, b"from disk").unwrap();
    let out = tempfile::tempdir().unwrap();
    let archive_path = out.path().join("explicit.assets");

    let sources = vec![
        AssetSource::from_file("textures/raw.bin", AssetType::Sound, &on_disk),
        AssetSource::from_bytes("memory\\blob", AssetType::Unknown(77), b"in memory".to_vec()),
    ];
    let options = PackOptions::new(Compression::FastBlock, CompressionLevel::Fastest);
    create_from_assets(&sources, &archive_path, &options).unwrap();

    let archive = AssetArchive::open(&archive_path).unwrap();
    let first = archive.find("textures/raw.bin").unwrap();
    assert_eq!(first.entry().asset_type, AssetType::Sound);
    assert_eq!(first.data().unwrap(), b"from disk");
    let second = archive.find("memory/blob").unwrap();
    assert_eq!(second.entry().asset_type, AssetType::Unknown(77));
    assert_eq!(second.path(), "memory\\blob");
}

#[test]
fn test_save_recompresses() {
    let src = tempfile::tempdir().unwrap();
    let files = populate(src.path());
    let out = tempfile::tempdir().unwrap();
    let stored = out.path().join("stored.assets");
    let packed = out.path().join("packed.assets");

    create_from(src.path(), &stored, &PackOptions::default()).unwrap();
    let archive = AssetArchive::open(&stored).unwrap();
    archive
        .save(&packed, Compression::Deflate, CompressionLevel::SmallestSize)
        .unwrap();
    assert!(matches!(
        archive.save(&stored, Compression::None, CompressionLevel::Default),
        Err(ArchiveError::Unsupported { .. })
    ));

    let repacked = AssetArchive::open(&packed).unwrap();
    assert_eq!(repacked.compression(), Compression::Deflate);
    assert!(fs::metadata(&packed).unwrap().len() < fs::metadata(&stored).unwrap().len());
    for (old, new) in archive.assets().iter().zip(repacked.assets()) {
        assert_eq!(old.path(), new.path());
        assert_eq!(old.entry().asset_type, new.entry().asset_type);
        assert_eq!(old.data().unwrap(), new.data().unwrap());
    }
    assert_eq!(repacked.len(), files.len());
}

#[test]
fn test_generate_from_subdirectories() {
    let root = tempfile::tempdir().unwrap();
    write(&root.path().join("core/textures/a.png"), b"a");
    write(&root.path().join("core/shaders/b.hlsl"), b"b");
    write(&root.path().join("editor/fonts/c.ttf"), b"c");

    let written = generate_from(root.path(), &PackOptions::default(), true).unwrap();
    assert_eq!(
        written,
        [root.path().join("core.assets"), root.path().join("editor.assets")]
    );
    assert!(!root.path().join("core").exists());
    assert!(!root.path().join("editor").exists());

    let core = AssetArchive::open(root.path().join("core.assets")).unwrap();
    assert_eq!(core.find("a.png").unwrap().data().unwrap(), b"a");
    assert_eq!(core.find("b.hlsl").unwrap().entry().asset_type, AssetType::ShaderSource);
    let editor = AssetArchive::open(root.path().join("editor.assets")).unwrap();
    assert_eq!(editor.find("c.ttf").unwrap().entry().asset_type, AssetType::Font);
}

#[test]
fn test_format_errors_fail_open() {
    let dir = tempfile::tempdir().unwrap();

    let missing = AssetArchive::open(dir.path().join("missing.assets")).unwrap_err();
    assert!(matches!(missing, ArchiveError::Io(_)));

    let not_archive = dir.path().join("zip.assets");
    let mut bytes = 20i32.to_le_bytes().to_vec();
    bytes.extend_from_slice(b"PK\x03\x04 not an archive");
    fs::write(&not_archive, &bytes).unwrap();
    let err = AssetArchive::open(&not_archive).unwrap_err();
    assert!(matches!(err, ArchiveError::InvalidMagic { .. }));

    let good = dir.path().join("good.assets");
    let sources = vec![AssetSource::from_bytes("x", AssetType::Binary, b"x".to_vec())];
    create_from_assets(&sources, &good, &PackOptions::default()).unwrap();
    let mut bytes = fs::read(&good).unwrap();
    bytes[4 + 13] = 11;
    let wrong_version = dir.path().join("v11.assets");
    fs::write(&wrong_version, &bytes).unwrap();
    assert!(matches!(
        AssetArchive::open(&wrong_version).unwrap_err(),
        ArchiveError::UnsupportedVersion { found: 11, .. }
    ));

    let truncated = dir.path().join("short.assets");
    fs::write(&truncated, &fs::read(&good).unwrap()[..12]).unwrap();
    assert!(AssetArchive::open(&truncated).is_err());
}

#[test]
fn test_sibling_streams_share_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pair.assets");
    let sources = vec![
        AssetSource::from_bytes("a", AssetType::Binary, b"AAAAAAAAAA".to_vec()),
        AssetSource::from_bytes("b", AssetType::Binary, b"BBBBBBBBBB".to_vec()),
    ];
    create_from_assets(&sources, &path, &PackOptions::default()).unwrap();
    let archive = AssetArchive::open(&path).unwrap();

    let mut a = archive.open_asset("a").unwrap();
    let mut b = archive.open_asset("b").unwrap();
    let mut buf_a = [0u8; 4];
    let mut buf_b = [0u8; 4];
    // Interleaved reads on one thread: each read re-seeks the shared handle.
    a.read_exact(&mut buf_a).unwrap();
    b.read_exact(&mut buf_b).unwrap();
    assert_eq!(&buf_a, b"AAAA");
    assert_eq!(&buf_b, b"BBBB");

    let mut rest = Vec::new();
    a.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"AAAAAA");
    drop(a);
    // Dropping one stream leaves the others usable.
    let mut rest = Vec::new();
    b.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"BBBBBB");
}
