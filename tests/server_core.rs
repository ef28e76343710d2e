use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

use stegano_web::codec::StegoError;
use stegano_web::common::config::StorageConfig;
use stegano_web::server::{ScratchDir, StegoCore};

fn png_carrier(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 42]));
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn scratch_in(dir: &tempfile::TempDir) -> ScratchDir {
    ScratchDir::new(&StorageConfig {
        upload_dir: Some(dir.path().join("uploads")),
        max_content_length: 1 << 20,
        buffer_size: 16,
    })
    .unwrap()
}

#[tokio::test]
async fn test_scratch_files_are_removed_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = scratch_in(&dir);

    let file = scratch.save_bytes("clip.mp4", b"0123456789").await.unwrap();
    let path = file.path().to_path_buf();
    assert!(path.starts_with(scratch.path()));
    assert!(path.to_string_lossy().ends_with("_clip.mp4"));
    assert_eq!(file.size(), 10);
    assert_eq!(std::fs::read(&path).unwrap(), b"0123456789");

    drop(file);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_chunked_upload_and_abandoned_upload() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = scratch_in(&dir);

    let mut upload = scratch.create("../evil name.wav").await.unwrap();
    for chunk in [&b"RIFF"[..], &b"\x00\x00\x00\x00"[..], &b"WAVE"[..]] {
        upload.write_chunk(chunk).await.unwrap();
    }
    let file = upload.finish().await.unwrap();
    assert_eq!(file.size(), 12);
    assert!(file.path().to_string_lossy().ends_with("_evil_name.wav"));
    assert_eq!(std::fs::read(file.path()).unwrap(), b"RIFF\0\0\0\0WAVE");

    // an upload dropped half way leaves nothing behind
    let mut partial = scratch.create("partial.mp3").await.unwrap();
    partial.write_chunk(b"ID3").await.unwrap();
    drop(partial);
    let remaining: Vec<_> = std::fs::read_dir(scratch.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn test_same_name_uploads_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = scratch_in(&dir);

    let a = scratch.save_bytes("cover.png", b"a").await.unwrap();
    let b = scratch.save_bytes("cover.png", b"b").await.unwrap();
    assert_ne!(a.path(), b.path());
    assert_eq!(std::fs::read(a.path()).unwrap(), b"a");
}

#[tokio::test]
async fn test_temporary_scratch_dir() {
    let scratch = ScratchDir::new(&StorageConfig::default()).unwrap();
    let root = scratch.path().to_path_buf();
    assert!(root.is_dir());
    drop(scratch);
    assert!(!root.exists());
}

#[tokio::test]
async fn test_core_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = scratch_in(&dir);
    let core = StegoCore::new(2);

    let image = scratch.save_bytes("cover.png", &png_carrier(100, 100)).await.unwrap();
    assert_eq!(core.capacity(image.path(), "png").await.unwrap(), 3750);

    let video = scratch.save_bytes("clip.mkv", &vec![0u8; 5000]).await.unwrap();
    assert_eq!(core.capacity(video.path(), "mkv").await.unwrap(), 2952);

    let broken = scratch.save_bytes("fake.bmp", b"BM but truncated").await.unwrap();
    assert_eq!(core.capacity(broken.path(), "bmp").await.unwrap(), 0);

    let missing = dir.path().join("gone.wav");
    assert_eq!(core.capacity(&missing, "wav").await.unwrap(), 0);
}

#[tokio::test]
async fn test_core_roundtrip_lsb_and_tail() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = scratch_in(&dir);
    let core = StegoCore::new(1);

    let payload = scratch.save_bytes("notes.txt", b"the eagle has landed").await.unwrap();

    let image = scratch.save_bytes("cover.jpg", &png_carrier(32, 32)).await.unwrap();
    let stego = core.encode(image.path(), payload.path(), "jpg").await.unwrap();
    let stego_file = scratch.save_bytes("cover.png", &stego).await.unwrap();
    let decoded = core.decode(stego_file.path(), "png").await.unwrap();
    assert_eq!(decoded.payload, b"the eagle has landed");
    assert_eq!(decoded.extension, ".txt");

    let audio = scratch.save_bytes("song.flac", b"fLaC\0\0\0\x22 frames").await.unwrap();
    let stego = core.encode(audio.path(), payload.path(), "flac").await.unwrap();
    let stego_file = scratch.save_bytes("song.flac", &stego).await.unwrap();
    let decoded = core.decode(stego_file.path(), "flac").await.unwrap();
    assert_eq!(decoded.payload, b"the eagle has landed");
}

#[tokio::test]
async fn test_core_surfaces_codec_errors() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = scratch_in(&dir);
    let core = StegoCore::new(1);

    let audio = scratch.save_bytes("plain.mp3", b"ID3 nothing hidden").await.unwrap();
    let err = core.decode(audio.path(), "mp3").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::MarkerNotFound)
    ));

    let tiny = scratch.save_bytes("tiny.png", &png_carrier(4, 4)).await.unwrap();
    let big = scratch.save_bytes("big.bin", &[1u8; 64]).await.unwrap();
    let err = core.encode(tiny.path(), big.path(), "png").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::InsufficientCapacity { .. })
    ));

    let missing = dir.path().join("missing.png");
    let err = core.decode(&missing, "png").await.unwrap_err();
    assert!(err.downcast_ref::<StegoError>().is_none());
}

#[tokio::test]
async fn test_pool_runs_concurrent_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Arc::new(scratch_in(&dir));
    let core = StegoCore::new(2);

    let carrier = scratch.save_bytes("cover.png", &png_carrier(64, 64)).await.unwrap();
    let carrier_path = carrier.path().to_path_buf();

    let mut handles = Vec::new();
    for i in 0..8u8 {
        let core = core.clone();
        let scratch = scratch.clone();
        let carrier_path = carrier_path.clone();
        handles.push(tokio::spawn(async move {
            let payload = scratch.save_bytes("p.bin", &[i + 1; 100]).await.unwrap();
            let stego = core.encode(&carrier_path, payload.path(), "png").await.unwrap();
            let stego_file = scratch.save_bytes("s.png", &stego).await.unwrap();
            core.decode(stego_file.path(), "png").await.unwrap().payload
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), vec![i as u8 + 1; 100]);
    }
}
