//! Error path tests for ferrozst-compression

use crate::facade::{Codec, CompressOptions, DecompressOptions, Input};
use crate::test_support::InstrumentedEngine;
use bytes::Bytes;
use ferrozst_types::{Error, ErrorKind};
use futures::stream;
use std::io;
use std::sync::Arc;

fn codec() -> (Arc<InstrumentedEngine>, Codec) {
    let instrumented = Arc::new(InstrumentedEngine::new());
    let codec = Codec::with_engine(instrumented.clone());
    (instrumented, codec)
}

/// Random bytes are not a frame
#[tokio::test]
async fn test_invalid_compressed_data() {
    let (instrumented, codec) = codec();

    let err = codec
        .decompress(vec![0xFF; 100], DecompressOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Codec { .. }));
    assert_eq!(instrumented.live_handles(), 0);
}

/// A damaged magic number is reported with the engine's error name
#[tokio::test]
async fn test_corrupted_frame_header() {
    let (_instrumented, codec) = codec();
    let mut frame = codec
        .compress("Hello, world! This is test data.", CompressOptions::default())
        .await
        .unwrap();
    frame[0] = frame[0].wrapping_add(1);

    let err = codec
        .decompress(frame, DecompressOptions::default())
        .await
        .unwrap_err();
    let Error::Codec { code, name } = err else {
        panic!("expected codec error, got {:?}", err);
    };
    assert_ne!(code, 0);
    assert!(!name.is_empty());
}

/// Input that ends mid-frame is a codec error, never a silent prefix
#[tokio::test]
async fn test_truncated_frame_is_codec_error() {
    let (instrumented, codec) = codec();
    let frame = codec
        .compress(vec![b'q'; 300_000], CompressOptions::default())
        .await
        .unwrap();
    let cut = frame[..frame.len() - 4].to_vec();

    let err = codec
        .decompress(cut.clone(), DecompressOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert!(err.to_string().contains("truncated frame"));
    assert_eq!(instrumented.live_handles(), 0);

    let chunks: Vec<io::Result<Bytes>> = cut
        .chunks(1000)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    let err = codec
        .decompress(Input::stream(stream::iter(chunks)), DecompressOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert_eq!(instrumented.live_handles(), 0);
}

/// A complete frame followed by a cut second frame is still rejected
#[tokio::test]
async fn test_truncated_trailing_frame_is_codec_error() {
    let (_instrumented, codec) = codec();
    let mut frames = codec
        .compress("first frame", CompressOptions::default())
        .await
        .unwrap();
    let second = codec
        .compress("second frame", CompressOptions::default())
        .await
        .unwrap();
    frames.extend_from_slice(&second[..second.len() / 2]);

    let err = codec
        .decompress(frames, DecompressOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Codec { .. }));
}

/// A stall in the middle of a stream closes the stream with the stall
#[tokio::test]
async fn test_stall_in_stream_is_reported() {
    let (instrumented, codec) = codec();
    instrumented.script_steps([0]);
    let upstream = stream::iter(vec![Ok(Bytes::from_static(b"not really a frame"))]);

    let err = codec
        .decompress(Input::stream(upstream), DecompressOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Stall);
    assert!(err.to_string().contains("offset 0"));
    assert_eq!(instrumented.live_handles(), 0);
}

/// Context creation failure surfaces as an initialization error
#[tokio::test]
async fn test_context_creation_failure() {
    let (instrumented, codec) = codec();
    instrumented.fail_context_creation();

    let err = codec
        .compress("data", CompressOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Initialization);
    assert_eq!(instrumented.live_handles(), 0);
}

/// Allocation failure in a stream releases the context
#[tokio::test]
async fn test_allocation_failure_in_stream() {
    let (instrumented, codec) = codec();
    instrumented.fail_allocations();
    let upstream = stream::iter(vec![Ok(Bytes::from_static(b"payload"))]);

    let err = codec
        .compress(Input::stream(upstream), CompressOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Allocation);
    assert_eq!(instrumented.live_handles(), 0);
}

/// Upstream I/O errors keep their message
#[tokio::test]
async fn test_upstream_error_message() {
    let (_instrumented, codec) = codec();
    let upstream = stream::iter(vec![Err(io::Error::new(
        io::ErrorKind::PermissionDenied,
        "cannot read source",
    ))]);

    let err = codec
        .compress(Input::stream(upstream), CompressOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("cannot read source"));
}
