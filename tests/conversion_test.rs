//! 转换函数集成测试：Blob / 二进制字符串 / base64 / Data URL / 字节缓冲。

use std::sync::Arc;

use blob_util::codec::{Base64Codec, StandardBase64};
use blob_util::provider::{
    AppendBlobBuilderFactory, AsyncByteReader, BlobConstructor, BlobProvider, BlobProviders,
    ConstructError, MemoryUrlRegistry, ObjectUrlRegistry, ReadError, UrlRegistries,
};
use blob_util::{
    Blob, BlobError, BlobOptions, BlobPart, BlobUtil, array_buffer_to_binary_string,
    binary_string_to_array_buffer,
};
use bytes::Bytes;
use proptest::prelude::*;

const TRANSPARENT_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR4nGP6zwAAAgcBApocMXEAAAAASUVORK5CYII=";
const BLACK_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAAAAAA6fptVAAAACklEQVR4nGNiAAAABgADNjd8qAAAAABJRU5ErkJggg==";

fn util() -> BlobUtil {
    BlobUtil::new().expect("default util must build")
}

struct NullReader;

impl AsyncByteReader for NullReader {
    async fn read_as_array_buffer(&self, _blob: &Blob) -> Result<Option<Bytes>, ReadError> {
        Ok(None)
    }
}

struct FailingReader;

impl AsyncByteReader for FailingReader {
    fn supports_binary_string(&self) -> bool {
        true
    }

    async fn read_as_binary_string(&self, _blob: &Blob) -> Result<Option<String>, ReadError> {
        Err(ReadError("磁盘读取失败".to_string()))
    }

    async fn read_as_array_buffer(&self, _blob: &Blob) -> Result<Option<Bytes>, ReadError> {
        Err(ReadError("磁盘读取失败".to_string()))
    }
}

struct MissingConstructor;

impl BlobConstructor for MissingConstructor {
    fn name(&self) -> &'static str {
        "missing"
    }

    fn construct(&self, _parts: &[BlobPart], _options: &BlobOptions) -> Result<Blob, ConstructError> {
        Err(ConstructError::Unsupported("没有原生 Blob".to_string()))
    }
}

struct BrokenConstructor;

impl BlobConstructor for BrokenConstructor {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn construct(&self, _parts: &[BlobPart], _options: &BlobOptions) -> Result<Blob, ConstructError> {
        Err(ConstructError::Failed("内存不足".to_string()))
    }
}

#[tokio::test]
async fn plain_blob_has_type_and_base64() {
    let util = util();
    let blob = util.create_blob(&["foo".into()], "text/plain").expect("create failed");

    assert_eq!(blob.media_type(), "text/plain");
    assert_eq!(util.blob_to_base64_string(&blob).await.expect("encode failed"), "Zm9v");
}

#[tokio::test]
async fn data_url_to_blob_then_base64() {
    let util = util();
    let blob = util.data_url_to_blob("data:text/plain;base64,Zm9v").expect("convert failed");

    assert_eq!(blob.media_type(), "text/plain");
    assert_eq!(util.blob_to_base64_string(&blob).await.expect("encode failed"), "Zm9v");
}

#[tokio::test]
async fn blob_to_data_url_is_exact() {
    let util = util();
    let blob = util.create_blob(&["foo".into()], "text/plain").expect("create failed");

    assert_eq!(
        util.blob_to_data_url(&blob).await.expect("convert failed"),
        "data:text/plain;base64,Zm9v"
    );
}

#[tokio::test]
async fn transparent_png_round_trips_through_base64() {
    let util = util();
    let blob = util
        .base64_string_to_blob(TRANSPARENT_PNG, Some("image/png"))
        .expect("convert failed");

    assert_eq!(blob.size(), 68);
    assert_eq!(blob.media_type(), "image/png");
    assert_eq!(util.blob_to_base64_string(&blob).await.expect("encode failed"), TRANSPARENT_PNG);
}

#[tokio::test]
async fn binary_string_and_array_buffer_paths_agree() {
    let util = util();
    let bytes = StandardBase64.decode(BLACK_PNG).expect("valid base64");
    let binary = array_buffer_to_binary_string(&bytes);

    let from_binary = util.binary_string_to_blob(&binary, Some("image/png")).expect("convert failed");
    let from_buffer = util.array_buffer_to_blob(bytes.clone(), Some("image/png")).expect("convert failed");

    assert_eq!(util.blob_to_base64_string(&from_binary).await.expect("encode failed"), BLACK_PNG);
    assert_eq!(util.blob_to_base64_string(&from_buffer).await.expect("encode failed"), BLACK_PNG);
    assert_eq!(&util.blob_to_array_buffer(&from_buffer).await.expect("read failed")[..], &bytes[..]);
}

#[test]
fn malformed_data_urls_are_match_errors() {
    let util = util();

    for input in ["text/plain;base64,Zm9v", "data:text/plain,Zm9v", "", "Zm9v"] {
        let result = util.data_url_to_blob(input);
        assert!(
            matches!(result, Err(BlobError::DataUrlMismatch(_))),
            "{:?} should be a mismatch, got {:?}",
            input,
            result
        );
    }
}

#[test]
fn invalid_base64_payload_fails() {
    let result = util().data_url_to_blob("data:text/plain;base64,@@@@");
    assert!(matches!(result, Err(BlobError::Base64(_))));
}

#[test]
fn base64_decoding_is_forgiving() {
    let blob = util().base64_string_to_blob(" Zm9v\nYg ", None).expect("convert failed");
    assert_eq!(&blob.bytes()[..], b"foob");
}

#[tokio::test]
async fn null_read_gives_empty_results() {
    let util = util().with_reader(NullReader);
    let blob = Blob::new(&b"ignored"[..], "text/plain");

    assert_eq!(util.blob_to_binary_string(&blob).await.expect("read failed"), "");
    assert!(util.blob_to_array_buffer(&blob).await.expect("read failed").is_empty());
    assert_eq!(
        util.blob_to_data_url(&blob).await.expect("convert failed"),
        "data:text/plain;base64,"
    );
}

#[tokio::test]
async fn read_errors_propagate_unchanged() {
    let util = util().with_reader(FailingReader);
    let blob = Blob::new(&b"foo"[..], "text/plain");

    match util.blob_to_base64_string(&blob).await {
        Err(BlobError::Read(err)) => assert_eq!(err, ReadError("磁盘读取失败".to_string())),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(util.blob_to_array_buffer(&blob).await, Err(BlobError::Read(_))));
}

#[test]
fn create_blob_falls_back_to_builder() {
    let providers = BlobProviders::new(vec![
        BlobProvider::Native(Arc::new(MissingConstructor)),
        BlobProvider::Builder(Arc::new(AppendBlobBuilderFactory)),
    ]);
    let util = util().with_blob_providers(providers);

    let blob = util
        .create_blob(&["fo".into(), BlobPart::from(vec![b'o'])], "text/plain")
        .expect("fallback failed");

    assert_eq!(&blob.bytes()[..], b"foo");
    assert_eq!(blob.media_type(), "text/plain");
}

#[test]
fn create_blob_reraises_other_native_errors() {
    let providers = BlobProviders::new(vec![
        BlobProvider::Native(Arc::new(BrokenConstructor)),
        BlobProvider::Builder(Arc::new(AppendBlobBuilderFactory)),
    ]);
    let util = util().with_blob_providers(providers);

    assert!(matches!(
        util.create_blob(&["foo".into()], "text/plain"),
        Err(BlobError::Construction(_))
    ));
}

#[test]
fn create_blob_without_providers_is_unsupported() {
    let util = util().with_blob_providers(BlobProviders::new(Vec::new()));
    let err = util.create_blob(&["foo".into()], BlobOptions::default()).expect_err("must fail");

    assert_eq!(err.to_string(), "Blob unsupported");
}

#[test]
fn object_url_without_registry_is_unsupported() {
    let util = util()
        .with_url_registries(UrlRegistries::new(Vec::new()))
        .expect("swap registries failed");
    let blob = Blob::new(&b"foo"[..], "text/plain");

    let err = util.create_object_url(&blob).expect_err("must fail");
    assert_eq!(err.to_string(), "URL unsupported");
}

#[test]
fn object_urls_resolve_until_revoked() {
    let registry = Arc::new(MemoryUrlRegistry::new("https://app.example"));
    let shared: Arc<dyn ObjectUrlRegistry> = registry.clone();
    let util = util()
        .with_url_registries(UrlRegistries::new(vec![shared]))
        .expect("swap registries failed");
    let blob = Blob::new(&b"foo"[..], "text/plain");

    let url = util.create_object_url(&blob).expect("create url failed");
    assert!(url.starts_with("blob:https://app.example/"));
    assert_eq!(registry.resolve_object_url(&url).map(|b| b.size()), Some(3));

    util.revoke_object_url(&url).expect("revoke failed");
    assert!(registry.resolve_object_url(&url).is_none());
    util.revoke_object_url(&url).expect("second revoke is a no-op");
}

proptest! {
    #[test]
    fn binary_string_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let binary: String = bytes.iter().map(|&b| char::from(b)).collect();
        let buffer = binary_string_to_array_buffer(&binary);

        prop_assert_eq!(&buffer[..], &bytes[..]);
        prop_assert_eq!(array_buffer_to_binary_string(&buffer), binary);
    }

    #[test]
    fn blob_base64_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let util = util();
        let blob = Blob::new(bytes.clone(), "application/octet-stream");

        let base64 = runtime.block_on(util.blob_to_base64_string(&blob)).expect("encode failed");
        let back = util.base64_string_to_blob(&base64, Some(blob.media_type())).expect("decode failed");

        prop_assert_eq!(&back.bytes()[..], &bytes[..]);
        prop_assert_eq!(back.media_type(), "application/octet-stream");
    }
}
