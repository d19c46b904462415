//! Network source integration tests
//!
//! Serves files from a wiremock server and uploads them through the facade
//! into a temporary local drive.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use upstow::drives::LocalDrive;
    use upstow::source::{FetchOptions, NetworkFetcher, SourceError};
    use upstow::storage::{ObjectStorage, StorageOptions, UploadError};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

    async fn local_storage(dir: &TempDir, options: StorageOptions) -> ObjectStorage {
        let drive = LocalDrive::new(dir.path()).await.unwrap();
        ObjectStorage::new(Arc::new(drive), options).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sniffs_png() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logo"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = NetworkFetcher::new(FetchOptions::default()).unwrap();
        let descriptor = fetcher
            .fetch(&format!("{}/logo", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(descriptor.extension(), "png");
        assert_eq!(descriptor.length(), PNG.len() as u64);
        assert_eq!(descriptor.content().unwrap().as_ref(), PNG);
    }

    #[tokio::test]
    async fn test_descriptor_from_network() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/readme"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain words"))
            .mount(&mock_server)
            .await;

        let descriptor =
            upstow::SourceDescriptor::from_network(&format!("{}/readme", mock_server.uri()))
                .await
                .unwrap();

        assert_eq!(descriptor.length(), 11);
        assert_eq!(descriptor.extension(), "");
    }

    #[tokio::test]
    async fn test_put_net_file_auto_path() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images/logo"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG))
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let storage = local_storage(
            &dir,
            StorageOptions {
                auto_generate_path: true,
                path_prefix: "img/".into(),
                base_url: "https://cdn.example.com/".into(),
                ..Default::default()
            },
        )
        .await;

        let result = storage
            .put_net_file(&format!("{}/images/logo", mock_server.uri()))
            .await
            .unwrap();

        let re = regex_lite::Regex::new(r"^img/\d{4}/\d{2}/\d{2}/[0-9a-f-]{36}\.png$").unwrap();
        assert!(re.is_match(&result.key), "unexpected key {}", result.key);
        assert_eq!(result.url, format!("https://cdn.example.com/{}", result.key));
        assert_eq!(result.extension, "png");

        let stored = std::fs::read(dir.path().join(&result.key)).unwrap();
        assert_eq!(stored, PNG);
    }

    #[tokio::test]
    async fn test_put_net_file_not_found_is_recoverable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let storage = local_storage(&dir, StorageOptions::default()).await;

        let err = storage
            .with_path_key("never-written")
            .put_net_file(&format!("{}/gone", mock_server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::Source(SourceError::FetchStatus { status: 404, .. })
        ));
        assert!(!dir.path().join("never-written").exists());
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(PNG)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = NetworkFetcher::new(FetchOptions {
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        })
        .unwrap();

        let err = fetcher
            .fetch(&format!("{}/slow", mock_server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_per_call_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(PNG)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let storage = local_storage(&dir, StorageOptions::default()).await;

        let err = storage
            .upload()
            .path_key("slow.png")
            .timeout(Duration::from_millis(100))
            .put_net_file(&format!("{}/slow", mock_server.uri()))
            .await
            .unwrap_err();

        // The fetch never finished, so no key was computed
        assert!(matches!(err, UploadError::TimedOut { result: None, .. }));
        assert!(err.result().is_none());
    }
}
