use novella_api::{
    handlers::uploads::object_key,
    models::UploadPurpose,
    storage::{MockStorageService, S3StorageClient, StorageService, sanitize_key},
};

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let key = "avatar/1_cover.png";
        let url = mock
            .get_presigned_upload_url(key, "image/png", 1024)
            .await
            .unwrap();

        assert!(url.contains("signature=fake"));
        assert!(url.contains(key));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock.get_presigned_upload_url("avatar/x.png", "image/png", 1024).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();
        let url = mock
            .get_presigned_upload_url("../../etc/passwd", "image/png", 1024)
            .await
            .unwrap();

        assert!(!url.contains(".."));
        assert!(url.contains("etc/passwd"));
    }
}

#[cfg(test)]
mod key_tests {
    use super::*;

    #[test]
    fn test_sanitize_key_drops_navigation_segments() {
        assert_eq!(sanitize_key("/avatar/./../x.png"), "avatar/x.png");
        assert_eq!(sanitize_key("avatar//x.png"), "avatar/x.png");
        assert_eq!(sanitize_key(".."), "");
    }

    #[test]
    fn test_object_key_layout() {
        let key = object_key(UploadPurpose::BookImage, "My Cover.JPG", "jpeg");

        let (folder, file) = key.split_once('/').unwrap();
        assert_eq!(folder, "bookImage");
        let (timestamp, rest) = file.split_once('_').unwrap();
        assert!(timestamp.parse::<i64>().is_ok());
        assert!(rest.ends_with(".jpg"));
    }

    #[test]
    fn test_object_key_falls_back_to_mime_subtype() {
        let key = object_key(UploadPurpose::Avatar, "no-extension", "svg+xml");
        assert!(key.starts_with("avatar/"));
        assert!(key.ends_with(".svg"));

        let weird = object_key(UploadPurpose::Avatar, "evil.p/hp", "png");
        assert!(weird.ends_with(".png"));
        assert_eq!(weird.matches('/').count(), 1);
    }

    #[test]
    fn test_object_keys_are_unique() {
        let a = object_key(UploadPurpose::Avatar, "a.png", "png");
        let b = object_key(UploadPurpose::Avatar, "a.png", "png");
        assert_ne!(a, b);
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_public_url_with_endpoint_override() {
        let client = S3StorageClient::new(
            Some("http://localhost:9000/"),
            "us-east-1",
            "key",
            "secret",
            "novella-uploads",
        );

        assert_eq!(
            client.public_url("avatar/1_x.png"),
            "http://localhost:9000/novella-uploads/avatar/1_x.png"
        );
    }

    #[tokio::test]
    async fn test_public_url_on_aws() {
        let client = S3StorageClient::new(None, "eu-west-1", "key", "secret", "novella-prod");

        assert_eq!(
            client.public_url("bookImage/../1_x.png"),
            "https://novella-prod.s3.eu-west-1.amazonaws.com/bookImage/1_x.png"
        );
    }

    #[tokio::test]
    async fn test_presign_is_generated_offline() {
        let client = S3StorageClient::new(
            Some("http://localhost:9000"),
            "us-east-1",
            "key",
            "secret",
            "novella-uploads",
        );

        let url = client
            .get_presigned_upload_url("avatar/1_x.png", "image/png", 1024)
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/novella-uploads/avatar/1_x.png?"));
        assert!(url.contains("X-Amz-Signature"));
    }
}
