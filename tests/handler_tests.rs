//! Integration tests for the token request handlers over a file-backed store.

#[cfg(test)]
mod handler_tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use token_lifecycle::{
        token_manager_config, DefaultTokenLifecycleManager, FileRecordStore, HandlerResponse,
        MockClock, MockPasswordHasher, RecordStore, TokenHandlers, UserAccount,
    };

    const NOW: u64 = 1_700_000_000_000;
    const PHONE: &str = "5551234567";

    type Handlers = TokenHandlers<DefaultTokenLifecycleManager<FileRecordStore>>;

    async fn setup() -> (TempDir, Arc<MockClock>, Handlers) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileRecordStore::new(dir.path()));

        let account = UserAccount::new(PHONE, MockPasswordHasher::digest_of("secret1"));
        store
            .create("users", PHONE, serde_json::to_value(&account).unwrap())
            .await
            .unwrap();

        let clock = Arc::new(MockClock::new(NOW));
        let manager = DefaultTokenLifecycleManager::new(
            token_manager_config().build().unwrap(),
            store,
            Arc::new(MockPasswordHasher::new()),
        )
        .with_clock(clock.clone());

        (dir, clock, TokenHandlers::new(Arc::new(manager)))
    }

    fn query(id: &str) -> HashMap<String, String> {
        HashMap::from([("id".to_string(), id.to_string())])
    }

    async fn issue(handlers: &Handlers) -> String {
        let response = handlers
            .post(&json!({"phone": PHONE, "password": "secret1"}))
            .await;
        assert_eq!(response.status, 200);
        response.body.unwrap()["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_full_lifecycle_over_files() {
        let (dir, clock, handlers) = setup().await;

        let id = issue(&handlers).await;
        assert!(dir.path().join("tokens").join(format!("{}.json", id)).exists());

        let response = handlers.get(&query(&id)).await;
        assert_eq!(
            response,
            HandlerResponse::ok(json!({"id": id, "phone": PHONE, "expires": NOW + 3_600_000}))
        );

        clock.advance(Duration::from_secs(10));
        let response = handlers.put(&json!({"id": id, "extend": true})).await;
        assert_eq!(response, HandlerResponse::empty());
        assert_eq!(
            handlers.get(&query(&id)).await.body.unwrap()["expires"],
            NOW + 10_000 + 3_600_000
        );

        assert!(handlers.verify(&id, PHONE).await);

        let response = handlers.delete(&json!({"id": id})).await;
        assert_eq!(response, HandlerResponse::empty());
        assert!(!dir.path().join("tokens").join(format!("{}.json", id)).exists());

        assert_eq!(handlers.get(&query(&id)).await.status, 404);
        assert!(!handlers.verify(&id, PHONE).await);
    }

    #[tokio::test]
    async fn test_post_failures() {
        let (_dir, _clock, handlers) = setup().await;

        let response = handlers
            .post(&json!({"phone": "555", "password": "secret1"}))
            .await;
        assert_eq!(
            response,
            HandlerResponse::error(400, "Missing required fields")
        );

        let response = handlers
            .post(&json!({"phone": "5550000000", "password": "secret1"}))
            .await;
        assert_eq!(
            response,
            HandlerResponse::error(400, "Could not find the specified user")
        );

        let response = handlers
            .post(&json!({"phone": PHONE, "password": "nope"}))
            .await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_get_rejects_malformed_id() {
        let (_dir, _clock, handlers) = setup().await;

        assert_eq!(handlers.get(&query("../users/555123456")).await.status, 400);
        assert_eq!(handlers.get(&query("short")).await.status, 400);
    }

    #[tokio::test]
    async fn test_put_expired_token() {
        let (_dir, clock, handlers) = setup().await;
        let id = issue(&handlers).await;

        clock.advance(Duration::from_secs(3600));
        let response = handlers.put(&json!({"id": id, "extend": true})).await;

        assert_eq!(
            response,
            HandlerResponse::error(400, "The token has already expired and can not be extended")
        );
    }

    #[tokio::test]
    async fn test_put_and_delete_unknown_token() {
        let (_dir, _clock, handlers) = setup().await;
        let unknown = "AAAAAAAAAAAAAAAAAAAA";

        let response = handlers.put(&json!({"id": unknown, "extend": true})).await;
        assert_eq!(
            response,
            HandlerResponse::error(400, "Specified token does not exist")
        );

        let response = handlers.delete(&json!({"id": unknown})).await;
        assert_eq!(
            response,
            HandlerResponse::error(400, "Could not find the specified token")
        );
    }

    #[tokio::test]
    async fn test_put_extend_false_is_rejected() {
        let (_dir, _clock, handlers) = setup().await;
        let id = issue(&handlers).await;

        let response = handlers.put(&json!({"id": id, "extend": false})).await;
        assert_eq!(response.status, 400);
    }
}
