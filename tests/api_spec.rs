use axum::http::StatusCode;
use axum_test::TestServer;
use reservoir::api::{create_router, AuthStatus, FeedView, RenderedThought, VerifyInput};
use reservoir::models::*;
use reservoir::store::Store;
use serde_json::json;
use uuid::Uuid;

fn setup() -> TestServer {
    let store = Store::open_memory("hushhush").expect("Failed to open store");
    TestServer::new(create_router(store)).expect("Failed to create test server")
}

async fn sign_in(server: &TestServer) {
    server
        .post("/api/v1/auth/verify")
        .json(&VerifyInput {
            secret: "hushhush".to_string(),
        })
        .await
        .assert_status_ok();
}

async fn create_thought(server: &TestServer, content: &str, category: Category) -> Thought {
    server
        .post("/api/v1/thoughts")
        .json(&CreateThoughtInput {
            content: content.to_string(),
            category,
            images: Vec::new(),
        })
        .await
        .json::<Thought>()
}

mod access_gate {
    use super::*;

    #[tokio::test]
    async fn authoring_is_forbidden_without_the_capability() {
        let server = setup();

        let response = server
            .post("/api/v1/thoughts")
            .json(&json!({ "content": "nope", "category": "Poetic" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&format!("/api/v1/thoughts/{}", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .post("/api/v1/thoughts/restore")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected_and_grants_nothing() {
        let server = setup();

        server
            .post("/api/v1/auth/verify")
            .json(&VerifyInput {
                secret: "letmein".to_string(),
            })
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let status: AuthStatus = server.get("/api/v1/auth").await.json();
        assert!(!status.owner);
    }

    #[tokio::test]
    async fn verify_trims_the_secret_and_unlocks_authoring() {
        let server = setup();

        let response = server
            .post("/api/v1/auth/verify")
            .json(&json!({ "secret": "  hushhush  " }))
            .await;
        response.assert_status_ok();

        let status: AuthStatus = server.get("/api/v1/auth").await.json();
        assert!(status.owner);

        let created = server
            .post("/api/v1/thoughts")
            .json(&json!({ "content": "unlocked", "category": "Humour" }))
            .await;
        created.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn sign_out_revokes_the_capability() {
        let server = setup();
        sign_in(&server).await;

        server
            .delete("/api/v1/auth")
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .post("/api/v1/thoughts")
            .json(&json!({ "content": "locked out", "category": "Humour" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}

mod thoughts {
    use super::*;

    #[tokio::test]
    async fn create_and_list_newest_first() {
        let server = setup();
        sign_in(&server).await;

        create_thought(&server, "older", Category::Poetic).await;
        create_thought(&server, "newer", Category::Politics).await;

        let feed: Vec<Thought> = server.get("/api/v1/thoughts").await.json();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].content, "newer");
        assert_eq!(feed[1].content, "older");
        assert_eq!(feed[0].resonates, 0);
    }

    #[tokio::test]
    async fn empty_content_is_unprocessable() {
        let server = setup();
        sign_in(&server).await;

        server
            .post("/api/v1/thoughts")
            .json(&json!({ "content": "   ", "category": "Poetic" }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn eleven_images_are_unprocessable() {
        let server = setup();
        sign_in(&server).await;

        server
            .post("/api/v1/thoughts")
            .json(&CreateThoughtInput {
                content: "gallery overflow".to_string(),
                category: Category::RandomOpinion,
                images: vec!["data:image/png;base64,x".to_string(); 11],
            })
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn filter_by_category_label() {
        let server = setup();
        sign_in(&server).await;

        create_thought(&server, "one", Category::Poetic).await;
        create_thought(&server, "two", Category::Politics).await;
        create_thought(&server, "three", Category::Poetic).await;

        let poetic: Vec<Thought> = server
            .get("/api/v1/thoughts")
            .add_query_param("category", "Poetic")
            .await
            .json();
        assert_eq!(poetic.len(), 2);
        assert_eq!(poetic[0].content, "three");
        assert_eq!(poetic[1].content, "one");

        let all: Vec<Thought> = server
            .get("/api/v1/thoughts")
            .add_query_param("category", "All")
            .await
            .json();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn unknown_category_is_unprocessable() {
        let server = setup();
        server
            .get("/api/v1/thoughts")
            .add_query_param("category", "Gardening")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn update_preserves_identity_and_counter() {
        let server = setup();
        sign_in(&server).await;

        let created = create_thought(&server, "draft", Category::Poetic).await;
        server
            .post(&format!("/api/v1/thoughts/{}/resonate", created.id))
            .await
            .assert_status_ok();

        let updated: Thought = server
            .put(&format!("/api/v1/thoughts/{}", created.id))
            .json(&json!({ "content": "final", "category": "Politics" }))
            .await
            .json();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.timestamp, created.timestamp);
        assert_eq!(updated.resonates, 1);
        assert_eq!(updated.content, "final");
        assert_eq!(updated.category, Category::Politics);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let server = setup();
        sign_in(&server).await;

        server
            .put(&format!("/api/v1/thoughts/{}", Uuid::new_v4()))
            .json(&json!({ "content": "ghost", "category": "Humour" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_restore_undoes_it() {
        let server = setup();
        sign_in(&server).await;

        let created = create_thought(&server, "fleeting", Category::Humour).await;

        server
            .delete(&format!("/api/v1/thoughts/{}", created.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        // Absent id: still a 204, not an error.
        server
            .delete(&format!("/api/v1/thoughts/{}", created.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let restored: Thought = server.post("/api/v1/thoughts/restore").await.json();
        assert_eq!(restored.id, created.id);

        let feed: Vec<Thought> = server.get("/api/v1/thoughts").await.json();
        assert_eq!(feed.len(), 1);
    }

    #[tokio::test]
    async fn restore_with_nothing_buffered_is_not_found() {
        let server = setup();
        sign_in(&server).await;

        server
            .post("/api/v1/thoughts/restore")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod resonate {
    use super::*;

    #[tokio::test]
    async fn second_resonate_from_the_same_store_is_a_no_op() {
        let server = setup();
        sign_in(&server).await;

        let created = create_thought(&server, "echo", Category::DeepThoughts).await;

        let first: Thought = server
            .post(&format!("/api/v1/thoughts/{}/resonate", created.id))
            .await
            .json();
        assert_eq!(first.resonates, 1);

        let second: Thought = server
            .post(&format!("/api/v1/thoughts/{}/resonate", created.id))
            .await
            .json();
        assert_eq!(second.resonates, 1);
    }

    #[tokio::test]
    async fn resonating_an_unknown_id_is_not_found() {
        let server = setup();
        server
            .post(&format!("/api/v1/thoughts/{}/resonate", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn resonate_does_not_require_the_owner_capability() {
        let server = setup();
        sign_in(&server).await;
        let created = create_thought(&server, "open to all", Category::Poetic).await;
        server.delete("/api/v1/auth").await.assert_status(StatusCode::NO_CONTENT);

        server
            .post(&format!("/api/v1/thoughts/{}/resonate", created.id))
            .await
            .assert_status_ok();
    }
}

mod rendering {
    use super::*;

    #[tokio::test]
    async fn rendered_content_is_escaped_markup() {
        let server = setup();
        sign_in(&server).await;

        let created =
            create_thought(&server, "**hi** and *there* <script>", Category::Humour).await;

        let rendered: RenderedThought = server
            .get(&format!("/api/v1/thoughts/{}/rendered", created.id))
            .await
            .json();

        assert_eq!(rendered.id, created.id);
        assert!(rendered.html.contains("<strong>hi</strong>"));
        assert!(rendered.html.contains("<em>there</em>"));
        assert!(!rendered.html.contains("<script>"));
        assert!(rendered.html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn rendering_an_unknown_id_is_not_found() {
        let server = setup();
        server
            .get(&format!("/api/v1/thoughts/{}/rendered", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod deep_links {
    use super::*;

    #[tokio::test]
    async fn status_path_opens_the_thought() {
        let server = setup();
        sign_in(&server).await;
        let created = create_thought(&server, "linked", Category::Poetic).await;

        let view: FeedView = server.get(&format!("/status/{}", created.id)).await.json();
        match view {
            FeedView::Reading { thought } => assert_eq!(thought.id, created.id),
            FeedView::Feed { .. } => panic!("expected the reading view"),
        }
    }

    #[tokio::test]
    async fn unknown_id_falls_back_to_the_feed() {
        let server = setup();
        sign_in(&server).await;
        create_thought(&server, "still here", Category::Poetic).await;

        let response = server.get(&format!("/status/{}", Uuid::new_v4())).await;
        response.assert_status_ok();
        match response.json::<FeedView>() {
            FeedView::Feed { thoughts } => assert_eq!(thoughts.len(), 1),
            FeedView::Reading { .. } => panic!("expected the feed fallback"),
        }
    }

    #[tokio::test]
    async fn malformed_id_falls_back_to_the_feed() {
        let server = setup();
        let response = server.get("/status/not-a-uuid").await;
        response.assert_status_ok();
        assert!(matches!(response.json::<FeedView>(), FeedView::Feed { .. }));
    }

    #[tokio::test]
    async fn deleted_thought_resolves_to_the_feed() {
        let server = setup();
        sign_in(&server).await;
        let created = create_thought(&server, "soon gone", Category::Humour).await;
        server
            .delete(&format!("/api/v1/thoughts/{}", created.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let view: FeedView = server.get(&format!("/status/{}", created.id)).await.json();
        assert!(matches!(view, FeedView::Feed { .. }));
    }

    #[tokio::test]
    async fn root_serves_the_feed_view() {
        let server = setup();
        let view: FeedView = server.get("/").await.json();
        match view {
            FeedView::Feed { thoughts } => assert!(thoughts.is_empty()),
            FeedView::Reading { .. } => panic!("expected the feed"),
        }
    }
}

mod reflection {
    use super::*;

    #[tokio::test]
    async fn reflection_degrades_to_no_content_without_an_upstream() {
        // No API key is configured in tests, so the collaborator contract
        // says: nothing destructive, just "no reflection available".
        let server = setup();
        sign_in(&server).await;
        create_thought(&server, "pondering", Category::DeepThoughts).await;

        server
            .get("/api/v1/reflection")
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() {
        let server = setup();
        let body: serde_json::Value = server.get("/api/v1/health").await.json();
        assert_eq!(body["status"], "ok");
    }
}
