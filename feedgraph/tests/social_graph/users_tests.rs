use super::support::*;

#[tokio::test]
async fn registration_validates_email() {
    let graph = graph();
    let err = graph
        .create_user(NewUser {
            email: "not-an-email".to_string(),
            username: "ann".to_string(),
            credential: "hash".to_string(),
        })
        .await
        .unwrap_err();
    match err {
        FeedError::Validation(validation) => {
            assert_eq!(validation.issues[0].field, "email");
            assert_eq!(validation.issues[0].code, "validation.email");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(graph.store().len(Collection::Users), 0);
}

#[tokio::test]
async fn emails_are_unique_case_insensitively() {
    let graph = graph();
    register(&graph, "ann").await;
    let err = graph
        .create_user(NewUser {
            email: "ANN@example.com".to_string(),
            username: "imposter".to_string(),
            credential: "hash".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::InvalidOperation { .. }));
}

#[tokio::test]
async fn profiles_never_expose_credentials() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let profile = graph.get_user(&ann.user_id).await.unwrap();
    let json = serde_json::to_value(&profile).unwrap();
    assert!(json.get("credential").is_none());
    assert_eq!(json["username"], "ann");
    assert!(json.get("createdAt").is_some());
}

#[tokio::test]
async fn profile_update_requires_a_change() {
    let graph = graph();
    let ann = register(&graph, "ann").await;

    let err = graph
        .update_profile(&ann, ProfileUpdate::default())
        .await
        .unwrap_err();
    assert!(err.is_invalid());

    let blank = ProfileUpdate {
        username: Some(" ".to_string()),
        credential: Some(String::new()),
    };
    assert!(graph.update_profile(&ann, blank).await.unwrap_err().is_invalid());

    let rotated = graph
        .update_profile(
            &ann,
            ProfileUpdate {
                username: None,
                credential: Some("new-hash".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(rotated.username, "ann");
    assert_eq!(graph.store().len(Collection::Users), 1);
}

#[tokio::test]
async fn profile_update_for_unknown_user_creates_nothing() {
    let graph = graph();
    let ghost = Caller::new(feedgraph::id::generate_entity_id(), "ghost");
    let err = graph
        .update_profile(
            &ghost,
            ProfileUpdate {
                username: Some("boo".to_string()),
                credential: None,
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(graph.store().len(Collection::Users), 0);
}

#[tokio::test]
async fn follower_lists_page_in_edge_order() {
    let graph = graph();
    let star = register(&graph, "star").await;
    let fans = crowd(&graph, "fan", 4).await;
    for fan in &fans {
        graph.toggle_follow(&fan.user_id, &star.user_id).await.unwrap();
    }

    let first = graph.list_followers(&star.user_id, PageRequest::new(1, 3)).await.unwrap();
    let names: Vec<&str> = first.items.iter().map(|user| user.username.as_str()).collect();
    assert_eq!(names, ["fan0", "fan1", "fan2"]);
    assert_eq!(first.count, 4);
    assert!(first.has_more);

    let second = graph.list_followers(&star.user_id, PageRequest::new(2, 3)).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].id, fans[3].user_id);

    let following = graph.list_following(&fans[0].user_id, PageRequest::default()).await.unwrap();
    assert_eq!(following.count, 1);
    assert_eq!(following.items[0].username, "star");

    let nobody = graph.list_following(&star.user_id, PageRequest::default()).await.unwrap();
    assert!(nobody.is_empty());
    assert_eq!(nobody.count, 0);
}
