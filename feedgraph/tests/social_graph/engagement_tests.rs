use super::support::*;

#[tokio::test]
async fn liking_twice_restores_the_like_set() {
    let graph = graph();
    let author = register(&graph, "ann").await;
    let fan = register(&graph, "bob").await;
    let post = publish(&graph, &author, "hello").await;

    let first = graph.toggle_like(&fan.user_id, &post.id, LikeTarget::Post).await.unwrap();
    assert_eq!(first, LikeOutcome::Liked);
    assert_eq!(first.acknowledge(LikeTarget::Post).message, "Post Liked");
    let entry = graph.get_post(&post.id).await.unwrap();
    assert_eq!(entry.post.likes, vec![fan.user_id.clone()]);
    assert_eq!(entry.like_count, 1);

    let second = graph.toggle_like(&fan.user_id, &post.id, LikeTarget::Post).await.unwrap();
    assert_eq!(second, LikeOutcome::Unliked);
    assert_eq!(second.acknowledge(LikeTarget::Post).message, "Post Disliked");
    let entry = graph.get_post(&post.id).await.unwrap();
    assert!(entry.post.likes.is_empty());
}

#[tokio::test]
async fn likes_from_different_users_accumulate() {
    let graph = graph();
    let author = register(&graph, "ann").await;
    let fans = crowd(&graph, "fan", 3).await;
    let post = publish(&graph, &author, "popular").await;
    let comment = comment_on(&graph, &author, &post.id, "first").await;

    for fan in &fans {
        graph.toggle_like(&fan.user_id, &post.id, LikeTarget::Post).await.unwrap();
    }
    like_comment_by(&graph, &comment.id, &fans[..2]).await;

    let entry = graph.get_post(&post.id).await.unwrap();
    assert_eq!(entry.like_count, 3);
    assert_eq!(entry.comments[0].likes.len(), 2);
    assert!(entry.post.is_liked_by(&fans[2].user_id));

    let undo = graph
        .toggle_like(&fans[0].user_id, &comment.id, LikeTarget::Comment)
        .await
        .unwrap();
    assert_eq!(undo, LikeOutcome::Unliked);
    let reloaded = graph.get_comment(&comment.id).await.unwrap();
    assert_eq!(reloaded.likes, vec![fans[1].user_id.clone()]);
}

#[tokio::test]
async fn liking_missing_or_malformed_targets() {
    let graph = graph();
    let fan = register(&graph, "bob").await;
    let absent = feedgraph::id::generate_entity_id();

    let err = graph.toggle_like(&fan.user_id, &absent, LikeTarget::Post).await.unwrap_err();
    assert!(err.is_not_found());
    let err = graph.toggle_like(&fan.user_id, &absent, LikeTarget::Comment).await.unwrap_err();
    assert!(err.is_not_found());

    let err = graph.toggle_like(&fan.user_id, "not-an-id", LikeTarget::Post).await.unwrap_err();
    assert!(err.is_invalid());
    assert_eq!(graph.store().len(Collection::Posts), 0);
}

#[tokio::test]
async fn follow_edges_are_symmetric() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let bob = register(&graph, "bob").await;

    let outcome = graph.toggle_follow(&ann.user_id, &bob.user_id).await.unwrap();
    assert_eq!(outcome, FollowOutcome::Followed);
    assert_eq!(outcome.acknowledge().is_following, Some(true));
    assert!(graph.is_following(&ann.user_id, &bob.user_id).await.unwrap());
    assert!(!graph.is_following(&bob.user_id, &ann.user_id).await.unwrap());

    let ann_profile = graph.get_user(&ann.user_id).await.unwrap();
    let bob_profile = graph.get_user(&bob.user_id).await.unwrap();
    assert_eq!(ann_profile.following, vec![bob.user_id.clone()]);
    assert_eq!(bob_profile.followers, vec![ann.user_id.clone()]);
    assert!(ann_profile.followers.is_empty());

    let outcome = graph.toggle_follow(&ann.user_id, &bob.user_id).await.unwrap();
    assert_eq!(outcome, FollowOutcome::Unfollowed);
    assert_eq!(outcome.acknowledge().message, "Unfollowed");
    assert!(graph.get_user(&ann.user_id).await.unwrap().following.is_empty());
    assert!(graph.get_user(&bob.user_id).await.unwrap().followers.is_empty());
}

#[tokio::test]
async fn self_follow_is_rejected_without_mutation() {
    let graph = graph();
    let ann = register(&graph, "ann").await;

    let err = graph.toggle_follow(&ann.user_id, &ann.user_id).await.unwrap_err();
    assert!(matches!(err, FeedError::InvalidOperation { .. }));

    let profile = graph.get_user(&ann.user_id).await.unwrap();
    assert!(profile.following.is_empty());
    assert!(profile.followers.is_empty());
}

#[tokio::test]
async fn following_a_missing_user_is_not_found() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let ghost = feedgraph::id::generate_entity_id();

    let err = graph.toggle_follow(&ann.user_id, &ghost).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(graph.get_user(&ann.user_id).await.unwrap().following.is_empty());
}
