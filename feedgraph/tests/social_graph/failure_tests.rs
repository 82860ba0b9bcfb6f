use super::support::*;

fn flaky_graph() -> (SocialGraph<FlakyStore>, FlakyStore) {
    let store = FlakyStore::new();
    let graph = SocialGraph::new(store.clone()).with_clock(StepClock::new());
    (graph, store)
}

#[tokio::test]
async fn membership_lookup_failure_is_not_membership() {
    let (graph, store) = flaky_graph();
    let ann = register(&graph, "ann").await;
    let bob = register(&graph, "bob").await;
    let post = publish(&graph, &ann, "fragile").await;

    store.fail_find_one(true);
    let err = graph.toggle_like(&bob.user_id, &post.id, LikeTarget::Post).await.unwrap_err();
    assert!(err.is_store_failure());
    let err = graph.toggle_follow(&bob.user_id, &ann.user_id).await.unwrap_err();
    assert!(err.is_store_failure());

    store.fail_find_one(false);
    assert!(graph.get_post(&post.id).await.unwrap().post.likes.is_empty());
    assert!(graph.get_user(&bob.user_id).await.unwrap().following.is_empty());
    assert!(graph.get_user(&ann.user_id).await.unwrap().followers.is_empty());
}

#[tokio::test]
async fn failed_second_follow_write_surfaces_and_is_not_rolled_back() {
    let (graph, store) = flaky_graph();
    let ann = register(&graph, "ann").await;
    let bob = register(&graph, "bob").await;

    store.fail_updates_after(1);
    let err = graph.toggle_follow(&ann.user_id, &bob.user_id).await.unwrap_err();
    assert!(err.is_store_failure());

    store.fail_updates_after(-1);
    assert_eq!(graph.get_user(&ann.user_id).await.unwrap().following, vec![bob.user_id.clone()]);
    assert!(graph.get_user(&bob.user_id).await.unwrap().followers.is_empty());

    // The next toggle reads the forward edge and removes it from both sides.
    let outcome = graph.toggle_follow(&ann.user_id, &bob.user_id).await.unwrap();
    assert_eq!(outcome, FollowOutcome::Unfollowed);
    assert!(graph.get_user(&ann.user_id).await.unwrap().following.is_empty());
}

#[tokio::test]
async fn write_failures_propagate_from_toggles() {
    let (graph, store) = flaky_graph();
    let ann = register(&graph, "ann").await;
    let post = publish(&graph, &ann, "locked").await;

    store.fail_updates_after(0);
    let err = graph.toggle_like(&ann.user_id, &post.id, LikeTarget::Post).await.unwrap_err();
    assert!(err.is_store_failure());
    assert!(!err.is_not_found());

    store.fail_updates_after(-1);
    assert_eq!(graph.get_post(&post.id).await.unwrap().like_count, 0);
}

#[tokio::test]
async fn racing_identical_likes_leave_one_like() {
    let (graph, store) = flaky_graph();
    let ann = register(&graph, "ann").await;
    let bob = register(&graph, "bob").await;
    let post = publish(&graph, &ann, "contested").await;

    store.duplicate_next_update();
    let outcome = graph.toggle_like(&bob.user_id, &post.id, LikeTarget::Post).await.unwrap();
    assert_eq!(outcome, LikeOutcome::Liked);
    assert_eq!(graph.get_post(&post.id).await.unwrap().post.likes, vec![bob.user_id.clone()]);

    let outcome = graph.toggle_like(&bob.user_id, &post.id, LikeTarget::Post).await.unwrap();
    assert_eq!(outcome, LikeOutcome::Unliked);
    assert_eq!(graph.get_post(&post.id).await.unwrap().like_count, 0);
}
