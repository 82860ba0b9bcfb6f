use super::support::*;

fn post_ids(page: &feedgraph::Page<feedgraph::FeedEntry>) -> Vec<String> {
    page.items.iter().map(|entry| entry.post.id.clone()).collect()
}

#[tokio::test]
async fn global_timeline_is_newest_first() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let bob = register(&graph, "bob").await;
    let p1 = publish(&graph, &ann, "first").await;
    let p2 = publish(&graph, &bob, "second").await;
    let p3 = publish(&graph, &ann, "third").await;

    let page = graph.global_timeline(PageRequest::default()).await.unwrap();
    assert_eq!(post_ids(&page), [p3.id, p2.id, p1.id]);
    assert_eq!(page.count, 3);
    assert!(!page.has_more);
}

#[tokio::test]
async fn second_page_of_twenty_five_posts() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let mut published = Vec::new();
    for n in 0..25 {
        published.push(publish(&graph, &ann, &format!("post {n}")).await.id);
    }

    let page = graph.global_timeline(PageRequest::new(2, 10)).await.unwrap();
    assert_eq!(page.count, 25);
    assert_eq!(page.items.len(), 10);
    let expected: Vec<String> = published[5..15].iter().rev().cloned().collect();
    assert_eq!(post_ids(&page), expected);

    let past_end = graph.global_timeline(PageRequest::new(9, 10)).await.unwrap();
    assert!(past_end.is_empty());
    assert_eq!(past_end.count, 25);
}

#[tokio::test]
async fn invalid_paging_strings_fall_back_to_defaults() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    for n in 0..12 {
        publish(&graph, &ann, &format!("post {n}")).await;
    }

    let page = graph
        .global_timeline(PageRequest::parse(Some("abc"), Some("-5")))
        .await
        .unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 10);
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.count, 12);
}

#[tokio::test]
async fn timestamp_ties_break_on_id_descending() {
    let at = Utc.with_ymd_and_hms(2024, 3, 3, 3, 3, 3).unwrap();
    let graph = SocialGraph::new(MemoryStore::new()).with_clock(FixedClock(at));
    let ann = register(&graph, "ann").await;
    let mut ids = Vec::new();
    for n in 0..4 {
        ids.push(publish(&graph, &ann, &format!("tied {n}")).await.id);
    }
    ids.sort_by(|a, b| b.cmp(a));

    let first = graph.global_timeline(PageRequest::default()).await.unwrap();
    let second = graph.global_timeline(PageRequest::default()).await.unwrap();
    assert_eq!(post_ids(&first), ids);
    assert_eq!(post_ids(&first), post_ids(&second));
}

#[tokio::test]
async fn author_scope_only_shows_that_author() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let bob = register(&graph, "bob").await;
    let a1 = publish(&graph, &ann, "a1").await;
    publish(&graph, &bob, "b1").await;
    let a2 = publish(&graph, &ann, "a2").await;

    let page = graph.author_timeline(&ann.user_id, PageRequest::default()).await.unwrap();
    assert_eq!(post_ids(&page), [a2.id, a1.id]);
    assert_eq!(page.count, 2);

    let ghost = feedgraph::id::generate_entity_id();
    let err = graph.author_timeline(&ghost, PageRequest::default()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn following_scope_limits_to_followed_authors() {
    let graph = graph();
    let viewer = register(&graph, "viewer").await;
    let ann = register(&graph, "ann").await;
    let bob = register(&graph, "bob").await;
    let a1 = publish(&graph, &ann, "a1").await;
    publish(&graph, &bob, "b1").await;
    let a2 = publish(&graph, &ann, "a2").await;

    graph.toggle_follow(&viewer.user_id, &ann.user_id).await.unwrap();
    let page = graph
        .following_timeline(Some(&viewer.user_id), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(post_ids(&page), [a2.id, a1.id]);
    assert_eq!(page.count, 2);
}

#[tokio::test]
async fn following_scope_without_viewer_is_global() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let bob = register(&graph, "bob").await;
    publish(&graph, &ann, "a1").await;
    publish(&graph, &bob, "b1").await;

    let global = graph.timeline(TimelineScope::Global, PageRequest::default()).await.unwrap();
    let anonymous = graph
        .timeline(TimelineScope::Following(None), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(anonymous, global);

    let ghost = feedgraph::id::generate_entity_id();
    let unknown = graph.following_timeline(Some(&ghost), PageRequest::default()).await.unwrap();
    assert_eq!(unknown, global);
}

#[tokio::test]
async fn viewer_following_nobody_sees_nothing() {
    let graph = graph();
    let loner = register(&graph, "loner").await;
    let ann = register(&graph, "ann").await;
    publish(&graph, &ann, "a1").await;

    let page = graph
        .following_timeline(Some(&loner.user_id), PageRequest::default())
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.count, 0);
}

#[tokio::test]
async fn entries_embed_at_most_the_embed_limit() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let fan = register(&graph, "fan").await;
    let post = publish(&graph, &ann, "busy").await;
    let mut comments = Vec::new();
    for n in 0..12 {
        comments.push(comment_on(&graph, &ann, &post.id, &format!("c{n}")).await);
    }
    like_comment_by(&graph, &comments[11].id, std::slice::from_ref(&fan)).await;
    graph.toggle_like(&fan.user_id, &post.id, LikeTarget::Post).await.unwrap();

    let page = graph.global_timeline(PageRequest::default()).await.unwrap();
    let entry = &page.items[0];
    assert_eq!(entry.comments.len(), 10);
    assert_eq!(entry.comment_count, 12);
    assert_eq!(entry.like_count, 1);
    assert_eq!(entry.comments[0].id, comments[11].id);
    assert_eq!(entry.comments[1].id, comments[0].id);

    let narrow = graph.clone().with_settings(FeedSettings {
        embed_limit: 3,
        ..FeedSettings::default()
    });
    let entry = narrow.get_post(&post.id).await.unwrap();
    assert_eq!(entry.comments.len(), 3);
    assert_eq!(entry.comment_count, 12);
}

#[tokio::test]
async fn oversized_limits_are_clamped() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    publish(&graph, &ann, "only").await;

    let page = graph.global_timeline(PageRequest::new(1, 5_000)).await.unwrap();
    assert_eq!(page.limit, 100);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn deserialized_page_requests_never_fail() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    publish(&graph, &ann, "only").await;

    let request: PageRequest = serde_json::from_str(r#"{"page":0,"limit":0}"#).unwrap();
    let page = graph.global_timeline(request).await.unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 10);
    assert_eq!(page.count, 1);
    assert_eq!(page.len(), 1);
    assert!(!page.has_more);

    let request: PageRequest = serde_json::from_str(r#"{"page":1,"limit":-4}"#).unwrap();
    let page = graph.global_timeline(request).await.unwrap();
    assert_eq!(page.limit, 10);
    assert_eq!(page.len(), 1);
}
