use super::support::*;

#[tokio::test]
async fn create_post_links_author() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let post = publish(&graph, &ann, "hello").await;

    assert!(feedgraph::id::is_entity_id(&post.id));
    assert_eq!(post.author.id, ann.user_id);
    assert_eq!(post.author.username, "ann");
    assert_eq!(post.created_at, post.updated_at);
    assert_eq!(graph.get_user(&ann.user_id).await.unwrap().posts, vec![post.id.clone()]);

    let err = graph
        .create_post(&ann, PostInput::new("   ", "no title"))
        .await
        .unwrap_err();
    assert!(err.is_invalid());
    assert_eq!(graph.store().len(Collection::Posts), 1);
}

#[tokio::test]
async fn update_post_keeps_blank_fields() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let post = publish(&graph, &ann, "draft").await;

    let updated = graph
        .update_post(&ann, &post.id, PostInput::new("final", ""))
        .await
        .unwrap();
    assert_eq!(updated.title, "final");
    assert_eq!(updated.description, post.description);
    assert!(updated.updated_at > post.updated_at);
    assert_eq!(updated.created_at, post.created_at);

    let err = graph
        .update_post(&ann, &post.id, PostInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::InvalidOperation { .. }));
}

#[tokio::test]
async fn strangers_cannot_edit_or_delete() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let eve = register(&graph, "eve").await;
    let post = publish(&graph, &ann, "mine").await;
    let comment = comment_on(&graph, &ann, &post.id, "also mine").await;

    let err = graph
        .update_post(&eve, &post.id, PostInput::new("hijacked", ""))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let err = graph.delete_post(&eve, &post.id).await.unwrap_err();
    assert!(err.is_not_found());
    let err = graph.update_comment(&eve, &comment.id, "hijacked").await.unwrap_err();
    assert!(err.is_not_found());
    let err = graph.delete_comment(&eve, &comment.id).await.unwrap_err();
    assert!(err.is_not_found());

    let entry = graph.get_post(&post.id).await.unwrap();
    assert_eq!(entry.post.title, "mine");
    assert_eq!(entry.comments[0].message, "also mine");
}

#[tokio::test]
async fn delete_post_cascades_to_comments_and_author() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let bob = register(&graph, "bob").await;
    let doomed = publish(&graph, &ann, "doomed").await;
    let kept = publish(&graph, &ann, "kept").await;
    comment_on(&graph, &bob, &doomed.id, "one").await;
    comment_on(&graph, &ann, &doomed.id, "two").await;
    comment_on(&graph, &bob, &kept.id, "stays").await;

    let deletion = graph.delete_post(&ann, &doomed.id).await.unwrap();
    assert_eq!(deletion.post_id, doomed.id);
    assert_eq!(deletion.comments_deleted, 2);

    assert!(graph.get_post(&doomed.id).await.unwrap_err().is_not_found());
    assert_eq!(graph.store().len(Collection::Comments), 1);
    assert_eq!(graph.get_user(&ann.user_id).await.unwrap().posts, vec![kept.id.clone()]);
    assert_eq!(graph.rank_comments(&doomed.id, 10).await.unwrap().count, 0);
}

#[tokio::test]
async fn delete_all_posts_empties_the_author() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let bob = register(&graph, "bob").await;
    for n in 0..3 {
        let post = publish(&graph, &ann, &format!("p{n}")).await;
        comment_on(&graph, &bob, &post.id, "hi").await;
    }
    let survivor = publish(&graph, &bob, "bob's").await;
    comment_on(&graph, &ann, &survivor.id, "hey").await;

    let deletion = graph.delete_all_posts(&ann).await.unwrap();
    assert_eq!(deletion.posts_deleted, 3);
    assert_eq!(deletion.comments_deleted, 3);
    assert!(graph.get_user(&ann.user_id).await.unwrap().posts.is_empty());

    let page = graph.global_timeline(PageRequest::default()).await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.items[0].comment_count, 1);
}

#[tokio::test]
async fn comments_require_an_existing_post_and_text() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let post = publish(&graph, &ann, "open").await;
    let ghost = feedgraph::id::generate_entity_id();

    assert!(graph.create_comment(&ann, &ghost, "hello").await.unwrap_err().is_not_found());
    assert!(graph.create_comment(&ann, &post.id, "  ").await.unwrap_err().is_invalid());
    assert_eq!(graph.store().len(Collection::Comments), 0);

    let comment = comment_on(&graph, &ann, &post.id, "hello").await;
    assert_eq!(comment.post, post.id);
    let entry = graph.get_post(&post.id).await.unwrap();
    assert_eq!(entry.post.comments, vec![comment.id.clone()]);
}

#[tokio::test]
async fn edit_and_delete_own_comment() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let post = publish(&graph, &ann, "open").await;
    let comment = comment_on(&graph, &ann, &post.id, "typo").await;

    let edited = graph.update_comment(&ann, &comment.id, "fixed").await.unwrap();
    assert_eq!(edited.message, "fixed");
    assert_eq!(edited.created_at, comment.created_at);

    let removed = graph.delete_comment(&ann, &comment.id).await.unwrap();
    assert_eq!(removed.id, comment.id);
    let entry = graph.get_post(&post.id).await.unwrap();
    assert!(entry.post.comments.is_empty());
    assert_eq!(entry.comment_count, 0);
    assert!(graph.get_comment(&comment.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn snapshots_survive_a_rename() {
    let graph = graph();
    let ann = register(&graph, "ann").await;
    let post = publish(&graph, &ann, "before rename").await;
    let comment = comment_on(&graph, &ann, &post.id, "old name").await;

    let profile = graph
        .update_profile(
            &ann,
            ProfileUpdate {
                username: Some("annabel".to_string()),
                credential: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.username, "annabel");

    let entry = graph.get_post(&post.id).await.unwrap();
    assert_eq!(entry.post.author.username, "ann");
    assert_eq!(graph.get_comment(&comment.id).await.unwrap().author.username, "ann");
}
