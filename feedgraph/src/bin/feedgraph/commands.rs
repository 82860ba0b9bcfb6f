use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use feedgraph::{
    Caller, LikeTarget, NewUser, PageRequest, PostInput, RedisStore, Settings, SocialGraph, TimelineScope,
};

use crate::output::OutputManager;

/// Paging flags shared by listing commands.
///
/// Kept as raw strings; unusable values fall back to page 1 / limit 10.
#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long)]
    pub page: Option<String>,

    /// Items per page
    #[arg(long)]
    pub limit: Option<String>,
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref(), self.limit.as_deref())
    }
}

/// Identity used for commands that act on behalf of a user.
#[derive(Args, Debug, Clone)]
pub struct ActorArgs {
    /// Acting user id
    #[arg(long = "as", env = "FEEDGRAPH_USER", value_name = "USER_ID")]
    pub actor: String,
}

#[derive(Subcommand, Debug)]
pub enum TimelineCommands {
    /// Every post, newest first
    Global(PageArgs),
    /// Posts written by one user
    Author {
        user_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Posts by the users a viewer follows (global without a viewer)
    Following {
        #[arg(long, env = "FEEDGRAPH_USER")]
        viewer: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Args, Debug)]
pub struct CommentsArgs {
    /// Restrict to one post
    #[arg(long)]
    pub post: Option<String>,

    /// Show only the top N comments of --post with its total count
    #[arg(long, requires = "post")]
    pub top: Option<u64>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Subcommand, Debug)]
pub enum PostCommands {
    Create {
        #[command(flatten)]
        actor: ActorArgs,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Show {
        post_id: String,
    },
    Delete {
        #[command(flatten)]
        actor: ActorArgs,
        post_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    Create {
        #[command(flatten)]
        actor: ActorArgs,
        post_id: String,
        message: String,
    },
    Delete {
        #[command(flatten)]
        actor: ActorArgs,
        comment_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum LikeCommands {
    /// Like a post, or take the like back
    Post {
        #[command(flatten)]
        actor: ActorArgs,
        post_id: String,
    },
    /// Like a comment, or take the like back
    Comment {
        #[command(flatten)]
        actor: ActorArgs,
        comment_id: String,
    },
}

#[derive(Args, Debug)]
pub struct FollowArgs {
    #[command(flatten)]
    pub actor: ActorArgs,
    pub target_id: String,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        /// Pre-hashed credential, stored as given
        #[arg(long, env = "FEEDGRAPH_CREDENTIAL", hide_env_values = true)]
        credential: String,
    },
    Show {
        user_id: String,
    },
    Followers {
        user_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    Following {
        user_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
}

/// Engine bound to the configured Redis store.
pub struct Session {
    pub graph: SocialGraph<RedisStore>,
}

impl Session {
    pub async fn connect(settings: &Settings, output: &OutputManager) -> Result<Self> {
        let url = settings.redis_url().context("Failed to resolve Redis URL")?;
        output.verbose(&format!("connecting to {url} (prefix {})", settings.redis.prefix));
        let store = RedisStore::connect(&url, settings.redis.prefix.clone())
            .await
            .with_context(|| format!("Failed to connect to Redis at {url}"))?;
        Ok(Self {
            graph: SocialGraph::new(store).with_settings(settings.feed),
        })
    }

    /// Resolves `--as` to a caller with the username snapshots need.
    async fn caller(&self, actor: &ActorArgs) -> Result<Caller> {
        let user = self
            .graph
            .get_user(&actor.actor)
            .await
            .with_context(|| format!("Unknown acting user {}", actor.actor))?;
        Ok(Caller::new(user.id, user.username))
    }
}

pub async fn handle_timeline(session: &Session, command: TimelineCommands, output: &OutputManager) -> Result<()> {
    let (scope, page) = match command {
        TimelineCommands::Global(page) => (TimelineScope::Global, page),
        TimelineCommands::Author { user_id, page } => (TimelineScope::Author(user_id), page),
        TimelineCommands::Following { viewer, page } => (TimelineScope::Following(viewer), page),
    };
    if scope == TimelineScope::Following(None) {
        output.warning("No viewer given, showing the global timeline");
    }
    output.heading(&format!("Timeline ({scope:?})"));
    let timeline = session.graph.timeline(scope, page.request()).await?;
    if timeline.is_empty() {
        output.info("No posts to show");
    }
    output.display(&timeline)
}

pub async fn handle_comments(session: &Session, args: CommentsArgs, output: &OutputManager) -> Result<()> {
    match (args.post.as_deref(), args.top) {
        (Some(post_id), Some(top)) => {
            let ranked = session.graph.rank_comments(post_id, top).await?;
            output.display(&ranked)
        }
        (post_id, _) => {
            let comments = session.graph.list_comments(post_id, args.page.request()).await?;
            output.display(&comments)
        }
    }
}

pub async fn handle_post(session: &Session, command: PostCommands, output: &OutputManager) -> Result<()> {
    match command {
        PostCommands::Create {
            actor,
            title,
            description,
        } => {
            let caller = session.caller(&actor).await?;
            let post = session.graph.create_post(&caller, PostInput::new(title, description)).await?;
            output.success(&format!("Created post {}", post.id));
            output.display(&post)
        }
        PostCommands::Show { post_id } => {
            let entry = session.graph.get_post(&post_id).await?;
            output.display(&entry)
        }
        PostCommands::Delete { actor, post_id } => {
            let caller = session.caller(&actor).await?;
            let deletion = session.graph.delete_post(&caller, &post_id).await?;
            output.success(&format!(
                "Deleted post {} and {} comments",
                deletion.post_id, deletion.comments_deleted
            ));
            Ok(())
        }
    }
}

pub async fn handle_comment(session: &Session, command: CommentCommands, output: &OutputManager) -> Result<()> {
    match command {
        CommentCommands::Create {
            actor,
            post_id,
            message,
        } => {
            let caller = session.caller(&actor).await?;
            let comment = session.graph.create_comment(&caller, &post_id, &message).await?;
            output.success(&format!("Commented {}", comment.id));
            output.display(&comment)
        }
        CommentCommands::Delete { actor, comment_id } => {
            let caller = session.caller(&actor).await?;
            session.graph.delete_comment(&caller, &comment_id).await?;
            output.success(&format!("Deleted comment {comment_id}"));
            Ok(())
        }
    }
}

pub async fn handle_like(session: &Session, command: LikeCommands, output: &OutputManager) -> Result<()> {
    let (actor, target_id, target) = match command {
        LikeCommands::Post { actor, post_id } => (actor, post_id, LikeTarget::Post),
        LikeCommands::Comment { actor, comment_id } => (actor, comment_id, LikeTarget::Comment),
    };
    let outcome = session.graph.toggle_like(&actor.actor, &target_id, target).await?;
    output.display(&outcome.acknowledge(target))
}

pub async fn handle_follow(session: &Session, args: FollowArgs, output: &OutputManager) -> Result<()> {
    let outcome = session.graph.toggle_follow(&args.actor.actor, &args.target_id).await?;
    output.display(&outcome.acknowledge())
}

pub async fn handle_user(session: &Session, command: UserCommands, output: &OutputManager) -> Result<()> {
    match command {
        UserCommands::Create {
            email,
            username,
            credential,
        } => {
            let profile = session
                .graph
                .create_user(NewUser {
                    email,
                    username,
                    credential,
                })
                .await?;
            output.success(&format!("Registered {}", profile.username));
            output.display(&profile)
        }
        UserCommands::Show { user_id } => output.display(&session.graph.get_user(&user_id).await?),
        UserCommands::Followers { user_id, page } => {
            output.display(&session.graph.list_followers(&user_id, page.request()).await?)
        }
        UserCommands::Following { user_id, page } => {
            output.display(&session.graph.list_following(&user_id, page.request()).await?)
        }
    }
}
