use log::info;

use super::SocialGraph;
use crate::{
    errors::{FeedError, FeedResult, ValidationIssue},
    id::ensure_entity_id,
    models::{
        Caller, NewUser, ProfileUpdate, User, UserProfile, UserSummary,
        fields::{CREDENTIAL, EMAIL, ID, USERNAME},
    },
    pagination::{Page, PageRequest, Window},
    store::{Collection, DocumentStore, Filter, FindOptions, Update, UpdateOptions, decode},
    validators,
};

enum Edge {
    Followers,
    Following,
}

impl<S: DocumentStore> SocialGraph<S> {
    /// Registers a user. The credential is stored as given.
    pub async fn create_user(&self, new_user: NewUser) -> FeedResult<UserProfile> {
        let email = new_user.email.trim().to_lowercase();
        let mut issues = Vec::new();
        if !validators::is_valid_email(&email) {
            issues.push(ValidationIssue::new(EMAIL, "validation.email", "email is not a valid address"));
        }
        validators::require_text(USERNAME, &new_user.username, &mut issues);
        validators::finish(issues)?;

        if self.store.count(Collection::Users, &Filter::eq(EMAIL, email.as_str())).await? > 0 {
            return Err(FeedError::invalid(format!("email {email} is already registered")));
        }

        let mut user = User {
            id: String::new(),
            email,
            username: new_user.username,
            credential: new_user.credential,
            posts: Vec::new(),
            following: Vec::new(),
            followers: Vec::new(),
            created_at: self.now(),
        };
        user.id = self
            .store
            .insert_one(Collection::Users, serde_json::to_value(&user)?)
            .await?;

        info!("registered user {}", user.id);
        Ok(user.into())
    }

    pub async fn get_user(&self, user_id: &str) -> FeedResult<UserProfile> {
        ensure_entity_id("user", user_id)?;
        let user: User = self.fetch(Collection::Users, user_id).await?;
        Ok(user.into())
    }

    /// Changes the caller's username and/or credential.
    ///
    /// Author snapshots already embedded in posts and comments keep the old name.
    pub async fn update_profile(&self, caller: &Caller, update: ProfileUpdate) -> FeedResult<UserProfile> {
        ensure_entity_id("user", &caller.user_id)?;
        let mut updates = Vec::new();
        if let Some(username) = update.username.filter(|value| !value.trim().is_empty()) {
            updates.push(Update::set(USERNAME, username));
        }
        if let Some(credential) = update.credential.filter(|value| !value.is_empty()) {
            updates.push(Update::set(CREDENTIAL, credential));
        }
        if updates.is_empty() {
            return Err(FeedError::invalid("nothing to update"));
        }
        self.require(Collection::Users, &caller.user_id).await?;

        let outcome = self
            .store
            .update_one(
                Collection::Users,
                &Filter::id(caller.user_id.as_str()),
                &updates,
                UpdateOptions::UPSERT_RETURN_AFTER,
            )
            .await?;
        let document = outcome
            .document
            .ok_or_else(|| FeedError::not_found("user", caller.user_id.as_str()))?;
        let user: User = decode(document)?;
        info!("{} updated profile", user.id);
        Ok(user.into())
    }

    pub async fn list_followers(&self, user_id: &str, request: PageRequest) -> FeedResult<Page<UserSummary>> {
        self.list_edge(user_id, Edge::Followers, request).await
    }

    pub async fn list_following(&self, user_id: &str, request: PageRequest) -> FeedResult<Page<UserSummary>> {
        self.list_edge(user_id, Edge::Following, request).await
    }

    /// Pages through one side of the follow graph in the order edges were added.
    async fn list_edge(&self, user_id: &str, edge: Edge, request: PageRequest) -> FeedResult<Page<UserSummary>> {
        ensure_entity_id("user", user_id)?;
        let request = request.clamp_limit(self.settings.max_limit);
        let user: User = self.fetch(Collection::Users, user_id).await?;
        let ids = match edge {
            Edge::Followers => user.followers,
            Edge::Following => user.following,
        };

        let window = Window::compute(request, ids.len() as u64);
        let ids = window.apply(ids);
        if ids.is_empty() {
            return Ok(Page::new(Vec::new(), window));
        }

        let mut users: Vec<User> = self
            .store
            .find_many(Collection::Users, &FindOptions::new(Filter::is_in(ID, ids.iter().map(String::as_str))))
            .await?
            .into_iter()
            .map(decode)
            .collect::<FeedResult<_>>()?;
        users.sort_by_key(|user| ids.iter().position(|id| *id == user.id));
        Ok(Page::new(users.into_iter().map(UserSummary::from).collect(), window))
    }
}
