use crate::client::Client;
use crate::http::context::Context;
use crate::http::error::Error;
use crate::http::request::add_options;
use crate::http::{ListOptions, Response};
use crate::services::{get_json, send_empty, send_json};
use crate::types::{GroupId, Post, PostId, Scope, UserId};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub struct Posts<'a> {
    client: &'a Client,
}

impl<'a> Posts<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Search posts. `meta` of the returned response holds the page links.
    pub fn list(&self) -> PostList<'a> {
        PostList {
            client: self.client,
            opts: PostListOptions::default(),
        }
    }

    pub fn get(&self, id: PostId) -> PostGet<'a> {
        PostGet {
            client: self.client,
            id,
        }
    }

    pub fn create(&self, title: impl Into<String>, body: impl Into<String>) -> PostCreate<'a> {
        PostCreate {
            client: self.client,
            opts: PostCreateOptions {
                title: title.into(),
                body: body.into(),
                ..Default::default()
            },
        }
    }

    pub fn edit(&self, id: PostId) -> PostEdit<'a> {
        PostEdit {
            client: self.client,
            id,
            opts: PostEditOptions::default(),
        }
    }

    pub fn delete(&self, id: PostId) -> PostDelete<'a> {
        PostDelete {
            client: self.client,
            id,
        }
    }

    pub fn archive(&self, id: PostId) -> PostArchive<'a> {
        PostArchive {
            client: self.client,
            id,
            archived: true,
        }
    }

    pub fn unarchive(&self, id: PostId) -> PostArchive<'a> {
        PostArchive {
            client: self.client,
            id,
            archived: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
struct PostListOptions {
    q: Option<String>,
    #[serde(flatten)]
    list: ListOptions,
}

#[derive(Default, Deserialize)]
struct PostPage {
    #[serde(default)]
    posts: Vec<Post>,
}

pub struct PostList<'a> {
    client: &'a Client,
    opts: PostListOptions,
}

impl PostList<'_> {
    /// Full-text search query, passed to the service verbatim.
    pub fn query(mut self, q: impl Into<String>) -> Self {
        self.opts.q = Some(q.into());
        self
    }

    pub fn page(mut self, page: i64) -> Self {
        self.opts.list.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: i64) -> Self {
        self.opts.list.per_page = Some(per_page);
        self
    }

    /// Continue from a page link, e.g. `resp.meta.and_then(|m| m.next())`.
    pub fn list_options(mut self, list: ListOptions) -> Self {
        self.opts.list = list;
        self
    }

    pub async fn send(self, ctx: &Context) -> Result<(Vec<Post>, Response), Error> {
        let path = add_options(&self.client.team_path("posts"), Some(&self.opts))?;
        let (page, resp) = get_json::<PostPage>(self.client, ctx, &path).await?;
        Ok((page.posts, resp))
    }
}

pub struct PostGet<'a> {
    client: &'a Client,
    id: PostId,
}

impl PostGet<'_> {
    pub async fn send(self, ctx: &Context) -> Result<(Post, Response), Error> {
        let path = self.client.team_path(&format!("posts/{}", self.id));
        get_json(self.client, ctx, &path).await
    }
}

#[derive(Debug, Clone, Default, Serialize)]
struct PostCreateOptions {
    title: String,
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<GroupId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_at: Option<DateTime<Utc>>,
}

pub struct PostCreate<'a> {
    client: &'a Client,
    opts: PostCreateOptions,
}

impl PostCreate<'_> {
    pub fn draft(mut self, draft: bool) -> Self {
        self.opts.draft = Some(draft);
        self
    }

    pub fn notice(mut self, notice: bool) -> Self {
        self.opts.notice = Some(notice);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.opts.scope = Some(scope);
        self
    }

    /// Readers when the scope is [`Scope::Group`].
    pub fn groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.opts.groups = Some(groups.into_iter().collect());
        self
    }

    /// Post on behalf of another member (admin tokens only).
    pub fn author_id(mut self, author: UserId) -> Self {
        self.opts.author_id = Some(author);
        self
    }

    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.opts.published_at = Some(at);
        self
    }

    pub async fn send(self, ctx: &Context) -> Result<(Post, Response), Error> {
        let path = self.client.team_path("posts");
        send_json(self.client, ctx, Method::POST, &path, &self.opts).await
    }
}

#[derive(Debug, Clone, Default, Serialize)]
struct PostEditOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<GroupId>>,
}

pub struct PostEdit<'a> {
    client: &'a Client,
    id: PostId,
    opts: PostEditOptions,
}

impl PostEdit<'_> {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.opts.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.opts.body = Some(body.into());
        self
    }

    pub fn draft(mut self, draft: bool) -> Self {
        self.opts.draft = Some(draft);
        self
    }

    pub fn notice(mut self, notice: bool) -> Self {
        self.opts.notice = Some(notice);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.opts.scope = Some(scope);
        self
    }

    pub fn groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.opts.groups = Some(groups.into_iter().collect());
        self
    }

    pub async fn send(self, ctx: &Context) -> Result<(Post, Response), Error> {
        let path = self.client.team_path(&format!("posts/{}", self.id));
        send_json(self.client, ctx, Method::PATCH, &path, &self.opts).await
    }
}

pub struct PostDelete<'a> {
    client: &'a Client,
    id: PostId,
}

impl PostDelete<'_> {
    pub async fn send(self, ctx: &Context) -> Result<Response, Error> {
        let path = self.client.team_path(&format!("posts/{}", self.id));
        send_empty(self.client, ctx, Method::DELETE, &path).await
    }
}

/// Archive or restore a post.
pub struct PostArchive<'a> {
    client: &'a Client,
    id: PostId,
    archived: bool,
}

impl PostArchive<'_> {
    pub async fn send(self, ctx: &Context) -> Result<Response, Error> {
        let action = if self.archived { "archive" } else { "unarchive" };
        let path = self.client.team_path(&format!("posts/{}/{}", self.id, action));
        send_empty(self.client, ctx, Method::PUT, &path).await
    }
}
