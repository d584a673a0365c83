//! Per-resource operations. Each facade borrows the [`Client`]; each
//! operation is a builder that is configured by value and consumed by `send`.

mod attachments;
mod comments;
mod groups;
mod posts;
mod tags;
mod teams;
mod users;

pub use attachments::{AttachmentDownload, AttachmentUpload, Attachments};
pub use comments::{CommentCreate, CommentDelete, Comments};
pub use groups::{GroupAddUsers, GroupCreate, GroupGet, GroupList, GroupRemoveUsers, Groups};
pub use posts::{PostArchive, PostCreate, PostDelete, PostEdit, PostGet, PostList, Posts};
pub use tags::{TagList, Tags};
pub use teams::{TeamList, Teams};
pub use users::{UserList, Users};

use crate::client::Client;
use crate::http::context::Context;
use crate::http::error::Error;
use crate::http::{Response, Target};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// GET `path` and decode the JSON body into a `T`, starting from `T::default()`.
pub(crate) async fn get_json<T>(
    client: &Client,
    ctx: &Context,
    path: &str,
) -> Result<(T, Response), Error>
where
    T: DeserializeOwned + Default + Send,
{
    let req = client.new_request(Method::GET, path)?;
    let mut out = T::default();
    let resp = client.dispatch(&req, ctx, Target::Json(&mut out)).await?;
    Ok((out, resp))
}

/// Send `body` as JSON and decode the JSON answer into a `T`.
pub(crate) async fn send_json<B, T>(
    client: &Client,
    ctx: &Context,
    method: Method,
    path: &str,
    body: &B,
) -> Result<(T, Response), Error>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned + Default + Send,
{
    let req = client.new_json_request(method, path, body)?;
    let mut out = T::default();
    let resp = client.dispatch(&req, ctx, Target::Json(&mut out)).await?;
    Ok((out, resp))
}

/// Fire a request whose answer body is not needed.
pub(crate) async fn send_empty(
    client: &Client,
    ctx: &Context,
    method: Method,
    path: &str,
) -> Result<Response, Error> {
    let req = client.new_request(method, path)?;
    client.dispatch(&req, ctx, Target::Discard).await
}

/// Send `body` as JSON, ignoring whatever comes back.
pub(crate) async fn send_json_discard<B>(
    client: &Client,
    ctx: &Context,
    method: Method,
    path: &str,
    body: &B,
) -> Result<Response, Error>
where
    B: Serialize + ?Sized,
{
    let req = client.new_json_request(method, path, body)?;
    client.dispatch(&req, ctx, Target::Discard).await
}
