use crate::client::Client;
use crate::http::context::Context;
use crate::http::error::Error;
use crate::http::Response;
use crate::services::get_json;
use crate::types::Team;

/// Teams the token can access; not scoped to the client's domain.
pub struct Teams<'a> {
    client: &'a Client,
}

impl<'a> Teams<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn list(&self) -> TeamList<'a> {
        TeamList {
            client: self.client,
        }
    }
}

pub struct TeamList<'a> {
    client: &'a Client,
}

impl TeamList<'_> {
    pub async fn send(self, ctx: &Context) -> Result<(Vec<Team>, Response), Error> {
        get_json(self.client, ctx, "teams").await
    }
}
