use clap::{Parser, Subcommand};
use docbase::types::{GroupId, PostId};
use docbase::{Client, Context, Response};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Parser)]
#[command(name = "docbase", version, about = "Query a DocBase team from the command line")]
pub struct Cli {
    /// Override RUST_LOG level (e.g., info, debug)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List teams the token can access
    Teams,
    /// List tags of the team
    Tags,
    /// List groups of the team
    Groups {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        per_page: Option<i64>,
    },
    /// Show one group with its members
    Group { id: i64 },
    /// List members of the team
    Users {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        include_user_groups: bool,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        per_page: Option<i64>,
    },
    /// Search posts
    Posts {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        per_page: Option<i64>,
    },
    /// Show one post
    Post { id: i64 },
}

pub fn init_logging(level: Option<&str>) {
    // Explicit level wins, then RUST_LOG, then info.
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    builder.init();
}

fn print_lines<T: Serialize>(items: &[T]) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    for item in items {
        writeln!(out, "{}", serde_json::to_string(item)?)?;
    }
    out.flush()?;
    Ok(())
}

pub async fn run(client: &Client, ctx: &Context, command: Command) -> anyhow::Result<Response> {
    let resp = match command {
        Command::Teams => {
            let (teams, resp) = client.teams().list().send(ctx).await?;
            print_lines(&teams)?;
            resp
        }
        Command::Tags => {
            let (tags, resp) = client.tags().list().send(ctx).await?;
            print_lines(&tags)?;
            resp
        }
        Command::Groups {
            name,
            page,
            per_page,
        } => {
            let mut op = client.groups().list();
            if let Some(name) = name {
                op = op.name(name);
            }
            if let Some(page) = page {
                op = op.page(page);
            }
            if let Some(per_page) = per_page {
                op = op.per_page(per_page);
            }
            let (groups, resp) = op.send(ctx).await?;
            print_lines(&groups)?;
            resp
        }
        Command::Group { id } => {
            let (group, resp) = client.groups().get(GroupId(id)).send(ctx).await?;
            print_lines(&[group])?;
            resp
        }
        Command::Users {
            query,
            include_user_groups,
            page,
            per_page,
        } => {
            let mut op = client.users().list();
            if let Some(q) = query {
                op = op.query(q);
            }
            if include_user_groups {
                op = op.include_user_groups(true);
            }
            if let Some(page) = page {
                op = op.page(page);
            }
            if let Some(per_page) = per_page {
                op = op.per_page(per_page);
            }
            let (users, resp) = op.send(ctx).await?;
            print_lines(&users)?;
            resp
        }
        Command::Posts {
            query,
            page,
            per_page,
        } => {
            let mut op = client.posts().list();
            if let Some(q) = query {
                op = op.query(q);
            }
            if let Some(page) = page {
                op = op.page(page);
            }
            if let Some(per_page) = per_page {
                op = op.per_page(per_page);
            }
            let (posts, resp) = op.send(ctx).await?;
            print_lines(&posts)?;
            resp
        }
        Command::Post { id } => {
            let (post, resp) = client.posts().get(PostId(id)).send(ctx).await?;
            print_lines(&[post])?;
            resp
        }
    };
    Ok(resp)
}
