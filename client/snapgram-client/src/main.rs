//! `snapgram` command line driver
//!
//! ```text
//! snapgram [--config FILE] feed [PAGES]
//! snapgram [--config FILE] search TERM
//! snapgram [--config FILE] users [LIMIT]
//! snapgram [--config FILE] whoami
//! snapgram [--config FILE] sign-in EMAIL PASSWORD
//! snapgram [--config FILE] sign-out
//! ```

use anyhow::{bail, Context};
use appwrite_facade::{PostDocument, UserDocument};
use config_core::ClientConfig;
use snapgram_client::{
    ExploreView, Navigator, Notifier, Route, SigninForm, SnapgramApp,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!(?route, "Navigate");
    }
}

struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

enum Command {
    Feed { pages: usize },
    Search { term: String },
    Users { limit: Option<u32> },
    WhoAmI,
    SignIn { email: String, password: String },
    SignOut,
}

fn parse_args(mut args: Vec<String>) -> anyhow::Result<(Option<PathBuf>, Command)> {
    let mut config_path = None;
    if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            bail!("--config requires a file path");
        }
        config_path = Some(PathBuf::from(args.remove(1)));
        args.remove(0);
    }

    let mut args = args.into_iter();
    let command = match args.next().as_deref() {
        None | Some("feed") => Command::Feed {
            pages: args
                .next()
                .map(|p| p.parse().context("PAGES must be a number"))
                .transpose()?
                .unwrap_or(1),
        },
        Some("search") => Command::Search {
            term: args.collect::<Vec<_>>().join(" "),
        },
        Some("users") => Command::Users {
            limit: args
                .next()
                .map(|l| l.parse().context("LIMIT must be a number"))
                .transpose()?,
        },
        Some("whoami") => Command::WhoAmI,
        Some("sign-in") => match (args.next(), args.next()) {
            (Some(email), Some(password)) => Command::SignIn { email, password },
            _ => bail!("usage: snapgram sign-in EMAIL PASSWORD"),
        },
        Some("sign-out") => Command::SignOut,
        Some(other) => bail!("unknown command: {other}"),
    };
    Ok((config_path, command))
}

fn print_post(post: &PostDocument) {
    let creator = post
        .creator
        .document()
        .map(|user| user.username.as_str())
        .unwrap_or_else(|| post.creator.id());
    println!(
        "{}  @{}  {}  [{}]  likes={}",
        post.id,
        creator,
        post.caption,
        post.tags.join(","),
        post.likes.len()
    );
}

fn print_user(user: &UserDocument) {
    println!("{}  @{}  {}  {}", user.id, user.username, user.name, user.email);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,snapgram=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (config_path, command) = parse_args(std::env::args().skip(1).collect())?;
    let config =
        ClientConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    let app = SnapgramApp::from_config(config, Arc::new(LogNavigator), Arc::new(StderrNotifier))
        .context("Failed to build backend client")?;

    if let Command::SignIn { email, password } = &command {
        let user = app
            .session()
            .sign_in(SigninForm {
                email: email.clone(),
                password: password.clone(),
            })
            .await?;
        println!("Signed in as @{}", user.username);
        return Ok(());
    }

    let authenticated = app.session().bootstrap().await;
    tracing::debug!(authenticated, "Session bootstrapped");

    match command {
        Command::Feed { pages } => {
            let explore = app.explore();
            let mut view = explore.load().await?;
            for _ in 1..pages {
                if !explore.on_visibility(true).await? {
                    break;
                }
                view = explore.view();
            }
            match view {
                ExploreView::Feed {
                    posts,
                    has_next_page,
                } => {
                    posts.iter().for_each(print_post);
                    if has_next_page {
                        println!("...");
                    }
                }
                ExploreView::EndOfPosts => println!("End of posts"),
                ExploreView::Loading | ExploreView::SearchResults { .. } => {}
            }
        }
        Command::Search { term } => {
            if term.is_empty() {
                bail!("usage: snapgram search TERM");
            }
            let page = app.queries().search_posts(&term).run().await;
            match page {
                Some(Ok(page)) if page.is_empty() => println!("No results found"),
                Some(Ok(page)) => page.documents.iter().for_each(print_post),
                Some(Err(e)) => return Err(e.into()),
                None => {}
            }
        }
        Command::Users { limit } => {
            if let Some(result) = app.queries().users(limit).run().await {
                result?.documents.iter().for_each(print_user);
            }
        }
        Command::WhoAmI => match app.session().user() {
            Some(user) => println!("@{} ({})", user.username, user.email),
            None => println!("Not signed in"),
        },
        Command::SignOut => {
            app.session().sign_out().await?;
            println!("Signed out");
        }
        Command::SignIn { .. } => {}
    }

    Ok(())
}
