//! Post commands. Likes toggle through the feed controller, listing
//! supports the same local search the app offers.

use anyhow::Result;
use mingle_feed::PostFeed;

/// List posts, optionally narrowed by a local search query.
pub async fn list(
    query: Option<&str>,
    pages: usize,
    client_config_path: &std::path::Path,
) -> Result<()> {
    let api = super::connect(client_config_path).await?;
    let feed = PostFeed::new(api);

    feed.load_first_page().await.map_err(super::user_error)?;
    for _ in 1..pages {
        if !feed.load_next_page().await.map_err(super::user_error)? {
            break;
        }
    }
    if let Some(q) = query {
        feed.set_search_query(q);
    }

    let posts = feed.filtered_posts();
    if posts.is_empty() {
        match query {
            Some(q) => println!("No posts match \"{}\".", q),
            None => println!("No posts."),
        }
        return Ok(());
    }
    for p in &posts {
        let liked = if p.liked() { "*" } else { " " };
        println!(
            "{} {:4} {:16} {:40} [{}]",
            liked, p.likes_count, p.owner_name, p.title, p.id
        );
    }
    if feed.has_more() {
        println!("(more available; rerun with --pages)");
    }
    Ok(())
}

/// Toggle the like on a post.
pub async fn like(id: &str, client_config_path: &std::path::Path) -> Result<()> {
    let api = super::connect(client_config_path).await?;
    let feed = PostFeed::new(api);

    feed.load_first_page().await.map_err(super::user_error)?;
    while feed.posts().iter().all(|p| p.id != id) {
        if !feed.load_next_page().await.map_err(super::user_error)? {
            anyhow::bail!("Post {} not found.", id);
        }
    }

    feed.toggle_like(id).await.map_err(super::user_error)?;

    if let Some(p) = feed.posts().into_iter().find(|p| p.id == id) {
        let verb = if p.liked() { "Liked" } else { "Unliked" };
        println!("{} \"{}\" ({} likes).", verb, p.title, p.likes_count);
    }
    Ok(())
}
