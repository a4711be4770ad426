//! Message commands, driven through the feed controller the way the
//! app views drive it.

use anyhow::Result;
use mingle_feed::MessageFeed;

/// List messages in a circle, newest first.
pub async fn list(circle: &str, pages: usize, client_config_path: &std::path::Path) -> Result<()> {
    let api = super::connect(client_config_path).await?;
    let feed = MessageFeed::new(api, circle);

    feed.load_first_page().await.map_err(super::user_error)?;
    for _ in 1..pages {
        if !feed.load_next_page().await.map_err(super::user_error)? {
            break;
        }
    }

    let messages = feed.messages();
    if messages.is_empty() {
        println!("No messages in \"{}\".", circle);
        return Ok(());
    }
    for m in &messages {
        println!("{}  {:16} {}", m.id, m.owner_username, m.content);
    }
    if feed.has_more() {
        println!("(more available; rerun with --pages)");
    }
    Ok(())
}

/// Send a message to a circle.
pub async fn send(circle: &str, content: &str, client_config_path: &std::path::Path) -> Result<()> {
    let api = super::connect(client_config_path).await?;
    let feed = MessageFeed::new(api, circle);

    feed.set_draft_text(content);
    feed.submit_draft().await.map_err(super::user_error)?;

    println!("Sent to \"{}\".", circle);
    Ok(())
}

/// Edit a message you own.
pub async fn edit(
    circle: &str,
    id: &str,
    content: &str,
    client_config_path: &std::path::Path,
) -> Result<()> {
    let api = super::connect(client_config_path).await?;
    let feed = MessageFeed::new(api, circle);
    find_message(&feed, id).await?;

    feed.begin_edit(id);
    feed.set_draft_text(content);
    feed.submit_draft().await.map_err(super::user_error)?;

    println!("Message {} updated.", id);
    Ok(())
}

/// Delete a message you own, with confirmation.
pub async fn delete(
    circle: &str,
    id: &str,
    yes: bool,
    client_config_path: &std::path::Path,
) -> Result<()> {
    let api = super::connect(client_config_path).await?;
    let feed = MessageFeed::new(api, circle);
    find_message(&feed, id).await?;

    feed.request_delete(id);
    if !yes {
        eprint!("Delete message {}? [y/N]: ", id);
        let mut s = String::new();
        std::io::stdin().read_line(&mut s)?;
        if !s.trim().eq_ignore_ascii_case("y") {
            feed.cancel_delete();
            println!("Cancelled.");
            return Ok(());
        }
    }
    feed.confirm_delete().await.map_err(super::user_error)?;

    println!("Message {} deleted.", id);
    Ok(())
}

/// Page through the circle until the message is loaded.
async fn find_message(feed: &MessageFeed, id: &str) -> Result<()> {
    feed.load_first_page().await.map_err(super::user_error)?;
    while feed.messages().iter().all(|m| m.id != id) {
        if !feed.load_next_page().await.map_err(super::user_error)? {
            anyhow::bail!("Message {} not found in this circle.", id);
        }
    }
    Ok(())
}
