//! Interactive chat loop over a circle's message feed.
//!
//! Every action goes through the same [`MessageFeed`] controller the
//! one-shot commands use. The loop re-renders whenever the feed's
//! change signal fires, so edits and deletes show up in place.

use std::io::Write;

use anyhow::Result;
use mingle_feed::{MessageFeed, MessageFeedState};

pub async fn run(circle: &str, client_config_path: &std::path::Path) -> Result<()> {
    let api = super::connect(client_config_path).await?;
    if !api.session().is_signed_in() {
        anyhow::bail!("Not signed in. Run `mingle login` first.");
    }

    let feed = MessageFeed::new(api, circle);
    feed.load_first_page().await.map_err(super::user_error)?;
    let mut seen = feed.subscribe_changes();

    println!(
        "Joined \"{}\". /more for history, /edit <id>, /delete <id>, /quit to leave.",
        circle
    );
    render(&feed);
    seen.borrow_and_update();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            continue;
        } else if line == "/quit" {
            break;
        } else if line == "/more" {
            if !feed.load_next_page().await.unwrap_or(false) {
                println!("(no more history)");
            }
        } else if let Some(id) = line.strip_prefix("/edit ") {
            feed.begin_edit(id.trim());
            if matches!(feed.state(), MessageFeedState::Editing(_)) {
                print!("edit> ");
                std::io::stdout().flush()?;
                let mut text = String::new();
                std::io::stdin().read_line(&mut text)?;
                feed.set_draft_text(text.trim());
                let _ = feed.submit_draft().await;
            } else {
                println!("No message {} here.", id.trim());
            }
        } else if let Some(id) = line.strip_prefix("/delete ") {
            feed.request_delete(id.trim());
            if matches!(feed.state(), MessageFeedState::ConfirmingDelete(_)) {
                print!("Delete message {}? [y/N]: ", id.trim());
                std::io::stdout().flush()?;
                let mut s = String::new();
                std::io::stdin().read_line(&mut s)?;
                if s.trim().eq_ignore_ascii_case("y") {
                    let _ = feed.confirm_delete().await;
                } else {
                    feed.cancel_delete();
                }
            } else {
                println!("No message {} here.", id.trim());
            }
        } else if line.starts_with('/') {
            println!("Unknown command: {}", line);
        } else {
            feed.set_draft_text(line);
            let _ = feed.submit_draft().await;
        }

        if let MessageFeedState::Error(msg) = feed.state() {
            println!("! {}", msg);
            feed.dismiss_error();
        }
        if seen.has_changed().unwrap_or(false) {
            seen.borrow_and_update();
            render(&feed);
        }
    }

    println!("Left \"{}\".", circle);
    Ok(())
}

/// Print the loaded window oldest first, like a chat transcript.
fn render(feed: &MessageFeed) {
    for m in feed.messages().into_iter().rev() {
        let short = m.id.get(..8).unwrap_or(&m.id);
        println!("[{}] {:12} {}", short, m.owner_username, m.content);
    }
}
