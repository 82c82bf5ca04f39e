//! Simple CLI demo for the Livetodo synchronization engine.
//!
//! This demonstrates the full mirror loop against the in-memory store:
//! every mutation goes through the feed, and every printed list comes from
//! the snapshot-driven state - never from local bookkeeping.

use livetodo_core::todo::TodoId;
use livetodo_memory::MemoryStore;
use livetodo_runtime::error::MutationError;
use livetodo_runtime::{ListState, TodoFeed};
use std::sync::Arc;
use tokio::sync::watch;

/// Trim the input the way the add form does; empty input is skipped.
async fn add_trimmed(feed: &TodoFeed, input: &str) -> Result<Option<TodoId>, MutationError> {
    let title = input.trim();
    if title.is_empty() {
        return Ok(None);
    }
    feed.add(title).await.map(Some)
}

async fn wait_until(
    states: &mut watch::Receiver<ListState>,
    pred: impl Fn(&ListState) -> bool,
) -> Result<ListState, watch::error::RecvError> {
    let state = states.wait_for(|s| pred(s)).await?;
    Ok(state.clone())
}

fn render(state: &ListState) {
    for todo in &state.items {
        let status = if todo.completed { "✓" } else { " " };
        println!("  [{}] {}", status, todo.title);
    }
    if let Some(error) = &state.error {
        println!("  ! {error}");
    }
    println!(
        "  completed: {}/{}\n",
        state.completed_count(),
        state.count()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Livetodo Demo ===\n");

    let feed = TodoFeed::connect(Arc::new(MemoryStore::new()));
    let mut states = feed.watch_state();

    wait_until(&mut states, |s| !s.loading).await?;

    println!("Adding todos...");
    let milk = add_trimmed(&feed, "  Buy milk  ").await?;
    add_trimmed(&feed, "Write documentation").await?;
    let deploy = add_trimmed(&feed, "Deploy to production").await?;

    // Blank input never reaches the store.
    let skipped = add_trimmed(&feed, "   ").await?;
    assert!(skipped.is_none());

    let state = wait_until(&mut states, |s| s.count() == 3).await?;
    println!("\nTodos created:");
    render(&state);

    if let Some(id) = &milk {
        println!("Completing 'Buy milk'...");
        feed.toggle(id).await?;
        let state =
            wait_until(&mut states, |s| s.get(id).is_some_and(|t| t.completed)).await?;
        render(&state);
    }

    if let Some(id) = &deploy {
        println!("Deleting 'Deploy to production'...");
        feed.delete(id).await?;
        let state = wait_until(&mut states, |s| s.count() == 2).await?;
        println!("\nFinal todos:");
        render(&state);
    }

    feed.disconnect();
    println!("=== Demo Complete ===");
    Ok(())
}
