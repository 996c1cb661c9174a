//! Memory CLI commands: remember, recall, count.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use recollect_types::memory::{DEFAULT_MEMORY_TYPE, MemoryHit};

use crate::state::AppState;

const TEXT_PREVIEW_CHARS: usize = 60;

/// Store `texts` for `owner`.
///
/// # Examples
///
/// ```bash
/// rcl remember alice "I want to save more money" "I am anxious about exams"
/// rcl remember alice "run a 10k" --type goal
/// ```
pub async fn remember(
    state: &AppState,
    owner: &str,
    texts: &[String],
    memory_type: Option<&str>,
    json: bool,
) -> Result<()> {
    let store = state.open_store(!json).await?;
    let inserted = store.insert_memories(texts, owner, memory_type).await?;

    if json {
        let out = serde_json::json!({
            "owner": owner,
            "inserted": inserted,
            "memory_type": memory_type.unwrap_or(DEFAULT_MEMORY_TYPE),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "  {} Stored {} memor{} for '{}'",
            style("*").green().bold(),
            style(inserted).bold(),
            if inserted == 1 { "y" } else { "ies" },
            style(owner).cyan()
        );
    }

    Ok(())
}

/// Search `owner`'s memories for the ones closest to `query`.
///
/// # Examples
///
/// ```bash
/// rcl recall alice "saving money"
/// rcl recall alice "saving money" -k 5 --json
/// ```
pub async fn recall(
    state: &AppState,
    owner: &str,
    query: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let store = state.open_store(!json).await?;
    let hits = store.search_memory(query, owner, top_k).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!();
        println!(
            "  {} No memories for '{}'.",
            style("i").blue().bold(),
            style(owner).cyan(),
        );
        println!();
        return Ok(());
    }

    println!();
    println!(
        "  Memories for '{}' closest to \"{}\"",
        style(owner).cyan().bold(),
        query
    );
    println!();
    println!("{}", hits_table(&hits));
    println!();

    Ok(())
}

/// Print how many memories `owner` has.
pub async fn count(state: &AppState, owner: &str, json: bool) -> Result<()> {
    let store = state.open_store(!json).await?;
    let total = store.count_memories(owner).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({"owner": owner, "count": total}))?
        );
    } else {
        println!(
            "  '{}' has {} memor{}",
            style(owner).cyan(),
            style(total).bold(),
            if total == 1 { "y" } else { "ies" }
        );
    }

    Ok(())
}

fn hits_table(hits: &[MemoryHit]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Distance").fg(Color::White),
        Cell::new("Text").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Time").fg(Color::White),
    ]);

    for hit in hits {
        let time = hit
            .recorded_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| hit.timestamp.to_string());

        table.add_row(vec![
            Cell::new(short_id(hit)).fg(Color::DarkGrey),
            Cell::new(format!("{:.4}", hit.distance)).fg(Color::Yellow),
            Cell::new(preview(&hit.text)).fg(Color::White),
            Cell::new(&hit.memory_type).fg(Color::Magenta),
            Cell::new(time).fg(Color::DarkGrey),
        ]);
    }

    table
}

fn short_id(hit: &MemoryHit) -> String {
    hit.record_id.0.to_string().chars().take(8).collect()
}

fn preview(text: &str) -> String {
    if text.chars().count() > TEXT_PREVIEW_CHARS {
        let head: String = text.chars().take(TEXT_PREVIEW_CHARS - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
