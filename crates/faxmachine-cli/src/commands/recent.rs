//! Recent command handler

use anyhow::Result;
use tracing::debug;

use faxmachine_core::{Entry, EntryKey, Store};

use crate::commands::inject::prompt_pick;
use crate::output::Output;

/// Show the recently accessed entries and offer to inject or view one
pub fn list(store: &mut Store, output: &Output) -> Result<()> {
    let entries: Vec<Entry> = store
        .recent()
        .iter()
        .filter_map(|key| match store.get(key) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping recent entry {}: {}", key, e);
                None
            }
        })
        .collect();

    if output.should_prompt() && !entries.is_empty() {
        println!("── Recently accessed files ──");
    }
    output.print_recent(&entries);

    let keys: Vec<EntryKey> = entries.into_iter().map(|e| e.key).collect();
    prompt_pick(store, &keys, None, output)
}
