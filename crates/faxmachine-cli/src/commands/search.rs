//! Search command handler

use anyhow::{bail, Result};

use faxmachine_core::{EntryKey, SearchQuery, Store};

use crate::commands::entry;
use crate::commands::inject::{inject_key, nth_key, prompt_pick};
use crate::output::Output;

/// Arguments for `search`
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    pub query: String,
    pub content: bool,
    pub no_content: bool,
    pub tags: Option<String>,
    pub list_only: bool,
    pub show_index: Option<usize>,
    pub inject_index: Option<usize>,
    pub delete_index: Option<usize>,
    pub name: Option<String>,
}

impl SearchArgs {
    /// Build the core query, defaulting content search to the config
    fn to_query(&self, search_content: bool) -> SearchQuery {
        let content = if self.content {
            true
        } else if self.no_content {
            false
        } else {
            search_content
        };

        let query = SearchQuery::new(self.query.clone()).with_content(content);
        match &self.tags {
            Some(tags) => query.with_tag_filter(tags),
            None => query,
        }
    }
}

/// Search the database and act on the results
pub fn search(store: &mut Store, args: SearchArgs, output: &Output) -> Result<()> {
    let query = args.to_query(store.config().search_content);
    let hits = store.search(&query)?;
    let keys: Vec<EntryKey> = hits.iter().map(|h| h.key.clone()).collect();

    if let Some(index) = args.show_index {
        let key = nth_key(&keys, index)?.clone();
        return entry::show_key(store, &key, output);
    }
    if let Some(index) = args.inject_index {
        let key = nth_key(&keys, index)?.clone();
        return inject_key(store, &key, args.name, true, false, output);
    }
    if let Some(index) = args.delete_index {
        let key = nth_key(&keys, index)?.clone();
        return entry::delete_key(store, &key, output);
    }

    if hits.is_empty() {
        if output.is_json() {
            output.print_hits(&hits);
            return Ok(());
        }
        bail!("No files matching '{}' found", args.query);
    }

    if args.list_only {
        output.print_hits(&hits);
        return Ok(());
    }

    if output.should_prompt() {
        println!("── Search results for '{}' ──", args.query);
    }
    output.print_hits(&hits);
    prompt_pick(store, &keys, args.name, output)
}
