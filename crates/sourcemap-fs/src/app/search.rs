//! Wildcard symbol search over the original sources of a dataset.
//!
//! Sourcemaps record where a line *starts* being mapped into the output, never where the
//! mapping stops. Everything from the earliest mapped column of a line onwards is therefore
//! treated as shipped; text before it is treated as dead. This over-approximates: it can
//! report false positives but never misses a shipped token.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::app::dataset::{Dataset, Store};
use crate::app::intersect::intersect;
use crate::app::loader::{SourceRules, load_mappings};
use crate::domain::model::{Mapping, ModuleId, SymbolRef};
use crate::infra::decoder::MappingDecoder;

/// What a `*` in a user pattern expands to.
const WILDCARD: &str = "[a-z0-9_$]*";

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r\n|[\n\x0B\x0C\r\x{85}\x{2028}\x{2029}]").expect("line break pattern")
});

/// Compile a user pattern. Blank patterns compile to `None`.
///
/// Everything is literal except `*`, which matches a run of identifier characters. Matching
/// is case-insensitive and unanchored.
pub fn compile_pattern(raw: &str) -> Result<Option<Regex>, regex::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let pattern = trimmed
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(WILDCARD);
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(Some)
}

/// Minimum original column per original line.
pub fn earliest_mapped_columns(mappings: &[Mapping]) -> BTreeMap<u32, u32> {
    let mut earliest = BTreeMap::new();
    for mapping in mappings {
        earliest
            .entry(mapping.original_line)
            .and_modify(|column: &mut u32| *column = (*column).min(mapping.original_column))
            .or_insert(mapping.original_column);
    }
    earliest
}

/// Split on every Unicode line terminator, treating `\r\n` as one.
pub fn split_lines(text: &str) -> Vec<&str> {
    LINE_BREAK.split(text).collect()
}

/// Text around one match, clipped to the configured number of characters per side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    pub before: String,
    pub matched: String,
    pub after: String,
}

impl MatchContext {
    fn around(line: &str, start: usize, end: usize, chars: usize) -> Self {
        let before = &line[..start];
        let skip = before.chars().count().saturating_sub(chars);
        Self {
            before: before.chars().skip(skip).collect(),
            matched: line[start..end].to_owned(),
            after: line[end..].chars().take(chars).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub symbol: SymbolRef,
    pub context: MatchContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub pattern: String,
    pub hits: Vec<SearchHit>,
    /// Narrowed dataset the user can proceed into.
    pub dataset: Dataset,
    /// Total length of the distinct source lines that matched.
    pub matched_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    NoMatches { pattern: String },
    Matches(SearchResults),
}

impl SearchOutcome {
    /// Dataset to proceed into; absent when nothing matched.
    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            SearchOutcome::Matches(results) => Some(&results.dataset),
            SearchOutcome::NoMatches { .. } => None,
        }
    }
}

/// Collaborators needed to run a search.
pub struct SearchContext<'a> {
    pub decoder: &'a dyn MappingDecoder,
    pub rules: &'a SourceRules,
    pub context_chars: usize,
}

/// Search `parent` for `pattern`, loading mappings for its chunks first.
///
/// Returns `Ok(None)` for a blank pattern so the caller can keep its previous results.
pub fn search(
    store: &mut Store,
    parent: &Dataset,
    pattern: &str,
    ctx: &SearchContext<'_>,
) -> Result<Option<SearchOutcome>, regex::Error> {
    let Some(regex) = compile_pattern(pattern)? else {
        return Ok(None);
    };

    load_mappings(store, &parent.chunks, ctx.decoder, ctx.rules);

    let (hits, matched_bytes) = find_hits(store, &parent.modules, &regex, ctx.context_chars);
    tracing::debug!(pattern = pattern.trim(), hits = hits.len(), "symbol search");
    let pattern = pattern.trim().to_owned();
    if hits.is_empty() {
        return Ok(Some(SearchOutcome::NoMatches { pattern }));
    }

    let mut modules: Vec<ModuleId> = hits.iter().map(|hit| hit.symbol.module).collect();
    modules.dedup();
    let owning_chunks: Vec<_> = modules
        .iter()
        .flat_map(|module| store.module(*module).chunks.iter().copied())
        .collect();
    let chunks = intersect(&parent.chunks, &owning_chunks);
    let symbols = hits.iter().map(|hit| hit.symbol).collect();

    Ok(Some(SearchOutcome::Matches(SearchResults {
        pattern,
        dataset: Dataset::narrowed(chunks, modules, symbols),
        hits,
        matched_bytes,
    })))
}

/// Matches of `regex` at or after each line's earliest mapped column, in module order.
pub fn find_hits(
    store: &Store,
    modules: &[ModuleId],
    regex: &Regex,
    context_chars: usize,
) -> (Vec<SearchHit>, usize) {
    let mut hits = Vec::new();
    let mut matched_bytes = 0;

    for &module_id in modules {
        let module = store.module(module_id);
        let Some(source) = module.source.as_deref() else {
            continue;
        };
        if module.mappings.is_empty() {
            continue;
        }

        let lines = split_lines(source);
        for (line_number, earliest) in earliest_mapped_columns(&module.mappings) {
            let Some(line) = lines.get(line_number as usize) else {
                continue;
            };

            let before = hits.len();
            for found in regex.find_iter(line) {
                let column = utf16_column(line, found.start());
                if column < earliest {
                    continue;
                }
                hits.push(SearchHit {
                    symbol: SymbolRef {
                        module: module_id,
                        line: line_number,
                        column,
                    },
                    context: MatchContext::around(
                        line,
                        found.start(),
                        found.end(),
                        context_chars,
                    ),
                });
            }
            if hits.len() > before {
                matched_bytes += line.len();
            }
        }
    }

    (hits, matched_bytes)
}

fn utf16_column(line: &str, byte_offset: usize) -> u32 {
    line[..byte_offset].encode_utf16().count() as u32
}
