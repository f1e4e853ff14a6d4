//! Sourcemap directory loading and lazy mapping parsing.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use serde::Deserialize;

use crate::app::dataset::{Dataset, Progress, Store};
use crate::domain::errors::LoadError;
use crate::domain::model::{ChunkId, Mapping, ModuleId};
use crate::infra::config::LoaderConfig;
use crate::infra::decoder::MappingDecoder;

/// Compiled source classification rules.
#[derive(Debug, Clone)]
pub struct SourceRules {
    extension: String,
    strip_prefixes: Vec<String>,
    exclude: GlobSet,
    third_party: GlobSet,
}

impl SourceRules {
    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        let mut strip_prefixes = config.strip_prefixes.clone();
        // Longest prefix wins when several apply.
        strip_prefixes.sort_by_key(|prefix| std::cmp::Reverse(prefix.len()));

        Ok(Self {
            extension: config.extension(),
            strip_prefixes,
            exclude: build_globs(&config.exclude_sources).context("invalid exclude_sources glob")?,
            third_party: build_globs(&config.third_party).context("invalid third_party glob")?,
        })
    }

    pub fn is_sourcemap(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&self.extension))
    }

    /// Display path for a raw `sources` entry.
    pub fn normalize(&self, raw: &str) -> String {
        self.strip_prefixes
            .iter()
            .find_map(|prefix| raw.strip_prefix(prefix.as_str()))
            .unwrap_or(raw)
            .to_owned()
    }

    /// Sources that never become modules (stylesheets by default).
    pub fn is_excluded(&self, raw: &str) -> bool {
        self.exclude.is_match(raw)
    }

    pub fn is_third_party(&self, raw: &str) -> bool {
        self.third_party.is_match(raw)
    }
}

fn build_globs(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob '{pattern}'"))?);
    }
    Ok(builder.build()?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    #[serde(default)]
    sources: Vec<Option<String>>,
    #[serde(default)]
    sources_content: Option<Vec<Option<String>>>,
    #[serde(default)]
    file: Option<String>,
}

fn parse_sourcemap(path: &Path, text: &str) -> Result<RawSourceMap, LoadError> {
    let map: RawSourceMap = serde_json::from_str(text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(contents) = &map.sources_content
        && contents.len() != map.sources.len()
    {
        return Err(LoadError::MalformedSourcemap {
            path: path.to_path_buf(),
            sources: map.sources.len(),
            contents: contents.len(),
        });
    }
    Ok(map)
}

/// Result of one [`DatasetLoader::step`].
#[derive(Debug)]
pub struct LoadStep {
    pub progress: Progress,
    /// Failure of the file processed in this step; other files are unaffected.
    pub error: Option<LoadError>,
    pub finished: bool,
}

/// Incrementally fills a dataset from a directory of sourcemaps, one file per step.
#[derive(Debug)]
pub struct DatasetLoader {
    pending: VecDeque<PathBuf>,
    total: usize,
    processed: usize,
    finished: bool,
    rules: SourceRules,
}

impl DatasetLoader {
    /// List the sourcemaps directly inside `dir`, in sorted order.
    pub fn discover(dir: &Path, rules: SourceRules) -> Result<Self, LoadError> {
        let read_dir_err = |source| LoadError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_dir_err)? {
            let path = entry.map_err(read_dir_err)?.path();
            if path.is_file() && rules.is_sourcemap(&path) {
                files.push(path);
            }
        }
        files.sort();
        tracing::info!(dir = %dir.display(), files = files.len(), "discovered sourcemaps");

        Ok(Self {
            total: files.len(),
            pending: files.into(),
            processed: 0,
            finished: false,
            rules,
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn rules(&self) -> &SourceRules {
        &self.rules
    }

    /// Load the next file into `dataset`. Returns `None` once loading has completed.
    ///
    /// The step that consumes the last file also sorts the dataset and marks it loaded.
    pub fn step(&mut self, store: &mut Store, dataset: &mut Dataset) -> Option<LoadStep> {
        if self.finished {
            return None;
        }

        let mut error = None;
        if let Some(path) = self.pending.pop_front() {
            self.processed += 1;
            if let Err(err) = self.load_file(&path, store, dataset) {
                tracing::warn!(path = %path.display(), error = %err, "skipping sourcemap");
                error = Some(err);
            }
        }

        let progress = Progress {
            processed: self.processed,
            total: self.total,
        };
        dataset.progress = Some(progress);

        let finished = self.pending.is_empty();
        if finished {
            dataset.sort_by_path(store);
            dataset.loaded = true;
            dataset.progress = None;
            self.finished = true;
            tracing::info!(
                chunks = dataset.chunks.len(),
                modules = dataset.modules.len(),
                "dataset loaded"
            );
        }

        Some(LoadStep {
            progress,
            error,
            finished,
        })
    }

    /// Run every remaining step, returning the per-file failures.
    pub fn load_all(&mut self, store: &mut Store, dataset: &mut Dataset) -> Vec<LoadError> {
        let mut failures = Vec::new();
        while let Some(step) = self.step(store, dataset) {
            failures.extend(step.error);
        }
        failures
    }

    fn load_file(
        &self,
        path: &Path,
        store: &mut Store,
        dataset: &mut Dataset,
    ) -> Result<ChunkId, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let map = parse_sourcemap(path, &text)?;

        let chunk = store.add_chunk(path.to_path_buf());
        let mut contents = map.sources_content.unwrap_or_default();
        for (index, raw) in map.sources.iter().enumerate() {
            let Some(raw) = raw else { continue };
            if self.rules.is_excluded(raw) {
                continue;
            }
            let source = contents.get_mut(index).and_then(Option::take);
            let (module, created) = store.link_module(chunk, raw, self.rules.normalize(raw), source);
            if created {
                dataset.modules.push(module);
            }
        }
        dataset.chunks.push(chunk);

        tracing::debug!(
            path = %path.display(),
            file = map.file.as_deref().unwrap_or("-"),
            modules = store.chunk(chunk).modules.len(),
            "loaded chunk"
        );
        Ok(chunk)
    }
}

/// Counters from one [`load_mappings`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingStats {
    pub chunks: usize,
    pub mappings: usize,
    pub skipped_excluded: usize,
    pub skipped_third_party: usize,
    pub skipped_unresolved: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
struct ChunkMappings {
    mappings: Vec<(ModuleId, Mapping)>,
    skipped_excluded: usize,
    skipped_third_party: usize,
    skipped_unresolved: usize,
}

/// Parse the mappings of every chunk in `chunks` that has not been parsed yet.
///
/// Each chunk is attempted at most once per session, even if it fails. Files are read and
/// decoded in parallel; the resulting mappings are appended to their modules chunk by chunk.
/// Mappings whose source has no module are skipped: sourcemaps are often incomplete.
pub fn load_mappings(
    store: &mut Store,
    chunks: &[ChunkId],
    decoder: &dyn MappingDecoder,
    rules: &SourceRules,
) -> MappingStats {
    let pending: Vec<(ChunkId, PathBuf)> = chunks
        .iter()
        .copied()
        .filter(|id| !store.chunk(*id).mappings_loaded)
        .map(|id| (id, store.chunk(id).path.clone()))
        .collect();
    if pending.is_empty() {
        return MappingStats::default();
    }
    for (id, _) in &pending {
        store.chunk_mut(*id).mappings_loaded = true;
    }

    let lookup: &Store = store;
    let decoded: Vec<(ChunkId, Result<ChunkMappings, LoadError>)> = pending
        .par_iter()
        .map(|(id, path)| (*id, decode_chunk(lookup, path, decoder, rules)))
        .collect();

    let mut stats = MappingStats::default();
    for (id, result) in decoded {
        match result {
            Ok(chunk) => {
                stats.chunks += 1;
                stats.mappings += chunk.mappings.len();
                stats.skipped_excluded += chunk.skipped_excluded;
                stats.skipped_third_party += chunk.skipped_third_party;
                stats.skipped_unresolved += chunk.skipped_unresolved;
                for (module, mapping) in chunk.mappings {
                    store.module_mut(module).mappings.push(mapping);
                }
            }
            Err(err) => {
                tracing::warn!(chunk = %store.chunk(id).name, error = %err, "mapping load failed");
                stats.failed += 1;
            }
        }
    }

    tracing::debug!(
        chunks = stats.chunks,
        mappings = stats.mappings,
        skipped_third_party = stats.skipped_third_party,
        skipped_unresolved = stats.skipped_unresolved,
        "mappings loaded"
    );
    stats
}

fn decode_chunk(
    store: &Store,
    path: &Path,
    decoder: &dyn MappingDecoder,
    rules: &SourceRules,
) -> Result<ChunkMappings, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut out = ChunkMappings::default();
    decoder.for_each_mapping(path, &bytes, &mut |decoded| {
        let Some(source) = decoded.source else { return };
        if rules.is_excluded(source) {
            out.skipped_excluded += 1;
            return;
        }
        match store.module_by_raw_path(source) {
            Some(module) => out.mappings.push((
                module,
                Mapping {
                    generated_line: decoded.generated_line.saturating_sub(1),
                    generated_column: decoded.generated_column,
                    original_line: decoded.original_line.saturating_sub(1),
                    original_column: decoded.original_column,
                    name: decoded.name.map(str::to_owned),
                },
            )),
            None if rules.is_third_party(source) => out.skipped_third_party += 1,
            None => out.skipped_unresolved += 1,
        }
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::app::search::{SearchContext, SearchOutcome, search};
    use crate::infra::decoder::{DecodedMapping, SourcemapDecoder};

    fn rules() -> SourceRules {
        SourceRules::from_config(&LoaderConfig::default()).expect("default rules")
    }

    fn write(dir: &Path, name: &str, json: &str) {
        fs::write(dir.join(name), json).expect("write fixture");
    }

    #[test]
    fn normalizes_and_classifies_sources() {
        let rules = rules();
        assert_eq!(rules.normalize("webpack:///src/x.js"), "src/x.js");
        assert_eq!(rules.normalize("src/x.js"), "src/x.js");
        assert!(rules.is_excluded("webpack:///src/styles/app.css"));
        assert!(!rules.is_excluded("webpack:///src/app.js"));
        assert!(rules.is_third_party("webpack:///./node_modules/react/index.js"));
        assert!(!rules.is_third_party("webpack:///src/app.js"));
    }

    #[test]
    fn loads_shared_modules_across_chunks() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "b.js.map", r#"{"version":3,"sources":["webpack:///src/x.js","webpack:///src/y.js"],"mappings":""}"#);
        write(temp.path(), "a.js.map", r#"{"version":3,"sources":["webpack:///src/x.js"],"mappings":""}"#);
        write(temp.path(), "notes.txt", "ignored");

        let mut store = Store::new();
        let mut dataset = Dataset::loading();
        let mut loader = DatasetLoader::discover(temp.path(), rules()).unwrap();
        assert_eq!(loader.total(), 2);

        let first = loader.step(&mut store, &mut dataset).unwrap();
        assert_eq!(first.progress, Progress { processed: 1, total: 2 });
        assert!(!first.finished);
        assert!(!dataset.loaded);
        // Sorted discovery: a.js.map comes first.
        assert_eq!(store.chunk(dataset.chunks[0]).name, "a.js.map");

        assert_eq!(dataset.progress, Some(Progress { processed: 1, total: 2 }));

        let last = loader.step(&mut store, &mut dataset).unwrap();
        assert!(last.finished);
        assert!(dataset.loaded);
        assert_eq!(dataset.progress, None);
        assert!(loader.step(&mut store, &mut dataset).is_none());

        assert_eq!(dataset.chunks.len(), 2);
        let paths: Vec<_> = dataset
            .modules
            .iter()
            .map(|id| store.module(*id).path.as_str())
            .collect();
        assert_eq!(paths, vec!["src/x.js", "src/y.js"]);
        assert_eq!(store.module(dataset.modules[0]).chunks.len(), 2);
        assert_eq!(store.module(dataset.modules[1]).chunks.len(), 1);
    }

    #[test]
    fn drops_css_and_null_sources() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "main.js.map",
            r#"{"version":3,"sources":["webpack:///src/a.css",null,"webpack:///src/a.js"],"sourcesContent":["body{}",null,"let a;"],"mappings":""}"#,
        );
        let mut store = Store::new();
        let mut dataset = Dataset::loading();
        let failures = DatasetLoader::discover(temp.path(), rules())
            .unwrap()
            .load_all(&mut store, &mut dataset);
        assert!(failures.is_empty());
        assert_eq!(dataset.modules.len(), 1);
        let module = store.module(dataset.modules[0]);
        assert_eq!(module.path, "src/a.js");
        assert_eq!(module.source.as_deref(), Some("let a;"));
    }

    #[test]
    fn malformed_file_does_not_stop_others() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "a.js.map",
            r#"{"version":3,"sources":["x.js","y.js"],"sourcesContent":["only one"],"mappings":""}"#,
        );
        write(temp.path(), "b.js.map", r#"{"version":3,"sources":["z.js"],"mappings":""}"#);
        write(temp.path(), "c.js.map", "{ not json");

        let mut store = Store::new();
        let mut dataset = Dataset::loading();
        let failures = DatasetLoader::discover(temp.path(), rules())
            .unwrap()
            .load_all(&mut store, &mut dataset);

        assert_eq!(failures.len(), 2);
        assert!(matches!(
            failures[0],
            LoadError::MalformedSourcemap { sources: 2, contents: 1, .. }
        ));
        assert!(matches!(failures[1], LoadError::Json { .. }));
        assert!(dataset.loaded);
        assert_eq!(dataset.chunks.len(), 1);
        assert_eq!(store.module(dataset.modules[0]).path, "z.js");
    }

    #[test]
    fn empty_directory_finishes_in_one_step() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = Store::new();
        let mut dataset = Dataset::loading();
        let mut loader = DatasetLoader::discover(temp.path(), rules()).unwrap();
        let step = loader.step(&mut store, &mut dataset).unwrap();
        assert!(step.finished);
        assert_eq!(step.progress.percent(), 100);
        assert!(dataset.loaded);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = DatasetLoader::discover(&temp.path().join("nope"), rules()).unwrap_err();
        assert!(matches!(err, LoadError::ReadDir { .. }));
    }

    /// Reports a fixed set of mappings and counts how often it runs.
    struct FakeDecoder {
        calls: AtomicUsize,
        mappings: Vec<(&'static str, u32, u32)>,
    }

    impl MappingDecoder for FakeDecoder {
        fn for_each_mapping(
            &self,
            _path: &Path,
            _text: &[u8],
            callback: &mut dyn FnMut(DecodedMapping<'_>),
        ) -> Result<(), LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for (source, line, column) in &self.mappings {
                callback(DecodedMapping {
                    source: Some(*source),
                    generated_line: 1,
                    generated_column: 0,
                    original_line: *line,
                    original_column: *column,
                    name: None,
                });
            }
            Ok(())
        }
    }

    fn single_chunk(sources: &str, mappings: &str) -> (tempfile::TempDir, Store, Dataset) {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "main.js.map",
            &format!(r#"{{"version":3,"sources":{sources},"names":[],"mappings":"{mappings}"}}"#),
        );
        let mut store = Store::new();
        let mut dataset = Dataset::loading();
        DatasetLoader::discover(temp.path(), rules())
            .unwrap()
            .load_all(&mut store, &mut dataset);
        (temp, store, dataset)
    }

    #[test]
    fn mapping_load_converts_lines_and_skips_unresolved() {
        let (_temp, mut store, dataset) = single_chunk(r#"["webpack:///src/a.js"]"#, "");
        let decoder = FakeDecoder {
            calls: AtomicUsize::new(0),
            mappings: vec![
                ("webpack:///src/a.js", 3, 7),
                ("webpack:///src/a.css", 1, 0),
                ("webpack:///./node_modules/lib/index.js", 1, 0),
                ("webpack:///src/missing.js", 1, 0),
            ],
        };

        let stats = load_mappings(&mut store, &dataset.chunks, &decoder, &rules());
        assert_eq!(stats.mappings, 1);
        assert_eq!(stats.skipped_excluded, 1);
        assert_eq!(stats.skipped_third_party, 1);
        assert_eq!(stats.skipped_unresolved, 1);

        let module = store.module(dataset.modules[0]);
        assert_eq!(module.mappings.len(), 1);
        assert_eq!(module.mappings[0].original_line, 2);
        assert_eq!(module.mappings[0].original_column, 7);
        assert_eq!(module.mappings[0].generated_line, 0);
        assert!(store.chunk(dataset.chunks[0]).mappings_loaded);
    }

    #[test]
    fn mapping_load_runs_once_per_chunk() {
        let (_temp, mut store, dataset) = single_chunk(r#"["src/a.js"]"#, "");
        let decoder = FakeDecoder {
            calls: AtomicUsize::new(0),
            mappings: vec![("src/a.js", 1, 0)],
        };

        load_mappings(&mut store, &dataset.chunks, &decoder, &rules());
        let again = load_mappings(&mut store, &dataset.chunks, &decoder, &rules());

        assert_eq!(again, MappingStats::default());
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.module(dataset.modules[0]).mappings.len(), 1);
    }

    #[test]
    fn real_decoder_reads_vlq_mappings() {
        let (_temp, mut store, dataset) = single_chunk(r#"["src/a.js"]"#, "AAAA,IAAI");
        let stats = load_mappings(&mut store, &dataset.chunks, &SourcemapDecoder, &rules());
        assert_eq!(stats.failed, 0);
        let columns: Vec<u32> = store
            .module(dataset.modules[0])
            .mappings
            .iter()
            .map(|mapping| mapping.original_column)
            .collect();
        assert_eq!(columns, vec![0, 4]);
    }

    #[test]
    fn real_decoder_joins_on_raw_sources_under_source_root() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "main.js.map",
            r#"{"version":3,"sourceRoot":"/app/","sources":["src/a.js",null],"sourcesContent":["let foo = 1;\nfoo = 2;",null],"names":[],"mappings":"AAAA,IAAI;AACA"}"#,
        );
        let mut store = Store::new();
        let mut dataset = Dataset::loading();
        DatasetLoader::discover(temp.path(), rules())
            .unwrap()
            .load_all(&mut store, &mut dataset);
        assert_eq!(dataset.modules.len(), 1);

        let stats = load_mappings(&mut store, &dataset.chunks, &SourcemapDecoder, &rules());
        assert_eq!(stats.mappings, 3);
        assert_eq!(stats.skipped_unresolved, 0);
        assert_eq!(store.module(dataset.modules[0]).mappings.len(), 3);

        let ctx = SearchContext {
            decoder: &SourcemapDecoder,
            rules: &rules(),
            context_chars: 16,
        };
        let outcome = search(&mut store, &dataset, "foo", &ctx)
            .unwrap()
            .expect("non-blank pattern");
        let SearchOutcome::Matches(results) = outcome else {
            panic!("expected matches for foo");
        };
        let positions: Vec<(u32, u32)> = results
            .hits
            .iter()
            .map(|hit| (hit.symbol.line, hit.symbol.column))
            .collect();
        assert_eq!(positions, vec![(0, 4), (1, 0)]);
        assert_eq!(results.dataset.chunks, dataset.chunks);
    }
}
