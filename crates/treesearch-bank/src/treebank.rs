//! Treebank fanout across many CoNLL-U sources.
//!
//! Ordered mode walks sources one at a time on the calling thread.
//! Unordered mode partitions sources across a bounded pool of
//! `std::thread::spawn` workers, each draining its chunk of sources
//! and feeding a single `mpsc::sync_channel`, so consumers see trees
//! as soon as any worker produces one rather than in source order.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, SyncSender};
use std::thread::{self, JoinHandle};

use glob::glob;
use tracing::{debug, info, warn};
use treesearch_core::{Decoder, Tree};
use treesearch_query::{find_matches, has_match, Binding, Pattern};

use crate::error::{BankError, BankResult};
use crate::source;

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Memory(String),
}

/// Fanout configuration: a single `Options` struct in place of
/// scattered boolean parameters.
#[derive(Debug, Clone)]
pub struct Options {
    pub ordered: bool,
    pub workers: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ordered: true,
            workers: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// A collection of CoNLL-U sources (files, glob patterns, or in-memory
/// text) that can be iterated as trees or searched with a pattern.
pub struct Treebank {
    sources: Vec<Source>,
}

impl Treebank {
    /// Expands each input as a glob pattern (plain paths match
    /// themselves) and opens the resulting treebank. Glob expansion is
    /// eager; the files themselves are opened lazily, one at a time in
    /// ordered mode or one per worker in unordered mode.
    pub fn open<I, S>(paths: I) -> BankResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sources = Vec::new();
        for pattern in paths {
            let pattern = pattern.as_ref();
            let matches =
                glob(pattern).map_err(|e| BankError::glob(pattern.to_string(), e))?;
            let mut any = false;
            for entry in matches {
                match entry {
                    Ok(path) => {
                        any = true;
                        sources.push(Source::File(path));
                    }
                    Err(e) => {
                        let path = e.path().to_path_buf();
                        return Err(BankError::open(path, e.into_error()));
                    }
                }
            }
            if !any {
                // No glob metacharacters matched anything: treat the
                // literal string as a direct file path so a single
                // plain filename still resolves (and still surfaces a
                // clear "file not found" error if it truly is missing).
                sources.push(Source::File(PathBuf::from(pattern)));
            }
        }
        info!(count = sources.len(), "opened treebank sources");
        Ok(Self { sources })
    }

    /// A treebank over a single in-memory CoNLL-U string, primarily for
    /// tests and REPL-style use.
    pub fn open_str(text: impl Into<String>) -> Self {
        Self {
            sources: vec![Source::Memory(text.into())],
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Streams every tree across every source.
    pub fn trees(&self, ordered: bool) -> Box<dyn Iterator<Item = BankResult<Tree>> + '_> {
        self.trees_with(Options {
            ordered,
            ..Options::default()
        })
    }

    pub fn trees_with(&self, opts: Options) -> Box<dyn Iterator<Item = BankResult<Tree>> + '_> {
        if opts.ordered {
            Box::new(OrderedTrees::new(&self.sources))
        } else {
            Box::new(UnorderedTrees::new(self.sources.clone(), opts.workers))
        }
    }

    /// Streams `(tree, binding)` pairs for every match of `pattern`
    /// across every tree.
    pub fn search<'a>(
        &'a self,
        pattern: &'a Pattern,
        ordered: bool,
    ) -> Box<dyn Iterator<Item = BankResult<(Tree, Binding)>> + 'a> {
        Box::new(self.trees(ordered).flat_map(move |result| match result {
            Ok(tree) => {
                let bindings = find_matches(pattern, &tree);
                bindings
                    .into_iter()
                    .map(|b| Ok((tree.clone(), b)))
                    .collect::<Vec<_>>()
            }
            Err(e) => vec![Err(e)],
        }))
    }

    /// Streams every tree that has at least one match of `pattern`, at
    /// most once each — unlike `search`, which yields one item per
    /// binding, `filter` tracks a per-invocation "already emitted" flag
    /// per tree so a sentence with many satisfying bindings still
    /// surfaces exactly once.
    pub fn filter<'a>(
        &'a self,
        pattern: &'a Pattern,
        ordered: bool,
    ) -> Box<dyn Iterator<Item = BankResult<Tree>> + 'a> {
        Box::new(self.trees(ordered).filter_map(move |result| match result {
            Ok(tree) => has_match(pattern, &tree).then_some(Ok(tree)),
            Err(e) => Some(Err(e)),
        }))
    }
}

fn open_source_lines(source: &Source) -> BankResult<Decoder<Box<dyn Iterator<Item = std::io::Result<String>>>>> {
    match source {
        Source::File(path) => {
            let reader = source::open_lines(path)?;
            let lines: Box<dyn Iterator<Item = std::io::Result<String>>> =
                Box::new(reader.lines());
            Ok(Decoder::new(lines))
        }
        Source::Memory(text) => {
            let text = text.clone();
            let lines: Box<dyn Iterator<Item = std::io::Result<String>>> = Box::new(
                text.lines()
                    .map(|l| Ok(l.to_string()))
                    .collect::<Vec<_>>()
                    .into_iter(),
            );
            Ok(Decoder::new(lines))
        }
    }
}

struct OrderedTrees<'a> {
    remaining: std::slice::Iter<'a, Source>,
    current: Option<Decoder<Box<dyn Iterator<Item = std::io::Result<String>>>>>,
}

impl<'a> OrderedTrees<'a> {
    fn new(sources: &'a [Source]) -> Self {
        Self {
            remaining: sources.iter(),
            current: None,
        }
    }
}

impl<'a> Iterator for OrderedTrees<'a> {
    type Item = BankResult<Tree>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(decoder) = &mut self.current {
                if let Some(item) = decoder.next() {
                    return Some(item.map_err(BankError::from));
                }
                self.current = None;
            }
            let source = self.remaining.next()?;
            match open_source_lines(source) {
                Ok(decoder) => self.current = Some(decoder),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

struct UnorderedTrees {
    rx: Option<mpsc::Receiver<BankResult<Tree>>>,
    handles: Vec<JoinHandle<()>>,
    done: bool,
}

impl UnorderedTrees {
    fn new(sources: Vec<Source>, workers: usize) -> Self {
        let workers = workers.max(1).min(sources.len().max(1));
        let (tx, rx) = mpsc::sync_channel::<BankResult<Tree>>(2 * workers);

        let chunk_size = sources.len().div_ceil(workers).max(1);
        let mut handles = Vec::new();
        for chunk in sources.chunks(chunk_size) {
            let chunk = chunk.to_vec();
            let tx = tx.clone();
            debug!(files = chunk.len(), "spawning treebank worker");
            handles.push(thread::spawn(move || worker_loop(chunk, tx)));
        }
        drop(tx);

        Self {
            rx: Some(rx),
            handles,
            done: false,
        }
    }
}

fn worker_loop(chunk: Vec<Source>, tx: SyncSender<BankResult<Tree>>) {
    for source in &chunk {
        let decoder = match open_source_lines(source) {
            Ok(d) => d,
            Err(e) => {
                if tx.send(Err(e)).is_err() {
                    return;
                }
                continue;
            }
        };
        for item in decoder {
            if tx.send(item.map_err(BankError::from)).is_err() {
                // Consumer dropped the receiver: cancel promptly.
                return;
            }
        }
    }
    debug!("treebank worker finished");
}

impl Iterator for UnorderedTrees {
    type Item = BankResult<Tree>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(rx) = &self.rx else { return None };
        match rx.recv() {
            Ok(Ok(tree)) => Some(Ok(tree)),
            Ok(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            Err(_) => {
                self.done = true;
                None
            }
        }
    }
}

impl Drop for UnorderedTrees {
    fn drop(&mut self) {
        // Drop the receiver first so any worker blocked on a full
        // channel observes it as closed and terminates before we join.
        self.rx.take();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("treebank worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENT: &str = "1\tHe\the\tPRON\t_\t_\t2\tnsubj\t_\t_\n\
2\tsleeps\tsleep\tVERB\t_\t_\t0\troot\t_\t_\n";

    #[test]
    fn options_default_is_ordered_with_at_least_one_worker() {
        let opts = Options::default();
        assert!(opts.ordered);
        assert!(opts.workers >= 1);
    }

    #[test]
    fn in_memory_source_decodes_one_tree() {
        let bank = Treebank::open_str(SENT);
        let trees: Vec<_> = bank.trees(true).collect::<Result<_, _>>().unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].raw_word(0).form, "He");
    }

    #[test]
    fn filter_yields_each_matching_sentence_exactly_once() {
        // First sentence has two NOUNs ("dog", "bone"); filter must still
        // emit that tree exactly once, not once per binding.
        let text = "1\tThe\tthe\tDET\t_\t_\t2\tdet\t_\t_\n\
2\tdog\tdog\tNOUN\t_\t_\t4\tnsubj\t_\t_\n\
3\tthe\tthe\tDET\t_\t_\t4\tdet\t_\t_\n\
4\tate\teat\tVERB\t_\t_\t0\troot\t_\t_\n\
5\tbone\tbone\tNOUN\t_\t_\t4\tobj\t_\t_\n\
\n\
1\tcat\tcat\tNOUN\t_\t_\t0\troot\t_\t_\n\
\n\
1\tran\trun\tVERB\t_\t_\t0\troot\t_\t_\n";
        let bank = Treebank::open_str(text);
        let pattern = treesearch_query::compile_query(r#"N [upos = "NOUN"];"#).unwrap();
        let trees: Vec<_> = bank.filter(&pattern, true).collect::<Result<_, _>>().unwrap();
        // Two sentences contain a NOUN (the first has two); the verb-only
        // sentence has none.
        assert_eq!(trees.len(), 2);

        let search_results: Vec<_> = bank.search(&pattern, true).collect::<Result<_, _>>().unwrap();
        // search (unlike filter) yields one item per binding: three NOUNs
        // across two sentences.
        assert_eq!(search_results.len(), 3);
    }

    #[test]
    fn dropping_unordered_iterator_early_does_not_hang() {
        let sources: Vec<Source> = (0..8).map(|_| Source::Memory(SENT.to_string())).collect();
        let mut unordered = UnorderedTrees::new(sources, 4);
        // Pull exactly one tree, then drop: remaining workers must
        // observe the closed channel and terminate.
        assert!(unordered.next().is_some());
        drop(unordered);
    }
}
