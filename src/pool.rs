//! Reusable parse contexts for running many parses concurrently.
//!
//! Every context owns its own diagnostic sink and position table, so parses
//! running on different contexts share nothing mutable. A context is reused
//! only after it has been checked in again, and each checkout starts from a
//! clean sink and table.

use crate::config::ParserConfig;
use crate::lexer::token::Token;
use crate::lexer::tokenize;
use crate::parser::{ParseContext, ParseResult};
use log::debug;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A fixed set of parse contexts shared by worker threads.
///
/// ```
/// use javelin_syntax::{ParserConfig, ParserPool};
///
/// let pool = ParserPool::new(2, ParserConfig::default());
/// let results = pool.parse_sources(&["class A {}", "class B { int m() }"]);
/// assert!(!results[0].has_errors());
/// assert!(results[1].has_errors());
/// ```
#[derive(Debug)]
pub struct ParserPool {
    contexts: Vec<Mutex<ParseContext>>,
    next: AtomicUsize,
}

impl ParserPool {
    /// Creates `workers` contexts (at least one) sharing `config`.
    pub fn new(workers: usize, config: ParserConfig) -> Self {
        let contexts = (0..workers.max(1))
            .map(|_| Mutex::new(ParseContext::new(config.clone())))
            .collect();
        Self {
            contexts,
            next: AtomicUsize::new(0),
        }
    }

    pub fn workers(&self) -> usize {
        self.contexts.len()
    }

    /// Parses on the first free context, waiting for one if all are busy.
    pub fn parse(&self, tokens: Vec<Token>) -> ParseResult {
        let start = self.next.fetch_add(1, Ordering::Relaxed) % self.contexts.len();
        for offset in 0..self.contexts.len() {
            let index = (start + offset) % self.contexts.len();
            if let Some(mut context) = self.contexts[index].try_lock() {
                return context.parse(tokens);
            }
        }
        self.contexts[start].lock().parse(tokens)
    }

    /// Lexes and parses `source` on the first free context.
    pub fn parse_source(&self, source: &str) -> ParseResult {
        let lexed = tokenize(source);
        let mut result = self.parse(lexed.tokens);
        let mut diagnostics = lexed.diagnostics;
        diagnostics.append(&mut result.diagnostics);
        result.diagnostics = diagnostics;
        result
    }

    /// Parses every token stream, spreading them over one scoped thread per
    /// context. Results come back in input order.
    pub fn parse_all(&self, inputs: Vec<Vec<Token>>) -> Vec<ParseResult> {
        self.run_all(inputs, |context, tokens| context.parse(tokens))
    }

    /// [`ParserPool::parse_all`] over source texts.
    pub fn parse_sources(&self, sources: &[&str]) -> Vec<ParseResult> {
        self.run_all(sources.to_vec(), |context, source| context.parse_source(source))
    }

    fn run_all<I, F>(&self, inputs: Vec<I>, parse: F) -> Vec<ParseResult>
    where
        I: Send,
        F: Fn(&mut ParseContext, I) -> ParseResult + Sync,
    {
        let total = inputs.len();
        let workers = self.contexts.len().min(total.max(1));
        let mut batches: Vec<Vec<(usize, I)>> = (0..workers).map(|_| Vec::new()).collect();
        for (index, input) in inputs.into_iter().enumerate() {
            batches[index % workers].push((index, input));
        }
        debug!("parsing {total} inputs on {workers} contexts");

        let parse = &parse;
        let mut slots: Vec<Option<ParseResult>> = (0..total).map(|_| None).collect();
        std::thread::scope(|scope| {
            let handles: Vec<_> = batches
                .into_iter()
                .zip(&self.contexts)
                .map(|(batch, context)| {
                    scope.spawn(move || {
                        let mut context = context.lock();
                        batch
                            .into_iter()
                            .map(|(index, input)| (index, parse(&mut *context, input)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            for handle in handles {
                match handle.join() {
                    Ok(parsed) => {
                        for (index, result) in parsed {
                            slots[index] = Some(result);
                        }
                    }
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
        });
        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_keep_input_order() {
        let pool = ParserPool::new(3, ParserConfig::default());
        let sources: Vec<String> = (0..10).map(|i| format!("class C{i} {{}}")).collect();
        let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
        let results = pool.parse_sources(&refs);
        assert_eq!(results.len(), 10);
        for (i, result) in results.iter().enumerate() {
            assert!(result.unit.shape().contains(&format!("\"C{i}\"")));
        }
    }

    #[test]
    fn contexts_do_not_leak_diagnostics() {
        let pool = ParserPool::new(1, ParserConfig::default());
        let bad = pool.parse_source("class A { int m() }");
        let good = pool.parse_source("class A { int m(); }");
        assert_eq!(bad.diagnostics.len(), 1);
        assert!(good.diagnostics.is_empty());
        assert_ne!(bad.unit.id.unit(), good.unit.id.unit());
    }

    #[test]
    fn empty_batch() {
        let pool = ParserPool::new(4, ParserConfig::default());
        assert!(pool.parse_all(Vec::new()).is_empty());
    }
}
