use super::{
    assembler::Assembler,
    classifier::{Event, LineClassifier},
    context::ParseOptions,
    diagnostics::{Diagnostic, Diagnostics},
    line_buffer::LineBuffer,
    rules::{CustomTagParser, Extensions, TagMapper},
};
use crate::manifest::Manifest;

/// Incremental M3U8 parser.
///
/// Feed it chunks with [`Parser::push`] as they arrive, then call
/// [`Parser::end`] once. The manifest is readable at any point, but only
/// complete after `end`.
#[derive(Debug)]
pub struct Parser {
    lines: LineBuffer,
    extensions: Extensions,
    assembler: Assembler,
    line_number: usize,
    ended: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            lines: LineBuffer::new(),
            extensions: Extensions::new(),
            assembler: Assembler::new(options),
            line_number: 0,
            ended: false,
        }
    }

    /// Feed a chunk of playlist bytes. Complete lines are processed right
    /// away; a trailing partial line waits for the next chunk.
    pub fn push(&mut self, chunk: impl AsRef<[u8]>) {
        if self.reject_after_end("push") {
            return;
        }

        self.lines.push(chunk.as_ref());
        while let Some(line) = self.lines.next_line() {
            self.process_line(&line);
        }
    }

    /// Tokenize and consume one line.
    pub fn push_line(&mut self, line: &str) {
        if self.reject_after_end("push_line") {
            return;
        }
        self.process_line(line);
    }

    /// Consume an already tokenized event.
    pub fn consume(&mut self, event: Event) {
        if self.reject_after_end("consume") {
            return;
        }
        self.assembler.diagnostics_mut().set_line(None);
        self.assembler.consume(event);
    }

    /// Flush the trailing line and finalize the manifest. Must be called
    /// exactly once.
    pub fn end(&mut self) -> &Manifest {
        if !self.reject_after_end("end") {
            if let Some(line) = self.lines.flush() {
                self.process_line(&line);
            }
            self.assembler.diagnostics_mut().set_line(None);
            self.assembler.finish();
            self.ended = true;

            let manifest = self.assembler.manifest();
            tracing::debug!(
                segments = manifest.segments.len(),
                playlists = manifest.playlists.len(),
                "Finished parsing playlist"
            );
        }
        self.assembler.manifest()
    }

    pub fn manifest(&self) -> &Manifest {
        self.assembler.manifest()
    }

    pub fn into_manifest(self) -> Manifest {
        self.assembler.into_manifest()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.assembler.diagnostics().entries()
    }

    pub fn is_master_playlist(&self) -> bool {
        self.manifest().is_master_playlist()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn options(&self) -> &ParseOptions {
        self.assembler.options()
    }

    pub fn add_tag_mapper(&mut self, mapper: impl TagMapper + 'static) {
        self.extensions.add_tag_mapper(mapper);
    }

    pub fn add_parser(&mut self, parser: impl CustomTagParser + 'static) {
        self.extensions.add_parser(parser);
    }

    pub fn on_diagnostic(&mut self, callback: impl FnMut(&Diagnostic) + Send + 'static) {
        self.assembler.diagnostics_mut().on_diagnostic(callback);
    }

    fn process_line(&mut self, line: &str) {
        self.line_number += 1;

        let Some(event) = LineClassifier::classify(line, &self.extensions) else {
            return;
        };

        self.assembler
            .diagnostics_mut()
            .set_line(Some(self.line_number));
        self.assembler.consume(event);
    }

    fn reject_after_end(&mut self, operation: &str) -> bool {
        if !self.ended {
            return false;
        }

        let diagnostics: &mut Diagnostics = self.assembler.diagnostics_mut();
        diagnostics.set_line(None);
        diagnostics.error(format!("{} called after end", operation));
        true
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
