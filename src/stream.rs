pub mod assembler;
pub mod classifier;
pub mod context;
pub mod diagnostics;
pub mod line_buffer;
pub mod processor;
pub mod rules;
pub mod source;
pub mod state;

pub use assembler::Assembler;
pub use classifier::{Event, LineClassifier, Tag};
pub use context::ParseOptions;
pub use diagnostics::{Diagnostic, DiagnosticLevel};
pub use processor::Parser;
pub use rules::{CustomTagParser, RegexCustomParser, RegexTagMapper, TagMapper};
pub use state::ParserState;
