pub mod error;
pub mod hls;
pub mod manifest;
pub mod stream;

pub use error::Error;
pub use manifest::Manifest;
pub use stream::{Parser, ParseOptions};

pub type Result<T> = std::result::Result<T, Error>;

/// Parse a complete playlist in one go.
pub fn parse(input: &str) -> Manifest {
    let mut parser = Parser::new();
    parser.push(input);
    parser.end();
    parser.into_manifest()
}
