pub mod assembler;
pub mod body;
pub mod cache;
pub mod config;
pub mod engine;
pub mod exception;
pub mod header;
pub mod output;
pub mod param;
pub mod registry;
pub mod tls;
pub mod util;

pub use cache::{Document, DocumentCache};
pub use config::Config;
pub use engine::Engine;
pub use exception::Exception;
pub use header::{normalize, HeaderMapping, NormalizedHeaderKey};
pub use output::{DocumentSink, FileSink, OutputTags};
pub use registry::{ComponentContext, ComponentGenerator, ComponentRegistry};
pub use tls::{TlsFragment, TlsParameters};
