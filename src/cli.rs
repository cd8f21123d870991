//! CLI arguments live in the `doublechart-cli` crate so the build script and gen_docs can share them.

pub use doublechart_cli::{Args, ChartFormat};
