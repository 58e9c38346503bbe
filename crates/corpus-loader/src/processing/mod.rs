//! Corpus assembly from loaded files

mod assembler;

pub use assembler::{BuildRequest, CorpusAssembler};
