//! In-memory storage of assembled corpora

mod corpora;

pub use corpora::Corpora;
