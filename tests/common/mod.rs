pub mod builders;
pub mod mocks;

pub use builders::dump::TestDumpBuilder;
pub use mocks::source::ScriptedSource;
