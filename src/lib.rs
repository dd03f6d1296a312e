pub mod dataset;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod plot;
pub mod prompt;
pub mod series;
pub mod source;
pub mod stats;
