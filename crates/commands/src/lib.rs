pub mod parser;

pub use parser::{dispatch, parse, Command, CommandTarget};
