mod ast;
mod errors;
mod lexer;
mod lowering;
mod parser;
mod span;
mod tokens;


pub use ast::*;
pub use errors::ParseError;
pub use lowering::lower_rules;
pub use parser::parse_rules;
pub use span::Span;
