// ADIF (Amateur Data Interchange Format) Tokenizer
// Reference: https://adif.org/

pub mod parser;

pub use parser::{split_records, tokenize, FieldSet};
