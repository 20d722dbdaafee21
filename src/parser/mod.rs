mod byteorder;
mod column;
mod encoding;
mod header;
mod meta;
mod rows;

pub use byteorder::{read_f32, read_f64, read_i16, read_i32, read_i64};
pub use column::{parse_tform, read_column_descriptors};
pub use encoding::{decode_legacy, decode_utf8, trim_trailing};
pub use header::{BLOCK_SIZE, CARD_SIZE, Card, CardValue, Header, padded_len, parse_card, read_header};
pub use meta::{MAX_ROW_WIDTH, ParsedMetadata, parse_metadata};
pub use rows::read_table;
