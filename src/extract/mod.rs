//! 从 IPO 日程页面提取记录：文本解码、行分组、字段映射、记录组装

pub mod assembler;
pub mod fields;
pub mod grouper;
pub mod normalizer;

pub use assembler::{Assembly, RecordAssembler};
pub use grouper::{group_rows, RowBlock, RowRole};
pub use normalizer::{CellEncoding, Normalized, TextNormalizer};
