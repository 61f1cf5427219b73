mod extract;
mod names;
mod pattern;
mod table;

pub use extract::{decode, encode_segment, extract};
pub use names::NameIndex;
pub use pattern::{compile, join, normalize, parent_path, CompiledPattern, MatchOptions, Segment};
pub use table::{
    MatchResult, PathVariables, Precedence, Route, RouteTable, TableOptions,
    DEFAULT_MAX_URI_LENGTH,
};
