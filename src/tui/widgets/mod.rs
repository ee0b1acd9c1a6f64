// Widget rendering functions, one module per screen zone.

pub mod diamond;
pub mod footer;
pub mod info;
pub mod linescore;
