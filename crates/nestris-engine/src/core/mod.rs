pub use self::{board::*, level::*, piece::*, position::*, tap::*};

pub(crate) mod board;
pub(crate) mod level;
pub(crate) mod piece;
pub(crate) mod position;
pub(crate) mod tap;
