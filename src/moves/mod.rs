pub mod movegen;
pub mod movelist;
pub mod movepicker;
pub mod mv;

pub use movegen::GenType;
pub use movelist::{MoveList, MoveListEntry};
pub use mv::{Castle, Direction, Move};
