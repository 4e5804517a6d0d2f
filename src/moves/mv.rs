use core::fmt;

use strum_macros::EnumIter;

use crate::types::piece::PieceName;
use crate::types::square::Square;

/// Cardinal directions from the point of view of white side.
#[derive(EnumIter, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    North = 8,
    NorthWest = 7,
    West = -1,
    SouthWest = -9,
    South = -8,
    SouthEast = -7,
    East = 1,
    NorthEast = 9,
}

impl Direction {
    pub fn opp(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthWest => Self::SouthEast,
            Self::West => Self::East,
            Self::SouthWest => Self::NorthEast,
            Self::South => Self::North,
            Self::SouthEast => Self::NorthWest,
            Self::East => Self::West,
            Self::NorthEast => Self::SouthWest,
        }
    }
}

/// A move is a 24-bit packed integer: origin square (6), destination square
/// (6), moving piece type (3), captured piece type (3), promotion piece type
/// (3). `Move::EMPTY` is the all-zero word, which decodes to pawn-on-a1
/// everywhere a reader cares only about the sentinel-ness of the whole word.
/// Castling, en passant, and double pawn pushes are not flagged in the
/// encoding; callers recover them from geometry and board state at apply
/// time (see `Board::make_move`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move(u32);

impl Move {
    pub const EMPTY: Move = Move(0);

    #[inline(always)]
    pub fn new(origin: Square, dest: Square, moving: PieceName, captured: PieceName, promotion: PieceName) -> Self {
        let m = origin.0 as u32
            | (dest.0 as u32) << 6
            | (moving.idx() as u32) << 12
            | (captured.idx() as u32) << 15
            | (promotion.idx() as u32) << 18;
        Move(m)
    }

    #[inline(always)]
    pub fn quiet(origin: Square, dest: Square, moving: PieceName) -> Self {
        Self::new(origin, dest, moving, PieceName::None, PieceName::None)
    }

    #[inline(always)]
    pub fn capture(origin: Square, dest: Square, moving: PieceName, captured: PieceName) -> Self {
        Self::new(origin, dest, moving, captured, PieceName::None)
    }

    #[inline(always)]
    pub fn promotion(origin: Square, dest: Square, captured: PieceName, promotion: PieceName) -> Self {
        Self::new(origin, dest, PieceName::Pawn, captured, promotion)
    }

    #[inline(always)]
    pub fn origin_square(self) -> Square {
        Square((self.0 & 0x3f) as u8)
    }

    #[inline(always)]
    pub fn dest_square(self) -> Square {
        Square(((self.0 >> 6) & 0x3f) as u8)
    }

    #[inline(always)]
    pub fn piece_moving(self) -> PieceName {
        PieceName::from((self.0 >> 12) & 0b111)
    }

    #[inline(always)]
    pub fn captured_piece(self) -> PieceName {
        PieceName::from((self.0 >> 15) & 0b111)
    }

    #[inline(always)]
    pub fn promotion_piece(self) -> PieceName {
        PieceName::from((self.0 >> 18) & 0b111)
    }

    #[inline(always)]
    pub fn is_capture(self) -> bool {
        self.captured_piece() != PieceName::None
    }

    #[inline(always)]
    pub fn is_promotion(self) -> bool {
        self.promotion_piece() != PieceName::None
    }

    #[inline(always)]
    pub fn is_castle(self) -> bool {
        self.piece_moving() == PieceName::King && self.origin_square().dist(self.dest_square()) == 2
    }

    #[inline(always)]
    pub fn is_double_push(self) -> bool {
        self.piece_moving() == PieceName::Pawn && self.origin_square().dist(self.dest_square()) == 2 && self.origin_square().file() == self.dest_square().file()
    }

    /// An en passant capture is a pawn move to an empty destination file
    /// different from its origin file; the board has to confirm the
    /// destination is actually empty since the encoding doesn't carry that
    /// fact on its own.
    #[inline(always)]
    pub fn is_en_passant_candidate(self) -> bool {
        self.piece_moving() == PieceName::Pawn
            && !self.is_capture()
            && self.origin_square().file() != self.dest_square().file()
    }

    #[inline(always)]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Reconstructs a move from its packed representation, e.g. when reading
    /// a transposition table entry back out.
    #[inline(always)]
    pub fn from_u32(v: u32) -> Self {
        Move(v)
    }

    pub fn castle_type(self) -> Castle {
        debug_assert!(self.is_castle());
        match self.dest_square() {
            Square(2) => Castle::WhiteQueen,
            Square(6) => Castle::WhiteKing,
            Square(58) => Castle::BlackQueen,
            Square(62) => Castle::BlackKing,
            _ => unreachable!("castling king landed on a non-castling square"),
        }
    }

    pub fn to_san(self) -> String {
        let mut s = format!("{}{}", self.origin_square(), self.dest_square());
        match self.promotion_piece() {
            PieceName::Queen => s += "q",
            PieceName::Rook => s += "r",
            PieceName::Bishop => s += "b",
            PieceName::Knight => s += "n",
            _ => (),
        }
        s
    }
}

impl Default for Move {
    fn default() -> Self {
        Move::EMPTY
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_san())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Castle {
    WhiteKing = 1,
    WhiteQueen = 2,
    BlackKing = 4,
    BlackQueen = 8,
    None = 0,
}

#[rustfmt::skip]
pub const CASTLING_RIGHTS: [u8; 64] = [
    13, 15, 15, 15, 12, 15, 15, 14,
    15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15,
    7, 15, 15, 15, 3, 15, 15, 11,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_move_is_zero() {
        assert_eq!(Move::EMPTY.as_u32(), 0);
        assert_eq!(Move::EMPTY.origin_square(), Square(0));
        assert_eq!(Move::EMPTY.piece_moving(), PieceName::Pawn);
    }

    #[test]
    fn round_trips_fields() {
        let m = Move::capture(Square(12), Square(28), PieceName::Pawn, PieceName::Knight);
        assert_eq!(m.origin_square(), Square(12));
        assert_eq!(m.dest_square(), Square(28));
        assert_eq!(m.piece_moving(), PieceName::Pawn);
        assert_eq!(m.captured_piece(), PieceName::Knight);
        assert!(m.is_capture());
        assert!(!m.is_promotion());
    }

    #[test]
    fn promotion_round_trip() {
        let m = Move::promotion(Square(52), Square(60), PieceName::None, PieceName::Queen);
        assert!(m.is_promotion());
        assert_eq!(m.promotion_piece(), PieceName::Queen);
        assert_eq!(m.to_san(), "e7e8q");
    }

    #[test]
    fn double_push_detection() {
        let m = Move::quiet(Square(12), Square(28), PieceName::Pawn);
        assert!(m.is_double_push());
        let m = Move::quiet(Square(12), Square(20), PieceName::Pawn);
        assert!(!m.is_double_push());
    }

    #[test]
    fn castle_detection() {
        let m = Move::quiet(Square(4), Square(6), PieceName::King);
        assert!(m.is_castle());
        assert_eq!(m.castle_type(), Castle::WhiteKing);
    }
}
