use crate::impl_index;
use std::ops;

impl_index!(Color);
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const fn idx(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        [Self::White, Self::Black].into_iter()
    }
}

impl ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self::Output {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl From<usize> for Color {
    fn from(value: usize) -> Self {
        match value {
            0 => Self::White,
            1 => Self::Black,
            _ => panic!("invalid color index"),
        }
    }
}

pub const NUM_PIECE_NAMES: usize = 6;

impl_index!(PieceName);
/// The six piece types plus the `None` sentinel used to pack an absent
/// mover/capture/promotion into a move's 3-bit subfields.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum PieceName {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
    None,
}

impl PieceName {
    /// Classical evaluation material values, centipawns.
    pub const fn value(self) -> i32 {
        match self {
            Self::Pawn => 100,
            Self::Knight => 313,
            Self::Bishop => 310,
            Self::Rook => 514,
            Self::Queen => 1002,
            Self::King => 0,
            Self::None => 0,
        }
    }

    /// Piece values used exclusively by the static exchange evaluator,
    /// distinct from the evaluation material table.
    pub const fn see_value(self) -> i32 {
        match self {
            Self::Pawn => 1,
            Self::Knight | Self::Bishop => 4,
            Self::Rook => 6,
            Self::Queen => 12,
            Self::King => 120,
            Self::None => 0,
        }
    }

    pub const fn idx(self) -> usize {
        self as usize
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        [Self::Pawn, Self::Knight, Self::Bishop, Self::Rook, Self::Queen, Self::King].into_iter()
    }
}

impl From<u32> for PieceName {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Pawn,
            1 => Self::Knight,
            2 => Self::Bishop,
            3 => Self::Rook,
            4 => Self::Queen,
            5 => Self::King,
            6 => Self::None,
            _ => unreachable!("piece name field only carries 3 bits"),
        }
    }
}

impl_index!(Piece);
#[derive(Eq, Copy, Clone, PartialEq, Debug)]
#[repr(u8)]
pub enum Piece {
    WhitePawn,
    BlackPawn,
    WhiteKnight,
    BlackKnight,
    WhiteBishop,
    BlackBishop,
    WhiteRook,
    BlackRook,
    WhiteQueen,
    BlackQueen,
    WhiteKing,
    BlackKing,
    None,
}

impl Piece {
    pub fn new(name: PieceName, color: Color) -> Self {
        ((name.idx() << 1) | color.idx()).into()
    }

    pub fn name(self) -> PieceName {
        if self == Piece::None {
            PieceName::None
        } else {
            PieceName::from(self as u32 >> 1)
        }
    }

    pub fn value(self) -> i32 {
        self.name().value()
    }

    pub fn color(self) -> Color {
        Color::from(self as usize & 0b1)
    }

    pub fn char(self) -> &'static str {
        let c = match self.name() {
            PieceName::Pawn => "P",
            PieceName::Knight => "N",
            PieceName::Bishop => "B",
            PieceName::Rook => "R",
            PieceName::Queen => "Q",
            PieceName::King => "K",
            PieceName::None => "_",
        };
        if self.color() == Color::Black {
            match c {
                "P" => "p",
                "N" => "n",
                "B" => "b",
                "R" => "r",
                "Q" => "q",
                "K" => "k",
                other => other,
            }
        } else {
            c
        }
    }
}

impl From<usize> for Piece {
    fn from(value: usize) -> Self {
        match value {
            0 => Self::WhitePawn,
            1 => Self::BlackPawn,
            2 => Self::WhiteKnight,
            3 => Self::BlackKnight,
            4 => Self::WhiteBishop,
            5 => Self::BlackBishop,
            6 => Self::WhiteRook,
            7 => Self::BlackRook,
            8 => Self::WhiteQueen,
            9 => Self::BlackQueen,
            10 => Self::WhiteKing,
            11 => Self::BlackKing,
            12 => Self::None,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod piece_tests {
    use super::*;

    #[test]
    fn new_piece_round_trips_name_and_color() {
        for color in Color::iter() {
            for name in PieceName::iter() {
                let piece = Piece::new(name, color);
                assert_eq!(piece.name(), name);
                assert_eq!(piece.color(), color);
            }
        }
    }

    #[test]
    fn piece_name_from_u32_round_trips() {
        for name in PieceName::iter() {
            assert_eq!(PieceName::from(name as u32), name);
        }
        assert_eq!(PieceName::from(6), PieceName::None);
    }
}
