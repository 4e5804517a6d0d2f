use std::{fmt, ops};

use crate::board::attack_boards::{FILE_A, FILE_H};
use crate::moves::mv::Direction;

use super::square::Square;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Bitboard(pub u64);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);

    /// Returns the index of the lowest set bit, clearing it from the board.
    #[inline(always)]
    pub fn pop_lsb(&mut self) -> Square {
        let lsb = self.0 & self.0.wrapping_neg();
        self.0 ^= lsb;
        Square(lsb.trailing_zeros() as u8)
    }

    #[inline(always)]
    pub fn get_lsb(&self) -> Square {
        Square(self.0.trailing_zeros() as u8)
    }

    #[inline(always)]
    pub fn lsb(&self) -> Square {
        self.get_lsb()
    }

    #[inline(always)]
    pub fn count_bits(&self) -> u32 {
        self.0.count_ones()
    }

    #[inline(always)]
    pub fn occupied(&self, sq: Square) -> bool {
        self.0 & (1 << sq.0) != 0
    }

    #[inline(always)]
    pub fn empty(&self, sq: Square) -> bool {
        !self.occupied(sq)
    }

    /// Checked shift that loses no information off the edge of the board.
    #[inline(always)]
    pub fn checked_shift(&self, dir: Direction) -> Option<Bitboard> {
        let bitboard = self.0.max(1);
        let result = match dir {
            Direction::North => {
                if bitboard.leading_zeros() < 8 {
                    None
                } else {
                    bitboard.checked_shl(8)
                }
            }
            Direction::NorthWest => {
                let shifted = (bitboard.checked_shl(7).unwrap_or(0)) & !FILE_H.0;
                (bitboard.leading_zeros() >= 7 && shifted.trailing_zeros() >= 7).then_some(shifted)
            }
            Direction::West => {
                let shifted = (bitboard.checked_shr(1).unwrap_or(0)) & !FILE_H.0;
                (shifted.leading_zeros() >= 7 && bitboard.trailing_zeros() >= 1).then_some(shifted)
            }
            Direction::SouthWest => {
                let shifted = (bitboard.checked_shr(9).unwrap_or(0)) & !FILE_H.0;
                (shifted.leading_zeros() >= 7 && bitboard.trailing_zeros() >= 9).then_some(shifted)
            }
            Direction::South => {
                if bitboard.trailing_zeros() < 8 {
                    None
                } else {
                    bitboard.checked_shr(8)
                }
            }
            Direction::SouthEast => {
                let shifted = (bitboard.checked_shr(7).unwrap_or(0)) & !FILE_A.0;
                (bitboard.trailing_zeros() >= 7 && shifted.leading_zeros() >= 7).then_some(shifted)
            }
            Direction::East => {
                let shifted = (bitboard.checked_shl(1).unwrap_or(0)) & !FILE_A.0;
                (bitboard.leading_zeros() >= 1 && shifted.trailing_zeros() >= 7).then_some(shifted)
            }
            Direction::NorthEast => {
                let shifted = (bitboard.checked_shl(9).unwrap_or(0)) & !FILE_A.0;
                (bitboard.leading_zeros() >= 9 && shifted.trailing_zeros() >= 7).then_some(shifted)
            }
        };
        result.map(Bitboard)
    }

    /// Unchecked shift. Only use once a shift's validity has already been proven.
    #[inline(always)]
    pub fn shift(&self, dir: Direction) -> Bitboard {
        match dir {
            Direction::North => Bitboard(self.0 << 8),
            Direction::NorthWest => Bitboard((self.0 << 7) & !FILE_H.0),
            Direction::West => Bitboard((self.0 >> 1) & !FILE_H.0),
            Direction::SouthWest => Bitboard((self.0 >> 9) & !FILE_H.0),
            Direction::South => Bitboard(self.0 >> 8),
            Direction::SouthEast => Bitboard((self.0 >> 7) & !FILE_A.0),
            Direction::East => Bitboard((self.0 << 1) & !FILE_A.0),
            Direction::NorthEast => Bitboard((self.0 << 9) & !FILE_A.0),
        }
    }
}

impl Iterator for Bitboard {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if *self == Bitboard::EMPTY {
            None
        } else {
            Some(self.pop_lsb())
        }
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..8).rev() {
            for col in 0..8 {
                let index = row * 8 + col;
                write!(f, "{}", if self.0 & (1 << index) != 0 { "1" } else { "0" })?;
                if col < 7 {
                    write!(f, " ")?;
                }
            }
            if row > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl ops::Not for Bitboard {
    type Output = Self;
    fn not(self) -> Self::Output {
        Bitboard(!self.0)
    }
}
impl ops::BitAnd for Bitboard {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 & rhs.0)
    }
}
impl ops::BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0
    }
}
impl ops::BitOr for Bitboard {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 | rhs.0)
    }
}
impl ops::BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
impl ops::BitXorAssign for Bitboard {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0
    }
}
impl ops::BitXor for Bitboard {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 ^ rhs.0)
    }
}
