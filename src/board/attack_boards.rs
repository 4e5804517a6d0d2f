use lazy_static::lazy_static;

use crate::const_array;
use crate::moves::mv::Direction;
use crate::types::bitboard::Bitboard;
use crate::types::piece::Color;
use crate::types::square::Square;

const FILE_A_U64: u64 = 0x101010101010101;
const FILE_H_U64: u64 = 0x101010101010101 << 7;

pub const FILE_A: Bitboard = Bitboard(FILE_A_U64);
pub const FILE_B: Bitboard = Bitboard(FILE_A_U64 << 1);
pub const FILE_C: Bitboard = Bitboard(FILE_A_U64 << 2);
pub const FILE_D: Bitboard = Bitboard(FILE_A_U64 << 3);
pub const FILE_E: Bitboard = Bitboard(FILE_A_U64 << 4);
pub const FILE_F: Bitboard = Bitboard(FILE_A_U64 << 5);
pub const FILE_G: Bitboard = Bitboard(FILE_A_U64 << 6);
pub const FILE_H: Bitboard = Bitboard(FILE_A_U64 << 7);

pub const FILES: [Bitboard; 8] = const_array!(|f, 8| Bitboard(FILE_A_U64 << f));

const RANK1_U64: u64 = 0b11111111;

pub const RANK1: Bitboard = Bitboard(RANK1_U64);
pub const RANK2: Bitboard = Bitboard(RANK1_U64 << 8);
pub const RANK3: Bitboard = Bitboard(RANK1_U64 << 16);
pub const RANK4: Bitboard = Bitboard(RANK1_U64 << 24);
pub const RANK5: Bitboard = Bitboard(RANK1_U64 << 32);
pub const RANK6: Bitboard = Bitboard(RANK1_U64 << 40);
pub const RANK7: Bitboard = Bitboard(RANK1_U64 << 48);
pub const RANK8: Bitboard = Bitboard(RANK1_U64 << 56);

pub const RANKS: [Bitboard; 8] = const_array!(|p, 8| Bitboard(RANK1_U64 << (8 * p)));

pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq]
}

pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq]
}

pub fn pawn_attacks(square: Square, attacker: Color) -> Bitboard {
    PAWN_ATTACKS[attacker][square]
}

pub const fn pawn_set_attacks(pawns: Bitboard, side: Color) -> Bitboard {
    let pawns = pawns.0;
    if side.idx() == Color::White.idx() {
        Bitboard((pawns & !FILE_A_U64) << 7 | (pawns & !FILE_H_U64) << 9)
    } else {
        Bitboard((pawns & !FILE_A_U64) >> 9 | (pawns & !FILE_H_U64) >> 7)
    }
}

pub const KING_ATTACKS: [Bitboard; 64] = const_array!(|sq, 64| {
    let sq = 1 << sq;
    let mut bb = sq;
    bb |= sq << 8 | sq >> 8;
    bb |= (bb & !FILE_A_U64) >> 1 | (bb & !FILE_H_U64) << 1;
    Bitboard(bb ^ sq)
});

pub const KNIGHT_ATTACKS: [Bitboard; 64] = const_array!(|sq, 64| {
    let sq = 1 << sq;
    let mut bb = sq;
    let vert = sq << 16 | sq >> 16;
    bb |= (vert & !FILE_A_U64) >> 1 | (vert & !FILE_H_U64) << 1;
    let horizontal = (sq & 0x3f3f3f3f3f3f3f3f) << 2 | (sq & 0xfcfcfcfcfcfcfcfc) >> 2;
    bb |= horizontal << 8 | horizontal >> 8;
    Bitboard(bb ^ sq)
});

pub const PAWN_ATTACKS: [[Bitboard; 64]; 2] = [
    const_array!(|sq, 64| pawn_set_attacks(Bitboard(1 << sq), Color::White)),
    const_array!(|sq, 64| pawn_set_attacks(Bitboard(1 << sq), Color::Black)),
];

const RAY_DIRS: [Direction; 8] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
    Direction::NorthWest,
];

lazy_static! {
    /// `BETWEEN_SQUARES[a][b]` is the set of squares strictly between `a` and
    /// `b` if they share a rank, file, or diagonal; empty otherwise.
    pub static ref BETWEEN_SQUARES: [[Bitboard; 64]; 64] = {
        let mut table = [[Bitboard::EMPTY; 64]; 64];
        for a in Square::iter() {
            for dir in RAY_DIRS {
                let mut between = Bitboard::EMPTY;
                let mut cur = a;
                while let Some(next) = cur.checked_shift(dir) {
                    table[a][next] = between;
                    between |= next.bitboard();
                    cur = next;
                }
            }
        }
        table
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pawn_attacks_from_center() {
        let sq = Square(19);
        assert_eq!(pawn_attacks(sq, Color::White), Square(26).bitboard() | Square(28).bitboard());
        assert_eq!(pawn_attacks(sq, Color::Black), Square(10).bitboard() | Square(12).bitboard());
    }

    #[test]
    fn pawn_attacks_from_edge_file() {
        let sq = Square(40);
        assert_eq!(pawn_attacks(sq, Color::White), Square(49).bitboard());
        assert_eq!(pawn_attacks(sq, Color::Black), Square(33).bitboard());
    }
}
