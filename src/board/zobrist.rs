use lazy_static::lazy_static;
use strum::IntoEnumIterator;

use crate::board::magics::Rng;
use crate::board::position::Position;
use crate::types::piece::{Color, PieceName};

pub struct Zobrist {
    pub piece_square_hashes: [[[u64; 64]; 6]; 2],
    pub turn_hash: u64,
    pub castling: [u64; 16],
    pub en_passant: [u64; 64],
}

lazy_static! {
    pub static ref ZOBRIST: Zobrist = Zobrist::default();
}

impl Default for Zobrist {
    fn default() -> Self {
        let mut rng = Rng::default();
        let turn_hash = rng.next_u64();
        let mut piece_square_hashes = [[[0; 64]; 6]; 2];
        piece_square_hashes.iter_mut().flatten().flatten().for_each(|x| *x = rng.next_u64());
        let mut castling = [0; 16];
        castling.iter_mut().for_each(|x| *x = rng.next_u64());
        let mut en_passant = [0; 64];
        en_passant.iter_mut().for_each(|x| *x = rng.next_u64());
        Self {
            turn_hash,
            piece_square_hashes,
            castling,
            en_passant,
        }
    }
}

impl Position {
    /// Recomputes the zobrist key from scratch; used by `from_fen` and by
    /// tests that want an independent check on the incrementally maintained
    /// key carried on `Position`.
    pub(crate) fn generate_hash(&self) -> u64 {
        let mut hash = 0;

        for color in Color::iter() {
            for piece in PieceName::iter() {
                for sq in self.bitboard(color, piece) {
                    hash ^= ZOBRIST.piece_square_hashes[color.idx()][piece.idx()][sq.idx()];
                }
            }
        }

        if let Some(sq) = self.en_passant_square {
            hash ^= ZOBRIST.en_passant[sq.idx()];
        }

        hash ^= ZOBRIST.castling[self.castling_rights as usize];

        if self.side_to_move == Color::Black {
            hash ^= ZOBRIST.turn_hash;
        }

        hash
    }
}

#[cfg(test)]
mod tests {
    use crate::board::fen;

    #[test]
    fn identical_positions_hash_identically() {
        let a = fen::build_position(fen::STARTING_FEN);
        let b = fen::build_position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let c = fen::build_position("4r3/4k3/8/4K3/8/8/8/8 w - - 0 1");
        assert_eq!(a.generate_hash(), b.generate_hash());
        assert_ne!(a.generate_hash(), c.generate_hash());
    }
}
