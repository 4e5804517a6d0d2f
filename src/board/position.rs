use core::fmt;

use crate::board::attack_boards::{king_attacks, knight_attacks, pawn_attacks, pawn_set_attacks, BETWEEN_SQUARES, RANKS};
use crate::board::fen::STARTING_FEN;
use crate::board::magics::{bishop_attacks, queen_attacks, rook_attacks};
use crate::board::zobrist::ZOBRIST;
use crate::moves::mv::{Castle, Direction, Move, CASTLING_RIGHTS};
use crate::types::bitboard::Bitboard;
use crate::types::piece::{Color, Piece, PieceName};
use crate::types::square::Square;

/// The board representation and game state the search core treats as an
/// external, read-only collaborator: bitboards, mailbox, side to move,
/// castling rights, en passant square, and the incrementally maintained
/// zobrist key. Evaluation and move generation live on top of this type but
/// the type itself carries no evaluation state.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Position {
    bitboards: [Bitboard; 6],
    color_occupancies: [Bitboard; 2],
    mailbox: [Piece; 64],
    pub side_to_move: Color,
    pub castling_rights: u8,
    pub en_passant_square: Option<Square>,
    pub full_moves: usize,
    pub half_moves: usize,
    pub zobrist_hash: u64,
    pub last_move: Move,
    threats: Bitboard,
    checkers: Bitboard,
    pinned: Bitboard,
}

impl Default for Position {
    fn default() -> Self {
        crate::board::fen::build_position(STARTING_FEN)
    }
}

impl Position {
    pub fn empty() -> Self {
        Self {
            bitboards: [Bitboard::EMPTY; 6],
            color_occupancies: [Bitboard::EMPTY; 2],
            mailbox: [Piece::None; 64],
            side_to_move: Color::White,
            castling_rights: 0,
            en_passant_square: None,
            full_moves: 1,
            half_moves: 0,
            zobrist_hash: 0,
            last_move: Move::EMPTY,
            threats: Bitboard::EMPTY,
            checkers: Bitboard::EMPTY,
            pinned: Bitboard::EMPTY,
        }
    }

    pub fn bitboard(&self, side: Color, piece: PieceName) -> Bitboard {
        self.piece(piece) & self.color(side)
    }

    pub fn piece(&self, piece: PieceName) -> Bitboard {
        self.bitboards[piece.idx()]
    }

    pub fn color(&self, color: Color) -> Bitboard {
        self.color_occupancies[color.idx()]
    }

    pub fn occupancies(&self) -> Bitboard {
        self.color(Color::White) | self.color(Color::Black)
    }

    pub fn piece_at(&self, sq: Square) -> Piece {
        self.mailbox[sq]
    }

    /// Key used to index the transposition table and the repetition map.
    pub fn key(&self) -> u64 {
        self.zobrist_hash
    }

    /// Half-move clock since the last pawn move or capture.
    pub fn rule50(&self) -> usize {
        self.half_moves
    }

    fn is_material_draw(&self) -> bool {
        if self.piece(PieceName::Pawn) != Bitboard::EMPTY {
            return false;
        }
        let piece_count = self.occupancies().count_bits();
        if piece_count == 2
            || (piece_count == 3
                && (self.piece(PieceName::Knight).count_bits() == 1 || self.piece(PieceName::Bishop).count_bits() == 1))
        {
            return true;
        }
        if piece_count == 4 {
            if self.piece(PieceName::Knight).count_bits() == 2 {
                return true;
            }
            if self.color(Color::White).count_bits() == 2 && self.piece(PieceName::Bishop).count_bits() == 2 {
                return true;
            }
        }
        false
    }

    /// The piece that would be captured by `m`, `Piece::None` for quiet moves.
    pub fn capture(&self, m: Move) -> Piece {
        if m.is_en_passant_candidate() {
            Piece::new(PieceName::Pawn, !self.side_to_move)
        } else {
            self.piece_at(m.dest_square())
        }
    }

    /// Draw by the fifty-move rule or insufficient mating material. Threefold
    /// repetition and the history-keys draw are the search's responsibility,
    /// not the position's — see `isRepeat` on the worker's history map.
    pub fn is_draw(&self) -> bool {
        self.half_moves >= 100 || self.is_material_draw()
    }

    pub fn has_non_pawns(&self, side: Color) -> bool {
        self.occupancies() ^ self.bitboard(side, PieceName::King) ^ self.bitboard(side, PieceName::Pawn) != Bitboard::EMPTY
    }

    pub fn can_castle(&self, c: Castle) -> bool {
        match c {
            Castle::None => false,
            _ => self.castling_rights & c as u8 != 0,
        }
    }

    pub fn place_piece(&mut self, piece: Piece, sq: Square) {
        let color = piece.color();
        let name = piece.name();
        self.mailbox[sq] = piece;
        self.bitboards[name.idx()] ^= sq.bitboard();
        self.color_occupancies[color.idx()] ^= sq.bitboard();
        self.zobrist_hash ^= ZOBRIST.piece_square_hashes[color.idx()][name.idx()][sq.idx()];
    }

    fn remove_piece(&mut self, sq: Square) {
        let piece = self.mailbox[sq];
        if piece != Piece::None {
            self.mailbox[sq] = Piece::None;
            self.bitboards[piece.name().idx()] ^= sq.bitboard();
            self.color_occupancies[piece.color().idx()] ^= sq.bitboard();
            self.zobrist_hash ^= ZOBRIST.piece_square_hashes[piece.color().idx()][piece.name().idx()][sq.idx()];
        }
    }

    pub fn king_square(&self, color: Color) -> Square {
        self.bitboard(color, PieceName::King).lsb()
    }

    pub fn attackers(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        self.attackers_for_side(Color::White, sq, occupancy) | self.attackers_for_side(Color::Black, sq, occupancy)
    }

    pub fn attackers_for_side(&self, attacker: Color, sq: Square, occupancy: Bitboard) -> Bitboard {
        let bishops = self.piece(PieceName::Queen) | self.piece(PieceName::Bishop);
        let rooks = self.piece(PieceName::Queen) | self.piece(PieceName::Rook);
        let pawns = pawn_attacks(sq, !attacker) & self.piece(PieceName::Pawn);
        let knights = knight_attacks(sq) & self.piece(PieceName::Knight);
        let bishop_att = bishop_attacks(sq, occupancy) & bishops;
        let rook_att = rook_attacks(sq, occupancy) & rooks;
        let king_att = king_attacks(sq) & self.piece(PieceName::King);
        (pawns | knights | bishop_att | rook_att | king_att) & self.color(attacker)
    }

    pub fn square_under_attack(&self, attacker: Color, sq: Square) -> bool {
        self.attackers_for_side(attacker, sq, self.occupancies()) != Bitboard::EMPTY
    }

    pub fn in_check(&self) -> bool {
        self.checkers != Bitboard::EMPTY
    }

    pub fn checkers(&self) -> Bitboard {
        self.checkers
    }

    fn pinned_and_checkers(&mut self) {
        self.pinned = Bitboard::EMPTY;
        let attacker = !self.side_to_move;
        let king_sq = self.king_square(self.side_to_move);

        self.checkers = knight_attacks(king_sq) & self.bitboard(attacker, PieceName::Knight)
            | pawn_attacks(king_sq, self.side_to_move) & self.bitboard(attacker, PieceName::Pawn);

        let sliders_attacks = self.diags(attacker) & bishop_attacks(king_sq, Bitboard::EMPTY)
            | self.orthos(attacker) & rook_attacks(king_sq, Bitboard::EMPTY);
        for sq in sliders_attacks {
            let between = BETWEEN_SQUARES[sq.idx()][king_sq.idx()] & self.occupancies();
            if between == Bitboard::EMPTY {
                self.checkers |= sq.bitboard();
            } else if between.count_bits() == 1 {
                self.pinned |= between & self.color(self.side_to_move);
            }
        }
    }

    pub fn diags(&self, side: Color) -> Bitboard {
        self.bitboard(side, PieceName::Bishop) | self.bitboard(side, PieceName::Queen)
    }

    pub fn orthos(&self, side: Color) -> Bitboard {
        self.bitboard(side, PieceName::Rook) | self.bitboard(side, PieceName::Queen)
    }

    pub fn pinned(&self) -> Bitboard {
        self.pinned
    }

    pub fn threats(&self) -> Bitboard {
        self.threats
    }

    fn calculate_threats(&mut self) {
        let attacker = !self.side_to_move;
        let mut threats = Bitboard::EMPTY;
        let occ = self.occupancies() ^ self.king_square(self.side_to_move).bitboard();

        threats |= pawn_set_attacks(self.bitboard(attacker, PieceName::Pawn), attacker);

        let rooks = (self.piece(PieceName::Rook) | self.piece(PieceName::Queen)) & self.color(attacker);
        rooks.into_iter().for_each(|sq| threats |= rook_attacks(sq, occ));

        let bishops = (self.piece(PieceName::Bishop) | self.piece(PieceName::Queen)) & self.color(attacker);
        bishops.into_iter().for_each(|sq| threats |= bishop_attacks(sq, occ));

        self.bitboard(attacker, PieceName::Knight).into_iter().for_each(|sq| threats |= knight_attacks(sq));

        threats |= king_attacks(self.king_square(attacker));

        self.threats = threats;
    }

    /// Rejects moves that are syntactically plausible but not legal in this
    /// exact position, without needing to apply them. Complements, but does
    /// not replace, the king-safety check `make_move` performs after
    /// applying the move.
    pub fn is_pseudo_legal(&self, m: Move) -> bool {
        if m == Move::EMPTY {
            return false;
        }

        let from = m.origin_square();
        let to = m.dest_square();

        let moved_piece = self.piece_at(from);
        let captured_piece = self.piece_at(to);
        let is_capture = captured_piece != Piece::None;

        if moved_piece == Piece::None || moved_piece.name() != m.piece_moving() {
            return false;
        }
        if moved_piece.color() != self.side_to_move {
            return false;
        }
        if is_capture && captured_piece.color() == self.side_to_move {
            return false;
        }

        if m.is_castle() {
            if self.in_check() {
                return false;
            }
            if moved_piece.name() != PieceName::King {
                return false;
            }
            let castle = m.castle_type();
            if !self.can_castle(castle) {
                return false;
            }
            if self.occupancies() & castle_empty_squares(castle) != Bitboard::EMPTY {
                return false;
            }
            if castle_check_squares(castle) & self.threats() != Bitboard::EMPTY {
                return false;
            }
            return true;
        }

        match moved_piece.name() {
            PieceName::Pawn => {
                let is_double_push = m.is_double_push();
                if is_capture && is_double_push {
                    return false;
                }
                let should_promote = to.bitboard() & (RANKS[7] | RANKS[0]) != Bitboard::EMPTY;
                if should_promote != m.is_promotion() {
                    return false;
                }
                let up = match self.side_to_move {
                    Color::White => Direction::North,
                    Color::Black => Direction::South,
                };
                if m.is_en_passant_candidate() {
                    return Some(to) == self.en_passant_square;
                }
                if is_double_push {
                    let one_forward = from.shift(up);
                    return self.piece_at(one_forward) == Piece::None && to == one_forward.shift(up);
                }
                if !is_capture {
                    return to == from.shift(up) && captured_piece == Piece::None;
                }
                pawn_attacks(from, self.side_to_move) & to.bitboard() != Bitboard::EMPTY
            }
            PieceName::Knight => to.bitboard() & knight_attacks(from) != Bitboard::EMPTY,
            PieceName::Bishop => to.bitboard() & bishop_attacks(from, self.occupancies()) != Bitboard::EMPTY,
            PieceName::Rook => to.bitboard() & rook_attacks(from, self.occupancies()) != Bitboard::EMPTY,
            PieceName::Queen => to.bitboard() & queen_attacks(from, self.occupancies()) != Bitboard::EMPTY,
            PieceName::King => to.bitboard() & king_attacks(from) != Bitboard::EMPTY,
            PieceName::None => false,
        }
    }

    /// Applies `m` in place, returning `false` (and leaving the position
    /// mutated but logically discarded by the caller) iff the mover's king
    /// ends up in check — the pseudo-legal rejection the core relies on
    /// instead of a full legality pre-check.
    #[must_use]
    pub fn make_move(&mut self, m: Move) -> bool {
        let piece_moving = Piece::new(m.piece_moving(), self.side_to_move);
        let capture = self.capture(m);
        self.remove_piece(m.dest_square());

        if !m.is_promotion() {
            self.place_piece(piece_moving, m.dest_square());
        }
        self.remove_piece(m.origin_square());

        if m.is_castle() {
            let rook = Piece::new(PieceName::Rook, self.side_to_move);
            let castle = m.castle_type();
            self.place_piece(rook, castle_rook_dest(castle));
            self.remove_piece(castle_rook_src(castle));
        } else if m.is_promotion() {
            let promoted = Piece::new(m.promotion_piece(), self.side_to_move);
            self.place_piece(promoted, m.dest_square());
        } else if m.is_en_passant_candidate() && capture != Piece::None {
            match self.side_to_move {
                Color::White => self.remove_piece(m.dest_square().shift(Direction::South)),
                Color::Black => self.remove_piece(m.dest_square().shift(Direction::North)),
            }
        }

        if !self.king_square(self.side_to_move).is_valid() || self.square_under_attack(!self.side_to_move, self.king_square(self.side_to_move)) {
            return false;
        }

        if let Some(sq) = self.en_passant_square {
            self.zobrist_hash ^= ZOBRIST.en_passant[sq.idx()];
        }
        self.en_passant_square = None;
        if m.is_double_push() {
            self.en_passant_square = Some(match self.side_to_move {
                Color::White => m.dest_square().shift(Direction::South),
                Color::Black => m.dest_square().shift(Direction::North),
            });
        }
        if let Some(sq) = self.en_passant_square {
            self.zobrist_hash ^= ZOBRIST.en_passant[sq.idx()];
        }

        if capture == Piece::None && piece_moving.name() != PieceName::Pawn {
            self.half_moves += 1;
        } else {
            self.half_moves = 0;
        }

        self.zobrist_hash ^= ZOBRIST.castling[self.castling_rights as usize];
        self.castling_rights &= CASTLING_RIGHTS[m.origin_square().idx()] & CASTLING_RIGHTS[m.dest_square().idx()];
        self.zobrist_hash ^= ZOBRIST.castling[self.castling_rights as usize];

        self.side_to_move = !self.side_to_move;
        self.zobrist_hash ^= ZOBRIST.turn_hash;
        self.full_moves += 1;
        self.last_move = m;

        self.calculate_threats();
        self.pinned_and_checkers();

        true
    }

    /// Swaps side to move, clears `last_move`, and recomputes checkers and
    /// threats without touching pieces.
    pub fn make_null_move(&mut self) {
        self.side_to_move = !self.side_to_move;
        self.zobrist_hash ^= ZOBRIST.turn_hash;
        self.full_moves += 1;
        self.half_moves += 1;
        self.last_move = Move::EMPTY;
        if let Some(sq) = self.en_passant_square {
            self.zobrist_hash ^= ZOBRIST.en_passant[sq.idx()];
        }
        self.en_passant_square = None;
        self.calculate_threats();
        self.pinned_and_checkers();
    }
}

fn castle_rook_src(c: Castle) -> Square {
    match c {
        Castle::WhiteKing => Square(7),
        Castle::WhiteQueen => Square(0),
        Castle::BlackKing => Square(63),
        Castle::BlackQueen => Square(56),
        Castle::None => unreachable!(),
    }
}

fn castle_rook_dest(c: Castle) -> Square {
    match c {
        Castle::WhiteKing => Square(5),
        Castle::WhiteQueen => Square(3),
        Castle::BlackKing => Square(61),
        Castle::BlackQueen => Square(59),
        Castle::None => unreachable!(),
    }
}

fn castle_empty_squares(c: Castle) -> Bitboard {
    match c {
        Castle::WhiteKing => Bitboard(0x60),
        Castle::WhiteQueen => Bitboard(0xe),
        Castle::BlackKing => Bitboard(0x6000_0000_0000_0000),
        Castle::BlackQueen => Bitboard(0x0e00_0000_0000_0000),
        Castle::None => Bitboard::EMPTY,
    }
}

fn castle_check_squares(c: Castle) -> Bitboard {
    match c {
        Castle::WhiteKing => Bitboard(0x70),
        Castle::WhiteQueen => Bitboard(0x1c),
        Castle::BlackKing => Bitboard(0x7000_0000_0000_0000),
        Castle::BlackQueen => Bitboard(0x1c00_0000_0000_0000),
        Castle::None => Bitboard::EMPTY,
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for row in (0..8).rev() {
            s.push_str(&(row + 1).to_string());
            s.push_str(" | ");
            for col in 0..8 {
                let idx = row * 8 + col;
                s += self.piece_at(Square(idx)).char();
                s.push_str(" | ");
            }
            s.push('\n');
        }
        s.push_str("    a   b   c   d   e   f   g   h\n");
        write!(f, "{s}")
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", if self.side_to_move == Color::White { "White to move" } else { "Black to move" })?;
        write!(f, "{self}")?;
        writeln!(f, "checkers: {:?}", self.checkers)?;
        writeln!(f, "pinned: {:?}", self.pinned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen;

    #[test]
    fn place_piece_updates_bitboards() {
        let mut pos = Position::empty();
        pos.place_piece(Piece::WhiteRook, Square(0));
        assert!(pos.bitboard(Color::White, PieceName::Rook).occupied(Square(0)));
    }

    #[test]
    fn remove_piece_clears_bitboards() {
        let pos = fen::build_position(fen::STARTING_FEN);
        let mut c = pos;
        c.remove_piece(Square(0));
        assert!(c.bitboard(Color::White, PieceName::Rook).empty(Square(0)));
        assert_ne!(c, pos);
    }

    #[test]
    fn starting_position_has_no_checkers() {
        let pos = Position::default();
        assert!(!pos.in_check());
    }
}
