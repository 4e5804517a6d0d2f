use crate::board::position::Position;
use crate::moves::mv::Castle;
use crate::types::piece::{Color, PieceName};
use crate::types::square::Square;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parses a FEN string into a fully initialized `Position`, including its
/// zobrist key, threat mask, and checkers/pinned sets.
pub fn build_position(fen_string: &str) -> Position {
    let mut pos = Position::empty();
    let fields: Vec<&str> = fen_string.split(['/', ' ']).collect();
    let mut iter = fields.iter();

    for row in (0..8).rev() {
        let entry = iter.next().expect("fen board field missing");
        let mut file = 0usize;
        for c in entry.chars() {
            if c.is_ascii_digit() {
                file += c.to_digit(10).unwrap() as usize;
                continue;
            }
            let square = Square((row * 8 + file) as u8);
            let (name, color) = match c {
                'K' => (PieceName::King, Color::White),
                'Q' => (PieceName::Queen, Color::White),
                'R' => (PieceName::Rook, Color::White),
                'N' => (PieceName::Knight, Color::White),
                'B' => (PieceName::Bishop, Color::White),
                'P' => (PieceName::Pawn, Color::White),
                'k' => (PieceName::King, Color::Black),
                'q' => (PieceName::Queen, Color::Black),
                'r' => (PieceName::Rook, Color::Black),
                'b' => (PieceName::Bishop, Color::Black),
                'n' => (PieceName::Knight, Color::Black),
                'p' => (PieceName::Pawn, Color::Black),
                _ => panic!("unrecognized fen piece char {c}"),
            };
            pos.place_piece(crate::types::piece::Piece::new(name, color), square);
            file += 1;
        }
    }

    pos.side_to_move = match iter.next().and_then(|s| s.chars().next()) {
        Some('w') => Color::White,
        Some('b') => Color::Black,
        _ => panic!("invalid side to move field"),
    };

    pos.castling_rights = parse_castling(iter.next().expect("fen castling field missing"));

    let en_passant_chars: Vec<char> = iter.next().expect("fen en passant field missing").chars().collect();
    if let Some(sq) = parse_en_passant_square(&en_passant_chars) {
        pos.en_passant_square = Some(sq);
    }

    if let Some(half_moves) = iter.next().and_then(|s| s.parse().ok()) {
        pos.half_moves = half_moves;
    }

    if let Some(full_moves) = iter.next().and_then(|s| s.parse().ok()) {
        pos.full_moves = full_moves;
    }

    pos.zobrist_hash = pos.generate_hash();
    pos
}

fn parse_castling(field: &str) -> u8 {
    field.chars().fold(0, |acc, ch| {
        acc | match ch {
            'K' => Castle::WhiteKing as u8,
            'Q' => Castle::WhiteQueen as u8,
            'k' => Castle::BlackKing as u8,
            'q' => Castle::BlackQueen as u8,
            _ => 0,
        }
    })
}

fn parse_en_passant_square(chars: &[char]) -> Option<Square> {
    if chars.is_empty() || chars[0] == '-' {
        return None;
    }
    let file = chars[0].to_digit(20)? - 10;
    let rank = (chars[1].to_digit(10)? - 1) * 8;
    Some(Square((rank + file) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_en_passant_squares() {
        assert_eq!(parse_en_passant_square(&['a', '1']), Some(Square(0)));
        assert_eq!(parse_en_passant_square(&['e', '5']), Some(Square(36)));
        assert_eq!(parse_en_passant_square(&['-']), None);
    }

    #[test]
    fn parses_combined_castling_rights() {
        assert_eq!(
            parse_castling("KQkq"),
            Castle::WhiteKing as u8 | Castle::WhiteQueen as u8 | Castle::BlackKing as u8 | Castle::BlackQueen as u8
        );
        assert_eq!(parse_castling("Kk"), Castle::WhiteKing as u8 | Castle::BlackKing as u8);
        assert_eq!(parse_castling("-"), 0);
    }

    #[test]
    fn starting_fen_has_sixteen_pieces_per_side() {
        let pos = build_position(STARTING_FEN);
        assert_eq!(pos.color(Color::White).count_bits(), 16);
        assert_eq!(pos.color(Color::Black).count_bits(), 16);
        assert_eq!(pos.side_to_move, Color::White);
        assert_eq!(pos.castling_rights, 0b1111);
    }

    #[test]
    fn fen_round_trips_half_move_clock() {
        let pos = build_position("8/8/8/4k3/8/8/8/4K3 w - - 17 30");
        assert_eq!(pos.half_moves, 17);
        assert_eq!(pos.full_moves, 30);
    }
}
