//! GTP text codec: board coordinates and engine response payloads.
//!
//! KataGo's GTP coordinates are a column letter and a one-based row
//! number, with the letter 'I' skipped by convention. `kata-raw-nn`
//! answers with a block of whitespace-separated fields, of which the
//! bridge needs the white win probability, the white score lead, and the
//! flat per-point ownership vector.

use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// Board size the bridge serves. Ownership grids are always 19x19.
pub const BOARD_SIZE: usize = 19;

/// A genmove answer: either a point on the board or an explicit pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertex {
    Pass,
    Point { row: usize, col: usize },
}

/// Encode zero-based (row, col) as a GTP coordinate, e.g. (3, 3) -> "D4".
pub fn to_gtp(row: usize, col: usize) -> String {
    let skip = if col >= 8 { 1 } else { 0 };
    let letter = (b'A' + col as u8 + skip) as char;
    format!("{}{}", letter, row + 1)
}

/// Decode a GTP vertex. `"pass"` in any case is a pass; anything else must
/// be a column letter (never 'I') followed by a one-based row number
/// inside the board.
pub fn parse_vertex(text: &str) -> EngineResult<Vertex> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("pass") {
        return Ok(Vertex::Pass);
    }

    let first = text
        .chars()
        .next()
        .ok_or_else(|| parse_error("empty vertex"))?;
    if !first.is_ascii_alphabetic() {
        return Err(parse_error(format!("bad column letter in {text:?}")));
    }
    let letter = first.to_ascii_uppercase();
    if letter == 'I' {
        return Err(parse_error(format!("'I' is not a Go column ({text:?})")));
    }
    let mut col = (letter as u8 - b'A') as usize;
    if col >= 8 {
        col -= 1;
    }

    let row = text[1..]
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| parse_error(format!("bad row number in {text:?}")))?;

    if row >= BOARD_SIZE || col >= BOARD_SIZE {
        return Err(parse_error(format!("{text:?} is outside the board")));
    }
    Ok(Vertex::Point { row, col })
}

/// A position evaluation, converted to Black's perspective.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionAnalysis {
    /// Black win probability in percent, one decimal
    pub win_rate: f64,
    /// Black score lead in points, one decimal
    pub score_lead: f64,
    /// Per-point ownership estimate, 19x19, engine-native [-1, 1] scale
    pub territory: Vec<Vec<f64>>,
}

/// Parse a `kata-raw-nn all` response block. Analysis is all-or-nothing:
/// a missing field or an unparseable number fails the whole block rather
/// than producing a partial result. Lines with unknown prefixes are
/// ignored.
pub fn parse_raw_nn(raw: &str) -> EngineResult<PositionAnalysis> {
    let mut white_win = None;
    let mut score_lead = None;
    let mut territory = None;

    for line in raw.lines() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("whiteWin") => white_win = Some(parse_field(tokens.next(), "whiteWin")?),
            Some("scoreLead") => score_lead = Some(parse_field(tokens.next(), "scoreLead")?),
            Some("ownership") => {
                let values = tokens
                    .map(|token| token.parse::<f64>())
                    .collect::<Result<Vec<f64>, _>>()
                    .map_err(|_| parse_error("bad ownership value"))?;
                if values.len() != BOARD_SIZE * BOARD_SIZE {
                    return Err(parse_error(format!(
                        "expected {} ownership values, got {}",
                        BOARD_SIZE * BOARD_SIZE,
                        values.len()
                    )));
                }
                let mut grid = vec![vec![0.0; BOARD_SIZE]; BOARD_SIZE];
                for (i, value) in values.into_iter().enumerate() {
                    grid[i / BOARD_SIZE][i % BOARD_SIZE] = value;
                }
                territory = Some(grid);
            }
            _ => {}
        }
    }

    let white_win: f64 = white_win.ok_or_else(|| parse_error("missing whiteWin"))?;
    let score_lead: f64 = score_lead.ok_or_else(|| parse_error("missing scoreLead"))?;
    let territory = territory.ok_or_else(|| parse_error("missing ownership"))?;

    Ok(PositionAnalysis {
        win_rate: round_one(100.0 * (1.0 - white_win)),
        score_lead: round_one(-score_lead),
        territory,
    })
}

fn parse_field(token: Option<&str>, field: &str) -> EngineResult<f64> {
    token
        .ok_or_else(|| parse_error(format!("missing {field} value")))?
        .parse()
        .map_err(|_| parse_error(format!("bad {field} value")))
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn parse_error(message: impl Into<String>) -> EngineError {
    EngineError::Parse {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_examples() {
        assert_eq!(to_gtp(3, 3), "D4");
        assert_eq!(to_gtp(0, 8), "J1"); // I is skipped
        assert_eq!(to_gtp(15, 15), "Q16");
        assert_eq!(to_gtp(18, 18), "T19");
    }

    #[test]
    fn test_round_trip_over_the_whole_board() {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let coord = to_gtp(row, col);
                assert!(!coord.contains('I'), "{coord} must not use 'I'");
                assert_eq!(
                    parse_vertex(&coord).unwrap(),
                    Vertex::Point { row, col },
                    "round-trip failed for {coord}"
                );
            }
        }
    }

    #[test]
    fn test_pass_in_any_case() {
        assert_eq!(parse_vertex("pass").unwrap(), Vertex::Pass);
        assert_eq!(parse_vertex("PASS").unwrap(), Vertex::Pass);
        assert_eq!(parse_vertex(" Pass ").unwrap(), Vertex::Pass);
    }

    #[test]
    fn test_malformed_vertices_fail() {
        for bad in ["", "99", "D0", "D", "Dx", "I5", "U1", "A20", "resign"] {
            assert!(
                parse_vertex(bad).is_err(),
                "{bad:?} should be a parse error"
            );
        }
    }

    #[test]
    fn test_lowercase_vertex_parses() {
        assert_eq!(parse_vertex("q16").unwrap(), Vertex::Point { row: 15, col: 15 });
    }

    fn sample_block(ownership_len: usize) -> String {
        let ownership: Vec<String> = (0..ownership_len)
            .map(|i| if i == 0 { "0.5".into() } else { "0.0".into() })
            .collect();
        format!(
            "whiteWin 0.3\nscoreLead -2.5\nownership {}",
            ownership.join(" ")
        )
    }

    #[test]
    fn test_analysis_block_parses_to_black_perspective() {
        let analysis = parse_raw_nn(&sample_block(361)).unwrap();
        assert_eq!(analysis.win_rate, 70.0);
        assert_eq!(analysis.score_lead, 2.5);
        assert_eq!(analysis.territory.len(), 19);
        assert_eq!(analysis.territory[0].len(), 19);
        assert_eq!(analysis.territory[0][0], 0.5);
        assert_eq!(analysis.territory[18][18], 0.0);
    }

    #[test]
    fn test_analysis_ignores_unknown_lines() {
        let block = format!("policy 0.1 0.2\n{}\nsymmetry 3", sample_block(361));
        assert!(parse_raw_nn(&block).is_ok());
    }

    #[test]
    fn test_analysis_is_all_or_nothing() {
        // Missing ownership
        assert!(parse_raw_nn("whiteWin 0.3\nscoreLead -2.5").is_err());
        // Missing whiteWin
        let no_win = sample_block(361).replace("whiteWin", "whiteLoss");
        assert!(parse_raw_nn(&no_win).is_err());
        // Wrong ownership count
        assert!(parse_raw_nn(&sample_block(360)).is_err());
        // Unparseable number
        let bad = sample_block(361).replace("0.3", "zero.three");
        assert!(parse_raw_nn(&bad).is_err());
    }

    #[test]
    fn test_ownership_fills_row_major() {
        let ownership: Vec<String> = (0..361).map(|i| format!("{}", i as f64 / 1000.0)).collect();
        let block = format!(
            "whiteWin 0.5\nscoreLead 0\nownership {}",
            ownership.join(" ")
        );
        let analysis = parse_raw_nn(&block).unwrap();
        // flat index 20 lands at (1, 1)
        assert_eq!(analysis.territory[1][1], 0.020);
        assert_eq!(analysis.territory[18][18], 0.360);
    }
}
