use std::fmt::Write;
use std::sync::LazyLock;

use glam::DVec2;
use regex::Regex;

use crate::path::{Path, path_from_commands};
use crate::path_command::{AbsolutePathCommand, PathCommand, RelativePathCommand};
use crate::path_segment::PathSegment;

#[derive(Clone, Debug, PartialEq)]
pub enum PathDataError {
	UnexpectedToken { token: String, offset: usize },
	MissingNumber { command: char, offset: usize },
	BadFlag { token: String, offset: usize },
}

impl std::fmt::Display for PathDataError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			PathDataError::UnexpectedToken { token, offset } => write!(f, "unexpected token {token:?} at offset {offset}"),
			PathDataError::MissingNumber { command, offset } => write!(f, "missing number for command {command:?} at offset {offset}"),
			PathDataError::BadFlag { token, offset } => write!(f, "expected arc flag 0 or 1, found {token:?} at offset {offset}"),
		}
	}
}

impl std::error::Error for PathDataError {}

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
	// A command letter, or a number (sign, decimals, exponent).
	Regex::new(r"[MmLlHhVvCcSsQqTtAaZz]|[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid token pattern")
});

struct Tokens<'a> {
	tokens: Vec<(usize, &'a str)>,
	index: usize,
}

impl<'a> Tokens<'a> {
	fn new(data: &'a str) -> Result<Self, PathDataError> {
		// Anything between tokens must be argument separators.
		let check_gap = |gap: &str, start: usize| match gap.char_indices().find(|(_, c)| !c.is_ascii_whitespace() && *c != ',') {
			Some((i, bad)) => Err(PathDataError::UnexpectedToken {
				token: bad.to_string(),
				offset: start + i,
			}),
			None => Ok(()),
		};

		let mut tokens = Vec::new();
		let mut scanned = 0;
		for m in TOKEN.find_iter(data) {
			check_gap(&data[scanned..m.start()], scanned)?;
			scanned = m.end();
			tokens.push((m.start(), m.as_str()));
		}
		check_gap(&data[scanned..], scanned)?;
		Ok(Tokens { tokens, index: 0 })
	}

	fn peek(&self) -> Option<(usize, &'a str)> {
		self.tokens.get(self.index).copied()
	}

	fn number(&mut self, command: char) -> Result<f64, PathDataError> {
		let (offset, token) = self.peek().ok_or(PathDataError::MissingNumber { command, offset: usize::MAX })?;
		let value = token.parse().map_err(|_| PathDataError::MissingNumber { command, offset })?;
		self.index += 1;
		Ok(value)
	}

	fn point(&mut self, command: char) -> Result<DVec2, PathDataError> {
		Ok(DVec2::new(self.number(command)?, self.number(command)?))
	}

	/// Arc flags are single characters, so `0110` packs four flag/number
	/// tokens; only the leading character is consumed here.
	fn flag(&mut self, command: char) -> Result<bool, PathDataError> {
		let (offset, token) = self.peek().ok_or(PathDataError::MissingNumber { command, offset: usize::MAX })?;
		let flag = match token.as_bytes().first() {
			Some(b'0') => false,
			Some(b'1') => true,
			_ => return Err(PathDataError::BadFlag { token: token.into(), offset }),
		};
		if token.len() == 1 {
			self.index += 1;
		} else {
			self.tokens[self.index] = (offset + 1, &token[1..]);
		}
		Ok(flag)
	}

	/// Whether the next token starts another argument group (a number, not a command).
	fn has_arguments(&self) -> bool {
		self.peek().is_some_and(|(_, token)| !token.chars().next().is_some_and(|c| c.is_ascii_alphabetic()))
	}
}

/// Parses the path-data mini-language. Commands may repeat their argument
/// groups implicitly; an implicit repeat of `M`/`m` becomes `L`/`l`.
pub fn path_from_path_data(data: &str) -> Result<Path, PathDataError> {
	let mut tokens = Tokens::new(data)?;
	let mut commands = Vec::new();

	while let Some((offset, token)) = tokens.peek() {
		let mut command = token.chars().next().ok_or(PathDataError::UnexpectedToken { token: token.into(), offset })?;
		if !command.is_ascii_alphabetic() {
			return Err(PathDataError::UnexpectedToken { token: token.into(), offset });
		}
		tokens.index += 1;

		let mut first_group = true;
		loop {
			if !first_group && !tokens.has_arguments() {
				break;
			}
			commands.push(parse_group(command, &mut tokens)?);
			if matches!(command, 'Z' | 'z') {
				break;
			}
			// Implicit lineto after a moveto's first coordinate pair.
			command = match command {
				'M' => 'L',
				'm' => 'l',
				other => other,
			};
			first_group = false;
		}
	}

	Ok(path_from_commands(commands))
}

fn parse_group(command: char, tokens: &mut Tokens) -> Result<PathCommand, PathDataError> {
	use AbsolutePathCommand as Abs;
	use RelativePathCommand as Rel;

	Ok(match command {
		'M' => PathCommand::Absolute(Abs::M(tokens.point(command)?)),
		'm' => PathCommand::Relative(Rel::M(tokens.point(command)?)),
		'L' => PathCommand::Absolute(Abs::L(tokens.point(command)?)),
		'l' => PathCommand::Relative(Rel::L(tokens.point(command)?)),
		'H' => PathCommand::Absolute(Abs::H(tokens.number(command)?)),
		'h' => PathCommand::Relative(Rel::H(tokens.number(command)?)),
		'V' => PathCommand::Absolute(Abs::V(tokens.number(command)?)),
		'v' => PathCommand::Relative(Rel::V(tokens.number(command)?)),
		'C' => PathCommand::Absolute(Abs::C(tokens.point(command)?, tokens.point(command)?, tokens.point(command)?)),
		'c' => PathCommand::Relative(Rel::C(tokens.point(command)?, tokens.point(command)?, tokens.point(command)?)),
		'S' => PathCommand::Absolute(Abs::S(tokens.point(command)?, tokens.point(command)?)),
		's' => PathCommand::Relative(Rel::S(tokens.point(command)?, tokens.point(command)?)),
		'Q' => PathCommand::Absolute(Abs::Q(tokens.point(command)?, tokens.point(command)?)),
		'q' => PathCommand::Relative(Rel::Q(tokens.point(command)?, tokens.point(command)?)),
		'T' => PathCommand::Absolute(Abs::T(tokens.point(command)?)),
		't' => PathCommand::Relative(Rel::T(tokens.point(command)?)),
		'A' => {
			let (rx, ry) = (tokens.number(command)?, tokens.number(command)?);
			let rotation = tokens.number(command)?;
			let (large_arc, sweep) = (tokens.flag(command)?, tokens.flag(command)?);
			PathCommand::Absolute(Abs::A(rx, ry, rotation, large_arc, sweep, tokens.point(command)?))
		}
		'a' => {
			let (rx, ry) = (tokens.number(command)?, tokens.number(command)?);
			let rotation = tokens.number(command)?;
			let (large_arc, sweep) = (tokens.flag(command)?, tokens.flag(command)?);
			PathCommand::Relative(Rel::A(rx, ry, rotation, large_arc, sweep, tokens.point(command)?))
		}
		'Z' | 'z' => PathCommand::Absolute(Abs::Z),
		other => {
			return Err(PathDataError::UnexpectedToken {
				token: other.to_string(),
				offset: tokens.peek().map(|(offset, _)| offset).unwrap_or(usize::MAX),
			});
		}
	})
}

/// Serializes a path back to path-data text with absolute commands.
pub fn path_to_path_data(path: &Path) -> String {
	let mut out = String::new();
	let mut write_point = |out: &mut String, p: DVec2| {
		let _ = write!(out, "{},{}", format_number(p.x), format_number(p.y));
	};

	for subpath in &path.subpaths {
		if !out.is_empty() {
			out.push(' ');
		}
		out.push_str("M ");
		write_point(&mut out, subpath.anchor);
		for segment in &subpath.segments {
			match *segment {
				PathSegment::Line(_, end) => {
					out.push_str(" L ");
					write_point(&mut out, end);
				}
				PathSegment::Quadratic(_, c, end) => {
					out.push_str(" Q ");
					write_point(&mut out, c);
					out.push(' ');
					write_point(&mut out, end);
				}
				PathSegment::Cubic(_, c1, c2, end) => {
					out.push_str(" C ");
					write_point(&mut out, c1);
					out.push(' ');
					write_point(&mut out, c2);
					out.push(' ');
					write_point(&mut out, end);
				}
				PathSegment::Arc(_, rx, ry, rotation, large_arc, sweep, end) => {
					let _ = write!(out, " A {},{} {} {} {} ", format_number(rx), format_number(ry), format_number(rotation), u8::from(large_arc), u8::from(sweep));
					write_point(&mut out, end);
				}
			}
		}
		if subpath.closed {
			out.push_str(" Z");
		}
	}
	out
}

/// Enough digits to round-trip well past 1e-6, without trailing zero noise.
fn format_number(value: f64) -> String {
	let mut s = format!("{value:.9}");
	if s.contains('.') {
		while s.ends_with('0') {
			s.pop();
		}
		if s.ends_with('.') {
			s.pop();
		}
	}
	if s == "-0" { "0".into() } else { s }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::path_segment::PathSegment;

	#[test]
	fn parses_commands_and_implicit_linetos() {
		let path = path_from_path_data("M 10 10 20 10 L 20 20 Z").unwrap();
		assert_eq!(path.subpaths.len(), 1);
		let subpath = &path.subpaths[0];
		assert!(subpath.closed);
		// Two explicit/implicit linetos plus the closing line.
		assert_eq!(subpath.segments.len(), 3);
		assert_eq!(subpath.segments[0], PathSegment::Line(DVec2::new(10., 10.), DVec2::new(20., 10.)));
	}

	#[test]
	fn parses_relative_and_shorthand() {
		let path = path_from_path_data("m 0,0 c 1,0 2,1 3,0 s 2,-1 3,0 h 2 v 3").unwrap();
		let subpath = &path.subpaths[0];
		assert_eq!(subpath.segments.len(), 4);
		let PathSegment::Cubic(start, c1, _, _) = subpath.segments[1] else {
			panic!("expected reflected cubic");
		};
		// S reflects the previous cubic's outgoing control point.
		assert_eq!(c1, start * 2. - DVec2::new(2., 1.));
	}

	#[test]
	fn parses_arc_flags_without_separators() {
		let path = path_from_path_data("M 0 0 A 5 5 0 0110 0").unwrap();
		let PathSegment::Arc(_, rx, _, _, large_arc, sweep, end) = path.subpaths[0].segments[0] else {
			panic!("expected arc");
		};
		assert_eq!((rx, large_arc, sweep), (5., false, true));
		assert_eq!(end, DVec2::new(10., 0.));
	}

	#[test]
	fn rejects_garbage() {
		assert_eq!(
			path_from_path_data("M 1 1 X 2 2"),
			Err(PathDataError::UnexpectedToken { token: "X".into(), offset: 6 })
		);
		assert!(path_from_path_data("M 1").is_err());
		assert!(path_from_path_data("M 1 1 L 2#2").is_err());
	}

	#[test]
	fn round_trip_preserves_coordinates() {
		let source = "M 0.1,0.2 L 10.123456,0.2 C 10.5,3.25 7,8.125 0.1,0.2 Q 1,2 3,4 A 5,5 0 1 0 -3,4 Z M 100,100 L 101,100.000001";
		let original = path_from_path_data(source).unwrap();
		let reparsed = path_from_path_data(&path_to_path_data(&original)).unwrap();
		assert_eq!(original.subpaths.len(), reparsed.subpaths.len());
		for (a, b) in original.subpaths.iter().zip(&reparsed.subpaths) {
			assert_eq!(a.closed, b.closed);
			assert!(a.anchor.abs_diff_eq(b.anchor, 1e-6));
			for (sa, sb) in a.segments.iter().zip(&b.segments) {
				for t in [0., 0.25, 0.5, 0.75, 1.] {
					assert!(sa.sample_at(t).abs_diff_eq(sb.sample_at(t), 1e-6));
				}
			}
		}
	}
}
