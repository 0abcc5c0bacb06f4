use glam::DVec2;

/// Absolute draw commands of the path-data mini-language.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AbsolutePathCommand {
	M(DVec2),
	L(DVec2),
	H(f64),
	V(f64),
	C(DVec2, DVec2, DVec2),
	S(DVec2, DVec2),
	Q(DVec2, DVec2),
	T(DVec2),
	A(f64, f64, f64, bool, bool, DVec2),
	Z,
}

/// Relative draw commands, offsets from the current point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RelativePathCommand {
	M(DVec2),
	L(DVec2),
	H(f64),
	V(f64),
	C(DVec2, DVec2, DVec2),
	S(DVec2, DVec2),
	Q(DVec2, DVec2),
	T(DVec2),
	A(f64, f64, f64, bool, bool, DVec2),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
	Absolute(AbsolutePathCommand),
	Relative(RelativePathCommand),
}

/// Resolves relative commands against the running current point.
pub fn to_absolute_commands<I>(commands: I) -> impl Iterator<Item = AbsolutePathCommand>
where
	I: IntoIterator<Item = PathCommand>,
{
	let mut current = DVec2::ZERO;
	let mut subpath_start = DVec2::ZERO;

	commands.into_iter().map(move |command| {
		let absolute = match command {
			PathCommand::Absolute(abs) => match abs {
				AbsolutePathCommand::H(x) => AbsolutePathCommand::L(DVec2::new(x, current.y)),
				AbsolutePathCommand::V(y) => AbsolutePathCommand::L(DVec2::new(current.x, y)),
				other => other,
			},
			PathCommand::Relative(rel) => match rel {
				RelativePathCommand::M(d) => AbsolutePathCommand::M(current + d),
				RelativePathCommand::L(d) => AbsolutePathCommand::L(current + d),
				RelativePathCommand::H(dx) => AbsolutePathCommand::L(current + DVec2::new(dx, 0.)),
				RelativePathCommand::V(dy) => AbsolutePathCommand::L(current + DVec2::new(0., dy)),
				RelativePathCommand::C(c1, c2, end) => AbsolutePathCommand::C(current + c1, current + c2, current + end),
				RelativePathCommand::S(c2, end) => AbsolutePathCommand::S(current + c2, current + end),
				RelativePathCommand::Q(c, end) => AbsolutePathCommand::Q(current + c, current + end),
				RelativePathCommand::T(end) => AbsolutePathCommand::T(current + end),
				RelativePathCommand::A(rx, ry, rotation, large_arc, sweep, end) => AbsolutePathCommand::A(rx, ry, rotation, large_arc, sweep, current + end),
			},
		};

		match absolute {
			AbsolutePathCommand::M(p) => {
				current = p;
				subpath_start = p;
			}
			AbsolutePathCommand::L(p) | AbsolutePathCommand::T(p) => current = p,
			AbsolutePathCommand::C(_, _, p) | AbsolutePathCommand::S(_, p) | AbsolutePathCommand::Q(_, p) => current = p,
			AbsolutePathCommand::A(_, _, _, _, _, p) => current = p,
			AbsolutePathCommand::H(x) => current.x = x,
			AbsolutePathCommand::V(y) => current.y = y,
			AbsolutePathCommand::Z => current = subpath_start,
		}

		absolute
	})
}
