use path_arrange::{CapType, FillRule, JoinType, StrokeStyle};

/// Style attributes the geometry core consumes; everything else about
/// rendering lives outside this crate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
	pub fill_rule: FillRuleAttr,
	pub stroke: Option<StrokeAttr>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillRuleAttr {
	#[default]
	NonZero,
	EvenOdd,
}

impl FillRuleAttr {
	/// Parses the fill-rule keyword; unknown values fall back to nonzero.
	pub fn from_keyword(keyword: &str) -> Self {
		match keyword {
			"evenodd" => FillRuleAttr::EvenOdd,
			_ => FillRuleAttr::NonZero,
		}
	}

	pub fn to_fill_rule(self) -> FillRule {
		match self {
			FillRuleAttr::NonZero => FillRule::NonZero,
			FillRuleAttr::EvenOdd => FillRule::EvenOdd,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeAttr {
	pub width: f64,
	pub join: JoinType,
	pub cap: CapType,
	pub miter_limit: f64,
	pub dashes: Vec<f64>,
	pub dash_offset: f64,
}

impl Default for StrokeAttr {
	fn default() -> Self {
		StrokeAttr {
			width: 1.,
			join: JoinType::Miter,
			cap: CapType::Butt,
			miter_limit: 4.,
			dashes: Vec::new(),
			dash_offset: 0.,
		}
	}
}

impl StrokeAttr {
	/// Unknown join keywords mean a straight (bevel) join.
	pub fn join_from_keyword(keyword: &str) -> JoinType {
		match keyword {
			"miter" => JoinType::Miter,
			"round" => JoinType::Round,
			_ => JoinType::Bevel,
		}
	}

	/// Unknown cap keywords mean a square cap.
	pub fn cap_from_keyword(keyword: &str) -> CapType {
		match keyword {
			"butt" => CapType::Butt,
			"round" => CapType::Round,
			_ => CapType::Square,
		}
	}

	pub fn to_stroke_style(&self) -> StrokeStyle {
		StrokeStyle {
			width: self.width,
			join: self.join,
			cap: self.cap,
			miter_limit: self.miter_limit,
			dashes: self.dashes.clone(),
			dash_offset: self.dash_offset,
		}
	}
}
