//! Visual theming for the incident graph.
//!
//! Colours and text styles for edges, labels, the arrowhead, the selection
//! highlight and the tooltip.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Edge line and label styling.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	pub color: Color,
	pub width: f64,
	pub label_color: Color,
	pub label_weight: &'static str,
	/// Vertical lift of the label off the line, in pixels.
	pub label_dy: f64,
}

/// Arrowhead marker styling.
#[derive(Clone, Debug)]
pub struct MarkerStyle {
	pub fill: Color,
	pub width: f64,
	pub height: f64,
}

/// Look of the selected node.
#[derive(Clone, Debug)]
pub struct SelectionStyle {
	pub glow: Color,
	pub glow_radius: f64,
	pub stroke: Color,
	pub stroke_width: f64,
}

impl SelectionStyle {
	/// CSS `filter` value for the glow.
	pub fn filter(&self) -> String {
		format!("drop-shadow(0 0 {}px {})", self.glow_radius, self.glow.to_css())
	}
}

/// Tooltip box styling, as CSS values.
#[derive(Clone, Debug)]
pub struct TooltipStyle {
	pub fill: String,
	pub border_width: String,
	pub border_color: String,
	pub corner: String,
	pub text_color: String,
	pub text_size: String,
	pub padding: String,
	pub max_width: String,
}

/// Token colours for the JSON dump in the tooltip.
#[derive(Clone, Debug)]
pub struct HighlightPalette {
	pub key: Color,
	pub string: Color,
	pub number: Color,
	pub boolean: Color,
	pub null: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub edge: EdgeStyle,
	pub marker: MarkerStyle,
	pub selection: SelectionStyle,
	pub tooltip: TooltipStyle,
	pub highlight: HighlightPalette,
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			edge: EdgeStyle {
				color: Color::rgb(0, 0, 0),
				width: 0.75,
				label_color: Color::rgb(0x66, 0x66, 0x66),
				label_weight: "500",
				label_dy: -2.0,
			},
			marker: MarkerStyle {
				fill: Color::rgb(0x99, 0x99, 0x99),
				width: 10.0,
				height: 10.0,
			},
			selection: SelectionStyle {
				glow: Color::rgba(0, 123, 255, 0.8),
				glow_radius: 8.0,
				stroke: Color::rgb(0x00, 0x7b, 0xff),
				stroke_width: 3.0,
			},
			tooltip: TooltipStyle {
				fill: "white".into(),
				border_width: "1px".into(),
				border_color: "black".into(),
				corner: "5px".into(),
				text_color: "black".into(),
				text_size: "11px".into(),
				padding: "5px".into(),
				max_width: "900px".into(),
			},
			highlight: HighlightPalette {
				key: Color::rgb(0xa3, 0x15, 0x15),
				string: Color::rgb(0x0b, 0x75, 0x00),
				number: Color::rgb(0x1c, 0x00, 0xcf),
				boolean: Color::rgb(0x00, 0x00, 0xff),
				null: Color::rgb(0x80, 0x80, 0x80),
			},
		}
	}
}

impl Theme {
	/// Stylesheet colouring highlighted JSON tokens below `scope`.
	pub fn highlight_css(&self, scope: &str) -> String {
		let h = &self.highlight;
		[
			("key", h.key),
			("string", h.string),
			("number", h.number),
			("boolean", h.boolean),
			("null", h.null),
		]
		.iter()
		.map(|(class, color)| format!("{scope} .{class} {{ color: {}; }}", color.to_css()))
		.collect::<Vec<_>>()
		.join("\n")
	}
}
