use std::fmt;

/// How much the trusted path precomputes for layout. Higher modes give the
/// layout system better metrics at the cost of exposing more about the text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
    #[default]
    Standard,
    Less,
    More,
    Max,
}

impl LayoutMode {
    pub const ALL: [LayoutMode; 4] = [
        LayoutMode::Standard,
        LayoutMode::Less,
        LayoutMode::More,
        LayoutMode::Max,
    ];

    /// Case-insensitive match against `LESS`, `MORE` and `MAX`. Anything else,
    /// including the literal `STANDARD`, falls through to the default.
    pub fn parse(input: &str) -> Self {
        [LayoutMode::Less, LayoutMode::More, LayoutMode::Max]
            .into_iter()
            .find(|mode| input.eq_ignore_ascii_case(mode.as_str()))
            .unwrap_or_else(|| {
                tracing::debug!(input, "unrecognized layout mode, using STANDARD");
                LayoutMode::Standard
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutMode::Standard => "STANDARD",
            LayoutMode::Less => "LESS",
            LayoutMode::More => "MORE",
            LayoutMode::Max => "MAX",
        }
    }

    pub fn next(self) -> Self {
        match self {
            LayoutMode::Standard => LayoutMode::Less,
            LayoutMode::Less => LayoutMode::More,
            LayoutMode::More => LayoutMode::Max,
            LayoutMode::Max => LayoutMode::Standard,
        }
    }
}

impl From<&str> for LayoutMode {
    fn from(input: &str) -> Self {
        LayoutMode::parse(input)
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
