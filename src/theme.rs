use std::fmt;

/// Named colors the macro bodies and block templates refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    FuncName,
    FuncNameBackground,
    FuncBodyBackground,
    Control,
    BlueWord,
    Number,
    Class,
    Var,
    Text,
    Ladder,
    String,
}

impl ColorRole {
    /// Every role, in the order definitions are emitted.
    pub const ALL: [ColorRole; 11] = [
        ColorRole::FuncName,
        ColorRole::FuncNameBackground,
        ColorRole::FuncBodyBackground,
        ColorRole::Control,
        ColorRole::BlueWord,
        ColorRole::Number,
        ColorRole::Class,
        ColorRole::Var,
        ColorRole::Text,
        ColorRole::Ladder,
        ColorRole::String,
    ];

    /// The LaTeX color name.
    pub fn name(self) -> &'static str {
        match self {
            ColorRole::FuncName => "funcnamecolor",
            ColorRole::FuncNameBackground => "funcnamebgcolor",
            ColorRole::FuncBodyBackground => "funcbodybgcolor",
            ColorRole::Control => "controlcolor",
            ColorRole::BlueWord => "bluewordcolor",
            ColorRole::Number => "numbercolor",
            ColorRole::Class => "classcolor",
            ColorRole::Var => "varcolor",
            ColorRole::Text => "textcolor",
            ColorRole::Ladder => "laddercolor",
            ColorRole::String => "stringcolor",
        }
    }
}

/// Six-digit HTML hex value for each role, indexed like [`ColorRole::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTheme {
    name: &'static str,
    colors: [&'static str; 11],
}

const FUNC_YELLOW: &str = "DCDCAA";
const CONTROL_PURPLE: &str = "C586C0";
const KEYWORD_BLUE: &str = "569CD6";
const NUMBER_GREEN: &str = "B5CEA8";
const COMMENT_GREEN: &str = "6A9955";
const CLASS_GREEN: &str = "4EC9B0";
const VAR_BLUE: &str = "9CDCFE";
const CONST_BLUE: &str = "4FC1FF";
const STRING_ORANGE: &str = "CE9178";

impl ColorTheme {
    /// Black text on a pale blue name bar.
    pub const DEFAULT: ColorTheme = ColorTheme {
        name: "default",
        colors: [
            "000000", "CDF0FE", "FFFFFF", "000000", "000000", "000000", "000000", "000000",
            "000000", "000000", "000000",
        ],
    };

    pub const LIGHT: ColorTheme = ColorTheme {
        name: "light",
        colors: [
            "DB861F",
            "EEEEEE",
            "FFFFFF",
            "A679DC",
            "0086D1",
            COMMENT_GREEN,
            CLASS_GREEN,
            CONST_BLUE,
            "000000",
            "777777",
            STRING_ORANGE,
        ],
    };

    pub const DARK: ColorTheme = ColorTheme {
        name: "dark",
        colors: [
            FUNC_YELLOW,
            "444444",
            "222222",
            CONTROL_PURPLE,
            KEYWORD_BLUE,
            NUMBER_GREEN,
            CLASS_GREEN,
            VAR_BLUE,
            "FFFFFF",
            "555555",
            STRING_ORANGE,
        ],
    };

    /// Selectable presets; the CLI's `--theme` is an index into this.
    pub const PRESETS: [&'static ColorTheme; 3] =
        [&ColorTheme::DEFAULT, &ColorTheme::LIGHT, &ColorTheme::DARK];

    pub fn preset(index: usize) -> Option<&'static ColorTheme> {
        Self::PRESETS.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn color(&self, role: ColorRole) -> &'static str {
        self.colors[role as usize]
    }
}

impl Default for ColorTheme {
    fn default() -> Self {
        ColorTheme::DEFAULT
    }
}

/// One `\definecolor{role}{HTML}{value}` line per role.
impl fmt::Display for ColorTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, role) in ColorRole::ALL.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "\\definecolor{{{}}}{{HTML}}{{{}}}", role.name(), self.colors[i])?;
        }
        Ok(())
    }
}
