use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 102, g: 204, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 191, b: 0 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 220, g: 220, b: 220 };
pub const ALLOWED: Color = Color::BrightGreen;
pub const DENIED: Color = Color::BrightRed;
pub const SECRET: Color = Color::BrightYellow;
