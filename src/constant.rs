pub(crate) const DEFAULT_SEPARATOR: &str = "=";
pub(crate) const DEFAULT_PROGRAM_NAME: &str = "<main class>";

// The default tables are sized so a full row is exactly 80 characters.
pub(crate) const USAGE_WIDTH: usize = 80;

// Continuation lines of a wrapped/spanned cell sit this much deeper than the cell's indent.
pub(crate) const WRAP_INDENT: usize = 4;

#[cfg(windows)]
pub(crate) const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub(crate) const LINE_SEPARATOR: &str = "\n";
