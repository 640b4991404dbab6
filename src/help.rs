mod printer;
mod table;

pub use self::printer::*;
pub use self::table::*;
