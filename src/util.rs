mod offset_vec;
mod timing;

pub use offset_vec::*;
pub use timing::*;
