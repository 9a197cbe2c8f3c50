pub mod candle;
pub mod exchange;
pub mod signals;

pub use candle::*;
pub use exchange::*;
pub use signals::*;
