//! Domain types for OscLab

pub mod bar;
pub mod error;
pub mod float_serde;
pub mod mask;
pub mod position;
pub mod series;
pub mod trade;

pub use bar::Bar;
pub use error::InputError;
pub use mask::ActionMask;
pub use position::Position;
pub use series::PriceSeries;
pub use trade::TradeRecord;
