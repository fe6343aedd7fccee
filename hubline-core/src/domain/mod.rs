//! Domain types for Hubline

pub mod bar;
pub mod fill;
pub mod order;
pub mod position;
pub mod snapshot;
pub mod trade;

pub use bar::{Bar, BarError, BarSeries, PriceField};
pub use fill::Fill;
pub use order::{FillRule, Order, OrderQuantity, OrderSide};
pub use position::Position;
pub use snapshot::PortfolioSnapshot;
pub use trade::Trade;
