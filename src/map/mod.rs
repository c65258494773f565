//! Map state: selections, color rules, isolation and the legend.
//!
//! Data flows one way: an action reaches the [`SelectionStore`], which runs
//! the [`multi_color`] rules, consults the [`IsolationFilter`], updates the
//! [`LegendIndex`] and then notifies observers.

pub mod isolation;
pub mod legend;
pub mod multi_color;
pub mod session;
pub mod store;

pub use isolation::{IsolationFilter, IsolationMode, IsolationState};
pub use legend::{LegendEntry, LegendFull, LegendIndex, LegendRow};
pub use session::{Action, ActionScript, MapSession, Notice};
pub use store::{Observer, Selection, SelectionSnapshot, SelectionStore, SetColorOutcome};
