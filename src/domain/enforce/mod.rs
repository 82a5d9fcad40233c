pub mod enforcer;

pub use enforcer::{GrainTypeEnforcer, SlotRule};
