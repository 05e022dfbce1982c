//! 命令定义和实现

pub mod preset;
pub mod simulate;
pub mod stats;
pub mod validate;

pub use preset::PresetCommand;
pub use simulate::SimulateCommand;
pub use stats::StatsCommand;
pub use validate::ValidateCommand;
