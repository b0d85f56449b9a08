pub mod backtest;
pub mod cli;
pub mod contest;
pub mod history;
pub mod report;
pub mod slots;
