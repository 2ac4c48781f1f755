pub mod accounts;
pub mod history;
pub mod predict;
pub mod status;
pub mod training;
pub mod uploads;
