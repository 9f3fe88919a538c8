pub mod history;
pub mod json;
pub mod report;
