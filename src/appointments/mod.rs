pub mod eligibility;
pub mod merge;
pub mod segment;
pub mod status;
pub mod view;
